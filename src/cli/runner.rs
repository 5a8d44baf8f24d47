//! CLI runner - executes commands

use super::commands::{parse_stream_list, Cli, Commands, OutputFormat};
use crate::catalog::{discover, Catalog};
use crate::config::TapConfig;
use crate::engine::{SyncEngine, SyncSettings};
use crate::error::{Error, Result};
use crate::http::{build_request_url, ApiClient, HttpClient};
use crate::output::JsonLinesWriter;
use crate::state::StateManager;
use crate::streams::snapchat_registry;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::{debug, info};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command
    pub async fn run(&self) -> Result<()> {
        match &self.cli.command {
            Commands::Check => self.check().await,
            Commands::Discover => self.discover(),
            Commands::Sync { streams } => self.sync(streams.as_deref()).await,
            Commands::Streams => self.streams(),
        }
    }

    /// Load config, inline JSON taking precedence over the file
    fn load_config(&self) -> Result<TapConfig> {
        if let Some(json) = &self.cli.config_json {
            return TapConfig::from_json_str(json);
        }
        match &self.cli.config {
            Some(path) => TapConfig::from_file(path),
            None => Err(Error::config(
                "No config provided. Use --config <file> or --config-json <json>",
            )),
        }
    }

    /// Load state from inline JSON, a file, or start empty
    fn load_state(&self) -> Result<StateManager> {
        if let Some(json) = &self.cli.state_json {
            return StateManager::from_json(json);
        }
        match &self.cli.state {
            Some(path) => StateManager::from_file(path),
            None => Ok(StateManager::in_memory()),
        }
    }

    /// Catalog from `--catalog`, else a fresh discovery; `--streams` replaces selection
    fn load_catalog(&self, streams: Option<&str>) -> Result<Catalog> {
        let mut catalog = match &self.cli.catalog {
            Some(path) => Catalog::from_file(path)?,
            None => discover(snapchat_registry()),
        };
        if let Some(list) = streams {
            let names = parse_stream_list(list);
            debug!(streams = ?names, "Selecting streams from --streams");
            catalog.select_only(&names)?;
        }
        Ok(catalog)
    }

    /// Authenticate and fetch `me`
    async fn check(&self) -> Result<()> {
        let config = self.load_config()?;

        match check_connection(&config).await {
            Ok(_) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "SUCCEEDED"
                    }
                }));
                Ok(())
            }
            Err(e) => {
                self.output_message(&json!({
                    "type": "CONNECTION_STATUS",
                    "connectionStatus": {
                        "status": "FAILED",
                        "message": e.to_string()
                    }
                }));
                Err(e)
            }
        }
    }

    /// Print the catalog for every stream
    fn discover(&self) -> Result<()> {
        info!("Starting discovery");
        let catalog = discover(snapchat_registry());
        self.output_message(&catalog.to_json());
        info!(streams = catalog.streams.len(), "Finished discovery");
        Ok(())
    }

    /// Replicate the selected streams to stdout
    async fn sync(&self, streams: Option<&str>) -> Result<()> {
        let config = self.load_config()?;
        let settings = SyncSettings::from_config(&config)?;
        let catalog = self.load_catalog(streams)?;
        let state = self.load_state()?;

        let client = HttpClient::with_auth(config.http_config()?, config.auth_config())?;
        let writer = Arc::new(JsonLinesWriter::stdout());

        let mut engine = SyncEngine::new(
            Arc::new(client),
            snapchat_registry(),
            &catalog,
            state,
            writer,
            settings,
        )?;
        engine.run().await?;
        Ok(())
    }

    /// List registry streams
    fn streams(&self) -> Result<()> {
        let registry = snapchat_registry();

        let streams: Vec<Value> = registry
            .iter()
            .map(|(_, stream)| {
                json!({
                    "name": stream.name,
                    "parent": stream.parent.map(|p| registry.get(p.stream).name),
                    "replication_method": stream.replication_method.as_str(),
                    "replication_key": stream.replication_field
                })
            })
            .collect();

        self.output_message(&json!({
            "type": "STREAMS",
            "streams": streams
        }));
        Ok(())
    }

    /// Output a JSON message to stdout
    fn output_message(&self, msg: &Value) {
        match self.cli.format {
            OutputFormat::Json => {
                println!("{}", serde_json::to_string(msg).unwrap_or_default());
            }
            OutputFormat::Pretty => {
                println!("{}", serde_json::to_string_pretty(msg).unwrap_or_default());
            }
        }
    }
}

/// Refresh the access token and GET `me`, returning the response body
pub async fn check_connection(config: &TapConfig) -> Result<Value> {
    let client = HttpClient::with_auth(config.http_config()?, config.auth_config())?;
    let url = build_request_url(client.base_url(), "me", &[])?;
    client.get(&url, "me").await
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use tempfile::tempdir;
    use wiremock::matchers::{header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn config_json(server: Option<&MockServer>) -> String {
        let mut config = json!({
            "client_id": "client",
            "client_secret": "secret",
            "refresh_token": "refresh",
            "start_date": "2021-01-01T00:00:00Z"
        });
        if let Some(server) = server {
            config["base_url"] = json!(format!("{}/v1", server.uri()));
            config["token_url"] = json!(format!("{}/oauth2/token", server.uri()));
        }
        config.to_string()
    }

    fn runner(args: &[&str]) -> Runner {
        let mut argv = vec!["tap-snapchat-ads"];
        argv.extend_from_slice(args);
        Runner::new(Cli::parse_from(argv))
    }

    #[test]
    fn test_parse_stream_list() {
        assert_eq!(
            parse_stream_list(" campaigns, ads ,,"),
            vec!["campaigns".to_string(), "ads".to_string()]
        );
        assert!(parse_stream_list("").is_empty());
    }

    #[test]
    fn test_sync_streams_flag() {
        let cli = Cli::parse_from(["tap-snapchat-ads", "sync", "--streams", "ads"]);
        match cli.command {
            Commands::Sync { streams } => assert_eq!(streams.as_deref(), Some("ads")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_load_config_prefers_inline_json() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("config.json");
        std::fs::write(&path, "not json").unwrap();

        let inline = config_json(None);
        let runner = runner(&[
            "--config",
            path.to_str().unwrap(),
            "--config-json",
            &inline,
            "discover",
        ]);
        let config = runner.load_config().unwrap();
        assert_eq!(config.client_id, "client");
    }

    #[test]
    fn test_load_config_missing() {
        let err = runner(&["discover"]).load_config().unwrap_err();
        assert!(err.to_string().contains("--config"));
    }

    #[test]
    fn test_load_state_defaults_to_memory() {
        let state = runner(&["sync"]).load_state().unwrap();
        assert!(state.is_in_memory());
    }

    #[test]
    fn test_load_catalog_streams_override() {
        let catalog = runner(&["sync"])
            .load_catalog(Some("campaigns,ad_stats_daily"))
            .unwrap();
        assert_eq!(catalog.selected_streams(), vec!["campaigns", "ad_stats_daily"]);

        let err = runner(&["sync"]).load_catalog(Some("bogus")).unwrap_err();
        assert!(err.to_string().contains("bogus"));
    }

    #[tokio::test]
    async fn test_check_connection() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "access_token": "token",
                "expires_in": 1800
            })))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v1/me"))
            .and(header("Authorization", "Bearer token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "request_status": "SUCCESS",
                "me": {"id": "user-1"}
            })))
            .expect(1)
            .mount(&server)
            .await;

        let config = TapConfig::from_json_str(&config_json(Some(&server))).unwrap();
        let me = check_connection(&config).await.unwrap();
        assert_eq!(me["me"]["id"], "user-1");
    }

    #[tokio::test]
    async fn test_check_fails_on_unauthorized() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/oauth2/token"))
            .respond_with(ResponseTemplate::new(401).set_body_json(json!({
                "error": "invalid_grant"
            })))
            .mount(&server)
            .await;

        let inline = config_json(Some(&server));
        let err = runner(&["--config-json", &inline, "check"])
            .run()
            .await
            .unwrap_err();
        assert!(matches!(err, Error::TokenRefresh { .. }), "{err:?}");
    }
}
