// Path: crates/node/src/lib.rs
#![forbid(unsafe_code)]

//! Startup plumbing shared by the `flora-node` binary and its tests.

use anyhow::{anyhow, Result};
use flora_http_gateway::AppState;
use flora_services::{AuthGateway, IrisPipeline, ParametersStore};
use flora_storage::{BackendClient, Bootstrap};
use flora_types::config::NodeConfig;
use std::path::Path;
use tokio::sync::watch;

/// Reads the TOML node configuration. Without a path every default applies.
pub fn load_config(path: Option<&Path>) -> Result<NodeConfig> {
    let Some(path) = path else {
        return Ok(NodeConfig::default());
    };
    let raw = std::fs::read_to_string(path)
        .map_err(|e| anyhow!("failed to read config {}: {e}", path.display()))?;
    toml::from_str(&raw).map_err(|e| anyhow!("invalid config {}: {e}", path.display()))
}

/// Wires the three service adapters onto one backend client.
pub fn build_state(client: &BackendClient, config: &NodeConfig) -> AppState {
    AppState::new(
        ParametersStore::new(client.store()),
        AuthGateway::new(client.identity(), &config.auth),
        IrisPipeline::new(config.data.clone(), config.model.clone()),
    )
}

/// Bootstraps the backend and serves HTTP until ctrl-c.
pub async fn serve(config: NodeConfig) -> Result<()> {
    if config.telemetry.metrics_enabled {
        flora_telemetry::prometheus::install()?;
    }

    let bootstrap = Bootstrap::new();
    let client = bootstrap.initialize(&config.backend, &config.auth)?;
    tracing::info!(
        target: "node",
        project_id = %client.project_id(),
        listen_addr = %config.server.listen_addr,
        "backend ready"
    );
    let state = build_state(&client, &config);

    let (shutdown_tx, shutdown_rx) = watch::channel(false);
    let mut server = tokio::spawn(flora_http_gateway::run_server(
        config.server.clone(),
        state,
        shutdown_rx,
    ));

    tokio::select! {
        _ = tokio::signal::ctrl_c() => {
            tracing::info!(target: "node", event = "shutdown", reason = "ctrl-c");
        }
        res = &mut server => {
            // The server stopped on its own, which only happens on failure.
            let outcome = res.map_err(anyhow::Error::from).and_then(|r| r);
            if let Err(e) = &outcome {
                tracing::error!(target: "node", error = %e, "HTTP server exited");
            }
            return outcome;
        }
    }

    shutdown_tx.send(true).ok();
    server.await??;
    tracing::info!(target: "node", event = "shutdown", reason = "complete");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use flora_test_utils::write_service_account_key;
    use flora_types::config::{ScalerSource, StoreBackend};

    #[test]
    fn missing_path_means_defaults() {
        let config = load_config(None).unwrap();
        assert_eq!(config.server.listen_addr, "127.0.0.1:8080");
        assert_eq!(config.backend.store, StoreBackend::Memory);
        assert!(!config.auth.verify_password);
    }

    #[test]
    fn partial_file_keeps_other_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flora.toml");
        std::fs::write(
            &path,
            r#"
[server]
listen_addr = "0.0.0.0:9000"

[model]
scaler_source = "refit_on_dataset"
"#,
        )
        .unwrap();
        let config = load_config(Some(&path)).unwrap();
        assert_eq!(config.server.listen_addr, "0.0.0.0:9000");
        assert_eq!(config.server.body_limit_kb, 256);
        assert_eq!(config.model.scaler_source, ScalerSource::RefitOnDataset);
        assert_eq!(config.data.default_test_size, 0.2);
    }

    #[test]
    fn unknown_sections_and_missing_files_fail() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("flora.toml");
        std::fs::write(&path, "[cluster]\nreplicas = 3\n").unwrap();
        assert!(load_config(Some(&path)).is_err());
        assert!(load_config(Some(&dir.path().join("absent.toml"))).is_err());
    }

    #[tokio::test]
    async fn serve_returns_when_the_server_cannot_start() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::default();
        config.backend.credentials_path = write_service_account_key(dir.path()).unwrap();
        config.telemetry.metrics_enabled = false;
        config.server.listen_addr = "not-an-address".into();

        let outcome = tokio::time::timeout(std::time::Duration::from_secs(10), serve(config))
            .await
            .expect("serve should not wait for ctrl-c after a startup failure");
        assert!(outcome.is_err());
    }

    #[tokio::test]
    async fn state_is_built_from_the_bootstrapped_client() {
        let dir = tempfile::tempdir().unwrap();
        let mut config = NodeConfig::default();
        config.backend.credentials_path = write_service_account_key(dir.path()).unwrap();

        let client = Bootstrap::new()
            .initialize(&config.backend, &config.auth)
            .unwrap();
        let state = build_state(&client, &config);
        state
            .parameters
            .add(serde_json::Map::new())
            .await
            .unwrap();
        assert!(client
            .store()
            .get("parameters", "parameters")
            .await
            .unwrap()
            .is_some());
    }
}
