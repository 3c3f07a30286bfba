// Path: crates/types/src/config/mod.rs

//! Shared configuration structures for the Flora node.
//!
//! `NodeConfig` is read from a TOML file at startup. Every field carries a
//! serde default so that an empty file yields a runnable development node.
//! `ModelParameters` is the separate JSON hyperparameter file consumed by the
//! training endpoint.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// Top-level node configuration.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
#[serde(deny_unknown_fields)]
pub struct NodeConfig {
    /// HTTP listener and middleware limits.
    #[serde(default)]
    pub server: ServerConfig,
    /// Credential bootstrap and document backend selection.
    #[serde(default)]
    pub backend: BackendConfig,
    /// Authentication gateway behaviour.
    #[serde(default)]
    pub auth: AuthConfig,
    /// Dataset location and split defaults.
    #[serde(default)]
    pub data: DataConfig,
    /// Model hyperparameter file, artifact path and prediction scaling.
    #[serde(default)]
    pub model: ModelConfig,
    /// Metrics exposure.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

/// Configuration for the HTTP gateway.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ServerConfig {
    /// Socket address to bind, e.g. `127.0.0.1:8080`.
    #[serde(default = "default_listen_addr")]
    pub listen_addr: String,
    /// Maximum accepted request body in KiB.
    #[serde(default = "default_body_limit_kb")]
    pub body_limit_kb: usize,
    /// Per-request timeout. Training runs inside this budget.
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
    /// Maximum number of in-flight requests before load shedding.
    #[serde(default = "default_concurrency_limit")]
    pub concurrency_limit: usize,
}

fn default_listen_addr() -> String {
    "127.0.0.1:8080".to_string()
}
fn default_body_limit_kb() -> usize {
    256
}
fn default_request_timeout_secs() -> u64 {
    30
}
fn default_concurrency_limit() -> usize {
    128
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen_addr: default_listen_addr(),
            body_limit_kb: default_body_limit_kb(),
            request_timeout_secs: default_request_timeout_secs(),
            concurrency_limit: default_concurrency_limit(),
        }
    }
}

/// Selects the document backend behind the credential bootstrap.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreBackend {
    /// Process-local store, lost on restart.
    #[default]
    Memory,
    /// Durable single-file redb store.
    Redb,
}

/// Configuration for the credential bootstrap.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct BackendConfig {
    /// Path to the service-account key JSON file.
    #[serde(default = "default_credentials_path")]
    pub credentials_path: PathBuf,
    /// Which document backend to open.
    #[serde(default)]
    pub store: StoreBackend,
    /// Database file used when `store = "redb"`.
    #[serde(default = "default_store_path")]
    pub store_path: PathBuf,
}

fn default_credentials_path() -> PathBuf {
    PathBuf::from("private_key.json")
}
fn default_store_path() -> PathBuf {
    PathBuf::from("flora-data/flora.redb")
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            credentials_path: default_credentials_path(),
            store: StoreBackend::default(),
            store_path: default_store_path(),
        }
    }
}

/// Configuration for the authentication gateway.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AuthConfig {
    /// When `true`, login checks the supplied password against the stored hash.
    /// Off by default: login historically minted a token for any known email.
    #[serde(default)]
    pub verify_password: bool,
    /// Lifetime of minted bearer tokens.
    #[serde(default = "default_token_ttl_secs")]
    pub token_ttl_secs: u64,
}

fn default_token_ttl_secs() -> u64 {
    3600
}

impl Default for AuthConfig {
    fn default() -> Self {
        Self {
            verify_password: false,
            token_ttl_secs: default_token_ttl_secs(),
        }
    }
}

/// Configuration for the dataset pipeline.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct DataConfig {
    /// Path to the Iris CSV file.
    #[serde(default = "default_iris_csv")]
    pub iris_csv: PathBuf,
    /// Test fraction used when the caller does not supply one.
    #[serde(default = "default_test_size")]
    pub default_test_size: f64,
    /// Shuffle seed used when the caller does not supply one.
    #[serde(default = "default_random_state")]
    pub default_random_state: u64,
}

fn default_iris_csv() -> PathBuf {
    PathBuf::from("data/Iris.csv")
}
fn default_test_size() -> f64 {
    0.2
}
fn default_random_state() -> u64 {
    42
}

impl Default for DataConfig {
    fn default() -> Self {
        Self {
            iris_csv: default_iris_csv(),
            default_test_size: default_test_size(),
            default_random_state: default_random_state(),
        }
    }
}

/// Which scaler standardises a feature vector at prediction time.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ScalerSource {
    /// Reuse the scaler fitted on the training split and stored in the artifact.
    #[default]
    Training,
    /// Re-fit a scaler on the full dataset for every prediction request.
    RefitOnDataset,
}

/// Configuration for the model pipeline.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ModelConfig {
    /// Path to the JSON hyperparameter file.
    #[serde(default = "default_parameters_path")]
    pub parameters_path: PathBuf,
    /// Where the trained artifact is written and read.
    #[serde(default = "default_artifact_path")]
    pub artifact_path: PathBuf,
    /// Scaler used by the prediction endpoint.
    #[serde(default)]
    pub scaler_source: ScalerSource,
}

fn default_parameters_path() -> PathBuf {
    PathBuf::from("config/model_parameters.json")
}
fn default_artifact_path() -> PathBuf {
    PathBuf::from("models/iris_classification_model_rf.bin")
}

impl Default for ModelConfig {
    fn default() -> Self {
        Self {
            parameters_path: default_parameters_path(),
            artifact_path: default_artifact_path(),
            scaler_source: ScalerSource::default(),
        }
    }
}

/// Configuration for metrics exposure.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct TelemetryConfig {
    /// Install the Prometheus collectors and serve `/metrics`.
    #[serde(default = "default_metrics_enabled")]
    pub metrics_enabled: bool,
}

fn default_metrics_enabled() -> bool {
    true
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            metrics_enabled: default_metrics_enabled(),
        }
    }
}

/// Split-quality function used by the decision trees.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Criterion {
    /// Gini impurity.
    #[default]
    Gini,
    /// Shannon entropy (information gain).
    Entropy,
}

/// Hyperparameters for the random-forest classifier, read from JSON.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct ModelParameters {
    /// Number of trees in the forest.
    #[serde(default = "default_n_estimators")]
    pub n_estimators: usize,
    /// Maximum tree depth; `null` grows trees until leaves are pure.
    #[serde(default)]
    pub max_depth: Option<usize>,
    /// Seed for bootstrap sampling and feature selection.
    #[serde(default)]
    pub random_state: Option<u64>,
    /// Split-quality function.
    #[serde(default)]
    pub criterion: Criterion,
    /// Minimum number of samples required to split an internal node.
    #[serde(default = "default_min_samples_split")]
    pub min_samples_split: usize,
    /// Held-out fraction for scoring; falls back to `data.default_test_size`.
    #[serde(default)]
    pub test_size: Option<f64>,
}

fn default_n_estimators() -> usize {
    100
}
fn default_min_samples_split() -> usize {
    2
}

impl Default for ModelParameters {
    fn default() -> Self {
        Self {
            n_estimators: default_n_estimators(),
            max_depth: None,
            random_state: None,
            criterion: Criterion::default(),
            min_samples_split: default_min_samples_split(),
            test_size: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_toml_yields_defaults() {
        let cfg: NodeConfig = toml::from_str("").unwrap();
        assert_eq!(cfg.server.listen_addr, "127.0.0.1:8080");
        assert_eq!(cfg.backend.store, StoreBackend::Memory);
        assert!(!cfg.auth.verify_password);
        assert_eq!(cfg.model.scaler_source, ScalerSource::Training);
        assert_eq!(cfg.data.default_random_state, 42);
    }

    #[test]
    fn parses_partial_sections() {
        let raw = r#"
            [backend]
            store = "redb"
            store_path = "/var/lib/flora/db.redb"

            [model]
            scaler_source = "refit_on_dataset"
        "#;
        let cfg: NodeConfig = toml::from_str(raw).unwrap();
        assert_eq!(cfg.backend.store, StoreBackend::Redb);
        assert_eq!(cfg.model.scaler_source, ScalerSource::RefitOnDataset);
        assert_eq!(cfg.server.body_limit_kb, 256);
    }

    #[test]
    fn unknown_section_is_rejected() {
        assert!(toml::from_str::<NodeConfig>("[bogus]\nx = 1").is_err());
    }

    #[test]
    fn model_parameters_accept_source_file_shape() {
        let raw = r#"{"n_estimators": 50, "max_depth": 4, "random_state": 7}"#;
        let p: ModelParameters = serde_json::from_str(raw).unwrap();
        assert_eq!(p.n_estimators, 50);
        assert_eq!(p.max_depth, Some(4));
        assert_eq!(p.criterion, Criterion::Gini);
        assert_eq!(p.min_samples_split, 2);
    }
}
