//! Raw TOML deserialization types.
//!
//! These structs mirror the TOML file shape and use `serde` defaults.
//! The `load` module converts them into the public `types` structs.

use serde::Deserialize;

// ── Top-level ────────────────────────────────────────────────────────────────

/// Raw TOML shape — serde target before resolution.
#[derive(Deserialize, Default)]
pub(super) struct RawConfig {
    #[serde(default)]
    pub service: RawService,
    #[serde(default)]
    pub http: RawHttp,
    #[serde(default)]
    pub artifacts: RawArtifacts,
    #[serde(default)]
    pub recommend: RawRecommend,
    #[serde(default)]
    pub classifier: RawClassifier,
}

#[derive(Deserialize)]
pub(super) struct RawService {
    #[serde(default = "default_service_name")]
    pub name: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
}

impl Default for RawService {
    fn default() -> Self {
        Self {
            name: default_service_name(),
            log_level: default_log_level(),
            data_dir: default_data_dir(),
        }
    }
}

// ── HTTP ─────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawHttp {
    #[serde(default = "default_http_bind")]
    pub bind: String,
    /// Empty list means any origin.
    #[serde(default)]
    pub cors_origins: Vec<String>,
    #[serde(default = "default_true")]
    pub cors_credentials: bool,
    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

impl Default for RawHttp {
    fn default() -> Self {
        Self {
            bind: default_http_bind(),
            cors_origins: Vec::new(),
            cors_credentials: true,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

// ── Artifacts ────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawArtifacts {
    #[serde(default = "default_graph_artifact")]
    pub graph: String,
    #[serde(default = "default_model_artifact")]
    pub model: String,
}

impl Default for RawArtifacts {
    fn default() -> Self {
        Self { graph: default_graph_artifact(), model: default_model_artifact() }
    }
}

// ── Engine ───────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
pub(super) struct RawRecommend {
    #[serde(default = "default_top_k")]
    pub default_top_k: usize,
    #[serde(default = "default_max_top_k")]
    pub max_top_k: usize,
}

impl Default for RawRecommend {
    fn default() -> Self {
        Self { default_top_k: default_top_k(), max_top_k: default_max_top_k() }
    }
}

#[derive(Deserialize)]
pub(super) struct RawClassifier {
    #[serde(default = "default_true")]
    pub include_probabilities: bool,
}

impl Default for RawClassifier {
    fn default() -> Self {
        Self { include_probabilities: true }
    }
}

// ── Defaults ─────────────────────────────────────────────────────────────────

pub(super) fn default_service_name() -> String { "nutriscan".to_string() }
pub(super) fn default_log_level() -> String { "info".to_string() }
pub(super) fn default_data_dir() -> String { "data".to_string() }
pub(super) fn default_http_bind() -> String { "0.0.0.0:8000".to_string() }
pub(super) fn default_request_timeout_secs() -> u64 { 10 }
pub(super) fn default_graph_artifact() -> String { "graph.json".to_string() }
pub(super) fn default_model_artifact() -> String { "model.json".to_string() }
pub(super) fn default_top_k() -> usize { 1 }
pub(super) fn default_max_top_k() -> usize { 10 }

fn default_true() -> bool {
    true
}
