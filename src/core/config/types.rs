//! Public configuration structs consumed by the service.

use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::time::Duration;

/// HTTP listener and CORS policy.
#[derive(Debug, Clone)]
pub struct HttpConfig {
    /// Socket address to bind the listener to.
    pub bind: String,
    /// Allowed CORS origins.  Empty means any origin.
    pub cors_origins: Vec<String>,
    /// Send `Access-Control-Allow-Credentials`.  Only honoured with an
    /// explicit origin list.
    pub cors_credentials: bool,
    /// Upper bound on a single classifier call.
    pub request_timeout: Duration,
}

/// Resolved artifact locations (already joined onto `data_dir`).
#[derive(Debug, Clone)]
pub struct ArtifactsConfig {
    pub graph: PathBuf,
    pub model: PathBuf,
}

/// Recommendation engine limits.
#[derive(Debug, Clone)]
pub struct RecommendConfig {
    /// K used when a request does not name one.
    pub default_top_k: NonZeroUsize,
    /// Largest K a request may ask for.
    pub max_top_k: NonZeroUsize,
}

#[derive(Debug, Clone)]
pub struct ClassifierConfig {
    /// Attach per-class percentages to `/predict` responses.
    pub include_probabilities: bool,
}

/// Fully-resolved service configuration.
#[derive(Debug, Clone)]
pub struct Config {
    pub service_name: String,
    /// Directory holding the reference artifacts (already expanded, no `~`).
    pub data_dir: PathBuf,
    pub log_level: String,
    pub http: HttpConfig,
    pub artifacts: ArtifactsConfig,
    pub recommend: RecommendConfig,
    pub classifier: ClassifierConfig,
}
