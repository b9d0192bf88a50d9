//! Configuration loading with env-var overrides.
//!
//! Reads `config/default.toml` relative to the current working directory,
//! then applies `NUTRISCAN_DATA_DIR` and `NUTRISCAN_LOG_LEVEL` env overrides.
//!
//! # Module layout
//!
//! - **types** — Public configuration structs (`Config`, `HttpConfig`, …).
//! - **raw** — Raw TOML deserialization types.  These mirror the file shape
//!   and use serde defaults; kept private.
//! - **load** — Loading logic: `merge_toml`, `load_raw_merged`, `load`,
//!   `load_from`, `expand_home`.

mod load;
mod raw;
mod types;

pub use load::{expand_home, load, load_from};
pub use types::*;

impl Config {
    /// Safe `Config` for tests — artifacts under `data_dir`, ephemeral port.
    pub fn test_default(data_dir: &std::path::Path) -> Self {
        Self {
            service_name: "test".into(),
            data_dir: data_dir.to_path_buf(),
            log_level: "info".into(),
            http: HttpConfig {
                bind: "127.0.0.1:0".into(),
                cors_origins: Vec::new(),
                cors_credentials: false,
                request_timeout: std::time::Duration::from_secs(2),
            },
            artifacts: ArtifactsConfig {
                graph: data_dir.join(raw::default_graph_artifact()),
                model: data_dir.join(raw::default_model_artifact()),
            },
            recommend: RecommendConfig {
                default_top_k: std::num::NonZeroUsize::MIN,
                max_top_k: std::num::NonZeroUsize::new(raw::default_max_top_k())
                    .unwrap_or(std::num::NonZeroUsize::MIN),
            },
            classifier: ClassifierConfig { include_probabilities: true },
        }
    }
}
