//! Configuration loading with env-var overrides.
//!
//! Reads TOML files, supports `[meta] base = "..."` inheritance chains,
//! and applies `NUTRISCAN_DATA_DIR` and `NUTRISCAN_LOG_LEVEL` env overrides.

use std::collections::HashSet;
use std::env;
use std::fs;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::Deserialize;

use crate::error::AppError;
use crate::logger;

use super::raw::RawConfig;
use super::types::*;

const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Deep-merge two TOML values.
/// Tables are merged recursively — the overlay only needs to specify keys that
/// differ from the base. For every other type (string, integer, array, …)
/// the overlay value replaces the base value wholesale.
fn merge_toml(base: toml::Value, overlay: toml::Value) -> toml::Value {
    match (base, overlay) {
        (toml::Value::Table(mut base_tbl), toml::Value::Table(overlay_tbl)) => {
            for (key, ov_val) in overlay_tbl {
                let merged = match base_tbl.remove(&key) {
                    Some(base_val) => merge_toml(base_val, ov_val),
                    None => ov_val,
                };
                base_tbl.insert(key, merged);
            }
            toml::Value::Table(base_tbl)
        }
        (_, overlay) => overlay,
    }
}

/// Read a config file, follow any `[meta] base = "..."` chain, and return the
/// fully merged `toml::Value`. `visited` carries canonicalized paths already
/// seen in this chain so circular references are caught early.
fn load_raw_merged(
    path: &Path,
    visited: &mut HashSet<PathBuf>,
) -> Result<toml::Value, AppError> {
    let canonical = path.canonicalize().unwrap_or_else(|_| path.to_path_buf());
    if !visited.insert(canonical) {
        return Err(AppError::Config(format!(
            "circular base reference detected at: {}",
            path.display()
        )));
    }

    let raw = fs::read_to_string(path)
        .map_err(|e| AppError::Config(format!("cannot read {}: {e}", path.display())))?;

    let overlay_val: toml::Value = toml::from_str(&raw)
        .map_err(|e| AppError::Config(format!("parse error in {}: {e}", path.display())))?;

    if let Some(base_str) = overlay_val
        .get("meta")
        .and_then(|m| m.get("base"))
        .and_then(|b| b.as_str())
    {
        let base_path = if Path::new(base_str).is_absolute() {
            PathBuf::from(base_str)
        } else {
            path.parent().unwrap_or(Path::new(".")).join(base_str)
        };
        let base_val = load_raw_merged(&base_path, visited)?;
        Ok(merge_toml(base_val, overlay_val))
    } else {
        Ok(overlay_val)
    }
}

/// Load config from the given path, or `config/default.toml`, then apply env-var overrides.
/// If no path is given and `config/default.toml` does not exist, built-in defaults are used.
pub fn load(config_path: Option<&str>) -> Result<Config, AppError> {
    let data_dir_override = env::var("NUTRISCAN_DATA_DIR").ok();
    let log_level_override = env::var("NUTRISCAN_LOG_LEVEL").ok();

    if let Some(path) = config_path {
        return load_from(
            Path::new(path),
            data_dir_override.as_deref(),
            log_level_override.as_deref(),
        );
    }

    let default_path = Path::new(DEFAULT_CONFIG_PATH);
    if default_path.exists() {
        load_from(
            default_path,
            data_dir_override.as_deref(),
            log_level_override.as_deref(),
        )
    } else {
        resolve(
            RawConfig::default(),
            data_dir_override.as_deref(),
            log_level_override.as_deref(),
        )
    }
}

/// Internal loader — accepts an explicit path and optional overrides.
/// Tests pass overrides directly instead of mutating env vars.
/// Follows `[meta] base = "..."` inheritance chains before resolving.
pub fn load_from(
    path: &Path,
    data_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let merged_val = load_raw_merged(path, &mut HashSet::new())?;

    let parsed: RawConfig = Deserialize::deserialize(merged_val)
        .map_err(|e: toml::de::Error| {
            AppError::Config(format!("config error in {}: {e}", path.display()))
        })?;

    resolve(parsed, data_dir_override, log_level_override)
}

fn resolve(
    parsed: RawConfig,
    data_dir_override: Option<&str>,
    log_level_override: Option<&str>,
) -> Result<Config, AppError> {
    let s = parsed.service;

    let data_dir = expand_home(data_dir_override.unwrap_or(&s.data_dir));
    let log_level = log_level_override.unwrap_or(&s.log_level).to_string();
    logger::parse_level(&log_level)
        .map_err(|e| AppError::Config(format!("service.log_level: {e}")))?;

    let default_top_k = NonZeroUsize::new(parsed.recommend.default_top_k)
        .ok_or_else(|| AppError::Config("recommend.default_top_k must be at least 1".into()))?;
    let max_top_k = NonZeroUsize::new(parsed.recommend.max_top_k)
        .ok_or_else(|| AppError::Config("recommend.max_top_k must be at least 1".into()))?;
    if default_top_k > max_top_k {
        return Err(AppError::Config(format!(
            "recommend.default_top_k ({default_top_k}) exceeds max_top_k ({max_top_k})"
        )));
    }

    Ok(Config {
        service_name: s.name,
        artifacts: ArtifactsConfig {
            graph: resolve_artifact(&data_dir, &parsed.artifacts.graph),
            model: resolve_artifact(&data_dir, &parsed.artifacts.model),
        },
        data_dir,
        log_level,
        http: HttpConfig {
            bind: parsed.http.bind,
            cors_origins: parsed.http.cors_origins,
            cors_credentials: parsed.http.cors_credentials,
            request_timeout: Duration::from_secs(parsed.http.request_timeout_secs.max(1)),
        },
        recommend: RecommendConfig { default_top_k, max_top_k },
        classifier: ClassifierConfig {
            include_probabilities: parsed.classifier.include_probabilities,
        },
    })
}

/// Artifact paths are taken as-is when absolute, otherwise under `data_dir`.
fn resolve_artifact(data_dir: &Path, artifact: &str) -> PathBuf {
    let p = expand_home(artifact);
    if p.is_absolute() { p } else { data_dir.join(p) }
}

/// Expand a leading `~` to the user's home directory.
/// Absolute or relative paths without `~` are returned unchanged.
pub fn expand_home(path: &str) -> PathBuf {
    if let Some(rest) = path.strip_prefix("~/") {
        if let Some(home) = dirs::home_dir() {
            return home.join(rest);
        }
    }
    if path == "~" {
        if let Some(home) = dirs::home_dir() {
            return home;
        }
    }
    PathBuf::from(path)
}
