//! Config file read/write with atomic backup rotation.

use crate::schema::LeadScanConfig;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;
use tracing::{debug, info, warn};

const CONFIG_FILE_NAME: &str = "config.yaml";

const MAX_BACKUPS: usize = 5;

/// Priority: `LEADSCAN_CONFIG_DIR` env > `~/.leadscan/`
pub fn config_dir() -> PathBuf {
    if let Ok(dir) = std::env::var("LEADSCAN_CONFIG_DIR") {
        return PathBuf::from(dir);
    }
    match dirs::home_dir() {
        Some(home) => home.join(".leadscan"),
        None => PathBuf::from(".leadscan"),
    }
}

pub fn config_file_path(config_dir: &Path) -> PathBuf {
    config_dir.join(CONFIG_FILE_NAME)
}

/// Load and parse the config. A missing file is a first run and yields the
/// default config.
pub async fn load_config(path: &Path) -> Result<LeadScanConfig> {
    if !path.exists() {
        debug!(path = %path.display(), "Config file does not exist; using defaults");
        return Ok(LeadScanConfig::default());
    }

    let raw = fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    // An empty file parses as YAML null.
    if raw.trim().is_empty() {
        return Ok(LeadScanConfig::default());
    }
    let config: LeadScanConfig = serde_yaml::from_str(&raw)
        .with_context(|| format!("Failed to parse config YAML at: {}", path.display()))?;

    info!(path = %path.display(), "Loaded config");
    Ok(config)
}

/// Write config atomically (temp file + rename), keeping rolling backups of
/// the previous versions.
pub async fn write_config(config: &LeadScanConfig, path: &Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).await.with_context(|| {
            format!("Failed to create config directory: {}", parent.display())
        })?;
    }

    if path.exists() {
        rotate_backups(path).await;
    }

    let yaml = serde_yaml::to_string(config).context("Failed to serialize config to YAML")?;

    let tmp_path = path.with_extension("yaml.tmp");
    fs::write(&tmp_path, yaml.as_bytes())
        .await
        .with_context(|| format!("Failed to write temp config: {}", tmp_path.display()))?;
    fs::rename(&tmp_path, path)
        .await
        .with_context(|| format!("Failed to rename temp config to: {}", path.display()))?;

    info!(path = %path.display(), "Wrote config");
    Ok(())
}

/// config.yaml.bak.1 → .bak.2 → ... → .bak.N
async fn rotate_backups(path: &Path) {
    for i in (1..MAX_BACKUPS).rev() {
        let old = path.with_extension(format!("yaml.bak.{i}"));
        let new = path.with_extension(format!("yaml.bak.{}", i + 1));
        if old.exists() {
            if let Err(e) = fs::rename(&old, &new).await {
                warn!("Failed to rotate backup {}: {}", old.display(), e);
            }
        }
    }

    let bak = path.with_extension("yaml.bak.1");
    if let Err(e) = fs::copy(path, &bak).await {
        warn!("Failed to create backup {}: {}", bak.display(), e);
    }
}

/// Apply a JSON Merge Patch (RFC 7396) to the config.
pub fn apply_merge_patch(config: &LeadScanConfig, patch: &serde_json::Value) -> Result<LeadScanConfig> {
    let mut value = serde_json::to_value(config).context("Failed to serialize config for merge patch")?;
    json_merge_patch(&mut value, patch);
    serde_json::from_value(value).context("Failed to deserialize config after merge patch")
}

/// Build a patch that sets one dotted path, e.g. `extraction.provider`.
/// The value is parsed as YAML so numbers and booleans keep their type.
pub fn patch_for_path(path: &str, raw_value: &str) -> Result<serde_json::Value> {
    let mut value: serde_json::Value = serde_yaml::from_str(raw_value)
        .with_context(|| format!("Invalid value for {path}: {raw_value}"))?;
    for segment in path.rsplit('.') {
        if segment.is_empty() {
            anyhow::bail!("Invalid config path: {path}");
        }
        value = serde_json::json!({ segment: value });
    }
    Ok(value)
}

fn json_merge_patch(target: &mut serde_json::Value, patch: &serde_json::Value) {
    let serde_json::Value::Object(patch_map) = patch else {
        *target = patch.clone();
        return;
    };
    if !target.is_object() {
        *target = serde_json::Value::Object(Default::default());
    }
    if let serde_json::Value::Object(target_map) = target {
        for (key, patch_val) in patch_map {
            if patch_val.is_null() {
                target_map.remove(key);
            } else {
                let entry = target_map.entry(key.clone()).or_insert(serde_json::Value::Null);
                json_merge_patch(entry, patch_val);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::LoggingConfig;
    use uuid::Uuid;

    fn temp_dir() -> PathBuf {
        std::env::temp_dir().join(format!("leadscan-config-{}", Uuid::new_v4()))
    }

    #[test]
    fn merge_patch_sets_nested_value() {
        let patch = patch_for_path("logging.level", "debug").unwrap();
        let result = apply_merge_patch(&LeadScanConfig::default(), &patch).unwrap();
        assert_eq!(result.logging.unwrap().level.as_deref(), Some("debug"));
    }

    #[test]
    fn patch_keeps_scalar_types() {
        let patch = patch_for_path("session.successDelayMs", "500").unwrap();
        let result = apply_merge_patch(&LeadScanConfig::default(), &patch).unwrap();
        assert_eq!(result.session.unwrap().success_delay_ms, Some(500));
    }

    #[test]
    fn merge_patch_null_removes_section() {
        let base = LeadScanConfig {
            logging: Some(LoggingConfig {
                level: Some("info".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };
        let result = apply_merge_patch(&base, &serde_json::json!({ "logging": null })).unwrap();
        assert!(result.logging.is_none());
    }

    #[test]
    fn rejects_empty_path_segments() {
        assert!(patch_for_path("logging..level", "debug").is_err());
    }

    #[tokio::test]
    async fn write_then_load_keeps_backups() {
        let dir = temp_dir();
        let path = config_file_path(&dir);
        assert_eq!(load_config(&path).await.unwrap(), LeadScanConfig::default());

        let mut cfg = LeadScanConfig::default();
        write_config(&cfg, &path).await.unwrap();
        cfg.logging = Some(LoggingConfig {
            level: Some("debug".into()),
            ..Default::default()
        });
        write_config(&cfg, &path).await.unwrap();

        assert_eq!(load_config(&path).await.unwrap(), cfg);
        assert!(path.with_extension("yaml.bak.1").exists());
        let _ = std::fs::remove_dir_all(&dir);
    }
}
