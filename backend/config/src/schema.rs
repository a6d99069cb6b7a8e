//! LeadScan configuration schema.
//!
//! Every field is optional so a partial `config.yaml` parses; the accessors
//! on [`LeadScanConfig`] fall back to the built-in defaults.

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

use crate::defaults::*;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LeadScanConfig {
    /// Vision provider used for field extraction
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extraction: Option<ExtractionConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub storage: Option<StorageConfig>,

    /// Scan session and sign-in behaviour
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session: Option<SessionConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub export: Option<ExportConfig>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExtractionConfig {
    /// `gemini` or `openai`
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub provider: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
    /// Override the provider endpoint (proxies, local gateways)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StorageConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionConfig {
    /// How long the success status stays up before returning to idle
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub success_delay_ms: Option<u64>,
    /// Simulated sign-in latency
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub auth_delay_ms: Option<u64>,
    /// Display name given to identities created by login
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default_display_name: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportConfig {
    /// Prefix of exported file names
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub product: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_dir: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoggingConfig {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub level: Option<String>,
    /// Directory for rolling log files; no file output when unset
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub dir: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub json: Option<bool>,
}

impl LeadScanConfig {
    pub fn provider(&self) -> &str {
        self.extraction
            .as_ref()
            .and_then(|e| e.provider.as_deref())
            .unwrap_or(DEFAULT_PROVIDER)
    }

    pub fn model(&self) -> Option<&str> {
        self.extraction.as_ref().and_then(|e| e.model.as_deref())
    }

    pub fn api_key(&self) -> Option<&str> {
        self.extraction
            .as_ref()
            .and_then(|e| e.api_key.as_deref())
            .filter(|k| !k.is_empty())
    }

    pub fn base_url(&self) -> Option<&str> {
        self.extraction.as_ref().and_then(|e| e.base_url.as_deref())
    }

    pub fn request_timeout(&self) -> Duration {
        let secs = self
            .extraction
            .as_ref()
            .and_then(|e| e.timeout_secs)
            .unwrap_or(DEFAULT_TIMEOUT_SECS);
        Duration::from_secs(secs)
    }

    /// Data directory, relative paths resolved against `config_dir`.
    pub fn data_dir(&self, config_dir: &Path) -> PathBuf {
        match self.storage.as_ref().and_then(|s| s.data_dir.as_deref()) {
            Some(dir) => config_dir.join(dir),
            None => config_dir.join(DEFAULT_DATA_DIR),
        }
    }

    pub fn success_delay(&self) -> Duration {
        let ms = self
            .session
            .as_ref()
            .and_then(|s| s.success_delay_ms)
            .unwrap_or(DEFAULT_SUCCESS_DELAY_MS);
        Duration::from_millis(ms)
    }

    pub fn auth_delay(&self) -> Duration {
        let ms = self
            .session
            .as_ref()
            .and_then(|s| s.auth_delay_ms)
            .unwrap_or(DEFAULT_AUTH_DELAY_MS);
        Duration::from_millis(ms)
    }

    pub fn default_display_name(&self) -> &str {
        self.session
            .as_ref()
            .and_then(|s| s.default_display_name.as_deref())
            .unwrap_or(DEFAULT_DISPLAY_NAME)
    }

    pub fn export_product(&self) -> &str {
        self.export
            .as_ref()
            .and_then(|e| e.product.as_deref())
            .unwrap_or(DEFAULT_EXPORT_PRODUCT)
    }

    pub fn export_dir(&self) -> PathBuf {
        self.export
            .as_ref()
            .and_then(|e| e.output_dir.as_deref())
            .map(PathBuf::from)
            .unwrap_or_else(|| PathBuf::from("."))
    }

    pub fn log_level(&self) -> &str {
        self.logging
            .as_ref()
            .and_then(|l| l.level.as_deref())
            .unwrap_or(DEFAULT_LOG_LEVEL)
    }

    pub fn log_dir(&self, config_dir: &Path) -> Option<PathBuf> {
        self.logging
            .as_ref()
            .and_then(|l| l.dir.as_deref())
            .map(|dir| config_dir.join(dir))
    }

    pub fn log_json(&self) -> bool {
        self.logging.as_ref().and_then(|l| l.json).unwrap_or(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_camel_case_yaml() {
        let yaml = r#"
extraction:
  provider: openai
  model: gpt-4o-mini
  apiKey: sk-test
  timeoutSecs: 30
session:
  successDelayMs: 500
export:
  product: acme
"#;
        let cfg: LeadScanConfig = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(cfg.provider(), "openai");
        assert_eq!(cfg.model(), Some("gpt-4o-mini"));
        assert_eq!(cfg.api_key(), Some("sk-test"));
        assert_eq!(cfg.request_timeout(), Duration::from_secs(30));
        assert_eq!(cfg.success_delay(), Duration::from_millis(500));
        assert_eq!(cfg.export_product(), "acme");
    }

    #[test]
    fn empty_config_uses_defaults() {
        let cfg = LeadScanConfig::default();
        assert_eq!(cfg.provider(), "gemini");
        assert_eq!(cfg.success_delay(), Duration::from_millis(2000));
        assert_eq!(cfg.auth_delay(), Duration::ZERO);
        assert_eq!(cfg.export_product(), "leadscan");
        assert_eq!(cfg.api_key(), None);
        assert_eq!(cfg.data_dir(Path::new("/cfg")), PathBuf::from("/cfg/data"));
        assert!(cfg.log_dir(Path::new("/cfg")).is_none());
    }

    #[test]
    fn absolute_data_dir_wins() {
        let cfg = LeadScanConfig {
            storage: Some(StorageConfig {
                data_dir: Some("/var/lib/leadscan".into()),
            }),
            ..Default::default()
        };
        assert_eq!(
            cfg.data_dir(Path::new("/cfg")),
            PathBuf::from("/var/lib/leadscan")
        );
    }
}
