//! Everything a command needs: resolved config, storage, and the signed-in
//! workspace.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use leadscan_config::{
    config_dir, config_file_path, load_and_prepare, validate, LeadScanConfig, ValidationReport,
};
use leadscan_core::{Extractor, KeyValueStore};
use leadscan_session::{Authenticator, Workspace};
use leadscan_storage::JsonFileKvStore;
use leadscan_understanding::{create_backend, ExtractionClient, VisionProviderKind};
use tracing::debug;

pub struct AppContext {
    pub config_dir: PathBuf,
    pub config: LeadScanConfig,
    pub report: ValidationReport,
    pub workspace: Workspace,
}

impl AppContext {
    pub async fn load(config_dir_override: Option<PathBuf>) -> Result<Self> {
        let config_dir = config_dir_override.unwrap_or_else(config_dir);
        let (config, report) = load_and_prepare(&config_file_path(&config_dir)).await?;
        Self::assemble(config_dir, config, report)
    }

    pub fn with_config(config_dir: PathBuf, config: LeadScanConfig) -> Result<Self> {
        let report = validate(&config);
        Self::assemble(config_dir, config, report)
    }

    fn assemble(config_dir: PathBuf, config: LeadScanConfig, report: ValidationReport) -> Result<Self> {
        let store = JsonFileKvStore::open(config.data_dir(&config_dir))?;
        debug!(data_dir = %store.dir().display(), "Opened data directory");
        let kv: Arc<dyn KeyValueStore> = Arc::new(store);
        Ok(Self {
            workspace: Workspace::open(kv),
            config_dir,
            config,
            report,
        })
    }

    /// Fail with every config error when the report has any.
    pub fn require_valid_config(&self) -> Result<()> {
        if self.report.is_valid() {
            return Ok(());
        }
        let errors: Vec<String> = self.report.errors.iter().map(ToString::to_string).collect();
        bail!("Invalid configuration:\n  {}", errors.join("\n  "))
    }

    pub fn authenticator(&self) -> Authenticator {
        Authenticator::new(self.config.auth_delay(), self.config.default_display_name())
    }

    /// Build the extraction client for the configured provider.
    pub fn extractor(&self) -> Result<Arc<dyn Extractor>> {
        self.require_valid_config()?;
        let provider = self.config.provider();
        let kind = VisionProviderKind::parse(provider)
            .ok_or_else(|| anyhow!("Unknown extraction provider '{provider}'"))?;
        let api_key = self
            .config
            .api_key()
            .map(str::to_string)
            .or_else(|| env_api_key(kind, |name| std::env::var(name).ok()))
            .with_context(|| {
                format!(
                    "No API key for {provider}. Set extraction.apiKey or {}",
                    env_key_names(kind).join(" / ")
                )
            })?;
        let backend = create_backend(
            kind,
            api_key,
            self.config.base_url(),
            self.config.request_timeout(),
        );
        let model = self
            .config
            .model()
            .unwrap_or_else(|| kind.default_model())
            .to_string();
        let client = ExtractionClient::new(backend, model);
        debug!(provider = client.provider(), "Extraction client ready");
        Ok(Arc::new(client))
    }
}

fn env_key_names(kind: VisionProviderKind) -> &'static [&'static str] {
    match kind {
        VisionProviderKind::Gemini => &["GEMINI_API_KEY", "API_KEY"],
        VisionProviderKind::OpenAi => &["OPENAI_API_KEY", "API_KEY"],
    }
}

/// First non-empty key among the provider's environment variables.
fn env_api_key(kind: VisionProviderKind, lookup: impl Fn(&str) -> Option<String>) -> Option<String> {
    env_key_names(kind)
        .iter()
        .filter_map(|name| lookup(name))
        .find(|value| !value.is_empty())
}
