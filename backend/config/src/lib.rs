//! `leadscan-config`: runtime configuration.
//!
//! - Typed schema (extraction provider, storage, session, export, logging)
//! - YAML read/write with atomic backup rotation
//! - `${ENV_VAR}` substitution
//! - Defaults, validation, and redaction for display

pub mod defaults;
pub mod env;
pub mod io;
pub mod redact;
pub mod schema;
pub mod validation;

pub use defaults::apply_all_defaults;
pub use env::{collect_referenced_vars, resolve_env_vars, resolve_env_vars_with, MissingEnvVarError};
pub use io::{apply_merge_patch, config_dir, config_file_path, load_config, patch_for_path, write_config};
pub use redact::{collect_redacted_paths, redact};
pub use schema::LeadScanConfig;
pub use validation::{validate, ConfigValidationError, ValidationReport};

use anyhow::{Context, Result};
use serde_json::Value;
use std::path::Path;

/// Load a config file, substitute env vars, and apply defaults. The
/// validation report is returned for the caller to log once logging is up.
pub async fn load_and_prepare(path: &Path) -> Result<(LeadScanConfig, ValidationReport)> {
    let raw_config = load_config(path).await?;

    let value: Value =
        serde_json::to_value(&raw_config).context("Failed to serialize config for processing")?;
    let value = resolve_env_vars(&value).context("Failed to resolve env vars in config")?;
    let config: LeadScanConfig =
        serde_json::from_value(value).context("Failed to deserialize config after processing")?;

    let config = apply_all_defaults(config);
    let report = validate(&config);
    Ok((config, report))
}

pub fn log_report(report: &ValidationReport) {
    for warning in &report.warnings {
        tracing::warn!(path = %warning.path, message = %warning.message, "Config warning");
    }
    for error in &report.errors {
        tracing::error!(path = %error.path, message = %error.message, "Config error");
    }
}
