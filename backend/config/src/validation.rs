//! Config validation with field paths in every message.

use crate::schema::LeadScanConfig;
use thiserror::Error;

const PROVIDERS: &[&str] = &["gemini", "openai"];
const LOG_LEVELS: &[&str] = &["trace", "debug", "info", "warn", "error"];

#[derive(Debug, Error)]
#[error("Config validation error at '{path}': {message}")]
pub struct ConfigValidationError {
    pub path: String,
    pub message: String,
}

#[derive(Debug, Default)]
pub struct ValidationReport {
    pub errors: Vec<ConfigValidationError>,
    pub warnings: Vec<ConfigValidationError>,
}

impl ValidationReport {
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    fn error(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.errors.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }

    fn warn(&mut self, path: impl Into<String>, message: impl Into<String>) {
        self.warnings.push(ConfigValidationError {
            path: path.into(),
            message: message.into(),
        });
    }
}

pub fn validate(config: &LeadScanConfig) -> ValidationReport {
    let mut report = ValidationReport::default();
    validate_extraction(config, &mut report);
    validate_session(config, &mut report);
    validate_export(config, &mut report);
    validate_logging(config, &mut report);
    report
}

fn validate_extraction(config: &LeadScanConfig, report: &mut ValidationReport) {
    let Some(extraction) = &config.extraction else { return };
    if let Some(provider) = &extraction.provider {
        if !PROVIDERS.contains(&provider.to_ascii_lowercase().as_str()) {
            report.error(
                "extraction.provider",
                format!("Unknown provider '{provider}'. Use 'gemini' or 'openai'"),
            );
        }
    }
    if extraction.timeout_secs == Some(0) {
        report.error("extraction.timeoutSecs", "timeoutSecs must be > 0");
    }
    if let Some(url) = &extraction.base_url {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            report.error("extraction.baseUrl", "baseUrl must start with http:// or https://");
        }
    }
    if extraction.model.as_deref().is_some_and(|m| m.trim().is_empty()) {
        report.error("extraction.model", "model cannot be empty");
    }
}

fn validate_session(config: &LeadScanConfig, report: &mut ValidationReport) {
    let Some(session) = &config.session else { return };
    if session.success_delay_ms.is_some_and(|ms| ms > 60_000) {
        report.warn(
            "session.successDelayMs",
            "Success status will stay up for over a minute",
        );
    }
    if session
        .default_display_name
        .as_deref()
        .is_some_and(|n| n.trim().is_empty())
    {
        report.error("session.defaultDisplayName", "defaultDisplayName cannot be empty");
    }
}

fn validate_export(config: &LeadScanConfig, report: &mut ValidationReport) {
    let Some(export) = &config.export else { return };
    if let Some(product) = &export.product {
        if product.trim().is_empty() {
            report.error("export.product", "product cannot be empty");
        } else if product.contains(['/', '\\']) {
            report.error("export.product", "product is used in file names and cannot contain path separators");
        }
    }
}

fn validate_logging(config: &LeadScanConfig, report: &mut ValidationReport) {
    let Some(logging) = &config.logging else { return };
    if let Some(level) = &logging.level {
        if !LOG_LEVELS.contains(&level.to_ascii_lowercase().as_str()) {
            report.warn(
                "logging.level",
                format!("Unknown level '{level}'; it will be read as a filter directive"),
            );
        }
    }
}
