//! Config defaults: fill every unset scalar so the effective config can be
//! shown in full.

use crate::schema::{
    ExportConfig, ExtractionConfig, LeadScanConfig, LoggingConfig, SessionConfig,
};

pub const DEFAULT_PROVIDER: &str = "gemini";
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;
pub const DEFAULT_DATA_DIR: &str = "data";
pub const DEFAULT_SUCCESS_DELAY_MS: u64 = 2000;
pub const DEFAULT_AUTH_DELAY_MS: u64 = 0;
pub const DEFAULT_DISPLAY_NAME: &str = "LeadScan User";
pub const DEFAULT_EXPORT_PRODUCT: &str = "leadscan";
pub const DEFAULT_LOG_LEVEL: &str = "info";

pub fn apply_all_defaults(config: LeadScanConfig) -> LeadScanConfig {
    let config = apply_extraction_defaults(config);
    let config = apply_session_defaults(config);
    let config = apply_export_defaults(config);
    apply_logging_defaults(config)
}

fn apply_extraction_defaults(mut config: LeadScanConfig) -> LeadScanConfig {
    let extraction = config.extraction.get_or_insert_with(ExtractionConfig::default);
    extraction
        .provider
        .get_or_insert_with(|| DEFAULT_PROVIDER.to_string());
    extraction.timeout_secs.get_or_insert(DEFAULT_TIMEOUT_SECS);
    config
}

fn apply_session_defaults(mut config: LeadScanConfig) -> LeadScanConfig {
    let session = config.session.get_or_insert_with(SessionConfig::default);
    session.success_delay_ms.get_or_insert(DEFAULT_SUCCESS_DELAY_MS);
    session.auth_delay_ms.get_or_insert(DEFAULT_AUTH_DELAY_MS);
    session
        .default_display_name
        .get_or_insert_with(|| DEFAULT_DISPLAY_NAME.to_string());
    config
}

fn apply_export_defaults(mut config: LeadScanConfig) -> LeadScanConfig {
    let export = config.export.get_or_insert_with(ExportConfig::default);
    export
        .product
        .get_or_insert_with(|| DEFAULT_EXPORT_PRODUCT.to_string());
    config
}

fn apply_logging_defaults(mut config: LeadScanConfig) -> LeadScanConfig {
    let logging = config.logging.get_or_insert_with(LoggingConfig::default);
    logging
        .level
        .get_or_insert_with(|| DEFAULT_LOG_LEVEL.to_string());
    logging.json.get_or_insert(true);
    config
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fills_every_section() {
        let cfg = apply_all_defaults(LeadScanConfig::default());
        let extraction = cfg.extraction.unwrap();
        assert_eq!(extraction.provider.as_deref(), Some("gemini"));
        assert_eq!(extraction.timeout_secs, Some(60));
        assert_eq!(cfg.session.unwrap().success_delay_ms, Some(2000));
        assert_eq!(cfg.export.unwrap().product.as_deref(), Some("leadscan"));
        assert_eq!(cfg.logging.unwrap().level.as_deref(), Some("info"));
    }

    #[test]
    fn keeps_user_values() {
        let cfg = LeadScanConfig {
            session: Some(SessionConfig {
                success_delay_ms: Some(250),
                ..Default::default()
            }),
            ..Default::default()
        };
        let cfg = apply_all_defaults(cfg);
        let session = cfg.session.unwrap();
        assert_eq!(session.success_delay_ms, Some(250));
        assert_eq!(session.default_display_name.as_deref(), Some("LeadScan User"));
    }
}
