//! `leadscan config` subcommands.

use anyhow::{Context, Result};
use clap::Subcommand;
use leadscan_config::{
    apply_merge_patch, config_file_path, load_config, patch_for_path, redact, validate,
    write_config,
};

use crate::context::AppContext;
use crate::terminal_output::{note_error, note_success, note_warn};

#[derive(Subcommand)]
pub enum ConfigCommands {
    /// Print the effective config with secrets masked
    Show,
    /// Print the config file location
    Path,
    /// Set one value, e.g. `leadscan config set extraction.provider openai`
    Set { key: String, value: String },
}

pub async fn run(ctx: &AppContext, cmd: ConfigCommands) -> Result<()> {
    let path = config_file_path(&ctx.config_dir);
    match cmd {
        ConfigCommands::Show => {
            let value = serde_json::to_value(&ctx.config)?;
            print!("{}", serde_yaml::to_string(&redact(&value))?);
        }
        ConfigCommands::Path => println!("{}", path.display()),
        ConfigCommands::Set { key, value } => {
            // Patch the file as written, not the env-resolved effective config.
            let current = load_config(&path).await?;
            let patch = patch_for_path(&key, &value)?;
            let updated = apply_merge_patch(&current, &patch)
                .with_context(|| format!("'{value}' is not a valid value for {key}"))?;
            let report = validate(&updated);
            for warning in &report.warnings {
                note_warn(&warning.to_string());
            }
            if !report.is_valid() {
                for error in &report.errors {
                    note_error(&error.to_string());
                }
                anyhow::bail!("Config not saved");
            }
            write_config(&updated, &path).await?;
            note_success(&format!("Set {key} in {}", path.display()));
        }
    }
    Ok(())
}
