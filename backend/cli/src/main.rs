mod auth_cmd;
mod config_cmd;
mod context;
mod records_cmd;
mod scan_cmd;
mod terminal_output;

use std::path::PathBuf;

use anyhow::Result;
use clap::{Parser, Subcommand};
use leadscan_config::log_report;
use leadscan_logging::init_logger;

use config_cmd::ConfigCommands;
use context::AppContext;

#[derive(Parser)]
#[command(name = "leadscan")]
#[command(about = "LeadScan: turn business cards and inquiry forms into lead records")]
#[command(version)]
struct Cli {
    /// Config directory (default: $LEADSCAN_CONFIG_DIR or ~/.leadscan)
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Sign in with an e-mail address
    Login {
        #[arg(short, long)]
        email: String,
        /// Prompted for when omitted
        #[arg(short, long)]
        password: Option<String>,
    },
    /// Create an account and verify it
    Signup {
        #[arg(short, long)]
        email: String,
        /// Full name shown on the account
        #[arg(short, long)]
        name: String,
        #[arg(short, long)]
        password: Option<String>,
        /// Verify without asking
        #[arg(short, long)]
        yes: bool,
    },
    /// Sign out; records stay on this machine
    Logout {
        #[arg(short, long)]
        yes: bool,
    },
    /// Show the signed-in account
    Whoami,
    /// Extract a record from photos of a card or form
    Scan {
        /// Image files; together they are the sides or pages of one source
        #[arg(required = true)]
        files: Vec<PathBuf>,
        /// Make a separate record from every file
        #[arg(long)]
        each: bool,
    },
    /// List records, newest first
    List,
    /// Show one record in full
    Show {
        /// Record id or the short id from `list`
        id: String,
    },
    /// Delete a record
    Delete {
        id: String,
        #[arg(short, long)]
        yes: bool,
    },
    /// Export records as CSV
    Export {
        /// Write here instead of the dated file in the export directory
        #[arg(short, long)]
        output: Option<PathBuf>,
        /// Print the CSV instead of writing a file
        #[arg(long, conflicts_with = "output")]
        stdout: bool,
    },
    /// Record counts
    Stats,
    /// Inspect or change configuration
    #[command(subcommand)]
    Config(ConfigCommands),
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut ctx = AppContext::load(cli.config_dir).await?;

    let log_dir = ctx.config.log_dir(&ctx.config_dir);
    init_logger(ctx.config.log_level(), log_dir.as_deref(), ctx.config.log_json());
    log_report(&ctx.report);
    tracing::debug!(config_dir = %ctx.config_dir.display(), "Configuration ready");

    match cli.command {
        Commands::Login { email, password } => auth_cmd::login(&mut ctx, &email, password).await?,
        Commands::Signup { email, name, password, yes } => {
            auth_cmd::signup(&mut ctx, &email, &name, password, yes).await?
        }
        Commands::Logout { yes } => auth_cmd::logout(&mut ctx, yes)?,
        Commands::Whoami => auth_cmd::whoami(&ctx),
        Commands::Scan { files, each } => scan_cmd::run(&mut ctx, files, each).await?,
        Commands::List => records_cmd::list(&ctx)?,
        Commands::Show { id } => records_cmd::show(&ctx, &id)?,
        Commands::Delete { id, yes } => records_cmd::delete(&mut ctx, &id, yes)?,
        Commands::Export { output, stdout } => records_cmd::export(&ctx, output, stdout).await?,
        Commands::Stats => records_cmd::stats(&ctx)?,
        Commands::Config(cmd) => config_cmd::run(&ctx, cmd).await?,
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn parses_scan_with_each() {
        let cli = Cli::try_parse_from(["leadscan", "scan", "--each", "a.jpg", "b.jpg"]).unwrap();
        match cli.command {
            Commands::Scan { files, each } => {
                assert!(each);
                assert_eq!(files, vec![PathBuf::from("a.jpg"), PathBuf::from("b.jpg")]);
            }
            _ => panic!("expected scan"),
        }
    }

    #[test]
    fn scan_requires_files() {
        assert!(Cli::try_parse_from(["leadscan", "scan"]).is_err());
    }
}
