//! memosync CLI - pull Memos entries into daily notes
//!
//! Provides commands for:
//! - Syncing memos into the daily notes vault
//! - Checking the configured token
//! - Inspecting and creating configuration

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use memosync_core::config::Config;
use memosync_core::ports::{ErrorKind, MemosError};
use memosync_sync::SyncError;
use tracing_subscriber::EnvFilter;

mod commands;
mod output;

use commands::{
    completions::CompletionsCommand, config::ConfigCommand, sync::SyncCommand,
    whoami::WhoamiCommand, CommandContext,
};
use output::OutputFormat;

#[derive(Debug, Parser)]
#[command(name = "memosync", version, about = "Sync Memos entries into daily notes")]
pub struct Cli {
    /// Output in JSON format
    #[arg(long, global = true)]
    json: bool,

    /// Verbose output (can be repeated: -v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Use alternate config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Minimal output
    #[arg(short, long, global = true)]
    quiet: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Sync memos into daily notes
    Sync(SyncCommand),
    /// Show the user the configured token belongs to
    Whoami(WhoamiCommand),
    /// View and manage configuration
    #[command(subcommand)]
    Config(ConfigCommand),
    /// Generate shell completions
    Completions(CompletionsCommand),
}

fn init_tracing(cli: &Cli, config_path: &std::path::Path) {
    let logging = Config::load_or_default(config_path).logging;
    let level = match (cli.verbose, cli.quiet) {
        (0, true) => "error".to_string(),
        (0, false) => logging.level,
        (1, _) => "debug".to_string(),
        _ => "trace".to_string(),
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.as_str()));

    let builder = tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .with_writer(std::io::stderr);
    if logging.json {
        builder.json().init();
    } else {
        builder.init();
    }
}

/// What the user should check for a fatal error
fn error_hint(err: &anyhow::Error) -> Option<&'static str> {
    let client_error = err
        .downcast_ref::<SyncError>()
        .and_then(SyncError::as_client_error)
        .or_else(|| err.downcast_ref::<MemosError>())?;
    Some(match client_error.kind() {
        ErrorKind::Auth => "Check memos.api_token (or MEMOSYNC_API_TOKEN) and try again.",
        ErrorKind::Protocol => {
            "The server answered in an unexpected shape. Check memos.api_version and memos.api_url."
        }
        ErrorKind::Transient => "The server could not be reached. Try again later.",
    })
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let config_path = cli.config.clone().unwrap_or_else(Config::default_path);

    init_tracing(&cli, &config_path);

    let ctx = CommandContext {
        format: if cli.json {
            OutputFormat::Json
        } else {
            OutputFormat::Human
        },
        config_path,
        quiet: cli.quiet,
    };

    let result = match &cli.command {
        Commands::Sync(cmd) => cmd.execute(&ctx).await,
        Commands::Whoami(cmd) => cmd.execute(&ctx).await,
        Commands::Config(cmd) => cmd.execute(&ctx).await,
        Commands::Completions(cmd) => cmd.execute().await,
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            let formatter = ctx.formatter();
            formatter.error(&format!("{err:#}"));
            if let Some(hint) = error_hint(&err) {
                formatter.info(hint);
            }
            ExitCode::FAILURE
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_force_conflicts_with_date() {
        let parsed = Cli::try_parse_from(["memosync", "sync", "--force", "--date", "2024-03-01"]);
        assert!(parsed.is_err());
    }

    #[test]
    fn test_parse_sync_date() {
        let cli = Cli::try_parse_from(["memosync", "sync", "--date", "2024-03-01", "--dry-run"])
            .unwrap();
        match cli.command {
            Commands::Sync(cmd) => {
                assert_eq!(cmd.date.unwrap().to_string(), "2024-03-01");
                assert!(cmd.dry_run);
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_global_flags_after_subcommand() {
        let cli = Cli::try_parse_from(["memosync", "whoami", "--json", "-vv", "--config", "/tmp/c.yaml"])
            .unwrap();
        assert!(cli.json);
        assert_eq!(cli.verbose, 2);
        assert_eq!(cli.config, Some(PathBuf::from("/tmp/c.yaml")));
    }

    #[test]
    fn test_error_hint_by_kind() {
        let auth: anyhow::Error = SyncError::Client(MemosError::Auth("x".into())).into();
        assert!(error_hint(&auth).unwrap().contains("api_token"));

        let protocol: anyhow::Error = MemosError::Protocol("x".into()).into();
        assert!(error_hint(&protocol).unwrap().contains("api_version"));

        let other = anyhow::anyhow!("disk full");
        assert!(error_hint(&other).is_none());
    }
}
