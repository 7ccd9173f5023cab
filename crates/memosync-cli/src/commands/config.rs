//! Config command - inspect and manage the memosync configuration
//!
//! - `show` prints the effective configuration (token redacted)
//! - `validate` reports every problem in the file at once
//! - `path` prints where the file is looked up
//! - `init` writes a default file to start from

use anyhow::{Context, Result};
use clap::Subcommand;
use memosync_core::config::Config;
use tracing::info;

use super::CommandContext;
use crate::output::plural;

#[derive(Debug, Subcommand)]
pub enum ConfigCommand {
    /// Display the effective configuration
    Show,
    /// Validate the configuration file
    Validate,
    /// Print the configuration file path
    Path,
    /// Write a default configuration file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl ConfigCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        match self {
            ConfigCommand::Show => self.execute_show(ctx).await,
            ConfigCommand::Validate => self.execute_validate(ctx).await,
            ConfigCommand::Path => self.execute_path(ctx).await,
            ConfigCommand::Init { force } => self.execute_init(ctx, *force).await,
        }
    }

    async fn execute_show(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = redacted(ctx.load_config()?);

        info!(config_path = %ctx.config_path.display(), "Showing configuration");

        if ctx.is_json() {
            let json = serde_json::to_value(&config)
                .context("Failed to serialize configuration to JSON")?;
            formatter.print_json(&json);
        } else {
            let source = if ctx.config_path.exists() {
                ctx.config_path.display().to_string()
            } else {
                "defaults".to_string()
            };
            formatter.success(&format!("Configuration ({})", source));
            formatter.info("");
            let yaml = config.to_yaml()?;
            for line in yaml.lines() {
                formatter.info(line);
            }
        }
        Ok(())
    }

    async fn execute_validate(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let path = &ctx.config_path;

        if !path.exists() {
            if ctx.is_json() {
                formatter.print_json(&serde_json::json!({
                    "valid": false,
                    "config_path": path.display().to_string(),
                    "errors": ["Configuration file not found"],
                }));
            } else {
                formatter.error(&format!("Configuration file not found at {}", path.display()));
                formatter.info("Run 'memosync config init' to create one.");
            }
            return Ok(());
        }

        let config = ctx.load_config()?;
        info!(config_path = %path.display(), "Validating configuration");
        let errors = config.validate();

        if ctx.is_json() {
            let error_strings: Vec<String> = errors.iter().map(|e| e.to_string()).collect();
            formatter.print_json(&serde_json::json!({
                "valid": errors.is_empty(),
                "config_path": path.display().to_string(),
                "errors": error_strings,
            }));
        } else if errors.is_empty() {
            formatter.success("Configuration is valid");
            formatter.info(&format!("File: {}", path.display()));
        } else {
            formatter.error(&format!(
                "Configuration has {} error{}:",
                errors.len(),
                plural(errors.len())
            ));
            formatter.info(&format!("File: {}", path.display()));
            formatter.info("");
            for error in &errors {
                formatter.info(&format!("  {} - {}", error.field, error.message));
            }
        }

        Ok(())
    }

    async fn execute_path(&self, ctx: &CommandContext) -> Result<()> {
        if ctx.is_json() {
            ctx.formatter().print_json(&serde_json::json!({
                "config_path": ctx.config_path.display().to_string(),
                "exists": ctx.config_path.exists(),
            }));
        } else {
            println!("{}", ctx.config_path.display());
        }
        Ok(())
    }

    async fn execute_init(&self, ctx: &CommandContext, force: bool) -> Result<()> {
        let formatter = ctx.formatter();
        let path = &ctx.config_path;

        if path.exists() && !force {
            anyhow::bail!(
                "{} already exists (use --force to overwrite)",
                path.display()
            );
        }

        write_default_config(path)?;
        info!(config_path = %path.display(), "Wrote default configuration");

        if ctx.is_json() {
            formatter.print_json(&serde_json::json!({
                "success": true,
                "config_path": path.display().to_string(),
            }));
        } else {
            formatter.success(&format!("Wrote {}", path.display()));
            formatter.info("Set memos.api_url and memos.api_token, then run 'memosync whoami'.");
        }
        Ok(())
    }
}

fn write_default_config(path: &std::path::Path) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).context("Failed to create configuration directory")?;
    }
    let yaml = Config::default().to_yaml()?;
    std::fs::write(path, yaml)
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

fn redacted(mut config: Config) -> Config {
    if !config.memos.api_token.is_empty() {
        config.memos.api_token = "[REDACTED]".to_string();
    }
    config
}
