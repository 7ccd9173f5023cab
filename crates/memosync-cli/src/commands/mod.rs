//! Subcommands and the state they share

pub mod completions;
pub mod config;
pub mod sync;
pub mod whoami;

use std::path::PathBuf;

use anyhow::{Context, Result};
use memosync_core::config::Config;

use crate::output::{get_formatter, OutputFormat, OutputFormatter};

/// Global flags resolved once in `main`
#[derive(Debug, Clone)]
pub struct CommandContext {
    pub format: OutputFormat,
    pub config_path: PathBuf,
    pub quiet: bool,
}

impl CommandContext {
    pub fn formatter(&self) -> Box<dyn OutputFormatter> {
        get_formatter(self.format, self.quiet)
    }

    pub fn is_json(&self) -> bool {
        self.format == OutputFormat::Json
    }

    /// Loads the config file, or defaults when it does not exist
    ///
    /// A file that exists but does not parse is an error.
    pub fn load_config(&self) -> Result<Config> {
        if self.config_path.exists() {
            Config::load(&self.config_path).with_context(|| {
                format!("Failed to parse configuration {}", self.config_path.display())
            })
        } else {
            Ok(Config::load_or_default(&self.config_path))
        }
    }

    /// Loads the config and refuses to continue when it is invalid
    ///
    /// Only errors in the listed top-level sections count; an empty list
    /// checks everything.
    pub fn load_valid_config(&self, sections: &[&str]) -> Result<Config> {
        let config = self.load_config()?;
        let errors: Vec<_> = config
            .validate()
            .into_iter()
            .filter(|e| {
                sections.is_empty()
                    || sections
                        .iter()
                        .any(|s| e.field.split('.').next() == Some(*s))
            })
            .collect();
        if !errors.is_empty() {
            let details: Vec<String> = errors.iter().map(ToString::to_string).collect();
            anyhow::bail!(
                "Invalid configuration ({}): {}",
                self.config_path.display(),
                details.join("; ")
            );
        }
        Ok(config)
    }
}
