//! Sync command - pull memos into daily notes
//!
//! 1. Loads and validates configuration
//! 2. Builds the versioned client, the vault adapter and the engine
//! 3. Picks the mode: incremental from the saved resume marker, `--force`
//!    for the full history, `--date` for one day
//! 4. Saves the newest memo time as the next marker after a clean run

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Args;
use memosync_api::MemosClientFactory;
use memosync_core::domain::DateKey;
use memosync_core::ports::IResumeStateStore;
use memosync_sync::calendar::LocalCalendar;
use memosync_sync::resume::JsonResumeStore;
use memosync_sync::vault::MarkdownVault;
use memosync_sync::{DailyMemosSync, SyncMode, SyncOptions, SyncReport};
use tracing::info;

use super::CommandContext;
use crate::output::{plural, OutputFormatter};

#[derive(Debug, Args)]
pub struct SyncCommand {
    /// Walk the full history instead of stopping at the last sync
    #[arg(long, conflicts_with = "date")]
    pub force: bool,

    /// Only sync memos of one day (YYYY-MM-DD)
    #[arg(long, value_name = "YYYY-MM-DD")]
    pub date: Option<DateKey>,

    /// Show what would be written without touching the vault
    #[arg(long)]
    pub dry_run: bool,
}

impl SyncCommand {
    pub async fn execute(&self, ctx: &CommandContext) -> Result<()> {
        let formatter = ctx.formatter();
        let config = ctx.load_valid_config(&[])?;

        let calendar = LocalCalendar::from_config(&config.daily_notes)
            .context("Invalid daily_notes.timezone")?;
        let client = MemosClientFactory::from_config(&config.memos)
            .context("Failed to build HTTP client")?;
        let client = Arc::new(client);
        let vault = Arc::new(MarkdownVault::from_config(&config.daily_notes));
        let options = SyncOptions {
            dry_run: self.dry_run,
            ..SyncOptions::from_config(&config)
        };
        let store = JsonResumeStore::from_config(&config);

        let mode = self.mode(&store).await?;
        info!(?mode, vault = %vault.root().display(), "Running sync");

        let engine = DailyMemosSync::new(client, vault, calendar, options);
        let report = engine.run(mode).await?;

        let saved = self.save_marker(&store, mode, &report).await?;

        if ctx.is_json() {
            let mut json = serde_json::to_value(&report).context("Failed to serialize report")?;
            json["resume_marker_saved"] = serde_json::Value::Bool(saved);
            formatter.print_json(&json);
        } else {
            print_report(&*formatter, &report);
        }
        Ok(())
    }

    async fn mode(&self, store: &JsonResumeStore) -> Result<SyncMode> {
        if let Some(date) = self.date {
            return Ok(SyncMode::Date(date));
        }
        if self.force {
            return Ok(SyncMode::Force);
        }
        let last_time = store
            .load()
            .await
            .with_context(|| format!("Failed to load {}", store.path().display()))?;
        Ok(SyncMode::Incremental { last_time })
    }

    /// Persists the next resume marker; single-date runs never move it
    async fn save_marker(
        &self,
        store: &JsonResumeStore,
        mode: SyncMode,
        report: &SyncReport,
    ) -> Result<bool> {
        if report.dry_run || matches!(mode, SyncMode::Date(_)) {
            return Ok(false);
        }
        let Some(marker) = report.next_marker() else {
            return Ok(false);
        };
        store
            .save(&marker)
            .await
            .with_context(|| format!("Failed to save {}", store.path().display()))?;
        Ok(true)
    }
}

fn print_report(formatter: &dyn OutputFormatter, report: &SyncReport) {
    let verb = if report.dry_run { "Would add" } else { "Added" };
    formatter.success(&format!(
        "{} {} memo{} to {} daily note{}",
        verb,
        report.memos_added,
        plural(report.memos_added as usize),
        report.dates_written.len(),
        plural(report.dates_written.len()),
    ));
    for date in &report.dates_written {
        formatter.info(&format!("{}", date));
    }
    if report.dates_unchanged > 0 {
        formatter.info(&format!("Already up to date: {} day(s)", report.dates_unchanged));
    }
    if report.attachments_written > 0 {
        formatter.info(&format!("Attachments saved: {}", report.attachments_written));
    }
    if report.attachments_failed > 0 {
        formatter.warn(&format!(
            "{} attachment(s) could not be downloaded; placeholders were left in the notes",
            report.attachments_failed
        ));
    }
    formatter.info(&format!("Completed in {} ms", report.duration_ms));
}
