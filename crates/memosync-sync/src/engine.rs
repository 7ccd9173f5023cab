//! Sync orchestrator
//!
//! [`DailyMemosSync`] resolves the current user, walks the date buckets
//! produced by [`MemosPaginator`] and merges each one into its daily note.
//!
//! ## Failure semantics
//!
//! - Client errors (auth, transient, protocol) abort the run unchanged.
//!   Notes written for earlier dates stay written.
//! - A failing attachment becomes a placeholder in the merged block.
//! - Attachments are only downloaded for memos missing from the note.

use std::sync::Arc;
use std::time::Instant;

use chrono::{DateTime, Utc};
use memosync_core::config::Config;
use memosync_core::domain::{DateKey, MemoUser, ResumeMarker};
use memosync_core::ports::{IDailyNoteVault, IMemosClient};
use tracing::{debug, info, instrument};

use crate::attachments::AttachmentResolver;
use crate::calendar::{DatePartitioner, LocalCalendar};
use crate::cursor::PaginationCursor;
use crate::merger::DocumentMerger;
use crate::paginator::{BucketFilter, DateBucket, MemosPaginator};
use crate::render::{self, MemoBlock};
use crate::SyncError;

/// What part of the history a run covers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyncMode {
    /// Stop at the first memo created at or before `last_time`
    Incremental { last_time: Option<ResumeMarker> },
    /// Walk the full history
    Force,
    /// Walk the history, merging only one date
    Date(DateKey),
}

#[derive(Debug, Clone)]
pub struct SyncOptions {
    pub page_size: u32,
    /// Section heading (`Memos` or a full `## ...` line)
    pub header: String,
    /// Vault-relative folder for downloaded attachments
    pub attachment_folder: String,
    /// Compute merges without writing anything
    pub dry_run: bool,
}

impl Default for SyncOptions {
    fn default() -> Self {
        Self {
            page_size: 50,
            header: "Memos".to_string(),
            attachment_folder: "Attachments".to_string(),
            dry_run: false,
        }
    }
}

impl SyncOptions {
    pub fn from_config(config: &Config) -> Self {
        Self {
            page_size: config.memos.page_size,
            header: config.daily_notes.header.clone(),
            attachment_folder: config.daily_notes.attachment_folder.clone(),
            dry_run: false,
        }
    }
}

/// Summary of a completed run
#[derive(Debug, Clone, Default, PartialEq, Eq, serde::Serialize)]
pub struct SyncReport {
    /// Dates whose note changed (or would change on a dry run)
    pub dates_written: Vec<DateKey>,
    /// Dates whose note already held every memo
    pub dates_unchanged: u32,
    /// Dates rejected by the mode's filter
    pub dates_skipped: u32,
    pub memos_added: u32,
    pub attachments_written: u32,
    pub attachments_failed: u32,
    /// Creation time of the newest memo seen, the next resume marker
    pub newest_memo_time: Option<DateTime<Utc>>,
    pub dry_run: bool,
    pub duration_ms: u64,
}

impl SyncReport {
    pub fn next_marker(&self) -> Option<ResumeMarker> {
        self.newest_memo_time.map(ResumeMarker::new)
    }
}

pub struct DailyMemosSync {
    client: Arc<dyn IMemosClient>,
    vault: Arc<dyn IDailyNoteVault>,
    partitioner: DatePartitioner,
    merger: DocumentMerger,
    options: SyncOptions,
}

impl DailyMemosSync {
    pub fn new(
        client: Arc<dyn IMemosClient>,
        vault: Arc<dyn IDailyNoteVault>,
        calendar: LocalCalendar,
        options: SyncOptions,
    ) -> Self {
        Self {
            client,
            vault,
            partitioner: DatePartitioner::new(calendar),
            merger: DocumentMerger::new(&options.header),
            options,
        }
    }

    pub fn options(&self) -> &SyncOptions {
        &self.options
    }

    /// Lazy bucket sequence for `user`
    ///
    /// Stops at `last_time` when given; `filter` runs once per date before
    /// any merge or attachment work for it.
    pub fn paginate(
        &self,
        user: MemoUser,
        last_time: Option<ResumeMarker>,
        filter: Option<BucketFilter>,
    ) -> MemosPaginator {
        let cursor = PaginationCursor::new(
            Arc::clone(&self.client),
            user,
            self.options.page_size,
            last_time,
        );
        let paginator = MemosPaginator::new(cursor, self.partitioner);
        match filter {
            Some(filter) => paginator.with_filter(filter),
            None => paginator,
        }
    }

    #[instrument(skip(self), fields(api_version = %self.client.api_version(), dry_run = self.options.dry_run))]
    pub async fn run(&self, mode: SyncMode) -> Result<SyncReport, SyncError> {
        let start = Instant::now();
        let mut report = SyncReport {
            dry_run: self.options.dry_run,
            ..SyncReport::default()
        };

        let user = self.client.resolve_current_user().await?;
        info!(user = %user.name, ?mode, "Starting memo sync");

        let mut paginator = match mode {
            SyncMode::Incremental { last_time } => self.paginate(user, last_time, None),
            SyncMode::Force => self.paginate(user, None, None),
            SyncMode::Date(target) => self
                .paginate(user, None, Some(Box::new(move |date, _| *date == target)))
                .with_oldest_date(target),
        };

        while let Some(bucket) = paginator.next_bucket().await? {
            self.sync_bucket(&bucket, &mut report).await?;
        }

        report.dates_skipped = paginator.skipped();
        report.newest_memo_time = paginator.newest_seen();
        report.duration_ms = start.elapsed().as_millis() as u64;

        info!(
            dates_written = report.dates_written.len(),
            dates_unchanged = report.dates_unchanged,
            memos_added = report.memos_added,
            attachments_failed = report.attachments_failed,
            pages = paginator.pages_fetched(),
            duration_ms = report.duration_ms,
            "Memo sync complete"
        );
        Ok(report)
    }

    #[instrument(skip(self, bucket, report), fields(date = %bucket.date, memos = bucket.len()))]
    async fn sync_bucket(
        &self,
        bucket: &DateBucket,
        report: &mut SyncReport,
    ) -> Result<(), SyncError> {
        let existing = self
            .vault
            .read_daily_note(&bucket.date)
            .await
            .map_err(SyncError::Vault)?
            .unwrap_or_default();

        let missing = self.merger.missing(&existing, bucket);
        if missing.is_empty() {
            debug!("All memos already present");
            report.dates_unchanged += 1;
            return Ok(());
        }

        let resolver = AttachmentResolver::new(
            Arc::clone(&self.client),
            Arc::clone(&self.vault),
            self.options.attachment_folder.clone(),
            self.options.dry_run,
        );
        let mut blocks: Vec<MemoBlock> = Vec::with_capacity(missing.len());
        for memo in missing {
            let resolved = resolver.resolve(&memo.memo).await;
            report.attachments_written += resolved.written;
            report.attachments_failed += resolved.failed;
            blocks.push(render::render_block(memo, &resolved.links));
        }

        let merged = self.merger.merge_blocks(&existing, &blocks);
        if !merged.changed {
            report.dates_unchanged += 1;
            return Ok(());
        }

        if !self.options.dry_run {
            self.vault
                .write_daily_note(&bucket.date, &merged.text)
                .await
                .map_err(SyncError::Vault)?;
        }
        report.memos_added += merged.added as u32;
        report.dates_written.push(bucket.date);
        info!(added = merged.added, "Daily note updated");
        Ok(())
    }
}
