//! Lazy per-date memo sequence
//!
//! [`MemosPaginator`] pulls pages from a [`PaginationCursor`] only when the
//! consumer asks for the next bucket, so at most one page plus one date's
//! memos are held in memory. A bucket is complete once a memo of another
//! date arrives (or the cursor ends). Buckets come out in first-seen order,
//! which for a newest-first list is most recent date first.

use std::collections::VecDeque;
use std::fmt;

use chrono::{DateTime, Utc};
use futures_util::stream::{self, Stream};
use memosync_core::domain::DateKey;
use memosync_core::ports::MemosResult;
use tracing::debug;

use crate::calendar::{DatePartitioner, DatedMemo};
use crate::cursor::{CursorState, PaginationCursor};

/// Memos sharing one local calendar date, newest first
#[derive(Debug, Clone, PartialEq)]
pub struct DateBucket {
    pub date: DateKey,
    pub memos: Vec<DatedMemo>,
}

impl DateBucket {
    fn start(memo: DatedMemo) -> Self {
        Self {
            date: memo.date,
            memos: vec![memo],
        }
    }

    pub fn len(&self) -> usize {
        self.memos.len()
    }

    pub fn is_empty(&self) -> bool {
        self.memos.is_empty()
    }
}

/// Decides whether a finished bucket is handed to the consumer
pub type BucketFilter = Box<dyn Fn(&DateKey, &DateBucket) -> bool + Send + Sync>;

pub struct MemosPaginator {
    cursor: PaginationCursor,
    partitioner: DatePartitioner,
    filter: Option<BucketFilter>,
    oldest_date: Option<DateKey>,
    pending: VecDeque<DatedMemo>,
    current: Option<DateBucket>,
    skipped: u32,
}

impl fmt::Debug for MemosPaginator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MemosPaginator")
            .field("state", &self.cursor.state())
            .field("pages_fetched", &self.cursor.pages_fetched())
            .field("has_filter", &self.filter.is_some())
            .field("oldest_date", &self.oldest_date)
            .field("skipped", &self.skipped)
            .finish()
    }
}

impl MemosPaginator {
    pub fn new(cursor: PaginationCursor, partitioner: DatePartitioner) -> Self {
        Self {
            cursor,
            partitioner,
            filter: None,
            oldest_date: None,
            pending: VecDeque::new(),
            current: None,
            skipped: 0,
        }
    }

    /// Only emit buckets the filter accepts; it runs once per date
    #[must_use]
    pub fn with_filter(mut self, filter: BucketFilter) -> Self {
        self.filter = Some(filter);
        self
    }

    /// End the sequence at the first memo dated before `date`
    #[must_use]
    pub fn with_oldest_date(mut self, date: DateKey) -> Self {
        self.oldest_date = Some(date);
        self
    }

    pub fn cursor_state(&self) -> CursorState {
        self.cursor.state()
    }

    pub fn pages_fetched(&self) -> u32 {
        self.cursor.pages_fetched()
    }

    /// Number of buckets rejected by the filter so far
    pub fn skipped(&self) -> u32 {
        self.skipped
    }

    pub fn newest_seen(&self) -> Option<DateTime<Utc>> {
        self.cursor.newest_seen()
    }

    /// Returns the next accepted bucket, or `None` when the sequence ends
    ///
    /// Client errors are passed through unchanged.
    pub async fn next_bucket(&mut self) -> MemosResult<Option<DateBucket>> {
        loop {
            while let Some(memo) = self.pending.pop_front() {
                if self.oldest_date.is_some_and(|oldest| memo.date < oldest) {
                    debug!(date = %memo.date, "Passed oldest requested date");
                    self.pending.clear();
                    self.cursor.stop();
                    break;
                }

                let same_date = self.current.as_ref().is_some_and(|b| b.date == memo.date);
                if same_date {
                    if let Some(bucket) = self.current.as_mut() {
                        bucket.memos.push(memo);
                    }
                    continue;
                }

                let finished = self.current.replace(DateBucket::start(memo));
                if let Some(bucket) = finished.and_then(|b| self.admit(b)) {
                    return Ok(Some(bucket));
                }
            }

            match self.cursor.next_page().await? {
                Some(memos) => {
                    let partitioner = self.partitioner;
                    self.pending
                        .extend(memos.into_iter().map(|m| partitioner.partition(m)));
                }
                None => match self.current.take() {
                    Some(bucket) => {
                        if let Some(bucket) = self.admit(bucket) {
                            return Ok(Some(bucket));
                        }
                    }
                    None => return Ok(None),
                },
            }
        }
    }

    fn admit(&mut self, bucket: DateBucket) -> Option<DateBucket> {
        let accepted = self
            .filter
            .as_ref()
            .map_or(true, |filter| filter(&bucket.date, &bucket));
        if accepted {
            debug!(date = %bucket.date, memos = bucket.len(), "Date bucket ready");
            Some(bucket)
        } else {
            self.skipped += 1;
            debug!(date = %bucket.date, memos = bucket.len(), "Date bucket skipped by filter");
            None
        }
    }

    /// The bucket sequence as a `Stream`
    pub fn into_stream(self) -> impl Stream<Item = MemosResult<DateBucket>> + Send {
        stream::try_unfold(self, |mut paginator| async move {
            Ok(paginator
                .next_bucket()
                .await?
                .map(|bucket| (bucket, paginator)))
        })
    }
}
