//! Page-fetching state machine
//!
//! ```text
//!            non-empty token, boundary not reached
//!              ┌──────────┐
//!              ▼          │
//!   start ─► Fetching ────┘
//!              │   │
//!  empty token │   │ memo at or before lastTime
//!              ▼   ▼
//!       Exhausted  Stopped
//! ```
//!
//! The remote list is ordered newest-first, so once a memo on or behind
//! the resume boundary shows up no later page can hold anything new. A
//! cursor is single-use; build a fresh one for every sync run.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use memosync_core::domain::{Memo, MemoUser, ResumeMarker};
use memosync_core::ports::{IMemosClient, MemosResult};
use tracing::{debug, info, warn};

/// Cursor lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CursorState {
    Fetching,
    /// The server reported no further pages
    Exhausted,
    /// The resume boundary was crossed (or the consumer stopped early)
    Stopped,
}

impl CursorState {
    pub fn is_terminal(self) -> bool {
        !matches!(self, Self::Fetching)
    }
}

pub struct PaginationCursor {
    client: Arc<dyn IMemosClient>,
    user: MemoUser,
    page_size: u32,
    page_token: Option<String>,
    last_time: Option<ResumeMarker>,
    state: CursorState,
    pages_fetched: u32,
    newest_seen: Option<DateTime<Utc>>,
}

impl PaginationCursor {
    pub fn new(
        client: Arc<dyn IMemosClient>,
        user: MemoUser,
        page_size: u32,
        last_time: Option<ResumeMarker>,
    ) -> Self {
        Self {
            client,
            user,
            page_size: page_size.max(1),
            page_token: None,
            last_time,
            state: CursorState::Fetching,
            pages_fetched: 0,
            newest_seen: None,
        }
    }

    pub fn state(&self) -> CursorState {
        self.state
    }

    pub fn pages_fetched(&self) -> u32 {
        self.pages_fetched
    }

    /// Creation time of the newest memo handed out so far
    pub fn newest_seen(&self) -> Option<DateTime<Utc>> {
        self.newest_seen
    }

    /// Ends the sequence without fetching any further page
    pub fn stop(&mut self) {
        if self.state == CursorState::Fetching {
            debug!(pages = self.pages_fetched, "Cursor stopped by consumer");
            self.state = CursorState::Stopped;
        }
    }

    /// Fetches the next page
    ///
    /// Returns `Ok(None)` once the cursor is in a terminal state. Memos on
    /// or behind the resume boundary are dropped from the returned page.
    /// Client errors are returned unchanged and leave the cursor where it
    /// was.
    pub async fn next_page(&mut self) -> MemosResult<Option<Vec<Memo>>> {
        if self.state.is_terminal() {
            return Ok(None);
        }

        let page = self
            .client
            .list_page(self.page_size, self.page_token.as_deref(), &self.user)
            .await?;
        self.pages_fetched += 1;

        let fetched = page.memos.len();
        let mut memos = page.memos;
        if let Some(boundary) = self.last_time {
            if let Some(cut) = memos
                .iter()
                .position(|m| boundary.is_reached_by(&m.created_at))
            {
                memos.truncate(cut);
                self.state = CursorState::Stopped;
                info!(
                    page = self.pages_fetched,
                    kept = memos.len(),
                    boundary = %boundary,
                    "Reached resume boundary"
                );
            }
        }

        for memo in &memos {
            if self.newest_seen.map_or(true, |t| memo.created_at > t) {
                self.newest_seen = Some(memo.created_at);
            }
        }

        if self.state == CursorState::Fetching {
            match page.next_page_token.filter(|t| !t.is_empty()) {
                None => self.state = CursorState::Exhausted,
                Some(token) if self.page_token.as_deref() == Some(token.as_str()) => {
                    warn!(token = %token, "Server repeated the page token, treating list as exhausted");
                    self.state = CursorState::Exhausted;
                }
                Some(token) => self.page_token = Some(token),
            }
        }

        debug!(
            page = self.pages_fetched,
            items = fetched,
            kept = memos.len(),
            state = ?self.state,
            "Fetched memo page"
        );
        Ok(Some(memos))
    }
}
