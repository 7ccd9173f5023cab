//! Remote memo data
//!
//! These are the version-neutral shapes every API adapter normalizes into.
//! They are owned transiently by one sync run and never cached beyond it.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::newtypes::MemoId;

/// Lifecycle status of a memo on the server
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum MemoStatus {
    /// Visible, regular memo
    Normal,
    /// Archived by the user; never synced
    Archived,
}

/// A single timestamped note entry from the remote service
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Memo {
    /// Server identity, stable across pages
    pub id: MemoId,
    /// Server-authoritative creation instant
    pub created_at: DateTime<Utc>,
    /// Raw memo text
    pub content: String,
    /// Visibility flag as reported by the server (`PRIVATE`, `PUBLIC`, ...)
    pub visibility: String,
    pub status: MemoStatus,
    /// Creator reference (`"1"` on v0.19.1, `"users/1"` on gRPC servers)
    pub creator: String,
    /// Attachments referenced by the memo
    #[serde(default)]
    pub resources: Vec<ResourceRef>,
}

/// A binary attachment referenced from a memo
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceRef {
    /// Server identity (`"7"` or `"resources/7"`)
    pub id: String,
    /// Original filename of the attachment
    pub filename: String,
    /// Link to externally hosted content, if the server did not store bytes
    pub external_link: Option<String>,
    /// MIME type reported by the server
    pub mime_type: Option<String>,
}

impl ResourceRef {
    /// Returns true if the attachment should be embedded as an image
    pub fn is_image(&self) -> bool {
        if let Some(mime) = &self.mime_type {
            return mime.starts_with("image/");
        }
        let lower = self.filename.to_ascii_lowercase();
        [".png", ".jpg", ".jpeg", ".gif", ".webp", ".svg", ".bmp"]
            .iter()
            .any(|ext| lower.ends_with(ext))
    }

    /// Returns the external link when the attachment lives outside the server
    pub fn external(&self) -> Option<&str> {
        self.external_link
            .as_deref()
            .map(str::trim)
            .filter(|link| !link.is_empty())
    }
}

/// The authenticated user on the remote server
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoUser {
    /// Creator reference used to match memos (`"1"` or `"users/1"`)
    pub name: String,
    /// Login name
    pub username: String,
    /// Display name, if set
    pub nickname: Option<String>,
}

/// One bounded fetch result plus its continuation token
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Page {
    /// Memos in remote order (newest first)
    pub memos: Vec<Memo>,
    /// Token for the following page; `None` when the list is exhausted
    pub next_page_token: Option<String>,
}

impl Page {
    /// Returns true when no further page can be requested
    pub fn is_last(&self) -> bool {
        self.next_page_token
            .as_deref()
            .map_or(true, |token| token.is_empty())
    }
}
