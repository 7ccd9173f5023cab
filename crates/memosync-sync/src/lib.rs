//! memosync Sync - pagination and merge engine
//!
//! Turns the newest-first memo list of a Memos server into per-date
//! batches and merges them into local daily notes without duplicates.
//!
//! ## Modules
//!
//! - [`calendar`] - Local calendar conversion and date partitioning
//! - [`cursor`] - Page-fetching state machine with resume boundary
//! - [`paginator`] - Lazy sequence of per-date memo buckets
//! - [`render`] - Daily-note block format and identity markers
//! - [`merger`] - Section-aware, idempotent document merge
//! - [`attachments`] - Resource download into the vault
//! - [`engine`] - The sync orchestrator
//! - [`vault`] - Filesystem adapter for daily notes (atomic writes)
//! - [`resume`] - JSON file store for the resume marker

pub mod attachments;
pub mod calendar;
pub mod cursor;
pub mod engine;
pub mod merger;
pub mod paginator;
pub mod render;
pub mod resume;
pub mod vault;

use memosync_core::domain::DomainError;
use memosync_core::ports::MemosError;
use thiserror::Error;

pub use engine::{DailyMemosSync, SyncMode, SyncOptions, SyncReport};

/// Errors that abort a sync run
#[derive(Debug, Error)]
pub enum SyncError {
    /// Failure reported by the Memos client, kind preserved
    #[error(transparent)]
    Client(#[from] MemosError),

    /// Reading or writing a daily note failed
    #[error("Vault error: {0:#}")]
    Vault(anyhow::Error),

    /// A domain-level error propagated from memosync-core
    #[error("Domain error: {0}")]
    Domain(#[from] DomainError),
}

impl SyncError {
    /// The client error behind this failure, if any
    pub fn as_client_error(&self) -> Option<&MemosError> {
        match self {
            Self::Client(err) => Some(err),
            _ => None,
        }
    }
}
