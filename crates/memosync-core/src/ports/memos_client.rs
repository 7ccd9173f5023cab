//! Memos client port (driven/secondary port)
//!
//! Every supported server generation is adapted to this one contract.
//!
//! ## Design Notes
//!
//! - Unlike the vault port, errors here are classified with [`MemosError`]:
//!   the sync engine and the caller react differently to an expired token,
//!   a network failure and a wrong API version, so the kind must survive
//!   every layer unchanged.
//! - No implementation retries internally; retry policy belongs to whoever
//!   re-invokes the sync.

use thiserror::Error;

use crate::domain::{ApiVersion, MemoUser, Page, ResourceRef};

/// Classification of a [`MemosError`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Auth,
    Transient,
    Protocol,
}

/// Errors surfaced by a Memos API adapter
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum MemosError {
    /// The token is missing, invalid or expired
    #[error("Authentication failed: {0}")]
    Auth(String),

    /// Network or transport failure; a later run may succeed
    #[error("Transient failure: {0}")]
    Transient(String),

    /// The response did not have the expected shape, usually because the
    /// configured API version does not match the server
    #[error("Protocol error: {0}")]
    Protocol(String),
}

impl MemosError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Auth(_) => ErrorKind::Auth,
            Self::Transient(_) => ErrorKind::Transient,
            Self::Protocol(_) => ErrorKind::Protocol,
        }
    }

    /// Returns true if re-running the sync later may succeed
    pub fn is_retryable(&self) -> bool {
        self.kind() == ErrorKind::Transient
    }
}

pub type MemosResult<T> = Result<T, MemosError>;

/// Port trait for one remote Memos API generation
///
/// ## Implementation Notes
///
/// - `list_page` returns memos newest first. Implementations whose wire
///   format cannot filter by creator must filter client-side so that only
///   memos of `current_user` are returned.
/// - Archived memos are dropped by the adapter.
/// - A `None` page token requests the first page.
#[async_trait::async_trait]
pub trait IMemosClient: Send + Sync {
    /// The API generation this client speaks
    fn api_version(&self) -> ApiVersion;

    /// Resolves the user the configured token belongs to
    async fn resolve_current_user(&self) -> MemosResult<MemoUser>;

    /// Fetches one page of the current user's memos
    ///
    /// # Arguments
    /// * `page_size` - Maximum number of memos to request
    /// * `page_token` - Continuation token from the previous page
    /// * `current_user` - Owner whose memos are listed
    async fn list_page(
        &self,
        page_size: u32,
        page_token: Option<&str>,
        current_user: &MemoUser,
    ) -> MemosResult<Page>;

    /// Downloads the bytes of an attachment
    async fn fetch_resource(&self, resource: &ResourceRef) -> MemosResult<Vec<u8>>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_mapping() {
        assert_eq!(MemosError::Auth("x".into()).kind(), ErrorKind::Auth);
        assert_eq!(
            MemosError::Transient("x".into()).kind(),
            ErrorKind::Transient
        );
        assert_eq!(MemosError::Protocol("x".into()).kind(), ErrorKind::Protocol);
    }

    #[test]
    fn test_only_transient_is_retryable() {
        assert!(MemosError::Transient("timeout".into()).is_retryable());
        assert!(!MemosError::Auth("expired".into()).is_retryable());
        assert!(!MemosError::Protocol("404".into()).is_retryable());
    }
}
