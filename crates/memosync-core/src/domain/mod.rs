//! Domain types for memosync
//!
//! - Newtypes for identifiers and validated values (`MemoId`, `DateKey`,
//!   `ResumeMarker`, `ApiVersion`)
//! - Remote memo data (`Memo`, `ResourceRef`, `MemoUser`, `Page`)
//! - Domain-specific error types

pub mod errors;
pub mod memo;
pub mod newtypes;

pub use errors::DomainError;
pub use memo::{Memo, MemoStatus, MemoUser, Page, ResourceRef};
pub use newtypes::{ApiVersion, DateKey, MemoId, ResumeMarker};
