//! Integration tests for memosync-api
//!
//! Uses wiremock to stand in for Memos servers of each supported release
//! and drives the clients through the `IMemosClient` port.

mod common;

mod test_factory;
mod test_v0191;
mod test_v0220;
mod test_v0240;
