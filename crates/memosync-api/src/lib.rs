//! memosync API - Memos server clients
//!
//! One adapter per server generation, all implementing
//! [`IMemosClient`](memosync_core::ports::IMemosClient):
//!
//! - [`v0191`] - REST API of servers before v0.21 (offset pagination,
//!   client-side creator filtering)
//! - [`gateway`] - JSON gateway of the gRPC services for v0.22.x - v0.23.x
//!   (creator filter expression) and v0.24.x onwards (user-scoped listing)
//! - [`factory`] - Selects the variant from configuration once, at startup
//! - [`http`] - Shared HTTP plumbing and status-to-error classification

pub mod factory;
pub mod gateway;
pub mod http;
pub mod v0191;

pub use factory::{MemosClientFactory, VersionedClient};
pub use gateway::GatewayClient;
pub use http::MemosHttp;
pub use v0191::MemosClient0191;
