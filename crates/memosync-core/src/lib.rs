//! memosync Core - Domain types, ports and configuration
//!
//! This crate contains the hexagonal core of memosync:
//! - **Domain types** - `Memo`, `ResourceRef`, `MemoUser`, `Page`, `DateKey`, `ResumeMarker`
//! - **Port definitions** - Traits for adapters: `IMemosClient`, `IDailyNoteVault`,
//!   `IResumeStateStore`
//! - **Configuration** - YAML settings with validation and a builder
//!
//! # Architecture
//!
//! The domain module holds plain data with no I/O. Ports define the trait
//! interfaces that the API adapters (`memosync-api`) and the local vault
//! adapters (`memosync-sync`) implement. The sync engine only ever talks to
//! the ports.

pub mod config;
pub mod domain;
pub mod ports;
