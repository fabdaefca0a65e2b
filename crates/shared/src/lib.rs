//! Shared types, errors, and configuration for the balances service.
//!
//! This crate provides common types used across all other crates:
//! - Typed account IDs
//! - Application-wide error types
//! - Configuration management

pub mod config;
pub mod error;
pub mod types;

pub use config::{AppConfig, DatabaseConfig, LedgerConfig, RatesConfig, ServerConfig, StorageKind};
pub use error::{AppError, AppResult};
pub use types::AccountId;
