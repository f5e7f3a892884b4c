//! Metrics MCP Server Library
//!
//! This library provides MCP (Model Context Protocol) tools for AI assistants
//! to inspect service observability data - windowed metrics aggregates, event
//! logs, and request hop traces - stored in PostgreSQL or SQLite.

pub mod config;
pub mod error;
pub mod mcp;
pub mod models;
pub mod store;
pub mod tools;
pub mod transport;

pub use config::Config;
pub use error::StoreError;
pub use mcp::MetricsService;
