//! Store access layer.
//!
//! This module provides the pooled connection to the metrics store and the
//! read-side query functions the tools are built on.

pub mod pool;
pub mod queries;

pub use pool::{StoreBackend, StorePool};
pub use queries::{LogSearch, StoreReader};
