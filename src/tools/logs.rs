//! Event log search tool.
//!
//! This module implements the `search_event_logs` MCP tool: case-insensitive
//! substring search over event log messages and codes, with optional service
//! and level filters, newest entries first.

use crate::error::{StoreError, StoreResult};
use crate::models::{DEFAULT_LOG_LIMIT, EmptyResultPolicy, EventLogEntry, MAX_RESULT_ROWS};
use crate::store::{LogSearch, StorePool, StoreReader};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Default value for the limit field.
fn default_log_limit() -> u32 {
    DEFAULT_LOG_LIMIT
}

/// Input for the search_event_logs tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct SearchEventLogsInput {
    /// Substring matched case-insensitively against both message and code.
    pub keyword: String,
    /// Exact service name to filter by. Omit to search every service.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Exact log level to filter by (e.g. ERROR, WARN, INFO). Omit for all levels.
    #[serde(default)]
    pub level: Option<String>,
    /// Maximum entries to return. Default: 50, max: 10000
    #[serde(default = "default_log_limit")]
    pub limit: u32,
}

/// Output from the search_event_logs tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct SearchEventLogsOutput {
    /// Matching entries, newest first. Empty when nothing matches.
    pub logs: Vec<EventLogEntry>,
    /// Number of entries returned
    pub count: usize,
}

/// Reject keywords that would match every row.
fn validate_keyword(keyword: &str) -> StoreResult<()> {
    if keyword.trim().is_empty() {
        return Err(StoreError::invalid_input(
            "keyword must not be empty; it is matched as a substring against message and code",
        ));
    }
    Ok(())
}

/// Handler for event log search.
pub struct LogSearchToolHandler {
    pool: Arc<StorePool>,
}

impl LogSearchToolHandler {
    /// A search with no matches returns an empty sequence, never a
    /// placeholder record.
    pub const ON_EMPTY: EmptyResultPolicy = EmptyResultPolicy::EmptySequence;

    /// Create a new log search tool handler.
    pub fn new(pool: Arc<StorePool>) -> Self {
        Self { pool }
    }

    /// Handle the search_event_logs tool call.
    pub async fn search_event_logs(
        &self,
        input: SearchEventLogsInput,
    ) -> StoreResult<SearchEventLogsOutput> {
        validate_keyword(&input.keyword)?;

        let limit = if input.limit > MAX_RESULT_ROWS {
            warn!(
                requested = input.limit,
                capped = MAX_RESULT_ROWS,
                "Requested log limit exceeds maximum, capping"
            );
            MAX_RESULT_ROWS
        } else {
            input.limit.max(1)
        };

        let filter = LogSearch {
            keyword: &input.keyword,
            service_name: input.service_name.as_deref(),
            level: input.level.as_deref(),
            limit,
        };
        let logs = StoreReader::search_event_logs(&self.pool, &filter).await?;
        let count = logs.len();

        info!(
            count = count,
            limit = limit,
            service_filter = input.service_name.is_some(),
            level_filter = input.level.is_some(),
            "Event log search completed"
        );

        Ok(SearchEventLogsOutput { logs, count })
    }
}
