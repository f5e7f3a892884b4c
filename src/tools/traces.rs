//! Hop trace tools.
//!
//! This module implements the trace inspection MCP tools:
//! - `get_hop_trace`: the full hop path of one trace, in hop order
//! - `get_all_hop_traces`: the most recent hops across every trace

use crate::error::StoreResult;
use crate::models::{DEFAULT_HOP_LIMIT, EmptyResultPolicy, MAX_RESULT_ROWS, TraceHop};
use crate::store::{StorePool, StoreReader};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// Default value for the limit field.
fn default_hop_limit() -> u32 {
    DEFAULT_HOP_LIMIT
}

/// Input for the get_hop_trace tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct HopTraceInput {
    /// Trace identifier whose hop path to fetch.
    pub trace_id: String,
}

/// Output from the get_hop_trace tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct HopTraceOutput {
    /// Hops of the trace in ascending hop order. Empty for an unknown trace.
    pub hops: Vec<TraceHop>,
    /// Number of hops returned
    pub count: usize,
}

/// Input for the get_all_hop_traces tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct AllHopTracesInput {
    /// Maximum hop records to return. Default: 100, max: 10000
    #[serde(default = "default_hop_limit")]
    pub limit: u32,
}

/// Output from the get_all_hop_traces tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct AllHopTracesOutput {
    /// Most recent hops across all traces, newest first, with ties broken by
    /// trace then hop order.
    pub hops: Vec<TraceHop>,
    /// Number of hop records returned
    pub count: usize,
}

/// Handler for hop trace lookups.
pub struct TraceToolHandler {
    pool: Arc<StorePool>,
}

impl TraceToolHandler {
    /// An unknown trace and an empty store both return an empty sequence.
    pub const ON_EMPTY: EmptyResultPolicy = EmptyResultPolicy::EmptySequence;

    /// Create a new trace tool handler.
    pub fn new(pool: Arc<StorePool>) -> Self {
        Self { pool }
    }

    /// Handle the get_hop_trace tool call.
    pub async fn get_hop_trace(&self, input: HopTraceInput) -> StoreResult<HopTraceOutput> {
        let hops = StoreReader::hop_trace(&self.pool, &input.trace_id).await?;
        let count = hops.len();

        info!(count = count, "Hop trace fetched");

        Ok(HopTraceOutput { hops, count })
    }

    /// Handle the get_all_hop_traces tool call.
    pub async fn get_all_hop_traces(
        &self,
        input: AllHopTracesInput,
    ) -> StoreResult<AllHopTracesOutput> {
        let limit = if input.limit > MAX_RESULT_ROWS {
            warn!(
                requested = input.limit,
                capped = MAX_RESULT_ROWS,
                "Requested hop limit exceeds maximum, capping"
            );
            MAX_RESULT_ROWS
        } else {
            input.limit.max(1)
        };

        let hops = StoreReader::recent_hops(&self.pool, limit).await?;
        let count = hops.len();

        info!(count = count, limit = limit, "Recent hops listed");

        Ok(AllHopTracesOutput { hops, count })
    }
}
