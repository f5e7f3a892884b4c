//! Metrics summary tool.
//!
//! This module implements the `get_metrics_summary` MCP tool: per-service
//! aggregates (average/max TPS, average error rate, average p95 latency) over
//! a trailing window of minutes.

use crate::error::StoreResult;
use crate::models::{DEFAULT_WINDOW_MINUTES, EmptyResultPolicy, MetricsSummary};
use crate::store::{StorePool, StoreReader};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::info;

/// Default value for the minutes field.
fn default_window_minutes() -> i64 {
    DEFAULT_WINDOW_MINUTES
}

/// Input for the get_metrics_summary tool.
#[derive(Debug, Clone, Deserialize, JsonSchema)]
pub struct MetricsSummaryInput {
    /// Exact service name to aggregate. Omit to aggregate every service.
    #[serde(default)]
    pub service_name: Option<String>,
    /// Trailing window size in minutes. Default: 10
    #[serde(default = "default_window_minutes")]
    pub minutes: i64,
}

/// Output from the get_metrics_summary tool.
#[derive(Debug, Clone, Serialize, JsonSchema)]
pub struct MetricsSummaryOutput {
    /// One summary per service, alphabetical. When the window holds no data
    /// this is a single placeholder record with zeroed aggregates and a note.
    pub summaries: Vec<MetricsSummary>,
    /// Number of summary records
    pub count: usize,
}

/// Handler for metrics aggregation.
pub struct MetricsToolHandler {
    pool: Arc<StorePool>,
}

impl MetricsToolHandler {
    /// Empty windows yield one placeholder record rather than an empty
    /// sequence, so callers always see which filter produced no data.
    pub const ON_EMPTY: EmptyResultPolicy = EmptyResultPolicy::PlaceholderRecord;

    /// Create a new metrics tool handler.
    pub fn new(pool: Arc<StorePool>) -> Self {
        Self { pool }
    }

    /// Handle the get_metrics_summary tool call.
    pub async fn get_metrics_summary(
        &self,
        input: MetricsSummaryInput,
    ) -> StoreResult<MetricsSummaryOutput> {
        let service_name = input.service_name.as_deref();

        let rows = StoreReader::metrics_summary(&self.pool, service_name, input.minutes).await?;
        let empty_window = rows.is_empty();
        let summaries =
            Self::ON_EMPTY.apply(rows, || MetricsSummary::no_data(service_name, input.minutes));
        let count = summaries.len();

        info!(
            window_minutes = input.minutes,
            count = count,
            empty_window = empty_window,
            "Metrics summary computed"
        );

        Ok(MetricsSummaryOutput { summaries, count })
    }
}
