//! Record types returned by the query tools.
//!
//! This module defines the stable record shapes surfaced to MCP clients,
//! together with the defaults, caps and empty-result policies the tools share.

use chrono::{DateTime, Utc};
use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// Default aggregation window for metrics summaries, in minutes.
pub const DEFAULT_WINDOW_MINUTES: i64 = 10;

/// Default row limit for event log searches.
pub const DEFAULT_LOG_LIMIT: u32 = 50;

/// Default row limit for recent hop listings.
pub const DEFAULT_HOP_LIMIT: u32 = 100;

/// Maximum allowed row limit for any query tool.
pub const MAX_RESULT_ROWS: u32 = 10_000;

/// Sentinel service name on the placeholder record when no filter was given.
pub const ALL_SERVICES: &str = "<all>";

/// Note attached to the placeholder record for an empty metrics window.
pub const NO_DATA_NOTE: &str = "no data recorded for the requested window";

/// How a query tool shapes its output when no rows match.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EmptyResultPolicy {
    /// Emit a single zero-valued placeholder record so callers always see one row.
    PlaceholderRecord,
    /// Emit the empty sequence as-is.
    EmptySequence,
}

impl EmptyResultPolicy {
    /// Apply this policy to a result set.
    pub fn apply<T>(self, rows: Vec<T>, placeholder: impl FnOnce() -> T) -> Vec<T> {
        match self {
            Self::PlaceholderRecord if rows.is_empty() => vec![placeholder()],
            _ => rows,
        }
    }
}

/// Aggregated metrics for one service over the requested window.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct MetricsSummary {
    pub service_name: String,
    /// The aggregation window this summary covers, in minutes.
    pub minutes: i64,
    pub avg_tps: f64,
    pub max_tps: f64,
    pub avg_error_rate: f64,
    /// Average 95th-percentile latency in milliseconds.
    pub avg_latency_p95: f64,
    /// Only present on the placeholder record for an empty window.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl MetricsSummary {
    /// Placeholder record for a window with no samples. Carries the requested
    /// filter (or the `<all>` sentinel), zeroed metrics and an explanatory note.
    pub fn no_data(service_name: Option<&str>, minutes: i64) -> Self {
        Self {
            service_name: service_name.unwrap_or(ALL_SERVICES).to_string(),
            minutes,
            avg_tps: 0.0,
            max_tps: 0.0,
            avg_error_rate: 0.0,
            avg_latency_p95: 0.0,
            note: Some(NO_DATA_NOTE.to_string()),
        }
    }
}

/// One row from the event log.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct EventLogEntry {
    pub service_name: String,
    /// Log timestamp, ISO-8601 in UTC.
    pub timestamp: DateTime<Utc>,
    pub level: String,
    pub code: String,
    pub message: String,
}

/// One hop of a distributed trace.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct TraceHop {
    pub trace_id: String,
    /// Position of this hop within its trace, starting at 0.
    pub hop_index: i64,
    pub node_name: String,
    /// Hop timestamp, ISO-8601 in UTC.
    pub timestamp: DateTime<Utc>,
    pub latency_ms: f64,
    pub status: String,
}
