//! MCP tool implementations.
//!
//! This module contains all metrics store tool handlers:
//! - `get_metrics_summary`: Windowed per-service metrics aggregates
//! - `search_event_logs`: Case-insensitive event log search
//! - `get_hop_trace`: Hop path of a single trace
//! - `get_all_hop_traces`: Most recent hops across all traces

pub mod logs;
pub mod metrics;
pub mod traces;

pub use logs::{LogSearchToolHandler, SearchEventLogsInput, SearchEventLogsOutput};
pub use metrics::{MetricsSummaryInput, MetricsSummaryOutput, MetricsToolHandler};
pub use traces::{
    AllHopTracesInput, AllHopTracesOutput, HopTraceInput, HopTraceOutput, TraceToolHandler,
};
