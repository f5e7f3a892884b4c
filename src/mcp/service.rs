//! MCP service implementation using rmcp.
//!
//! This module defines the MetricsService struct with all metrics store
//! tools exposed via the MCP protocol using the rmcp framework's macros.

use crate::store::StorePool;
use crate::tools::logs::{LogSearchToolHandler, SearchEventLogsInput, SearchEventLogsOutput};
use crate::tools::metrics::{MetricsSummaryInput, MetricsSummaryOutput, MetricsToolHandler};
use crate::tools::traces::{
    AllHopTracesInput, AllHopTracesOutput, HopTraceInput, HopTraceOutput, TraceToolHandler,
};
use rmcp::Json;
use rmcp::{
    ErrorData as McpError, ServerHandler,
    handler::server::tool::ToolRouter,
    handler::server::wrapper::Parameters,
    model::{Implementation, ProtocolVersion, ServerCapabilities, ServerInfo},
    tool, tool_handler, tool_router,
};
use std::sync::Arc;

#[derive(Clone)]
pub struct MetricsService {
    /// Shared read-only pool over the metrics store
    pool: Arc<StorePool>,
    /// Tool router for MCP tool dispatch (auto-generated)
    tool_router: ToolRouter<Self>,
}

impl MetricsService {
    /// Create a new MetricsService instance.
    ///
    /// # Arguments
    ///
    /// * `pool` - Shared read-only pool over the metrics store
    pub fn new(pool: Arc<StorePool>) -> Self {
        Self {
            pool,
            tool_router: Self::tool_router(),
        }
    }
}

#[tool_router]
impl MetricsService {
    #[tool(
        description = "Aggregate service metrics over a trailing window.\nReturns average/max TPS, average error rate, and average p95 latency per service, ordered alphabetically.\nWhen the window holds no data, returns a single placeholder record with zeroed aggregates and a note."
    )]
    async fn get_metrics_summary(
        &self,
        Parameters(input): Parameters<MetricsSummaryInput>,
    ) -> Result<Json<MetricsSummaryOutput>, McpError> {
        let handler = MetricsToolHandler::new(self.pool.clone());
        handler
            .get_metrics_summary(input)
            .await
            .map(Json)
            .map_err(Into::into)
    }

    #[tool(
        description = "Search event logs by keyword.\nThe keyword is matched case-insensitively as a substring against both message and code.\nOptional exact-match filters on service_name and level. Newest entries first."
    )]
    async fn search_event_logs(
        &self,
        Parameters(input): Parameters<SearchEventLogsInput>,
    ) -> Result<Json<SearchEventLogsOutput>, McpError> {
        let handler = LogSearchToolHandler::new(self.pool.clone());
        handler
            .search_event_logs(input)
            .await
            .map(Json)
            .map_err(Into::into)
    }

    #[tool(
        description = "Fetch the full hop path of one trace.\nHops are ordered by ascending hop index. An unknown trace returns an empty list."
    )]
    async fn get_hop_trace(
        &self,
        Parameters(input): Parameters<HopTraceInput>,
    ) -> Result<Json<HopTraceOutput>, McpError> {
        let handler = TraceToolHandler::new(self.pool.clone());
        handler
            .get_hop_trace(input)
            .await
            .map(Json)
            .map_err(Into::into)
    }

    #[tool(
        description = "List the most recent hops across all traces.\nNewest first, with ties broken by trace ID and then hop index."
    )]
    async fn get_all_hop_traces(
        &self,
        Parameters(input): Parameters<AllHopTracesInput>,
    ) -> Result<Json<AllHopTracesOutput>, McpError> {
        let handler = TraceToolHandler::new(self.pool.clone());
        handler
            .get_all_hop_traces(input)
            .await
            .map(Json)
            .map_err(Into::into)
    }
}

#[tool_handler]
impl ServerHandler for MetricsService {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2025_03_26,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation {
                name: "metrics-mcp".to_owned(),
                title: Some("Metrics MCP Server".to_owned()),
                version: env!("CARGO_PKG_VERSION").to_owned(),
                icons: None,
                website_url: None,
            },
            instructions: Some(
                "Read-only tools over a service metrics store.\n\
                \n\
                ## Tools\n\
                - `get_metrics_summary`: per-service TPS, error rate, and p95 latency aggregates\n\
                  over the last N minutes (default: 10)\n\
                - `search_event_logs`: case-insensitive keyword search over log messages and\n\
                  codes, with optional service_name/level filters (default limit: 50)\n\
                - `get_hop_trace`: the full hop path of one trace, in hop order\n\
                - `get_all_hop_traces`: the most recent hops across all traces (default limit: 100)\n\
                \n\
                ## Conventions\n\
                - Every tool is read-only; nothing here mutates the store.\n\
                - Timestamps are ISO 8601 strings.\n\
                - An empty metrics window returns one placeholder record whose service_name\n\
                  echoes the filter (or \"<all>\") plus a note; log searches and trace lookups\n\
                  return empty lists instead.\n\
                - Limits are capped at 10000 rows."
                    .to_string(),
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::StoreConfig;

    async fn create_test_service() -> MetricsService {
        let pool = StorePool::connect(&StoreConfig::from_url("sqlite::memory:"))
            .await
            .unwrap();
        MetricsService::new(Arc::new(pool))
    }

    #[tokio::test]
    async fn test_service_creation() {
        let _service = create_test_service().await;
    }

    #[tokio::test]
    async fn test_server_info() {
        let service = create_test_service().await;
        let info = service.get_info();
        assert_eq!(info.server_info.name, "metrics-mcp");
        assert!(info.capabilities.tools.is_some());
        let instructions = info.instructions.unwrap();
        assert!(instructions.contains("get_metrics_summary"));
        assert!(instructions.contains("read-only"));
    }

    #[tokio::test]
    async fn test_all_tools_registered() {
        let service = create_test_service().await;
        let tools = service.tool_router.list_all();
        let names: Vec<_> = tools.iter().map(|t| t.name.as_ref()).collect();
        assert_eq!(tools.len(), 4);
        for expected in [
            "get_metrics_summary",
            "search_event_logs",
            "get_hop_trace",
            "get_all_hop_traces",
        ] {
            assert!(names.contains(&expected), "missing tool {expected}");
        }
    }
}
