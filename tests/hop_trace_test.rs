//! Integration tests for the hop trace tools.
//!
//! Tests verify that:
//! - get_hop_trace returns hops in ascending hop order regardless of insert order
//! - An unknown trace yields an empty list, never an error
//! - Hop fields (node, latency, status, timestamp) survive the round trip
//! - get_all_hop_traces orders newest first with trace/hop tiebreaks
//! - get_all_hop_traces respects the limit

use chrono::{Duration, SecondsFormat, SubsecRound, Utc};
use metrics_mcp_server::config::StoreConfig;
use metrics_mcp_server::store::StorePool;
use metrics_mcp_server::tools::traces::{AllHopTracesInput, HopTraceInput, TraceToolHandler};
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use std::str::FromStr;
use std::sync::Arc;
use tempfile::NamedTempFile;

/// One hop record: (trace_id, hop_index, node, minutes ago, latency_ms, status).
type HopRow = (&'static str, i64, &'static str, i64, f64, &'static str);

/// Seed a SQLite store with hop records and open it read-only.
async fn setup_store(rows: &[HopRow]) -> Arc<StorePool> {
    let temp_file = NamedTempFile::new().unwrap();
    // Keep the temp file alive - prevent deletion when function returns
    let db_path = temp_file
        .into_temp_path()
        .keep()
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();

    {
        let options = SqliteConnectOptions::from_str(&format!("sqlite:{}", db_path))
            .unwrap()
            .journal_mode(SqliteJournalMode::Delete);
        let seed = SqlitePoolOptions::new()
            .max_connections(1)
            .connect_with(options)
            .await
            .unwrap();

        sqlx::query(
            "CREATE TABLE hop_trace (
                trace_id TEXT NOT NULL,
                hop_index INTEGER NOT NULL,
                node_name TEXT NOT NULL,
                hop_ts TEXT NOT NULL,
                latency_ms REAL NOT NULL,
                status TEXT NOT NULL
            )",
        )
        .execute(&seed)
        .await
        .unwrap();

        let now = Utc::now().trunc_subsecs(0);
        for (trace_id, hop_index, node_name, minutes_ago, latency_ms, status) in rows {
            let hop_ts = (now - Duration::minutes(*minutes_ago))
                .to_rfc3339_opts(SecondsFormat::Secs, true);
            sqlx::query("INSERT INTO hop_trace VALUES (?, ?, ?, ?, ?, ?)")
                .bind(trace_id)
                .bind(hop_index)
                .bind(node_name)
                .bind(hop_ts)
                .bind(latency_ms)
                .bind(status)
                .execute(&seed)
                .await
                .unwrap();
        }

        seed.close().await;
    }

    let pool = StorePool::connect(&StoreConfig::from_url(format!("sqlite:{}", db_path)))
        .await
        .unwrap();
    Arc::new(pool)
}

fn trace(trace_id: &str) -> HopTraceInput {
    HopTraceInput {
        trace_id: trace_id.to_string(),
    }
}

// =============================================================================
// get_hop_trace
// =============================================================================

#[tokio::test]
async fn test_hops_ordered_by_index_despite_insert_order() {
    // Deliberately scrambled insert order
    let pool = setup_store(&[
        ("tr-001", 2, "billing", 5, 31.0, "OK"),
        ("tr-001", 0, "gateway", 5, 4.2, "OK"),
        ("tr-001", 1, "orders", 5, 12.8, "OK"),
    ])
    .await;
    let handler = TraceToolHandler::new(pool);

    let output = handler.get_hop_trace(trace("tr-001")).await.unwrap();

    assert_eq!(output.count, 3);
    let indices: Vec<_> = output.hops.iter().map(|h| h.hop_index).collect();
    assert_eq!(indices, vec![0, 1, 2]);
    let nodes: Vec<_> = output.hops.iter().map(|h| h.node_name.as_str()).collect();
    assert_eq!(nodes, vec!["gateway", "orders", "billing"]);
}

#[tokio::test]
async fn test_unknown_trace_returns_empty_list() {
    let pool = setup_store(&[("tr-001", 0, "gateway", 5, 4.2, "OK")]).await;
    let handler = TraceToolHandler::new(pool);

    let output = handler.get_hop_trace(trace("tr-missing")).await.unwrap();

    assert!(output.hops.is_empty());
    assert_eq!(output.count, 0);
}

#[tokio::test]
async fn test_empty_trace_id_returns_empty_list() {
    let pool = setup_store(&[("tr-001", 0, "gateway", 5, 4.2, "OK")]).await;
    let handler = TraceToolHandler::new(pool);

    // An empty trace ID is just an ID that matches nothing
    let output = handler.get_hop_trace(trace("")).await.unwrap();

    assert_eq!(output.count, 0);
}

#[tokio::test]
async fn test_traces_are_isolated() {
    let pool = setup_store(&[
        ("tr-a", 0, "gateway", 5, 4.2, "OK"),
        ("tr-a", 1, "orders", 5, 12.8, "OK"),
        ("tr-b", 0, "gateway", 3, 5.1, "ERROR"),
    ])
    .await;
    let handler = TraceToolHandler::new(pool);

    let output = handler.get_hop_trace(trace("tr-a")).await.unwrap();

    assert_eq!(output.count, 2);
    assert!(output.hops.iter().all(|h| h.trace_id == "tr-a"));
}

#[tokio::test]
async fn test_hop_fields_round_trip() {
    let pool = setup_store(&[("tr-001", 0, "gateway", 5, 4.25, "DEGRADED")]).await;
    let handler = TraceToolHandler::new(pool);

    let output = handler.get_hop_trace(trace("tr-001")).await.unwrap();

    let hop = &output.hops[0];
    assert_eq!(hop.trace_id, "tr-001");
    assert_eq!(hop.hop_index, 0);
    assert_eq!(hop.node_name, "gateway");
    assert!((hop.latency_ms - 4.25).abs() < 1e-9);
    assert_eq!(hop.status, "DEGRADED");
}

// =============================================================================
// get_all_hop_traces
// =============================================================================

#[tokio::test]
async fn test_recent_hops_ordered_newest_first_with_tiebreaks() {
    let pool = setup_store(&[
        // Two traces share one timestamp; one hop is strictly newer
        ("tr-b", 0, "gateway", 1, 3.0, "OK"),
        ("tr-a", 1, "orders", 5, 9.0, "OK"),
        ("tr-a", 0, "gateway", 5, 2.0, "OK"),
        ("tr-c", 0, "gateway", 5, 4.0, "OK"),
    ])
    .await;
    let handler = TraceToolHandler::new(pool);

    let output = handler
        .get_all_hop_traces(AllHopTracesInput { limit: 100 })
        .await
        .unwrap();

    assert_eq!(output.count, 4);
    let order: Vec<_> = output
        .hops
        .iter()
        .map(|h| (h.trace_id.as_str(), h.hop_index))
        .collect();
    assert_eq!(
        order,
        vec![("tr-b", 0), ("tr-a", 0), ("tr-a", 1), ("tr-c", 0)]
    );
}

#[tokio::test]
async fn test_recent_hops_respects_limit() {
    let pool = setup_store(&[
        ("tr-a", 0, "gateway", 4, 1.0, "OK"),
        ("tr-b", 0, "gateway", 3, 1.0, "OK"),
        ("tr-c", 0, "gateway", 2, 1.0, "OK"),
        ("tr-d", 0, "gateway", 1, 1.0, "OK"),
    ])
    .await;
    let handler = TraceToolHandler::new(pool);

    let output = handler
        .get_all_hop_traces(AllHopTracesInput { limit: 2 })
        .await
        .unwrap();

    assert_eq!(output.count, 2);
    assert_eq!(output.hops[0].trace_id, "tr-d");
    assert_eq!(output.hops[1].trace_id, "tr-c");
}

#[tokio::test]
async fn test_recent_hops_empty_store() {
    let pool = setup_store(&[]).await;
    let handler = TraceToolHandler::new(pool);

    let output = handler
        .get_all_hop_traces(AllHopTracesInput { limit: 100 })
        .await
        .unwrap();

    assert!(output.hops.is_empty());
    assert_eq!(output.count, 0);
}

#[tokio::test]
async fn test_recent_hops_limit_zero_floors_to_one() {
    let pool = setup_store(&[
        ("tr-a", 0, "gateway", 2, 1.0, "OK"),
        ("tr-b", 0, "gateway", 1, 1.0, "OK"),
    ])
    .await;
    let handler = TraceToolHandler::new(pool);

    let output = handler
        .get_all_hop_traces(AllHopTracesInput { limit: 0 })
        .await
        .unwrap();

    assert_eq!(output.count, 1);
    assert_eq!(output.hops[0].trace_id, "tr-b");
}
