//! Read-side queries over the metrics store.
//!
//! This module implements the four query operations the tools expose:
//! windowed metrics aggregation, event log search, and hop trace lookups.
//!
//! # Architecture
//!
//! SQL statements are organized in the `sql` submodule with constants for each
//! backend. Backend-specific implementations are in their respective
//! submodules (postgres, sqlite), each providing the same interface. Filters
//! are assembled from a closed set of static fragments; every user-supplied
//! value is bound positionally, never spliced into the statement text.

use crate::error::StoreResult;
use crate::models::{EventLogEntry, MetricsSummary, TraceHop};
use crate::store::pool::StorePool;
use tracing::debug;

/// Filter for an event log search. All values are bound as parameters.
#[derive(Debug, Clone)]
pub struct LogSearch<'a> {
    /// Substring matched case-insensitively against `message` and `code`.
    pub keyword: &'a str,
    pub service_name: Option<&'a str>,
    pub level: Option<&'a str>,
    pub limit: u32,
}

/// Read-side query surface over the metrics store.
pub struct StoreReader;

impl StoreReader {
    /// Aggregate per-service metrics over the trailing window.
    pub async fn metrics_summary(
        pool: &StorePool,
        service_name: Option<&str>,
        minutes: i64,
    ) -> StoreResult<Vec<MetricsSummary>> {
        match pool {
            StorePool::Postgres(p) => postgres::metrics_summary(p, service_name, minutes).await,
            StorePool::Sqlite(p) => sqlite::metrics_summary(p, service_name, minutes).await,
        }
    }

    /// Search the event log, newest first.
    pub async fn search_event_logs(
        pool: &StorePool,
        filter: &LogSearch<'_>,
    ) -> StoreResult<Vec<EventLogEntry>> {
        match pool {
            StorePool::Postgres(p) => postgres::search_event_logs(p, filter).await,
            StorePool::Sqlite(p) => sqlite::search_event_logs(p, filter).await,
        }
    }

    /// Fetch the hop path of one trace in hop order.
    pub async fn hop_trace(pool: &StorePool, trace_id: &str) -> StoreResult<Vec<TraceHop>> {
        match pool {
            StorePool::Postgres(p) => postgres::hop_trace(p, trace_id).await,
            StorePool::Sqlite(p) => sqlite::hop_trace(p, trace_id).await,
        }
    }

    /// Fetch the most recent hops across all traces.
    pub async fn recent_hops(pool: &StorePool, limit: u32) -> StoreResult<Vec<TraceHop>> {
        match pool {
            StorePool::Postgres(p) => postgres::recent_hops(p, limit).await,
            StorePool::Sqlite(p) => sqlite::recent_hops(p, limit).await,
        }
    }
}

// =============================================================================
// SQL Statements
// =============================================================================
//
// Centralized SQL for the query operations. Each backend has its own submodule
// with statements adapted to its dialect: interval arithmetic and ILIKE on
// PostgreSQL; datetime() normalization and LOWER() matching on SQLite, where
// timestamps are stored as RFC 3339 text.

mod sql {
    pub mod postgres {
        pub const METRICS_SUMMARY_ALL: &str = r#"
            SELECT
                service_name,
                AVG(tps)::float8         AS avg_tps,
                MAX(tps)::float8         AS max_tps,
                AVG(error_rate)::float8  AS avg_error_rate,
                AVG(latency_p95)::float8 AS avg_latency_p95
            FROM service_metrics
            WHERE bucket_ts >= NOW() - ($1 * INTERVAL '1 minute')
            GROUP BY service_name
            ORDER BY service_name
            "#;

        pub const METRICS_SUMMARY_FOR_SERVICE: &str = r#"
            SELECT
                service_name,
                AVG(tps)::float8         AS avg_tps,
                MAX(tps)::float8         AS max_tps,
                AVG(error_rate)::float8  AS avg_error_rate,
                AVG(latency_p95)::float8 AS avg_latency_p95
            FROM service_metrics
            WHERE bucket_ts >= NOW() - ($1 * INTERVAL '1 minute')
            AND service_name = $2
            GROUP BY service_name
            ORDER BY service_name
            "#;

        /// Base of the log search; filter fragments and the ORDER/LIMIT tail
        /// are appended with running placeholder numbers.
        pub const SEARCH_EVENT_LOGS_BASE: &str = r#"
            SELECT service_name, log_ts, level, code, message
            FROM event_logs
            WHERE (message ILIKE $1 OR code ILIKE $1)"#;

        pub const HOP_TRACE: &str = r#"
            SELECT trace_id, hop_index, node_name, hop_ts,
                   latency_ms::float8 AS latency_ms, status
            FROM hop_trace
            WHERE trace_id = $1
            ORDER BY hop_index ASC
            "#;

        pub const RECENT_HOPS: &str = r#"
            SELECT trace_id, hop_index, node_name, hop_ts,
                   latency_ms::float8 AS latency_ms, status
            FROM hop_trace
            ORDER BY hop_ts DESC, trace_id, hop_index ASC
            LIMIT $1
            "#;
    }

    pub mod sqlite {
        pub const METRICS_SUMMARY_ALL: &str = r#"
            SELECT
                service_name,
                CAST(AVG(tps) AS REAL)         AS avg_tps,
                CAST(MAX(tps) AS REAL)         AS max_tps,
                CAST(AVG(error_rate) AS REAL)  AS avg_error_rate,
                CAST(AVG(latency_p95) AS REAL) AS avg_latency_p95
            FROM service_metrics
            WHERE datetime(bucket_ts) >= datetime('now', '-' || ? || ' minutes')
            GROUP BY service_name
            ORDER BY service_name
            "#;

        pub const METRICS_SUMMARY_FOR_SERVICE: &str = r#"
            SELECT
                service_name,
                CAST(AVG(tps) AS REAL)         AS avg_tps,
                CAST(MAX(tps) AS REAL)         AS max_tps,
                CAST(AVG(error_rate) AS REAL)  AS avg_error_rate,
                CAST(AVG(latency_p95) AS REAL) AS avg_latency_p95
            FROM service_metrics
            WHERE datetime(bucket_ts) >= datetime('now', '-' || ? || ' minutes')
            AND service_name = ?
            GROUP BY service_name
            ORDER BY service_name
            "#;

        /// Base of the log search; the keyword pattern is bound twice because
        /// SQLite placeholders are purely positional.
        pub const SEARCH_EVENT_LOGS_BASE: &str = r#"
            SELECT service_name, log_ts, level, code, message
            FROM event_logs
            WHERE (LOWER(message) LIKE LOWER(?) OR LOWER(code) LIKE LOWER(?))"#;

        pub const HOP_TRACE: &str = r#"
            SELECT trace_id, hop_index, node_name, hop_ts,
                   CAST(latency_ms AS REAL) AS latency_ms, status
            FROM hop_trace
            WHERE trace_id = ?
            ORDER BY hop_index ASC
            "#;

        pub const RECENT_HOPS: &str = r#"
            SELECT trace_id, hop_index, node_name, hop_ts,
                   CAST(latency_ms AS REAL) AS latency_ms, status
            FROM hop_trace
            ORDER BY datetime(hop_ts) DESC, trace_id, hop_index ASC
            LIMIT ?
            "#;
    }
}

// =============================================================================
// Backend-Specific Implementations
// =============================================================================

mod postgres {
    use super::*;
    use sqlx::{PgPool, Row, postgres::PgRow};

    pub async fn metrics_summary(
        pool: &PgPool,
        service_name: Option<&str>,
        minutes: i64,
    ) -> StoreResult<Vec<MetricsSummary>> {
        let rows = match service_name {
            Some(service) => {
                sqlx::query(sql::postgres::METRICS_SUMMARY_FOR_SERVICE)
                    .bind(minutes)
                    .bind(service)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                sqlx::query(sql::postgres::METRICS_SUMMARY_ALL)
                    .bind(minutes)
                    .fetch_all(pool)
                    .await?
            }
        };

        let summaries = rows
            .iter()
            .map(|row| decode_summary(row, minutes))
            .collect::<StoreResult<Vec<_>>>()?;

        debug!(
            count = summaries.len(),
            window_minutes = minutes,
            "Aggregated PostgreSQL service metrics"
        );
        Ok(summaries)
    }

    /// Append the optional filter fragments and the ORDER/LIMIT tail,
    /// numbering placeholders after the keyword pattern in $1.
    pub fn build_search_sql(filter: &LogSearch<'_>) -> String {
        let mut stmt = String::from(sql::postgres::SEARCH_EVENT_LOGS_BASE);
        let mut next_param = 2;
        if filter.service_name.is_some() {
            stmt.push_str(&format!(" AND service_name = ${next_param}"));
            next_param += 1;
        }
        if filter.level.is_some() {
            stmt.push_str(&format!(" AND level = ${next_param}"));
            next_param += 1;
        }
        stmt.push_str(&format!(" ORDER BY log_ts DESC LIMIT ${next_param}"));
        stmt
    }

    pub async fn search_event_logs(
        pool: &PgPool,
        filter: &LogSearch<'_>,
    ) -> StoreResult<Vec<EventLogEntry>> {
        let stmt = build_search_sql(filter);
        let pattern = format!("%{}%", filter.keyword);

        let mut query = sqlx::query(&stmt).bind(pattern);
        if let Some(service) = filter.service_name {
            query = query.bind(service);
        }
        if let Some(level) = filter.level {
            query = query.bind(level);
        }
        let rows = query.bind(filter.limit as i64).fetch_all(pool).await?;

        let entries = rows
            .iter()
            .map(decode_log)
            .collect::<StoreResult<Vec<_>>>()?;

        debug!(count = entries.len(), "Searched PostgreSQL event logs");
        Ok(entries)
    }

    pub async fn hop_trace(pool: &PgPool, trace_id: &str) -> StoreResult<Vec<TraceHop>> {
        let rows = sqlx::query(sql::postgres::HOP_TRACE)
            .bind(trace_id)
            .fetch_all(pool)
            .await?;

        let hops = rows
            .iter()
            .map(decode_hop)
            .collect::<StoreResult<Vec<_>>>()?;

        debug!(count = hops.len(), "Fetched PostgreSQL hop trace");
        Ok(hops)
    }

    pub async fn recent_hops(pool: &PgPool, limit: u32) -> StoreResult<Vec<TraceHop>> {
        let rows = sqlx::query(sql::postgres::RECENT_HOPS)
            .bind(limit as i64)
            .fetch_all(pool)
            .await?;

        let hops = rows
            .iter()
            .map(decode_hop)
            .collect::<StoreResult<Vec<_>>>()?;

        debug!(count = hops.len(), "Listed recent PostgreSQL hops");
        Ok(hops)
    }

    fn decode_summary(row: &PgRow, minutes: i64) -> StoreResult<MetricsSummary> {
        Ok(MetricsSummary {
            service_name: row.try_get("service_name")?,
            minutes,
            avg_tps: row.try_get("avg_tps")?,
            max_tps: row.try_get("max_tps")?,
            avg_error_rate: row.try_get("avg_error_rate")?,
            avg_latency_p95: row.try_get("avg_latency_p95")?,
            note: None,
        })
    }

    fn decode_log(row: &PgRow) -> StoreResult<EventLogEntry> {
        Ok(EventLogEntry {
            service_name: row.try_get("service_name")?,
            timestamp: row.try_get("log_ts")?,
            level: row.try_get("level")?,
            code: row.try_get("code")?,
            message: row.try_get("message")?,
        })
    }

    fn decode_hop(row: &PgRow) -> StoreResult<TraceHop> {
        Ok(TraceHop {
            trace_id: row.try_get("trace_id")?,
            hop_index: decode_index(row, "hop_index")?,
            node_name: row.try_get("node_name")?,
            timestamp: row.try_get("hop_ts")?,
            latency_ms: row.try_get("latency_ms")?,
            status: row.try_get("status")?,
        })
    }

    /// Decode an integer column that may be int4 or int8 depending on how
    /// the store schema was provisioned.
    fn decode_index(row: &PgRow, column: &str) -> StoreResult<i64> {
        if let Ok(value) = row.try_get::<i64, _>(column) {
            return Ok(value);
        }
        let value = row.try_get::<i32, _>(column)?;
        Ok(value as i64)
    }
}

mod sqlite {
    use super::*;
    use sqlx::{Row, SqlitePool, sqlite::SqliteRow};

    pub async fn metrics_summary(
        pool: &SqlitePool,
        service_name: Option<&str>,
        minutes: i64,
    ) -> StoreResult<Vec<MetricsSummary>> {
        let rows = match service_name {
            Some(service) => {
                sqlx::query(sql::sqlite::METRICS_SUMMARY_FOR_SERVICE)
                    .bind(minutes)
                    .bind(service)
                    .fetch_all(pool)
                    .await?
            }
            None => {
                sqlx::query(sql::sqlite::METRICS_SUMMARY_ALL)
                    .bind(minutes)
                    .fetch_all(pool)
                    .await?
            }
        };

        let summaries = rows
            .iter()
            .map(|row| decode_summary(row, minutes))
            .collect::<StoreResult<Vec<_>>>()?;

        debug!(
            count = summaries.len(),
            window_minutes = minutes,
            "Aggregated SQLite service metrics"
        );
        Ok(summaries)
    }

    /// Append the optional filter fragments and the ORDER/LIMIT tail.
    /// SQLite timestamps are RFC 3339 text, so ordering goes through
    /// datetime() to compare instants rather than raw strings.
    pub fn build_search_sql(filter: &LogSearch<'_>) -> String {
        let mut stmt = String::from(sql::sqlite::SEARCH_EVENT_LOGS_BASE);
        if filter.service_name.is_some() {
            stmt.push_str(" AND service_name = ?");
        }
        if filter.level.is_some() {
            stmt.push_str(" AND level = ?");
        }
        stmt.push_str(" ORDER BY datetime(log_ts) DESC LIMIT ?");
        stmt
    }

    pub async fn search_event_logs(
        pool: &SqlitePool,
        filter: &LogSearch<'_>,
    ) -> StoreResult<Vec<EventLogEntry>> {
        let stmt = build_search_sql(filter);
        let pattern = format!("%{}%", filter.keyword);

        let mut query = sqlx::query(&stmt).bind(pattern.clone()).bind(pattern);
        if let Some(service) = filter.service_name {
            query = query.bind(service);
        }
        if let Some(level) = filter.level {
            query = query.bind(level);
        }
        let rows = query.bind(filter.limit as i64).fetch_all(pool).await?;

        let entries = rows
            .iter()
            .map(decode_log)
            .collect::<StoreResult<Vec<_>>>()?;

        debug!(count = entries.len(), "Searched SQLite event logs");
        Ok(entries)
    }

    pub async fn hop_trace(pool: &SqlitePool, trace_id: &str) -> StoreResult<Vec<TraceHop>> {
        let rows = sqlx::query(sql::sqlite::HOP_TRACE)
            .bind(trace_id)
            .fetch_all(pool)
            .await?;

        let hops = rows
            .iter()
            .map(decode_hop)
            .collect::<StoreResult<Vec<_>>>()?;

        debug!(count = hops.len(), "Fetched SQLite hop trace");
        Ok(hops)
    }

    pub async fn recent_hops(pool: &SqlitePool, limit: u32) -> StoreResult<Vec<TraceHop>> {
        let rows = sqlx::query(sql::sqlite::RECENT_HOPS)
            .bind(limit as i64)
            .fetch_all(pool)
            .await?;

        let hops = rows
            .iter()
            .map(decode_hop)
            .collect::<StoreResult<Vec<_>>>()?;

        debug!(count = hops.len(), "Listed recent SQLite hops");
        Ok(hops)
    }

    fn decode_summary(row: &SqliteRow, minutes: i64) -> StoreResult<MetricsSummary> {
        Ok(MetricsSummary {
            service_name: row.try_get("service_name")?,
            minutes,
            avg_tps: row.try_get("avg_tps")?,
            max_tps: row.try_get("max_tps")?,
            avg_error_rate: row.try_get("avg_error_rate")?,
            avg_latency_p95: row.try_get("avg_latency_p95")?,
            note: None,
        })
    }

    fn decode_log(row: &SqliteRow) -> StoreResult<EventLogEntry> {
        Ok(EventLogEntry {
            service_name: row.try_get("service_name")?,
            timestamp: row.try_get("log_ts")?,
            level: row.try_get("level")?,
            code: row.try_get("code")?,
            message: row.try_get("message")?,
        })
    }

    fn decode_hop(row: &SqliteRow) -> StoreResult<TraceHop> {
        Ok(TraceHop {
            trace_id: row.try_get("trace_id")?,
            hop_index: row.try_get("hop_index")?,
            node_name: row.try_get("node_name")?,
            timestamp: row.try_get("hop_ts")?,
            latency_ms: row.try_get("latency_ms")?,
            status: row.try_get("status")?,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn search(service: Option<&'static str>, level: Option<&'static str>) -> LogSearch<'static> {
        LogSearch {
            keyword: "timeout",
            service_name: service,
            level,
            limit: 50,
        }
    }

    #[test]
    fn test_postgres_search_sql_without_filters() {
        let stmt = postgres::build_search_sql(&search(None, None));
        assert!(stmt.contains("(message ILIKE $1 OR code ILIKE $1)"));
        assert!(!stmt.contains("AND service_name"));
        assert!(!stmt.contains("AND level"));
        assert!(stmt.ends_with("ORDER BY log_ts DESC LIMIT $2"));
    }

    #[test]
    fn test_postgres_search_sql_with_service_filter() {
        let stmt = postgres::build_search_sql(&search(Some("order-api"), None));
        assert!(stmt.contains("AND service_name = $2"));
        assert!(stmt.ends_with("ORDER BY log_ts DESC LIMIT $3"));
    }

    #[test]
    fn test_postgres_search_sql_with_level_filter() {
        let stmt = postgres::build_search_sql(&search(None, Some("ERROR")));
        assert!(stmt.contains("AND level = $2"));
        assert!(!stmt.contains("AND service_name"));
        assert!(stmt.ends_with("ORDER BY log_ts DESC LIMIT $3"));
    }

    #[test]
    fn test_postgres_search_sql_with_both_filters() {
        let stmt = postgres::build_search_sql(&search(Some("order-api"), Some("ERROR")));
        assert!(stmt.contains("AND service_name = $2"));
        assert!(stmt.contains("AND level = $3"));
        assert!(stmt.ends_with("ORDER BY log_ts DESC LIMIT $4"));
    }

    #[test]
    fn test_postgres_search_sql_never_inlines_values() {
        let stmt = postgres::build_search_sql(&search(Some("order-api"), Some("ERROR")));
        assert!(!stmt.contains("order-api"));
        assert!(!stmt.contains("ERROR"));
        assert!(!stmt.contains("timeout"));
    }

    #[test]
    fn test_sqlite_search_sql_without_filters() {
        let stmt = sqlite::build_search_sql(&search(None, None));
        assert!(stmt.contains("LOWER(message) LIKE LOWER(?)"));
        assert!(stmt.contains("LOWER(code) LIKE LOWER(?)"));
        assert!(!stmt.contains("AND service_name"));
        assert!(stmt.ends_with("ORDER BY datetime(log_ts) DESC LIMIT ?"));
    }

    #[test]
    fn test_sqlite_search_sql_with_both_filters() {
        let stmt = sqlite::build_search_sql(&search(Some("order-api"), Some("WARN")));
        assert!(stmt.contains("AND service_name = ?"));
        assert!(stmt.contains("AND level = ?"));
        assert!(stmt.ends_with("ORDER BY datetime(log_ts) DESC LIMIT ?"));
        assert!(!stmt.contains("order-api"));
    }

    #[test]
    fn test_metrics_sql_groups_and_orders_by_service() {
        for stmt in [
            sql::postgres::METRICS_SUMMARY_ALL,
            sql::postgres::METRICS_SUMMARY_FOR_SERVICE,
            sql::sqlite::METRICS_SUMMARY_ALL,
            sql::sqlite::METRICS_SUMMARY_FOR_SERVICE,
        ] {
            assert!(stmt.contains("GROUP BY service_name"));
            assert!(stmt.contains("ORDER BY service_name"));
        }
    }

    #[test]
    fn test_hop_trace_sql_orders_by_hop_index() {
        assert!(sql::postgres::HOP_TRACE.contains("ORDER BY hop_index ASC"));
        assert!(sql::sqlite::HOP_TRACE.contains("ORDER BY hop_index ASC"));
    }

    #[test]
    fn test_recent_hops_sql_orders_newest_first_with_tiebreaks() {
        assert!(
            sql::postgres::RECENT_HOPS.contains("ORDER BY hop_ts DESC, trace_id, hop_index ASC")
        );
        assert!(
            sql::sqlite::RECENT_HOPS
                .contains("ORDER BY datetime(hop_ts) DESC, trace_id, hop_index ASC")
        );
    }
}
