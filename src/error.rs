//! Error types for the Metrics MCP Server.
//!
//! This module defines all error types using `thiserror` for ergonomic error handling.
//! Each error variant provides actionable messages to help AI assistants understand
//! and recover from error conditions.

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Connection failed: {message}")]
    Connection { message: String, suggestion: String },

    #[error("Query error: {message}")]
    Query {
        message: String,
        /// e.g., "42P01" for undefined table
        sql_state: Option<String>,
        suggestion: String,
    },

    #[error("Invalid input: {message}")]
    InvalidInput { message: String },

    #[error("Internal error: {message}")]
    Internal { message: String },
}

impl StoreError {
    /// Create a connection error with a helpful suggestion.
    pub fn connection(message: impl Into<String>, suggestion: impl Into<String>) -> Self {
        Self::Connection {
            message: message.into(),
            suggestion: suggestion.into(),
        }
    }

    /// Create a query error with optional SQL state.
    pub fn query(
        message: impl Into<String>,
        sql_state: Option<String>,
        suggestion: impl Into<String>,
    ) -> Self {
        Self::Query {
            message: message.into(),
            sql_state,
            suggestion: suggestion.into(),
        }
    }

    /// Create an invalid input error.
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self::InvalidInput {
            message: message.into(),
        }
    }

    /// Create an internal error.
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal {
            message: message.into(),
        }
    }

    /// Get the suggestion for this error, if available.
    pub fn suggestion(&self) -> Option<&str> {
        match self {
            Self::Connection { suggestion, .. } => Some(suggestion),
            Self::Query { suggestion, .. } => Some(suggestion),
            _ => None,
        }
    }
}

/// Convert sqlx errors to StoreError.
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Configuration(msg) => StoreError::connection(
                msg.to_string(),
                "Check the connection settings and credentials",
            ),
            sqlx::Error::Database(db_err) => {
                let code = db_err.code().map(|c| c.to_string());
                StoreError::query(
                    db_err.message(),
                    code,
                    "Check that the metrics tables exist and match the expected schema",
                )
            }
            sqlx::Error::RowNotFound => StoreError::query(
                "No rows returned",
                None,
                "Verify the query conditions match existing data",
            ),
            sqlx::Error::PoolTimedOut => StoreError::connection(
                "Timed out waiting for a pooled connection",
                "Increase --max-connections or reduce concurrent tool calls",
            ),
            sqlx::Error::PoolClosed => {
                StoreError::connection("Connection pool is closed", "Restart the server")
            }
            sqlx::Error::Io(io_err) => StoreError::connection(
                format!("I/O error: {}", io_err),
                "Check network connectivity and database server status",
            ),
            sqlx::Error::Tls(tls_err) => StoreError::connection(
                format!("TLS error: {}", tls_err),
                "Verify TLS configuration and certificates",
            ),
            sqlx::Error::Protocol(msg) => StoreError::connection(
                format!("Protocol error: {}", msg),
                "Check database server compatibility",
            ),
            sqlx::Error::ColumnNotFound(col) => StoreError::internal(format!(
                "Column not found: {} (store schema mismatch)",
                col
            )),
            sqlx::Error::ColumnIndexOutOfBounds { index, len } => StoreError::internal(format!(
                "Column index {} out of bounds (len: {})",
                index, len
            )),
            sqlx::Error::ColumnDecode { index, source } => {
                StoreError::internal(format!("Failed to decode column {}: {}", index, source))
            }
            sqlx::Error::Decode(source) => StoreError::internal(format!("Decode error: {}", source)),
            sqlx::Error::WorkerCrashed => StoreError::internal("Database worker crashed"),
            _ => StoreError::internal(format!("Unknown database error: {}", err)),
        }
    }
}

/// Result type alias for store operations.
pub type StoreResult<T> = Result<T, StoreError>;

/// Build suggestion data as JSON value.
fn suggestion_data(suggestion: Option<&str>) -> Option<serde_json::Value> {
    suggestion.map(|s| serde_json::json!({ "suggestion": s }))
}

/// Convert StoreError to MCP ErrorData for semantic error categorization.
/// Includes the suggestion field in the `data` object when available.
impl From<StoreError> for rmcp::ErrorData {
    fn from(err: StoreError) -> Self {
        match &err {
            // InvalidInput -> invalid_params
            StoreError::InvalidInput { .. } => {
                rmcp::ErrorData::invalid_params(err.to_string(), suggestion_data(err.suggestion()))
            }

            // Query errors -> invalid_params with sql_state in message
            StoreError::Query {
                message,
                sql_state,
                suggestion,
            } => {
                let msg = match sql_state {
                    Some(code) => format!("{} (SQLSTATE: {})", message, code),
                    None => message.clone(),
                };
                rmcp::ErrorData::invalid_params(msg, suggestion_data(Some(suggestion)))
            }

            // Connection -> internal_error (transient from the caller's view)
            StoreError::Connection { suggestion, .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), suggestion_data(Some(suggestion)))
            }

            // Internal -> internal_error
            StoreError::Internal { .. } => {
                rmcp::ErrorData::internal_error(err.to_string(), suggestion_data(err.suggestion()))
            }
        }
    }
}
