//! Ports and Adapters Infrastructure
//!
//! Shared types for the repository ports through which the domain crates
//! reach the document store.
//!
//! ```text
//!   SalesReturnService (domain_returns)
//!          |                    |
//!          v                    v
//!   SalesLedgerPort      ReturnDocumentPort
//!          ^                    ^
//!          |                    |
//!   PostgresErpAdapter (infra_db)  /  InMemoryErp (mock feature)
//! ```
//!
//! Each domain defines its own port trait extending [`DomainPort`]; adapters
//! implement those traits against a concrete store.

use std::fmt;
use thiserror::Error;
use serde::{Deserialize, Serialize};

/// Error type for port operations
///
/// Every adapter, in-memory or PostgreSQL, reports failures through this type.
#[derive(Debug, Error)]
pub enum PortError {
    #[error("Not found: {entity_type} with id {id}")]
    NotFound {
        entity_type: String,
        id: String,
    },

    /// The store rejected a value it was asked to write
    #[error("Validation error: {message}")]
    Validation {
        message: String,
    },

    /// A document with the same identity already exists
    #[error("Conflict: {message}")]
    Conflict {
        message: String,
    },

    /// The store could not be reached or the pool is exhausted
    #[error("Connection error: {message}")]
    Connection {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },

    /// No authenticated caller accompanied the operation
    #[error("Unauthorized: {message}")]
    Unauthorized {
        message: String,
    },

    #[error("Internal error: {message}")]
    Internal {
        message: String,
        #[source]
        source: Option<Box<dyn std::error::Error + Send + Sync>>,
    },
}

impl PortError {
    pub fn not_found(entity_type: impl Into<String>, id: impl fmt::Display) -> Self {
        PortError::NotFound {
            entity_type: entity_type.into(),
            id: id.to_string(),
        }
    }

    pub fn validation(message: impl Into<String>) -> Self {
        PortError::Validation {
            message: message.into(),
        }
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        PortError::Conflict {
            message: message.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        PortError::Internal {
            message: message.into(),
            source: None,
        }
    }

    /// Returns true if a retry might succeed
    pub fn is_transient(&self) -> bool {
        matches!(self, PortError::Connection { .. })
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, PortError::NotFound { .. })
    }
}

/// Marker trait for all domain ports
///
/// All port traits should extend this marker to ensure they are
/// thread-safe and can be used in async contexts.
pub trait DomainPort: Send + Sync + 'static {}

/// Health status for an adapter
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdapterHealth {
    /// Adapter is healthy and operational
    Healthy,
    /// Adapter is degraded but operational
    Degraded,
    /// Adapter is unhealthy and not operational
    Unhealthy,
    /// Health status is unknown
    Unknown,
}

/// Health check result for an adapter
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthCheckResult {
    /// Adapter identifier
    pub adapter_id: String,
    /// Current health status
    pub status: AdapterHealth,
    /// Latency of the health check in milliseconds
    pub latency_ms: u64,
    /// Optional message with additional details
    pub message: Option<String>,
    /// Timestamp of the health check
    pub checked_at: chrono::DateTime<chrono::Utc>,
}

/// Trait for adapters that support health checks
#[async_trait::async_trait]
pub trait HealthCheckable: Send + Sync {
    /// Performs a health check on the adapter
    ///
    /// # Returns
    ///
    /// A `HealthCheckResult` indicating the current health status
    async fn health_check(&self) -> HealthCheckResult;
}

/// Who is calling a port operation, and on whose behalf
///
/// Every service operation refuses to run without a caller.
#[derive(Debug, Clone, Default)]
pub struct OperationMetadata {
    /// Authenticated user that initiated the operation
    pub initiated_by: Option<String>,
    /// Free-form context such as the caller's roles
    pub context: std::collections::HashMap<String, String>,
}

impl OperationMetadata {
    pub fn for_caller(user: impl Into<String>) -> Self {
        Self {
            initiated_by: Some(user.into()),
            ..Default::default()
        }
    }

    pub fn with_context(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.context.insert(key.into(), value.into());
        self
    }

    /// Returns the authenticated caller, or `Unauthorized` when absent or blank
    pub fn require_caller(&self) -> Result<&str, PortError> {
        self.initiated_by
            .as_deref()
            .filter(|user| !user.trim().is_empty())
            .ok_or_else(|| PortError::Unauthorized {
                message: "An authenticated caller is required".to_string(),
            })
    }
}
