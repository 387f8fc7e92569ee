//! Error types for the Agora engine
//!
//! Provides:
//! - Distinct error types for different failure modes
//! - Machine-readable error codes for the consuming tool layer
//! - A shared `Result` alias

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,
    InvalidFormat,

    // Resource errors (4xxx)
    NotFound,
    PartitionNotFound,
    EntityNotFound,
    ChunkNotFound,

    // Load errors (7xxx)
    LoadError,
    ParseError,

    // Query errors (8xxx)
    QueryTimeout,
    CacheError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,
            ErrorCode::InvalidFormat => 1002,

            ErrorCode::NotFound => 4001,
            ErrorCode::PartitionNotFound => 4002,
            ErrorCode::EntityNotFound => 4003,
            ErrorCode::ChunkNotFound => 4004,

            ErrorCode::LoadError => 7001,
            ErrorCode::ParseError => 7002,

            ErrorCode::QueryTimeout => 8001,
            ErrorCode::CacheError => 8002,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation { message: String },

    #[error("Invalid format: {message}")]
    InvalidFormat { message: String },

    // Resource errors
    #[error("Resource not found: {resource_type} with id {id}")]
    NotFound { resource_type: String, id: String },

    #[error("Partition not found: {id}")]
    PartitionNotFound { id: String },

    #[error("Entity not found: {id}")]
    EntityNotFound { id: String },

    #[error("Chunk not found: {id}")]
    ChunkNotFound { id: String },

    // Load errors (partition-scoped, recoverable)
    #[error("Failed to load partition {partition}: {message}")]
    PartitionLoad { partition: String, message: String },

    #[error("Parse error in {path}: {message}")]
    Parse { path: String, message: String },

    // Query errors
    #[error("Query timed out after {timeout_ms}ms")]
    QueryTimeout { timeout_ms: u64 },

    #[error("Cache error: {message}")]
    CacheError { message: String },

    // Internal errors
    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::InvalidFormat { .. } => ErrorCode::InvalidFormat,
            AppError::NotFound { .. } => ErrorCode::NotFound,
            AppError::PartitionNotFound { .. } => ErrorCode::PartitionNotFound,
            AppError::EntityNotFound { .. } => ErrorCode::EntityNotFound,
            AppError::ChunkNotFound { .. } => ErrorCode::ChunkNotFound,
            AppError::PartitionLoad { .. } => ErrorCode::LoadError,
            AppError::Parse { .. } => ErrorCode::ParseError,
            AppError::QueryTimeout { .. } => ErrorCode::QueryTimeout,
            AppError::CacheError { .. } => ErrorCode::CacheError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Io(_) => ErrorCode::InternalError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Check if this error is a missing-resource condition
    pub fn is_not_found(&self) -> bool {
        matches!(
            self,
            AppError::NotFound { .. }
                | AppError::PartitionNotFound { .. }
                | AppError::EntityNotFound { .. }
                | AppError::ChunkNotFound { .. }
        )
    }

    /// Check if this error is partition-scoped and recoverable at load time
    pub fn is_recoverable_load(&self) -> bool {
        matches!(self, AppError::PartitionLoad { .. } | AppError::Parse { .. })
    }
}
