//! Agora Common Library
//!
//! Shared code for the Agora retrieval engine including:
//! - Core domain types (partitions, entities, relationships, chunks, communities)
//! - Error types and handling
//! - Configuration management
//! - Metrics and observability

pub mod config;
pub mod errors;
pub mod metrics;
pub mod types;

// Re-export commonly used types
pub use config::AppConfig;
pub use errors::{AppError, Result};
pub use types::{
    Chunk, ChunkId, Community, CommunityId, DocumentId, Entity, EntityId, EntityType, PartitionId,
    RelationType, Relationship,
};

/// Application version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Delimiter separating chunk ids inside a node's `source_references` attribute.
///
/// This convention comes from the partition graph files themselves: provenance
/// is encoded as a single delimited attribute string on the node, not as edges.
/// It must be preserved bit-for-bit when reading externally produced files.
pub const SOURCE_REFERENCE_SEP: &str = "<SEP>";
