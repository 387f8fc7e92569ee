//! Agora Graph Retrieval Engine
//!
//! In-process retrieval engine for civic-text question answering:
//! - One-time corpus ingestion into an immutable graph index
//! - O(1) chunk provenance lookup materialized at load
//! - Cost-weighted multi-hop expansion with deterministic ordering
//! - Dual-strategy seed selection for corpus-wide coverage
//! - Process-wide TTL+LRU response cache shared by all callers
//!
//! After loading, the index and provenance store are immutable and safe for
//! unlimited concurrent readers; the response cache is the only shared
//! mutable structure.

pub mod cache;
pub mod engine;
pub mod expand;
pub mod gate;
pub mod index;
pub mod provenance;
pub mod seed;

pub use cache::{CacheStats, ResponseCache};
pub use engine::{Engine, RetrievalContext};
pub use expand::{ExpandOptions, ExpandedEntity, ExpansionResult, PathStep};
pub use gate::{run_with_timeout, DownstreamGate};
pub use index::{
    EdgeRef, GraphIndex, IndexStats, LoadReport, PartitionOutcome, TraversalConfig,
};
pub use provenance::ProvenanceStore;
pub use seed::{CommunityMatch, SeedSelection, SeedSelector};
