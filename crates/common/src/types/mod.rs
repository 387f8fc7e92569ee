//! Core domain types for the Agora knowledge graph
//!
//! The corpus is a set of independently loaded partitions (one per civic
//! consultation unit), each contributing entities, typed relationships,
//! source-text chunks, and precomputed community summaries.

use serde::{Deserialize, Serialize};
use std::fmt;

/// Partition identifier (one knowledge-graph segment, e.g. one commune)
pub type PartitionId = String;

/// Entity identifier, unique within a partition and in practice corpus-wide
pub type EntityId = String;

/// Chunk identifier
pub type ChunkId = String;

/// Community identifier
pub type CommunityId = String;

/// Parent document identifier for chunks
pub type DocumentId = String;

/// Closed enumeration of entity types found in the civic corpus
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EntityType {
    /// Thematic grouping (e.g. taxation, ecology)
    Theme,
    /// Concrete citizen proposal
    Proposal,
    /// Abstract concept
    Concept,
    /// Public institution or organization
    Institution,
    /// Reference to a citizen contribution
    CitizenReference,
    /// Individual person
    Person,
    /// Geographic reference
    Place,
    /// Unrecognized type label
    Unknown,
}

impl EntityType {
    /// Parse a type label from a partition graph file.
    ///
    /// Unrecognized labels map to `Unknown` rather than failing the load.
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "THEME" => EntityType::Theme,
            "PROPOSAL" => EntityType::Proposal,
            "CONCEPT" => EntityType::Concept,
            "INSTITUTION" | "ORGANIZATION" => EntityType::Institution,
            "CITIZEN_REFERENCE" | "CONTRIBUTION" => EntityType::CitizenReference,
            "PERSON" => EntityType::Person,
            "PLACE" | "LOCATION" => EntityType::Place,
            _ => EntityType::Unknown,
        }
    }

    /// All variants, in priority order (used by configuration tables)
    pub fn all() -> &'static [EntityType] {
        &[
            EntityType::Theme,
            EntityType::Proposal,
            EntityType::Concept,
            EntityType::Institution,
            EntityType::CitizenReference,
            EntityType::Person,
            EntityType::Place,
            EntityType::Unknown,
        ]
    }
}

impl fmt::Display for EntityType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            EntityType::Theme => "THEME",
            EntityType::Proposal => "PROPOSAL",
            EntityType::Concept => "CONCEPT",
            EntityType::Institution => "INSTITUTION",
            EntityType::CitizenReference => "CITIZEN_REFERENCE",
            EntityType::Person => "PERSON",
            EntityType::Place => "PLACE",
            EntityType::Unknown => "UNKNOWN",
        };
        f.write_str(s)
    }
}

/// Closed enumeration of relationship types
///
/// Each type carries a static traversal weight in [0, 1]; the mapping lives
/// in the engine's `TraversalConfig` so it is independently testable.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    /// Directly concerns a topic (strongest semantic link)
    Concerns,
    /// Contributes to a theme or proposal
    ContributesTo,
    /// Expresses an opinion or position
    Expresses,
    /// Proposes a measure
    Proposes,
    /// Structural containment
    PartOf,
    /// Weak semantic membership
    BelongsTo,
    /// Generic fallback for unrecognized labels
    RelatedTo,
}

impl RelationType {
    /// Parse a relationship label from a partition graph file.
    ///
    /// Unrecognized labels map to `RelatedTo` (the generic fallback).
    pub fn parse(label: &str) -> Self {
        match label.trim().to_ascii_uppercase().as_str() {
            "CONCERNS" | "CONCERNE" => RelationType::Concerns,
            "CONTRIBUTES_TO" | "CONTRIBUE_A" => RelationType::ContributesTo,
            "EXPRESSES" | "EXPRIME" => RelationType::Expresses,
            "PROPOSES" | "PROPOSE" => RelationType::Proposes,
            "PART_OF" | "FAIT_PARTIE_DE" => RelationType::PartOf,
            "BELONGS_TO" | "APPARTIENT_A" => RelationType::BelongsTo,
            _ => RelationType::RelatedTo,
        }
    }

    /// All variants
    pub fn all() -> &'static [RelationType] {
        &[
            RelationType::Concerns,
            RelationType::ContributesTo,
            RelationType::Expresses,
            RelationType::Proposes,
            RelationType::PartOf,
            RelationType::BelongsTo,
            RelationType::RelatedTo,
        ]
    }
}

impl fmt::Display for RelationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            RelationType::Concerns => "CONCERNS",
            RelationType::ContributesTo => "CONTRIBUTES_TO",
            RelationType::Expresses => "EXPRESSES",
            RelationType::Proposes => "PROPOSES",
            RelationType::PartOf => "PART_OF",
            RelationType::BelongsTo => "BELONGS_TO",
            RelationType::RelatedTo => "RELATED_TO",
        };
        f.write_str(s)
    }
}

/// A graph node with load-time-parsed provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Entity {
    /// Node id
    pub id: EntityId,

    /// Human-readable name
    pub name: String,

    /// Entity type
    pub entity_type: EntityType,

    /// Free-text description (truncated at load)
    pub description: String,

    /// Owning partition
    pub partition: PartitionId,

    /// Supporting chunk ids, parsed once at load from the node's
    /// delimiter-separated `source_references` attribute. Deliberately a
    /// metadata field, never a graph edge.
    pub source_references: Vec<ChunkId>,
}

/// A typed, directed edge between two entities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Relationship {
    /// Source entity id
    pub source: EntityId,

    /// Target entity id
    pub target: EntityId,

    /// Relationship type
    pub relation: RelationType,

    /// Optional per-edge weight override (replaces the static type weight)
    pub weight: Option<f64>,

    /// Owning partition
    pub partition: PartitionId,
}

/// A unit of original source text
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    /// Chunk id
    pub id: ChunkId,

    /// Raw text content
    pub content: String,

    /// Token count
    pub tokens: usize,

    /// Order index within the parent document
    pub order_index: usize,

    /// Parent document id
    pub parent_doc_id: DocumentId,

    /// Owning partition
    pub partition: PartitionId,
}

/// A precomputed entity cluster with a generated summary
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Community {
    /// Community id
    pub id: CommunityId,

    /// Hierarchical level
    pub level: u32,

    /// Title
    pub title: String,

    /// Generated summary text
    pub summary: String,

    /// Importance rank (higher = more important)
    pub rank: f64,

    /// Member entity ids
    pub entity_ids: Vec<EntityId>,

    /// Owning partition
    pub partition: PartitionId,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entity_type_parse() {
        assert_eq!(EntityType::parse("theme"), EntityType::Theme);
        assert_eq!(EntityType::parse(" CONCEPT "), EntityType::Concept);
        assert_eq!(EntityType::parse("ORGANIZATION"), EntityType::Institution);
        assert_eq!(EntityType::parse("whatever"), EntityType::Unknown);
    }

    #[test]
    fn test_relation_type_parse() {
        assert_eq!(RelationType::parse("CONCERNS"), RelationType::Concerns);
        assert_eq!(RelationType::parse("concerne"), RelationType::Concerns);
        assert_eq!(RelationType::parse("APPARTIENT_A"), RelationType::BelongsTo);
        assert_eq!(RelationType::parse(""), RelationType::RelatedTo);
        assert_eq!(RelationType::parse("mystery"), RelationType::RelatedTo);
    }

    #[test]
    fn test_display_roundtrip() {
        for &rt in RelationType::all() {
            assert_eq!(RelationType::parse(&rt.to_string()), rt);
        }
        for &et in EntityType::all() {
            assert_eq!(EntityType::parse(&et.to_string()), et);
        }
    }
}
