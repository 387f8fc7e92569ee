//! Partition file parsing
//!
//! Each partition directory contains a graph file plus key-value stores for
//! chunks and community reports:
//!
//! - `graph.json` — nodes (with the delimited `source_references` provenance
//!   attribute) and typed edges
//! - `kv_store_text_chunks.json` — chunk_id -> chunk record
//! - `kv_store_community_reports.json` — community_id -> community record
//!
//! A malformed graph file fails only its own partition; loading continues
//! for the rest of the corpus.

use agora_common::errors::{AppError, Result};
use agora_common::types::{
    Chunk, Community, Entity, EntityType, PartitionId, RelationType, Relationship,
};
use agora_common::SOURCE_REFERENCE_SEP;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Graph file name inside each partition directory
pub const GRAPH_FILE: &str = "graph.json";

/// Chunk key-value store file name
pub const CHUNKS_FILE: &str = "kv_store_text_chunks.json";

/// Community report key-value store file name
pub const COMMUNITIES_FILE: &str = "kv_store_community_reports.json";

/// Per-partition load outcome, aggregated into a [`LoadReport`]
#[derive(Debug, Clone)]
pub enum PartitionOutcome {
    /// Partition loaded successfully
    Loaded {
        entities: usize,
        edges: usize,
        chunks: usize,
        communities: usize,
    },
    /// Partition skipped; the rest of the corpus is unaffected
    Failed { reason: String },
}

impl PartitionOutcome {
    /// True if the partition was loaded
    pub fn is_loaded(&self) -> bool {
        matches!(self, PartitionOutcome::Loaded { .. })
    }
}

/// Aggregated load report for operator visibility
#[derive(Debug, Clone, Default)]
pub struct LoadReport {
    /// Outcome per partition, in discovery order
    pub outcomes: Vec<(PartitionId, PartitionOutcome)>,
}

impl LoadReport {
    /// Number of partitions loaded successfully
    pub fn loaded_count(&self) -> usize {
        self.outcomes.iter().filter(|(_, o)| o.is_loaded()).count()
    }

    /// Number of partitions that failed to load
    pub fn failed_count(&self) -> usize {
        self.outcomes.len() - self.loaded_count()
    }

    /// Partitions that failed, with reasons
    pub fn failures(&self) -> impl Iterator<Item = (&PartitionId, &str)> {
        self.outcomes.iter().filter_map(|(id, o)| match o {
            PartitionOutcome::Failed { reason } => Some((id, reason.as_str())),
            _ => None,
        })
    }
}

// ---------------------------------------------------------------------------
// On-disk record formats
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
struct GraphFile {
    #[serde(default)]
    nodes: Vec<NodeRecord>,
    #[serde(default)]
    edges: Vec<EdgeRecord>,
}

#[derive(Debug, Deserialize)]
struct NodeRecord {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(rename = "type", default)]
    node_type: Option<String>,
    #[serde(default)]
    description: Option<String>,
    /// Chunk ids joined by `<SEP>`. Provenance lives here, as a node
    /// attribute, never as edges.
    #[serde(default)]
    source_references: Option<String>,
}

#[derive(Debug, Deserialize)]
struct EdgeRecord {
    source: String,
    target: String,
    #[serde(rename = "type", default)]
    edge_type: Option<String>,
    #[serde(default)]
    weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ChunkRecord {
    #[serde(default)]
    content: String,
    #[serde(default)]
    tokens: usize,
    #[serde(default)]
    order_index: usize,
    #[serde(default)]
    parent_doc_id: String,
}

#[derive(Debug, Deserialize)]
struct CommunityRecord {
    #[serde(default)]
    level: u32,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(default)]
    rank: f64,
    #[serde(default)]
    entity_ids: Vec<String>,
}

/// Everything parsed from one partition directory
#[derive(Debug, Default)]
pub(crate) struct PartitionData {
    pub entities: Vec<Entity>,
    pub relationships: Vec<Relationship>,
    pub chunks: Vec<Chunk>,
    pub communities: Vec<Community>,
}

/// Discover partition directories under the corpus root.
///
/// A partition is any subdirectory containing a graph file. Sorted by name
/// for deterministic load order.
pub(crate) fn discover_partitions(root: &Path) -> Result<Vec<(PartitionId, PathBuf)>> {
    let mut partitions = Vec::new();
    for entry in fs::read_dir(root).map_err(|e| AppError::Configuration {
        message: format!("cannot read corpus root {}: {}", root.display(), e),
    })? {
        let entry = entry?;
        let path = entry.path();
        if !path.is_dir() {
            continue;
        }
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        if path.join(GRAPH_FILE).exists() {
            partitions.push((name, path));
        }
    }
    partitions.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(partitions)
}

/// Parse one partition directory.
///
/// The graph file is required; missing chunk or community stores reduce the
/// partition's counts to zero but do not fail it.
pub(crate) fn load_partition(
    partition: &PartitionId,
    path: &Path,
    max_description_len: usize,
) -> Result<PartitionData> {
    let graph_path = path.join(GRAPH_FILE);
    let raw = fs::read_to_string(&graph_path).map_err(|e| AppError::PartitionLoad {
        partition: partition.clone(),
        message: format!("cannot read {}: {}", graph_path.display(), e),
    })?;
    let graph: GraphFile = serde_json::from_str(&raw).map_err(|e| AppError::Parse {
        path: graph_path.display().to_string(),
        message: e.to_string(),
    })?;

    let mut data = PartitionData::default();

    for node in graph.nodes {
        let id = node.id.trim().trim_matches('"').to_string();
        if id.is_empty() {
            continue;
        }
        let name = node.name.filter(|n| !n.is_empty()).unwrap_or_else(|| id.clone());
        let entity_type = EntityType::parse(node.node_type.as_deref().unwrap_or(""));
        let description = truncate_chars(
            node.description.as_deref().unwrap_or(""),
            max_description_len,
        );
        let source_references = node
            .source_references
            .as_deref()
            .map(parse_source_references)
            .unwrap_or_default();

        data.entities.push(Entity {
            id,
            name,
            entity_type,
            description,
            partition: partition.clone(),
            source_references,
        });
    }

    for edge in graph.edges {
        let source = edge.source.trim().trim_matches('"').to_string();
        let target = edge.target.trim().trim_matches('"').to_string();
        if source.is_empty() || target.is_empty() {
            continue;
        }
        data.relationships.push(Relationship {
            source,
            target,
            relation: RelationType::parse(edge.edge_type.as_deref().unwrap_or("")),
            weight: edge.weight,
            partition: partition.clone(),
        });
    }

    data.chunks = load_chunks(partition, path);
    data.communities = load_communities(partition, path);

    debug!(
        partition = %partition,
        entities = data.entities.len(),
        edges = data.relationships.len(),
        chunks = data.chunks.len(),
        communities = data.communities.len(),
        "Partition parsed"
    );

    Ok(data)
}

/// Split a delimited `source_references` attribute into chunk ids.
///
/// Duplicates are collapsed while the first-occurrence order is preserved.
pub(crate) fn parse_source_references(raw: &str) -> Vec<String> {
    let mut seen = std::collections::HashSet::new();
    raw.split(SOURCE_REFERENCE_SEP)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .filter(|s| seen.insert(s.to_string()))
        .map(str::to_string)
        .collect()
}

fn load_chunks(partition: &PartitionId, path: &Path) -> Vec<Chunk> {
    let chunks_path = path.join(CHUNKS_FILE);
    if !chunks_path.exists() {
        return Vec::new();
    }
    let records: BTreeMap<String, ChunkRecord> = match fs::read_to_string(&chunks_path)
        .map_err(anyhow::Error::from)
        .and_then(|raw| serde_json::from_str(&raw).map_err(anyhow::Error::from))
    {
        Ok(records) => records,
        Err(e) => {
            warn!(partition = %partition, error = %e, "Failed to load chunk store, continuing without chunks");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .map(|(id, record)| Chunk {
            id,
            content: record.content,
            tokens: record.tokens,
            order_index: record.order_index,
            parent_doc_id: record.parent_doc_id,
            partition: partition.clone(),
        })
        .collect()
}

fn load_communities(partition: &PartitionId, path: &Path) -> Vec<Community> {
    let communities_path = path.join(COMMUNITIES_FILE);
    if !communities_path.exists() {
        return Vec::new();
    }
    let records: BTreeMap<String, CommunityRecord> = match fs::read_to_string(&communities_path)
        .map_err(anyhow::Error::from)
        .and_then(|raw| serde_json::from_str(&raw).map_err(anyhow::Error::from))
    {
        Ok(records) => records,
        Err(e) => {
            warn!(partition = %partition, error = %e, "Failed to load community store, continuing without communities");
            return Vec::new();
        }
    };

    records
        .into_iter()
        .map(|(id, record)| Community {
            id,
            level: record.level,
            title: record.title,
            summary: record.summary,
            rank: record.rank,
            entity_ids: record
                .entity_ids
                .into_iter()
                .map(|e| e.trim().trim_matches('"').to_string())
                .filter(|e| !e.is_empty())
                .collect(),
            partition: partition.clone(),
        })
        .collect()
}

/// Char-boundary-safe truncation
fn truncate_chars(s: &str, max: usize) -> String {
    if s.chars().count() <= max {
        s.to_string()
    } else {
        s.chars().take(max).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn write_partition(dir: &Path, name: &str, graph: &str) -> PathBuf {
        let p = dir.join(name);
        fs::create_dir_all(&p).unwrap();
        fs::write(p.join(GRAPH_FILE), graph).unwrap();
        p
    }

    #[test]
    fn test_parse_source_references() {
        let refs = parse_source_references("chunk-a<SEP>chunk-b<SEP> chunk-a <SEP><SEP>chunk-c");
        assert_eq!(refs, vec!["chunk-a", "chunk-b", "chunk-c"]);
        assert!(parse_source_references("").is_empty());
    }

    #[test]
    fn test_load_partition_basic() {
        let tmp = TempDir::new().unwrap();
        let p = write_partition(
            tmp.path(),
            "andeville",
            r#"{
                "nodes": [
                    {"id": "TAXES", "name": "Taxes", "type": "THEME",
                     "description": "Local taxation", "source_references": "c1<SEP>c2"},
                    {"id": "ECO", "type": "CONCEPT"}
                ],
                "edges": [
                    {"source": "TAXES", "target": "ECO", "type": "CONCERNS", "weight": 0.9}
                ]
            }"#,
        );
        fs::write(
            p.join(CHUNKS_FILE),
            r#"{"c1": {"content": "raw text", "tokens": 3, "order_index": 0, "parent_doc_id": "doc-1"}}"#,
        )
        .unwrap();

        let data = load_partition(&"andeville".to_string(), &p, 300).unwrap();
        assert_eq!(data.entities.len(), 2);
        assert_eq!(data.relationships.len(), 1);
        assert_eq!(data.chunks.len(), 1);
        assert!(data.communities.is_empty());

        let taxes = &data.entities[0];
        assert_eq!(taxes.source_references, vec!["c1", "c2"]);
        assert_eq!(taxes.entity_type, agora_common::EntityType::Theme);
        // Missing name falls back to the node id
        assert_eq!(data.entities[1].name, "ECO");
        assert_eq!(data.relationships[0].weight, Some(0.9));
    }

    #[test]
    fn test_malformed_graph_fails_partition() {
        let tmp = TempDir::new().unwrap();
        let p = write_partition(tmp.path(), "broken", "{ this is not json");
        let err = load_partition(&"broken".to_string(), &p, 300).unwrap_err();
        assert!(err.is_recoverable_load());
    }

    #[test]
    fn test_malformed_chunk_store_does_not_fail_partition() {
        let tmp = TempDir::new().unwrap();
        let p = write_partition(
            tmp.path(),
            "partial",
            r#"{"nodes": [{"id": "A"}], "edges": []}"#,
        );
        fs::write(p.join(CHUNKS_FILE), "not json at all").unwrap();

        let data = load_partition(&"partial".to_string(), &p, 300).unwrap();
        assert_eq!(data.entities.len(), 1);
        assert!(data.chunks.is_empty());
    }

    #[test]
    fn test_discover_partitions_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        write_partition(tmp.path(), "zulu", r#"{"nodes": [], "edges": []}"#);
        write_partition(tmp.path(), "alpha", r#"{"nodes": [], "edges": []}"#);
        // Directory without a graph file is not a partition
        fs::create_dir_all(tmp.path().join("not-a-partition")).unwrap();
        fs::create_dir_all(tmp.path().join(".hidden")).unwrap();

        let found = discover_partitions(tmp.path()).unwrap();
        let names: Vec<_> = found.iter().map(|(n, _)| n.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zulu"]);
    }

    #[test]
    fn test_description_truncation() {
        let tmp = TempDir::new().unwrap();
        let long_desc = "é".repeat(500);
        let p = write_partition(
            tmp.path(),
            "trunc",
            &format!(
                r#"{{"nodes": [{{"id": "A", "description": "{long_desc}"}}], "edges": []}}"#
            ),
        );
        let data = load_partition(&"trunc".to_string(), &p, 300).unwrap();
        assert_eq!(data.entities[0].description.chars().count(), 300);
    }
}
