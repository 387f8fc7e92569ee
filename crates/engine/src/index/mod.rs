//! Pre-computed graph index for O(1) multi-hop traversal
//!
//! Loads every partition once at startup into immutable adjacency lists and
//! metadata maps; every other component reads from here. After load the
//! index is never mutated, so unlimited concurrent readers are safe without
//! locks.

mod loader;
mod weights;

pub use loader::{LoadReport, PartitionOutcome, CHUNKS_FILE, COMMUNITIES_FILE, GRAPH_FILE};
pub use weights::TraversalConfig;

use crate::provenance::ProvenanceStore;
use agora_common::config::CorpusConfig;
use agora_common::errors::Result;
use agora_common::types::{Community, Entity, EntityId, PartitionId, RelationType};
use serde::Serialize;
use std::collections::HashMap;
use std::path::Path;
use std::time::Instant;
use tracing::{error, info};

/// One directed step in the walkable graph.
///
/// Each relationship contributes a forward and a reverse `EdgeRef`, so
/// traversal can walk against edge direction.
#[derive(Debug, Clone)]
pub struct EdgeRef {
    /// Neighbor entity id
    pub target: EntityId,

    /// Relationship type
    pub relation: RelationType,

    /// Optional per-edge weight override
    pub weight: Option<f64>,
}

/// Index statistics reported by `stats()`
#[derive(Debug, Clone, Serialize)]
pub struct IndexStats {
    pub entity_count: usize,
    pub edge_count: usize,
    pub chunk_count: usize,
    pub community_count: usize,
    pub partition_count: usize,
    pub failed_partition_count: usize,
    pub load_time_ms: u64,
    pub memory_estimate_mb: f64,
}

/// The loaded corpus: index, provenance store, and the per-partition report
pub struct LoadedCorpus {
    pub index: GraphIndex,
    pub provenance: ProvenanceStore,
    pub report: LoadReport,
}

/// Immutable graph index over all loaded partitions
pub struct GraphIndex {
    /// Entity metadata; only entities with at least one edge survive load
    entities: HashMap<EntityId, Entity>,

    /// Bidirectional adjacency: entity id -> ordered neighbor list
    adjacency: HashMap<EntityId, Vec<EdgeRef>>,

    /// Normalized (uppercased, trimmed) name -> entity id
    name_index: HashMap<String, EntityId>,

    /// Community reports per partition
    communities: HashMap<PartitionId, Vec<Community>>,

    /// Successfully loaded partitions, in discovery order
    partitions: Vec<PartitionId>,

    stats: IndexStats,
}

impl GraphIndex {
    /// Load every partition under `root`.
    ///
    /// A partition whose graph file is malformed is skipped with a logged
    /// failure; loading continues for the rest (partial availability over
    /// total failure). After all partitions load, entities with no incident
    /// edges are dropped from the walkable graph and the name index.
    pub fn load(root: &Path, config: &CorpusConfig) -> Result<LoadedCorpus> {
        let start = Instant::now();

        let mut index = GraphIndex {
            entities: HashMap::new(),
            adjacency: HashMap::new(),
            name_index: HashMap::new(),
            communities: HashMap::new(),
            partitions: Vec::new(),
            stats: IndexStats {
                entity_count: 0,
                edge_count: 0,
                chunk_count: 0,
                community_count: 0,
                partition_count: 0,
                failed_partition_count: 0,
                load_time_ms: 0,
                memory_estimate_mb: 0.0,
            },
        };
        let mut provenance = ProvenanceStore::new();
        let mut report = LoadReport::default();

        for (partition_id, path) in loader::discover_partitions(root)? {
            match loader::load_partition(&partition_id, &path, config.max_description_len) {
                Ok(data) => {
                    let counts = index.absorb_partition(&partition_id, data, &mut provenance);
                    report.outcomes.push((partition_id, counts));
                }
                Err(e) => {
                    error!(partition = %partition_id, error = %e, "Partition load failed, skipping");
                    report.outcomes.push((
                        partition_id,
                        PartitionOutcome::Failed {
                            reason: e.to_string(),
                        },
                    ));
                }
            }
        }

        index.drop_orphans(&mut provenance);

        index.stats.entity_count = index.entities.len();
        index.stats.chunk_count = provenance.chunk_count();
        index.stats.partition_count = report.loaded_count();
        index.stats.failed_partition_count = report.failed_count();
        index.stats.load_time_ms = start.elapsed().as_millis() as u64;
        index.stats.memory_estimate_mb = estimate_memory_mb(
            index.stats.entity_count,
            index.stats.edge_count,
            index.stats.chunk_count,
        );

        info!(
            entities = index.stats.entity_count,
            edges = index.stats.edge_count,
            chunks = index.stats.chunk_count,
            communities = index.stats.community_count,
            partitions = index.stats.partition_count,
            failed = index.stats.failed_partition_count,
            load_time_ms = index.stats.load_time_ms,
            "Graph index initialized"
        );
        agora_common::metrics::record_load(
            index.stats.load_time_ms as f64 / 1000.0,
            report.loaded_count(),
            report.failed_count(),
        );

        Ok(LoadedCorpus {
            index,
            provenance,
            report,
        })
    }

    /// Merge one parsed partition into the index and provenance store
    fn absorb_partition(
        &mut self,
        partition_id: &PartitionId,
        data: loader::PartitionData,
        provenance: &mut ProvenanceStore,
    ) -> PartitionOutcome {
        let entity_count = data.entities.len();
        let chunk_count = data.chunks.len();
        let community_count = data.communities.len();

        for entity in data.entities {
            let normalized = entity.name.trim().to_uppercase();
            self.name_index.insert(normalized, entity.id.clone());
            if !entity.source_references.is_empty() {
                provenance.set_entity_references(&entity.id, &entity.source_references);
            }
            self.entities.insert(entity.id.clone(), entity);
        }

        let mut edge_count = 0;
        for rel in data.relationships {
            // Edges referencing nodes absent from this corpus are dropped
            if !self.entities.contains_key(&rel.source) || !self.entities.contains_key(&rel.target)
            {
                continue;
            }
            self.adjacency
                .entry(rel.source.clone())
                .or_default()
                .push(EdgeRef {
                    target: rel.target.clone(),
                    relation: rel.relation,
                    weight: rel.weight,
                });
            self.adjacency.entry(rel.target).or_default().push(EdgeRef {
                target: rel.source,
                relation: rel.relation,
                weight: rel.weight,
            });
            edge_count += 1;
        }
        self.stats.edge_count += edge_count;

        for chunk in data.chunks {
            provenance.add_chunk(chunk);
        }

        self.stats.community_count += community_count;
        if community_count > 0 {
            self.communities
                .insert(partition_id.clone(), data.communities);
        }
        self.partitions.push(partition_id.clone());

        PartitionOutcome::Loaded {
            entities: entity_count,
            edges: edge_count,
            chunks: chunk_count,
            communities: community_count,
        }
    }

    /// Enforce the no-orphan invariant: entities with zero incident edges
    /// are removed from the entity map, adjacency, and name index.
    fn drop_orphans(&mut self, provenance: &mut ProvenanceStore) {
        let adjacency = &self.adjacency;
        let dropped: Vec<EntityId> = self
            .entities
            .keys()
            .filter(|id| adjacency.get(*id).map_or(true, |edges| edges.is_empty()))
            .cloned()
            .collect();

        if dropped.is_empty() {
            return;
        }
        for id in &dropped {
            self.entities.remove(id);
            self.adjacency.remove(id);
            provenance.remove_entity(id);
        }
        let entities = &self.entities;
        self.name_index.retain(|_, id| entities.contains_key(id));
        info!(dropped = dropped.len(), "Orphan entities removed");
    }

    /// Get entity metadata by id. O(1).
    pub fn get_entity(&self, id: &str) -> Option<&Entity> {
        self.entities.get(id)
    }

    /// Get entity by normalized name. O(1).
    pub fn get_entity_by_name(&self, name: &str) -> Option<&Entity> {
        let normalized = name.trim().to_uppercase();
        self.name_index
            .get(&normalized)
            .and_then(|id| self.entities.get(id))
    }

    /// All neighbors of an entity, in load order. O(1); empty for unknown ids.
    pub fn get_neighbors(&self, id: &str) -> &[EdgeRef] {
        self.adjacency.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Check if an entity survived load
    pub fn has_entity(&self, id: &str) -> bool {
        self.entities.contains_key(id)
    }

    /// Iterate all entities (order is unspecified)
    pub fn entities(&self) -> impl Iterator<Item = &Entity> {
        self.entities.values()
    }

    /// Successfully loaded partitions, in discovery order
    pub fn partitions(&self) -> &[PartitionId] {
        &self.partitions
    }

    /// True if the partition was loaded
    pub fn has_partition(&self, id: &str) -> bool {
        self.partitions.iter().any(|p| p == id)
    }

    /// Community reports for one partition (empty for unknown partitions)
    pub fn communities(&self, partition: &str) -> &[Community] {
        self.communities
            .get(partition)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Iterate all communities across partitions
    pub fn all_communities(&self) -> impl Iterator<Item = &Community> {
        self.communities.values().flatten()
    }

    /// Index statistics
    pub fn stats(&self) -> &IndexStats {
        &self.stats
    }
}

/// Rough memory estimate: ~200 bytes per entity, ~50 per edge, ~1500 per
/// chunk (chunks carry full content)
fn estimate_memory_mb(entities: usize, edges: usize, chunks: usize) -> f64 {
    let bytes = entities * 200 + edges * 50 + chunks * 1500;
    bytes as f64 / (1024.0 * 1024.0)
}
