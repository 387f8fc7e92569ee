//! Weighted multi-hop expansion
//!
//! Uniform-cost search outward from a seed set. Each traversed edge costs
//! `1 / (relationship_weight × entity_type_priority)`, so semantically
//! stronger relationships and higher-priority entity types are explored
//! first. The frontier is a priority queue ordered by accumulated cost;
//! ties break on lower hop count, then frontier insertion order, which
//! makes the output fully deterministic for identical inputs.

use crate::index::{GraphIndex, TraversalConfig};
use crate::provenance::ProvenanceStore;
use agora_common::types::{Chunk, EntityId, EntityType, PartitionId, RelationType};
use serde::Serialize;
use std::cmp::{Ordering, Reverse};
use std::collections::{BinaryHeap, HashMap, HashSet};
use std::time::Instant;
use tracing::debug;

/// Expansion bounds and behavior
#[derive(Debug, Clone)]
pub struct ExpandOptions {
    /// Maximum traversal depth
    pub max_hops: usize,

    /// Maximum entities in the result set
    pub max_results: usize,

    /// Restrict expansion to one partition; `None` allows paths to cross
    /// partition boundaries (required for corpus-wide queries)
    pub partition: Option<PartitionId>,

    /// Attach source chunks for the seed entities to the result
    pub include_chunks: bool,

    /// Cap on chunks attached per seed entity
    pub max_chunks_per_entity: usize,

    /// Cap on total attached chunks
    pub max_total_chunks: usize,
}

impl Default for ExpandOptions {
    fn default() -> Self {
        Self {
            max_hops: 3,
            max_results: 200,
            partition: None,
            include_chunks: false,
            max_chunks_per_entity: 2,
            max_total_chunks: 20,
        }
    }
}

/// One traversed edge on a settled path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PathStep {
    pub source: EntityId,
    pub relation: RelationType,
    pub target: EntityId,
}

/// An entity reached by expansion, with the path that reached it
#[derive(Debug, Clone, Serialize)]
pub struct ExpandedEntity {
    pub id: EntityId,
    pub name: String,
    pub entity_type: EntityType,
    pub description: String,
    pub partition: PartitionId,

    /// Accumulated traversal cost (0 for seeds; lower = more relevant)
    pub cost: f64,

    /// Hops from the nearest seed
    pub hops: usize,

    /// Edge sequence from the seed that settled this entity
    pub path: Vec<PathStep>,
}

/// Ranked, bounded expansion output
#[derive(Debug, Clone, Default, Serialize)]
pub struct ExpansionResult {
    /// Entities in settle order (best accumulated cost first)
    pub entities: Vec<ExpandedEntity>,

    /// All settled transitions, in settle order
    pub paths: Vec<PathStep>,

    /// Source chunks for the seeds, when requested
    pub chunks: Vec<Chunk>,
}

/// Frontier candidate. Total order: cost asc, then hops asc, then
/// insertion order asc.
struct Candidate {
    cost: f64,
    hops: usize,
    order: u64,
    entity: EntityId,
    came_from: Option<(EntityId, RelationType)>,
}

impl PartialEq for Candidate {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}
impl Eq for Candidate {}

impl PartialOrd for Candidate {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Candidate {
    fn cmp(&self, other: &Self) -> Ordering {
        self.cost
            .total_cmp(&other.cost)
            .then_with(|| self.hops.cmp(&other.hops))
            .then_with(|| self.order.cmp(&other.order))
    }
}

/// Expand outward from `seeds` over the immutable index.
///
/// Seeds absent from the index are silently skipped; an empty result is
/// normal, not an error.
pub fn expand(
    index: &GraphIndex,
    provenance: &ProvenanceStore,
    weights: &TraversalConfig,
    seeds: &[EntityId],
    options: &ExpandOptions,
) -> ExpansionResult {
    let start = Instant::now();

    let mut heap: BinaryHeap<Reverse<Candidate>> = BinaryHeap::new();
    let mut settled: HashMap<EntityId, (f64, usize)> = HashMap::new();
    let mut settle_order: Vec<EntityId> = Vec::new();
    let mut predecessor: HashMap<EntityId, PathStep> = HashMap::new();
    let mut paths: Vec<PathStep> = Vec::new();
    let mut order: u64 = 0;

    for seed in seeds {
        if !index.has_entity(seed) {
            continue;
        }
        if let Some(filter) = &options.partition {
            if index.get_entity(seed).map(|e| &e.partition) != Some(filter) {
                continue;
            }
        }
        heap.push(Reverse(Candidate {
            cost: 0.0,
            hops: 0,
            order,
            entity: seed.clone(),
            came_from: None,
        }));
        order += 1;
    }

    while let Some(Reverse(candidate)) = heap.pop() {
        if settled.len() >= options.max_results {
            break;
        }
        if settled.contains_key(&candidate.entity) {
            continue;
        }
        settled.insert(candidate.entity.clone(), (candidate.cost, candidate.hops));
        settle_order.push(candidate.entity.clone());

        if let Some((source, relation)) = candidate.came_from {
            let step = PathStep {
                source,
                relation,
                target: candidate.entity.clone(),
            };
            predecessor.insert(candidate.entity.clone(), step.clone());
            paths.push(step);
        }

        if candidate.hops >= options.max_hops {
            continue;
        }

        for edge in index.get_neighbors(&candidate.entity) {
            if settled.contains_key(&edge.target) {
                continue;
            }
            let Some(neighbor) = index.get_entity(&edge.target) else {
                continue;
            };
            if let Some(filter) = &options.partition {
                if &neighbor.partition != filter {
                    continue;
                }
            }
            let cost = candidate.cost
                + weights.edge_cost(edge.relation, edge.weight, neighbor.entity_type);
            heap.push(Reverse(Candidate {
                cost,
                hops: candidate.hops + 1,
                order,
                entity: edge.target.clone(),
                came_from: Some((candidate.entity.clone(), edge.relation)),
            }));
            order += 1;
        }
    }

    let entities: Vec<ExpandedEntity> = settle_order
        .iter()
        .filter_map(|id| {
            let entity = index.get_entity(id)?;
            let &(cost, hops) = settled.get(id)?;
            Some(ExpandedEntity {
                id: entity.id.clone(),
                name: entity.name.clone(),
                entity_type: entity.entity_type,
                description: entity.description.clone(),
                partition: entity.partition.clone(),
                cost,
                hops,
                path: reconstruct_path(&predecessor, id),
            })
        })
        .collect();

    let chunks = if options.include_chunks {
        collect_seed_chunks(provenance, seeds, options)
    } else {
        Vec::new()
    };

    let elapsed = start.elapsed().as_secs_f64();
    debug!(
        seeds = seeds.len(),
        entities = entities.len(),
        paths = paths.len(),
        chunks = chunks.len(),
        elapsed_ms = (elapsed * 1000.0) as u64,
        "Expansion complete"
    );
    agora_common::metrics::record_expansion(elapsed, entities.len());

    ExpansionResult {
        entities,
        paths,
        chunks,
    }
}

/// Walk the predecessor chain back to the seed that settled `entity`
fn reconstruct_path(predecessor: &HashMap<EntityId, PathStep>, entity: &str) -> Vec<PathStep> {
    let mut path = Vec::new();
    let mut current = entity.to_string();
    while let Some(step) = predecessor.get(&current) {
        current = step.source.clone();
        path.push(step.clone());
    }
    path.reverse();
    path
}

/// Source chunks for the seed entities.
///
/// Expanded intermediates often carry no provenance; the seeds are the
/// entities the query actually matched, so their chunks are the grounded
/// evidence. Capped per entity and in total.
fn collect_seed_chunks(
    provenance: &ProvenanceStore,
    seeds: &[EntityId],
    options: &ExpandOptions,
) -> Vec<Chunk> {
    let mut chunks = Vec::new();
    let mut seen: HashSet<String> = HashSet::new();
    'outer: for seed in seeds {
        for chunk in provenance
            .get_chunks_for_entity(seed)
            .into_iter()
            .take(options.max_chunks_per_entity)
        {
            if seen.insert(chunk.id.clone()) {
                chunks.push(chunk.clone());
                if chunks.len() >= options.max_total_chunks {
                    break 'outer;
                }
            }
        }
    }
    chunks
}
