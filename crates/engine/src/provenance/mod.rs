//! Chunk provenance store
//!
//! Materialized at load time from each entity's delimited
//! `source_references` attribute: a direct entity -> chunk table queried
//! without any disk access. Treating provenance as an edge-traversal problem
//! would silently return empty results for nearly all entities, so it is
//! deliberately a parsed metadata table, not a graph relation.

use agora_common::types::{Chunk, ChunkId, EntityId};
use std::collections::HashMap;

/// O(1) mapping from entity id to its supporting chunks
#[derive(Debug, Default)]
pub struct ProvenanceStore {
    /// All chunks across loaded partitions
    chunks: HashMap<ChunkId, Chunk>,

    /// Entity -> ordered chunk ids, parsed once at load
    by_entity: HashMap<EntityId, Vec<ChunkId>>,

    /// Chunk -> entities it supports (reverse lookup)
    by_chunk: HashMap<ChunkId, Vec<EntityId>>,
}

impl ProvenanceStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Record an entity's parsed source references (load phase only)
    pub(crate) fn set_entity_references(&mut self, entity: &EntityId, chunk_ids: &[ChunkId]) {
        for chunk_id in chunk_ids {
            self.by_chunk
                .entry(chunk_id.clone())
                .or_default()
                .push(entity.clone());
        }
        self.by_entity.insert(entity.clone(), chunk_ids.to_vec());
    }

    /// Register a loaded chunk (load phase only)
    pub(crate) fn add_chunk(&mut self, chunk: Chunk) {
        self.chunks.insert(chunk.id.clone(), chunk);
    }

    /// Remove an entity dropped by the orphan filter (load phase only)
    pub(crate) fn remove_entity(&mut self, entity: &EntityId) {
        if let Some(chunk_ids) = self.by_entity.remove(entity) {
            for chunk_id in chunk_ids {
                if let Some(entities) = self.by_chunk.get_mut(&chunk_id) {
                    entities.retain(|e| e != entity);
                }
            }
        }
    }

    /// Get chunk content by id. O(1).
    pub fn get_chunk(&self, id: &str) -> Option<&Chunk> {
        self.chunks.get(id)
    }

    /// All chunks supporting an entity, in source-reference order. O(refs).
    ///
    /// Returns an empty list, never an error, for entities without source
    /// references: purely structural entities introduced as traversal
    /// intermediates legitimately have no chunks. References naming chunks
    /// absent from the store are skipped.
    pub fn get_chunks_for_entity(&self, entity: &str) -> Vec<&Chunk> {
        self.by_entity
            .get(entity)
            .map(|ids| ids.iter().filter_map(|id| self.chunks.get(id)).collect())
            .unwrap_or_default()
    }

    /// All entities supported by a chunk (reverse of
    /// `get_chunks_for_entity`). O(degree).
    pub fn get_entities_for_chunk(&self, chunk: &str) -> &[EntityId] {
        self.by_chunk
            .get(chunk)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Number of loaded chunks
    pub fn chunk_count(&self) -> usize {
        self.chunks.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn chunk(id: &str, order: usize) -> Chunk {
        Chunk {
            id: id.to_string(),
            content: format!("content of {id}"),
            tokens: 10,
            order_index: order,
            parent_doc_id: "doc-1".to_string(),
            partition: "nord".to_string(),
        }
    }

    #[test]
    fn test_exact_chunks_in_order() {
        let mut store = ProvenanceStore::new();
        store.add_chunk(chunk("c2", 1));
        store.add_chunk(chunk("c1", 0));
        store.add_chunk(chunk("c3", 2));
        store.set_entity_references(
            &"TAXES".to_string(),
            &["c3".to_string(), "c1".to_string(), "c2".to_string()],
        );

        // Exactly N chunks for N distinct references, reference order kept
        let chunks = store.get_chunks_for_entity("TAXES");
        let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c3", "c1", "c2"]);
    }

    #[test]
    fn test_missing_entity_is_empty_not_error() {
        let store = ProvenanceStore::new();
        assert!(store.get_chunks_for_entity("GHOST").is_empty());
        assert!(store.get_entities_for_chunk("nothing").is_empty());
    }

    #[test]
    fn test_unresolved_references_skipped() {
        let mut store = ProvenanceStore::new();
        store.add_chunk(chunk("c1", 0));
        store.set_entity_references(&"A".to_string(), &["c1".to_string(), "c-missing".to_string()]);
        assert_eq!(store.get_chunks_for_entity("A").len(), 1);
    }

    #[test]
    fn test_reverse_lookup() {
        let mut store = ProvenanceStore::new();
        store.add_chunk(chunk("c1", 0));
        store.set_entity_references(&"A".to_string(), &["c1".to_string()]);
        store.set_entity_references(&"B".to_string(), &["c1".to_string()]);

        assert_eq!(store.get_entities_for_chunk("c1"), &["A", "B"]);

        store.remove_entity(&"A".to_string());
        assert_eq!(store.get_entities_for_chunk("c1"), &["B"]);
        assert!(store.get_chunks_for_entity("A").is_empty());
    }
}
