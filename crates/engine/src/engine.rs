//! Engine facade
//!
//! Ties the loaded index, provenance store, seed selector, response cache,
//! and downstream gate together behind one handle. A process builds one
//! `Engine` at startup and shares it; everything except the response cache
//! is immutable after `load`, so concurrent queries never contend.

use crate::cache::{CacheStats, ResponseCache};
use crate::expand::{self, ExpandOptions, ExpansionResult};
use crate::gate::DownstreamGate;
use crate::index::{GraphIndex, IndexStats, LoadReport, TraversalConfig};
use crate::provenance::ProvenanceStore;
use crate::seed::{SeedSelection, SeedSelector};
use agora_common::config::AppConfig;
use agora_common::errors::{AppError, Result};
use agora_common::types::{Chunk, Community, Entity, EntityId, PartitionId};
use std::sync::Arc;
use tracing::info;

/// Seed selection plus the expansion it produced
#[derive(Debug, Clone)]
pub struct RetrievalContext {
    pub selection: SeedSelection,
    pub expansion: ExpansionResult,
}

/// One shared engine instance per process
pub struct Engine {
    config: AppConfig,
    index: GraphIndex,
    provenance: ProvenanceStore,
    traversal: TraversalConfig,
    selector: SeedSelector,
    cache: Arc<ResponseCache>,
    gate: Arc<DownstreamGate>,
    report: LoadReport,
}

impl Engine {
    /// Load the corpus under `config.corpus.data_root` and assemble the
    /// engine. Fails only if the corpus root itself is unreadable; partition
    /// failures are recorded in the load report instead.
    pub fn load(config: AppConfig) -> Result<Self> {
        let corpus = GraphIndex::load(&config.corpus.data_root, &config.corpus)?;
        let engine = Self {
            selector: SeedSelector::new(config.retrieval.clone()),
            cache: Arc::new(ResponseCache::new(&config.cache)),
            gate: Arc::new(DownstreamGate::new(&config.downstream)),
            traversal: TraversalConfig::default(),
            index: corpus.index,
            provenance: corpus.provenance,
            report: corpus.report,
            config,
        };
        info!(
            partitions = engine.report.loaded_count(),
            failed = engine.report.failed_count(),
            "Engine ready"
        );
        Ok(engine)
    }

    /// Per-partition load outcomes
    pub fn load_report(&self) -> &LoadReport {
        &self.report
    }

    /// Run dual-strategy seed selection for a query
    pub fn select_seeds(&self, query: &str) -> SeedSelection {
        self.selector.select(&self.index, query)
    }

    /// Expand outward from a seed set
    pub fn expand(&self, seeds: &[EntityId], options: &ExpandOptions) -> ExpansionResult {
        expand::expand(&self.index, &self.provenance, &self.traversal, seeds, options)
    }

    /// Full retrieval: seed selection followed by expansion with chunks
    /// attached, using the configured bounds.
    pub fn retrieve(&self, query: &str) -> RetrievalContext {
        let selection = self.select_seeds(query);
        let expansion = self.expand(&selection.seeds, &self.expand_options());
        RetrievalContext {
            selection,
            expansion,
        }
    }

    /// Expansion options derived from the retrieval configuration
    pub fn expand_options(&self) -> ExpandOptions {
        let retrieval = &self.config.retrieval;
        ExpandOptions {
            max_hops: retrieval.max_hops,
            max_results: retrieval.max_results,
            partition: None,
            include_chunks: true,
            max_chunks_per_entity: retrieval.max_chunks_per_entity,
            max_total_chunks: retrieval.max_total_chunks,
        }
    }

    /// Entity metadata by id
    pub fn get_entity(&self, id: &str) -> Result<&Entity> {
        self.index
            .get_entity(id)
            .ok_or_else(|| AppError::EntityNotFound { id: id.to_string() })
    }

    /// Entity metadata by normalized name
    pub fn get_entity_by_name(&self, name: &str) -> Option<&Entity> {
        self.index.get_entity_by_name(name)
    }

    /// Source chunks supporting an entity, in reference order.
    /// Empty for entities without provenance; this is not an error.
    pub fn get_chunks_for_entity(&self, id: &str) -> Vec<&Chunk> {
        self.provenance.get_chunks_for_entity(id)
    }

    /// Top community reports for one partition, ranked best first
    pub fn get_communities(&self, partition: &str, limit: usize) -> Result<Vec<&Community>> {
        if !self.index.has_partition(partition) {
            return Err(AppError::PartitionNotFound {
                id: partition.to_string(),
            });
        }
        let mut communities: Vec<&Community> = self.index.communities(partition).iter().collect();
        communities.sort_by(|a, b| b.rank.total_cmp(&a.rank).then_with(|| a.id.cmp(&b.id)));
        communities.truncate(limit);
        Ok(communities)
    }

    /// Successfully loaded partitions, in discovery order
    pub fn partitions(&self) -> &[PartitionId] {
        self.index.partitions()
    }

    /// Index statistics
    pub fn stats(&self) -> &IndexStats {
        self.index.stats()
    }

    /// The process-wide response cache
    pub fn cache(&self) -> &Arc<ResponseCache> {
        &self.cache
    }

    pub fn cache_stats(&self) -> CacheStats {
        self.cache.stats()
    }

    pub fn cache_clear(&self) {
        self.cache.clear()
    }

    /// Admission gate for downstream model calls
    pub fn downstream_gate(&self) -> &Arc<DownstreamGate> {
        &self.gate
    }

    /// Per-query deadline from configuration
    pub fn query_timeout(&self) -> std::time::Duration {
        self.config.query_timeout()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::index::{COMMUNITIES_FILE, GRAPH_FILE};
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    fn write_corpus(dir: &Path) {
        let p1 = dir.join("nord");
        fs::create_dir_all(&p1).unwrap();
        fs::write(
            p1.join(GRAPH_FILE),
            r#"{
                "nodes": [
                    {"id": "FISCALITE", "name": "Fiscalité", "type": "THEME",
                     "source_references": "c1<SEP>c2"},
                    {"id": "IMPOTS", "name": "Impôts locaux", "type": "CONCEPT"},
                    {"id": "MAIRIE", "name": "Mairie", "type": "INSTITUTION"}
                ],
                "edges": [
                    {"source": "FISCALITE", "target": "IMPOTS", "type": "CONCERNS"},
                    {"source": "IMPOTS", "target": "MAIRIE", "type": "PART_OF"}
                ]
            }"#,
        )
        .unwrap();
        fs::write(
            p1.join("kv_store_text_chunks.json"),
            r#"{
                "c1": {"content": "la fiscalité locale", "tokens": 4,
                       "order_index": 0, "parent_doc_id": "doc-1"},
                "c2": {"content": "les impôts", "tokens": 2,
                       "order_index": 1, "parent_doc_id": "doc-1"}
            }"#,
        )
        .unwrap();
        fs::write(
            p1.join(COMMUNITIES_FILE),
            r#"{
                "com-0": {"level": 0, "title": "Fiscalité", "summary": "Impôts et taxes.",
                          "rank": 7.5, "entity_ids": ["FISCALITE", "IMPOTS"]},
                "com-1": {"level": 0, "title": "Institutions", "summary": "La mairie.",
                          "rank": 9.0, "entity_ids": ["MAIRIE"]}
            }"#,
        )
        .unwrap();

        let p2 = dir.join("sud");
        fs::create_dir_all(&p2).unwrap();
        fs::write(
            p2.join(GRAPH_FILE),
            r#"{
                "nodes": [
                    {"id": "FISCALITE_SUD", "name": "Fiscalité du sud", "type": "THEME"},
                    {"id": "TAXES_SUD", "name": "Taxes", "type": "CONCEPT"}
                ],
                "edges": [
                    {"source": "FISCALITE_SUD", "target": "TAXES_SUD", "type": "CONCERNS"}
                ]
            }"#,
        )
        .unwrap();
    }

    fn engine(dir: &Path) -> Engine {
        let mut config = AppConfig::default();
        config.corpus.data_root = dir.to_path_buf();
        Engine::load(config).unwrap()
    }

    #[test]
    fn test_end_to_end_retrieval() {
        let tmp = TempDir::new().unwrap();
        write_corpus(tmp.path());
        let engine = engine(tmp.path());

        let context = engine.retrieve("Que pensent les citoyens de la fiscalité ?");

        // Both partitions contribute despite only one having a matching community
        assert!(context.selection.partitions.contains("nord"));
        assert!(context.selection.partitions.contains("sud"));
        assert!(!context.expansion.entities.is_empty());
        // Seed provenance is attached
        assert!(context.expansion.chunks.iter().any(|c| c.id == "c1"));
    }

    #[test]
    fn test_entity_lookup_errors() {
        let tmp = TempDir::new().unwrap();
        write_corpus(tmp.path());
        let engine = engine(tmp.path());

        assert_eq!(engine.get_entity("FISCALITE").unwrap().name, "Fiscalité");
        assert!(matches!(
            engine.get_entity("GHOST"),
            Err(AppError::EntityNotFound { .. })
        ));
    }

    #[test]
    fn test_communities_ranked_and_bounded() {
        let tmp = TempDir::new().unwrap();
        write_corpus(tmp.path());
        let engine = engine(tmp.path());

        let communities = engine.get_communities("nord", 10).unwrap();
        assert_eq!(communities[0].id, "com-1"); // rank 9.0 first
        assert_eq!(communities.len(), 2);

        let top = engine.get_communities("nord", 1).unwrap();
        assert_eq!(top.len(), 1);

        assert!(matches!(
            engine.get_communities("inconnu", 10),
            Err(AppError::PartitionNotFound { .. })
        ));
    }

    #[test]
    fn test_chunks_for_entity() {
        let tmp = TempDir::new().unwrap();
        write_corpus(tmp.path());
        let engine = engine(tmp.path());

        let chunks = engine.get_chunks_for_entity("FISCALITE");
        let ids: Vec<_> = chunks.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["c1", "c2"]);
        assert!(engine.get_chunks_for_entity("MAIRIE").is_empty());
    }

    #[test]
    fn test_stats_and_cache_surface() {
        let tmp = TempDir::new().unwrap();
        write_corpus(tmp.path());
        let engine = engine(tmp.path());

        assert_eq!(engine.stats().partition_count, 2);
        assert_eq!(engine.partitions(), &["nord", "sud"]);

        engine.cache().set("m", "q", "r".to_string());
        assert_eq!(engine.cache_stats().size, 1);
        engine.cache_clear();
        assert_eq!(engine.cache_stats().size, 0);

        assert_eq!(engine.downstream_gate().max_concurrent(), 5);
    }
}
