//! Dual-strategy seed selection
//!
//! Converts a free-text query into a seed entity set with corpus-wide
//! coverage. Two independent strategies run unconditionally and their
//! results are unioned:
//!
//! 1. Community strategy: lexical match against community titles/summaries,
//!    collecting member entities of the top communities.
//! 2. Global strategy: partition-unrestricted lexical match against every
//!    entity's name and description.
//!
//! Selecting seeds from communities alone silently excludes every partition
//! whose communities don't mention the query terms, even when matching
//! entities exist there; the global strategy is mandatory, not a fallback.

use crate::index::GraphIndex;
use agora_common::config::RetrievalConfig;
use agora_common::types::{Community, EntityId, PartitionId};
use regex_lite::Regex;
use std::collections::{BTreeSet, HashSet};
use tracing::debug;

/// French stop words excluded from keyword extraction
const STOP_WORDS: &[&str] = &[
    "les", "des", "une", "que", "qui", "dans", "pour", "sur", "avec", "par", "est", "sont",
    "cette", "ces", "aux", "elle", "nous", "vous", "ils", "elles", "tous", "tout", "plus",
    "moins", "entre", "comme", "etre", "être", "avoir", "fait", "faire", "ont", "pas", "mais",
    "aussi", "leur", "leurs", "notre", "votre", "quel", "quelle", "quels", "quelles",
];

/// A community matched by the community strategy
#[derive(Debug, Clone)]
pub struct CommunityMatch {
    pub community: Community,
    pub score: f64,
}

/// Result of seed selection
#[derive(Debug, Clone, Default)]
pub struct SeedSelection {
    /// Union of both strategies, de-duplicated, first-insertion order
    /// (community seeds first). Ordering is part of the traversal
    /// tie-break contract.
    pub seeds: Vec<EntityId>,

    /// Communities matched by strategy 1, best first
    pub communities: Vec<CommunityMatch>,

    /// Partitions contributing at least one seed
    pub partitions: BTreeSet<PartitionId>,

    /// Seeds contributed by the community strategy
    pub community_seed_count: usize,

    /// Seeds contributed by the global strategy (after de-duplication)
    pub global_seed_count: usize,
}

/// Dual-strategy seed selector over an immutable index
pub struct SeedSelector {
    config: RetrievalConfig,
}

impl SeedSelector {
    pub fn new(config: RetrievalConfig) -> Self {
        Self { config }
    }

    /// Extract query keywords: lowercase words of 3+ characters, stop words
    /// removed, de-duplicated with stable order.
    pub fn keywords(query: &str) -> Vec<String> {
        // \w in regex-lite is ASCII; match letter runs explicitly so accented
        // French words survive tokenization
        let word = Regex::new(r"[0-9A-Za-zÀ-ÖØ-öø-ÿ]{3,}").expect("static regex");
        let mut seen = HashSet::new();
        word.find_iter(&query.to_lowercase())
            .map(|m| m.as_str().to_string())
            .filter(|w| !STOP_WORDS.contains(&w.as_str()))
            .filter(|w| seen.insert(w.clone()))
            .collect()
    }

    /// Strategy 1: score every community by keyword overlap against its
    /// title (weight 3) and summary (weight 1); best first.
    pub fn community_strategy(&self, index: &GraphIndex, keywords: &[String]) -> Vec<CommunityMatch> {
        let mut matches: Vec<CommunityMatch> = index
            .all_communities()
            .filter_map(|community| {
                let title = community.title.to_lowercase();
                let summary = community.summary.to_lowercase();
                let mut score = 0.0;
                for keyword in keywords {
                    if title.contains(keyword.as_str()) {
                        score += 3.0;
                    }
                    if summary.contains(keyword.as_str()) {
                        score += 1.0;
                    }
                }
                (score > 0.0).then(|| CommunityMatch {
                    community: community.clone(),
                    score,
                })
            })
            .collect();

        matches.sort_by(|a, b| {
            b.score
                .total_cmp(&a.score)
                .then_with(|| a.community.partition.cmp(&b.community.partition))
                .then_with(|| a.community.id.cmp(&b.community.id))
        });
        matches.truncate(self.config.max_communities);
        matches
    }

    /// Strategy 2: corpus-wide scan of entity names and descriptions.
    /// Name match = 5 points per keyword, description match = 1; best first.
    pub fn global_strategy(&self, index: &GraphIndex, keywords: &[String]) -> Vec<EntityId> {
        let mut scored: Vec<(f64, &EntityId)> = index
            .entities()
            .filter_map(|entity| {
                let name = entity.name.to_lowercase();
                let description = entity.description.to_lowercase();
                let mut score = 0.0;
                for keyword in keywords {
                    if name.contains(keyword.as_str()) {
                        score += 5.0;
                    }
                    if description.contains(keyword.as_str()) {
                        score += 1.0;
                    }
                }
                (score > 0.0).then_some((score, &entity.id))
            })
            .collect();

        scored.sort_by(|a, b| b.0.total_cmp(&a.0).then_with(|| a.1.cmp(b.1)));
        scored
            .into_iter()
            .take(self.config.max_global_matches)
            .map(|(_, id)| id.clone())
            .collect()
    }

    /// Run both strategies and union their seeds.
    pub fn select(&self, index: &GraphIndex, query: &str) -> SeedSelection {
        let keywords = Self::keywords(query);
        if keywords.is_empty() {
            return SeedSelection::default();
        }

        let communities = self.community_strategy(index, &keywords);
        let global = self.global_strategy(index, &keywords);

        let mut seeds: Vec<EntityId> = Vec::new();
        let mut seen: HashSet<EntityId> = HashSet::new();

        for matched in &communities {
            for entity_id in matched
                .community
                .entity_ids
                .iter()
                .take(self.config.max_seeds_per_community)
            {
                if index.has_entity(entity_id) && seen.insert(entity_id.clone()) {
                    seeds.push(entity_id.clone());
                }
            }
        }
        let community_seed_count = seeds.len();

        for entity_id in global {
            if seen.insert(entity_id.clone()) {
                seeds.push(entity_id);
            }
        }
        let global_seed_count = seeds.len() - community_seed_count;

        let partitions: BTreeSet<PartitionId> = seeds
            .iter()
            .filter_map(|id| index.get_entity(id))
            .map(|e| e.partition.clone())
            .collect();

        debug!(
            keywords = keywords.len(),
            communities = communities.len(),
            community_seeds = community_seed_count,
            global_seeds = global_seed_count,
            partitions = partitions.len(),
            "Seed selection complete"
        );
        agora_common::metrics::record_seed_selection(seeds.len(), partitions.len());

        SeedSelection {
            seeds,
            communities,
            partitions,
            community_seed_count,
            global_seed_count,
        }
    }
}
