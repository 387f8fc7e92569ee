//! Static traversal weight tables
//!
//! Relationship weights and entity type priorities drive the cost model of
//! weighted expansion. They live in an explicit configuration structure so
//! traversal behavior is verifiable independently of the traversal itself.

use agora_common::types::{EntityType, RelationType};
use std::collections::HashMap;

/// Weight and priority tables for weighted expansion
#[derive(Debug, Clone)]
pub struct TraversalConfig {
    /// Relationship type -> traversal weight in (0, 1]
    pub relationship_weights: HashMap<RelationType, f64>,

    /// Entity type -> priority multiplier (>= 1.0 for preferred types)
    pub entity_priorities: HashMap<EntityType, f64>,
}

impl Default for TraversalConfig {
    fn default() -> Self {
        let relationship_weights = HashMap::from([
            (RelationType::Concerns, 1.0),
            (RelationType::ContributesTo, 0.8),
            (RelationType::Expresses, 0.7),
            (RelationType::Proposes, 0.6),
            (RelationType::PartOf, 0.5),
            (RelationType::BelongsTo, 0.3),
            (RelationType::RelatedTo, 0.1),
        ]);

        let entity_priorities = HashMap::from([
            (EntityType::Theme, 8.0),
            (EntityType::Concept, 7.0),
            (EntityType::Proposal, 6.0),
            (EntityType::Institution, 5.0),
            (EntityType::CitizenReference, 4.0),
            (EntityType::Person, 3.0),
            (EntityType::Place, 2.0),
            (EntityType::Unknown, 1.0),
        ]);

        Self {
            relationship_weights,
            entity_priorities,
        }
    }
}

impl TraversalConfig {
    /// Weight for a relationship type; the generic fallback weight when absent
    pub fn relationship_weight(&self, relation: RelationType) -> f64 {
        self.relationship_weights
            .get(&relation)
            .copied()
            .unwrap_or(0.1)
    }

    /// Priority multiplier for an entity type; lowest priority when absent
    pub fn entity_priority(&self, entity_type: EntityType) -> f64 {
        self.entity_priorities
            .get(&entity_type)
            .copied()
            .unwrap_or(1.0)
    }

    /// Cost of traversing an edge into a neighbor of the given type.
    ///
    /// Lower cost = explored first. An explicit per-edge weight override
    /// replaces the static relationship weight.
    pub fn edge_cost(
        &self,
        relation: RelationType,
        weight_override: Option<f64>,
        neighbor_type: EntityType,
    ) -> f64 {
        let rel_weight = weight_override
            .filter(|w| *w > 0.0)
            .unwrap_or_else(|| self.relationship_weight(relation));
        1.0 / (rel_weight * self.entity_priority(neighbor_type))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_all_types_covered() {
        let config = TraversalConfig::default();
        for &rt in RelationType::all() {
            let w = config.relationship_weight(rt);
            assert!(w > 0.0 && w <= 1.0, "{rt} weight out of range: {w}");
        }
        for &et in EntityType::all() {
            assert!(config.entity_priority(et) >= 1.0);
        }
    }

    #[test]
    fn test_stronger_relation_is_cheaper() {
        let config = TraversalConfig::default();
        let concerns = config.edge_cost(RelationType::Concerns, None, EntityType::Theme);
        let related = config.edge_cost(RelationType::RelatedTo, None, EntityType::Theme);
        assert!(concerns < related);
    }

    #[test]
    fn test_weight_override_replaces_static_weight() {
        let config = TraversalConfig::default();
        let base = config.edge_cost(RelationType::RelatedTo, None, EntityType::Unknown);
        let boosted = config.edge_cost(RelationType::RelatedTo, Some(1.0), EntityType::Unknown);
        assert!(boosted < base);
        // Zero or negative overrides fall back to the static weight
        let ignored = config.edge_cost(RelationType::RelatedTo, Some(0.0), EntityType::Unknown);
        assert_eq!(ignored, base);
    }

    #[test]
    fn test_priority_breaks_relation_ties() {
        let config = TraversalConfig::default();
        let to_theme = config.edge_cost(RelationType::Concerns, None, EntityType::Theme);
        let to_place = config.edge_cost(RelationType::Concerns, None, EntityType::Place);
        assert!(to_theme < to_place);
    }
}
