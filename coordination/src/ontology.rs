//! Graph ontology: node labels, relationship types, and allowed triplets.
//!
//! This is the single source of truth for what the knowledge graph contains.
//! The text-to-Cypher prompt embeds [`schema_description`] verbatim.

use serde::{Deserialize, Serialize};

/// Node label in the knowledge graph.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityLabel {
    /// Companies, associations, institutions.
    Organization,
    /// Countries and regions.
    Geography,
    /// Value-chain segments such as foundry or EDA.
    IndustrySegment,
    /// Technologies and products.
    Technology,
    /// Laws and policies.
    Policy,
    /// Financial or industry metrics.
    Metric,
}

impl EntityLabel {
    pub const ALL: [EntityLabel; 6] = [
        Self::Organization,
        Self::Geography,
        Self::IndustrySegment,
        Self::Technology,
        Self::Policy,
        Self::Metric,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Organization => "Organization",
            Self::Geography => "Geography",
            Self::IndustrySegment => "IndustrySegment",
            Self::Technology => "Technology",
            Self::Policy => "Policy",
            Self::Metric => "Metric",
        }
    }
}

impl std::fmt::Display for EntityLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Relationship type between two nodes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RelationType {
    HeadquarteredIn,
    OperatesIn,
    Supplies,
    Develops,
    Implements,
    Impacts,
    CompetesWith,
    /// Generic hierarchy.
    PartOf,
}

impl RelationType {
    pub const ALL: [RelationType; 8] = [
        Self::HeadquarteredIn,
        Self::OperatesIn,
        Self::Supplies,
        Self::Develops,
        Self::Implements,
        Self::Impacts,
        Self::CompetesWith,
        Self::PartOf,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::HeadquarteredIn => "HEADQUARTERED_IN",
            Self::OperatesIn => "OPERATES_IN",
            Self::Supplies => "SUPPLIES",
            Self::Develops => "DEVELOPS",
            Self::Implements => "IMPLEMENTS",
            Self::Impacts => "IMPACTS",
            Self::CompetesWith => "COMPETES_WITH",
            Self::PartOf => "PART_OF",
        }
    }
}

impl std::fmt::Display for RelationType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// `(source)-[relation]->(target)` combinations the graph is built from.
pub const ALLOWED_RELATIONS: [(EntityLabel, RelationType, EntityLabel); 8] = [
    (EntityLabel::Organization, RelationType::HeadquarteredIn, EntityLabel::Geography),
    (EntityLabel::Organization, RelationType::OperatesIn, EntityLabel::IndustrySegment),
    (EntityLabel::Organization, RelationType::Supplies, EntityLabel::Organization),
    (EntityLabel::Organization, RelationType::Develops, EntityLabel::Technology),
    (EntityLabel::Geography, RelationType::Implements, EntityLabel::Policy),
    (EntityLabel::Policy, RelationType::Impacts, EntityLabel::Organization),
    (EntityLabel::Policy, RelationType::Impacts, EntityLabel::Technology),
    (EntityLabel::Organization, RelationType::CompetesWith, EntityLabel::Organization),
];

pub fn is_allowed(source: EntityLabel, relation: RelationType, target: EntityLabel) -> bool {
    ALLOWED_RELATIONS.contains(&(source, relation, target))
}

/// Human-readable schema summary for prompts.
pub fn schema_description() -> String {
    let labels: Vec<&str> = EntityLabel::ALL.iter().map(|l| l.as_str()).collect();
    let relations: Vec<&str> = RelationType::ALL.iter().map(|r| r.as_str()).collect();
    let mut out = String::new();
    out.push_str("Node labels: ");
    out.push_str(&labels.join(", "));
    out.push_str("\nEvery node has a `name` property. Some nodes carry a `value` property.\n");
    out.push_str("Relationship types: ");
    out.push_str(&relations.join(", "));
    out.push_str("\nAllowed patterns:\n");
    for (source, relation, target) in ALLOWED_RELATIONS {
        out.push_str(&format!("- ({source})-[:{relation}]->({target})\n"));
    }
    out
}
