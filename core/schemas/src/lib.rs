use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

// ============================================================================
// ID Types
// ============================================================================

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntityId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct MemoryId(pub String);

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for MemoryId {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ============================================================================
// Spheres
// ============================================================================

/// Life domain an entity belongs to. Assigned by the caller, never inferred.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Sphere {
    #[serde(rename = "relationships")]
    Relationships,
    #[serde(rename = "career")]
    Career,
    #[serde(rename = "family")]
    Family,
    #[serde(rename = "friends")]
    Friends,
    #[serde(rename = "hobbies")]
    Hobbies,
}

impl Sphere {
    pub const ALL: [Sphere; 5] = [
        Sphere::Relationships,
        Sphere::Career,
        Sphere::Family,
        Sphere::Friends,
        Sphere::Hobbies,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Sphere::Relationships => "relationships",
            Sphere::Career => "career",
            Sphere::Family => "family",
            Sphere::Friends => "friends",
            Sphere::Hobbies => "hobbies",
        }
    }

    /// Default noun used to namespace insight keys for entities of this sphere
    pub fn domain_noun(&self) -> &'static str {
        match self {
            Sphere::Relationships => "relationship",
            Sphere::Career => "job",
            Sphere::Family => "family_member",
            Sphere::Friends => "friend",
            Sphere::Hobbies => "hobby",
        }
    }
}

impl fmt::Display for Sphere {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// Memory and Entity Schema
// ============================================================================

/// A single journaled memory with its tagged sub-item counts.
///
/// Missing count fields deserialize as zero. Counts are unsigned, so a
/// negative value in the payload is rejected at deserialization time rather
/// than clamped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRecord {
    pub id: MemoryId,
    #[serde(default)]
    pub hard_truth_count: u32,
    #[serde(default)]
    pub good_fact_count: u32,
    #[serde(default)]
    pub lesson_count: u32, // informational only
}

impl MemoryRecord {
    pub fn new(id: MemoryId, hard_truth_count: u32, good_fact_count: u32, lesson_count: u32) -> Self {
        Self {
            id,
            hard_truth_count,
            good_fact_count,
            lesson_count,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub sphere: Sphere,
    #[serde(default)]
    pub name: Option<String>,
}

// ============================================================================
// Aggregates
// ============================================================================

/// Sunny/cloudy reduction of a record set. Lessons are not counted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct QualityAggregate {
    pub sunny_count: u64,
    pub cloudy_count: u64,
    pub total_moments: u64,
    pub sunny_percentage: f64,
}

impl QualityAggregate {
    pub const EMPTY: QualityAggregate = QualityAggregate {
        sunny_count: 0,
        cloudy_count: 0,
        total_moments: 0,
        sunny_percentage: 0.0,
    };

    /// Build an aggregate from raw counts. The percentage is 0 when there are
    /// no moments and always lies in `[0, 100]`.
    pub fn from_counts(sunny_count: u64, cloudy_count: u64) -> Self {
        let total_moments = sunny_count + cloudy_count;
        let sunny_percentage = if total_moments == 0 {
            0.0
        } else {
            // Multiply first so whole percentages stay exact
            (sunny_count as f64 * 100.0 / total_moments as f64).clamp(0.0, 100.0)
        };

        Self {
            sunny_count,
            cloudy_count,
            total_moments,
            sunny_percentage,
        }
    }

    /// Sum the counts of two aggregates. The percentage is recomputed.
    pub fn combine(&self, other: &QualityAggregate) -> Self {
        Self::from_counts(
            self.sunny_count + other.sunny_count,
            self.cloudy_count + other.cloudy_count,
        )
    }

    pub fn is_empty(&self) -> bool {
        self.total_moments == 0
    }
}

impl Default for QualityAggregate {
    fn default() -> Self {
        Self::EMPTY
    }
}

// ============================================================================
// Comparison Outcomes
// ============================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum CountOutcome {
    #[serde(rename = "more")]
    More,
    #[serde(rename = "less")]
    Less,
    #[serde(rename = "same")]
    Same,
}

impl CountOutcome {
    pub const ALL: [CountOutcome; 3] = [CountOutcome::More, CountOutcome::Less, CountOutcome::Same];

    pub fn as_str(&self) -> &'static str {
        match self {
            CountOutcome::More => "more",
            CountOutcome::Less => "less",
            CountOutcome::Same => "same",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum QualityOutcome {
    #[serde(rename = "better")]
    Better,
    #[serde(rename = "worse")]
    Worse,
    #[serde(rename = "same")]
    Same,
}

impl QualityOutcome {
    pub const ALL: [QualityOutcome; 3] = [
        QualityOutcome::Better,
        QualityOutcome::Worse,
        QualityOutcome::Same,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            QualityOutcome::Better => "better",
            QualityOutcome::Worse => "worse",
            QualityOutcome::Same => "same",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Dominance {
    #[serde(rename = "sphereA")]
    SphereA,
    #[serde(rename = "sphereB")]
    SphereB,
    #[serde(rename = "balanced")]
    Balanced,
}

impl Dominance {
    pub const ALL: [Dominance; 3] = [Dominance::SphereA, Dominance::SphereB, Dominance::Balanced];

    pub fn as_str(&self) -> &'static str {
        match self {
            Dominance::SphereA => "sphereA",
            Dominance::SphereB => "sphereB",
            Dominance::Balanced => "balanced",
        }
    }

    /// The outcome seen from the other side of the comparison
    pub fn mirror(&self) -> Self {
        match self {
            Dominance::SphereA => Dominance::SphereB,
            Dominance::SphereB => Dominance::SphereA,
            Dominance::Balanced => Dominance::Balanced,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PeerComparisonResult {
    pub count_outcome: CountOutcome,
    pub quality_outcome: QualityOutcome,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SphereComparisonResult {
    pub dominance: Dominance,
    pub sphere_a: QualityAggregate,
    pub sphere_b: QualityAggregate,
}

// ============================================================================
// Insight Keys
// ============================================================================

/// Dot-namespaced message key handed to the localization layer
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct InsightKey(pub String);

impl InsightKey {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for InsightKey {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl PartialEq<&str> for InsightKey {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

// ============================================================================
// Journal Snapshot
// ============================================================================

/// Point-in-time copy of the journal store handed to the insight service.
/// `version` is bumped by the producer whenever any record changes.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JournalSnapshot {
    #[serde(default)]
    pub version: u64,
    pub entities: Vec<Entity>,
    #[serde(default)]
    pub memories: HashMap<EntityId, Vec<MemoryRecord>>,
}

impl JournalSnapshot {
    pub fn memories_for(&self, entity_id: &EntityId) -> &[MemoryRecord] {
        self.memories
            .get(entity_id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }
}

// ============================================================================
// API Response Types
// ============================================================================

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EntityInsight {
    pub entity_id: EntityId,
    pub sphere: Sphere,
    pub domain: String,
    pub memory_count: usize,
    pub aggregate: QualityAggregate,
    pub peer_count: usize,
    pub comparison: Option<PeerComparisonResult>,
    pub key: Option<InsightKey>,
    pub generated_at: String, // RFC3339
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SphereInsight {
    pub sphere_a: Sphere,
    pub sphere_b: Sphere,
    pub domain: String,
    pub totals: (QualityAggregate, QualityAggregate),
    pub comparison: Option<SphereComparisonResult>,
    pub key: Option<InsightKey>,
    pub generated_at: String, // RFC3339
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KeyCatalog {
    pub domain: String,
    pub scheme_version: u32,
    pub peer_keys: Vec<InsightKey>,
    pub sphere_keys: Vec<InsightKey>,
}
