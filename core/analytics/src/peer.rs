use memory_insights_schemas::{
    CountOutcome, Entity, EntityId, MemoryRecord, PeerComparisonResult, QualityAggregate,
    QualityOutcome, Sphere,
};
use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::aggregator::aggregate;
use crate::config::{AnalyticsConfig, BOUNDARY_TOLERANCE};

/// One peer's contribution to a comparison
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PeerSample {
    pub aggregate: QualityAggregate,
    pub memory_count: usize,
}

impl PeerSample {
    pub fn new(aggregate: QualityAggregate, memory_count: usize) -> Self {
        Self {
            aggregate,
            memory_count,
        }
    }

    pub fn from_records(records: &[MemoryRecord]) -> Self {
        Self::new(aggregate(records), records.len())
    }
}

/// Build the eligible peer group for `subject`: entities of the same sphere,
/// other than the subject, with at least one memory.
pub fn peer_samples<'a, I>(subject: &EntityId, sphere: Sphere, candidates: I) -> Vec<PeerSample>
where
    I: IntoIterator<Item = (&'a Entity, &'a [MemoryRecord])>,
{
    candidates
        .into_iter()
        .filter(|(entity, records)| {
            entity.sphere == sphere && &entity.id != subject && !records.is_empty()
        })
        .map(|(_, records)| PeerSample::from_records(records))
        .collect()
}

/// Dual-axis comparison of one entity against its peers
#[derive(Debug, Clone, Copy, Default)]
pub struct PeerComparator {
    config: AnalyticsConfig,
}

impl PeerComparator {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Classify `subject` by memory count and by sunny percentage relative to
    /// the peer averages. Returns `None` when no peer has any memories.
    ///
    /// Both thresholds are inclusive: a difference exactly on the threshold
    /// classifies as `Same`.
    pub fn compare(
        &self,
        subject: &QualityAggregate,
        subject_memory_count: usize,
        peers: &[PeerSample],
    ) -> Option<PeerComparisonResult> {
        let eligible: Vec<&PeerSample> = peers.iter().filter(|p| p.memory_count > 0).collect();
        if eligible.is_empty() {
            return None;
        }

        let n = eligible.len() as f64;
        let avg_peer_count = eligible.iter().map(|p| p.memory_count as f64).sum::<f64>() / n;
        let avg_peer_quality = eligible
            .iter()
            .map(|p| p.aggregate.sunny_percentage)
            .sum::<f64>()
            / n;

        debug_assert!(subject.sunny_percentage.is_finite());

        let count_diff = subject_memory_count as f64 - avg_peer_count;
        let count_threshold = avg_peer_count * self.config.count_threshold_ratio;
        let count_outcome = if count_diff.abs() <= count_threshold + BOUNDARY_TOLERANCE {
            CountOutcome::Same
        } else if count_diff > count_threshold {
            CountOutcome::More
        } else {
            CountOutcome::Less
        };

        let quality_diff = subject.sunny_percentage - avg_peer_quality;
        let quality_threshold = self.config.quality_threshold_points;
        let quality_outcome = if quality_diff.abs() <= quality_threshold + BOUNDARY_TOLERANCE {
            QualityOutcome::Same
        } else if quality_diff > quality_threshold {
            QualityOutcome::Better
        } else {
            QualityOutcome::Worse
        };

        trace!(
            peers = eligible.len(),
            avg_peer_count,
            avg_peer_quality,
            count_diff,
            quality_diff,
            "peer comparison"
        );

        Some(PeerComparisonResult {
            count_outcome,
            quality_outcome,
        })
    }
}

/// [`PeerComparator::compare`] with the default thresholds
pub fn compare_to_peers(
    subject: &QualityAggregate,
    subject_memory_count: usize,
    peers: &[PeerSample],
) -> Option<PeerComparisonResult> {
    PeerComparator::default().compare(subject, subject_memory_count, peers)
}
