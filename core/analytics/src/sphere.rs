use memory_insights_schemas::{Dominance, QualityAggregate, Sphere, SphereComparisonResult};
use tracing::trace;

use crate::config::{AnalyticsConfig, BOUNDARY_TOLERANCE};

/// Volume-only comparison between two life spheres.
///
/// Quality (the sunny ratio) plays no part here; only total moments matter.
#[derive(Debug, Clone, Copy, Default)]
pub struct SphereComparator {
    config: AnalyticsConfig,
}

impl SphereComparator {
    pub fn new(config: AnalyticsConfig) -> Self {
        Self { config }
    }

    /// Returns `None` when neither sphere has any moments.
    pub fn compare(
        &self,
        a: &QualityAggregate,
        b: &QualityAggregate,
    ) -> Option<SphereComparisonResult> {
        if a.total_moments + b.total_moments == 0 {
            return None;
        }

        let diff = a.total_moments as f64 - b.total_moments as f64;
        let larger = a.total_moments.max(b.total_moments) as f64;
        let threshold = larger * self.config.sphere_threshold_ratio;

        let dominance = if larger == 0.0 || diff.abs() <= threshold + BOUNDARY_TOLERANCE {
            Dominance::Balanced
        } else if diff > threshold {
            Dominance::SphereA
        } else {
            Dominance::SphereB
        };

        trace!(diff, threshold, dominance = dominance.as_str(), "sphere comparison");

        Some(SphereComparisonResult {
            dominance,
            sphere_a: *a,
            sphere_b: *b,
        })
    }

    /// Compare the two spheres with the most moments. The returned sphere is
    /// the one in the `SphereA` position of the result.
    ///
    /// Spheres without moments are not candidates, so this is `None` unless
    /// at least two spheres hold data.
    pub fn dominant(
        &self,
        totals: &[(Sphere, QualityAggregate)],
    ) -> Option<(Sphere, Sphere, SphereComparisonResult)> {
        let populated: Vec<(Sphere, QualityAggregate)> = totals
            .iter()
            .filter(|(_, total)| !total.is_empty())
            .copied()
            .collect();
        let ranked = rank_spheres(&populated);
        match ranked.as_slice() {
            [(first, a), (second, b), ..] => self
                .compare(a, b)
                .map(|result| (*first, *second, result)),
            _ => None,
        }
    }
}

/// [`SphereComparator::compare`] with the default threshold
pub fn compare_spheres(
    a: &QualityAggregate,
    b: &QualityAggregate,
) -> Option<SphereComparisonResult> {
    SphereComparator::default().compare(a, b)
}

/// Order spheres by total moments, largest first. Ties keep declaration order.
pub fn rank_spheres(totals: &[(Sphere, QualityAggregate)]) -> Vec<(Sphere, QualityAggregate)> {
    let mut ranked = totals.to_vec();
    ranked.sort_by(|(sa, a), (sb, b)| {
        b.total_moments
            .cmp(&a.total_moments)
            .then_with(|| sa.cmp(sb))
    });
    ranked
}

/// [`SphereComparator::dominant`] with the default threshold
pub fn dominant_sphere(
    totals: &[(Sphere, QualityAggregate)],
) -> Option<(Sphere, Sphere, SphereComparisonResult)> {
    SphereComparator::default().dominant(totals)
}
