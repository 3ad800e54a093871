//! Message keys for comparison outcomes.
//!
//! Keys follow two fixed shapes so that a message catalog can register every
//! combination up front:
//!
//! - peer comparisons: `{domain}.memories.{count}.{quality}` (9 per domain)
//! - sphere comparisons: `{domain}.insight.{dominance}` (3 per domain)
//!
//! The domain is not validated here. An unknown domain still yields a key and
//! it is up to the catalog to reject it.

use memory_insights_schemas::{
    CountOutcome, Dominance, InsightKey, PeerComparisonResult, QualityOutcome,
    SphereComparisonResult,
};

/// Bumped whenever the key layout changes
pub const KEY_SCHEME_VERSION: u32 = 1;

pub fn resolve_peer_key(domain: &str, result: &PeerComparisonResult) -> InsightKey {
    peer_key(domain, result.count_outcome, result.quality_outcome)
}

pub fn resolve_sphere_key(domain: &str, result: &SphereComparisonResult) -> InsightKey {
    sphere_key(domain, result.dominance)
}

fn peer_key(domain: &str, count: CountOutcome, quality: QualityOutcome) -> InsightKey {
    InsightKey(format!(
        "{}.memories.{}.{}",
        domain,
        count.as_str(),
        quality.as_str()
    ))
}

fn sphere_key(domain: &str, dominance: Dominance) -> InsightKey {
    InsightKey(format!("{}.insight.{}", domain, dominance.as_str()))
}

/// Every peer key a domain can produce
pub fn peer_key_catalog(domain: &str) -> Vec<InsightKey> {
    CountOutcome::ALL
        .iter()
        .flat_map(|count| {
            QualityOutcome::ALL
                .iter()
                .map(move |quality| peer_key(domain, *count, *quality))
        })
        .collect()
}

/// Every sphere key a domain can produce
pub fn sphere_key_catalog(domain: &str) -> Vec<InsightKey> {
    Dominance::ALL
        .iter()
        .map(|dominance| sphere_key(domain, *dominance))
        .collect()
}
