use anyhow::Result;
use chrono::Utc;
use memory_insights_analytics::{
    peer_samples, rank_spheres, resolve_peer_key, resolve_sphere_key, sum_aggregates,
    AggregateCache, AnalyticsConfig, PeerComparator, SphereComparator,
};
use memory_insights_schemas::{
    Entity, EntityId, EntityInsight, MemoryRecord, QualityAggregate, Sphere,
    SphereComparisonResult, SphereInsight,
};
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::{debug, info};

use crate::source::MemorySource;

/// Builds entity and sphere insights from a journal source
pub struct InsightComposer {
    source: Arc<dyn MemorySource>,
    peers: PeerComparator,
    spheres: SphereComparator,
    cache: Mutex<AggregateCache>,
}

impl InsightComposer {
    pub fn new(source: Arc<dyn MemorySource>, config: AnalyticsConfig) -> Self {
        Self {
            source,
            peers: PeerComparator::new(config),
            spheres: SphereComparator::new(config),
            cache: Mutex::new(AggregateCache::new()),
        }
    }

    /// Compare one entity against the other entities of its sphere.
    ///
    /// `domain` defaults to the sphere's noun (e.g. `job` for career).
    pub async fn entity_insight(
        &self,
        entity_id: &EntityId,
        domain: Option<&str>,
    ) -> Result<EntityInsight> {
        let entity = self.source.entity(entity_id).await?;
        let domain = domain.unwrap_or(entity.sphere.domain_noun()).to_string();

        let records = self.source.memories(&entity.id).await?;
        let aggregate = self.aggregate_for(&entity.id, &records).await;

        let mut candidates: Vec<(Entity, Vec<MemoryRecord>)> = Vec::new();
        for other in self.source.entities(entity.sphere).await? {
            if other.id == entity.id {
                continue;
            }
            let memories = self.source.memories(&other.id).await?;
            candidates.push((other, memories));
        }

        let peers = peer_samples(
            &entity.id,
            entity.sphere,
            candidates.iter().map(|(e, m)| (e, m.as_slice())),
        );
        let comparison = self.peers.compare(&aggregate, records.len(), &peers);
        let key = comparison.as_ref().map(|c| resolve_peer_key(&domain, c));

        match &key {
            Some(key) => info!("Entity {} insight: {}", entity.id, key),
            None => info!(
                "Entity {} has no comparable peers in {}",
                entity.id, entity.sphere
            ),
        }

        Ok(EntityInsight {
            entity_id: entity.id,
            sphere: entity.sphere,
            domain,
            memory_count: records.len(),
            aggregate,
            peer_count: peers.len(),
            comparison,
            key,
            generated_at: Utc::now().to_rfc3339(),
        })
    }

    /// Compare how many moments two spheres hold.
    ///
    /// `domain` defaults to `{a}_vs_{b}`.
    pub async fn sphere_insight(
        &self,
        a: Sphere,
        b: Sphere,
        domain: Option<&str>,
    ) -> Result<SphereInsight> {
        let total_a = self.sphere_total(a).await?;
        let total_b = self.sphere_total(b).await?;
        let domain = domain
            .map(str::to_string)
            .unwrap_or_else(|| format!("{}_vs_{}", a, b));

        let comparison = self.spheres.compare(&total_a, &total_b);
        Ok(self.build_sphere_insight(a, b, (total_a, total_b), comparison, domain))
    }

    /// Compare the two spheres with the most moments across the journal.
    ///
    /// The comparison is `None` unless at least two spheres hold moments; the
    /// reported pair is then simply the top of the ranking.
    pub async fn dominant_sphere_insight(&self, domain: Option<&str>) -> Result<SphereInsight> {
        let mut totals = Vec::with_capacity(Sphere::ALL.len());
        for sphere in Sphere::ALL {
            totals.push((sphere, self.sphere_total(sphere).await?));
        }
        let domain = domain.unwrap_or("overall").to_string();

        let insight = match self.spheres.dominant(&totals) {
            Some((a, b, result)) => self.build_sphere_insight(
                a,
                b,
                (result.sphere_a, result.sphere_b),
                Some(result),
                domain,
            ),
            None => {
                let ranked = rank_spheres(&totals);
                let (a, total_a) = ranked[0];
                let (b, total_b) = ranked[1];
                self.build_sphere_insight(a, b, (total_a, total_b), None, domain)
            }
        };
        Ok(insight)
    }

    fn build_sphere_insight(
        &self,
        a: Sphere,
        b: Sphere,
        totals: (QualityAggregate, QualityAggregate),
        comparison: Option<SphereComparisonResult>,
        domain: String,
    ) -> SphereInsight {
        let (total_a, total_b) = totals;
        let key = comparison.as_ref().map(|c| resolve_sphere_key(&domain, c));

        info!(
            "Sphere insight {} ({}) vs {} ({}): {}",
            a,
            total_a.total_moments,
            b,
            total_b.total_moments,
            key.as_ref().map(|k| k.as_str()).unwrap_or("no data")
        );

        SphereInsight {
            sphere_a: a,
            sphere_b: b,
            domain,
            totals: (total_a, total_b),
            comparison,
            key,
            generated_at: Utc::now().to_rfc3339(),
        }
    }

    /// Sum of every entity's aggregate in `sphere`
    pub async fn sphere_total(&self, sphere: Sphere) -> Result<QualityAggregate> {
        let mut aggregates = Vec::new();
        for entity in self.source.entities(sphere).await? {
            let records = self.source.memories(&entity.id).await?;
            aggregates.push(self.aggregate_for(&entity.id, &records).await);
        }

        let total = sum_aggregates(&aggregates);
        debug!(
            "Sphere {} totals {} moments over {} entities",
            sphere,
            total.total_moments,
            aggregates.len()
        );
        Ok(total)
    }

    async fn aggregate_for(&self, entity_id: &EntityId, records: &[MemoryRecord]) -> QualityAggregate {
        match self.source.version() {
            Some(version) => self
                .cache
                .lock()
                .await
                .get_or_compute(entity_id, version, records),
            None => memory_insights_analytics::aggregate(records),
        }
    }

    /// (hits, misses) of the aggregate cache
    pub async fn cache_stats(&self) -> (u64, u64) {
        self.cache.lock().await.stats()
    }

    /// Drop all cached aggregates
    pub async fn clear_cache(&self) {
        self.cache.lock().await.clear();
    }
}
