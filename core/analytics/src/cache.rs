use memory_insights_schemas::{EntityId, MemoryRecord, QualityAggregate};
use std::collections::HashMap;
use tracing::debug;

use crate::aggregator::aggregate;

#[derive(Debug, Clone, Copy)]
struct CachedAggregate {
    version: u64,
    aggregate: QualityAggregate,
}

/// Last-known aggregate per entity, stamped with the record-set version it
/// was computed from. A lookup with any other version recomputes.
#[derive(Debug, Default)]
pub struct AggregateCache {
    entries: HashMap<EntityId, CachedAggregate>,
    hits: u64,
    misses: u64,
}

impl AggregateCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the cached aggregate for `entity_id` if it was computed at
    /// `version`, otherwise aggregate `records` and remember the result.
    pub fn get_or_compute(
        &mut self,
        entity_id: &EntityId,
        version: u64,
        records: &[MemoryRecord],
    ) -> QualityAggregate {
        if let Some(entry) = self.entries.get(entity_id) {
            if entry.version == version {
                self.hits += 1;
                return entry.aggregate;
            }
        }

        self.misses += 1;
        let computed = aggregate(records);
        debug!(
            "Aggregated {} records for entity {} at version {}",
            records.len(),
            entity_id,
            version
        );

        self.entries.insert(
            entity_id.clone(),
            CachedAggregate {
                version,
                aggregate: computed,
            },
        );
        computed
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }

    /// (hits, misses) since creation
    pub fn stats(&self) -> (u64, u64) {
        (self.hits, self.misses)
    }
}
