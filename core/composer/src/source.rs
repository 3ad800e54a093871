use async_trait::async_trait;
use memory_insights_schemas::{Entity, EntityId, JournalSnapshot, MemoryRecord, Sphere};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;
use tracing::{debug, info};

#[derive(Debug, Error)]
pub enum SourceError {
    #[error("entity not found: {0}")]
    EntityNotFound(EntityId),

    #[error("journal store request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("journal store returned HTTP {0}")]
    Status(reqwest::StatusCode),

    #[error("failed to read snapshot: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid snapshot: {0}")]
    Json(#[from] serde_json::Error),
}

/// Read-only access to the journal store.
///
/// Implementations hand out copies; nothing returned here is mutated by the
/// insight engine.
#[async_trait]
pub trait MemorySource: Send + Sync {
    /// All entities assigned to `sphere`
    async fn entities(&self, sphere: Sphere) -> Result<Vec<Entity>, SourceError>;

    async fn entity(&self, id: &EntityId) -> Result<Entity, SourceError>;

    async fn memories(&self, id: &EntityId) -> Result<Vec<MemoryRecord>, SourceError>;

    /// Version stamp of the data, when the source has one. Aggregates are
    /// only cached for versioned sources.
    fn version(&self) -> Option<u64> {
        None
    }
}

// ============================================================================
// Snapshot Source
// ============================================================================

/// In-memory source over a [`JournalSnapshot`]
pub struct SnapshotSource {
    snapshot: JournalSnapshot,
}

impl SnapshotSource {
    pub fn new(snapshot: JournalSnapshot) -> Self {
        Self { snapshot }
    }

    /// Load a snapshot exported as JSON
    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, SourceError> {
        let raw = std::fs::read_to_string(path.as_ref())?;
        let snapshot: JournalSnapshot = serde_json::from_str(&raw)?;
        info!(
            "Loaded snapshot v{} with {} entities from {}",
            snapshot.version,
            snapshot.entities.len(),
            path.as_ref().display()
        );
        Ok(Self::new(snapshot))
    }
}

#[async_trait]
impl MemorySource for SnapshotSource {
    async fn entities(&self, sphere: Sphere) -> Result<Vec<Entity>, SourceError> {
        Ok(self
            .snapshot
            .entities
            .iter()
            .filter(|e| e.sphere == sphere)
            .cloned()
            .collect())
    }

    async fn entity(&self, id: &EntityId) -> Result<Entity, SourceError> {
        self.snapshot
            .entities
            .iter()
            .find(|e| &e.id == id)
            .cloned()
            .ok_or_else(|| SourceError::EntityNotFound(id.clone()))
    }

    async fn memories(&self, id: &EntityId) -> Result<Vec<MemoryRecord>, SourceError> {
        if !self.snapshot.entities.iter().any(|e| &e.id == id) {
            return Err(SourceError::EntityNotFound(id.clone()));
        }
        Ok(self.snapshot.memories_for(id).to_vec())
    }

    fn version(&self) -> Option<u64> {
        Some(self.snapshot.version)
    }
}

// ============================================================================
// HTTP Source
// ============================================================================

/// Source backed by the journal store's HTTP API
pub struct HttpSource {
    client: reqwest::Client,
    base_url: String,
}

impl HttpSource {
    pub fn new(base_url: impl Into<String>) -> Self {
        let base_url = base_url.into().trim_end_matches('/').to_string();
        Self {
            client: reqwest::Client::new(),
            base_url,
        }
    }

    async fn get_json<T: serde::de::DeserializeOwned>(
        &self,
        url: &str,
        missing: Option<&EntityId>,
    ) -> Result<T, SourceError> {
        debug!("GET {}", url);

        let response = self
            .client
            .get(url)
            .timeout(Duration::from_secs(5))
            .send()
            .await?;

        let status = response.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            if let Some(id) = missing {
                return Err(SourceError::EntityNotFound(id.clone()));
            }
        }
        if !status.is_success() {
            return Err(SourceError::Status(status));
        }

        Ok(response.json().await?)
    }
}

#[async_trait]
impl MemorySource for HttpSource {
    async fn entities(&self, sphere: Sphere) -> Result<Vec<Entity>, SourceError> {
        let url = format!("{}/entities?sphere={}", self.base_url, sphere.as_str());
        self.get_json(&url, None).await
    }

    async fn entity(&self, id: &EntityId) -> Result<Entity, SourceError> {
        let url = format!("{}/entities/{}", self.base_url, id);
        self.get_json(&url, Some(id)).await
    }

    async fn memories(&self, id: &EntityId) -> Result<Vec<MemoryRecord>, SourceError> {
        let url = format!("{}/entities/{}/memories", self.base_url, id);
        self.get_json(&url, Some(id)).await
    }
}
