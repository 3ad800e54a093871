use axum::{
    body::Body,
    extract::{Path, Query, State},
    http::{Request, StatusCode},
    routing::get,
    Json, Router,
};
use memory_insights_analytics::AnalyticsConfig;
use memory_insights_composer::{router, AppState, HttpSource, InsightComposer, SnapshotSource};
use memory_insights_schemas::{
    Entity, EntityId, EntityInsight, JournalSnapshot, KeyCatalog, MemoryId, MemoryRecord, Sphere,
    SphereInsight,
};
use serde::Deserialize;
use std::collections::HashMap;
use std::sync::Arc;
use tempfile::TempDir;
use tower::ServiceExt;

fn entity(id: &str, sphere: Sphere) -> Entity {
    Entity {
        id: EntityId(id.to_string()),
        sphere,
        name: None,
    }
}

fn records(prefix: &str, tags: &[(u32, u32)]) -> Vec<MemoryRecord> {
    tags.iter()
        .enumerate()
        .map(|(i, (good, hard))| {
            MemoryRecord::new(MemoryId(format!("{}_{}", prefix, i)), *hard, *good, 0)
        })
        .collect()
}

/// A journal with three jobs and two family members
fn journal() -> JournalSnapshot {
    let mut memories = HashMap::new();
    // Current job: 2 memories, mostly hard truths
    memories.insert(EntityId("job_now".into()), records("now", &[(1, 4), (0, 5)]));
    // Previous jobs: 4 memories each, 50% sunny
    memories.insert(
        EntityId("job_prev".into()),
        records("prev", &[(1, 1), (1, 1), (1, 1), (1, 1)]),
    );
    memories.insert(
        EntityId("job_first".into()),
        records("first", &[(2, 2), (1, 1), (0, 0), (1, 1)]),
    );
    memories.insert(EntityId("mum".into()), records("mum", &[(3, 0)]));

    JournalSnapshot {
        version: 1,
        entities: vec![
            entity("job_now", Sphere::Career),
            entity("job_prev", Sphere::Career),
            entity("job_first", Sphere::Career),
            entity("mum", Sphere::Family),
            entity("dad", Sphere::Family),
        ],
        memories,
    }
}

fn app_for(snapshot: JournalSnapshot) -> Router {
    let composer = InsightComposer::new(
        Arc::new(SnapshotSource::new(snapshot)),
        AnalyticsConfig::default(),
    );
    router(AppState {
        composer: Arc::new(composer),
    })
}

async fn get_json<T: serde::de::DeserializeOwned>(app: Router, uri: &str) -> (StatusCode, Option<T>) {
    let response = app
        .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
        .await
        .unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    (status, serde_json::from_slice(&bytes).ok())
}

/// Test the peer insight for a job that holds fewer, cloudier memories than the others
#[tokio::test]
async fn test_entity_insight_endpoint() {
    let (status, insight) =
        get_json::<EntityInsight>(app_for(journal()), "/v1/entities/job_now/insight").await;

    assert_eq!(status, StatusCode::OK);
    let insight = insight.unwrap();
    assert_eq!(insight.domain, "job");
    assert_eq!(insight.memory_count, 2);
    assert_eq!(insight.aggregate.sunny_percentage, 10.0);
    assert_eq!(insight.peer_count, 2);
    assert_eq!(insight.key.unwrap().as_str(), "job.memories.less.worse");
}

/// Test that a domain override only changes the key namespace
#[tokio::test]
async fn test_entity_insight_domain_override() {
    let (status, insight) = get_json::<EntityInsight>(
        app_for(journal()),
        "/v1/entities/job_prev/insight?domain=ex_job",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(
        insight.unwrap().key.unwrap().as_str(),
        "ex_job.memories.more.better"
    );
}

/// Test that "no peers" comes back as a null comparison rather than an error
#[tokio::test]
async fn test_entity_without_comparable_peers() {
    let (status, insight) =
        get_json::<EntityInsight>(app_for(journal()), "/v1/entities/mum/insight").await;

    assert_eq!(status, StatusCode::OK);
    let insight = insight.unwrap();
    assert_eq!(insight.peer_count, 0);
    assert!(insight.comparison.is_none());
    assert!(insight.key.is_none());
}

#[tokio::test]
async fn test_unknown_entity_returns_404() {
    let (status, _) =
        get_json::<EntityInsight>(app_for(journal()), "/v1/entities/nobody/insight").await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_sphere_insight_endpoint() {
    let (status, insight) = get_json::<SphereInsight>(
        app_for(journal()),
        "/v1/spheres/career/family/insight?domain=career",
    )
    .await;

    assert_eq!(status, StatusCode::OK);
    let insight = insight.unwrap();
    assert_eq!(insight.totals.0.total_moments, 26);
    assert_eq!(insight.totals.1.total_moments, 3);
    assert_eq!(insight.key.unwrap().as_str(), "career.insight.sphereA");
}

#[tokio::test]
async fn test_invalid_sphere_is_rejected() {
    let (status, _) =
        get_json::<SphereInsight>(app_for(journal()), "/v1/spheres/career/pets/insight").await;
    assert!(status.is_client_error());
}

#[tokio::test]
async fn test_dominant_sphere_endpoint() {
    let (status, insight) =
        get_json::<SphereInsight>(app_for(journal()), "/v1/spheres/dominant").await;

    assert_eq!(status, StatusCode::OK);
    let insight = insight.unwrap();
    assert_eq!(insight.sphere_a, Sphere::Career);
    assert_eq!(insight.sphere_b, Sphere::Family);
    assert_eq!(insight.key.unwrap().as_str(), "overall.insight.sphereA");
}

#[tokio::test]
async fn test_key_catalog_endpoint() {
    let (status, catalog) = get_json::<KeyCatalog>(app_for(journal()), "/v1/keys/friend").await;

    assert_eq!(status, StatusCode::OK);
    let catalog = catalog.unwrap();
    assert_eq!(catalog.domain, "friend");
    assert_eq!(catalog.peer_keys.len(), 9);
    assert_eq!(catalog.sphere_keys.len(), 3);
}

/// Test loading a snapshot exported to disk
#[tokio::test]
async fn test_snapshot_from_file() {
    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("journal.json");
    std::fs::write(&path, serde_json::to_string(&journal()).unwrap()).unwrap();

    let source = SnapshotSource::from_path(&path).unwrap();
    let composer = InsightComposer::new(Arc::new(source), AnalyticsConfig::default());
    let insight = composer
        .entity_insight(&EntityId("job_now".into()), None)
        .await
        .unwrap();
    assert_eq!(insight.key.unwrap().as_str(), "job.memories.less.worse");

    let broken = temp_dir.path().join("broken.json");
    std::fs::write(&broken, "{ not json").unwrap();
    assert!(SnapshotSource::from_path(&broken).is_err());
}

// ============================================================================
// HTTP source against a stand-in journal store
// ============================================================================

#[derive(Deserialize)]
struct SphereQuery {
    sphere: Sphere,
}

async fn spawn_store(snapshot: JournalSnapshot) -> String {
    let store = Arc::new(snapshot);

    let app = Router::new()
        .route(
            "/entities",
            get(
                |State(store): State<Arc<JournalSnapshot>>, Query(q): Query<SphereQuery>| async move {
                    let entities: Vec<Entity> = store
                        .entities
                        .iter()
                        .filter(|e| e.sphere == q.sphere)
                        .cloned()
                        .collect();
                    Json(entities)
                },
            ),
        )
        .route(
            "/entities/:id",
            get(
                |State(store): State<Arc<JournalSnapshot>>, Path(id): Path<String>| async move {
                    store
                        .entities
                        .iter()
                        .find(|e| e.id.0 == id)
                        .cloned()
                        .map(Json)
                        .ok_or(StatusCode::NOT_FOUND)
                },
            ),
        )
        .route(
            "/entities/:id/memories",
            get(
                |State(store): State<Arc<JournalSnapshot>>, Path(id): Path<String>| async move {
                    let id = EntityId(id);
                    if store.entities.iter().any(|e| e.id == id) {
                        Ok(Json(store.memories_for(&id).to_vec()))
                    } else {
                        Err(StatusCode::NOT_FOUND)
                    }
                },
            ),
        )
        .with_state(store);

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    format!("http://{}", addr)
}

/// Test that the HTTP source yields the same insights as the snapshot it serves
#[tokio::test]
async fn test_http_source_matches_snapshot() {
    let base_url = spawn_store(journal()).await;
    let composer = InsightComposer::new(
        Arc::new(HttpSource::new(base_url)),
        AnalyticsConfig::default(),
    );

    let insight = composer
        .entity_insight(&EntityId("job_now".into()), None)
        .await
        .unwrap();
    assert_eq!(insight.peer_count, 2);
    assert_eq!(insight.key.unwrap().as_str(), "job.memories.less.worse");

    let spheres = composer
        .sphere_insight(Sphere::Family, Sphere::Career, Some("family"))
        .await
        .unwrap();
    assert_eq!(spheres.key.unwrap().as_str(), "family.insight.sphereB");

    // Unversioned sources are never cached
    assert_eq!(composer.cache_stats().await, (0, 0));

    let missing = composer
        .entity_insight(&EntityId("nobody".into()), None)
        .await;
    assert!(missing.is_err());
}
