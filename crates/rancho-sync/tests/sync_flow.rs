//! End-to-end tests of the pull and push flows against an in-process HTTP
//! server standing in for the remote `catering.php` endpoint.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode};
use axum::routing::get;
use axum::{Json, Router};
use serde_json::{json, Value};

use rancho_store::{Database, StoreError};
use rancho_sync::{PullOutcome, ReferenceLoader, Session, SyncEngine, SyncError, SyncOutcome};

const TOKEN: &str = "test-token";
const OPERATOR_ID: i64 = 7;

/// Shared state of the stand-in server.
#[derive(Clone)]
struct Remote {
    /// Catalog body served to GET requests.
    catalog: Arc<Mutex<Value>>,
    /// `last_check` value of every GET received.
    pulls: Arc<Mutex<Vec<String>>>,
    /// Body of every POST received.
    uploads: Arc<Mutex<Vec<Value>>>,
    /// When set, POST answers 500.
    fail_posts: Arc<AtomicBool>,
    /// Artificial delay before answering GET, for the single-flight test.
    get_delay: Arc<Mutex<Duration>>,
}

impl Remote {
    fn new(catalog: Value) -> Self {
        Self {
            catalog: Arc::new(Mutex::new(catalog)),
            pulls: Arc::new(Mutex::new(Vec::new())),
            uploads: Arc::new(Mutex::new(Vec::new())),
            fail_posts: Arc::new(AtomicBool::new(false)),
            get_delay: Arc::new(Mutex::new(Duration::ZERO)),
        }
    }

    async fn serve(&self) -> String {
        let app = Router::new()
            .route("/catering.php", get(handle_pull).post(handle_push))
            .with_state(self.clone());

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        format!("http://{addr}")
    }
}

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get("x-authorization")
        .and_then(|v| v.to_str().ok())
        .map(|v| v == TOKEN)
        .unwrap_or(false)
}

async fn handle_pull(
    State(remote): State<Remote>,
    headers: HeaderMap,
    Query(params): Query<HashMap<String, String>>,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }

    let delay = *remote.get_delay.lock().unwrap();
    if !delay.is_zero() {
        tokio::time::sleep(delay).await;
    }

    remote
        .pulls
        .lock()
        .unwrap()
        .push(params.get("last_check").cloned().unwrap_or_default());

    Ok(Json(remote.catalog.lock().unwrap().clone()))
}

async fn handle_push(
    State(remote): State<Remote>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Result<Json<Value>, StatusCode> {
    if !authorized(&headers) {
        return Err(StatusCode::UNAUTHORIZED);
    }
    if remote.fail_posts.load(Ordering::SeqCst) {
        return Err(StatusCode::INTERNAL_SERVER_ERROR);
    }

    remote.uploads.lock().unwrap().push(body);
    Ok(Json(json!({ "resultado": "ok" })))
}

/// Catalog with one person, one enabled credential and the four services.
fn base_catalog() -> Value {
    json!({
        "datos": {
            "personas": [
                { "id": 1, "cuil": "20-11111111-1", "apellido": "Perez", "nombre": "Juan" }
            ],
            "credenciales": [
                { "id": 10, "personas_id": 1, "idempresa": 1, "idproyecto_vinculo": 1,
                  "carnet": "CARD-001", "estado": "HABILITADO" }
            ],
            "servicios": [
                { "id": 1, "cod": "DES", "nombre": "Desayuno", "hinicio": "06:00:00", "hfin": "09:00:00" },
                { "id": 2, "cod": "ALM", "nombre": "Almuerzo", "hinicio": "12:00:00", "hfin": "14:30:00" },
                { "id": 3, "cod": "MER", "nombre": "Merienda", "hinicio": "16:00:00", "hfin": "17:30:00" },
                { "id": 4, "cod": "CEN", "nombre": "Cena",     "hinicio": "20:00:00", "hfin": "22:30:00" }
            ]
        }
    })
}

fn open_db() -> (Database, tempfile::TempDir) {
    let dir = tempfile::tempdir().unwrap();
    let db = Database::open_at(&dir.path().join("test.db")).unwrap();
    (db, dir)
}

fn session() -> Session {
    Session::new(TOKEN, OPERATOR_ID)
}

#[tokio::test]
async fn scenario_a_pull_scan_roster() {
    let remote = Remote::new(base_catalog());
    let base_url = remote.serve().await;
    let (mut db, _dir) = open_db();

    let loader = ReferenceLoader::new(&base_url).unwrap();
    let outcome = loader.pull(Some(&session()), &mut db).await.unwrap();
    assert_eq!(outcome, PullOutcome::Applied { rows: 6 });

    // First pull requests the full history.
    let pulls = remote.pulls.lock().unwrap().clone();
    assert_eq!(pulls, vec!["1970-01-01".to_string()]);

    let person = db
        .check_in_by_card("CARD-001", 1)
        .unwrap()
        .expect("credential known after the pull");
    assert_eq!(person.apellido, "Perez");

    let roster = db.todays_checkins(1).unwrap();
    assert_eq!(roster.len(), 1);
    assert_eq!(roster[0].credencial_id, 10);

    let pending = db.pending_checkins().unwrap();
    assert_eq!(pending.len(), 1);
    assert!(!pending[0].sincronizado);
}

#[tokio::test]
async fn scenario_b_double_scan_keeps_one_entry() {
    let remote = Remote::new(base_catalog());
    let base_url = remote.serve().await;
    let (mut db, _dir) = open_db();

    let loader = ReferenceLoader::new(&base_url).unwrap();
    loader.pull(Some(&session()), &mut db).await.unwrap();

    db.check_in_by_card("CARD-001", 1).unwrap().unwrap();
    db.check_in_by_card("CARD-001", 1).unwrap().unwrap();

    assert_eq!(db.todays_checkins(1).unwrap().len(), 1);
}

#[tokio::test]
async fn scenario_c_sync_flips_all_pending() {
    let remote = Remote::new(base_catalog());
    let base_url = remote.serve().await;
    let (mut db, _dir) = open_db();

    let loader = ReferenceLoader::new(&base_url).unwrap();
    loader.pull(Some(&session()), &mut db).await.unwrap();

    let date = "2024-06-01".parse().unwrap();
    for service_id in [1, 2, 3] {
        db.record_manual_checkin_on(10, service_id, date, "08:15:00".parse().unwrap())
            .unwrap();
    }

    let engine = SyncEngine::new(&base_url).unwrap();
    let outcome = engine.sync_pending(&session(), &mut db).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Synced(3));

    assert!(db.pending_checkins().unwrap().is_empty());
    // Records are confirmed, not deleted.
    assert_eq!(db.all_checkins().unwrap().len(), 3);

    // One POST carrying the full batch, string-encoded per the contract.
    // Scoped so the lock is released before the server handles the next sync.
    {
        let uploads = remote.uploads.lock().unwrap();
        assert_eq!(uploads.len(), 1);
        let batch = uploads[0].as_array().unwrap();
        assert_eq!(batch.len(), 3);
        for row in batch {
            assert_eq!(row["identif"], "10");
            assert_eq!(row["idoperador"], OPERATOR_ID.to_string());
            assert_eq!(row["idempresa"], "");
            assert!(!row["id"].as_str().unwrap().is_empty());
        }
    }

    // A second sync has nothing left to do and stays offline.
    let outcome = engine.sync_pending(&session(), &mut db).await.unwrap();
    assert_eq!(outcome, SyncOutcome::NothingToSync);
    assert_eq!(remote.uploads.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn scenario_d_failed_sync_preserves_pending() {
    let remote = Remote::new(base_catalog());
    let base_url = remote.serve().await;
    let (mut db, _dir) = open_db();

    let loader = ReferenceLoader::new(&base_url).unwrap();
    loader.pull(Some(&session()), &mut db).await.unwrap();

    db.record_manual_checkin_on(10, 1, "2024-06-01".parse().unwrap(), "08:15:00".parse().unwrap())
        .unwrap();

    remote.fail_posts.store(true, Ordering::SeqCst);
    let engine = SyncEngine::new(&base_url).unwrap();

    let err = engine.sync_pending(&session(), &mut db).await.unwrap_err();
    assert!(matches!(err, SyncError::Status(500)));

    // No partial flips: the record is still pending and retried verbatim.
    let pending = db.pending_checkins().unwrap();
    assert_eq!(pending.len(), 1);
    let pending_id = pending[0].id.clone();

    remote.fail_posts.store(false, Ordering::SeqCst);
    let outcome = engine.sync_pending(&session(), &mut db).await.unwrap();
    assert_eq!(outcome, SyncOutcome::Synced(1));
    assert!(db.pending_checkins().unwrap().is_empty());

    let uploads = remote.uploads.lock().unwrap();
    assert_eq!(uploads[0][0]["id"], pending_id.as_str());
}

#[tokio::test]
async fn pull_without_session_stays_offline() {
    let remote = Remote::new(base_catalog());
    let base_url = remote.serve().await;
    let (mut db, _dir) = open_db();

    let loader = ReferenceLoader::new(&base_url).unwrap();
    let outcome = loader.pull(None, &mut db).await.unwrap();

    assert_eq!(outcome, PullOutcome::NotLoggedIn);
    assert!(remote.pulls.lock().unwrap().is_empty());
    assert_eq!(db.last_sync_watermark().unwrap(), "1970-01-01");
}

#[tokio::test]
async fn watermark_advances_only_after_success() {
    let remote = Remote::new(base_catalog());
    let base_url = remote.serve().await;
    let (mut db, _dir) = open_db();

    let loader = ReferenceLoader::new(&base_url).unwrap();

    // A rejected pull must not move the watermark.
    let bad_session = Session::new("wrong-token", OPERATOR_ID);
    let err = loader.pull(Some(&bad_session), &mut db).await.unwrap_err();
    assert!(matches!(err, SyncError::Status(401)));
    assert_eq!(db.last_sync_watermark().unwrap(), "1970-01-01");

    loader.pull(Some(&session()), &mut db).await.unwrap();
    let watermark = db.last_sync_watermark().unwrap();
    assert_ne!(watermark, "1970-01-01");
    chrono::NaiveDateTime::parse_from_str(&watermark, "%Y-%m-%d %H:%M:%S")
        .expect("watermark is a local timestamp");

    // The second pull requests only the new window.
    loader.pull(Some(&session()), &mut db).await.unwrap();
    assert_eq!(remote.pulls.lock().unwrap().last().unwrap(), &watermark);
}

#[tokio::test]
async fn malformed_catalog_body_is_rejected() {
    let remote = Remote::new(json!({ "unexpected": true }));
    let base_url = remote.serve().await;
    let (mut db, _dir) = open_db();

    let loader = ReferenceLoader::new(&base_url).unwrap();
    let err = loader.pull(Some(&session()), &mut db).await.unwrap_err();

    assert!(matches!(err, SyncError::InvalidBody(_)));
    assert_eq!(db.last_sync_watermark().unwrap(), "1970-01-01");
}

#[tokio::test]
async fn pulled_checkin_history_is_not_reuploaded() {
    let mut catalog = base_catalog();
    catalog["datos"]["checkin"] = json!([
        { "idcred": 10, "idservicio": 1, "fingreso": "2024-05-30", "hingreso": "08:10:00" }
    ]);
    let remote = Remote::new(catalog);
    let base_url = remote.serve().await;
    let (mut db, _dir) = open_db();

    let loader = ReferenceLoader::new(&base_url).unwrap();
    loader.pull(Some(&session()), &mut db).await.unwrap();

    let engine = SyncEngine::new(&base_url).unwrap();
    let outcome = engine.sync_pending(&session(), &mut db).await.unwrap();

    assert_eq!(outcome, SyncOutcome::NothingToSync);
    assert!(remote.uploads.lock().unwrap().is_empty());
    assert_eq!(db.all_checkins().unwrap().len(), 1);
}

#[tokio::test]
async fn concurrent_pulls_are_single_flight() {
    let remote = Remote::new(base_catalog());
    *remote.get_delay.lock().unwrap() = Duration::from_millis(300);
    let base_url = remote.serve().await;

    // The guard lives on the loader, so two stores are enough to drive two
    // overlapping calls.
    let (mut db_a, _dir_a) = open_db();
    let (mut db_b, _dir_b) = open_db();

    let loader = ReferenceLoader::new(&base_url).unwrap();
    let current = session();

    let (first, second) = tokio::join!(
        loader.pull(Some(&current), &mut db_a),
        loader.pull(Some(&current), &mut db_b),
    );

    assert!(matches!(first, Ok(PullOutcome::Applied { .. })));
    assert!(matches!(second, Err(SyncError::AlreadyRunning)));
}

#[tokio::test]
async fn store_errors_surface_through_sync() {
    // A database without the pulled credential's person would violate the
    // foreign key and must abort the pull.
    let mut catalog = base_catalog();
    catalog["datos"]["personas"] = json!([]);
    let remote = Remote::new(catalog);
    let base_url = remote.serve().await;
    let (mut db, _dir) = open_db();

    let loader = ReferenceLoader::new(&base_url).unwrap();
    let err = loader.pull(Some(&session()), &mut db).await.unwrap_err();

    assert!(matches!(err, SyncError::Store(StoreError::Sqlite(_))));
    assert_eq!(db.last_sync_watermark().unwrap(), "1970-01-01");
}
