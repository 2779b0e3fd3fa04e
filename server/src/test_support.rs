#![allow(dead_code)]

use std::{
    sync::{
        Arc, Mutex,
        atomic::{AtomicUsize, Ordering},
    },
    time::Duration,
};

use async_trait::async_trait;
use axum::{
    Router,
    extract::State,
    http::{HeaderMap, StatusCode, header::COOKIE},
    routing::get,
};
use tempfile::TempDir;
use textfile_core::{
    Database, LineRecord, StoreError, TextFileStore,
    config::{AppConfig, DatabaseBackend},
    db::text_file_repo::{TextFileRepository, TextFileRepositoryRef},
    ids::DocumentKey,
    retry::RetryPolicy,
};
use tokio::net::TcpListener;

use crate::{
    auth::{HttpUserValidator, UserValidatorRef},
    state::{AppState, build_state_with},
};

/// SQLite-backed store in a temp dir whose repository counts every call.
pub(crate) struct TestStore {
    _temp_dir: TempDir,
    database: Database,
    repo: Arc<CountingRepository>,
}

impl TestStore {
    pub(crate) async fn new() -> Self {
        let temp_dir = tempfile::tempdir().expect("create temp dir");
        let mut config = AppConfig::default();
        config.database_backend = DatabaseBackend::Sqlite;
        config.database_path = temp_dir
            .path()
            .join("test.db")
            .to_string_lossy()
            .into_owned();

        let database = Database::connect(&config).await.expect("connect database");
        let repo = Arc::new(CountingRepository {
            inner: database.text_file_repo(),
            calls: AtomicUsize::new(0),
        });

        Self {
            _temp_dir: temp_dir,
            database,
            repo,
        }
    }

    pub(crate) fn store(&self) -> TextFileStore {
        TextFileStore::with_repository(
            self.repo.clone(),
            RetryPolicy::no_retry(),
            Duration::from_secs(5),
        )
    }

    /// Store calls made so far, probes excluded.
    pub(crate) fn calls(&self) -> usize {
        self.repo.calls.load(Ordering::SeqCst)
    }

    pub(crate) async fn close(&self) {
        self.database.close().await;
    }
}

struct CountingRepository {
    inner: TextFileRepositoryRef,
    calls: AtomicUsize,
}

#[async_trait]
impl TextFileRepository for CountingRepository {
    async fn fetch_lines(&self, key: &DocumentKey) -> Result<Vec<LineRecord>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.fetch_lines(key).await
    }

    async fn replace_lines(
        &self,
        key: &DocumentKey,
        records: &[LineRecord],
    ) -> Result<(), StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.inner.replace_lines(key, records).await
    }

    async fn ping(&self, wait: Duration) -> Result<(), StoreError> {
        self.inner.ping(wait).await
    }
}

#[derive(Clone)]
struct StubContext {
    status: StatusCode,
    delay: Duration,
    hits: Arc<AtomicUsize>,
    last_cookie: Arc<Mutex<Option<String>>>,
}

/// In-process stand-in for the validateuser service.
pub(crate) struct StubValidator {
    pub(crate) base_url: String,
    context: StubContext,
}

impl StubValidator {
    pub(crate) async fn spawn(status: StatusCode) -> Self {
        Self::spawn_with(status, Duration::ZERO).await
    }

    pub(crate) async fn spawn_slow(delay: Duration) -> Self {
        Self::spawn_with(StatusCode::OK, delay).await
    }

    async fn spawn_with(status: StatusCode, delay: Duration) -> Self {
        let context = StubContext {
            status,
            delay,
            hits: Arc::new(AtomicUsize::new(0)),
            last_cookie: Arc::new(Mutex::new(None)),
        };
        let app = Router::new()
            .route("/msapi/validateuser", get(validate_user))
            .with_state(context.clone());

        let listener = TcpListener::bind("127.0.0.1:0")
            .await
            .expect("bind stub validator");
        let addr = listener.local_addr().expect("stub validator address");
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });

        Self {
            base_url: format!("http://{addr}"),
            context,
        }
    }

    pub(crate) fn validator(&self) -> UserValidatorRef {
        Arc::new(
            HttpUserValidator::new(&self.base_url, Duration::from_secs(5))
                .expect("build validator client"),
        )
    }

    pub(crate) fn hits(&self) -> usize {
        self.context.hits.load(Ordering::SeqCst)
    }

    pub(crate) fn last_cookie(&self) -> Option<String> {
        self.context.last_cookie.lock().expect("cookie lock").clone()
    }
}

async fn validate_user(State(context): State<StubContext>, headers: HeaderMap) -> StatusCode {
    context.hits.fetch_add(1, Ordering::SeqCst);
    let cookie = headers
        .get(COOKIE)
        .and_then(|value| value.to_str().ok())
        .map(str::to_owned);
    *context.last_cookie.lock().expect("cookie lock") = cookie;
    if !context.delay.is_zero() {
        tokio::time::sleep(context.delay).await;
    }
    context.status
}

pub(crate) async fn spawn_stub_validator(status: StatusCode) -> StubValidator {
    StubValidator::spawn(status).await
}

pub(crate) async fn setup_state(status: StatusCode) -> (TestStore, StubValidator, AppState) {
    let store = TestStore::new().await;
    let stub = spawn_stub_validator(status).await;
    let state = build_state_with(store.store(), stub.validator());
    (store, stub, state)
}
