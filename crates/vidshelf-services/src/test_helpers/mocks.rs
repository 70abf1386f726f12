//! In-memory collaborators for testing without Postgres or object storage

use async_trait::async_trait;
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU32, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;
use uuid::Uuid;
use vidshelf_core::models::{NewVideoAsset, SignedUpload, UploadIntent, UserCredential, VideoAsset};
use vidshelf_core::AppError;
use vidshelf_db::{ConnectionError, Connector, UserStore, VideoAssetStore};
use vidshelf_storage::{SignerBackend, SignerError, SignerResult, UploadSigner};

/// Connection handed out by [`MockConnector`]; `attempt` is the attempt that made it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MockConnection {
    pub attempt: u32,
}

/// Connector with scripted failures and an optional gate holding attempts open
#[derive(Clone)]
pub struct MockConnector {
    calls: Arc<AtomicU32>,
    failures_remaining: Arc<AtomicU32>,
    gate: Option<Arc<Semaphore>>,
}

impl MockConnector {
    pub fn new() -> Self {
        Self::failing(0)
    }

    /// Fail the first `failures` attempts, then succeed
    pub fn failing(failures: u32) -> Self {
        Self {
            calls: Arc::new(AtomicU32::new(0)),
            failures_remaining: Arc::new(AtomicU32::new(failures)),
            gate: None,
        }
    }

    /// Every attempt fails
    pub fn unreachable() -> Self {
        Self::failing(u32::MAX)
    }

    /// Each attempt waits for one permit from `gate` before resolving
    pub fn gated(mut self, gate: Arc<Semaphore>) -> Self {
        self.gate = Some(gate);
        self
    }

    /// Number of connection attempts started
    pub fn calls(&self) -> u32 {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for MockConnector {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Connector for MockConnector {
    type Connection = MockConnection;

    async fn connect(&self) -> Result<MockConnection, ConnectionError> {
        let attempt = self.calls.fetch_add(1, Ordering::SeqCst) + 1;

        if let Some(gate) = &self.gate {
            gate.acquire()
                .await
                .map_err(|e| ConnectionError::Connect(e.to_string()))?
                .forget();
        }

        let remaining = self.failures_remaining.load(Ordering::SeqCst);
        if remaining > 0 {
            if remaining != u32::MAX {
                self.failures_remaining.fetch_sub(1, Ordering::SeqCst);
            }
            return Err(ConnectionError::Connect("connection refused".to_string()));
        }

        Ok(MockConnection { attempt })
    }
}

/// Video store backed by a vec; counts write attempts
#[derive(Clone, Default)]
pub struct InMemoryVideoStore {
    videos: Arc<Mutex<Vec<VideoAsset>>>,
    writes: Arc<AtomicUsize>,
    fail_writes: Arc<AtomicBool>,
}

impl InMemoryVideoStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every later `insert` fails the way a dropped database pool does
    pub fn fail_writes(&self) {
        self.fail_writes.store(true, Ordering::SeqCst);
    }

    /// Newest first, matching the Postgres `ORDER BY created_at DESC, id DESC`
    fn sorted(&self) -> Vec<VideoAsset> {
        let mut videos = self.videos.lock().unwrap().clone();
        videos.sort_by(|a, b| {
            b.created_at
                .cmp(&a.created_at)
                .then_with(|| b.id.cmp(&a.id))
        });
        videos
    }

    /// Add a record directly, bypassing `insert` and the write counter
    pub fn seed(&self, video: VideoAsset) {
        self.videos.lock().unwrap().push(video);
    }

    pub fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.videos.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[async_trait]
impl VideoAssetStore<MockConnection> for InMemoryVideoStore {
    async fn insert(
        &self,
        _conn: &MockConnection,
        asset: NewVideoAsset,
    ) -> Result<VideoAsset, AppError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Database(sqlx::Error::PoolClosed));
        }
        let mut videos = self.videos.lock().unwrap();

        // Strictly increasing timestamps keep newest-first ordering deterministic.
        let mut created_at = Utc::now();
        if let Some(latest) = videos.iter().map(|v| v.created_at).max() {
            if created_at <= latest {
                created_at = latest + Duration::microseconds(1);
            }
        }

        let video = asset.into_asset(Uuid::new_v4(), created_at);
        videos.push(video.clone());
        Ok(video)
    }

    async fn list_recent(
        &self,
        _conn: &MockConnection,
        limit: i64,
        offset: i64,
    ) -> Result<Vec<VideoAsset>, AppError> {
        Ok(self
            .sorted()
            .into_iter()
            .skip(offset.max(0) as usize)
            .take(limit.max(0) as usize)
            .collect())
    }

    async fn list_before(
        &self,
        _conn: &MockConnection,
        before: Option<(DateTime<Utc>, Uuid)>,
        limit: i64,
    ) -> Result<Vec<VideoAsset>, AppError> {
        Ok(self
            .sorted()
            .into_iter()
            .filter(|v| before.map_or(true, |cursor| (v.created_at, v.id) < cursor))
            .take(limit.max(0) as usize)
            .collect())
    }
}

/// User store keyed by normalized email
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<Mutex<HashMap<String, UserCredential>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, email: &str) -> Option<UserCredential> {
        self.users.lock().unwrap().get(email).cloned()
    }
}

#[async_trait]
impl UserStore<MockConnection> for InMemoryUserStore {
    async fn find_by_email(
        &self,
        _conn: &MockConnection,
        email: &str,
    ) -> Result<Option<UserCredential>, AppError> {
        Ok(self.get(email))
    }

    async fn insert(
        &self,
        _conn: &MockConnection,
        email: &str,
        secret_hash: &str,
    ) -> Result<UserCredential, AppError> {
        let mut users = self.users.lock().unwrap();
        if users.contains_key(email) {
            return Err(AppError::Conflict(format!(
                "Email already registered: {}",
                email
            )));
        }
        let user = UserCredential {
            id: Uuid::new_v4(),
            email: email.to_string(),
            secret_hash: secret_hash.to_string(),
            created_at: Utc::now(),
        };
        users.insert(email.to_string(), user.clone());
        Ok(user)
    }
}

/// Signer that records calls and echoes the intent's expiry, optionally shifted
#[derive(Clone)]
pub struct RecordingSigner {
    calls: Arc<AtomicUsize>,
    expiry_shift: Duration,
    fail: bool,
}

impl RecordingSigner {
    pub fn new() -> Self {
        Self {
            calls: Arc::new(AtomicUsize::new(0)),
            expiry_shift: Duration::zero(),
            fail: false,
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            ..Self::new()
        }
    }

    /// Report an expiry `shift` away from the requested one
    pub fn with_expiry_shift(mut self, shift: Duration) -> Self {
        self.expiry_shift = shift;
        self
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Default for RecordingSigner {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl UploadSigner for RecordingSigner {
    async fn sign(&self, intent: &UploadIntent) -> SignerResult<SignedUpload> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        if self.fail {
            return Err(SignerError::SigningFailed("signer unavailable".to_string()));
        }

        Ok(SignedUpload {
            upload_url: format!("https://uploads.test/{}", intent.object_key),
            token: intent.upload_id.to_string(),
            signature: "test-signature".to_string(),
            expires_at: intent.expires_at + self.expiry_shift,
            fields: None,
        })
    }

    fn backend_type(&self) -> SignerBackend {
        SignerBackend::Hmac
    }
}
