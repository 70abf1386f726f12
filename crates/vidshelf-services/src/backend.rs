//! Request-facing facade
//!
//! [`MediaBackend`] is built once at process start and shared by reference with
//! every request handler. It owns the connection cache, so all services observe
//! the same backend connection.

use std::sync::Arc;
use tokio::sync::broadcast;
use uuid::Uuid;
use vidshelf_core::models::{
    Identity, UploadAuthorization, UploadEvent, UploadRequest, UploadStatus, VideoAsset,
    VideoCandidate,
};
use vidshelf_core::{AppError, Config};
use vidshelf_db::{
    ConnectionCache, Connector, PgConnector, PgUserRepository, PgVideoAssetRepository, UserStore,
    VideoAssetStore,
};
use vidshelf_storage::{create_signer, UploadSigner};

use crate::credentials::CredentialService;
use crate::registrar::AssetRegistrar;
use crate::upload::{UploadIssuer, UploadProgress};

/// The backend wired to Postgres and the configured upload signer
pub type PgMediaBackend = MediaBackend<PgConnector, PgVideoAssetRepository, PgUserRepository>;

pub struct MediaBackend<C: Connector, V, U> {
    connections: Arc<ConnectionCache<C>>,
    issuer: UploadIssuer,
    registrar: AssetRegistrar<C, V>,
    credentials: CredentialService<C, U>,
    progress: UploadProgress,
}

impl<C, V, U> MediaBackend<C, V, U>
where
    C: Connector,
    V: VideoAssetStore<C::Connection>,
    U: UserStore<C::Connection>,
{
    pub fn new(
        connector: C,
        videos: V,
        users: U,
        signer: Arc<dyn UploadSigner>,
        upload_ttl: std::time::Duration,
    ) -> Result<Self, AppError> {
        let connections = Arc::new(ConnectionCache::new(connector));
        let progress = UploadProgress::new();

        Ok(Self {
            issuer: UploadIssuer::new(signer, upload_ttl, progress.clone())?,
            registrar: AssetRegistrar::new(Arc::clone(&connections), videos, progress.clone()),
            credentials: CredentialService::new(Arc::clone(&connections), users),
            connections,
            progress,
        })
    }

    /// The shared backend connection, established on first use
    pub async fn get_connection(&self) -> Result<C::Connection, AppError> {
        Ok(self.connections.acquire().await?)
    }

    pub async fn issue_upload_authorization(
        &self,
        identity: Option<&Identity>,
        request: UploadRequest,
    ) -> Result<UploadAuthorization, AppError> {
        self.issuer.issue(identity, request).await
    }

    pub async fn create_asset(
        &self,
        identity: Option<&Identity>,
        candidate: VideoCandidate,
    ) -> Result<VideoAsset, AppError> {
        self.registrar.create(identity, candidate).await
    }

    pub async fn list_assets(&self) -> Result<Vec<VideoAsset>, AppError> {
        self.registrar.list().await
    }

    pub async fn list_assets_page(
        &self,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<VideoAsset>, AppError> {
        self.registrar.list_page(limit, offset).await
    }

    pub async fn register(&self, email: &str, secret: &str) -> Result<Identity, AppError> {
        self.credentials.register(email, secret).await
    }

    pub async fn verify(&self, email: &str, secret: &str) -> Result<Identity, AppError> {
        self.credentials.verify(email, secret).await
    }

    pub fn subscribe_uploads(&self) -> broadcast::Receiver<UploadEvent> {
        self.progress.subscribe()
    }

    pub async fn upload_status(&self, upload_id: Uuid) -> Option<UploadStatus> {
        self.progress.status(upload_id).await
    }

    /// Progress hub, for handlers relaying client-side upload progress
    pub fn uploads(&self) -> &UploadProgress {
        &self.progress
    }

    /// Whether the backend connection has been established (no I/O)
    pub async fn is_connected(&self) -> bool {
        self.connections.is_connected().await
    }
}

impl PgMediaBackend {
    /// Wire the Postgres connector and the configured signer.
    ///
    /// Nothing connects here; the first request that needs the store does.
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        let signer = create_signer(config)?;
        tracing::info!(signer = %signer.backend_type(), "Upload signer configured");

        Self::new(
            PgConnector::from_config(config),
            PgVideoAssetRepository::new(),
            PgUserRepository::new(),
            signer,
            config.upload_url_ttl(),
        )
    }
}
