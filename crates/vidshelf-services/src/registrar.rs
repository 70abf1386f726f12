//! Asset registrar: validates video metadata after a direct upload and
//! persists it through the shared backend connection.

use std::sync::Arc;
use vidshelf_core::constants::{DEFAULT_LIST_LIMIT, MAX_LIST_LIMIT};
use vidshelf_core::models::{Identity, VideoAsset, VideoCandidate};
use vidshelf_core::validation::normalize_candidate;
use vidshelf_core::AppError;
use vidshelf_db::{ConnectionCache, Connector, VideoAssetStore};

use crate::upload::UploadProgress;

pub struct AssetRegistrar<C: Connector, S> {
    connections: Arc<ConnectionCache<C>>,
    store: S,
    progress: UploadProgress,
}

impl<C, S> AssetRegistrar<C, S>
where
    C: Connector,
    S: VideoAssetStore<C::Connection>,
{
    pub fn new(connections: Arc<ConnectionCache<C>>, store: S, progress: UploadProgress) -> Self {
        Self {
            connections,
            store,
            progress,
        }
    }

    /// Validate, default and persist a video candidate.
    ///
    /// The identity is checked first, then the candidate; neither failure touches
    /// the store. Connection and write failures surface as `StorageFailure`.
    #[tracing::instrument(skip(self, identity, candidate), fields(upload_id = ?candidate.upload_id))]
    pub async fn create(
        &self,
        identity: Option<&Identity>,
        candidate: VideoCandidate,
    ) -> Result<VideoAsset, AppError> {
        let identity = identity.ok_or_else(|| {
            AppError::Unauthorized("Registering a video requires an authenticated identity".to_string())
        })?;

        let upload_id = candidate.upload_id;
        let new_asset = normalize_candidate(candidate, Some(identity.user_id))?;

        let conn = self.connections.acquire().await.map_err(|e| {
            tracing::error!(error = %e, "Backend store unavailable for video registration");
            AppError::StorageFailure(format!("Backend store unavailable: {}", e))
        })?;

        let asset = self
            .store
            .insert(&conn, new_asset)
            .await
            .map_err(into_storage_failure)?;

        if let Some(upload_id) = upload_id {
            self.progress.registered(upload_id, asset.id).await;
        }

        tracing::info!(
            video_id = %asset.id,
            owner_id = %identity.user_id,
            quality = asset.quality,
            "Registered video"
        );
        Ok(asset)
    }

    /// Every registered video, most recent first.
    ///
    /// An empty store yields an empty vec; an unreachable store is a
    /// `ConnectionFailure`.
    #[tracing::instrument(skip(self))]
    pub async fn list(&self) -> Result<Vec<VideoAsset>, AppError> {
        let conn = self.connections.acquire().await?;

        let mut videos: Vec<VideoAsset> = Vec::new();
        loop {
            let cursor = videos.last().map(|v| (v.created_at, v.id));
            let page = self
                .store
                .list_before(&conn, cursor, MAX_LIST_LIMIT)
                .await?;
            let fetched = page.len() as i64;
            videos.extend(page);
            if fetched < MAX_LIST_LIMIT {
                break;
            }
        }

        tracing::debug!(count = videos.len(), "Listed videos");
        Ok(videos)
    }

    /// One page of videos, most recent first.
    ///
    /// `limit` defaults to 50 and is clamped to `[1, 100]`.
    #[tracing::instrument(skip(self))]
    pub async fn list_page(
        &self,
        limit: Option<i64>,
        offset: i64,
    ) -> Result<Vec<VideoAsset>, AppError> {
        let limit = limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT);
        let offset = offset.max(0);

        let conn = self.connections.acquire().await?;
        self.store.list_recent(&conn, limit, offset).await
    }
}

fn into_storage_failure(err: AppError) -> AppError {
    match err {
        AppError::Database(e) => {
            tracing::error!(error = %e, "Failed to write video record");
            AppError::StorageFailure(format!("Failed to write video record: {}", e))
        }
        other => other,
    }
}
