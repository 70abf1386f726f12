//! Upload progress hub
//!
//! Every status change of a direct upload is broadcast as an [`UploadEvent`] and
//! remembered as the upload's last known [`UploadStatus`], so callers can either
//! subscribe to the stream or poll.

use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use uuid::Uuid;
use vidshelf_core::models::{UploadEvent, UploadStatus};
use vidshelf_core::AppError;

const EVENT_CAPACITY: usize = 256;
const DEFAULT_RETENTION_MINUTES: i64 = 60;

struct TrackedUpload {
    status: UploadStatus,
    /// When the upload authorization stops being valid
    expires_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl TrackedUpload {
    fn is_stale(&self, now: DateTime<Utc>, retention: Duration) -> bool {
        if self.status.is_terminal() {
            now >= self.updated_at + retention
        } else {
            now >= self.expires_at.max(self.updated_at) + retention
        }
    }
}

/// Broadcast and polling view over direct uploads.
///
/// Cheap to clone; clones share the same channel and state.
#[derive(Clone)]
pub struct UploadProgress {
    events: broadcast::Sender<UploadEvent>,
    uploads: Arc<RwLock<HashMap<Uuid, TrackedUpload>>>,
    retention: Duration,
}

impl UploadProgress {
    pub fn new() -> Self {
        Self::with_retention(Duration::minutes(DEFAULT_RETENTION_MINUTES))
    }

    /// How long finished or abandoned uploads stay queryable
    pub fn with_retention(retention: Duration) -> Self {
        let (events, _) = broadcast::channel(EVENT_CAPACITY);
        Self {
            events,
            uploads: Arc::new(RwLock::new(HashMap::new())),
            retention,
        }
    }

    /// Receive every event published after this call.
    ///
    /// A receiver that falls more than 256 events behind observes `Lagged`.
    pub fn subscribe(&self) -> broadcast::Receiver<UploadEvent> {
        self.events.subscribe()
    }

    /// Last known status of an upload, if it is still tracked
    pub async fn status(&self, upload_id: Uuid) -> Option<UploadStatus> {
        self.uploads
            .read()
            .await
            .get(&upload_id)
            .map(|upload| upload.status.clone())
    }

    /// Record a freshly issued authorization.
    pub async fn issued(&self, upload_id: Uuid, expires_at: DateTime<Utc>) {
        let now = Utc::now();
        let mut uploads = self.uploads.write().await;
        let retention = self.retention;
        uploads.retain(|_, upload| !upload.is_stale(now, retention));

        let status = UploadStatus::Issued { expires_at };
        uploads.insert(
            upload_id,
            TrackedUpload {
                status: status.clone(),
                expires_at,
                updated_at: now,
            },
        );
        self.publish(upload_id, status, now);
    }

    /// Relay client-reported progress.
    ///
    /// `bytes_sent` is clamped to the total when one is known. Unknown uploads
    /// are `InvalidInput`; uploads that already finished are a `Conflict`.
    pub async fn report_progress(
        &self,
        upload_id: Uuid,
        bytes_sent: u64,
        total_bytes: Option<u64>,
    ) -> Result<UploadStatus, AppError> {
        let now = Utc::now();
        let mut uploads = self.uploads.write().await;
        let upload = uploads
            .get_mut(&upload_id)
            .ok_or_else(|| AppError::InvalidInput(format!("Unknown upload: {}", upload_id)))?;

        let known_total = match &upload.status {
            UploadStatus::Issued { .. } => None,
            UploadStatus::Uploading { total_bytes, .. } => *total_bytes,
            finished => {
                return Err(AppError::Conflict(format!(
                    "Upload {} already {}",
                    upload_id, finished
                )))
            }
        };

        let total_bytes = total_bytes.or(known_total);
        let bytes_sent = match total_bytes {
            Some(total) => bytes_sent.min(total),
            None => bytes_sent,
        };
        let status = UploadStatus::Uploading {
            bytes_sent,
            total_bytes,
        };

        upload.status = status.clone();
        upload.updated_at = now;
        self.publish(upload_id, status.clone(), now);
        Ok(status)
    }

    /// Mark an upload as registered as `asset_id`.
    ///
    /// Uploads that are no longer tracked are recorded anyway so the outcome
    /// stays queryable.
    pub async fn registered(&self, upload_id: Uuid, asset_id: Uuid) {
        self.finish(upload_id, UploadStatus::Registered { asset_id })
            .await;
    }

    pub async fn failed(&self, upload_id: Uuid, reason: impl Into<String>) {
        self.finish(
            upload_id,
            UploadStatus::Failed {
                reason: reason.into(),
            },
        )
        .await;
    }

    /// Drop uploads past their retention window, returning how many were removed.
    pub async fn prune(&self, now: DateTime<Utc>) -> usize {
        let mut uploads = self.uploads.write().await;
        let before = uploads.len();
        let retention = self.retention;
        uploads.retain(|_, upload| !upload.is_stale(now, retention));
        before - uploads.len()
    }

    async fn finish(&self, upload_id: Uuid, status: UploadStatus) {
        let now = Utc::now();
        let mut uploads = self.uploads.write().await;
        let upload = uploads.entry(upload_id).or_insert_with(|| TrackedUpload {
            status: status.clone(),
            expires_at: now,
            updated_at: now,
        });
        upload.status = status.clone();
        upload.updated_at = now;
        self.publish(upload_id, status, now);
    }

    // Called with the state lock held so subscribers see events in state order.
    fn publish(&self, upload_id: Uuid, status: UploadStatus, at: DateTime<Utc>) {
        tracing::debug!(upload_id = %upload_id, status = %status, "Upload status changed");
        if self
            .events
            .send(UploadEvent {
                upload_id,
                status,
                at,
            })
            .is_err()
        {
            tracing::trace!("No upload subscribers");
        }
    }
}

impl Default for UploadProgress {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_subscribers_see_lifecycle_in_order() {
        let progress = UploadProgress::new();
        let mut events = progress.subscribe();
        let upload_id = Uuid::new_v4();
        let asset_id = Uuid::new_v4();
        let expires_at = Utc::now() + Duration::minutes(15);

        progress.issued(upload_id, expires_at).await;
        progress
            .report_progress(upload_id, 512, Some(1024))
            .await
            .unwrap();
        progress.registered(upload_id, asset_id).await;

        let first = events.recv().await.unwrap();
        assert_eq!(first.upload_id, upload_id);
        assert_eq!(first.status, UploadStatus::Issued { expires_at });
        assert_eq!(
            events.recv().await.unwrap().status,
            UploadStatus::Uploading {
                bytes_sent: 512,
                total_bytes: Some(1024)
            }
        );
        assert_eq!(
            events.recv().await.unwrap().status,
            UploadStatus::Registered { asset_id }
        );
        assert_eq!(
            progress.status(upload_id).await,
            Some(UploadStatus::Registered { asset_id })
        );
    }

    #[tokio::test]
    async fn test_progress_is_clamped_and_keeps_known_total() {
        let progress = UploadProgress::new();
        let upload_id = Uuid::new_v4();
        progress
            .issued(upload_id, Utc::now() + Duration::minutes(15))
            .await;

        let status = progress
            .report_progress(upload_id, 4096, Some(1000))
            .await
            .unwrap();
        assert_eq!(
            status,
            UploadStatus::Uploading {
                bytes_sent: 1000,
                total_bytes: Some(1000)
            }
        );

        let status = progress.report_progress(upload_id, 2000, None).await.unwrap();
        assert_eq!(
            status,
            UploadStatus::Uploading {
                bytes_sent: 1000,
                total_bytes: Some(1000)
            }
        );
    }

    #[tokio::test]
    async fn test_progress_rejected_for_unknown_or_finished_uploads() {
        let progress = UploadProgress::new();
        assert!(matches!(
            progress.report_progress(Uuid::new_v4(), 1, None).await,
            Err(AppError::InvalidInput(_))
        ));

        let upload_id = Uuid::new_v4();
        progress
            .issued(upload_id, Utc::now() + Duration::minutes(15))
            .await;
        progress.failed(upload_id, "client aborted").await;
        assert!(matches!(
            progress.report_progress(upload_id, 1, None).await,
            Err(AppError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn test_publishing_without_subscribers_still_records_status() {
        let progress = UploadProgress::new();
        let upload_id = Uuid::new_v4();
        let asset_id = Uuid::new_v4();

        progress.registered(upload_id, asset_id).await;

        assert_eq!(
            progress.status(upload_id).await,
            Some(UploadStatus::Registered { asset_id })
        );
    }

    #[tokio::test]
    async fn test_prune_drops_stale_uploads() {
        let progress = UploadProgress::with_retention(Duration::minutes(5));
        let pending = Uuid::new_v4();
        let finished = Uuid::new_v4();
        let now = Utc::now();

        progress.issued(pending, now + Duration::minutes(15)).await;
        progress.registered(finished, Uuid::new_v4()).await;

        assert_eq!(progress.prune(now + Duration::minutes(10)).await, 1);
        assert!(progress.status(finished).await.is_none());
        assert!(progress.status(pending).await.is_some());

        assert_eq!(progress.prune(now + Duration::minutes(21)).await, 1);
        assert!(progress.status(pending).await.is_none());
    }
}
