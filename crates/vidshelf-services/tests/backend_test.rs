//! End-to-end flows through the `MediaBackend` facade over in-memory collaborators.

use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Semaphore;
use vidshelf_core::models::{UploadStatus, VideoCandidate};
use vidshelf_core::AppError;
use vidshelf_services::test_helpers::*;

#[tokio::test]
async fn test_register_then_conflict_then_wrong_secret() {
    let backend = TestBackendBuilder::new().build();

    let identity = backend.register("a@x.com", "s3cret1").await.unwrap();
    assert_eq!(identity.email, "a@x.com");

    assert!(matches!(
        backend.register("a@x.com", "s3cret1").await,
        Err(AppError::Conflict(_))
    ));
    assert!(matches!(
        backend.verify("a@x.com", "wrong").await,
        Err(AppError::AuthFailure(_))
    ));
    assert_eq!(backend.verify("a@x.com", "s3cret1").await.unwrap(), identity);
}

#[tokio::test]
async fn test_upload_then_register_flow() {
    let builder = TestBackendBuilder::new();
    let backend = builder.build();
    let mut events = backend.subscribe_uploads();
    let identity = backend.register("creator@x.com", "s3cret1").await.unwrap();

    let auth = backend
        .issue_upload_authorization(Some(&identity), upload_request())
        .await
        .unwrap();
    assert!(auth.upload_url.contains(&auth.object_key));
    assert!(matches!(
        backend.upload_status(auth.upload_id).await,
        Some(UploadStatus::Issued { .. })
    ));

    backend
        .uploads()
        .report_progress(auth.upload_id, 2048, Some(1024))
        .await
        .unwrap();

    let candidate = VideoCandidate {
        upload_id: Some(auth.upload_id),
        quality: Some(150),
        ..video_candidate()
    };
    let video = backend.create_asset(Some(&identity), candidate).await.unwrap();
    assert_eq!(video.quality, 100);

    let states: Vec<String> = [
        events.recv().await.unwrap(),
        events.recv().await.unwrap(),
        events.recv().await.unwrap(),
    ]
    .iter()
    .map(|event| event.status.to_string())
    .collect();
    assert_eq!(states, ["issued", "uploading", "registered"]);

    assert_eq!(
        backend.upload_status(auth.upload_id).await,
        Some(UploadStatus::Registered { asset_id: video.id })
    );
    assert_eq!(builder.signer.calls(), 1);

    let listed = backend.list_assets().await.unwrap();
    assert_eq!(listed, vec![video]);
}

#[tokio::test]
async fn test_upload_without_identity_never_signs() {
    let builder = TestBackendBuilder::new();
    let backend = builder.build();

    let err = backend
        .issue_upload_authorization(None, upload_request())
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::Unauthenticated(_)));
    assert_eq!(builder.signer.calls(), 0);
}

#[tokio::test]
async fn test_invalid_candidate_writes_nothing() {
    let builder = TestBackendBuilder::new();
    let backend = builder.build();

    let err = backend
        .create_asset(Some(&identity()), VideoCandidate::default())
        .await
        .unwrap_err();

    assert_eq!(
        err.invalid_fields(),
        ["title", "description", "video_location", "thumbnail_location"]
    );
    assert_eq!(builder.videos.writes(), 0);
    assert_eq!(builder.connector.calls(), 0);
}

#[tokio::test]
async fn test_quality_bounds_and_defaults() {
    let backend = TestBackendBuilder::new().build();
    let identity = identity();

    let high = VideoCandidate {
        quality: Some(150),
        display_height: Some(10),
        ..video_candidate()
    };
    let low = VideoCandidate {
        quality: Some(0),
        show_controls: Some(false),
        ..video_candidate()
    };

    let high = backend.create_asset(Some(&identity), high).await.unwrap();
    let low = backend.create_asset(Some(&identity), low).await.unwrap();
    let default = backend
        .create_asset(Some(&identity), video_candidate())
        .await
        .unwrap();

    assert_eq!(high.quality, 100);
    assert_eq!((high.display_height, high.display_width), (1920, 1080));
    assert_eq!(low.quality, 1);
    assert!(!low.show_controls);
    assert_eq!(default.quality, 100);
    assert!(default.show_controls);

    let listed = backend.list_assets().await.unwrap();
    let ids: Vec<_> = listed.iter().map(|v| v.id).collect();
    assert_eq!(ids, vec![default.id, low.id, high.id]);
}

#[tokio::test]
async fn test_empty_store_lists_nothing() {
    let backend = TestBackendBuilder::new().build();
    assert!(backend.list_assets().await.unwrap().is_empty());
}

#[tokio::test]
async fn test_unreachable_store() {
    let backend = TestBackendBuilder::new()
        .with_connector(MockConnector::unreachable())
        .build();

    assert!(matches!(
        backend.list_assets().await,
        Err(AppError::ConnectionFailure(_))
    ));
    assert!(matches!(
        backend.create_asset(Some(&identity()), video_candidate()).await,
        Err(AppError::StorageFailure(_))
    ));
}

#[tokio::test]
async fn test_concurrent_requests_share_one_connection_attempt() {
    let gate = Arc::new(Semaphore::new(0));
    let builder =
        TestBackendBuilder::new().with_connector(MockConnector::new().gated(Arc::clone(&gate)));
    let backend = Arc::new(builder.build());

    let handles: Vec<_> = (0..12)
        .map(|_| {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move { backend.get_connection().await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(50)).await;
    gate.add_permits(1);

    for handle in handles {
        let connection = handle.await.unwrap().unwrap();
        assert_eq!(connection.attempt, 1);
    }
    assert_eq!(builder.connector.calls(), 1);
}

#[tokio::test]
async fn test_concurrent_failure_then_fresh_attempt() {
    let gate = Arc::new(Semaphore::new(0));
    let builder = TestBackendBuilder::new()
        .with_connector(MockConnector::failing(1).gated(Arc::clone(&gate)));
    let backend = Arc::new(builder.build());

    let handles: Vec<_> = (0..6)
        .map(|_| {
            let backend = Arc::clone(&backend);
            tokio::spawn(async move { backend.list_assets().await })
        })
        .collect();

    tokio::time::sleep(Duration::from_millis(50)).await;
    gate.add_permits(1);

    for handle in handles {
        assert!(matches!(
            handle.await.unwrap(),
            Err(AppError::ConnectionFailure(_))
        ));
    }
    assert_eq!(builder.connector.calls(), 1);

    gate.add_permits(1);
    assert!(backend.list_assets().await.unwrap().is_empty());
    assert_eq!(builder.connector.calls(), 2);
}
