//! Fixtures and a backend builder wired to the in-memory mocks

use chrono::{DateTime, Utc};
use std::sync::Arc;
use uuid::Uuid;
use vidshelf_core::models::{Identity, UploadRequest, VideoAsset, VideoCandidate};

use super::mocks::{InMemoryUserStore, InMemoryVideoStore, MockConnector, RecordingSigner};
use crate::MediaBackend;

pub type MockMediaBackend = MediaBackend<MockConnector, InMemoryVideoStore, InMemoryUserStore>;

const TEST_UPLOAD_TTL_SECS: u64 = 900;

pub fn identity() -> Identity {
    let user_id = Uuid::new_v4();
    Identity {
        user_id,
        email: format!("{}@example.com", user_id.simple()),
    }
}

/// A candidate with every required field filled in
pub fn video_candidate() -> VideoCandidate {
    VideoCandidate {
        title: "Sunset".to_string(),
        description: "Beach at dusk".to_string(),
        video_location: "https://cdn.example.com/videos/sunset.mp4".to_string(),
        thumbnail_location: "https://cdn.example.com/thumbnails/sunset.jpg".to_string(),
        ..Default::default()
    }
}

pub fn upload_request() -> UploadRequest {
    UploadRequest {
        filename: "sunset.mp4".to_string(),
        content_type: "video/mp4".to_string(),
        file_size: Some(10 * 1024 * 1024),
    }
}

/// A stored record, for seeding an [`InMemoryVideoStore`]
pub fn video_asset(title: &str, created_at: DateTime<Utc>) -> VideoAsset {
    VideoAsset {
        id: Uuid::new_v4(),
        owner_id: None,
        title: title.to_string(),
        description: format!("{} description", title),
        video_location: "https://cdn.example.com/videos/seed.mp4".to_string(),
        thumbnail_location: "https://cdn.example.com/thumbnails/seed.jpg".to_string(),
        show_controls: true,
        display_height: 1920,
        display_width: 1080,
        quality: 100,
        created_at,
        updated_at: created_at,
    }
}

/// Builds a [`MockMediaBackend`] while keeping handles on its collaborators.
///
/// The mocks share state through `Arc`s, so the fields observe whatever the
/// built backend does.
#[derive(Clone, Default)]
pub struct TestBackendBuilder {
    pub connector: MockConnector,
    pub videos: InMemoryVideoStore,
    pub users: InMemoryUserStore,
    pub signer: RecordingSigner,
}

impl TestBackendBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_connector(mut self, connector: MockConnector) -> Self {
        self.connector = connector;
        self
    }

    pub fn with_signer(mut self, signer: RecordingSigner) -> Self {
        self.signer = signer;
        self
    }

    pub fn build(&self) -> MockMediaBackend {
        MediaBackend::new(
            self.connector.clone(),
            self.videos.clone(),
            self.users.clone(),
            Arc::new(self.signer.clone()),
            std::time::Duration::from_secs(TEST_UPLOAD_TTL_SECS),
        )
        .expect("test backend configuration is valid")
    }
}
