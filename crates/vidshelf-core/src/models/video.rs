use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// A registered video and the object-storage locations of its payloads.
///
/// The binaries themselves are referenced by location only; nothing here owns
/// or deletes them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct VideoAsset {
    pub id: Uuid,
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub video_location: String,
    pub thumbnail_location: String,
    pub show_controls: bool,
    pub display_height: i32,
    pub display_width: i32,
    pub quality: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Metadata submitted by a client once its direct upload has finished.
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct VideoCandidate {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    #[validate(url(message = "video_location must be an absolute URL"))]
    pub video_location: String,
    #[serde(default)]
    #[validate(url(message = "thumbnail_location must be an absolute URL"))]
    pub thumbnail_location: String,
    #[serde(default)]
    pub show_controls: Option<bool>,
    /// Accepted for compatibility; registration always applies the default dimensions.
    #[serde(default)]
    pub display_height: Option<i32>,
    /// Accepted for compatibility; registration always applies the default dimensions.
    #[serde(default)]
    pub display_width: Option<i32>,
    #[serde(default)]
    pub quality: Option<i32>,
    /// Upload this registration completes, if the client tracked one.
    #[serde(default)]
    pub upload_id: Option<Uuid>,
}

/// A validated, defaulted record ready to be written.
#[derive(Debug, Clone, PartialEq)]
pub struct NewVideoAsset {
    pub owner_id: Option<Uuid>,
    pub title: String,
    pub description: String,
    pub video_location: String,
    pub thumbnail_location: String,
    pub show_controls: bool,
    pub display_height: i32,
    pub display_width: i32,
    pub quality: i32,
}

impl NewVideoAsset {
    /// Materialize the stored record once the store has assigned identity and timestamps.
    pub fn into_asset(self, id: Uuid, created_at: DateTime<Utc>) -> VideoAsset {
        VideoAsset {
            id,
            owner_id: self.owner_id,
            title: self.title,
            description: self.description,
            video_location: self.video_location,
            thumbnail_location: self.thumbnail_location,
            show_controls: self.show_controls,
            display_height: self.display_height,
            display_width: self.display_width,
            quality: self.quality,
            created_at,
            updated_at: created_at,
        }
    }
}
