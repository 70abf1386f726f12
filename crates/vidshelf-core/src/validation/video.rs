//! Video candidate validation and defaulting
//!
//! Required fields are checked before anything touches the store. Display
//! dimensions are always replaced with the portrait defaults, whatever the
//! candidate carried.

use uuid::Uuid;
use validator::Validate;

use crate::constants::{DEFAULT_DISPLAY_HEIGHT, DEFAULT_DISPLAY_WIDTH, MAX_QUALITY, MIN_QUALITY};
use crate::models::{NewVideoAsset, VideoCandidate};
use crate::AppError;

/// Names of required fields that are empty or blank, in declaration order.
pub fn missing_required_fields(candidate: &VideoCandidate) -> Vec<String> {
    [
        ("title", candidate.title.as_str()),
        ("description", candidate.description.as_str()),
        ("video_location", candidate.video_location.as_str()),
        ("thumbnail_location", candidate.thumbnail_location.as_str()),
    ]
    .into_iter()
    .filter(|(_, value)| value.trim().is_empty())
    .map(|(name, _)| name.to_string())
    .collect()
}

/// Clamp a quality hint into `[MIN_QUALITY, MAX_QUALITY]`; absent means `MAX_QUALITY`.
pub fn clamp_quality(quality: Option<i32>) -> i32 {
    quality
        .map(|q| q.clamp(MIN_QUALITY, MAX_QUALITY))
        .unwrap_or(MAX_QUALITY)
}

/// Validate a candidate and apply defaults, producing the record to persist.
pub fn normalize_candidate(
    candidate: VideoCandidate,
    owner_id: Option<Uuid>,
) -> Result<NewVideoAsset, AppError> {
    let missing = missing_required_fields(&candidate);
    if !missing.is_empty() {
        return Err(AppError::Validation { fields: missing });
    }

    let candidate = VideoCandidate {
        video_location: candidate.video_location.trim().to_string(),
        thumbnail_location: candidate.thumbnail_location.trim().to_string(),
        ..candidate
    };
    candidate.validate()?;

    Ok(NewVideoAsset {
        owner_id,
        title: candidate.title.trim().to_string(),
        description: candidate.description.trim().to_string(),
        video_location: candidate.video_location,
        thumbnail_location: candidate.thumbnail_location,
        show_controls: candidate.show_controls.unwrap_or(true),
        display_height: DEFAULT_DISPLAY_HEIGHT,
        display_width: DEFAULT_DISPLAY_WIDTH,
        quality: clamp_quality(candidate.quality),
    })
}
