//! Application-wide constants.

/// Display height applied to every registered video (portrait).
pub const DEFAULT_DISPLAY_HEIGHT: i32 = 1920;

/// Display width applied to every registered video (portrait).
pub const DEFAULT_DISPLAY_WIDTH: i32 = 1080;

/// Lowest accepted quality hint.
pub const MIN_QUALITY: i32 = 1;

/// Highest accepted quality hint, also the default when none is supplied.
pub const MAX_QUALITY: i32 = 100;

/// Default page size for asset listings.
pub const DEFAULT_LIST_LIMIT: i64 = 50;

/// Largest page a single listing may return.
pub const MAX_LIST_LIMIT: i64 = 100;

/// Minimum length of a user secret accepted at registration.
pub const MIN_SECRET_LENGTH: usize = 6;

/// Largest object a client may be authorized to upload directly (500 MiB).
pub const MAX_UPLOAD_BYTES: u64 = 500 * 1024 * 1024;

/// Prefix under which direct uploads land in object storage.
pub const UPLOAD_KEY_PREFIX: &str = "uploads";
