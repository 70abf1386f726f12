//! Database repositories for data access layer
//!
//! Repositories are stateless: each call receives the connection handed out by the
//! [`ConnectionCache`](crate::ConnectionCache), so the store is only ever reached
//! through the single cached connection. The store traits let services run against
//! in-memory implementations in tests.

pub mod user;
pub mod video;

pub use user::{PgUserRepository, UserStore};
pub use video::{PgVideoAssetRepository, VideoAssetStore};
