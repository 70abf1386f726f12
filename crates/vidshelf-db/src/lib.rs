//! Vidshelf DB Library
//!
//! Backend-store access for Vidshelf: the process-wide [`ConnectionCache`] that
//! establishes the store connection at most once, the Postgres connector, and the
//! repositories that read and write users and videos over a cached connection.

pub mod connection;
pub mod db;
pub mod postgres;

pub use connection::{ConnectionCache, ConnectionError, Connector};
pub use db::{PgUserRepository, PgVideoAssetRepository, UserStore, VideoAssetStore};
pub use postgres::PgConnector;
