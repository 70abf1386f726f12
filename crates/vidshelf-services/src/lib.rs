//! Vidshelf Services Layer
//!
//! Business services that request handlers call: the credential collaborator,
//! the upload authorization issuer and its progress hub, the asset registrar,
//! and the [`MediaBackend`] facade that owns them together with the shared
//! backend connection. Keep thin request handling outside this crate.

pub mod backend;
pub mod credentials;
pub mod registrar;
#[cfg(any(test, feature = "test-helpers"))]
pub mod test_helpers;
pub mod upload;

pub use backend::{MediaBackend, PgMediaBackend};
pub use credentials::{hash_secret, verify_secret, CredentialService};
pub use registrar::AssetRegistrar;
pub use upload::{UploadIssuer, UploadProgress};
