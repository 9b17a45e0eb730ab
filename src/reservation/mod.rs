mod checksum;
mod domain;
mod error;
mod store;

pub use checksum::{checksum_hex, file_checksum};
pub use domain::{ArtifactKind, ArtifactRecord, ArtifactState, ContentMetadata};
pub use error::ReservationError;
pub use store::ArtifactStore;
