pub mod stored;

pub use stored::{RestoreError, SCHEMA_VERSION, StoredBlock, StoredDocument};
