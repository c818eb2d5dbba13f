pub mod editing;
pub mod layout;
pub mod models;
pub mod platform;

// Re-export key types for easier usage
pub use editing::{
    block::*, commands::*, document::*, markup::*, patch::*, selection::*, snapshot::*, styled::*,
};
pub use models::stored::*;
pub use platform::*;
