pub mod entities;
pub mod error;
pub mod files;
pub mod users;

pub use error::ModelError;

// Re-export tracing for use in this crate
pub use tracing;
