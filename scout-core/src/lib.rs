//! Scout Core - shared data model, collaborator traits and infrastructure
//!
//! Everything the search, RAG and pipeline crates agree on lives here.

pub mod async_utils;
pub mod config;
pub mod error;
pub mod logging;
pub mod progress;
pub mod traits;
pub mod types;

pub use async_utils::*;
pub use config::*;
pub use error::*;
pub use logging::*;
pub use progress::*;
pub use traits::*;
pub use types::*;

// Re-export commonly used external types
pub use async_trait::async_trait;
pub use tokio;
pub use tracing;
