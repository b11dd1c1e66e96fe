pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use crate::config::cli::CliOptions;

pub use crate::adapters::http::RestBackend;
pub use crate::config::{AdapterConfig, ClassConfig, ServerConfig};
pub use crate::core::adapter::UserAdapter;
pub use crate::utils::error::{AdapterError, Result};
