pub mod adapters;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;

pub use adapters::{storage::LocalStorage, vault::KdbxVaultReader};
pub use config::CompareJob;
pub use core::{engine::CompareEngine, pipeline::ComparePipeline};
pub use utils::error::{DiffError, Result};
