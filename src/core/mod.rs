pub mod engine;
pub mod pipeline;

pub use crate::domain::model::{CompareReport, CredentialRecord, VaultPair, VaultSnapshot};
pub use crate::domain::ports::{ConfigProvider, Pipeline, Storage, VaultLocator, VaultSource};
pub use crate::utils::error::Result;
