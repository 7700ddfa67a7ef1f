use crate::domain::model::{CompareReport, VaultPair, VaultSnapshot};
use crate::utils::error::Result;
use async_trait::async_trait;

/// Where a database lives and how to unlock it.
#[derive(Debug, Clone, Default)]
pub struct VaultLocator {
    pub path: String,
    pub password: Option<String>,
    pub keyfile: Option<String>,
    pub label: Option<String>,
}

impl VaultLocator {
    /// Display name for reports: explicit label, else the file name.
    pub fn display_label(&self) -> String {
        self.label.clone().unwrap_or_else(|| {
            std::path::Path::new(&self.path)
                .file_name()
                .and_then(|name| name.to_str())
                .unwrap_or(&self.path)
                .to_string()
        })
    }
}

pub trait VaultSource: Send + Sync {
    fn load(
        &self,
        locator: &VaultLocator,
    ) -> impl std::future::Future<Output = Result<VaultSnapshot>> + Send;
}

pub trait Storage: Send + Sync {
    fn read_file(&self, path: &str) -> impl std::future::Future<Output = Result<Vec<u8>>> + Send;
    fn write_file(
        &self,
        path: &str,
        data: &[u8],
    ) -> impl std::future::Future<Output = Result<()>> + Send;
}

pub trait ConfigProvider: Send + Sync {
    fn first(&self) -> &VaultLocator;
    fn second(&self) -> &VaultLocator;
    fn output_path(&self) -> &str;
    fn report_formats(&self) -> &[String];
    fn bundle_reports(&self) -> bool;
}

#[async_trait]
pub trait Pipeline: Send + Sync {
    async fn extract(&self) -> Result<VaultPair>;
    async fn transform(&self, vaults: VaultPair) -> Result<CompareReport>;
    async fn load(&self, report: CompareReport) -> Result<String>;
}
