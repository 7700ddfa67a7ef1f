use crate::core::{ConfigProvider, Pipeline, Storage, VaultPair, VaultSource};
use crate::domain::diff;
use crate::domain::model::{CompareReport, CompareSummary, DiffKind, Difference};
use crate::utils::error::{DiffError, Result};
use std::io::Write;
use zip::write::{FileOptions, ZipWriter};

/// File name of the bundled report archive.
pub const REPORT_BUNDLE: &str = "kpdiff_report.zip";

pub struct ComparePipeline<V: VaultSource, S: Storage, C: ConfigProvider> {
    vaults: V,
    storage: S,
    config: C,
}

impl<V: VaultSource, S: Storage, C: ConfigProvider> ComparePipeline<V, S, C> {
    pub fn new(vaults: V, storage: S, config: C) -> Self {
        Self {
            vaults,
            storage,
            config,
        }
    }
}

#[async_trait::async_trait]
impl<V: VaultSource, S: Storage, C: ConfigProvider> Pipeline for ComparePipeline<V, S, C> {
    async fn extract(&self) -> Result<VaultPair> {
        tracing::debug!("Opening first database: {}", self.config.first().path);
        let first = self.vaults.load(self.config.first()).await?;

        tracing::debug!("Opening second database: {}", self.config.second().path);
        let second = self.vaults.load(self.config.second()).await?;

        Ok(VaultPair { first, second })
    }

    async fn transform(&self, vaults: VaultPair) -> Result<CompareReport> {
        let differences = diff::compare(&vaults.first, &vaults.second);
        let conflicts = diff::conflicts(&differences);

        tracing::debug!(
            "{} differences between '{}' and '{}'",
            differences.len(),
            vaults.first.label,
            vaults.second.label
        );

        let summary = CompareSummary {
            first_label: vaults.first.label.clone(),
            second_label: vaults.second.label.clone(),
            first_entries: vaults.first.entry_count,
            second_entries: vaults.second.entry_count,
            differences: differences.len(),
            conflicts: conflicts.len(),
            generated_at: chrono::Utc::now().to_rfc3339(),
        };

        let csv_output = render_table(&differences, b',')?;
        let tsv_output = render_table(&differences, b'\t')?;

        Ok(CompareReport {
            differences,
            conflicts,
            summary,
            csv_output,
            tsv_output,
        })
    }

    async fn load(&self, report: CompareReport) -> Result<String> {
        let json_report = serde_json::to_string_pretty(&serde_json::json!({
            "summary": &report.summary,
            "differences": &report.differences,
        }))?;

        if self.config.bundle_reports() {
            tracing::debug!("Bundling reports into {}", REPORT_BUNDLE);

            let zip_data = {
                let mut zip = ZipWriter::new(std::io::Cursor::new(Vec::new()));

                for format in self.config.report_formats() {
                    match format.as_str() {
                        "csv" => {
                            zip.start_file::<_, ()>("diff.csv", FileOptions::default())?;
                            zip.write_all(report.csv_output.as_bytes())?;
                        }
                        "tsv" => {
                            zip.start_file::<_, ()>("diff.tsv", FileOptions::default())?;
                            zip.write_all(report.tsv_output.as_bytes())?;
                        }
                        "json" => {
                            zip.start_file::<_, ()>("diff.json", FileOptions::default())?;
                            zip.write_all(json_report.as_bytes())?;
                        }
                        other => {
                            return Err(DiffError::InvalidConfigValueError {
                                field: "formats".to_string(),
                                value: other.to_string(),
                                reason: "Unknown report format".to_string(),
                            });
                        }
                    }
                }

                if !report.conflicts.is_empty() {
                    zip.start_file::<_, ()>("conflicts.json", FileOptions::default())?;
                    let conflicts_json = serde_json::to_string_pretty(&report.conflicts)?;
                    zip.write_all(conflicts_json.as_bytes())?;
                }

                let cursor = zip.finish()?;
                cursor.into_inner()
            };

            tracing::debug!("Writing report archive ({} bytes)", zip_data.len());
            self.storage.write_file(REPORT_BUNDLE, &zip_data).await?;

            return Ok(format!("{}/{}", self.config.output_path(), REPORT_BUNDLE));
        }

        for format in self.config.report_formats() {
            match format.as_str() {
                "csv" => {
                    self.storage
                        .write_file("diff.csv", report.csv_output.as_bytes())
                        .await?;
                }
                "tsv" => {
                    self.storage
                        .write_file("diff.tsv", report.tsv_output.as_bytes())
                        .await?;
                }
                "json" => {
                    self.storage
                        .write_file("diff.json", json_report.as_bytes())
                        .await?;
                }
                other => {
                    return Err(DiffError::InvalidConfigValueError {
                        field: "formats".to_string(),
                        value: other.to_string(),
                        reason: "Unknown report format".to_string(),
                    });
                }
            }
        }

        if !report.conflicts.is_empty() {
            let conflicts_json = serde_json::to_string_pretty(&report.conflicts)?;
            self.storage
                .write_file("conflicts.json", conflicts_json.as_bytes())
                .await?;
        }

        Ok(self.config.output_path().to_string())
    }
}

/// Render differences as a delimited table. Secret values never appear here:
/// the detail column only ever carries the two usernames.
fn render_table(differences: &[Difference], delimiter: u8) -> Result<String> {
    let mut writer = csv::WriterBuilder::new()
        .delimiter(delimiter)
        .from_writer(Vec::new());

    writer.write_record(["title", "username", "change", "detail"])?;

    for difference in differences {
        let detail = match &difference.kind {
            DiffKind::UsernameDiffers { first, second } => {
                format!("first={} second={}", first, second)
            }
            _ => String::new(),
        };

        writer.write_record([
            difference.title.as_str(),
            difference.username.as_str(),
            difference.kind.label(),
            detail.as_str(),
        ])?;
    }

    let bytes = writer
        .into_inner()
        .map_err(|e| DiffError::ProcessingError {
            message: format!("Failed to flush report table: {}", e),
        })?;

    String::from_utf8(bytes).map_err(|e| DiffError::ProcessingError {
        message: format!("Report table is not valid UTF-8: {}", e),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CompareJob;
    use crate::core::{CredentialRecord, VaultLocator, VaultSnapshot};
    use std::collections::HashMap;
    use std::sync::Arc;
    use tokio::sync::Mutex;

    #[derive(Clone, Default)]
    struct MockVaultSource {
        snapshots: HashMap<String, VaultSnapshot>,
    }

    impl MockVaultSource {
        fn with_snapshot(mut self, path: &str, snapshot: VaultSnapshot) -> Self {
            self.snapshots.insert(path.to_string(), snapshot);
            self
        }
    }

    impl VaultSource for MockVaultSource {
        async fn load(&self, locator: &VaultLocator) -> Result<VaultSnapshot> {
            self.snapshots.get(&locator.path).cloned().ok_or_else(|| {
                DiffError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("No such database: {}", locator.path),
                ))
            })
        }
    }

    #[derive(Clone)]
    struct MockStorage {
        files: Arc<Mutex<HashMap<String, Vec<u8>>>>,
    }

    impl MockStorage {
        fn new() -> Self {
            Self {
                files: Arc::new(Mutex::new(HashMap::new())),
            }
        }

        async fn get_file(&self, path: &str) -> Option<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned()
        }

        async fn file_names(&self) -> Vec<String> {
            let files = self.files.lock().await;
            let mut names: Vec<String> = files.keys().cloned().collect();
            names.sort();
            names
        }
    }

    impl Storage for MockStorage {
        async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
            let files = self.files.lock().await;
            files.get(path).cloned().ok_or_else(|| {
                DiffError::IoError(std::io::Error::new(
                    std::io::ErrorKind::NotFound,
                    format!("File not found: {}", path),
                ))
            })
        }

        async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
            let mut files = self.files.lock().await;
            files.insert(path.to_string(), data.to_vec());
            Ok(())
        }
    }

    fn record(title: &str, username: &str, password: &str) -> CredentialRecord {
        CredentialRecord {
            group_path: String::new(),
            title: title.to_string(),
            username: username.to_string(),
            url: String::new(),
            password: password.to_string(),
        }
    }

    fn snapshot(label: &str, records: Vec<CredentialRecord>) -> VaultSnapshot {
        let entry_count = records.len();
        VaultSnapshot {
            label: label.to_string(),
            records,
            entry_count,
        }
    }

    fn test_job(formats: &[&str], bundle: bool) -> CompareJob {
        CompareJob {
            first: VaultLocator {
                path: "first.kdbx".to_string(),
                password: Some("pw".to_string()),
                ..Default::default()
            },
            second: VaultLocator {
                path: "second.kdbx".to_string(),
                password: Some("pw".to_string()),
                ..Default::default()
            },
            output_path: "test_reports".to_string(),
            formats: formats.iter().map(|f| f.to_string()).collect(),
            bundle,
        }
    }

    fn test_pipeline(
        formats: &[&str],
        bundle: bool,
    ) -> (
        ComparePipeline<MockVaultSource, MockStorage, CompareJob>,
        MockStorage,
    ) {
        let source = MockVaultSource::default()
            .with_snapshot(
                "first.kdbx",
                snapshot(
                    "laptop",
                    vec![
                        record("Email", "alice", "pw1"),
                        record("Bank", "bob", "same"),
                    ],
                ),
            )
            .with_snapshot(
                "second.kdbx",
                snapshot(
                    "backup",
                    vec![
                        record("Email", "alice", "pw2"),
                        record("Site", "carol", "other"),
                    ],
                ),
            );

        let storage = MockStorage::new();
        let pipeline = ComparePipeline::new(source, storage.clone(), test_job(formats, bundle));
        (pipeline, storage)
    }

    #[tokio::test]
    async fn test_extract_loads_both_databases() {
        let (pipeline, _storage) = test_pipeline(&["csv"], false);

        let vaults = pipeline.extract().await.unwrap();

        assert_eq!(vaults.first.label, "laptop");
        assert_eq!(vaults.second.label, "backup");
        assert_eq!(vaults.first.entry_count, 2);
        assert_eq!(vaults.second.entry_count, 2);
    }

    #[tokio::test]
    async fn test_extract_missing_database_fails() {
        let source = MockVaultSource::default();
        let pipeline = ComparePipeline::new(source, MockStorage::new(), test_job(&["csv"], false));

        assert!(pipeline.extract().await.is_err());
    }

    #[tokio::test]
    async fn test_transform_builds_sorted_report() {
        let (pipeline, _storage) = test_pipeline(&["csv"], false);

        let vaults = pipeline.extract().await.unwrap();
        let report = pipeline.transform(vaults).await.unwrap();

        assert_eq!(report.summary.first_label, "laptop");
        assert_eq!(report.summary.first_entries, 2);
        assert_eq!(report.summary.differences, 3);
        assert_eq!(report.summary.conflicts, 1);

        let titles: Vec<&str> = report.differences.iter().map(|d| d.title.as_str()).collect();
        assert_eq!(titles, vec!["Bank", "Email", "Site"]);

        let lines: Vec<&str> = report.csv_output.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[0], "title,username,change,detail");
        assert_eq!(lines[1], "Bank,bob,only_in_first,");
        assert_eq!(lines[2], "Email,alice,password_differs,");
        assert_eq!(lines[3], "Site,carol,only_in_second,");

        let tsv_lines: Vec<&str> = report.tsv_output.lines().collect();
        assert_eq!(tsv_lines[0], "title\tusername\tchange\tdetail");
    }

    #[tokio::test]
    async fn test_transform_with_identical_vaults() {
        let records = vec![record("Email", "alice", "pw")];
        let source = MockVaultSource::default()
            .with_snapshot("first.kdbx", snapshot("a", records.clone()))
            .with_snapshot("second.kdbx", snapshot("b", records));
        let pipeline = ComparePipeline::new(source, MockStorage::new(), test_job(&["csv"], false));

        let vaults = pipeline.extract().await.unwrap();
        let report = pipeline.transform(vaults).await.unwrap();

        assert!(report.differences.is_empty());
        assert_eq!(report.csv_output.lines().count(), 1); // header only
        assert!(report.conflicts.is_empty());
    }

    #[tokio::test]
    async fn test_transform_quotes_titles_with_delimiters() {
        let source = MockVaultSource::default()
            .with_snapshot(
                "first.kdbx",
                snapshot("a", vec![record("Email, personal", "alice", "pw")]),
            )
            .with_snapshot("second.kdbx", snapshot("b", vec![]));
        let pipeline = ComparePipeline::new(source, MockStorage::new(), test_job(&["csv"], false));

        let vaults = pipeline.extract().await.unwrap();
        let report = pipeline.transform(vaults).await.unwrap();

        assert!(report.csv_output.contains("\"Email, personal\""));
    }

    #[tokio::test]
    async fn test_transform_never_leaks_passwords() {
        let (pipeline, _storage) = test_pipeline(&["csv", "tsv", "json"], false);

        let vaults = pipeline.extract().await.unwrap();
        let report = pipeline.transform(vaults).await.unwrap();

        let json_report = serde_json::to_string(&report.differences).unwrap();
        for secret in ["pw1", "pw2", "same", "other"] {
            assert!(!report.csv_output.contains(secret));
            assert!(!report.tsv_output.contains(secret));
            assert!(!json_report.contains(secret));
        }
    }

    #[tokio::test]
    async fn test_load_writes_requested_formats() {
        let (pipeline, storage) = test_pipeline(&["csv", "json"], false);

        let vaults = pipeline.extract().await.unwrap();
        let report = pipeline.transform(vaults).await.unwrap();
        let output_path = pipeline.load(report).await.unwrap();

        assert_eq!(output_path, "test_reports");
        // conflicts.json appears because the Email entry is a conflict
        assert_eq!(
            storage.file_names().await,
            vec!["conflicts.json", "diff.csv", "diff.json"]
        );

        let json_data = storage.get_file("diff.json").await.unwrap();
        let json: serde_json::Value = serde_json::from_slice(&json_data).unwrap();
        assert_eq!(json["summary"]["differences"], 3);
        assert_eq!(json["differences"].as_array().unwrap().len(), 3);
    }

    #[tokio::test]
    async fn test_load_skips_conflicts_file_when_none() {
        let records = vec![record("Email", "alice", "pw")];
        let source = MockVaultSource::default()
            .with_snapshot("first.kdbx", snapshot("a", records.clone()))
            .with_snapshot("second.kdbx", snapshot("b", records));
        let storage = MockStorage::new();
        let pipeline =
            ComparePipeline::new(source, storage.clone(), test_job(&["csv"], false));

        let vaults = pipeline.extract().await.unwrap();
        let report = pipeline.transform(vaults).await.unwrap();
        pipeline.load(report).await.unwrap();

        assert_eq!(storage.file_names().await, vec!["diff.csv"]);
    }

    #[tokio::test]
    async fn test_load_bundle_zip_contents() {
        let (pipeline, storage) = test_pipeline(&["csv", "json"], true);

        let vaults = pipeline.extract().await.unwrap();
        let report = pipeline.transform(vaults).await.unwrap();
        let csv_output = report.csv_output.clone();
        let output_path = pipeline.load(report).await.unwrap();

        assert_eq!(output_path, format!("test_reports/{}", REPORT_BUNDLE));

        let zip_data = storage.get_file(REPORT_BUNDLE).await.unwrap();
        let cursor = std::io::Cursor::new(zip_data);
        let mut archive = zip::ZipArchive::new(cursor).unwrap();

        let mut file_names: Vec<String> = (0..archive.len())
            .map(|i| archive.by_index(i).unwrap().name().to_string())
            .collect();
        file_names.sort();
        assert_eq!(file_names, vec!["conflicts.json", "diff.csv", "diff.json"]);

        let csv_content = {
            let mut csv_file = archive.by_name("diff.csv").unwrap();
            let mut content = String::new();
            std::io::Read::read_to_string(&mut csv_file, &mut content).unwrap();
            content
        };
        assert_eq!(csv_content, csv_output);
    }

    #[tokio::test]
    async fn test_load_unknown_format_is_rejected() {
        let (pipeline, _storage) = test_pipeline(&["xml"], false);

        let vaults = pipeline.extract().await.unwrap();
        let report = pipeline.transform(vaults).await.unwrap();

        assert!(matches!(
            pipeline.load(report).await,
            Err(DiffError::InvalidConfigValueError { .. })
        ));
    }
}
