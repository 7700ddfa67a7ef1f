use crate::core::Pipeline;
use crate::utils::error::Result;
use crate::utils::monitor::SystemMonitor;

pub struct CompareEngine<P: Pipeline> {
    pipeline: P,
    monitor: SystemMonitor,
}

impl<P: Pipeline> CompareEngine<P> {
    pub fn new(pipeline: P) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(false),
        }
    }

    pub fn new_with_monitoring(pipeline: P, monitor_enabled: bool) -> Self {
        Self {
            pipeline,
            monitor: SystemMonitor::new(monitor_enabled),
        }
    }

    pub async fn run(&self) -> Result<String> {
        tracing::info!("Starting comparison...");

        tracing::info!("Opening databases...");
        let vaults = self.pipeline.extract().await?;
        tracing::info!(
            "Loaded {} entries from '{}' and {} entries from '{}'",
            vaults.first.entry_count,
            vaults.first.label,
            vaults.second.entry_count,
            vaults.second.label
        );
        self.monitor.log_stats("Extract");

        tracing::info!("Comparing entries...");
        let report = self.pipeline.transform(vaults).await?;
        tracing::info!(
            "Found {} differences ({} conflicts)",
            report.summary.differences,
            report.summary.conflicts
        );
        self.monitor.log_stats("Compare");

        tracing::info!("Writing reports...");
        let output_path = self.pipeline.load(report).await?;
        tracing::info!("Reports saved to: {}", output_path);
        self.monitor.log_stats("Report");

        self.monitor.log_final_stats();

        Ok(output_path)
    }
}
