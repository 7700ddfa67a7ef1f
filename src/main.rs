use clap::Parser;
use kpdiff::utils::{logger, validation::Validate};
use kpdiff::{CliConfig, CompareEngine, ComparePipeline, KdbxVaultReader, LocalStorage};

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting kpdiff");
    if config.verbose {
        tracing::debug!(
            "Comparing '{}' against '{}', reports to '{}'",
            config.first,
            config.second,
            config.output_path
        );
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let monitor_enabled = config.monitor;
    if monitor_enabled {
        tracing::info!("🔍 System monitoring enabled");
    }

    // Resolve passwords (args, environment, or interactive prompt) before
    // touching either database.
    let job = match config.compare_job() {
        Ok(job) => job,
        Err(e) => {
            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());
            std::process::exit(1);
        }
    };

    let storage = LocalStorage::new(job.output_path.clone());
    let pipeline = ComparePipeline::new(KdbxVaultReader::new(), storage, job);

    let engine = CompareEngine::new_with_monitoring(pipeline, monitor_enabled);

    match engine.run().await {
        Ok(output_path) => {
            tracing::info!("✅ Comparison completed successfully!");
            tracing::info!("📁 Reports saved to: {}", output_path);
            println!("✅ Comparison completed successfully!");
            println!("📁 Reports saved to: {}", output_path);
        }
        Err(e) => {
            tracing::error!("❌ Comparison failed: {} (Severity: {:?})", e, e.severity());
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 {}", e.recovery_suggestion());

            let exit_code = match e.severity() {
                kpdiff::utils::error::ErrorSeverity::Low => 0,
                kpdiff::utils::error::ErrorSeverity::Medium => 2,
                kpdiff::utils::error::ErrorSeverity::High => 1,
                kpdiff::utils::error::ErrorSeverity::Critical => 3,
            };

            if exit_code > 0 {
                std::process::exit(exit_code);
            }
        }
    }

    Ok(())
}
