use anyhow::Context;
use clap::Parser;
use kpdiff::config::toml_config::JobConfig;
use kpdiff::utils::{logger, validation::Validate};
use kpdiff::{CompareEngine, ComparePipeline, KdbxVaultReader, LocalStorage};

#[derive(Parser)]
#[command(name = "kpdiff-job")]
#[command(about = "Run a KeePass comparison job described by a TOML file")]
struct Args {
    /// Path to the TOML job file
    #[arg(short, long, default_value = "kpdiff-job.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Emit logs as JSON (for scheduled, non-interactive runs)
    #[arg(long)]
    log_json: bool,

    /// Override the monitoring setting from the job file
    #[arg(long)]
    monitor: Option<bool>,

    /// Show what would be compared without opening any database
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    if args.log_json {
        logger::init_json_logger();
    } else {
        logger::init_cli_logger(args.verbose);
    }

    tracing::info!("🚀 Starting kpdiff job runner");
    tracing::info!("📁 Loading job from: {}", args.config);

    let config = JobConfig::from_file(&args.config)
        .with_context(|| format!("Failed to load job file '{}'", args.config))?;

    config
        .validate()
        .with_context(|| format!("Job file '{}' is invalid", args.config))?;

    let monitor_enabled = args.monitor.unwrap_or_else(|| config.monitoring_enabled());

    if args.dry_run {
        println!("Job: {}", config.job.name);
        if let Some(description) = &config.job.description {
            println!("Description: {}", description);
        }
        println!("First database: {}", config.first.path);
        println!("Second database: {}", config.second.path);
        println!(
            "Reports: {} -> {}",
            config.report.formats.join(", "),
            config.report.output_path
        );
        println!(
            "Bundle: {}, Monitoring: {}",
            config.report.bundle.unwrap_or(false),
            monitor_enabled
        );
        return Ok(());
    }

    let job = config
        .compare_job()
        .context("Failed to resolve job credentials")?;

    let storage = LocalStorage::new(job.output_path.clone());
    let pipeline = ComparePipeline::new(KdbxVaultReader::new(), storage, job);
    let engine = CompareEngine::new_with_monitoring(pipeline, monitor_enabled);

    let output_path = engine
        .run()
        .await
        .with_context(|| format!("Job '{}' failed", config.job.name))?;

    tracing::info!("✅ Job '{}' completed successfully!", config.job.name);
    println!("✅ Job '{}' completed successfully!", config.job.name);
    println!("📁 Reports saved to: {}", output_path);

    Ok(())
}
