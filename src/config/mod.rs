pub mod toml_config;

use crate::domain::ports::{ConfigProvider, VaultLocator};

#[cfg(feature = "cli")]
use crate::utils::error::{DiffError, Result};
#[cfg(feature = "cli")]
use crate::utils::validation::{self, Validate};
#[cfg(feature = "cli")]
use clap::Parser;
#[cfg(feature = "cli")]
use std::io::Write;

/// Report formats the load stage knows how to write.
pub const REPORT_FORMATS: &[&str] = &["csv", "tsv", "json"];

/// A fully resolved comparison job: both locators carry usable credentials.
#[derive(Debug, Clone, Default)]
pub struct CompareJob {
    pub first: VaultLocator,
    pub second: VaultLocator,
    pub output_path: String,
    pub formats: Vec<String>,
    pub bundle: bool,
}

impl ConfigProvider for CompareJob {
    fn first(&self) -> &VaultLocator {
        &self.first
    }

    fn second(&self) -> &VaultLocator {
        &self.second
    }

    fn output_path(&self) -> &str {
        &self.output_path
    }

    fn report_formats(&self) -> &[String] {
        &self.formats
    }

    fn bundle_reports(&self) -> bool {
        self.bundle
    }
}

#[cfg(feature = "cli")]
#[derive(Debug, Clone, Parser)]
#[command(name = "kpdiff")]
#[command(about = "Compare two KeePass databases and report the differences")]
pub struct CliConfig {
    /// Path to the first .kdbx database
    pub first: String,

    /// Path to the second .kdbx database
    pub second: String,

    /// Master password for the first database (visible in shell history; prefer
    /// KPDIFF_FIRST_PASSWORD or the interactive prompt)
    #[arg(long)]
    pub first_password: Option<String>,

    /// Master password for the second database (see --first-password)
    #[arg(long)]
    pub second_password: Option<String>,

    /// Keyfile for the first database
    #[arg(long)]
    pub first_keyfile: Option<String>,

    /// Keyfile for the second database
    #[arg(long)]
    pub second_keyfile: Option<String>,

    /// Label used for the first database in reports (defaults to the file name)
    #[arg(long)]
    pub first_label: Option<String>,

    /// Label used for the second database in reports
    #[arg(long)]
    pub second_label: Option<String>,

    #[arg(long, default_value = "./reports")]
    pub output_path: String,

    /// Report formats to write
    #[arg(long, value_delimiter = ',', default_value = "csv,json")]
    pub formats: Vec<String>,

    /// Bundle all reports into a single ZIP archive
    #[arg(long)]
    pub bundle: bool,

    /// Enable verbose output
    #[arg(long)]
    pub verbose: bool,

    /// Log process CPU/memory usage per phase
    #[arg(long)]
    pub monitor: bool,
}

#[cfg(feature = "cli")]
impl CliConfig {
    /// Resolve both databases into locators, prompting for passwords that were
    /// given neither as arguments nor through the environment.
    pub fn compare_job(&self) -> Result<CompareJob> {
        let first = resolve_locator(
            "first",
            &self.first,
            self.first_password.clone(),
            self.first_keyfile.clone(),
            self.first_label.clone(),
            "KPDIFF_FIRST_PASSWORD",
        )?;
        let second = resolve_locator(
            "second",
            &self.second,
            self.second_password.clone(),
            self.second_keyfile.clone(),
            self.second_label.clone(),
            "KPDIFF_SECOND_PASSWORD",
        )?;

        Ok(CompareJob {
            first,
            second,
            output_path: self.output_path.clone(),
            formats: self.formats.clone(),
            bundle: self.bundle,
        })
    }
}

/// Password precedence: explicit argument, then environment variable, then an
/// interactive prompt. A keyfile-only database skips the prompt.
#[cfg(feature = "cli")]
fn resolve_locator(
    side: &str,
    path: &str,
    password: Option<String>,
    keyfile: Option<String>,
    label: Option<String>,
    env_var: &str,
) -> Result<VaultLocator> {
    let password = match password {
        Some(p) => Some(p),
        None => match std::env::var(env_var) {
            Ok(p) => Some(p),
            Err(_) if keyfile.is_some() => None,
            Err(_) => Some(prompt_password(side, path)?),
        },
    };

    Ok(VaultLocator {
        path: path.to_string(),
        password,
        keyfile,
        label,
    })
}

#[cfg(feature = "cli")]
fn prompt_password(side: &str, path: &str) -> Result<String> {
    print!("Enter password for {} database ({}): ", side, path);
    std::io::stdout().flush()?;

    rpassword::read_password().map_err(|e| DiffError::ConfigError {
        message: format!("Failed to read password: {}", e),
    })
}

#[cfg(feature = "cli")]
impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validation::validate_path("first", &self.first)?;
        validation::validate_path("second", &self.second)?;
        validation::validate_file_extensions(
            "databases",
            &[self.first.clone(), self.second.clone()],
            &["kdbx"],
        )?;

        if let Some(keyfile) = &self.first_keyfile {
            validation::validate_non_empty_string("first_keyfile", keyfile)?;
        }
        if let Some(keyfile) = &self.second_keyfile {
            validation::validate_non_empty_string("second_keyfile", keyfile)?;
        }

        validation::validate_path("output_path", &self.output_path)?;
        validation::validate_allowed_values("formats", &self.formats, REPORT_FORMATS)?;

        Ok(())
    }
}
