use crate::config::{CompareJob, REPORT_FORMATS};
use crate::domain::ports::VaultLocator;
use crate::utils::error::{DiffError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// A comparison job described by a TOML file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobConfig {
    pub job: JobSection,
    pub first: VaultSection,
    pub second: VaultSection,
    pub report: ReportSection,
    pub monitoring: Option<MonitoringSection>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct JobSection {
    pub name: String,
    pub description: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VaultSection {
    pub path: String,
    /// Inline password; usually written as "${SOME_VAR}" and substituted.
    pub password: Option<String>,
    /// Name of an environment variable holding the master password.
    pub password_env: Option<String>,
    pub keyfile: Option<String>,
    pub label: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ReportSection {
    pub output_path: String,
    pub formats: Vec<String>,
    pub bundle: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MonitoringSection {
    pub enabled: bool,
}

impl JobConfig {
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(DiffError::IoError)?;
        Self::from_toml_str(&content)
    }

    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| DiffError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// Replace `${VAR_NAME}` with the variable's value; unknown variables are
    /// left as-is so validation can point at them.
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").unwrap();

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        validation::validate_non_empty_string("job.name", &self.job.name)?;

        validate_vault_section("first", &self.first)?;
        validate_vault_section("second", &self.second)?;

        validation::validate_path("report.output_path", &self.report.output_path)?;
        validation::validate_allowed_values(
            "report.formats",
            &self.report.formats,
            REPORT_FORMATS,
        )?;

        Ok(())
    }

    /// Resolve the job into locators, reading `password_env` variables now so
    /// a missing variable fails before any database is touched.
    pub fn compare_job(&self) -> Result<CompareJob> {
        Ok(CompareJob {
            first: resolve_vault_section("first", &self.first)?,
            second: resolve_vault_section("second", &self.second)?,
            output_path: self.report.output_path.clone(),
            formats: self.report.formats.clone(),
            bundle: self.report.bundle.unwrap_or(false),
        })
    }

    pub fn monitoring_enabled(&self) -> bool {
        self.monitoring.as_ref().map(|m| m.enabled).unwrap_or(false)
    }
}

fn validate_vault_section(section: &str, vault: &VaultSection) -> Result<()> {
    let path_field = format!("{}.path", section);
    validation::validate_path(&path_field, &vault.path)?;
    validation::validate_file_extensions(&path_field, &[vault.path.clone()], &["kdbx"])?;

    if vault.password.is_none() && vault.password_env.is_none() && vault.keyfile.is_none() {
        return Err(DiffError::MissingConfigError {
            field: format!(
                "{}.password, {}.password_env or {}.keyfile",
                section, section, section
            ),
        });
    }

    Ok(())
}

fn resolve_vault_section(section: &str, vault: &VaultSection) -> Result<VaultLocator> {
    let password = match (&vault.password, &vault.password_env) {
        (Some(password), _) => Some(password.clone()),
        (None, Some(env_var)) => {
            Some(
                std::env::var(env_var).map_err(|_| DiffError::MissingConfigError {
                    field: format!("environment variable {} ({}.password_env)", env_var, section),
                })?,
            )
        }
        (None, None) => None,
    };

    Ok(VaultLocator {
        path: vault.path.clone(),
        password,
        keyfile: vault.keyfile.clone(),
        label: vault.label.clone(),
    })
}

impl Validate for JobConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
