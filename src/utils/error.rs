use thiserror::Error;

#[derive(Error, Debug)]
pub enum DiffError {
    #[error("Failed to open database: {0}")]
    KdbxError(#[from] keepass::error::DatabaseOpenError),

    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

/// Severity drives the CLI exit code.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl DiffError {
    pub fn severity(&self) -> ErrorSeverity {
        match self {
            DiffError::KdbxError(_) => ErrorSeverity::High,
            DiffError::ZipError(_) => ErrorSeverity::High,
            DiffError::CsvError(_) => ErrorSeverity::High,
            DiffError::IoError(_) => ErrorSeverity::Critical,
            DiffError::SerializationError(_) => ErrorSeverity::High,
            DiffError::ConfigError { .. } => ErrorSeverity::Medium,
            DiffError::InvalidConfigValueError { .. } => ErrorSeverity::Medium,
            DiffError::MissingConfigError { .. } => ErrorSeverity::Medium,
            DiffError::ProcessingError { .. } => ErrorSeverity::High,
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            DiffError::KdbxError(e) => format!("Could not open the database: {}", e),
            DiffError::ZipError(e) => format!("Could not create the report archive: {}", e),
            DiffError::CsvError(e) => format!("Could not build the report table: {}", e),
            DiffError::IoError(e) => format!("File system error: {}", e),
            DiffError::SerializationError(e) => format!("Could not serialize the report: {}", e),
            DiffError::ConfigError { message } => format!("Configuration problem: {}", message),
            DiffError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            DiffError::MissingConfigError { field } => {
                format!("Required setting '{}' was not provided", field)
            }
            DiffError::ProcessingError { message } => format!("Comparison failed: {}", message),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            DiffError::KdbxError(_) => {
                "Check the database path, master password and keyfile, then try again"
            }
            DiffError::ZipError(_) | DiffError::CsvError(_) | DiffError::SerializationError(_) => {
                "Re-run the comparison; if the problem persists the output directory may be unwritable"
            }
            DiffError::IoError(_) => "Verify the file paths exist and are readable/writable",
            DiffError::ConfigError { .. }
            | DiffError::InvalidConfigValueError { .. }
            | DiffError::MissingConfigError { .. } => {
                "Fix the configuration value (see --help or the job file) and try again"
            }
            DiffError::ProcessingError { .. } => {
                "Re-run with --verbose to see which entry triggered the failure"
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, DiffError>;
