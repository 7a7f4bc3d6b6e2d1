use thiserror::Error;

#[derive(Error, Debug)]
pub enum TrackerError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("Service returned HTTP {status} for {url}")]
    HttpStatus { status: u16, url: String },

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

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Data,
    Configuration,
    Input,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl TrackerError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            TrackerError::ApiError(_) | TrackerError::HttpStatus { .. } => ErrorCategory::Network,
            TrackerError::CsvError(_) | TrackerError::SerializationError(_) => ErrorCategory::Data,
            TrackerError::ConfigError { .. }
            | TrackerError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            TrackerError::ValidationError { .. } => ErrorCategory::Input,
            TrackerError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            ErrorCategory::Input => ErrorSeverity::Low,
            ErrorCategory::Network => ErrorSeverity::Medium,
            ErrorCategory::Data | ErrorCategory::Configuration => ErrorSeverity::High,
            ErrorCategory::System => ErrorSeverity::Critical,
        }
    }

    /// Short message suitable for the terminal, without transport internals.
    pub fn user_friendly_message(&self) -> String {
        match self {
            TrackerError::ApiError(e) if e.is_connect() => {
                "Could not reach the classification service".to_string()
            }
            TrackerError::ApiError(e) if e.is_timeout() => {
                "The classification service did not answer in time".to_string()
            }
            TrackerError::ApiError(_) | TrackerError::HttpStatus { .. } => {
                "The classification service rejected the request".to_string()
            }
            TrackerError::SerializationError(_) => {
                "The classification service sent a response that could not be read".to_string()
            }
            TrackerError::CsvError(_) => "Could not write the CSV export".to_string(),
            TrackerError::IoError(e) => format!("File operation failed: {}", e),
            TrackerError::ConfigError { message } => format!("Configuration problem: {}", message),
            TrackerError::InvalidConfigValueError { field, reason, .. } => {
                format!("Invalid setting '{}': {}", field, reason)
            }
            TrackerError::ValidationError { message } => message.clone(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => {
                "Check that the backend is running and that --api-base points at its /api path"
            }
            ErrorCategory::Data => "Check the backend logs; the response format may have changed",
            ErrorCategory::Configuration => "Fix the configuration file or command line flags",
            ErrorCategory::Input => "Check the values you entered and try again",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

pub type Result<T> = std::result::Result<T, TrackerError>;
