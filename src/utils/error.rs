use thiserror::Error;

#[derive(Error, Debug)]
pub enum EtlError {
    #[error("Zip operation failed: {0}")]
    ZipError(#[from] zip::result::ZipError),

    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("API returned HTTP {status}: {body}")]
    HttpStatusError { status: u16, body: String },

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Missing required configuration: {field}")]
    MissingConfigError { field: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Configuration validation failed for {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Validation error: {message}")]
    ValidationError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Storage,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl EtlError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorCategory::Network,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorCategory::Configuration,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. }
            | EtlError::ValidationError { .. } => ErrorCategory::Data,
            EtlError::IoError(_) | EtlError::ZipError(_) => ErrorCategory::Storage,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 429 and 5xx usually clear up on a later run
            EtlError::HttpStatusError { status, .. } if *status == 429 || *status >= 500 => {
                ErrorSeverity::Medium
            }
            EtlError::ApiError(e) if e.is_timeout() || e.is_connect() => ErrorSeverity::Medium,
            EtlError::ApiError(_) | EtlError::HttpStatusError { .. } => ErrorSeverity::High,
            EtlError::ConfigError { .. }
            | EtlError::MissingConfigError { .. }
            | EtlError::InvalidConfigValueError { .. }
            | EtlError::ConfigValidationError { .. } => ErrorSeverity::High,
            EtlError::CsvError(_)
            | EtlError::SerializationError(_)
            | EtlError::ProcessingError { .. }
            | EtlError::ValidationError { .. } => ErrorSeverity::High,
            EtlError::IoError(_) | EtlError::ZipError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            EtlError::ApiError(_) => {
                "Check your network connection and the OpenAlex API base URL".to_string()
            }
            EtlError::HttpStatusError { status, .. } if *status == 429 => {
                "OpenAlex is rate limiting requests; set OPENALEX_EMAIL and retry later".to_string()
            }
            EtlError::HttpStatusError { status, .. } if *status >= 500 => {
                "OpenAlex is having trouble; retry in a few minutes".to_string()
            }
            EtlError::HttpStatusError { .. } => {
                "Verify the author id and the request filter".to_string()
            }
            EtlError::MissingConfigError { field } => {
                format!("Provide a value for '{}' via CLI flag, env or config file", field)
            }
            EtlError::InvalidConfigValueError { field, .. }
            | EtlError::ConfigValidationError { field, .. } => {
                format!("Fix the '{}' setting and run again", field)
            }
            EtlError::ConfigError { .. } => "Review the configuration file".to_string(),
            EtlError::IoError(_) | EtlError::ZipError(_) => {
                "Check that the data and output directories exist and are writable".to_string()
            }
            EtlError::CsvError(_) | EtlError::SerializationError(_) => {
                "The input file may be corrupted; re-run the fetch step".to_string()
            }
            EtlError::ProcessingError { .. } | EtlError::ValidationError { .. } => {
                "Inspect the input data with --verbose for details".to_string()
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Could not fetch works from OpenAlex: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Could not process metrics data: {}", self),
            ErrorCategory::Storage => format!("Could not read or write files: {}", self),
        }
    }
}

pub type Result<T> = std::result::Result<T, EtlError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_http_status_severity() {
        let throttled = EtlError::HttpStatusError {
            status: 429,
            body: String::new(),
        };
        assert_eq!(throttled.severity(), ErrorSeverity::Medium);
        assert_eq!(throttled.category(), ErrorCategory::Network);

        let not_found = EtlError::HttpStatusError {
            status: 404,
            body: "not found".to_string(),
        };
        assert_eq!(not_found.severity(), ErrorSeverity::High);
    }

    #[test]
    fn test_missing_config_suggestion_names_field() {
        let err = EtlError::MissingConfigError {
            field: "author_id".to_string(),
        };
        assert!(err.recovery_suggestion().contains("author_id"));
        assert!(err.user_friendly_message().starts_with("Invalid configuration"));
    }
}
