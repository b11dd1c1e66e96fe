use thiserror::Error;

#[derive(Error, Debug)]
pub enum AdapterError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("backend error {code}: {message}")]
    BackendError { code: i64, message: String },

    #[error("email and password combination is incorrect")]
    AuthenticationError,

    #[error("user not logged in")]
    SessionError,

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Configuration error in {field}: {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid config value for {field}: '{value}' ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required config field: {field}")]
    MissingConfigError { field: String },
}

pub type Result<T> = std::result::Result<T, AdapterError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Backend,
    Authentication,
    Data,
    Configuration,
    System,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl AdapterError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            AdapterError::ApiError(_) => ErrorCategory::Network,
            AdapterError::BackendError { .. } => ErrorCategory::Backend,
            AdapterError::AuthenticationError | AdapterError::SessionError => {
                ErrorCategory::Authentication
            }
            AdapterError::SerializationError(_) | AdapterError::ProcessingError { .. } => {
                ErrorCategory::Data
            }
            AdapterError::ConfigValidationError { .. }
            | AdapterError::InvalidConfigValueError { .. }
            | AdapterError::MissingConfigError { .. } => ErrorCategory::Configuration,
            AdapterError::IoError(_) => ErrorCategory::System,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            AdapterError::AuthenticationError | AdapterError::SessionError => ErrorSeverity::Low,
            AdapterError::ApiError(_) | AdapterError::BackendError { .. } => ErrorSeverity::Medium,
            AdapterError::SerializationError(_) | AdapterError::ProcessingError { .. } => {
                ErrorSeverity::High
            }
            AdapterError::ConfigValidationError { .. }
            | AdapterError::InvalidConfigValueError { .. }
            | AdapterError::MissingConfigError { .. }
            | AdapterError::IoError(_) => ErrorSeverity::Critical,
        }
    }

    /// 給終端用戶看的訊息（隱藏技術細節）
    pub fn user_friendly_message(&self) -> String {
        match self {
            AdapterError::ApiError(_) => "Could not reach the backend server.".to_string(),
            AdapterError::BackendError { code, message } => {
                format!("The backend rejected the request ({}: {}).", code, message)
            }
            AdapterError::AuthenticationError | AdapterError::SessionError => self.to_string(),
            AdapterError::SerializationError(_) | AdapterError::ProcessingError { .. } => {
                "Received data in an unexpected shape.".to_string()
            }
            AdapterError::ConfigValidationError { .. }
            | AdapterError::InvalidConfigValueError { .. }
            | AdapterError::MissingConfigError { .. } => {
                "The adapter configuration is invalid.".to_string()
            }
            AdapterError::IoError(_) => "A local file operation failed.".to_string(),
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self.category() {
            ErrorCategory::Network => "Check the server URL and your network connection",
            ErrorCategory::Backend => "Check the backend logs for the reported error code",
            ErrorCategory::Authentication => "Log in again with valid credentials",
            ErrorCategory::Data => "Inspect the stored object for a malformed payload",
            ErrorCategory::Configuration => "Fix the configuration file and retry",
            ErrorCategory::System => "Check file permissions and available disk space",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_carries_code_and_message() {
        let err = AdapterError::BackendError {
            code: 101,
            message: "object not found".to_string(),
        };
        assert_eq!(err.to_string(), "backend error 101: object not found");
        assert_eq!(err.category(), ErrorCategory::Backend);
        assert_eq!(err.severity(), ErrorSeverity::Medium);
    }

    #[test]
    fn test_authentication_error_is_fixed_message() {
        let err = AdapterError::AuthenticationError;
        assert_eq!(
            err.to_string(),
            "email and password combination is incorrect"
        );
        assert_eq!(err.user_friendly_message(), err.to_string());
        assert_eq!(err.severity(), ErrorSeverity::Low);
    }

    #[test]
    fn test_config_errors_are_critical() {
        let err = AdapterError::MissingConfigError {
            field: "server.url".to_string(),
        };
        assert_eq!(err.severity(), ErrorSeverity::Critical);
        assert_eq!(err.category(), ErrorCategory::Configuration);
    }
}
