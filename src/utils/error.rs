use thiserror::Error;

#[derive(Error, Debug)]
pub enum VerifierError {
    #[error("Backing store '{store}' unavailable: {message}")]
    BackingStoreUnavailable { store: String, message: String },

    #[error("Clarifier failed: {message}")]
    ClarifierError { message: String },

    #[error("HTTP request failed: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Configuration error in '{field}': {message}")]
    ConfigValidationError { field: String, message: String },

    #[error("Invalid value '{value}' for '{field}': {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Missing required configuration field '{field}'")]
    MissingConfigError { field: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Infrastructure,
    Clarifier,
    Data,
    Configuration,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl VerifierError {
    pub fn backing_store(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self::BackingStoreUnavailable {
            store: store.into(),
            message: message.into(),
        }
    }

    pub fn clarifier(message: impl Into<String>) -> Self {
        Self::ClarifierError {
            message: message.into(),
        }
    }

    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::BackingStoreUnavailable { .. } | Self::HttpError(_) | Self::IoError(_) => {
                ErrorCategory::Infrastructure
            }
            Self::ClarifierError { .. } => ErrorCategory::Clarifier,
            Self::CsvError(_) | Self::SerializationError(_) => ErrorCategory::Data,
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => ErrorCategory::Configuration,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self.category() {
            // advisory only, a verdict is still produced
            ErrorCategory::Clarifier => ErrorSeverity::Low,
            ErrorCategory::Infrastructure => ErrorSeverity::Medium,
            ErrorCategory::Data => ErrorSeverity::High,
            ErrorCategory::Configuration => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> &'static str {
        match self {
            Self::BackingStoreUnavailable { .. } => {
                "Check that the schedule spreadsheet is reachable and shared with the configured credentials, then retry"
            }
            Self::HttpError(_) => "Check network connectivity and the configured endpoints, then retry",
            Self::ClarifierError { .. } => {
                "The clarifier is advisory; check its endpoint and API key or disable it under [clarifier]"
            }
            Self::IoError(_) => "Check that the referenced files exist and are readable",
            Self::CsvError(_) => "Check that the roster CSV has a header row and consistent columns",
            Self::SerializationError(_) => "Check that the JSON input is well-formed",
            Self::ConfigError { .. }
            | Self::ConfigValidationError { .. }
            | Self::InvalidConfigValueError { .. }
            | Self::MissingConfigError { .. } => {
                "Fix the configuration file; see the field named in the error"
            }
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self {
            Self::BackingStoreUnavailable { store, .. } => {
                format!("The schedule ({store}) could not be read; availability is unknown")
            }
            Self::ClarifierError { .. } => "No clarification could be produced".to_string(),
            Self::MissingConfigError { field } => format!("Configuration is missing '{field}'"),
            Self::InvalidConfigValueError { field, reason, .. } => {
                format!("Configuration value '{field}' is invalid: {reason}")
            }
            other => other.to_string(),
        }
    }
}

pub type Result<T> = std::result::Result<T, VerifierError>;
