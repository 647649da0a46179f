use thiserror::Error;

#[derive(Error, Debug)]
pub enum InviteError {
    #[error("{description}: {cause}")]
    InvalidArgument { description: String, cause: String },

    #[error("unexpected order by: '{value}'")]
    UnexpectedOrdering { value: String },

    #[error("operation canceled while {operation}")]
    Canceled { operation: String },

    #[error("{message}")]
    BadRequest { message: String },

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Internal error: {message}")]
    Internal { message: String },

    #[error("Configuration parse error: {0}")]
    ConfigParseError(#[from] toml::de::Error),

    #[error("Invalid configuration value for '{field}': {value} ({reason})")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("{context}: {source}")]
    Context {
        context: String,
        #[source]
        source: Box<InviteError>,
    },
}

/// Coarse classification used to decide how an error is surfaced to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    InvalidArgument,
    Canceled,
    BadRequest,
    Serialization,
    Config,
    Internal,
}

impl InviteError {
    pub fn invalid_argument(description: impl Into<String>, cause: impl std::fmt::Display) -> Self {
        InviteError::InvalidArgument {
            description: description.into(),
            cause: cause.to_string(),
        }
    }

    pub fn canceled(operation: impl Into<String>) -> Self {
        InviteError::Canceled {
            operation: operation.into(),
        }
    }

    pub fn internal(message: impl Into<String>) -> Self {
        InviteError::Internal {
            message: message.into(),
        }
    }

    /// Wraps the error with a description of the operation that was being attempted.
    pub fn context(self, context: impl Into<String>) -> Self {
        InviteError::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            InviteError::InvalidArgument { .. } | InviteError::UnexpectedOrdering { .. } => {
                ErrorKind::InvalidArgument
            }
            InviteError::Canceled { .. } => ErrorKind::Canceled,
            InviteError::BadRequest { .. } => ErrorKind::BadRequest,
            InviteError::SerializationError(_) => ErrorKind::Serialization,
            InviteError::ConfigParseError(_)
            | InviteError::InvalidConfigValueError { .. } => ErrorKind::Config,
            InviteError::IoError(_) | InviteError::Internal { .. } => {
                ErrorKind::Internal
            }
            InviteError::Context { source, .. } => source.kind(),
        }
    }

    pub fn is_canceled(&self) -> bool {
        self.kind() == ErrorKind::Canceled
    }
}

pub type Result<T> = std::result::Result<T, InviteError>;
