use thiserror::Error;

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum ApplicationError {
    #[error("request method `{0}` is not accepted")]
    MethodNotAllowed(String),
    #[error("malformed interaction payload: {0}")]
    MalformedPayload(String),
    #[error("verification token mismatch")]
    Unauthorized,
    #[error("platform call failed: {0}")]
    PlatformCallFailed(String),
}

/// Caller-facing rejection. Carries a generic message only; details stay in logs.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum InterfaceError {
    #[error("method not allowed")]
    MethodNotAllowed { correlation_id: String },
    #[error("unauthorized")]
    Unauthorized { correlation_id: String },
    #[error("internal error: {message}")]
    Internal { message: String, correlation_id: String },
}

impl InterfaceError {
    pub fn user_message(&self) -> &'static str {
        match self {
            Self::MethodNotAllowed { .. } => "method not allowed",
            Self::Unauthorized { .. } => "unauthorized",
            Self::Internal { .. } => "internal error",
        }
    }

    pub fn correlation_id(&self) -> &str {
        match self {
            Self::MethodNotAllowed { correlation_id }
            | Self::Unauthorized { correlation_id }
            | Self::Internal { correlation_id, .. } => correlation_id,
        }
    }
}

impl ApplicationError {
    pub fn into_interface(self, correlation_id: impl Into<String>) -> InterfaceError {
        let correlation_id = correlation_id.into();
        match self {
            Self::MethodNotAllowed(_) => InterfaceError::MethodNotAllowed { correlation_id },
            Self::Unauthorized => InterfaceError::Unauthorized { correlation_id },
            Self::MalformedPayload(message) | Self::PlatformCallFailed(message) => {
                InterfaceError::Internal { message, correlation_id }
            }
        }
    }
}
