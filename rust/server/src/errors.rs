//! Error reporting shared by every inbound operation.
//!
//! Errors are mapped to a machine-readable code, a message, optional
//! structured details and a severity that picks the log level.
use nothanks_engine::errors::{ErrorKind, GameError};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Standard error body relayed to clients
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ErrorResponse {
    /// Machine-readable error code (e.g., "session_not_found")
    pub error: String,
    /// Human-readable error message
    pub message: String,
    /// Optional additional details (structured data)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<serde_json::Value>,
}

impl ErrorResponse {
    pub fn new(error: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: None,
        }
    }

    pub fn with_details(
        error: impl Into<String>,
        message: impl Into<String>,
        details: serde_json::Value,
    ) -> Self {
        Self {
            error: error.into(),
            message: message.into(),
            details: Some(details),
        }
    }
}

impl fmt::Display for ErrorResponse {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.error, self.message)
    }
}

/// Error classification for logging levels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorSeverity {
    /// Rejected input or out-of-turn action; normal operation
    Client,
    /// Unexpected failure that needs investigation
    Server,
    /// System integrity at risk
    Critical,
}

/// Maps an error to an [`ErrorResponse`] and logs it at its severity.
pub trait IntoErrorResponse {
    /// Machine-readable code
    fn error_code(&self) -> &'static str;

    fn error_message(&self) -> String;

    fn error_details(&self) -> Option<serde_json::Value> {
        None
    }

    fn severity(&self) -> ErrorSeverity {
        ErrorSeverity::Client
    }

    fn to_error_response(&self) -> ErrorResponse {
        if let Some(details) = self.error_details() {
            ErrorResponse::with_details(self.error_code(), self.error_message(), details)
        } else {
            ErrorResponse::new(self.error_code(), self.error_message())
        }
    }

    /// Logs the error at its severity and returns the body to relay.
    fn logged_response(&self) -> ErrorResponse {
        let response = self.to_error_response();
        match self.severity() {
            ErrorSeverity::Client => {
                tracing::info!(code = %response.error, "client error: {}", response.message)
            }
            ErrorSeverity::Server => {
                tracing::error!(code = %response.error, "server error: {}", response.message)
            }
            ErrorSeverity::Critical => {
                tracing::error!(
                    code = %response.error,
                    critical = true,
                    "critical error: {}",
                    response.message
                )
            }
        }
        response
    }
}

pub fn kind_code(kind: ErrorKind) -> &'static str {
    match kind {
        ErrorKind::Validation => "validation_error",
        ErrorKind::State => "state_error",
        ErrorKind::Authorization => "authorization_error",
        ErrorKind::Capacity => "capacity_error",
        ErrorKind::NotFound => "not_found",
    }
}

impl IntoErrorResponse for GameError {
    fn error_code(&self) -> &'static str {
        kind_code(self.kind())
    }

    fn error_message(&self) -> String {
        self.to_string()
    }

    fn error_details(&self) -> Option<serde_json::Value> {
        match self {
            GameError::NotPlayersTurn { expected, actual } => Some(serde_json::json!({
                "expected": expected,
                "actual": actual,
            })),
            GameError::NotEnoughPlayers { min, actual } => Some(serde_json::json!({
                "min": min,
                "actual": actual,
            })),
            GameError::LobbyFull { max } | GameError::BotLimitReached { max } => {
                Some(serde_json::json!({ "max": max }))
            }
            _ => None,
        }
    }
}
