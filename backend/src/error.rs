//! Error types for the planning pipeline.
//!
//! Only [`PlannerError::InvalidInput`] and [`PlannerError::Configuration`] ever
//! reach a caller of the planner. Service and output problems are absorbed by
//! the normalizer and surface as the `error` field of a fallback plan.

use std::fmt;

/// Result type for planner operations
pub type PlannerResult<T> = Result<T, PlannerError>;

/// Structured context for planner errors.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ErrorContext {
    /// The operation being performed (e.g., "parse_session_date", "generate")
    pub operation: Option<String>,
    /// The input field involved, if any
    pub field: Option<String>,
    /// Additional details about the error
    pub details: Option<String>,
}

impl ErrorContext {
    /// Create a new error context with an operation name.
    pub fn new(operation: impl Into<String>) -> Self {
        Self {
            operation: Some(operation.into()),
            ..Default::default()
        }
    }

    /// Set the offending field.
    pub fn with_field(mut self, field: impl Into<String>) -> Self {
        self.field = Some(field.into());
        self
    }

    /// Set additional details.
    pub fn with_details(mut self, details: impl Into<String>) -> Self {
        self.details = Some(details.into());
        self
    }
}

impl fmt::Display for ErrorContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut parts = Vec::new();
        if let Some(ref op) = self.operation {
            parts.push(format!("operation={}", op));
        }
        if let Some(ref field) = self.field {
            parts.push(format!("field={}", field));
        }
        if let Some(ref details) = self.details {
            parts.push(format!("details={}", details));
        }
        write!(f, "[{}]", parts.join(", "))
    }
}

/// Error type for the planning pipeline
#[derive(Debug, thiserror::Error)]
pub enum PlannerError {
    /// Caller supplied an unparseable date or an empty location/equipment.
    /// Raised before any external call is made.
    #[error("Invalid input: {message} {context}")]
    InvalidInput {
        message: String,
        context: ErrorContext,
    },

    /// Timeout, transport error, or quota exhaustion at the reasoning service.
    #[error("Service unavailable: {message} {context}")]
    ServiceUnavailable {
        message: String,
        context: ErrorContext,
    },

    /// The service answered but its text could not be turned into a plan.
    #[error("Malformed output: {message} {context}")]
    MalformedOutput {
        message: String,
        context: ErrorContext,
    },

    /// Configuration could not be read or is out of range.
    #[error("Configuration error: {message} {context}")]
    Configuration {
        message: String,
        context: ErrorContext,
    },
}

impl PlannerError {
    /// Create an invalid input error with context.
    pub fn invalid_input_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::InvalidInput {
            message: message.into(),
            context,
        }
    }

    /// Create a malformed output error with context.
    pub fn malformed_output_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::MalformedOutput {
            message: message.into(),
            context,
        }
    }

    /// Create a configuration error.
    pub fn configuration(message: impl Into<String>) -> Self {
        Self::Configuration {
            message: message.into(),
            context: ErrorContext::default(),
        }
    }

    /// Create a configuration error with context.
    pub fn configuration_with_context(message: impl Into<String>, context: ErrorContext) -> Self {
        Self::Configuration {
            message: message.into(),
            context,
        }
    }

    /// Get the error context.
    pub fn context(&self) -> &ErrorContext {
        match self {
            Self::InvalidInput { context, .. }
            | Self::ServiceUnavailable { context, .. }
            | Self::MalformedOutput { context, .. }
            | Self::Configuration { context, .. } => context,
        }
    }

    /// Get the bare error message without context.
    pub fn message(&self) -> &str {
        match self {
            Self::InvalidInput { message, .. }
            | Self::ServiceUnavailable { message, .. }
            | Self::MalformedOutput { message, .. }
            | Self::Configuration { message, .. } => message,
        }
    }

    /// Whether this error was caused by the caller's input.
    pub fn is_invalid_input(&self) -> bool {
        matches!(self, Self::InvalidInput { .. })
    }
}
