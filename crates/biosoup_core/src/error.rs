//! Error types for the evolutionary core.
//!
//! Contract violations surface here as typed errors. Operations that can degrade locally
//! (a skipped CPPN cell, an unexpressed substrate link, an exhausted add-link search) do not.

use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq)]
pub enum CoreError {
    /// A required genome was not supplied.
    #[error("Missing genome: {0}")]
    MissingGenome(&'static str),

    /// A genome violates a structural invariant.
    #[error("Invalid genome: {0}")]
    InvalidGenome(String),

    /// Input vector length differs from the network's sensor count.
    #[error("Input mismatch: expected {expected} values, got {got}")]
    InputMismatch { expected: usize, got: usize },

    #[error("Sensor load error: {0}")]
    SensorLoad(String),

    /// Activation produced a non-finite value or could not run.
    #[error("Activation error: {0}")]
    Activation(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Serialization error: {0}")]
    Serialization(String),

    /// Generic error with context
    #[error("{context}: {source}")]
    Context {
        context: String,
        source: Box<CoreError>,
    },
}

/// Result type alias for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;

impl CoreError {
    #[must_use]
    pub fn invalid_genome<S: Into<String>>(msg: S) -> Self {
        Self::InvalidGenome(msg.into())
    }

    #[must_use]
    pub fn sensor_load<S: Into<String>>(msg: S) -> Self {
        Self::SensorLoad(msg.into())
    }

    #[must_use]
    pub fn activation<S: Into<String>>(msg: S) -> Self {
        Self::Activation(msg.into())
    }

    #[must_use]
    pub fn config<S: Into<String>>(msg: S) -> Self {
        Self::Config(msg.into())
    }

    #[must_use]
    pub fn serialization<S: Into<String>>(msg: S) -> Self {
        Self::Serialization(msg.into())
    }

    /// Wraps an error with additional context.
    #[must_use]
    pub fn with_context<S: Into<String>>(self, context: S) -> Self {
        Self::Context {
            context: context.into(),
            source: Box::new(self),
        }
    }

    /// True for caller-side contract violations.
    pub fn is_contract_violation(&self) -> bool {
        match self {
            Self::MissingGenome(_) | Self::InputMismatch { .. } => true,
            Self::Context { source, .. } => source.is_contract_violation(),
            _ => false,
        }
    }
}

impl From<serde_json::Error> for CoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
