//! Error types for the Colloquy engine.

use serde::Serialize;
use thiserror::Error;

/// A shared error type for the entire Colloquy workspace.
///
/// This provides typed, structured error variants with automatic conversion
/// from common error types via the `From` trait.
#[derive(Error, Debug, Clone, Serialize)]
pub enum ColloquyError {
    /// Entity not found error with type information
    #[error("Entity not found: {entity_type} '{id}'")]
    NotFound {
        entity_type: &'static str,
        id: String,
    },

    /// IO error (file system operations)
    #[error("IO error: {message}")]
    Io { message: String },

    /// Context storage error (backend get/put failed)
    #[error("Storage error: {0}")]
    Storage(String),

    /// Serialization/deserialization error
    #[error("Serialization error: {format} - {message}")]
    Serialization {
        format: String, // "TOML", "JSON", etc.
        message: String,
    },

    /// Script definition error (validation at build time)
    #[error("Script error: {0}")]
    Script(String),

    /// A pre-transition or pre-response hook raised
    #[error("Hook '{name}' failed: {message}")]
    Hook { name: String, message: String },

    /// A transition condition raised while being evaluated
    #[error("Condition error: {0}")]
    Condition(String),

    /// The primary response generator raised
    #[error("Response generation error: {0}")]
    ResponseGeneration(String),

    /// The fallback response generator itself raised (turn-fatal)
    #[error("Fallback response error: {0}")]
    Fallback(String),

    /// A service handler exceeded its timeout
    #[error("Service '{name}' timed out after {ms}ms")]
    Timeout { name: String, ms: u64 },

    /// Orchestrator execution error
    #[error("Execution error: {0}")]
    Execution(String),

    /// Internal error (should not happen in normal operation)
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ColloquyError {
    // ============================================================================
    // Constructor helpers
    // ============================================================================

    /// Creates a NotFound error
    pub fn not_found(entity_type: &'static str, id: impl Into<String>) -> Self {
        Self::NotFound {
            entity_type,
            id: id.into(),
        }
    }

    /// Creates an IO error
    pub fn io(message: impl Into<String>) -> Self {
        Self::Io {
            message: message.into(),
        }
    }

    /// Creates a Storage error
    pub fn storage(message: impl Into<String>) -> Self {
        Self::Storage(message.into())
    }

    /// Creates a Script error
    pub fn script(message: impl Into<String>) -> Self {
        Self::Script(message.into())
    }

    /// Creates a Hook error
    pub fn hook(name: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Hook {
            name: name.into(),
            message: message.into(),
        }
    }

    /// Creates a Condition error
    pub fn condition(message: impl Into<String>) -> Self {
        Self::Condition(message.into())
    }

    /// Creates a ResponseGeneration error
    pub fn response_generation(message: impl Into<String>) -> Self {
        Self::ResponseGeneration(message.into())
    }

    /// Creates a Fallback error
    pub fn fallback(message: impl Into<String>) -> Self {
        Self::Fallback(message.into())
    }

    /// Creates a Timeout error
    pub fn timeout(name: impl Into<String>, ms: u64) -> Self {
        Self::Timeout {
            name: name.into(),
            ms,
        }
    }

    /// Creates an Execution error
    pub fn execution(message: impl Into<String>) -> Self {
        Self::Execution(message.into())
    }

    /// Creates an Internal error
    pub fn internal(message: impl Into<String>) -> Self {
        Self::Internal(message.into())
    }

    // ============================================================================
    // Type checking methods
    // ============================================================================

    /// Check if this is a NotFound error
    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound { .. })
    }

    /// Check if this is a Storage error
    pub fn is_storage(&self) -> bool {
        matches!(self, Self::Storage(_))
    }

    /// Check if this is a Script error
    pub fn is_script(&self) -> bool {
        matches!(self, Self::Script(_))
    }

    /// Check if this is a Fallback error
    pub fn is_fallback(&self) -> bool {
        matches!(self, Self::Fallback(_))
    }

    /// Check if this is a Timeout error
    pub fn is_timeout(&self) -> bool {
        matches!(self, Self::Timeout { .. })
    }
}

// ============================================================================
// From implementations for automatic conversion
// ============================================================================

impl From<std::io::Error> for ColloquyError {
    fn from(err: std::io::Error) -> Self {
        Self::Io {
            message: format!("{} (kind: {:?})", err, err.kind()),
        }
    }
}

impl From<serde_json::Error> for ColloquyError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization {
            format: "JSON".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::de::Error> for ColloquyError {
    fn from(err: toml::de::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

impl From<toml::ser::Error> for ColloquyError {
    fn from(err: toml::ser::Error) -> Self {
        Self::Serialization {
            format: "TOML".to_string(),
            message: err.to_string(),
        }
    }
}

/// Conversion from String (for error messages)
impl From<String> for ColloquyError {
    fn from(err: String) -> Self {
        Self::Internal(err)
    }
}

/// A type alias for `Result<T, ColloquyError>`.
pub type Result<T> = std::result::Result<T, ColloquyError>;
