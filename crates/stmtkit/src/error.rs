//! Error types for stmtkit

use thiserror::Error;

/// Result type alias for stmtkit operations
pub type StmtResult<T> = Result<T, StmtError>;

/// Error types for statement building.
///
/// Every failure is reported synchronously to the immediate caller. Nothing is
/// retried or recovered inside the builder; falling back (for example from a
/// changed-only update to a full update) is up to the caller.
#[derive(Debug, Error)]
pub enum StmtError {
    /// A supplied name could not be resolved to a column, or nothing matched at all.
    #[error("Mapping error on '{shape}': {message}")]
    Mapping { shape: String, message: String },

    /// A required input was missing or empty.
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// The argument lacks a capability the requested operation needs.
    #[error("Capability error: {0}")]
    Capability(String),

    /// A host property value could not be converted into a runtime value.
    #[error("Serialization error on property '{property}': {message}")]
    Serialization { property: String, message: String },

    /// A value rule failed to compute its value.
    #[error("Rule error on column '{column}': {message}")]
    Rule { column: String, message: String },
}

impl StmtError {
    /// Create a mapping error for a specific shape
    pub fn mapping(shape: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Mapping {
            shape: shape.into(),
            message: message.into(),
        }
    }

    /// Create a precondition error
    pub fn precondition(message: impl Into<String>) -> Self {
        Self::Precondition(message.into())
    }

    /// Create a capability error
    pub fn capability(message: impl Into<String>) -> Self {
        Self::Capability(message.into())
    }

    /// Create a serialization error for a host property
    pub fn serialization(property: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Serialization {
            property: property.into(),
            message: message.into(),
        }
    }

    /// Create a rule error for a column
    pub fn rule(column: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Rule {
            column: column.into(),
            message: message.into(),
        }
    }

    /// Check if this is a mapping error
    pub fn is_mapping(&self) -> bool {
        matches!(self, Self::Mapping { .. })
    }

    /// Check if this is a precondition error
    pub fn is_precondition(&self) -> bool {
        matches!(self, Self::Precondition(_))
    }

    /// Check if this is a capability error
    pub fn is_capability(&self) -> bool {
        matches!(self, Self::Capability(_))
    }

    /// Check if this is a rule error
    pub fn is_rule(&self) -> bool {
        matches!(self, Self::Rule { .. })
    }
}
