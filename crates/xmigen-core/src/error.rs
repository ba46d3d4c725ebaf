//! Model errors
//!
//! Every failure here aborts a run; no artifact is produced when one occurs.

/// Errors raised while loading a model or deriving artifacts from it
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ModelError {
    #[error("Malformed document: {0}")]
    MalformedDocument(String),

    #[error("<{element}> is missing required attribute '{field}'")]
    MissingField { element: String, field: String },

    #[error("No class is marked isRoot=\"true\"; metadata requires a root class")]
    RootRequired,

    #[error("Containment cycle detected: {}", path.join(" -> "))]
    CycleDetected { path: Vec<String> },

    #[error("Failed to serialize output: {0}")]
    Serialization(String),
}

impl ModelError {
    /// Shorthand for a missing attribute on an element
    pub fn missing_field(element: impl Into<String>, field: impl Into<String>) -> Self {
        Self::MissingField {
            element: element.into(),
            field: field.into(),
        }
    }
}
