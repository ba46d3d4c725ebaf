//! Diagnostic codes for model checks
//!
//! IMPORTANT: Diagnostic codes are stable.
//! Do not rename or remove codes - config files refer to them by name.

use serde::{Deserialize, Serialize};

/// Diagnostic code registry
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum DiagnosticCode {
    // References
    /// Aggregation target is not a declared class
    DanglingTarget,

    /// Aggregation source is not a declared class
    DanglingSource,

    // Roots
    /// No class is marked as root
    NoRootClass,

    /// More than one class is marked as root
    MultipleRoots,

    // Structure
    /// A class name is declared more than once
    DuplicateClass,

    /// A class is contained with different multiplicities by different edges
    ConflictingMultiplicity,

    /// Multiplicity token is not of the form `n` or `n..m`
    InvalidMultiplicity,

    /// Containment relation has a cycle
    ContainmentCycle,

    /// Class cannot be reached from the root
    UnreachableClass,
}

impl DiagnosticCode {
    /// Get the diagnostic code as a stable string identifier
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DanglingTarget => "DANGLING_TARGET",
            Self::DanglingSource => "DANGLING_SOURCE",
            Self::NoRootClass => "NO_ROOT_CLASS",
            Self::MultipleRoots => "MULTIPLE_ROOTS",
            Self::DuplicateClass => "DUPLICATE_CLASS",
            Self::ConflictingMultiplicity => "CONFLICTING_MULTIPLICITY",
            Self::InvalidMultiplicity => "INVALID_MULTIPLICITY",
            Self::ContainmentCycle => "CONTAINMENT_CYCLE",
            Self::UnreachableClass => "UNREACHABLE_CLASS",
        }
    }

    /// Severity used when the config has no override
    pub fn default_severity(&self) -> Severity {
        match self {
            Self::NoRootClass | Self::MultipleRoots | Self::DuplicateClass | Self::ContainmentCycle => {
                Severity::Error
            }
            Self::DanglingTarget
            | Self::DanglingSource
            | Self::ConflictingMultiplicity
            | Self::InvalidMultiplicity => Severity::Warn,
            Self::UnreachableClass => Severity::Info,
        }
    }
}

impl std::fmt::Display for DiagnosticCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Diagnostic severity level
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message
    Info,

    /// Warning - output is still generated but may not be what was intended
    Warn,

    /// Error - generation would fail or is undefined
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warn => write!(f, "warn"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// A diagnostic message with structured metadata
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Diagnostic {
    /// Stable diagnostic code
    pub code: DiagnosticCode,

    /// Severity level
    pub severity: Severity,

    /// Human-readable message
    pub message: String,

    /// Class the diagnostic is about, if any
    #[serde(skip_serializing_if = "Option::is_none")]
    pub class: Option<String>,

    /// Expected value (for comparison diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub expected: Option<String>,

    /// Actual value (for comparison diagnostics)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub actual: Option<String>,

    /// Other classes involved
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub related: Vec<String>,
}

impl Diagnostic {
    /// Create a new diagnostic with minimal fields
    pub fn new(code: DiagnosticCode, severity: Severity, message: impl Into<String>) -> Self {
        Self {
            code,
            severity,
            message: message.into(),
            class: None,
            expected: None,
            actual: None,
            related: Vec::new(),
        }
    }

    /// Create a diagnostic at the code's default severity
    pub fn of(code: DiagnosticCode, message: impl Into<String>) -> Self {
        Self::new(code, code.default_severity(), message)
    }

    /// Set the class
    pub fn with_class(mut self, class: impl Into<String>) -> Self {
        self.class = Some(class.into());
        self
    }

    /// Set expected/actual values
    pub fn with_comparison(mut self, expected: impl Into<String>, actual: impl Into<String>) -> Self {
        self.expected = Some(expected.into());
        self.actual = Some(actual.into());
        self
    }

    /// Set related classes
    pub fn with_related(mut self, related: Vec<String>) -> Self {
        self.related = related;
        self
    }
}
