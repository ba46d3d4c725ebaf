//! xmigen Core
//!
//! Class model types shared by the loader, the generators and the CLI.
//! Never rename diagnostic codes - they are part of the config format.

pub mod model;
pub mod error;
pub mod diagnostic;
pub mod report;
pub mod config;

pub use model::{Attribute, Multiplicity, ChildRef, ClassDef, AggregationEdge, ClassTable, Parameter, MetaEntry};
pub use error::ModelError;
pub use diagnostic::{Diagnostic, DiagnosticCode, Severity};
pub use report::{Report, ReportSummary, ReportVersion, fingerprint};
pub use config::{Config, CheckConfig, ConfigError, SeverityThreshold};
