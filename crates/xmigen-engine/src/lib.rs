//! xmigen engine - artifact generation
//!
//! This crate implements:
//! - Sample instance generation
//! - Dependency-ordered metadata generation
//! - Model checks
//! - The end-to-end pipeline

pub mod instance;
pub mod metadata;
pub mod check;
pub mod pipeline;

pub use instance::{derive_instance, derive_instance_with, InstanceOptions};
pub use metadata::{build_metadata, dependency_order, derive_metadata, derive_metadata_with, MetadataOptions};
pub use check::{check_document, check_model};
pub use pipeline::{Artifacts, Pipeline, PipelineOptions};
pub use xmigen_xmi::load_model;
