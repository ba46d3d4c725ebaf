//! XMI-like model loading
//!
//! This crate handles:
//! - Parsing the class/aggregation document
//! - Folding aggregations into each container's children
//! - Containment traversal (descendants, cycles, reachability)

pub mod document;
pub mod hierarchy;

pub use document::{parse_document, ParsedDocument};
pub use hierarchy::{attach_children, ContainmentTree, OutlineNode};

use xmigen_core::{ClassTable, ModelError};

impl ParsedDocument {
    /// Fold the parsed edges into the parsed classes
    pub fn into_class_table(self) -> ClassTable {
        attach_children(self.classes, &self.edges)
    }
}

/// Parse a document and attach children in one step
pub fn load_model(text: &str) -> Result<ClassTable, ModelError> {
    Ok(parse_document(text)?.into_class_table())
}
