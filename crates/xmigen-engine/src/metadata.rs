//! Metadata generation
//!
//! Produces one [`MetaEntry`] per class and orders them so that every class
//! appears after all classes nested beneath it, with the root last.

use serde::Serialize;
use serde_json::ser::{Formatter, PrettyFormatter};
use std::io;
use xmigen_core::{ClassTable, MetaEntry, ModelError};

/// Output formatting for the metadata document
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MetadataOptions {
    /// JSON indentation width
    pub indent: usize,
}

impl Default for MetadataOptions {
    fn default() -> Self {
        Self { indent: 4 }
    }
}

/// Derive the metadata document with default (4-space) indentation
pub fn derive_metadata(classes: &ClassTable) -> Result<String, ModelError> {
    derive_metadata_with(classes, MetadataOptions::default())
}

/// Derive the metadata document as indented JSON
pub fn derive_metadata_with(classes: &ClassTable, options: MetadataOptions) -> Result<String, ModelError> {
    let entries = build_metadata(classes)?;

    let indent = " ".repeat(options.indent);
    let formatter = AsciiFormatter {
        pretty: PrettyFormatter::with_indent(indent.as_bytes()),
    };
    let mut buffer = Vec::new();
    let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);

    entries
        .serialize(&mut serializer)
        .map_err(|e| ModelError::Serialization(e.to_string()))?;

    String::from_utf8(buffer)
        .map_err(|e| ModelError::Serialization(format!("UTF-8 conversion error: {}", e)))
}

/// Pretty-printing formatter that writes non-ASCII characters as `\uXXXX`
/// escapes (UTF-16 code units, lowercase hex)
struct AsciiFormatter<'a> {
    pretty: PrettyFormatter<'a>,
}

impl Formatter for AsciiFormatter<'_> {
    fn begin_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_array(writer)
    }

    fn end_array<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array(writer)
    }

    fn begin_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_array_value(writer, first)
    }

    fn end_array_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_array_value(writer)
    }

    fn begin_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object(writer)
    }

    fn end_object<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object(writer)
    }

    fn begin_object_key<W: ?Sized + io::Write>(&mut self, writer: &mut W, first: bool) -> io::Result<()> {
        self.pretty.begin_object_key(writer, first)
    }

    fn begin_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.begin_object_value(writer)
    }

    fn end_object_value<W: ?Sized + io::Write>(&mut self, writer: &mut W) -> io::Result<()> {
        self.pretty.end_object_value(writer)
    }

    fn write_string_fragment<W: ?Sized + io::Write>(&mut self, writer: &mut W, fragment: &str) -> io::Result<()> {
        let mut start = 0;

        for (offset, ch) in fragment.char_indices() {
            if ch.is_ascii() {
                continue;
            }

            writer.write_all(fragment[start..offset].as_bytes())?;
            let mut units = [0u16; 2];
            for unit in ch.encode_utf16(&mut units) {
                write!(writer, "\\u{:04x}", unit)?;
            }
            start = offset + ch.len_utf8();
        }

        writer.write_all(fragment[start..].as_bytes())
    }
}

/// Build the ordered metadata entries
///
/// Entries start with bounds `1..1`; each containment overwrites the bounds
/// of the contained class, so when a class has several containers the one
/// declared last wins. Fails with [`ModelError::RootRequired`] when no class
/// is marked as root.
pub fn build_metadata(classes: &ClassTable) -> Result<Vec<MetaEntry>, ModelError> {
    // Entries are indexed like the table
    let mut entries: Vec<MetaEntry> = classes.iter().map(MetaEntry::from_class).collect();

    for class in classes.iter() {
        for child in &class.children {
            if let Some(index) = classes.index_of(&child.class) {
                entries[index].set_multiplicity(&child.multiplicity);
            }
        }
    }

    let order = dependency_order(classes)?;

    let mut slots: Vec<Option<MetaEntry>> = entries.into_iter().map(Some).collect();
    let ordered: Vec<MetaEntry> = order
        .into_iter()
        .filter_map(|index| slots.get_mut(index).and_then(Option::take))
        .collect();

    tracing::debug!(entries = ordered.len(), "built metadata entries");

    Ok(ordered)
}

/// Table indices in children-before-parent order, root last
///
/// Every class other than the root is visited in declaration order, then the
/// root. A class reachable from several parents is placed at its first visit.
pub fn dependency_order(classes: &ClassTable) -> Result<Vec<usize>, ModelError> {
    let root = classes.root().ok_or(ModelError::RootRequired)?;
    let root_index = classes.index_of(&root.name).ok_or(ModelError::RootRequired)?;

    let mut traversal = PostOrder::new(classes);

    for index in (0..classes.len()).filter(|index| *index != root_index) {
        traversal.visit(index)?;
    }
    traversal.visit(root_index)?;

    Ok(traversal.order)
}

/// Iterative depth-first post-order traversal with cycle detection
struct PostOrder<'a> {
    classes: &'a ClassTable,
    processed: Vec<bool>,
    on_path: Vec<bool>,
    order: Vec<usize>,
}

impl<'a> PostOrder<'a> {
    fn new(classes: &'a ClassTable) -> Self {
        Self {
            classes,
            processed: vec![false; classes.len()],
            on_path: vec![false; classes.len()],
            order: Vec::with_capacity(classes.len()),
        }
    }

    fn visit(&mut self, start: usize) -> Result<(), ModelError> {
        if self.processed[start] {
            return Ok(());
        }

        // (class index, index of the next child to visit)
        let mut stack: Vec<(usize, usize)> = vec![(start, 0)];
        self.on_path[start] = true;

        while let Some(&(index, next)) = stack.last() {
            let child = self
                .classes
                .get_index(index)
                .and_then(|class| class.children.get(next));

            let Some(child) = child else {
                stack.pop();
                self.on_path[index] = false;
                self.processed[index] = true;
                self.order.push(index);
                continue;
            };

            if let Some(top) = stack.last_mut() {
                top.1 += 1;
            }

            let Some(child_index) = self.classes.index_of(&child.class) else {
                continue;
            };

            if self.processed[child_index] {
                continue;
            }

            if self.on_path[child_index] {
                return Err(self.cycle(&stack, child_index));
            }

            self.on_path[child_index] = true;
            stack.push((child_index, 0));
        }

        Ok(())
    }

    fn cycle(&self, stack: &[(usize, usize)], closing: usize) -> ModelError {
        let from = stack.iter().position(|(index, _)| *index == closing).unwrap_or(0);
        let path = stack[from..]
            .iter()
            .map(|(index, _)| *index)
            .chain(std::iter::once(closing))
            .filter_map(|index| self.classes.get_index(index))
            .map(|class| class.name.clone())
            .collect();

        ModelError::CycleDetected { path }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use xmigen_core::{ClassDef, Multiplicity, Parameter};

    fn names(entries: &[MetaEntry]) -> Vec<&str> {
        entries.iter().map(|e| e.class.as_str()).collect()
    }

    fn bounds<'e>(entries: &'e [MetaEntry], class: &str) -> (&'e str, &'e str) {
        let entry = entries.iter().find(|e| e.class == class).unwrap();
        (entry.min.as_str(), entry.max.as_str())
    }

    #[test]
    fn project_with_task() {
        let classes: ClassTable = vec![
            ClassDef::new("Project")
                .with_root(true)
                .with_child("Task", Multiplicity::parse("0..*")),
            ClassDef::new("Task").with_attribute("title", "string"),
        ]
        .into_iter()
        .collect();

        let entries = build_metadata(&classes).unwrap();

        assert_eq!(names(&entries), vec!["Task", "Project"]);
        assert_eq!(bounds(&entries, "Task"), ("0", "*"));
        assert_eq!(bounds(&entries, "Project"), ("1", "1"));
        assert_eq!(entries[1].parameters, vec![Parameter::class("Task")]);
    }

    #[test]
    fn bounds_do_not_depend_on_declaration_order() {
        let child_first: ClassTable = vec![
            ClassDef::new("Task"),
            ClassDef::new("Project")
                .with_root(true)
                .with_child("Task", Multiplicity::parse("0..*")),
        ]
        .into_iter()
        .collect();

        let entries = build_metadata(&child_first).unwrap();
        assert_eq!(names(&entries), vec!["Task", "Project"]);
        assert_eq!(bounds(&entries, "Task"), ("0", "*"));
    }

    #[test]
    fn root_is_last_and_children_precede_parents() {
        let classes: ClassTable = vec![
            ClassDef::new("Root")
                .with_root(true)
                .with_child("A", Multiplicity::parse("1"))
                .with_child("B", Multiplicity::parse("0..1")),
            ClassDef::new("A").with_child("C", Multiplicity::parse("1..*")),
            ClassDef::new("B").with_child("C", Multiplicity::parse("0..*")),
            ClassDef::new("C").with_child("D", Multiplicity::parse("2")),
            ClassDef::new("D"),
        ]
        .into_iter()
        .collect();

        let entries = build_metadata(&classes).unwrap();

        assert_eq!(names(&entries), vec!["D", "C", "A", "B", "Root"]);
        assert_eq!(entries.len(), classes.len());
        assert_eq!(bounds(&entries, "D"), ("2", "2"));
    }

    #[test]
    fn conflicting_multiplicities_last_write_wins() {
        let classes: ClassTable = vec![
            ClassDef::new("Root")
                .with_root(true)
                .with_child("A", Multiplicity::parse("1"))
                .with_child("B", Multiplicity::parse("1")),
            ClassDef::new("A").with_child("Shared", Multiplicity::parse("0..*")),
            ClassDef::new("B").with_child("Shared", Multiplicity::parse("1..3")),
            ClassDef::new("Shared"),
        ]
        .into_iter()
        .collect();

        let entries = build_metadata(&classes).unwrap();

        assert_eq!(bounds(&entries, "Shared"), ("1", "3"));
        assert_eq!(names(&entries).iter().filter(|n| **n == "Shared").count(), 1);
    }

    #[test]
    fn orphans_default_to_one() {
        let classes: ClassTable = vec![
            ClassDef::new("Orphan").with_attribute("x", "int"),
            ClassDef::new("Root").with_root(true),
        ]
        .into_iter()
        .collect();

        let entries = build_metadata(&classes).unwrap();

        assert_eq!(names(&entries), vec!["Orphan", "Root"]);
        assert_eq!(bounds(&entries, "Orphan"), ("1", "1"));
    }

    #[test]
    fn additional_roots_are_kept_before_the_first() {
        let classes: ClassTable = vec![
            ClassDef::new("First").with_root(true),
            ClassDef::new("Second").with_root(true),
        ]
        .into_iter()
        .collect();

        let entries = build_metadata(&classes).unwrap();
        assert_eq!(names(&entries), vec!["Second", "First"]);
    }

    #[test]
    fn root_required() {
        let classes: ClassTable = vec![ClassDef::new("Task")].into_iter().collect();

        assert_eq!(build_metadata(&classes).unwrap_err(), ModelError::RootRequired);
        assert_eq!(derive_metadata(&classes).unwrap_err(), ModelError::RootRequired);
    }

    #[test]
    fn cycle_is_an_error() {
        let classes: ClassTable = vec![
            ClassDef::new("Root").with_root(true),
            ClassDef::new("A").with_child("B", Multiplicity::parse("1")),
            ClassDef::new("B").with_child("A", Multiplicity::parse("1")),
        ]
        .into_iter()
        .collect();

        assert_eq!(
            build_metadata(&classes).unwrap_err(),
            ModelError::CycleDetected {
                path: vec!["A".into(), "B".into(), "A".into()]
            }
        );
    }

    #[test]
    fn json_layout() {
        let classes: ClassTable = vec![ClassDef::new("Root")
            .with_root(true)
            .with_documentation("The root")]
        .into_iter()
        .collect();

        assert_eq!(
            derive_metadata(&classes).unwrap(),
            "[\n    {\n        \"class\": \"Root\",\n        \"documentation\": \"The root\",\n        \"isRoot\": true,\n        \"parameters\": [],\n        \"min\": \"1\",\n        \"max\": \"1\"\n    }\n]"
        );
    }

    #[test]
    fn json_indent_is_configurable() {
        let classes: ClassTable = vec![ClassDef::new("Root").with_root(true)].into_iter().collect();
        let text = derive_metadata_with(&classes, MetadataOptions { indent: 2 }).unwrap();

        assert!(text.starts_with("[\n  {\n    \"class\": \"Root\""));
    }

    #[test]
    fn non_ascii_is_escaped() {
        let classes: ClassTable = vec![ClassDef::new("Root")
            .with_root(true)
            .with_documentation("Café \"menu\" 😀")]
        .into_iter()
        .collect();

        let text = derive_metadata(&classes).unwrap();

        assert!(text.is_ascii());
        assert!(text.contains(r#""documentation": "Caf\u00e9 \"menu\" \ud83d\ude00","#));

        let entries: Vec<MetaEntry> = serde_json::from_str(&text).unwrap();
        assert_eq!(entries[0].documentation, "Café \"menu\" 😀");
    }
}
