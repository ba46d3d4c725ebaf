//! Sample instance generation
//!
//! Materializes one element per class, starting at the root: attributes
//! become leaf elements holding their type name, contained classes become
//! nested elements. The result is a structural template, not populated data.

use quick_xml::escape::partial_escape;
use quick_xml::events::{BytesEnd, BytesStart, BytesText, Event};
use quick_xml::Writer;
use std::io::Write;
use xmigen_core::{ClassDef, ClassTable, ModelError};

/// Output formatting for the instance document
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct InstanceOptions {
    /// Indent nested elements by this many spaces; compact when `None`
    pub indent: Option<usize>,
}

/// Derive the instance document with default (compact) formatting
pub fn derive_instance(classes: &ClassTable) -> Result<String, ModelError> {
    derive_instance_with(classes, InstanceOptions::default())
}

/// Derive the instance document
///
/// Returns an empty string when no class is marked as root.
pub fn derive_instance_with(classes: &ClassTable, options: InstanceOptions) -> Result<String, ModelError> {
    let Some(root) = classes.root() else {
        tracing::debug!("no root class; instance document is empty");
        return Ok(String::new());
    };

    let mut writer = match options.indent {
        Some(width) => Writer::new_with_indent(Vec::new(), b' ', width),
        None => Writer::new(Vec::new()),
    };

    write_instance(&mut writer, classes, root)?;

    String::from_utf8(writer.into_inner())
        .map_err(|e| ModelError::Serialization(format!("UTF-8 conversion error: {}", e)))
}

/// Element whose children are still being written
struct Frame<'a> {
    class: &'a ClassDef,

    /// Index of the next child to visit
    next_child: usize,
}

/// Depth-first walk with an explicit stack, so nesting depth is bounded by
/// the heap rather than the call stack
fn write_instance<'a, W: Write>(
    writer: &mut Writer<W>,
    classes: &'a ClassTable,
    root: &'a ClassDef,
) -> Result<(), ModelError> {
    let mut stack: Vec<Frame<'a>> = Vec::new();
    open_class(writer, &mut stack, root)?;

    while let Some(frame) = stack.last_mut() {
        let class = frame.class;
        let Some(child) = class.children.get(frame.next_child) else {
            stack.pop();
            write(writer, Event::End(BytesEnd::new(class.name.as_str())))?;
            continue;
        };
        frame.next_child += 1;

        match classes.get(&child.class) {
            Some(child_class) => open_class(writer, &mut stack, child_class)?,
            None => tracing::debug!(class = %child.class, "skipping unknown child class"),
        }
    }

    Ok(())
}

/// Write the start of a class element and push it, or write it whole when it
/// has nothing to nest
fn open_class<'a, W: Write>(
    writer: &mut Writer<W>,
    stack: &mut Vec<Frame<'a>>,
    class: &'a ClassDef,
) -> Result<(), ModelError> {
    if let Some(from) = stack.iter().position(|frame| frame.class.name == class.name) {
        let mut path: Vec<String> = stack[from..].iter().map(|f| f.class.name.clone()).collect();
        path.push(class.name.clone());
        return Err(ModelError::CycleDetected { path });
    }

    if class.attributes.is_empty() && class.children.is_empty() {
        return write_empty(writer, &class.name);
    }

    write(writer, Event::Start(BytesStart::new(class.name.as_str())))?;
    for attribute in &class.attributes {
        write_leaf(writer, &attribute.name, &attribute.type_name)?;
    }

    stack.push(Frame { class, next_child: 0 });
    Ok(())
}

fn write_leaf<W: Write>(writer: &mut Writer<W>, name: &str, text: &str) -> Result<(), ModelError> {
    if text.is_empty() {
        return write_empty(writer, name);
    }

    // Only markup characters are escaped in text; quotes stay literal
    write(writer, Event::Start(BytesStart::new(name)))?;
    write(writer, Event::Text(BytesText::from_escaped(partial_escape(text))))?;
    write(writer, Event::End(BytesEnd::new(name)))
}

/// `<name />`, with a space before the slash
fn write_empty<W: Write>(writer: &mut Writer<W>, name: &str) -> Result<(), ModelError> {
    write(writer, Event::Empty(BytesStart::from_content(format!("{} ", name), name.len())))
}

fn write<W: Write>(writer: &mut Writer<W>, event: Event<'_>) -> Result<(), ModelError> {
    writer
        .write_event(event)
        .map_err(|e| ModelError::Serialization(format!("XML write error: {}", e)))
}
