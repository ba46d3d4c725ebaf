//! XMI-like document parsing
//!
//! Reads the flat `Class` / `Aggregation` declarations under the document
//! root into a class table and an edge list. Nothing is linked here; see
//! [`crate::hierarchy`] for folding edges into containers.

use quick_xml::encoding::Decoder;
use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use xmigen_core::{AggregationEdge, Attribute, ClassDef, ClassTable, ModelError};

/// Element tag of a class declaration
pub const CLASS_TAG: &str = "Class";

/// Element tag of an attribute declaration nested in a class
pub const ATTRIBUTE_TAG: &str = "Attribute";

/// Element tag of an aggregation declaration
pub const AGGREGATION_TAG: &str = "Aggregation";

/// Declarations read from a document, before edges are folded into classes
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ParsedDocument {
    /// Classes in declaration order
    pub classes: ClassTable,

    /// Aggregation edges in declaration order
    pub edges: Vec<AggregationEdge>,

    /// Names declared more than once (later declarations replaced earlier ones)
    pub duplicates: Vec<String>,
}

/// Parse a model document
pub fn parse_document(text: &str) -> Result<ParsedDocument, ModelError> {
    let mut reader = Reader::from_str(text);
    reader.config_mut().trim_text(true);

    let mut builder = DocumentBuilder::default();

    loop {
        let event = reader.read_event().map_err(|e| {
            ModelError::MalformedDocument(format!("at byte {}: {}", reader.error_position(), e))
        })?;

        match event {
            Event::Start(element) => {
                builder.open(&element, reader.decoder())?;
            }
            Event::Empty(element) => {
                builder.open(&element, reader.decoder())?;
                builder.close();
            }
            Event::End(_) => builder.close(),
            Event::Eof => break,
            _ => {}
        }
    }

    let document = builder.finish()?;

    tracing::debug!(
        classes = document.classes.len(),
        aggregations = document.edges.len(),
        "parsed model document"
    );

    Ok(document)
}

/// Event-driven assembly of a [`ParsedDocument`]
#[derive(Default)]
struct DocumentBuilder {
    document: ParsedDocument,

    /// Number of currently open elements
    depth: usize,

    /// Whether the document element has been seen
    seen_root: bool,

    /// Class whose element is open
    current: Option<ClassDef>,
}

impl DocumentBuilder {
    fn open(&mut self, element: &BytesStart<'_>, decoder: Decoder) -> Result<(), ModelError> {
        let tag = String::from_utf8_lossy(element.name().as_ref()).to_string();

        match self.depth {
            0 => {
                if self.seen_root {
                    return Err(ModelError::MalformedDocument(format!(
                        "unexpected element <{}> after the document element",
                        tag
                    )));
                }
                self.seen_root = true;
            }
            1 => match tag.as_str() {
                CLASS_TAG => self.current = Some(read_class(element, decoder)?),
                AGGREGATION_TAG => self.document.edges.push(read_aggregation(element, decoder)?),
                _ => tracing::trace!(tag = %tag, "ignoring unknown declaration"),
            },
            2 if tag == ATTRIBUTE_TAG => {
                if let Some(class) = self.current.as_mut() {
                    class.attributes.push(read_attribute(element, decoder)?);
                }
            }
            _ => {}
        }

        self.depth += 1;
        Ok(())
    }

    fn close(&mut self) {
        self.depth = self.depth.saturating_sub(1);

        if self.depth == 1 {
            if let Some(class) = self.current.take() {
                self.insert_class(class);
            }
        }
    }

    fn insert_class(&mut self, class: ClassDef) {
        let name = class.name.clone();
        if self.document.classes.insert(class).is_some() {
            tracing::debug!(class = %name, "class declared more than once; keeping the last one");
            self.document.duplicates.push(name);
        }
    }

    fn finish(self) -> Result<ParsedDocument, ModelError> {
        if !self.seen_root {
            return Err(ModelError::MalformedDocument("no document element".to_string()));
        }
        if self.depth != 0 {
            return Err(ModelError::MalformedDocument("unexpected end of document".to_string()));
        }

        Ok(self.document)
    }
}

fn read_class(element: &BytesStart<'_>, decoder: Decoder) -> Result<ClassDef, ModelError> {
    let name = required(element, decoder, CLASS_TAG, "name")?;
    let is_root = optional(element, decoder, "isRoot")?.as_deref() == Some("true");
    let documentation = optional(element, decoder, "documentation")?.unwrap_or_default();

    Ok(ClassDef::new(name)
        .with_root(is_root)
        .with_documentation(documentation))
}

fn read_attribute(element: &BytesStart<'_>, decoder: Decoder) -> Result<Attribute, ModelError> {
    Ok(Attribute::new(
        required(element, decoder, ATTRIBUTE_TAG, "name")?,
        required(element, decoder, ATTRIBUTE_TAG, "type")?,
    ))
}

fn read_aggregation(element: &BytesStart<'_>, decoder: Decoder) -> Result<AggregationEdge, ModelError> {
    Ok(AggregationEdge::new(
        required(element, decoder, AGGREGATION_TAG, "source")?,
        required(element, decoder, AGGREGATION_TAG, "target")?,
        required(element, decoder, AGGREGATION_TAG, "sourceMultiplicity")?,
        required(element, decoder, AGGREGATION_TAG, "targetMultiplicity")?,
    ))
}

fn required(
    element: &BytesStart<'_>,
    decoder: Decoder,
    tag: &str,
    field: &str,
) -> Result<String, ModelError> {
    optional(element, decoder, field)?.ok_or_else(|| ModelError::missing_field(tag, field))
}

fn optional(element: &BytesStart<'_>, decoder: Decoder, field: &str) -> Result<Option<String>, ModelError> {
    let attribute = element
        .try_get_attribute(field)
        .map_err(|e| ModelError::MalformedDocument(e.to_string()))?;

    attribute
        .map(|attr| {
            attr.decode_and_unescape_value(decoder)
                .map(|value| value.into_owned())
                .map_err(|e| ModelError::MalformedDocument(e.to_string()))
        })
        .transpose()
}
