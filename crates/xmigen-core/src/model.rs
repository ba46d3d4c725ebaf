//! Class model types
//!
//! The in-memory form of an XMI-like class diagram: classes keyed by name,
//! their attributes, and the containment edges folded into each container.

use indexmap::IndexMap;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::sync::OnceLock;

/// A typed attribute declared on a class
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Attribute {
    /// Attribute name
    pub name: String,

    /// Opaque type name (never validated)
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Attribute {
    /// Create a new attribute
    pub fn new(name: impl Into<String>, type_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: type_name.into(),
        }
    }
}

/// Cardinality bounds of a contained class
///
/// Bounds are kept as the raw strings of the source token ("0", "1", "*", ...).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Multiplicity {
    /// Lower bound
    pub min: String,

    /// Upper bound
    pub max: String,
}

impl Multiplicity {
    /// Create a multiplicity from explicit bounds
    pub fn new(min: impl Into<String>, max: impl Into<String>) -> Self {
        Self {
            min: min.into(),
            max: max.into(),
        }
    }

    /// Parse a `"n"` or `"n..m"` token
    ///
    /// The first segment is the lower bound and the last segment the upper
    /// bound, so a single value yields the same value for both.
    pub fn parse(token: &str) -> Self {
        let mut segments = token.split("..");
        let min = segments.next().unwrap_or_default();
        let max = segments.last().unwrap_or(min);

        Self::new(min, max)
    }

    /// Check whether a token has the form `n` or `n..m` with `n`, `m` digits or `*`
    pub fn is_well_formed(token: &str) -> bool {
        static PATTERN: OnceLock<Regex> = OnceLock::new();

        PATTERN
            .get_or_init(|| {
                Regex::new(r"^(\d+|\*)(\.\.(\d+|\*))?$").expect("multiplicity pattern is valid")
            })
            .is_match(token)
    }
}

impl Default for Multiplicity {
    fn default() -> Self {
        Self::new("1", "1")
    }
}

impl std::fmt::Display for Multiplicity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.min == self.max {
            write!(f, "{}", self.min)
        } else {
            write!(f, "{}..{}", self.min, self.max)
        }
    }
}

/// "This class contains instances of another class"
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ChildRef {
    /// Name of the contained class (lookup only)
    pub class: String,

    /// How many instances the container holds
    pub multiplicity: Multiplicity,
}

impl ChildRef {
    /// Create a new child reference
    pub fn new(class: impl Into<String>, multiplicity: Multiplicity) -> Self {
        Self {
            class: class.into(),
            multiplicity,
        }
    }
}

/// A class declaration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassDef {
    /// Unique class name
    pub name: String,

    /// Attributes in document order
    pub attributes: Vec<Attribute>,

    /// Whether this is the model's root class
    pub is_root: bool,

    /// Free-text documentation (empty when absent)
    pub documentation: String,

    /// Contained classes in aggregation order
    pub children: Vec<ChildRef>,
}

impl ClassDef {
    /// Create a non-root class with no attributes or children
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Vec::new(),
            is_root: false,
            documentation: String::new(),
            children: Vec::new(),
        }
    }

    /// Mark as root
    pub fn with_root(mut self, is_root: bool) -> Self {
        self.is_root = is_root;
        self
    }

    /// Set documentation
    pub fn with_documentation(mut self, documentation: impl Into<String>) -> Self {
        self.documentation = documentation.into();
        self
    }

    /// Append an attribute
    pub fn with_attribute(mut self, name: impl Into<String>, type_name: impl Into<String>) -> Self {
        self.attributes.push(Attribute::new(name, type_name));
        self
    }

    /// Append a child reference
    pub fn with_child(mut self, class: impl Into<String>, multiplicity: Multiplicity) -> Self {
        self.children.push(ChildRef::new(class, multiplicity));
        self
    }
}

/// A declared aggregation, as read from the document
///
/// `target` is the container and `source` the contained type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AggregationEdge {
    /// Contained class name
    pub source: String,

    /// Container class name
    pub target: String,

    /// Raw multiplicity on the source end
    pub source_multiplicity: String,

    /// Raw multiplicity on the target end (how many sources the target holds)
    pub target_multiplicity: String,
}

impl AggregationEdge {
    /// Create a new edge
    pub fn new(
        source: impl Into<String>,
        target: impl Into<String>,
        source_multiplicity: impl Into<String>,
        target_multiplicity: impl Into<String>,
    ) -> Self {
        Self {
            source: source.into(),
            target: target.into(),
            source_multiplicity: source_multiplicity.into(),
            target_multiplicity: target_multiplicity.into(),
        }
    }
}

/// Classes keyed by name, in declaration order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClassTable {
    classes: IndexMap<String, ClassDef>,
}

impl ClassTable {
    /// Create an empty table
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a class, returning the definition it replaced
    ///
    /// A replaced class keeps its original position.
    pub fn insert(&mut self, class: ClassDef) -> Option<ClassDef> {
        self.classes.insert(class.name.clone(), class)
    }

    /// Look up a class by name
    pub fn get(&self, name: &str) -> Option<&ClassDef> {
        self.classes.get(name)
    }

    /// Mutable lookup by name
    pub fn get_mut(&mut self, name: &str) -> Option<&mut ClassDef> {
        self.classes.get_mut(name)
    }

    /// Check if a class exists
    pub fn contains(&self, name: &str) -> bool {
        self.classes.contains_key(name)
    }

    /// Position of a class in declaration order
    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.classes.get_index_of(name)
    }

    /// Class at a position in declaration order
    pub fn get_index(&self, index: usize) -> Option<&ClassDef> {
        self.classes.get_index(index).map(|(_, class)| class)
    }

    /// The first class marked as root
    pub fn root(&self) -> Option<&ClassDef> {
        self.classes.values().find(|c| c.is_root)
    }

    /// All classes marked as root
    pub fn roots(&self) -> Vec<&ClassDef> {
        self.classes.values().filter(|c| c.is_root).collect()
    }

    /// Iterate classes in declaration order
    pub fn iter(&self) -> impl Iterator<Item = &ClassDef> {
        self.classes.values()
    }

    /// Class names in declaration order
    pub fn names(&self) -> Vec<&str> {
        self.classes.keys().map(String::as_str).collect()
    }

    /// Number of classes
    pub fn len(&self) -> usize {
        self.classes.len()
    }

    /// Whether the table is empty
    pub fn is_empty(&self) -> bool {
        self.classes.is_empty()
    }
}

impl FromIterator<ClassDef> for ClassTable {
    fn from_iter<I: IntoIterator<Item = ClassDef>>(iter: I) -> Self {
        let mut table = Self::new();
        for class in iter {
            table.insert(class);
        }
        table
    }
}

/// One parameter of a metadata entry
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parameter {
    /// Attribute name, or contained class name
    pub name: String,

    /// Attribute type name, or [`Parameter::CLASS_TYPE`]
    #[serde(rename = "type")]
    pub type_name: String,
}

impl Parameter {
    /// Type marker for containment parameters
    pub const CLASS_TYPE: &'static str = "class";

    /// Parameter for a plain attribute
    pub fn attribute(attribute: &Attribute) -> Self {
        Self {
            name: attribute.name.clone(),
            type_name: attribute.type_name.clone(),
        }
    }

    /// Parameter for a contained class
    pub fn class(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            type_name: Self::CLASS_TYPE.to_string(),
        }
    }

    /// Whether this parameter refers to a contained class
    pub fn is_class(&self) -> bool {
        self.type_name == Self::CLASS_TYPE
    }
}

/// Descriptive record for one class in the metadata document
///
/// Field order here is the serialized field order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetaEntry {
    /// Class name
    pub class: String,

    /// Class documentation
    pub documentation: String,

    /// Root flag
    #[serde(rename = "isRoot")]
    pub is_root: bool,

    /// Attributes followed by contained classes
    pub parameters: Vec<Parameter>,

    /// Lower bound relative to the container
    pub min: String,

    /// Upper bound relative to the container
    pub max: String,
}

impl MetaEntry {
    /// Build the entry for a class, with bounds defaulted to `1..1`
    pub fn from_class(class: &ClassDef) -> Self {
        let parameters = class
            .attributes
            .iter()
            .map(Parameter::attribute)
            .chain(class.children.iter().map(|child| Parameter::class(&child.class)))
            .collect();
        let Multiplicity { min, max } = Multiplicity::default();

        Self {
            class: class.name.clone(),
            documentation: class.documentation.clone(),
            is_root: class.is_root,
            parameters,
            min,
            max,
        }
    }

    /// Overwrite the bounds
    pub fn set_multiplicity(&mut self, multiplicity: &Multiplicity) {
        self.min = multiplicity.min.clone();
        self.max = multiplicity.max.clone();
    }
}
