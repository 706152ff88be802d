//! Page sources and their metadata.
//!
//! A page source is a TOML file whose top level is a flat, ordered mapping.
//! Only `template` is required; every other key is opaque payload handed to
//! plugins as-is:
//!
//! ```toml
//! template = "templates/page.html"
//! type = "blog-post"
//! title = "First post"
//! main-content = "<p>Hello</p>"
//! ```
//!
//! Values are converted into [`MetaValue`], a small tagged union, so plugins
//! never depend on the TOML crate. Key order is kept as written.

use std::fmt;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Key naming the template a page is rendered from.
pub const TEMPLATE_KEY: &str = "template";

#[derive(Error, Debug)]
pub enum ParseError {
    #[error("TOML parse error: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("missing required key \"template\"")]
    MissingTemplate,
    #[error("\"template\" must be a string, got {0}")]
    TemplateNotString(&'static str),
}

/// A metadata value.
#[derive(Debug, Clone, PartialEq)]
pub enum MetaValue {
    String(String),
    Integer(i64),
    Float(f64),
    Boolean(bool),
    /// TOML dates and times, kept in their source spelling.
    Datetime(String),
    List(Vec<MetaValue>),
    Table(Metadata),
}

impl MetaValue {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            MetaValue::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_integer(&self) -> Option<i64> {
        match self {
            MetaValue::Integer(n) => Some(*n),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            MetaValue::Boolean(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[MetaValue]> {
        match self {
            MetaValue::List(items) => Some(items),
            _ => None,
        }
    }

    pub fn as_table(&self) -> Option<&Metadata> {
        match self {
            MetaValue::Table(table) => Some(table),
            _ => None,
        }
    }

    /// Human-readable kind name, used in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            MetaValue::String(_) => "string",
            MetaValue::Integer(_) => "integer",
            MetaValue::Float(_) => "float",
            MetaValue::Boolean(_) => "boolean",
            MetaValue::Datetime(_) => "datetime",
            MetaValue::List(_) => "list",
            MetaValue::Table(_) => "table",
        }
    }
}

impl From<toml::Value> for MetaValue {
    fn from(value: toml::Value) -> Self {
        match value {
            toml::Value::String(s) => MetaValue::String(s),
            toml::Value::Integer(n) => MetaValue::Integer(n),
            toml::Value::Float(f) => MetaValue::Float(f),
            toml::Value::Boolean(b) => MetaValue::Boolean(b),
            toml::Value::Datetime(dt) => MetaValue::Datetime(dt.to_string()),
            toml::Value::Array(items) => {
                MetaValue::List(items.into_iter().map(MetaValue::from).collect())
            }
            toml::Value::Table(table) => MetaValue::Table(Metadata::from(table)),
        }
    }
}

impl fmt::Display for MetaValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetaValue::String(s) | MetaValue::Datetime(s) => write!(f, "{s}"),
            MetaValue::Integer(n) => write!(f, "{n}"),
            MetaValue::Float(x) => write!(f, "{x}"),
            MetaValue::Boolean(b) => write!(f, "{b}"),
            MetaValue::List(items) => {
                write!(f, "[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{item}")?;
                }
                write!(f, "]")
            }
            MetaValue::Table(table) => write!(f, "{{{} keys}}", table.len()),
        }
    }
}

/// Ordered string-keyed mapping.
///
/// Page metadata is small, so lookups are linear scans over entries in
/// source order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Metadata {
    entries: Vec<(String, MetaValue)>,
}

impl Metadata {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<&MetaValue> {
        self.entries
            .iter()
            .find(|(k, _)| k == key)
            .map(|(_, v)| v)
    }

    /// Shorthand for string-valued keys.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.get(key).and_then(MetaValue::as_str)
    }

    /// Insert or replace. A replaced key keeps its original position.
    pub fn insert(&mut self, key: impl Into<String>, value: MetaValue) {
        let key = key.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|(k, _)| k.as_str())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MetaValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl From<toml::Table> for Metadata {
    fn from(table: toml::Table) -> Self {
        Self {
            entries: table
                .into_iter()
                .map(|(k, v)| (k, MetaValue::from(v)))
                .collect(),
        }
    }
}

/// One discovered page source, ready for rendering.
#[derive(Debug, Clone)]
pub struct PageDescriptor {
    /// Path of the page source, relative to the input root.
    pub source: PathBuf,
    /// Path of the generated page, relative to the output root.
    pub output: PathBuf,
    pub metadata: Metadata,
}

impl PageDescriptor {
    /// The validated `template` value.
    pub fn template(&self) -> &str {
        // parse_page only builds descriptors whose template is a string
        self.metadata.get_str(TEMPLATE_KEY).unwrap_or_default()
    }
}

/// Parse page source text into a descriptor.
///
/// Fails when the body is not valid TOML, when `template` is missing, or
/// when `template` is not a string.
pub fn parse_page(source: &Path, output: &Path, body: &str) -> Result<PageDescriptor, ParseError> {
    let table: toml::Table = toml::from_str(body)?;
    let metadata = Metadata::from(table);
    match metadata.get(TEMPLATE_KEY) {
        None => return Err(ParseError::MissingTemplate),
        Some(MetaValue::String(_)) => {}
        Some(other) => return Err(ParseError::TemplateNotString(other.type_name())),
    }
    Ok(PageDescriptor {
        source: source.to_path_buf(),
        output: output.to_path_buf(),
        metadata,
    })
}
