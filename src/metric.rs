//! Metric data model
//!
//! A [`Metric`] is identified by its [`Namespace`], an ordered list of
//! [`NamespaceElement`]s, and carries a [`Tags`] map of key/value metadata.
//! Everything else on a metric (data, timestamp, unit, ...) is payload the
//! pipeline passes through untouched, including fields this crate does not
//! know about.

use std::collections::BTreeMap;
use std::fmt;

use serde::ser::SerializeStruct;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

/// Separator used by the textual namespace form (`/intel/foo/bar`)
pub const NAMESPACE_SEPARATOR: char = '/';

/// Tag map of a metric
///
/// Sorted so that encoding a metric is deterministic.
pub type Tags = BTreeMap<String, String>;

/// One segment of a metric namespace
///
/// A static element only has a `value`. A dynamic element additionally has a
/// `name` describing what the value stands for (e.g. `host`), since the value
/// itself changes from one metric instance to the next.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct NamespaceElement {
    /// Segment text
    pub value: String,
    /// Name of a dynamic element, empty for static elements
    pub name: String,
    /// Free-form description
    pub description: String,
}

impl NamespaceElement {
    /// Create a static element
    pub fn new(value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            name: String::new(),
            description: String::new(),
        }
    }

    /// Create a dynamic element
    pub fn dynamic(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self {
            value: value.into(),
            name: name.into(),
            description: String::new(),
        }
    }

    /// Segment text
    pub fn value(&self) -> &str {
        &self.value
    }

    /// Whether this element is dynamic
    pub fn is_dynamic(&self) -> bool {
        !self.name.is_empty()
    }

    fn is_bare(&self) -> bool {
        self.name.is_empty() && self.description.is_empty()
    }
}

impl From<&str> for NamespaceElement {
    fn from(value: &str) -> Self {
        Self::new(value)
    }
}

impl From<String> for NamespaceElement {
    fn from(value: String) -> Self {
        Self::new(value)
    }
}

// Bare elements are written as plain strings, richer ones as objects.
impl Serialize for NamespaceElement {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        if self.is_bare() {
            return serializer.serialize_str(&self.value);
        }

        let mut fields = 1;
        if !self.name.is_empty() {
            fields += 1;
        }
        if !self.description.is_empty() {
            fields += 1;
        }

        let mut state = serializer.serialize_struct("NamespaceElement", fields)?;
        state.serialize_field("value", &self.value)?;
        if !self.name.is_empty() {
            state.serialize_field("name", &self.name)?;
        }
        if !self.description.is_empty() {
            state.serialize_field("description", &self.description)?;
        }
        state.end()
    }
}

impl<'de> Deserialize<'de> for NamespaceElement {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        #[serde(untagged)]
        enum RawElement {
            Bare(String),
            Full {
                value: String,
                #[serde(default)]
                name: String,
                #[serde(default)]
                description: String,
            },
        }

        Ok(match RawElement::deserialize(deserializer)? {
            RawElement::Bare(value) => NamespaceElement::new(value),
            RawElement::Full {
                value,
                name,
                description,
            } => NamespaceElement {
                value,
                name,
                description,
            },
        })
    }
}

/// Ordered sequence of namespace elements identifying a metric
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Namespace {
    elements: Vec<NamespaceElement>,
}

impl Namespace {
    /// Create a namespace of static elements
    ///
    /// # Example
    ///
    /// ```
    /// use ns_filter::metric::Namespace;
    ///
    /// let ns = Namespace::new(["intel", "foo", "bar"]);
    /// assert_eq!(ns.to_string(), "/intel/foo/bar");
    /// ```
    pub fn new<I, S>(segments: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            elements: segments.into_iter().map(NamespaceElement::new).collect(),
        }
    }

    /// Append a dynamic element
    pub fn add_dynamic(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.elements.push(NamespaceElement::dynamic(name, value));
        self
    }

    /// Number of elements
    pub fn len(&self) -> usize {
        self.elements.len()
    }

    /// Whether the namespace has no elements
    pub fn is_empty(&self) -> bool {
        self.elements.is_empty()
    }

    /// Element at `index`
    pub fn get(&self, index: usize) -> Option<&NamespaceElement> {
        self.elements.get(index)
    }

    /// Iterate over elements
    pub fn iter(&self) -> std::slice::Iter<'_, NamespaceElement> {
        self.elements.iter()
    }

    /// Segment values in order
    pub fn strings(&self) -> Vec<&str> {
        self.elements.iter().map(|e| e.value.as_str()).collect()
    }

    /// Remove the element at `index`, shifting later elements left
    ///
    /// # Panics
    ///
    /// Panics if `index` is out of bounds.
    pub fn remove(&mut self, index: usize) -> NamespaceElement {
        self.elements.remove(index)
    }

    /// Take all elements out, leaving the namespace empty
    pub fn take_elements(&mut self) -> Vec<NamespaceElement> {
        std::mem::take(&mut self.elements)
    }

    /// Replace all elements
    pub fn set_elements(&mut self, elements: Vec<NamespaceElement>) {
        self.elements = elements;
    }
}

impl fmt::Display for Namespace {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for element in &self.elements {
            write!(f, "{}{}", NAMESPACE_SEPARATOR, element.value)?;
        }
        Ok(())
    }
}

/// A single metric observation
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Metric {
    /// Hierarchical identity
    pub namespace: Namespace,

    /// Key/value metadata
    #[serde(default)]
    pub tags: Tags,

    /// Observed value, opaque to this crate
    #[serde(default)]
    pub data: Value,

    /// Collection time in nanoseconds since the Unix epoch
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,

    /// Unit of `data`
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub unit: String,

    /// Free-form description
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub description: String,

    /// Version of the plugin that produced the metric
    #[serde(default)]
    pub version: i64,

    /// Any other fields of the incoming metric, kept verbatim
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl Metric {
    /// Create a metric with the given namespace and no tags
    pub fn new(namespace: Namespace) -> Self {
        Self {
            namespace,
            ..Default::default()
        }
    }

    /// Add a tag
    pub fn with_tag(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.tags.insert(key.into(), value.into());
        self
    }

    /// Set the data payload
    pub fn with_data(mut self, data: impl Into<Value>) -> Self {
        self.data = data.into();
        self
    }

    /// Set the timestamp (nanoseconds since the Unix epoch)
    pub fn with_timestamp(mut self, timestamp: i64) -> Self {
        self.timestamp = Some(timestamp);
        self
    }

    /// Set the unit
    pub fn with_unit(mut self, unit: impl Into<String>) -> Self {
        self.unit = unit.into();
        self
    }

    /// Set a field outside the known schema
    pub fn with_extra(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.extra.insert(key.into(), value.into());
        self
    }
}
