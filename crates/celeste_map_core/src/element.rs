//! Generic attributed tree produced by the binary decoder

use crate::Value;
use serde::{Deserialize, Serialize};

/// Attribute name under which element text content is stored in map files.
pub const INNER_TEXT_ATTRIBUTE: &str = "innerText";

/// Ordered attribute list.
///
/// Keeps the order in which attributes were decoded. Inserting a name that
/// already exists replaces the value in place.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct Attributes(Vec<(String, Value)>);

impl Attributes {
    pub fn new() -> Self {
        Self(Vec::new())
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self(Vec::with_capacity(capacity))
    }

    /// Insert or replace an attribute, returning the previous value
    pub fn insert(&mut self, name: impl Into<String>, value: Value) -> Option<Value> {
        let name = name.into();
        if let Some(slot) = self.0.iter_mut().find(|(n, _)| *n == name) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.0.push((name, value));
        None
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.0.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(n, v)| (n.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl FromIterator<(String, Value)> for Attributes {
    fn from_iter<I: IntoIterator<Item = (String, Value)>>(iter: I) -> Self {
        let mut attributes = Attributes::new();
        for (name, value) in iter {
            attributes.insert(name, value);
        }
        attributes
    }
}

/// One node of a decoded map file.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct RawElement {
    pub name: String,
    #[serde(default, skip_serializing_if = "Attributes::is_empty")]
    pub attributes: Attributes,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<RawElement>,
    /// Text content, stored in the file as the `innerText` attribute
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub inner_text: Option<String>,
    /// Package identifier from the file header; only set on the root
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub package: Option<String>,
}

impl RawElement {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            attributes: Attributes::new(),
            children: Vec::new(),
            inner_text: None,
            package: None,
        }
    }

    /// Builder-style attribute setter
    pub fn with_attribute(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.attributes.insert(name, value.into());
        self
    }

    /// Builder-style child append
    pub fn with_child(mut self, child: RawElement) -> Self {
        self.children.push(child);
        self
    }

    /// Builder-style text setter
    pub fn with_inner_text(mut self, text: impl Into<String>) -> Self {
        self.inner_text = Some(text.into());
        self
    }

    pub fn attribute(&self, name: &str) -> Option<&Value> {
        self.attributes.get(name)
    }

    /// First direct child with the given name
    pub fn child(&self, name: &str) -> Option<&RawElement> {
        self.children.iter().find(|c| c.name == name)
    }

    /// All direct children with the given name
    pub fn children_named<'a>(&'a self, name: &'a str) -> impl Iterator<Item = &'a RawElement> {
        self.children.iter().filter(move |c| c.name == name)
    }

    /// Number of elements in this subtree, including this one
    pub fn count(&self) -> usize {
        let mut total = 0;
        let mut pending = vec![self];
        while let Some(element) = pending.pop() {
            total += 1;
            pending.extend(element.children.iter());
        }
        total
    }
}

impl Drop for RawElement {
    // Flatten the subtree so dropping a deeply nested file does not recurse.
    fn drop(&mut self) {
        let mut pending = std::mem::take(&mut self.children);
        while let Some(mut element) = pending.pop() {
            pending.append(&mut element.children);
        }
    }
}
