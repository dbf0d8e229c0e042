//! Message chains.

use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::element::{Element, Source};

/// An ordered sequence of [`Element`]s.
///
/// Element order is preserved exactly as received. The lookup helpers give a
/// by-type view on top of it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MessageChain(Vec<Element>);

impl MessageChain {
    /// Creates an empty chain.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends an element.
    pub fn push(&mut self, element: impl Into<Element>) {
        self.0.push(element.into());
    }

    /// Appends an element (builder style).
    pub fn with(mut self, element: impl Into<Element>) -> Self {
        self.push(element);
        self
    }

    /// Returns the number of elements.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// Returns `true` if the chain has no elements.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Iterates over the elements in order.
    pub fn iter(&self) -> std::slice::Iter<'_, Element> {
        self.0.iter()
    }

    /// Iterates mutably over the elements in order.
    pub fn iter_mut(&mut self) -> std::slice::IterMut<'_, Element> {
        self.0.iter_mut()
    }

    /// Returns every element of the given kind, in order.
    pub fn fetch(&self, kind: &str) -> Vec<&Element> {
        self.0.iter().filter(|e| e.kind() == kind).collect()
    }

    /// Returns the first element of the given kind.
    pub fn fetch_one(&self, kind: &str) -> Option<&Element> {
        self.0.iter().find(|e| e.kind() == kind)
    }

    /// Returns `true` if the chain holds an element of the given kind.
    pub fn has(&self, kind: &str) -> bool {
        self.fetch_one(kind).is_some()
    }

    /// Returns `true` if the chain holds every given kind.
    pub fn has_all(&self, kinds: &[&str]) -> bool {
        kinds.iter().all(|k| self.has(k))
    }

    /// Returns `true` if the chain holds at least one of the given kinds.
    pub fn has_any(&self, kinds: &[&str]) -> bool {
        kinds.iter().any(|k| self.has(k))
    }

    /// Returns the message source, present on received chains.
    pub fn source(&self) -> Option<&Source> {
        self.0.iter().find_map(|e| match e {
            Element::Source(s) => Some(s),
            _ => None,
        })
    }

    /// Returns the message id from the source element.
    pub fn message_id(&self) -> Option<i64> {
        self.source().map(|s| s.id)
    }

    /// Renders every element except the source.
    pub fn to_str(&self) -> String {
        self.0
            .iter()
            .filter(|e| !matches!(e, Element::Source(_)))
            .map(ToString::to_string)
            .collect()
    }

    /// Concatenates the text of all `Plain` elements.
    pub fn to_text(&self) -> String {
        self.0.iter().filter_map(Element::as_plain).collect()
    }

    /// Converts the chain into its sendable JSON form.
    ///
    /// The source element is left out.
    pub fn to_json_list(&self) -> Vec<Value> {
        self.0
            .iter()
            .filter(|e| !matches!(e, Element::Source(_)))
            .filter_map(|e| serde_json::to_value(e).ok())
            .collect()
    }

    /// Consumes the chain, returning its elements.
    pub fn into_inner(self) -> Vec<Element> {
        self.0
    }
}

impl fmt::Display for MessageChain {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_str())
    }
}

impl From<Vec<Element>> for MessageChain {
    fn from(elements: Vec<Element>) -> Self {
        Self(elements)
    }
}

impl From<Element> for MessageChain {
    fn from(element: Element) -> Self {
        Self(vec![element])
    }
}

impl From<&str> for MessageChain {
    fn from(text: &str) -> Self {
        Self(vec![Element::plain(text)])
    }
}

impl From<String> for MessageChain {
    fn from(text: String) -> Self {
        Self(vec![Element::plain(text)])
    }
}

impl FromIterator<Element> for MessageChain {
    fn from_iter<I: IntoIterator<Item = Element>>(iter: I) -> Self {
        Self(iter.into_iter().collect())
    }
}

impl IntoIterator for MessageChain {
    type Item = Element;
    type IntoIter = std::vec::IntoIter<Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.into_iter()
    }
}

impl<'a> IntoIterator for &'a MessageChain {
    type Item = &'a Element;
    type IntoIter = std::slice::Iter<'a, Element>;

    fn into_iter(self) -> Self::IntoIter {
        self.0.iter()
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    fn received() -> MessageChain {
        serde_json::from_value(json!([
            {"type": "Source", "id": 77, "time": 1},
            {"type": "Plain", "text": "hello "},
            {"type": "At", "target": 5, "display": ""},
            {"type": "Plain", "text": "world"},
            {"type": "Face", "faceId": 1, "name": "smile"}
        ]))
        .unwrap()
    }

    #[test]
    fn test_order_is_preserved() {
        let chain = received();
        let kinds: Vec<_> = chain.iter().map(Element::kind).collect();
        assert_eq!(kinds, ["Source", "Plain", "At", "Plain", "Face"]);
        assert_eq!(chain.to_str(), "hello @5world[Face:smile]");
        assert_eq!(chain.to_text(), "hello world");
    }

    #[test]
    fn test_lookups() {
        let chain = received();
        assert_eq!(chain.fetch("Plain").len(), 2);
        assert_eq!(chain.fetch_one("Plain").and_then(Element::as_plain), Some("hello "));
        assert!(chain.has_all(&["Plain", "At"]));
        assert!(!chain.has_all(&["Plain", "Image"]));
        assert!(chain.has_any(&["Image", "Face"]));
        assert_eq!(chain.message_id(), Some(77));
    }

    #[test]
    fn test_json_list_drops_source() {
        let chain = received();
        let list = chain.to_json_list();
        assert_eq!(list.len(), 4);
        assert_eq!(list[0], json!({"type": "Plain", "text": "hello "}));

        let back: MessageChain = serde_json::from_value(Value::Array(list)).unwrap();
        assert_eq!(back.iter().map(Element::kind).collect::<Vec<_>>(), ["Plain", "At", "Plain", "Face"]);
    }

    #[test]
    fn test_builders() {
        let chain = MessageChain::from("hi").with(Element::at(1)).with(Element::AtAll);
        assert_eq!(chain.len(), 3);
        assert_eq!(chain.to_string(), "hi@1@all");
    }
}
