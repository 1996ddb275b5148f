//! Parse events consumed by the converter.
//!
//! These mirror what a streaming XML reader emits. The crate does not
//! tokenize documents itself; any reader that can produce this sequence in
//! document order will do.

use serde::{Deserialize, Serialize};

/// One event from a streaming document reader
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Event {
    /// `<tag attr="value" ...>`
    Start {
        tag: String,
        attributes: Vec<(String, String)>,
    },
    /// `</tag>` (also emitted for self-closing elements)
    End { tag: String },
    /// Character data. May arrive in several chunks for one element.
    Text(String),
}

impl Event {
    pub fn start(tag: impl Into<String>) -> Self {
        Event::Start {
            tag: tag.into(),
            attributes: Vec::new(),
        }
    }

    pub fn start_with<K, V>(
        tag: impl Into<String>,
        attributes: impl IntoIterator<Item = (K, V)>,
    ) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Event::Start {
            tag: tag.into(),
            attributes: attributes
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }

    pub fn end(tag: impl Into<String>) -> Self {
        Event::End { tag: tag.into() }
    }

    pub fn text(content: impl Into<String>) -> Self {
        Event::Text(content.into())
    }
}

/// Look up an attribute by name
pub fn attribute<'a>(attributes: &'a [(String, String)], name: &str) -> Option<&'a str> {
    attributes
        .iter()
        .find(|(k, _)| k == name)
        .map(|(_, v)| v.as_str())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_attribute_lookup() {
        let event = Event::start_with("tie", [("type", "start")]);
        let Event::Start { attributes, .. } = event else {
            panic!("expected start event");
        };
        assert_eq!(attribute(&attributes, "type"), Some("start"));
        assert_eq!(attribute(&attributes, "number"), None);
    }
}
