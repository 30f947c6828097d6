//! Preview tree parsing

use std::collections::BTreeMap;

use serde_json::Value;

/// Leaf marker prefix encoding "this file will move to directory X"
const MOVE_PREFIX: &str = "MOVE->";

/// One node of the parsed preview tree
///
/// Parsed once from the raw JSON payload; downstream code never re-inspects
/// string prefixes. Children are kept in a `BTreeMap` so traversal order is
/// deterministic for a given tree.
#[derive(Debug, Clone, PartialEq)]
pub enum PreviewNode {
    /// A directory mapping child names to nodes
    Directory(BTreeMap<String, PreviewNode>),
    /// A file that stays where it is
    File,
    /// A file that will move to the given destination directory
    Moved(String),
}

impl PreviewNode {
    /// Parse the raw preview payload
    ///
    /// Returns `None` when the payload is not a usable tree (anything but a
    /// JSON object at the root). Callers are expected to render that as an
    /// empty preview rather than an error.
    pub fn parse(value: &Value) -> Option<Self> {
        value.as_object().map(Self::parse_directory)
    }

    fn parse_directory(map: &serde_json::Map<String, Value>) -> Self {
        let children = map
            .iter()
            .map(|(name, child)| (name.clone(), Self::parse_value(child)))
            .collect();
        Self::Directory(children)
    }

    fn parse_value(value: &Value) -> Self {
        match value {
            Value::Object(map) => Self::parse_directory(map),
            Value::String(leaf) => match leaf.strip_prefix(MOVE_PREFIX) {
                Some(destination) => Self::Moved(destination.to_string()),
                None => Self::File,
            },
            // Any other scalar is a plain file marker
            _ => Self::File,
        }
    }
}
