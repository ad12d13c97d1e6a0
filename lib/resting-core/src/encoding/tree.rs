//! Intermediate tree and bracket-path flattening.

use std::path::PathBuf;

use bytes::Bytes;

use super::KeyStrategy;
use crate::{Error, Result};

/// One node of the intermediate encoding tree.
#[derive(Debug, Clone, PartialEq)]
pub enum Node {
    /// Keyed children in insertion order. Keys are unique.
    Object(Vec<(String, Node)>),
    /// Indexed children.
    Array(Vec<Node>),
    /// A terminal value.
    Leaf(Leaf),
    /// An absent value (`None`, `()`).
    Null,
}

/// A terminal value, already formatted by the date/binary strategies.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Leaf {
    /// Text (numbers, booleans, strings, formatted dates, encoded binary).
    Text(String),
    /// Raw bytes.
    Bytes(Bytes),
    /// A file to be read when the body is built.
    File(PathBuf),
}

impl Node {
    pub(crate) const fn kind(&self) -> &'static str {
        match self {
            Self::Object(_) => "object",
            Self::Array(_) => "array",
            Self::Leaf(_) => "leaf",
            Self::Null => "null",
        }
    }

    pub(crate) fn text(value: impl Into<String>) -> Self {
        Self::Leaf(Leaf::Text(value.into()))
    }
}

/// Insert into an ordered object, replacing an earlier entry with the same
/// key in place.
pub(crate) fn insert(entries: &mut Vec<(String, Node)>, key: String, node: Node) {
    match entries.iter_mut().find(|(existing, _)| *existing == key) {
        Some((_, slot)) => *slot = node,
        None => entries.push((key, node)),
    }
}

/// A flattened field: bracket-path name and its value (`None` for null).
pub type Field = (String, Option<Leaf>);

/// Flatten an object tree into bracket-path named fields.
///
/// `{"a": {"b": [1, 2]}}` becomes `a[b][]=1`, `a[b][]=2`. Empty arrays and
/// objects produce no fields.
///
/// # Errors
///
/// Fails when the root is not an object.
pub fn flatten(root: Node, keys: &KeyStrategy) -> Result<Vec<Field>> {
    let Node::Object(entries) = root else {
        return Err(Error::encoding_failed(
            "",
            format!(
                "top-level value must encode as an object, found {}",
                root.kind()
            ),
        ));
    };

    let mut fields = Vec::new();
    for (key, node) in entries {
        descend(node, keys.apply(&key), keys, &mut fields);
    }
    Ok(fields)
}

fn descend(node: Node, name: String, keys: &KeyStrategy, out: &mut Vec<Field>) {
    match node {
        Node::Leaf(leaf) => out.push((name, Some(leaf))),
        Node::Null => out.push((name, None)),
        Node::Array(items) => {
            for item in items {
                descend(item, format!("{name}[]"), keys, out);
            }
        }
        Node::Object(entries) => {
            for (key, child) in entries {
                let child_name = format!("{name}[{}]", keys.apply(&key));
                descend(child, child_name, keys, out);
            }
        }
    }
}
