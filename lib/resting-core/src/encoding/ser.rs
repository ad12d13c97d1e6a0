//! Serde serializer building the intermediate [`Node`] tree.
//!
//! Each `serialize_*` call consumes the serializer and returns the finished
//! node for its position; containers collect their children's returned nodes
//! and are only handed to the parent once `end` is called. A position can
//! therefore never be claimed by two container kinds.

use std::fmt;
use std::path::PathBuf;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use derive_more::{Display, Error};
use serde::ser::{self, Serialize};

use super::markers::{DATE_TOKEN, FILE_REF_TOKEN};
use super::tree::{Leaf, Node, insert};
use super::{BinaryStrategy, DateStrategy};

/// Build the tree for `value`.
pub(crate) fn to_tree<T: Serialize + ?Sized>(
    value: &T,
    dates: &DateStrategy,
    binary: &BinaryStrategy,
) -> crate::Result<Node> {
    value
        .serialize(TreeSerializer { dates, binary })
        .map_err(Into::into)
}

// ============================================================================
// Error with path
// ============================================================================

#[derive(Debug, Clone)]
enum Segment {
    Key(String),
    Index(usize),
}

/// Serializer error; the path is collected innermost-first while unwinding.
#[derive(Debug, Display, Error)]
#[display("{reason}")]
pub(crate) struct TreeError {
    #[error(not(source))]
    reason: String,
    #[error(not(source))]
    path: Vec<Segment>,
}

impl TreeError {
    fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
            path: Vec::new(),
        }
    }

    fn at(mut self, segment: Segment) -> Self {
        self.path.push(segment);
        self
    }

    fn rendered_path(&self) -> String {
        let mut out = String::new();
        for (i, segment) in self.path.iter().rev().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => out.push_str(key),
                Segment::Key(key) => {
                    out.push('[');
                    out.push_str(key);
                    out.push(']');
                }
                Segment::Index(index) => {
                    out.push('[');
                    out.push_str(&index.to_string());
                    out.push(']');
                }
            }
        }
        out
    }
}

impl ser::Error for TreeError {
    fn custom<T: fmt::Display>(msg: T) -> Self {
        Self::new(msg.to_string())
    }
}

impl From<TreeError> for crate::Error {
    fn from(err: TreeError) -> Self {
        Self::encoding_failed(err.rendered_path(), err.reason)
    }
}

// ============================================================================
// Serializer
// ============================================================================

#[derive(Clone, Copy)]
struct TreeSerializer<'a> {
    dates: &'a DateStrategy,
    binary: &'a BinaryStrategy,
}

impl<'a> TreeSerializer<'a> {
    fn child<T: Serialize + ?Sized>(self, value: &T, segment: Segment) -> Result<Node, TreeError> {
        value.serialize(self).map_err(|e| e.at(segment))
    }

    fn text<T: Serialize + ?Sized>(self, value: &T, what: &str) -> Result<String, TreeError> {
        match value.serialize(self)? {
            Node::Leaf(Leaf::Text(text)) => Ok(text),
            other => Err(TreeError::new(format!(
                "{what} must serialize as a string, found {}",
                other.kind()
            ))),
        }
    }

    fn date<T: Serialize + ?Sized>(self, value: &T) -> Result<Node, TreeError> {
        let raw = self.text(value, "date")?;
        let date = DateTime::parse_from_rfc3339(&raw)
            .map_err(|e| TreeError::new(format!("invalid date `{raw}`: {e}")))?
            .with_timezone(&Utc);
        self.dates.format(&date).map(Node::text).map_err(TreeError::new)
    }
}

macro_rules! display_leaf {
    ($($method:ident: $ty:ty),* $(,)?) => {
        $(
            fn $method(self, v: $ty) -> Result<Node, TreeError> {
                Ok(Node::text(v.to_string()))
            }
        )*
    };
}

impl<'a> ser::Serializer for TreeSerializer<'a> {
    type Ok = Node;
    type Error = TreeError;

    type SerializeSeq = SeqBuilder<'a>;
    type SerializeTuple = SeqBuilder<'a>;
    type SerializeTupleStruct = SeqBuilder<'a>;
    type SerializeTupleVariant = VariantBuilder<SeqBuilder<'a>>;
    type SerializeMap = MapBuilder<'a>;
    type SerializeStruct = MapBuilder<'a>;
    type SerializeStructVariant = VariantBuilder<MapBuilder<'a>>;

    display_leaf! {
        serialize_bool: bool,
        serialize_i8: i8,
        serialize_i16: i16,
        serialize_i32: i32,
        serialize_i64: i64,
        serialize_i128: i128,
        serialize_u8: u8,
        serialize_u16: u16,
        serialize_u32: u32,
        serialize_u64: u64,
        serialize_u128: u128,
        serialize_f32: f32,
        serialize_f64: f64,
        serialize_char: char,
    }

    fn serialize_str(self, v: &str) -> Result<Node, TreeError> {
        Ok(Node::text(v))
    }

    fn serialize_bytes(self, v: &[u8]) -> Result<Node, TreeError> {
        Ok(match self.binary.to_text(v) {
            Some(text) => Node::text(text),
            None => Node::Leaf(Leaf::Bytes(Bytes::copy_from_slice(v))),
        })
    }

    fn serialize_none(self) -> Result<Node, TreeError> {
        Ok(Node::Null)
    }

    fn serialize_some<T: Serialize + ?Sized>(self, value: &T) -> Result<Node, TreeError> {
        value.serialize(self)
    }

    fn serialize_unit(self) -> Result<Node, TreeError> {
        Ok(Node::Null)
    }

    fn serialize_unit_struct(self, _name: &'static str) -> Result<Node, TreeError> {
        Ok(Node::Null)
    }

    fn serialize_unit_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
    ) -> Result<Node, TreeError> {
        Ok(Node::text(variant))
    }

    fn serialize_newtype_struct<T: Serialize + ?Sized>(
        self,
        name: &'static str,
        value: &T,
    ) -> Result<Node, TreeError> {
        match name {
            FILE_REF_TOKEN => {
                let path = self.text(value, "file reference")?;
                Ok(Node::Leaf(Leaf::File(PathBuf::from(path))))
            }
            DATE_TOKEN => self.date(value),
            _ => value.serialize(self),
        }
    }

    fn serialize_newtype_variant<T: Serialize + ?Sized>(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        value: &T,
    ) -> Result<Node, TreeError> {
        let node = self.child(value, Segment::Key(variant.to_string()))?;
        Ok(tagged(variant, node))
    }

    fn serialize_seq(self, len: Option<usize>) -> Result<SeqBuilder<'a>, TreeError> {
        Ok(SeqBuilder {
            serializer: self,
            items: Vec::with_capacity(len.unwrap_or(0)),
        })
    }

    fn serialize_tuple(self, len: usize) -> Result<SeqBuilder<'a>, TreeError> {
        ser::Serializer::serialize_seq(self, Some(len))
    }

    fn serialize_tuple_struct(
        self,
        _name: &'static str,
        len: usize,
    ) -> Result<SeqBuilder<'a>, TreeError> {
        ser::Serializer::serialize_seq(self, Some(len))
    }

    fn serialize_tuple_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeTupleVariant, TreeError> {
        Ok(VariantBuilder {
            variant,
            inner: ser::Serializer::serialize_seq(self, Some(len))?,
        })
    }

    fn serialize_map(self, len: Option<usize>) -> Result<MapBuilder<'a>, TreeError> {
        Ok(MapBuilder {
            serializer: self,
            entries: Vec::with_capacity(len.unwrap_or(0)),
            pending_key: None,
        })
    }

    fn serialize_struct(self, _name: &'static str, len: usize) -> Result<MapBuilder<'a>, TreeError> {
        ser::Serializer::serialize_map(self, Some(len))
    }

    fn serialize_struct_variant(
        self,
        _name: &'static str,
        _index: u32,
        variant: &'static str,
        len: usize,
    ) -> Result<Self::SerializeStructVariant, TreeError> {
        Ok(VariantBuilder {
            variant,
            inner: ser::Serializer::serialize_map(self, Some(len))?,
        })
    }
}

// ============================================================================
// Containers
// ============================================================================

struct SeqBuilder<'a> {
    serializer: TreeSerializer<'a>,
    items: Vec<Node>,
}

impl ser::SerializeSeq for SeqBuilder<'_> {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), TreeError> {
        let index = self.items.len();
        let node = self.serializer.child(value, Segment::Index(index))?;
        self.items.push(node);
        Ok(())
    }

    fn end(self) -> Result<Node, TreeError> {
        Ok(Node::Array(self.items))
    }
}

impl ser::SerializeTuple for SeqBuilder<'_> {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_element<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), TreeError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node, TreeError> {
        ser::SerializeSeq::end(self)
    }
}

impl ser::SerializeTupleStruct for SeqBuilder<'_> {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), TreeError> {
        ser::SerializeSeq::serialize_element(self, value)
    }

    fn end(self) -> Result<Node, TreeError> {
        ser::SerializeSeq::end(self)
    }
}

struct MapBuilder<'a> {
    serializer: TreeSerializer<'a>,
    entries: Vec<(String, Node)>,
    pending_key: Option<String>,
}

impl ser::SerializeMap for MapBuilder<'_> {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_key<T: Serialize + ?Sized>(&mut self, key: &T) -> Result<(), TreeError> {
        let key = self.serializer.text(key, "map key")?;
        self.pending_key = Some(key);
        Ok(())
    }

    fn serialize_value<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), TreeError> {
        let Some(key) = self.pending_key.take() else {
            panic!("map value serialized without a key");
        };
        let node = self.serializer.child(value, Segment::Key(key.clone()))?;
        insert(&mut self.entries, key, node);
        Ok(())
    }

    fn end(self) -> Result<Node, TreeError> {
        Ok(Node::Object(self.entries))
    }
}

impl ser::SerializeStruct for MapBuilder<'_> {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), TreeError> {
        let node = self.serializer.child(value, Segment::Key(key.to_string()))?;
        insert(&mut self.entries, key.to_string(), node);
        Ok(())
    }

    fn end(self) -> Result<Node, TreeError> {
        Ok(Node::Object(self.entries))
    }
}

/// Externally tagged enum variant: `{variant: inner}`.
struct VariantBuilder<B> {
    variant: &'static str,
    inner: B,
}

fn tagged(variant: &'static str, inner: Node) -> Node {
    Node::Object(vec![(variant.to_string(), inner)])
}

impl<B> VariantBuilder<B> {
    fn tag(&self, err: TreeError) -> TreeError {
        err.at(Segment::Key(self.variant.to_string()))
    }
}

impl ser::SerializeTupleVariant for VariantBuilder<SeqBuilder<'_>> {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_field<T: Serialize + ?Sized>(&mut self, value: &T) -> Result<(), TreeError> {
        ser::SerializeSeq::serialize_element(&mut self.inner, value).map_err(|e| self.tag(e))
    }

    fn end(self) -> Result<Node, TreeError> {
        let node = ser::SerializeSeq::end(self.inner)?;
        Ok(tagged(self.variant, node))
    }
}

impl ser::SerializeStructVariant for VariantBuilder<MapBuilder<'_>> {
    type Ok = Node;
    type Error = TreeError;

    fn serialize_field<T: Serialize + ?Sized>(
        &mut self,
        key: &'static str,
        value: &T,
    ) -> Result<(), TreeError> {
        ser::SerializeStruct::serialize_field(&mut self.inner, key, value).map_err(|e| self.tag(e))
    }

    fn end(self) -> Result<Node, TreeError> {
        let node = ser::SerializeStruct::end(self.inner)?;
        Ok(tagged(self.variant, node))
    }
}
