//! Structured encoding engine.
//!
//! Any `serde::Serialize` value is first turned into a [`Node`] tree, then
//! flattened into bracket-path named fields:
//!
//! | value                              | fields                        |
//! |------------------------------------|-------------------------------|
//! | `{"array": [1, 2]}`                | `array[]=1`, `array[]=2`      |
//! | `{"nested": {"a": "x"}}`           | `nested[a]=x`                 |
//! | `{"flag": null}`                   | `flag` (no value)             |
//!
//! Two flatteners share the engine: [`QueryEncoder`] for URL query strings and
//! [`MultipartEncoder`] for multipart forms. Leaf rendering is controlled by
//! [`KeyStrategy`], [`DateStrategy`] and [`BinaryStrategy`]; values opt into
//! date and file handling by using the [`Date`] and [`FileRef`] wrappers.

mod markers;
mod multipart;
mod query;
mod ser;
mod strategy;
mod tree;

pub use markers::{Date, FileRef};
pub use multipart::MultipartEncoder;
pub use query::{QueryEncoder, QueryPair};
pub use strategy::{BinaryStrategy, DateStrategy, KeyStrategy, to_snake_case};
pub use tree::{Field, Leaf, Node, flatten};

pub(crate) use ser::to_tree;

/// Build the intermediate tree for `value`.
///
/// # Errors
///
/// Fails when a leaf cannot be formatted (bad date pattern, non-scalar map
/// key, non-UTF-8 file path).
pub fn encode_tree<T: serde::Serialize + ?Sized>(
    value: &T,
    dates: &DateStrategy,
    binary: &BinaryStrategy,
) -> crate::Result<Node> {
    to_tree(value, dates, binary)
}
