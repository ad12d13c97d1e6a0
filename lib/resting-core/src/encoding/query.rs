//! Query string flattener.

use serde::Serialize;
use url::Url;

use super::tree::{Leaf, flatten};
use super::{BinaryStrategy, DateStrategy, KeyStrategy, to_tree};
use crate::{Error, Result};

/// A query parameter; `None` renders as a bare key (`?flag`).
pub type QueryPair = (String, Option<String>);

/// Flattens a value into bracket-path query parameters.
///
/// ```
/// use resting_core::QueryEncoder;
///
/// #[derive(serde::Serialize)]
/// struct Search {
///     tags: Vec<&'static str>,
/// }
///
/// let pairs = QueryEncoder::new()
///     .encode(&Search { tags: vec!["a", "b"] })
///     .expect("encode");
/// assert_eq!(pairs, vec![
///     ("tags[]".to_string(), Some("a".to_string())),
///     ("tags[]".to_string(), Some("b".to_string())),
/// ]);
/// ```
#[derive(Debug, Clone)]
pub struct QueryEncoder {
    keys: KeyStrategy,
    dates: DateStrategy,
    binary: BinaryStrategy,
}

impl Default for QueryEncoder {
    fn default() -> Self {
        Self {
            keys: KeyStrategy::default(),
            dates: DateStrategy::default(),
            binary: BinaryStrategy::Base64,
        }
    }
}

impl QueryEncoder {
    /// Identity keys, RFC 3339 dates, base64 binary.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the key strategy.
    #[must_use]
    pub fn with_key_strategy(mut self, keys: KeyStrategy) -> Self {
        self.keys = keys;
        self
    }

    /// Set the date strategy.
    #[must_use]
    pub fn with_date_strategy(mut self, dates: DateStrategy) -> Self {
        self.dates = dates;
        self
    }

    /// Set the binary strategy. [`BinaryStrategy::Raw`] makes binary values
    /// fail to encode.
    #[must_use]
    pub fn with_binary_strategy(mut self, binary: BinaryStrategy) -> Self {
        self.binary = binary;
        self
    }

    /// Flatten `value` into ordered query pairs.
    ///
    /// # Errors
    ///
    /// Fails for non-object values, file references and raw binary.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Vec<QueryPair>> {
        let tree = to_tree(value, &self.dates, &self.binary)?;
        flatten(tree, &self.keys)?
            .into_iter()
            .map(|(name, leaf)| match leaf {
                None => Ok((name, None)),
                Some(Leaf::Text(text)) => Ok((name, Some(text))),
                Some(Leaf::Bytes(_)) => Err(Error::encoding_failed(
                    name,
                    "raw binary cannot be sent in a query string",
                )),
                Some(Leaf::File(_)) => Err(Error::encoding_failed(
                    name,
                    "file references are only supported by multipart encoding",
                )),
            })
            .collect()
    }

    /// Encode `value` and append it to the query of `url`.
    ///
    /// Leaves `url` untouched when there is nothing to append, so no bare
    /// `?` is ever added.
    pub fn append_to<T: Serialize + ?Sized>(&self, value: &T, url: &mut Url) -> Result<()> {
        let pairs = self.encode(value)?;
        if pairs.is_empty() {
            return Ok(());
        }

        let mut query = url.query_pairs_mut();
        for (name, value) in &pairs {
            match value {
                Some(value) => query.append_pair(name, value),
                None => query.append_key_only(name),
            };
        }
        Ok(())
    }
}
