//! JSON body codec and the [`Nothing`] placeholder type.

use bytes::Bytes;
use serde::de::{Deserialize, Deserializer, IgnoredAny};
use serde::ser::{Serialize, SerializeStruct, Serializer};

use crate::{Error, Result};

/// Content type for request bodies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ContentType {
    /// JSON content type (`application/json`).
    Json,
    /// Binary content type (`application/octet-stream`).
    OctetStream,
}

impl ContentType {
    /// Get the MIME type string.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Json => "application/json",
            Self::OctetStream => "application/octet-stream",
        }
    }
}

impl std::fmt::Display for ContentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Serialize a value to JSON bytes.
///
/// Failures carry the path of the offending field.
///
/// # Example
///
/// ```
/// use resting_core::to_json;
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Post { title: String }
///
/// let post = Post { title: "Hello".to_string() };
/// let bytes = to_json(&post).expect("serialize");
/// assert_eq!(bytes.as_ref(), br#"{"title":"Hello"}"#);
/// ```
pub fn to_json<T: Serialize + ?Sized>(value: &T) -> Result<Bytes> {
    let mut out = Vec::with_capacity(128);
    let mut serializer = serde_json::Serializer::new(&mut out);
    serde_path_to_error::serialize(value, &mut serializer)
        .map_err(|e| Error::encoding_failed(e.path().to_string(), e.inner().to_string()))?;
    Ok(Bytes::from(out))
}

/// Deserialize JSON bytes to a value with path-aware error messages.
///
/// # Example
///
/// ```
/// use resting_core::from_json;
/// use serde::Deserialize;
///
/// #[derive(Debug, PartialEq, Deserialize)]
/// struct Post { id: u64 }
///
/// let post: Post = from_json(br#"{"id":1}"#).expect("deserialize");
/// assert_eq!(post, Post { id: 1 });
/// ```
pub fn from_json<T: serde::de::DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let mut deserializer = serde_json::Deserializer::from_slice(bytes);
    serde_path_to_error::deserialize(&mut deserializer)
        .map_err(|e| Error::decode(e.path().to_string(), e.inner().to_string()))
}

// ============================================================================
// Nothing
// ============================================================================

/// Placeholder for "no body" on either side of a request.
///
/// As a request body it encodes as an empty object: `{}` in JSON, no fields
/// for query and multipart. As a response type it accepts any body, and
/// [`perform_empty`](../resting/struct.RestingClient.html) skips decoding
/// entirely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Nothing;

impl Serialize for Nothing {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.serialize_struct("Nothing", 0)?.end()
    }
}

impl<'de> Deserialize<'de> for Nothing {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        IgnoredAny::deserialize(deserializer).map(|_| Self)
    }
}
