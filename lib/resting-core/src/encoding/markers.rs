//! Values that declare themselves as files or dates.
//!
//! Both serialize as a newtype struct with a reserved name. The tree
//! serializer recognises the name and classifies the leaf; every other
//! serializer sees the inner value (a path string, an RFC 3339 string).

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Deserializer, Serialize, Serializer};

pub(crate) const FILE_REF_TOKEN: &str = "$resting::FileRef";
pub(crate) const DATE_TOKEN: &str = "$resting::Date";

/// A reference to a file on disk, sent as a file part by the multipart
/// encoder.
///
/// ```
/// use resting_core::FileRef;
///
/// #[derive(serde::Serialize)]
/// struct Upload {
///     title: String,
///     attachment: FileRef,
/// }
///
/// let upload = Upload {
///     title: "report".to_string(),
///     attachment: FileRef::new("/tmp/report.pdf"),
/// };
/// # let _ = upload;
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct FileRef(PathBuf);

impl FileRef {
    /// Reference the file at `path`.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self(path.into())
    }

    /// Referenced path.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.0
    }
}

impl Serialize for FileRef {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_newtype_struct(FILE_REF_TOKEN, &self.0)
    }
}

impl From<PathBuf> for FileRef {
    fn from(path: PathBuf) -> Self {
        Self(path)
    }
}

/// A UTC timestamp rendered with the encoder's
/// [`DateStrategy`](super::DateStrategy).
///
/// Plain `chrono::DateTime` values are still accepted but always encode
/// with their own RFC 3339 text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Date(pub DateTime<Utc>);

impl Date {
    /// Current time.
    #[must_use]
    pub fn now() -> Self {
        Self(Utc::now())
    }
}

impl From<DateTime<Utc>> for Date {
    fn from(value: DateTime<Utc>) -> Self {
        Self(value)
    }
}

impl Serialize for Date {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let text = self.0.to_rfc3339_opts(SecondsFormat::AutoSi, true);
        serializer.serialize_newtype_struct(DATE_TOKEN, &text)
    }
}

impl<'de> Deserialize<'de> for Date {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        DateTime::<Utc>::deserialize(deserializer).map(Self)
    }
}
