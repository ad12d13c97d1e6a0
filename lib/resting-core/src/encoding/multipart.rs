//! Multipart form flattener.

use serde::Serialize;

use super::tree::{Leaf, flatten};
use super::{BinaryStrategy, DateStrategy, KeyStrategy, to_tree};
use crate::{Form, Part, Result};

/// Flattens a value into multipart form fields.
///
/// Text leaves become plain fields, binary leaves raw fields, nulls the text
/// `null`, and [`FileRef`](crate::FileRef) leaves file parts read from disk
/// when the body is built.
#[derive(Debug, Clone)]
pub struct MultipartEncoder {
    keys: KeyStrategy,
    dates: DateStrategy,
    binary: BinaryStrategy,
}

impl Default for MultipartEncoder {
    fn default() -> Self {
        Self {
            keys: KeyStrategy::default(),
            dates: DateStrategy::default(),
            binary: BinaryStrategy::Raw,
        }
    }
}

impl MultipartEncoder {
    /// Identity keys, RFC 3339 dates, raw binary.
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

    /// Set the binary strategy.
    #[must_use]
    pub fn with_binary_strategy(mut self, binary: BinaryStrategy) -> Self {
        self.binary = binary;
        self
    }

    /// Flatten `value` into a form with a fresh boundary.
    ///
    /// # Errors
    ///
    /// Fails for non-object values or when a leaf cannot be formatted.
    pub fn encode<T: Serialize + ?Sized>(&self, value: &T) -> Result<Form> {
        self.encode_into(value, Form::new())
    }

    /// Flatten `value`, appending its fields to `form`.
    pub fn encode_into<T: Serialize + ?Sized>(&self, value: &T, mut form: Form) -> Result<Form> {
        let tree = to_tree(value, &self.dates, &self.binary)?;
        for (name, leaf) in flatten(tree, &self.keys)? {
            let part = match leaf {
                None => Part::field(name, "null"),
                Some(Leaf::Text(text)) => Part::field(name, text),
                Some(Leaf::Bytes(data)) => Part::new(name, data),
                Some(Leaf::File(path)) => Part::file(name, path),
            };
            form.push(part);
        }
        Ok(form)
    }
}

#[cfg(test)]
mod tests {
    use std::path::PathBuf;

    use bytes::Bytes;
    use serde::Serialize;

    use super::*;
    use crate::{Error, FileRef, PartSource};

    #[derive(Serialize)]
    struct Upload {
        title: &'static str,
        tags: Vec<&'static str>,
        cover: FileRef,
        thumbnail: Bytes,
        caption: Option<&'static str>,
    }

    fn upload() -> Upload {
        Upload {
            title: "Trip",
            tags: vec!["sea", "sun"],
            cover: FileRef::new("/tmp/cover.png"),
            thumbnail: Bytes::from_static(b"thumb"),
            caption: None,
        }
    }

    fn summary(form: &Form) -> Vec<String> {
        form.parts()
            .iter()
            .map(|part| match part.source() {
                PartSource::Bytes(data) => {
                    format!("{}={}", part.name(), String::from_utf8_lossy(data))
                }
                PartSource::File(path) => format!("{}=@{}", part.name(), path.display()),
            })
            .collect()
    }

    #[test]
    fn flattens_into_parts() {
        let form = MultipartEncoder::new().encode(&upload()).expect("encode");

        insta::assert_snapshot!(summary(&form).join("\n"), @r"
        title=Trip
        tags[]=sea
        tags[]=sun
        cover=@/tmp/cover.png
        thumbnail=thumb
        caption=null
        ");
    }

    #[test]
    fn file_parts_carry_metadata() {
        let form = MultipartEncoder::new().encode(&upload()).expect("encode");
        let cover = form
            .parts()
            .iter()
            .find(|part| part.name() == "cover")
            .expect("cover part");

        assert_eq!(cover.filename(), Some("cover.png"));
        assert_eq!(cover.content_type(), Some("image/png"));
        assert_eq!(cover.source(), &PartSource::File(PathBuf::from("/tmp/cover.png")));
        assert!(form.has_files());
    }

    #[test]
    fn binary_strategy_can_encode_text() {
        let form = MultipartEncoder::new()
            .with_binary_strategy(BinaryStrategy::Base64)
            .encode(&upload())
            .expect("encode");
        let thumbnail = form
            .parts()
            .iter()
            .find(|part| part.name() == "thumbnail")
            .expect("thumbnail part");
        assert_eq!(
            thumbnail.source(),
            &PartSource::Bytes(Bytes::from_static(b"dGh1bWI="))
        );
    }

    #[test]
    fn non_object_root_is_rejected() {
        let err = MultipartEncoder::new()
            .encode(&"just text")
            .expect_err("string root");
        assert!(matches!(err, Error::EncodingFailed { .. }));
    }
}
