//! Multipart form data bodies.
//!
//! A [`Form`] is a list of [`Part`]s whose content is either in memory or a
//! file on disk. It can be encoded into a single buffer, or staged into a
//! temporary file for streamed uploads.
//!
//! # Example
//!
//! ```
//! use resting_core::{Form, Part};
//!
//! let form = Form::with_boundary("b")
//!     .part(Part::field("title", "Hello"))
//!     .part(Part::new("blob", vec![1_u8, 2, 3]));
//!
//! let body = form.encode().expect("encode");
//! assert!(body.starts_with(b"--b\r\n"));
//! ```

use std::borrow::Cow;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use bytes::{BufMut, Bytes, BytesMut};
use tempfile::TempPath;
use uuid::Uuid;

use crate::{ContentType, Result};

/// Content of a part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PartSource {
    /// In-memory data.
    Bytes(Bytes),
    /// Read from disk when the body is built.
    File(PathBuf),
}

/// A single part in a multipart form.
#[derive(Debug, Clone)]
pub struct Part {
    name: String,
    filename: Option<String>,
    content_type: Option<String>,
    source: PartSource,
}

impl Part {
    /// Create a part with in-memory data and no content type.
    #[must_use]
    pub fn new(name: impl Into<String>, data: impl Into<Bytes>) -> Self {
        Self {
            name: name.into(),
            filename: None,
            content_type: None,
            source: PartSource::Bytes(data.into()),
        }
    }

    /// Create a plain form field.
    #[must_use]
    pub fn field(name: impl Into<String>, value: impl Into<String>) -> Self {
        Self::new(name, Bytes::from(value.into()))
    }

    /// Create a file part read from `path`.
    ///
    /// The filename is the last path component; the content type is guessed
    /// from its extension.
    #[must_use]
    pub fn file(name: impl Into<String>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let filename = path
            .file_name()
            .map(|f| f.to_string_lossy().into_owned())
            .unwrap_or_default();
        let content_type = guess_content_type(&filename);
        Self {
            name: name.into(),
            filename: Some(filename),
            content_type: Some(content_type.to_string()),
            source: PartSource::File(path),
        }
    }

    /// Set the filename for this part.
    #[must_use]
    pub fn with_filename(mut self, filename: impl Into<String>) -> Self {
        self.filename = Some(filename.into());
        self
    }

    /// Set the content type for this part.
    #[must_use]
    pub fn with_content_type(mut self, content_type: impl Into<String>) -> Self {
        self.content_type = Some(content_type.into());
        self
    }

    /// Get the part name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Get the filename, if set.
    #[must_use]
    pub fn filename(&self) -> Option<&str> {
        self.filename.as_deref()
    }

    /// Get the content type, if set.
    #[must_use]
    pub fn content_type(&self) -> Option<&str> {
        self.content_type.as_deref()
    }

    /// Get the part content.
    #[must_use]
    pub const fn source(&self) -> &PartSource {
        &self.source
    }

    fn write_header(&self, boundary: &str, out: &mut impl Write) -> io::Result<()> {
        write!(out, "--{boundary}\r\n")?;
        write!(
            out,
            "Content-Disposition: form-data; name=\"{}\"",
            escape_quoted(&self.name)
        )?;
        if let Some(filename) = &self.filename {
            write!(out, "; filename=\"{}\"", escape_quoted(filename))?;
        }
        out.write_all(b"\r\n")?;
        if let Some(content_type) = &self.content_type {
            write!(out, "Content-Type: {content_type}\r\n")?;
        }
        out.write_all(b"\r\n")
    }
}

/// Percent-encode the characters that would end a quoted header parameter
/// (`"`, CR, LF), as browsers do for form field names and filenames.
fn escape_quoted(value: &str) -> Cow<'_, str> {
    if !value.contains(['"', '\r', '\n']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 6);
    for c in value.chars() {
        match c {
            '"' => escaped.push_str("%22"),
            '\r' => escaped.push_str("%0D"),
            '\n' => escaped.push_str("%0A"),
            other => escaped.push(other),
        }
    }
    Cow::Owned(escaped)
}

/// Guess the content type from a filename extension.
fn guess_content_type(filename: &str) -> &'static str {
    let extension = Path::new(filename)
        .extension()
        .map(|ext| ext.to_string_lossy().to_lowercase())
        .unwrap_or_default();

    match extension.as_str() {
        "jpg" | "jpeg" => "image/jpeg",
        "png" => "image/png",
        "gif" => "image/gif",
        "webp" => "image/webp",
        "svg" => "image/svg+xml",
        "heic" => "image/heic",
        "pdf" => "application/pdf",
        "txt" => "text/plain",
        "html" | "htm" => "text/html",
        "csv" => "text/csv",
        "md" => "text/markdown",
        "json" => "application/json",
        "xml" => "application/xml",
        "zip" => "application/zip",
        "gz" | "gzip" => "application/gzip",
        "mp3" => "audio/mpeg",
        "m4a" => "audio/mp4",
        "wav" => "audio/wav",
        "mp4" => "video/mp4",
        "mov" => "video/quicktime",
        "webm" => "video/webm",
        _ => ContentType::OctetStream.as_str(),
    }
}

/// A multipart form containing multiple parts.
#[derive(Debug, Clone)]
pub struct Form {
    parts: Vec<Part>,
    boundary: String,
}

impl Default for Form {
    fn default() -> Self {
        Self::new()
    }
}

impl Form {
    /// Create a new empty form with a random boundary.
    #[must_use]
    pub fn new() -> Self {
        Self::with_boundary(format!("resting.boundary.{}", Uuid::new_v4().simple()))
    }

    /// Create a new form with a custom boundary.
    #[must_use]
    pub fn with_boundary(boundary: impl Into<String>) -> Self {
        Self {
            parts: Vec::new(),
            boundary: boundary.into(),
        }
    }

    /// Add a part to the form.
    #[must_use]
    pub fn part(mut self, part: Part) -> Self {
        self.parts.push(part);
        self
    }

    /// Add a part in place.
    pub fn push(&mut self, part: Part) {
        self.parts.push(part);
    }

    /// Get the boundary string.
    #[must_use]
    pub fn boundary(&self) -> &str {
        &self.boundary
    }

    /// Get the parts in this form.
    #[must_use]
    pub fn parts(&self) -> &[Part] {
        &self.parts
    }

    /// `true` when any part is read from disk.
    #[must_use]
    pub fn has_files(&self) -> bool {
        self.parts
            .iter()
            .any(|part| matches!(part.source, PartSource::File(_)))
    }

    /// `multipart/form-data; boundary=<boundary>`.
    #[must_use]
    pub fn content_type(&self) -> String {
        format!("multipart/form-data; boundary={}", self.boundary)
    }

    /// Write the encoded body, streaming file parts from disk.
    ///
    /// Returns the number of bytes written.
    pub fn write_to(&self, out: &mut impl Write) -> Result<u64> {
        let mut out = CountingWriter { inner: out, count: 0 };

        for part in &self.parts {
            part.write_header(&self.boundary, &mut out)?;
            match &part.source {
                PartSource::Bytes(data) => out.write_all(data)?,
                PartSource::File(path) => {
                    let mut file = File::open(path)?;
                    io::copy(&mut file, &mut out)?;
                }
            }
            out.write_all(b"\r\n")?;
        }
        write!(out, "--{}--\r\n", self.boundary)?;
        out.flush()?;

        Ok(out.count)
    }

    /// Encode the whole form into memory.
    pub fn encode(&self) -> Result<Bytes> {
        let mut writer = BytesMut::new().writer();
        self.write_to(&mut writer)?;
        Ok(writer.into_inner().freeze())
    }

    /// Write the encoded form to a new uniquely named file in `dir`.
    ///
    /// The file is deleted when the returned [`TempPath`] is dropped, and
    /// immediately if writing fails.
    pub fn stage_in(&self, dir: &Path) -> Result<TempPath> {
        let file = tempfile::Builder::new()
            .prefix("resting-")
            .suffix(".multipart")
            .tempfile_in(dir)?;

        let mut writer = io::BufWriter::new(file);
        self.write_to(&mut writer)?;
        let file = writer
            .into_inner()
            .map_err(|err| crate::Error::from(err.into_error()))?;

        Ok(file.into_temp_path())
    }
}

struct CountingWriter<'a, W> {
    inner: &'a mut W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<'_, W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let n = self.inner.write(buf)?;
        self.count += n as u64;
        Ok(n)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}
