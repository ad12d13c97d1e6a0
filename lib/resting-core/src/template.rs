//! Path template rendering.
//!
//! Templates use mustache-style placeholders: `/users/{{id}}/posts/{{ post_id }}`.
//! Substituted values are percent-encoded as single path segments.

use std::collections::HashMap;

use percent_encoding::{AsciiSet, CONTROLS, utf8_percent_encode};

use crate::{Error, Result};

/// Everything but unreserved characters and sub-delims.
const PATH_SEGMENT_ENCODE_SET: &AsciiSet = &CONTROLS
    .add(b' ')
    .add(b'"')
    .add(b'#')
    .add(b'<')
    .add(b'>')
    .add(b'`')
    .add(b'?')
    .add(b'{')
    .add(b'}')
    .add(b'/')
    .add(b'\\')
    .add(b'%');

const OPEN: &str = "{{";
const CLOSE: &str = "}}";

/// Render a path template against a set of variables.
///
/// # Errors
///
/// Returns [`Error::InvalidPath`] for an unclosed or empty placeholder, or a
/// placeholder without a matching variable.
///
/// # Example
///
/// ```
/// use std::collections::HashMap;
/// use resting_core::render_path;
///
/// let vars = HashMap::from([("id".to_string(), "a b".to_string())]);
/// assert_eq!(render_path("/posts/{{id}}", &vars).expect("render"), "/posts/a%20b");
/// ```
pub fn render_path(template: &str, variables: &HashMap<String, String>) -> Result<String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find(OPEN) {
        let (literal, tail) = rest.split_at(start);
        out.push_str(literal);

        let tail = tail.strip_prefix(OPEN).unwrap_or(tail);
        let Some(end) = tail.find(CLOSE) else {
            return Err(Error::invalid_path(format!(
                "unclosed placeholder in template `{template}`"
            )));
        };
        let (name, after) = tail.split_at(end);
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::invalid_path(format!(
                "empty placeholder in template `{template}`"
            )));
        }

        let value = variables.get(name).ok_or_else(|| {
            Error::invalid_path(format!("missing path variable `{name}` for `{template}`"))
        })?;
        out.extend(utf8_percent_encode(value, PATH_SEGMENT_ENCODE_SET));

        rest = after.strip_prefix(CLOSE).unwrap_or(after);
    }
    out.push_str(rest);

    Ok(out)
}
