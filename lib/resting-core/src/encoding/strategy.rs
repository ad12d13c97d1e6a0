//! Key, date and binary leaf strategies.

use std::fmt::{self, Write as _};
use std::sync::Arc;

use base64::Engine as _;
use base64::engine::general_purpose::STANDARD;
use chrono::{DateTime, SecondsFormat, Utc};

type KeyFn = Arc<dyn Fn(&str) -> String + Send + Sync>;
type DateFn = Arc<dyn Fn(&DateTime<Utc>) -> String + Send + Sync>;
type BinaryFn = Arc<dyn Fn(&[u8]) -> String + Send + Sync>;

// ============================================================================
// Keys
// ============================================================================

/// How a field key is rendered in a flattened field name.
///
/// Applied to every keyed segment, including the first one. Array indices
/// are never transformed (they render as `[]`).
#[derive(Clone, Default)]
pub enum KeyStrategy {
    /// Use keys as declared.
    #[default]
    Identity,
    /// `stringValue` becomes `string_value`, `myURLValue` becomes `my_url_value`.
    SnakeCase,
    /// Caller-provided transform.
    Custom(KeyFn),
}

impl KeyStrategy {
    /// Build a custom strategy from a closure.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&str) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Transform a single key.
    #[must_use]
    pub fn apply(&self, key: &str) -> String {
        match self {
            Self::Identity => key.to_string(),
            Self::SnakeCase => to_snake_case(key),
            Self::Custom(f) => f(key),
        }
    }
}

impl fmt::Debug for KeyStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Identity => f.write_str("Identity"),
            Self::SnakeCase => f.write_str("SnakeCase"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

/// Convert a camelCase key to `snake_case`.
///
/// A run of capitals is kept together as one word, and its last capital
/// starts a new word when followed by a lowercase letter.
#[must_use]
pub fn to_snake_case(key: &str) -> String {
    let mut out = String::with_capacity(key.len() + 4);
    let mut chars = key.chars().peekable();
    let mut prev: Option<char> = None;

    while let Some(c) = chars.next() {
        if c.is_uppercase() {
            let boundary = match prev {
                Some(p) if p.is_lowercase() || p.is_ascii_digit() => true,
                Some(p) if p.is_uppercase() => chars.peek().is_some_and(|n| n.is_lowercase()),
                _ => false,
            };
            if boundary {
                out.push('_');
            }
            out.extend(c.to_lowercase());
        } else {
            out.push(c);
        }
        prev = Some(c);
    }

    out
}

// ============================================================================
// Dates
// ============================================================================

/// How values wrapped in [`Date`](super::Date) are rendered.
#[derive(Clone, Default)]
pub enum DateStrategy {
    /// RFC 3339, the same text the value produces in JSON.
    #[default]
    Deferred,
    /// Seconds since the Unix epoch, fractional when sub-second.
    SecondsSinceEpoch,
    /// Whole milliseconds since the Unix epoch.
    MillisecondsSinceEpoch,
    /// A `chrono` format string, e.g. `"%Y-%m-%d"`.
    Formatted(String),
    /// Caller-provided formatter.
    Custom(DateFn),
}

impl DateStrategy {
    /// Build a custom strategy from a closure.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&DateTime<Utc>) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Render a date.
    ///
    /// # Errors
    ///
    /// Fails only for a [`DateStrategy::Formatted`] pattern chrono rejects.
    #[allow(clippy::cast_precision_loss)]
    pub fn format(&self, date: &DateTime<Utc>) -> Result<String, String> {
        match self {
            Self::Deferred => Ok(date.to_rfc3339_opts(SecondsFormat::AutoSi, true)),
            Self::SecondsSinceEpoch => {
                if date.timestamp_subsec_nanos() == 0 {
                    Ok(date.timestamp().to_string())
                } else {
                    Ok((date.timestamp_micros() as f64 / 1_000_000.0).to_string())
                }
            }
            Self::MillisecondsSinceEpoch => Ok(date.timestamp_millis().to_string()),
            Self::Formatted(pattern) => {
                let mut out = String::new();
                write!(out, "{}", date.format(pattern))
                    .map_err(|_| format!("invalid date format `{pattern}`"))?;
                Ok(out)
            }
            Self::Custom(f) => Ok(f(date)),
        }
    }
}

impl fmt::Debug for DateStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Deferred => f.write_str("Deferred"),
            Self::SecondsSinceEpoch => f.write_str("SecondsSinceEpoch"),
            Self::MillisecondsSinceEpoch => f.write_str("MillisecondsSinceEpoch"),
            Self::Formatted(pattern) => f.debug_tuple("Formatted").field(pattern).finish(),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

// ============================================================================
// Binary
// ============================================================================

/// How binary values (anything serialized through `serialize_bytes`, such as
/// [`bytes::Bytes`]) are rendered.
#[derive(Clone)]
pub enum BinaryStrategy {
    /// Keep the raw bytes. Multipart only.
    Raw,
    /// Standard base64 text.
    Base64,
    /// Caller-provided text rendering.
    Custom(BinaryFn),
}

impl BinaryStrategy {
    /// Build a custom strategy from a closure.
    pub fn custom<F>(f: F) -> Self
    where
        F: Fn(&[u8]) -> String + Send + Sync + 'static,
    {
        Self::Custom(Arc::new(f))
    }

    /// Render as text, or `None` for [`BinaryStrategy::Raw`].
    #[must_use]
    pub fn to_text(&self, data: &[u8]) -> Option<String> {
        match self {
            Self::Raw => None,
            Self::Base64 => Some(STANDARD.encode(data)),
            Self::Custom(f) => Some(f(data)),
        }
    }
}

impl fmt::Debug for BinaryStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Raw => f.write_str("Raw"),
            Self::Base64 => f.write_str("Base64"),
            Self::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn snake_case_conversion() {
        assert_eq!(to_snake_case("stringValue"), "string_value");
        assert_eq!(to_snake_case("myURLProperty"), "my_url_property");
        assert_eq!(to_snake_case("URL"), "url");
        assert_eq!(to_snake_case("already_snake"), "already_snake");
        assert_eq!(to_snake_case("_privateKey"), "_private_key");
        assert_eq!(to_snake_case("version2Name"), "version2_name");
        assert_eq!(to_snake_case(""), "");
    }

    #[test]
    fn key_strategies() {
        assert_eq!(KeyStrategy::Identity.apply("userId"), "userId");
        assert_eq!(KeyStrategy::SnakeCase.apply("userId"), "user_id");
        assert_eq!(KeyStrategy::custom(str::to_uppercase).apply("userId"), "USERID");
    }

    #[test]
    fn date_strategies() {
        let date = Utc
            .with_ymd_and_hms(2024, 1, 2, 3, 4, 5)
            .single()
            .expect("valid date");

        assert_eq!(
            DateStrategy::Deferred.format(&date).as_deref(),
            Ok("2024-01-02T03:04:05Z")
        );
        assert_eq!(
            DateStrategy::SecondsSinceEpoch.format(&date).as_deref(),
            Ok("1704164645")
        );
        assert_eq!(
            DateStrategy::MillisecondsSinceEpoch.format(&date).as_deref(),
            Ok("1704164645000")
        );
        assert_eq!(
            DateStrategy::Formatted("%Y-%m-%d".to_string())
                .format(&date)
                .as_deref(),
            Ok("2024-01-02")
        );
        assert_eq!(
            DateStrategy::custom(|d| d.format("%H:%M").to_string())
                .format(&date)
                .as_deref(),
            Ok("03:04")
        );
    }

    #[test]
    fn fractional_seconds() {
        let date = Utc
            .timestamp_millis_opt(1_500)
            .single()
            .expect("valid date");
        assert_eq!(
            DateStrategy::SecondsSinceEpoch.format(&date).as_deref(),
            Ok("1.5")
        );
    }

    #[test]
    fn invalid_date_pattern_fails() {
        let date = Utc::now();
        assert!(DateStrategy::Formatted("%Q".to_string()).format(&date).is_err());
    }

    #[test]
    fn binary_strategies() {
        assert_eq!(BinaryStrategy::Raw.to_text(b"hi"), None);
        assert_eq!(BinaryStrategy::Base64.to_text(b"hi").as_deref(), Some("aGk="));
        assert_eq!(
            BinaryStrategy::custom(|b| b.len().to_string())
                .to_text(b"hi")
                .as_deref(),
            Some("2")
        );
    }
}
