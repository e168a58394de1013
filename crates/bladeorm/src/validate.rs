//! Built-in value checks for [`Column::with_check`](crate::Column::with_check).
//!
//! Every check lets NULL through; combine with `not_null()` to forbid it.
//!
//! ```ignore
//! let email = Column::text().with_check(validate::email());
//! let age = Column::integer().with_check(validate::range(0.0, 150.0));
//! ```

use crate::error::{OrmError, OrmResult};
use crate::value::Value;
use std::sync::OnceLock;

/// Best-effort email validation.
///
/// This is intentionally not fully RFC-compliant.
pub fn is_email(s: &str) -> bool {
    static EMAIL_RE: OnceLock<Option<regex::Regex>> = OnceLock::new();
    EMAIL_RE
        .get_or_init(|| regex::Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").ok())
        .as_ref()
        .is_some_and(|re| re.is_match(s))
}

pub fn is_url(s: &str) -> bool {
    url::Url::parse(s).is_ok()
}

pub fn is_uuid(s: &str) -> bool {
    uuid::Uuid::parse_str(s).is_ok()
}

fn text_check(f: impl Fn(&str) -> bool + Send + Sync) -> impl Fn(&Value) -> bool + Send + Sync {
    move |value| match value {
        Value::Null => true,
        Value::Text(s) => f(s),
        _ => false,
    }
}

/// Text that looks like an email address.
pub fn email() -> impl Fn(&Value) -> bool + Send + Sync {
    text_check(is_email)
}

/// Text that parses as an absolute URL.
pub fn url() -> impl Fn(&Value) -> bool + Send + Sync {
    text_check(is_url)
}

/// Text that parses as a UUID.
pub fn uuid_string() -> impl Fn(&Value) -> bool + Send + Sync {
    text_check(is_uuid)
}

/// Text matching `pattern`. Fails if the pattern does not compile.
pub fn matches(pattern: &str) -> OrmResult<impl Fn(&Value) -> bool + Send + Sync> {
    let re = regex::Regex::new(pattern)
        .map_err(|e| OrmError::validation(format!("invalid regex pattern {pattern:?}: {e}")))?;
    Ok(text_check(move |s| re.is_match(s)))
}

/// Text of at most `max` characters.
pub fn max_len(max: usize) -> impl Fn(&Value) -> bool + Send + Sync {
    text_check(move |s| s.chars().count() <= max)
}

/// Number within `min..=max`.
pub fn range(min: f64, max: f64) -> impl Fn(&Value) -> bool + Send + Sync {
    move |value| match value {
        Value::Null => true,
        v => v.as_f64().is_some_and(|n| n >= min && n <= max),
    }
}
