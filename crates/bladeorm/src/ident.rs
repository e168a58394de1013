//! SQL identifier checks for table and column names.
//!
//! Names are interpolated into statements verbatim (they never go through
//! the parameter binder), so registration only accepts plain unquoted
//! identifiers: `[A-Za-z_][A-Za-z0-9_$]*`.

use crate::error::{OrmError, OrmResult};

/// Returns `true` if `s` is a valid unquoted identifier.
pub fn is_valid_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    let Some(first) = chars.next() else {
        return false;
    };
    (first.is_ascii_alphabetic() || first == '_')
        && chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '$')
}

/// Validate a table or column name, naming `kind` in the error.
pub(crate) fn check_identifier(kind: &str, s: &str) -> OrmResult<()> {
    if s.is_empty() {
        return Err(OrmError::definition(format!("{kind} name cannot be empty")));
    }
    if s.contains('\0') {
        return Err(OrmError::definition(format!(
            "{kind} name cannot contain NUL character"
        )));
    }
    if !is_valid_identifier(s) {
        return Err(OrmError::definition(format!(
            "invalid {kind} name {s:?}: expected [A-Za-z_][A-Za-z0-9_$]*"
        )));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn accepts_plain_identifiers() {
        assert!(is_valid_identifier("persons"));
        assert!(is_valid_identifier("_tmp$1"));
        assert!(is_valid_identifier("CamelCase"));
    }

    #[test]
    fn rejects_unsafe_identifiers() {
        assert!(!is_valid_identifier(""));
        assert!(!is_valid_identifier("1abc"));
        assert!(!is_valid_identifier("a b"));
        assert!(!is_valid_identifier("a;drop"));
        assert!(!is_valid_identifier("public.users"));
        assert!(!is_valid_identifier("naïve"));
    }

    #[test]
    fn check_reports_definition_error() {
        let err = check_identifier("column", "bad name").unwrap_err();
        assert!(err.is_definition());
        assert!(check_identifier("table", "").unwrap_err().is_definition());
    }
}
