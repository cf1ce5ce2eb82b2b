//! Identifier validation to prevent SQL injection and ensure valid PostgreSQL identifiers.

use relrank_core::defaults::{LOOKUP_SEP, MAX_IDENTIFIER_LEN};
use relrank_core::{Error, Result};

/// Validate a table, column or annotation name.
///
/// Identifiers must:
/// - Not be empty
/// - Not exceed 63 characters (PostgreSQL identifier limit)
/// - Contain only ASCII alphanumeric characters and underscores
/// - Not start with a digit
///
/// Valid names are always emitted double-quoted, so SQL keywords are allowed.
///
/// # Examples
///
/// ```
/// use relrank_db::validate_identifier;
///
/// assert!(validate_identifier("product").is_ok());
/// assert!(validate_identifier("name_similarity").is_ok());
/// assert!(validate_identifier("123invalid").is_err());
/// assert!(validate_identifier("").is_err());
/// ```
pub fn validate_identifier(name: &str) -> Result<()> {
    if name.is_empty() {
        return Err(Error::InvalidIdentifier(
            "identifier cannot be empty".to_string(),
        ));
    }

    if name.len() > MAX_IDENTIFIER_LEN {
        return Err(Error::InvalidIdentifier(format!(
            "'{}' exceeds {} character limit: {} characters",
            name,
            MAX_IDENTIFIER_LEN,
            name.len()
        )));
    }

    if let Some(first) = name.chars().next() {
        if !first.is_ascii_alphabetic() && first != '_' {
            return Err(Error::InvalidIdentifier(format!(
                "'{}' must start with a letter or underscore, found: '{}'",
                name, first
            )));
        }
    }

    if let Some(ch) = name
        .chars()
        .find(|ch| !ch.is_ascii_alphanumeric() && *ch != '_')
    {
        return Err(Error::InvalidIdentifier(format!(
            "'{}' contains invalid character: '{}'. Only alphanumeric and underscore allowed",
            name, ch
        )));
    }

    Ok(())
}

/// Double-quote a validated identifier.
pub fn quote_ident(name: &str) -> Result<String> {
    validate_identifier(name)?;
    Ok(format!("\"{}\"", name))
}

/// Lower a field path to a SQL expression on `alias`.
///
/// `name` becomes `t."name"`; `meta__brand__name` reads the JSON path
/// `{brand,name}` from the `meta` column as text.
pub fn field_sql(alias: &str, path: &str) -> Result<String> {
    let mut segments = path.split(LOOKUP_SEP);
    let column = segments.next().unwrap_or_default();
    let column = format!("{}.{}", alias, quote_ident(column)?);

    let rest: Vec<&str> = segments.collect();
    if rest.is_empty() {
        return Ok(column);
    }
    for segment in &rest {
        validate_identifier(segment).map_err(|_| Error::UnknownField(path.to_string()))?;
    }
    Ok(format!("({} #>> '{{{}}}')", column, rest.join(",")))
}
