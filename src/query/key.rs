//! Cache Key Derivation
//!
//! Turns an ordered list of identifying strings into a fixed-width
//! fingerprint. Query-cache keys bind the normalized statement text, the
//! connection identity and the effective role, so two roles running the same
//! statement over the same connection never share an entry.

use std::fmt;

use md5::{Digest, Md5};

use crate::query::DatabaseRole;

/// Namespace component for query-result keys.
const QUERY_NAMESPACE: &str = "query";
/// Namespace component for metadata keys.
const METADATA_NAMESPACE: &str = "metadata";

// == Cache Key ==
/// A 128-bit fingerprint rendered as 32 lowercase hex characters.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CacheKey(String);

impl CacheKey {
    /// Fingerprints an ordered list of components.
    ///
    /// Each component is length-prefixed before hashing, so no choice of
    /// separator characters inside a component can make two different lists
    /// hash the same input.
    pub fn build<I, S>(components: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut hasher = Md5::new();
        for component in components {
            let component = component.as_ref();
            hasher.update(component.len().to_string().as_bytes());
            hasher.update(b":");
            hasher.update(component.as_bytes());
            hasher.update(b"|");
        }
        Self(format!("{:x}", hasher.finalize()))
    }

    /// Key for a query result as seen by `role` over `connection`.
    pub fn for_query(sql: &str, connection: &str, role: &DatabaseRole) -> Self {
        let normalized = normalize_query(sql);
        Self::build([
            QUERY_NAMESPACE,
            normalized.as_str(),
            connection,
            role.as_str(),
        ])
    }

    /// Key for a metadata lookup (schemas, tables, table info...) scoped the
    /// same way as query results.
    pub fn for_metadata(
        category: &str,
        connection: &str,
        role: &DatabaseRole,
        parts: &[&str],
    ) -> Self {
        let components = [METADATA_NAMESPACE, category, connection, role.as_str()]
            .into_iter()
            .chain(parts.iter().copied());
        Self::build(components)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl AsRef<str> for CacheKey {
    fn as_ref(&self) -> &str {
        &self.0
    }
}

impl From<CacheKey> for String {
    fn from(key: CacheKey) -> Self {
        key.0
    }
}

// == Query Normalization ==
/// Canonical form of a statement for keying.
///
/// Leading and trailing whitespace and trailing semicolons are dropped and
/// runs of whitespace between tokens collapse to one space. Quoted literals
/// (including `E'...'` escapes and `$tag$...$tag$` bodies), quoted
/// identifiers and comments are kept byte for byte, so `'a  b'` and `'a b'`
/// stay distinct and a line comment keeps the newline that ends it. Case is
/// preserved.
pub fn normalize_query(sql: &str) -> String {
    let trimmed = sql.trim().trim_end_matches(|c: char| c == ';' || c.is_whitespace());

    let mut normalized = String::with_capacity(trimmed.len());
    let mut pending_space = false;
    let mut rest = trimmed;

    while let Some(c) = rest.chars().next() {
        if c.is_whitespace() {
            pending_space = true;
            rest = &rest[c.len_utf8()..];
            continue;
        }
        if pending_space {
            normalized.push(' ');
            pending_space = false;
        }
        let len = verbatim_len(rest).unwrap_or(c.len_utf8());
        normalized.push_str(&rest[..len]);
        rest = &rest[len..];
    }

    normalized
}

/// Length of the literal, quoted identifier or comment opening `text`.
///
/// Unterminated spans run to the end of the text.
fn verbatim_len(text: &str) -> Option<usize> {
    match text.as_bytes().first()? {
        b'\'' => Some(quoted_len(text, b'\'')),
        b'"' => Some(quoted_len(text, b'"')),
        b'-' if text.starts_with("--") => Some(text.find('\n').map_or(text.len(), |i| i + 1)),
        b'/' if text.starts_with("/*") => Some(block_comment_len(text)),
        b'$' => dollar_quoted_len(text),
        _ => None,
    }
}

/// A backslash always skips the next byte, which covers `E'...'` escapes.
/// Doubled quotes close and immediately reopen the span.
fn quoted_len(text: &str, quote: u8) -> usize {
    let bytes = text.as_bytes();
    let mut i = 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 2,
            b if b == quote => return i + 1,
            _ => i += 1,
        }
    }
    bytes.len()
}

/// Block comments nest.
fn block_comment_len(text: &str) -> usize {
    let bytes = text.as_bytes();
    let mut depth = 0usize;
    let mut i = 0;
    while i + 1 < bytes.len() {
        match (bytes[i], bytes[i + 1]) {
            (b'/', b'*') => {
                depth += 1;
                i += 2;
            }
            (b'*', b'/') => {
                depth -= 1;
                i += 2;
                if depth == 0 {
                    return i;
                }
            }
            _ => i += 1,
        }
    }
    bytes.len()
}

/// `$$...$$` or `$tag$...$tag$`. Positional parameters such as `$1` are not
/// delimiters.
fn dollar_quoted_len(text: &str) -> Option<usize> {
    let after = &text[1..];
    let tag_len = after.find('$')?;
    let tag = &after[..tag_len];
    let valid_tag = tag
        .chars()
        .enumerate()
        .all(|(i, c)| c == '_' || c.is_alphabetic() || (i > 0 && c.is_ascii_digit()));
    if !valid_tag {
        return None;
    }

    let delimiter = &text[..tag_len + 2];
    let body = &text[delimiter.len()..];
    Some(
        body.find(delimiter)
            .map_or(text.len(), |end| 2 * delimiter.len() + end),
    )
}
