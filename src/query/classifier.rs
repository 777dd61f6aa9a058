//! Cacheability Classifier
//!
//! Decides by lexical inspection whether a SQL statement may be served from
//! the cache. No parse tree is built: the leading keyword is checked and the
//! identifier words of the raw text are scanned against a deny-list of
//! time-sensitive or non-deterministic functions. Functions missing from the
//! list are not detected.

use std::collections::HashSet;

/// Functions whose result changes between executions.
pub const DEFAULT_DENY_LIST: &[&str] = &[
    "now",
    "current_timestamp",
    "current_date",
    "current_time",
    "localtime",
    "localtimestamp",
    "clock_timestamp",
    "statement_timestamp",
    "transaction_timestamp",
    "timeofday",
    "random",
    "gen_random_uuid",
    "uuid_generate_v4",
    "nextval",
    "txid_current",
];

// == Classifier ==
#[derive(Debug, Clone)]
pub struct Classifier {
    /// Lowercased deny-listed words
    deny_list: HashSet<String>,
}

impl Default for Classifier {
    fn default() -> Self {
        Self::new(DEFAULT_DENY_LIST.iter().copied())
    }
}

impl Classifier {
    /// Creates a classifier with exactly the given deny-list.
    pub fn new<I, S>(deny_list: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self {
            deny_list: deny_list
                .into_iter()
                .map(|word| word.as_ref().trim().to_ascii_lowercase())
                .filter(|word| !word.is_empty())
                .collect(),
        }
    }

    /// Extends the deny-list, keeping the existing entries.
    pub fn with_extra_functions<I, S>(mut self, extra: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.deny_list.extend(
            extra
                .into_iter()
                .map(|word| word.as_ref().trim().to_ascii_lowercase())
                .filter(|word| !word.is_empty()),
        );
        self
    }

    /// Returns true if the statement is a single read-only `SELECT` free of
    /// deny-listed functions.
    ///
    /// The result row-count ceiling is not checked here; the caller applies it
    /// once the result is known.
    pub fn is_cacheable(&self, sql: &str) -> bool {
        let body = skip_leading_trivia(sql);

        match leading_word(body) {
            Some(word) if word.eq_ignore_ascii_case("select") => {}
            _ => return false,
        }

        if has_multiple_statements(body) {
            return false;
        }

        !words(body).any(|word| {
            // SELECT ... INTO creates a table.
            word.eq_ignore_ascii_case("into") || self.deny_list.contains(&word.to_ascii_lowercase())
        })
    }
}

/// Skips whitespace, `--` line comments and `/* */` block comments.
fn skip_leading_trivia(sql: &str) -> &str {
    let mut rest = sql;
    loop {
        let trimmed = rest.trim_start();
        if let Some(comment) = trimmed.strip_prefix("--") {
            rest = comment.find('\n').map_or("", |end| &comment[end + 1..]);
        } else if let Some(comment) = trimmed.strip_prefix("/*") {
            rest = comment.find("*/").map_or("", |end| &comment[end + 2..]);
        } else {
            return trimmed;
        }
    }
}

fn is_word_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_' || c == '$'
}

fn leading_word(text: &str) -> Option<&str> {
    let end = text.find(|c: char| !is_word_char(c)).unwrap_or(text.len());
    (end > 0).then(|| &text[..end])
}

/// Identifier-like words of the raw text.
fn words(text: &str) -> impl Iterator<Item = &str> {
    text.split(|c: char| !is_word_char(c))
        .filter(|word| !word.is_empty())
}

/// A `;` followed by anything other than whitespace or further `;`.
fn has_multiple_statements(text: &str) -> bool {
    match text.find(';') {
        Some(pos) => text[pos..].chars().any(|c| c != ';' && !c.is_whitespace()),
        None => false,
    }
}
