//! Slash-delimited node paths.
//!
//! A path is a sequence of node names joined by [`DELIMITER`]:
//! - A leading `/` means "start from the root of the tree"
//! - Whitespace around a segment is trimmed
//! - Empty segments (leading, trailing or doubled slashes) are dropped, never rejected
//!
//! Node names themselves must not contain the delimiter.

use crate::error::{TreeError, TreeResult};

/// Separator between path segments.
pub const DELIMITER: char = '/';

/// Validate a node name, returning `Ok(())` if it can be used as a path segment.
///
/// # Examples
///
/// ```
/// use arbor_tree::path::validate_name;
///
/// assert!(validate_name("leaf").is_ok());
/// assert!(validate_name("a/b").is_err());
/// ```
pub fn validate_name(name: &str) -> TreeResult<()> {
    if name.contains(DELIMITER) {
        return Err(TreeError::InvalidName {
            name: name.to_string(),
            reason: format!("must not contain the path delimiter {DELIMITER:?}"),
        });
    }
    Ok(())
}

/// Split a path into its trimmed, non-empty segments.
pub fn split_path(path: &str) -> Vec<&str> {
    path.split(DELIMITER)
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .collect()
}

/// Returns `true` if the path is anchored at the tree root.
pub fn is_absolute(path: &str) -> bool {
    path.trim_start().starts_with(DELIMITER)
}

/// Join segments with the delimiter.
pub fn join_path<I, S>(segments: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let mut joined = String::new();
    for (i, segment) in segments.into_iter().enumerate() {
        if i > 0 {
            joined.push(DELIMITER);
        }
        joined.push_str(segment.as_ref());
    }
    joined
}

/// Canonical form of a path: its segments joined without a leading delimiter.
pub fn normalize_path(path: &str) -> String {
    join_path(split_path(path))
}
