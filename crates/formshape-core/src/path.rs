//! # Field Paths
//!
//! Parses and interprets field paths of the form `a.b[0].c[1][2]` and
//! navigates nested JSON values along them.
//!
//! A path is an ordered sequence of [`PathToken`]s. Bracketed digits
//! become [`PathToken::Index`]; everything else becomes
//! [`PathToken::Key`]. A key made only of digits (`a.0`) is still a key,
//! but [`PathToken::as_index`] reports it as an index so that callers
//! building containers treat it as an array position.
//!
//! Traversal never creates missing intermediate nodes; building nested
//! values from flat keys is the form-data transform's job.

use std::borrow::Cow;
use std::fmt;

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::PathError;

/// One segment of a field path.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PathToken {
    /// An array position.
    Index(usize),
    /// An object key.
    Key(String),
}

impl PathToken {
    /// The token as an array position, if it is one or is a key made only
    /// of ASCII digits.
    pub fn as_index(&self) -> Option<usize> {
        match self {
            Self::Index(i) => Some(*i),
            Self::Key(key) => parse_index(key),
        }
    }

    /// The token as an object key.
    pub fn as_key(&self) -> Cow<'_, str> {
        match self {
            Self::Index(i) => Cow::Owned(i.to_string()),
            Self::Key(key) => Cow::Borrowed(key),
        }
    }

    /// True for [`PathToken::Index`].
    pub fn is_index(&self) -> bool {
        matches!(self, Self::Index(_))
    }
}

impl fmt::Display for PathToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Index(i) => write!(f, "{i}"),
            Self::Key(key) => f.write_str(key),
        }
    }
}

impl From<&str> for PathToken {
    fn from(key: &str) -> Self {
        Self::Key(key.to_string())
    }
}

impl From<String> for PathToken {
    fn from(key: String) -> Self {
        Self::Key(key)
    }
}

impl From<usize> for PathToken {
    fn from(index: usize) -> Self {
        Self::Index(index)
    }
}

fn parse_index(text: &str) -> Option<usize> {
    if text.is_empty() || !text.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    text.parse().ok()
}

/// Split a raw path into tokens.
///
/// `.` separates keys and each `[n]` suffix becomes its own index token,
/// preserving order: `"a.b[0].c[1][2]"` yields `a, b, 0, c, 1, 2`. Empty
/// segments are dropped. A bracketed segment that is not a non-negative
/// integer is kept as a key.
pub fn split_path(raw: &str) -> Vec<PathToken> {
    fn flush(buf: &mut String, bracketed: bool, tokens: &mut Vec<PathToken>) {
        if buf.is_empty() {
            return;
        }
        let text = std::mem::take(buf);
        match (bracketed, parse_index(&text)) {
            (true, Some(i)) => tokens.push(PathToken::Index(i)),
            _ => tokens.push(PathToken::Key(text)),
        }
    }

    let mut tokens = Vec::new();
    let mut buf = String::new();
    let mut bracketed = false;

    for ch in raw.chars() {
        match ch {
            '.' => {
                flush(&mut buf, bracketed, &mut tokens);
                bracketed = false;
            }
            '[' => {
                flush(&mut buf, bracketed, &mut tokens);
                bracketed = true;
            }
            ']' => {
                flush(&mut buf, bracketed, &mut tokens);
                bracketed = false;
            }
            other => buf.push(other),
        }
    }
    flush(&mut buf, bracketed, &mut tokens);

    tokens
}

/// Join tokens back into a raw path: keys dotted, indices bracketed.
///
/// Inverse of [`split_path`] for keys that contain no `.`, `[`, or `]`.
pub fn join_path(tokens: &[PathToken]) -> String {
    let mut out = String::new();
    for token in tokens {
        match token {
            PathToken::Index(i) => {
                out.push('[');
                out.push_str(&i.to_string());
                out.push(']');
            }
            PathToken::Key(key) => {
                if !out.is_empty() {
                    out.push('.');
                }
                out.push_str(key);
            }
        }
    }
    out
}

/// Look up `key` directly under `parent`.
///
/// Objects are indexed by the key's string form; arrays by its index
/// form. Scalars have no children.
pub fn child<'a>(parent: &'a Value, key: &PathToken) -> Option<&'a Value> {
    match parent {
        Value::Object(map) => map.get(key.as_key().as_ref()),
        Value::Array(items) => key.as_index().and_then(|i| items.get(i)),
        _ => None,
    }
}

/// One intermediate step of a traversal, offered to the modifier.
#[derive(Debug)]
pub struct Hop<'v, 'p> {
    /// The container being read.
    pub parent: &'v Value,
    /// The key read from `parent`.
    pub key: &'p PathToken,
    /// What `parent` holds under `key`.
    pub value: Option<&'v Value>,
    /// The path walked so far, `key` included.
    pub path: &'p [PathToken],
}

/// Result of a successful traversal.
#[derive(Debug, Clone, PartialEq)]
pub struct PathData<'v> {
    /// The container holding the last key.
    pub parent: &'v Value,
    /// The last token of the path.
    pub key: PathToken,
    /// What `parent` holds under `key`, if anything.
    pub value: Option<&'v Value>,
    /// The full path.
    pub path: Vec<PathToken>,
}

/// Walk all but the last token of `path` through `obj`.
///
/// At each hop the `modifier` receives the parent, key, and current value
/// and returns the value to continue with, which lets callers intercept
/// reads. Traversal stops with `Ok(None)` as soon as a hop yields nothing
/// or the final parent is not a container.
///
/// # Errors
///
/// Returns [`PathError::EmptyPath`] when `path` is empty, since no
/// parent/key pair can be designated.
pub fn traverse_path<'v, F>(
    obj: &'v Value,
    path: &[PathToken],
    mut modifier: F,
) -> Result<Option<PathData<'v>>, PathError>
where
    F: for<'p> FnMut(Hop<'v, 'p>) -> Option<&'v Value>,
{
    let Some((last, init)) = path.split_last() else {
        return Err(PathError::EmptyPath);
    };

    let mut parent = obj;
    for (depth, key) in init.iter().enumerate() {
        let hop = Hop {
            parent,
            key,
            value: child(parent, key),
            path: &path[..=depth],
        };
        match modifier(hop) {
            Some(next) => parent = next,
            None => return Ok(None),
        }
    }

    if !matches!(parent, Value::Object(_) | Value::Array(_)) {
        return Ok(None);
    }

    Ok(Some(PathData {
        parent,
        key: last.clone(),
        value: child(parent, last),
        path: path.to_vec(),
    }))
}

/// [`traverse_path`] without read interception.
///
/// # Errors
///
/// Returns [`PathError::EmptyPath`] when `path` is empty.
pub fn check_path<'v>(obj: &'v Value, path: &[PathToken]) -> Result<Option<PathData<'v>>, PathError> {
    traverse_path(obj, path, |hop| hop.value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn k(s: &str) -> PathToken {
        PathToken::Key(s.to_string())
    }

    fn i(n: usize) -> PathToken {
        PathToken::Index(n)
    }

    #[test]
    fn split_path_expands_index_suffixes() {
        assert_eq!(
            split_path("a.b[0].c[1][2]"),
            vec![k("a"), k("b"), i(0), k("c"), i(1), i(2)]
        );
    }

    #[test]
    fn split_path_keeps_dotted_digits_as_keys() {
        let tokens = split_path("a.0.b");
        assert_eq!(tokens, vec![k("a"), k("0"), k("b")]);
        assert_eq!(tokens[1].as_index(), Some(0));
    }

    #[test]
    fn split_path_handles_leading_index_and_empty_segments() {
        assert_eq!(split_path("[3].x"), vec![i(3), k("x")]);
        assert_eq!(split_path("a..b"), vec![k("a"), k("b")]);
        assert!(split_path("").is_empty());
    }

    #[test]
    fn split_path_keeps_non_numeric_brackets_as_keys() {
        assert_eq!(split_path("a[b]"), vec![k("a"), k("b")]);
        assert_eq!(split_path("a[-1]"), vec![k("a"), k("-1")]);
    }

    #[test]
    fn join_path_inverts_split() {
        let raw = "a.b[0].c[1][2]";
        assert_eq!(join_path(&split_path(raw)), raw);
        assert_eq!(join_path(&[i(0), k("x")]), "[0].x");
    }

    #[test]
    fn tokens_serialize_as_strings_and_numbers() {
        let tokens = vec![k("a"), i(2)];
        assert_eq!(serde_json::to_value(&tokens).unwrap(), json!(["a", 2]));
        let back: Vec<PathToken> = serde_json::from_value(json!(["a", 2])).unwrap();
        assert_eq!(back, tokens);
    }

    #[test]
    fn check_path_finds_leaf() {
        let data = json!({"a": {"b": [{"c": 5}]}});
        let found = check_path(&data, &split_path("a.b[0].c")).unwrap().unwrap();
        assert_eq!(found.key, k("c"));
        assert_eq!(found.value, Some(&json!(5)));
        assert_eq!(found.parent, &json!({"c": 5}));
    }

    #[test]
    fn check_path_reports_missing_last_key() {
        let data = json!({"a": {}});
        let found = check_path(&data, &split_path("a.missing")).unwrap().unwrap();
        assert!(found.value.is_none());
    }

    #[test]
    fn check_path_stops_on_missing_intermediate() {
        let data = json!({"a": {}});
        assert!(check_path(&data, &split_path("a.b.c")).unwrap().is_none());
    }

    #[test]
    fn check_path_stops_on_scalar_parent() {
        let data = json!({"a": "text"});
        assert!(check_path(&data, &split_path("a.b")).unwrap().is_none());
    }

    #[test]
    fn dotted_digit_key_indexes_arrays() {
        let data = json!({"a": ["x", "y"]});
        let found = check_path(&data, &split_path("a.1")).unwrap().unwrap();
        assert_eq!(found.value, Some(&json!("y")));
    }

    #[test]
    fn empty_path_is_an_error() {
        let data = json!({});
        assert_eq!(check_path(&data, &[]), Err(PathError::EmptyPath));
    }

    #[test]
    fn modifier_sees_every_hop_and_can_redirect() {
        let data = json!({"a": {"b": {"c": 1}}});
        let fallback = json!({"c": 42});
        let mut seen = Vec::new();
        let found = traverse_path(&data, &split_path("a.x.c"), |hop| {
            seen.push(join_path(hop.path));
            hop.value.or(Some(&fallback))
        })
        .unwrap()
        .unwrap();
        assert_eq!(seen, vec!["a", "a.x"]);
        assert_eq!(found.value, Some(&json!(42)));
    }
}
