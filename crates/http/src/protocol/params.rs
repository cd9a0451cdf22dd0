//! Url-encoded parameter trees and cookie maps.
//!
//! Query strings and `application/x-www-form-urlencoded` bodies share one decoding rule set:
//!
//! - pairs are split on `&`, names and values are percent-decoded (`+` becomes a space)
//! - a name repeated later in the input replaces the earlier value, keeping its position
//! - bracket syntax builds nested maps: `a[b]=1` yields `{a: {b: "1"}}`
//! - an empty bracket appends: `a[]=x&a[]=y` yields `{a: {"0": "x", "1": "y"}}`
//!
//! Leaves are always [`Value::String`], inner nodes are [`Value::Object`].

use std::collections::BTreeMap;
use std::ops::Deref;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// Cookie name to value map, built from the `Cookie` request headers.
pub type Cookies = BTreeMap<String, String>;

/// An ordered tree of url-decoded parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Params {
    inner: Map<String, Value>,
}

impl Params {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes a url-encoded byte string, see the module docs for the rules.
    pub fn parse(input: &[u8]) -> Self {
        let mut params = Self::new();
        for (name, value) in decode_pairs(input) {
            params.assign(&name, value);
        }
        params
    }

    /// Returns the value under `key` when it is a leaf string.
    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.inner.get(key).and_then(Value::as_str)
    }

    /// Returns the nested map under `key` when it exists.
    pub fn get_map(&self, key: &str) -> Option<&Map<String, Value>> {
        self.inner.get(key).and_then(Value::as_object)
    }

    /// Sets a flat value, replacing any previous entry for `key`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.inner.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.inner.remove(key)
    }

    pub fn into_inner(self) -> Map<String, Value> {
        self.inner
    }

    /// Assigns one decoded pair, interpreting bracket syntax in `name`.
    fn assign(&mut self, name: &str, value: String) {
        let Some((base, path)) = split_name(name) else {
            return;
        };
        assign_path(&mut self.inner, base.to_string(), &path, value);
    }
}

impl Deref for Params {
    type Target = Map<String, Value>;

    fn deref(&self) -> &Self::Target {
        &self.inner
    }
}

impl From<Map<String, Value>> for Params {
    fn from(inner: Map<String, Value>) -> Self {
        Self { inner }
    }
}

impl From<Params> for Value {
    fn from(params: Params) -> Self {
        Value::Object(params.inner)
    }
}

impl<K: Into<String>, V: Into<String>> FromIterator<(K, V)> for Params {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut params = Self::new();
        for (name, value) in iter {
            let name: String = name.into();
            params.assign(&name, value.into());
        }
        params
    }
}

/// Parses a `Cookie` header value into `cookies`.
///
/// Cookies are separated by `;` and optional whitespace, names and values are url-decoded,
/// a later cookie with the same name replaces the earlier one.
pub fn parse_cookies(header: &[u8], cookies: &mut Cookies) {
    for pair in header.split(|b| *b == b';') {
        let pair = pair.trim_ascii();
        if pair.is_empty() {
            continue;
        }

        for (name, value) in decode_pairs(pair) {
            let name = name.trim();
            if !name.is_empty() {
                cookies.insert(name.to_string(), value);
            }
        }
    }
}

fn decode_pairs(input: &[u8]) -> Vec<(String, String)> {
    match serde_urlencoded::from_bytes::<Vec<(String, String)>>(input) {
        Ok(pairs) => pairs,
        Err(e) => {
            debug!(cause = %e, "skip undecodable url-encoded input");
            Vec::new()
        }
    }
}

/// Splits `a[b][]` into the base name `a` and the path `[Some("b"), None]`.
///
/// Returns `None` for an empty base name. A name with an unterminated bracket is kept whole as a
/// flat key, and anything after the last closing bracket that does not open a new one is ignored.
fn split_name(name: &str) -> Option<(&str, Vec<Option<String>>)> {
    let name = name.trim_start();
    let Some(open) = name.find('[') else {
        return (!name.is_empty()).then_some((name, Vec::new()));
    };

    let base = &name[..open];
    if base.is_empty() {
        return None;
    }

    let mut path = Vec::new();
    let mut rest = &name[open..];
    while let Some(stripped) = rest.strip_prefix('[') {
        let Some(close) = stripped.find(']') else {
            if path.is_empty() {
                return Some((name, Vec::new()));
            }
            break;
        };
        let segment = &stripped[..close];
        path.push((!segment.is_empty()).then(|| segment.to_string()));
        rest = &stripped[close + 1..];
    }

    Some((base, path))
}

fn assign_path(map: &mut Map<String, Value>, key: String, path: &[Option<String>], value: String) {
    let Some((next, rest)) = path.split_first() else {
        map.insert(key, Value::String(value));
        return;
    };

    let entry = map.entry(key).or_insert_with(|| Value::Object(Map::new()));
    if !entry.is_object() {
        *entry = Value::Object(Map::new());
    }

    if let Some(child) = entry.as_object_mut() {
        let next = next.clone().unwrap_or_else(|| next_index(child).to_string());
        assign_path(child, next, rest, value);
    }
}

fn next_index(map: &Map<String, Value>) -> u64 {
    map.keys().filter_map(|k| k.parse::<u64>().ok()).max().map_or(0, |max| max + 1)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn last_occurrence_wins() {
        let params = Params::parse(b"a=1&a=2&b=3");

        assert_eq!(params.len(), 2);
        assert_eq!(params.get_str("a"), Some("2"));
        assert_eq!(params.get_str("b"), Some("3"));
        assert_eq!(params.keys().collect::<Vec<_>>(), vec!["a", "b"]);
    }

    #[test]
    fn decodes_percent_and_plus() {
        let params = Params::parse(b"name=John+Doe&city=New%20York&k%5Bx%5D=1");

        assert_eq!(params.get_str("name"), Some("John Doe"));
        assert_eq!(params.get_str("city"), Some("New York"));
        assert_eq!(Value::from(params)["k"], json!({"x": "1"}));
    }

    #[test]
    fn nested_brackets() {
        let params = Params::parse(b"user[name]=zava&user[address][zip]=100&user[name]=kid");

        assert_eq!(Value::from(params), json!({"user": {"name": "kid", "address": {"zip": "100"}}}));
    }

    #[test]
    fn empty_brackets_append() {
        let params = Params::parse(b"tag[]=a&tag[]=b&tag[5]=c&tag[]=d");

        assert_eq!(Value::from(params), json!({"tag": {"0": "a", "1": "b", "5": "c", "6": "d"}}));
    }

    #[test]
    fn scalar_is_replaced_by_nested_value() {
        let params = Params::parse(b"a=1&a[b]=2");

        assert_eq!(Value::from(params), json!({"a": {"b": "2"}}));
    }

    #[test]
    fn odd_names() {
        let params = Params::parse(b"=1&[x]=2&a[b=3&c[d]junk=4&flag");

        assert_eq!(Value::from(params), json!({"a[b": "3", "c": {"d": "4"}, "flag": ""}));
    }

    #[test]
    fn empty_input() {
        assert!(Params::parse(b"").is_empty());
        assert!(Params::parse(b"&&").is_empty());
    }

    #[test]
    fn cookies_split_on_semicolon() {
        let mut cookies = Cookies::new();
        parse_cookies(b"SID=abc123; theme=dark;lang=en%2DUS; ;broken", &mut cookies);
        parse_cookies(b"theme=light", &mut cookies);

        assert_eq!(cookies.get("SID").map(String::as_str), Some("abc123"));
        assert_eq!(cookies.get("theme").map(String::as_str), Some("light"));
        assert_eq!(cookies.get("lang").map(String::as_str), Some("en-US"));
        assert_eq!(cookies.get("broken").map(String::as_str), Some(""));
    }
}
