//! Cache-Control header parsing for RFC 7234 compliance.
//!
//! [`directives`] yields every directive of every `Cache-Control`
//! occurrence, in order, with its raw value. The validity engine scans
//! this list and applies its own per-directive parse policy, so nothing
//! here interprets values.
//!
//! Multiple `Cache-Control` headers and multiple comma-separated
//! directives per header are both accepted.
//!
//! # Example
//!
//! ```rust
//! use staleguard::cache::control::parse_directives;
//!
//! let parsed: Vec<_> = parse_directives("max-age=3600;ext, must-revalidate").collect();
//! assert_eq!(parsed[0].name(), "max-age");
//! assert_eq!(parsed[0].value(), Some("3600"));
//! assert!(parsed[1].is("Must-Revalidate"));
//! ```

use http::header::CACHE_CONTROL;
use http::HeaderMap;
use std::borrow::Cow;

/// A single `Cache-Control` directive.
///
/// Borrowed from the header value unless it contained bytes that are not
/// valid UTF-8, in which case those bytes are replaced and the text owned.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Directive<'a> {
    name: Cow<'a, str>,
    value: Option<Cow<'a, str>>,
}

impl<'a> Directive<'a> {
    /// Parse one comma-free directive item such as `max-age=60`.
    ///
    /// Parameters after an unquoted `;` are dropped. Returns `None` for
    /// empty items.
    pub fn parse(item: &'a str) -> Option<Self> {
        Self::parse_bytes(item.as_bytes())
    }

    fn parse_bytes(item: &'a [u8]) -> Option<Self> {
        let item = trim(until_unquoted(item, b';'));

        let (name, value) = match item.iter().position(|&b| b == b'=') {
            Some(eq) => {
                let value = trim(&item[eq + 1..]);
                let value = value
                    .strip_prefix(b"\"")
                    .and_then(|v| v.strip_suffix(b"\""))
                    .unwrap_or(value);
                (trim(&item[..eq]), Some(value))
            }
            None => (item, None),
        };

        if name.is_empty() {
            return None;
        }
        Some(Directive {
            name: String::from_utf8_lossy(name),
            value: value.map(String::from_utf8_lossy),
        })
    }

    /// Directive name as written in the header
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Directive value with surrounding quotes removed, if any
    pub fn value(&self) -> Option<&str> {
        self.value.as_deref()
    }

    /// Case-insensitive name comparison
    pub fn is(&self, name: &str) -> bool {
        self.name.eq_ignore_ascii_case(name)
    }

    /// Exact, case-sensitive name comparison
    pub fn is_exact(&self, name: &str) -> bool {
        self.name == name
    }
}

fn trim(bytes: &[u8]) -> &[u8] {
    let start = bytes
        .iter()
        .position(|b| !b.is_ascii_whitespace())
        .unwrap_or(bytes.len());
    let end = bytes
        .iter()
        .rposition(|b| !b.is_ascii_whitespace())
        .map_or(start, |idx| idx + 1);
    &bytes[start..end]
}

/// Positions of `delimiter` that are not inside a quoted string.
fn unquoted_positions(bytes: &[u8], delimiter: u8) -> impl Iterator<Item = usize> + '_ {
    let mut in_quotes = false;
    let mut escaped = false;
    bytes.iter().enumerate().filter_map(move |(idx, &b)| {
        if escaped {
            escaped = false;
            return None;
        }
        match b {
            b'\\' if in_quotes => escaped = true,
            b'"' => in_quotes = !in_quotes,
            _ if b == delimiter && !in_quotes => return Some(idx),
            _ => {}
        }
        None
    })
}

fn until_unquoted(bytes: &[u8], delimiter: u8) -> &[u8] {
    match unquoted_positions(bytes, delimiter).next() {
        Some(end) => &bytes[..end],
        None => bytes,
    }
}

/// Split a header value on commas that are not inside a quoted string.
fn split_items(header_value: &[u8]) -> Vec<&[u8]> {
    let mut items = Vec::new();
    let mut start = 0;
    for idx in unquoted_positions(header_value, b',') {
        items.push(&header_value[start..idx]);
        start = idx + 1;
    }
    items.push(&header_value[start..]);
    items
}

fn parse_bytes(header_value: &[u8]) -> impl Iterator<Item = Directive<'_>> {
    split_items(header_value)
        .into_iter()
        .filter_map(Directive::parse_bytes)
}

/// Directives of a single header value, in order.
pub fn parse_directives(header_value: &str) -> impl Iterator<Item = Directive<'_>> {
    parse_bytes(header_value.as_bytes())
}

/// Every directive across every `Cache-Control` header in `headers`.
///
/// Header values carrying opaque (non visible ASCII) bytes are still
/// scanned; such bytes are decoded lossily.
pub fn directives(headers: &HeaderMap) -> impl Iterator<Item = Directive<'_>> {
    headers
        .get_all(CACHE_CONTROL)
        .iter()
        .flat_map(|value| parse_bytes(value.as_bytes()))
}
