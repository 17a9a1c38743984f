//! Case-insensitive, multi-valued HTTP header stores.
//!
//! Two stores share one read interface, [`HeaderLookup`]:
//!
//! - [`Headers`]: read-only, built once from the raw header pairs supplied by
//!   the transport (or from a single-valued string mapping).
//! - [`MutableHeaders`]: the same normalized table plus `set`, `append`,
//!   `delete` and `pop`.
//!
//! Every store keeps two things side by side:
//!
//! - the raw pairs exactly as given, in order, duplicates included
//! - a table from lower-cased name to the lower-cased, de-duplicated values
//!   of that name, in first-seen order
//!
//! Lookups only ever consult the table. Mutations only ever touch the table,
//! so [`HeaderLookup::raw`] keeps returning the construction input after a
//! `set` or `delete`. Callers that need the current state as pairs should
//! walk [`HeaderLookup::iter`] instead.
//!
//! # Example
//!
//! ```
//! use bytes::Bytes;
//! use cilantro_http::protocol::{HeaderLookup, Headers};
//!
//! let headers = Headers::new(vec![
//!     (Bytes::from_static(b"Accept"), Bytes::from_static(b"text/HTML")),
//!     (Bytes::from_static(b"accept"), Bytes::from_static(b"text/html")),
//! ]);
//!
//! assert_eq!(headers.len(), 1);
//! assert_eq!(headers.get("ACCEPT"), Some("text/html"));
//! assert_eq!(headers.raw().len(), 2);
//! ```

use std::borrow::Cow;
use std::fmt;

use bytes::Bytes;
use http::HeaderMap;
use indexmap::IndexMap;
use tracing::trace;

use crate::protocol::HeaderError;

/// A header pair as supplied by the caller, name first.
pub type RawHeader = (Bytes, Bytes);

/// Lower-cased header name to its lower-cased, de-duplicated values.
pub type HeaderTable = IndexMap<String, Vec<String>>;

/// Read access shared by [`Headers`] and [`MutableHeaders`].
///
/// Keys are matched ignoring case and every returned value is lower case.
pub trait HeaderLookup {
    /// The pairs the store was constructed from, untouched by later mutation.
    fn raw(&self) -> &[RawHeader];

    /// The normalized table backing every lookup.
    fn table(&self) -> &HeaderTable;

    /// First value of `key`, or `None` when absent.
    fn get(&self, key: &str) -> Option<&str> {
        self.list(key).first().map(String::as_str)
    }

    /// All values of `key` in stored order; empty when absent.
    fn list(&self, key: &str) -> &[String] {
        self.table().get(fold(key).as_ref()).map_or(&[][..], Vec::as_slice)
    }

    /// All values of `key`, failing when the key is absent.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::MissingKey`] if no header named `key` exists.
    fn values(&self, key: &str) -> Result<&[String], HeaderError> {
        self.table()
            .get(fold(key).as_ref())
            .map(Vec::as_slice)
            .ok_or_else(|| HeaderError::missing_key(key))
    }

    fn contains(&self, key: &str) -> bool {
        self.table().contains_key(fold(key).as_ref())
    }

    /// Number of distinct logical keys.
    fn len(&self) -> usize {
        self.table().len()
    }

    fn is_empty(&self) -> bool {
        self.table().is_empty()
    }

    /// Logical keys in first-insertion order.
    fn keys(&self) -> impl Iterator<Item = &str> {
        self.table().keys().map(String::as_str)
    }

    /// Logical keys with their values, in first-insertion order.
    fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.table().iter().map(|(key, values)| (key.as_str(), values.as_slice()))
    }
}

/// An immutable case-insensitive header store.
#[derive(Clone)]
pub struct Headers {
    raw: Vec<RawHeader>,
    table: HeaderTable,
}

impl Headers {
    /// Builds the store from raw pairs, keeping them verbatim as [`HeaderLookup::raw`].
    pub fn new(raw: Vec<RawHeader>) -> Self {
        let table = normalize(&raw);
        Self { raw, table }
    }

    /// Builds the store from single-valued string pairs, each one becoming
    /// exactly one raw pair in iteration order.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        let raw = pairs
            .into_iter()
            .map(|(name, value)| {
                (Bytes::copy_from_slice(name.as_ref().as_bytes()), Bytes::copy_from_slice(value.as_ref().as_bytes()))
            })
            .collect();
        Self::new(raw)
    }

    /// Consumes the store and returns the raw pairs it was built from.
    pub fn into_raw(self) -> Vec<RawHeader> {
        self.raw
    }

    pub fn into_mutable(self) -> MutableHeaders {
        MutableHeaders { inner: self }
    }
}

impl HeaderLookup for Headers {
    fn raw(&self) -> &[RawHeader] {
        &self.raw
    }

    fn table(&self) -> &HeaderTable {
        &self.table
    }
}

impl From<Vec<RawHeader>> for Headers {
    fn from(raw: Vec<RawHeader>) -> Self {
        Self::new(raw)
    }
}

impl From<IndexMap<String, String>> for Headers {
    fn from(mapping: IndexMap<String, String>) -> Self {
        Self::from_pairs(mapping)
    }
}

impl From<&HeaderMap> for Headers {
    fn from(header_map: &HeaderMap) -> Self {
        let raw = header_map
            .iter()
            .map(|(name, value)| (Bytes::copy_from_slice(name.as_str().as_bytes()), Bytes::copy_from_slice(value.as_bytes())))
            .collect();
        Self::new(raw)
    }
}

impl fmt::Display for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.raw)
    }
}

impl fmt::Debug for Headers {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Headers").field(&self.raw).finish()
    }
}

/// A mutable case-insensitive header store.
///
/// Mutation rewrites the normalized table only; [`HeaderLookup::raw`] still
/// reports the pairs given at construction.
#[derive(Clone)]
pub struct MutableHeaders {
    inner: Headers,
}

impl MutableHeaders {
    pub fn new(raw: Vec<RawHeader>) -> Self {
        Headers::new(raw).into_mutable()
    }

    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Headers::from_pairs(pairs).into_mutable()
    }

    /// Replaces every value of `key` with `value`.
    pub fn set(&mut self, key: &str, value: &str) -> &mut Self {
        self.inner.table.insert(fold(key).into_owned(), vec![value.to_lowercase()]);
        self
    }

    /// Adds `value` to `key` unless an equal value (ignoring case) is already there.
    pub fn append(&mut self, key: &str, value: &str) -> &mut Self {
        let value = value.to_lowercase();
        let values = self.inner.table.entry(fold(key).into_owned()).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
        self
    }

    /// Removes `key` entirely.
    ///
    /// # Errors
    ///
    /// Returns [`HeaderError::MissingKey`] if no header named `key` exists.
    pub fn delete(&mut self, key: &str) -> Result<(), HeaderError> {
        match self.inner.table.shift_remove(fold(key).as_ref()) {
            Some(_) => Ok(()),
            None => Err(HeaderError::missing_key(key)),
        }
    }

    /// Removes `key` and returns its values; empty when the key was absent.
    pub fn pop(&mut self, key: &str) -> Vec<String> {
        self.inner.table.shift_remove(fold(key).as_ref()).unwrap_or_default()
    }

    /// Consumes the store and returns the raw pairs it was built from.
    pub fn into_raw(self) -> Vec<RawHeader> {
        self.inner.raw
    }

    /// Drops mutability, keeping both the raw pairs and the current table.
    pub fn freeze(self) -> Headers {
        self.inner
    }
}

impl HeaderLookup for MutableHeaders {
    fn raw(&self) -> &[RawHeader] {
        &self.inner.raw
    }

    fn table(&self) -> &HeaderTable {
        &self.inner.table
    }
}

impl From<Vec<RawHeader>> for MutableHeaders {
    fn from(raw: Vec<RawHeader>) -> Self {
        Self::new(raw)
    }
}

impl From<IndexMap<String, String>> for MutableHeaders {
    fn from(mapping: IndexMap<String, String>) -> Self {
        Self::from_pairs(mapping)
    }
}

impl From<&HeaderMap> for MutableHeaders {
    fn from(header_map: &HeaderMap) -> Self {
        Headers::from(header_map).into_mutable()
    }
}

impl From<Headers> for MutableHeaders {
    fn from(headers: Headers) -> Self {
        headers.into_mutable()
    }
}

impl fmt::Display for MutableHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl fmt::Debug for MutableHeaders {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("MutableHeaders").field(&self.inner.raw).finish()
    }
}

/// Same logical keys, and per key the same values regardless of order.
fn same_table(left: &HeaderTable, right: &HeaderTable) -> bool {
    left.len() == right.len()
        && left.iter().all(|(key, values)| {
            right.get(key).is_some_and(|other| {
                let mut values: Vec<&String> = values.iter().collect();
                let mut other: Vec<&String> = other.iter().collect();
                values.sort_unstable();
                other.sort_unstable();
                values == other
            })
        })
}

impl PartialEq for Headers {
    fn eq(&self, other: &Self) -> bool {
        same_table(&self.table, &other.table)
    }
}

impl Eq for Headers {}

impl PartialEq for MutableHeaders {
    fn eq(&self, other: &Self) -> bool {
        same_table(self.table(), other.table())
    }
}

impl Eq for MutableHeaders {}

impl PartialEq<MutableHeaders> for Headers {
    fn eq(&self, other: &MutableHeaders) -> bool {
        same_table(&self.table, other.table())
    }
}

impl PartialEq<Headers> for MutableHeaders {
    fn eq(&self, other: &Headers) -> bool {
        same_table(self.table(), &other.table)
    }
}

fn normalize(raw: &[RawHeader]) -> HeaderTable {
    let mut table = HeaderTable::with_capacity(raw.len());
    for (name, value) in raw {
        let key = String::from_utf8_lossy(name).to_lowercase();
        let value = String::from_utf8_lossy(value).to_lowercase();
        let values = table.entry(key).or_default();
        if !values.contains(&value) {
            values.push(value);
        }
    }
    trace!(raw_len = raw.len(), keys = table.len(), "normalized headers");
    table
}

#[inline]
fn fold(key: &str) -> Cow<'_, str> {
    if key.bytes().all(|b| b.is_ascii() && !b.is_ascii_uppercase()) {
        Cow::Borrowed(key)
    } else {
        Cow::Owned(key.to_lowercase())
    }
}
