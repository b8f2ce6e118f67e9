//! Canonical querystrings for Serde
//!
//! This crate turns nested structures into querystrings that are stable
//! byte-for-byte: keys are sorted, array elements are sorted, and absent
//! values are left out. Given a second "defaults" structure, anything that
//! still has its default value is left out too, so URLs only carry what the
//! user actually changed.
//!
//! The nested syntax follows [qs](https://github.com/ljharb/qs) with the
//! `brackets` array format: `filter[ids][]=1&filter[ids][]=2`.
//!
//! ## Supported Types
//!
//! At the **top level**, only structs and maps are supported, since every
//! entry of a querystring needs a key. Below the top level, anything that
//! can be represented as JSON is supported: numbers, strings, booleans,
//! options, sequences, maps, structs and enums.
//!
//! `None`, `()` and empty strings are treated as absent and never written.
//! Raw bytes and non-finite floats are rejected with [`Error::Unsupported`].
//!
//! ## Usage
//!
//! ```
//! use serde::Serialize;
//!
//! #[derive(Serialize)]
//! struct Filter {
//!     search: Option<String>,
//!     ids: Vec<u32>,
//! }
//!
//! #[derive(Serialize)]
//! struct Query {
//!     page: u32,
//!     filter: Filter,
//! }
//!
//! let query = Query {
//!     page: 1,
//!     filter: Filter {
//!         search: Some("Sebastian".to_string()),
//!         ids: vec![3, 1, 2],
//!     },
//! };
//! let defaults = Query {
//!     page: 1,
//!     filter: Filter {
//!         search: None,
//!         ids: vec![],
//!     },
//! };
//!
//! assert_eq!(
//!     canonical_qs::to_query_string(&query).unwrap(),
//!     "filter[ids][]=1&filter[ids][]=2&filter[ids][]=3&filter[search]=Sebastian&page=1"
//! );
//! assert_eq!(
//!     canonical_qs::to_query_string_with_defaults(&query, &defaults).unwrap(),
//!     "filter[ids][]=1&filter[ids][]=2&filter[ids][]=3&filter[search]=Sebastian"
//! );
//! ```
//!
//! ## Defaults
//!
//! Matching against defaults is done per path. Scalars are compared by their
//! rendered text unless [`ScalarEquality::Strict`] is configured, so the
//! string `"1"` matches a default of `1`. Arrays are left out when they hold
//! the same elements as their default; see [`ArrayDefaults`] for the
//! alternative. See [`Config`] for all options.

mod config;
mod encode;
mod error;
mod flatten;
mod value;

#[doc(inline)]
pub use config::Config;
#[doc(inline)]
pub use encode::{encode, encode_component};
#[doc(inline)]
pub use error::{Error, Result};
#[doc(inline)]
pub use flatten::{ArrayDefaults, Elision, LeafPair, Path, Segment, flatten};
#[doc(inline)]
pub use value::{Number, QueryValue, Scalar, ScalarEquality, to_value};

use serde::ser;
use std::io::Write;

/// Serializes a value into a querystring.
///
/// ```
/// use serde::Serialize;
///
/// #[derive(Serialize)]
/// struct Query {
///     search: String,
///     page: u32,
/// }
///
/// let q = Query {
///     search: "Sebastian".to_owned(),
///     page: 5,
/// };
///
/// assert_eq!(
///     canonical_qs::to_query_string(&q).unwrap(),
///     "page=5&search=Sebastian");
/// ```
pub fn to_query_string<Q: ser::Serialize + ?Sized>(query: &Q) -> Result<String> {
    Config::default().to_query_string(query)
}

/// Serializes a value into a querystring, leaving out every value that
/// matches `defaults` at the same path.
///
/// ```
/// use serde_json::json;
///
/// let query = json!({ "filter": { "search": { "company": "Spatie", "author": "Sebastian" } } });
/// let defaults = json!({ "filter": { "search": { "company": "Spatie" } } });
///
/// assert_eq!(
///     canonical_qs::to_query_string_with_defaults(&query, &defaults).unwrap(),
///     "filter[search][author]=Sebastian");
/// ```
pub fn to_query_string_with_defaults<Q, D>(query: &Q, defaults: &D) -> Result<String>
where
    Q: ser::Serialize + ?Sized,
    D: ser::Serialize + ?Sized,
{
    Config::default().to_query_string_with_defaults(query, defaults)
}

/// Serializes a value into a generic writer object.
///
/// ```
/// use std::collections::BTreeMap;
///
/// let q = BTreeMap::from([("search", "a b")]);
/// let mut buffer = Vec::new();
/// canonical_qs::to_writer(&q, &mut buffer).unwrap();
/// assert_eq!(String::from_utf8(buffer).unwrap(), "search=a%20b");
/// ```
pub fn to_writer<Q: ser::Serialize + ?Sized, W: Write>(query: &Q, writer: &mut W) -> Result<()> {
    Config::default().write_query_string::<Q, Q, W>(query, None, writer)
}
