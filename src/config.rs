use std::io::Write;

use serde::ser;

use crate::error::{Error, Result};
use crate::flatten::{ArrayDefaults, Elision, flatten};
use crate::value::ser::ValueSerializer;
use crate::value::{QueryValue, ScalarEquality};

/// Configuration for querystring encoding.
///
/// The `Config` struct decides how deeply values may nest, how the key
/// brackets are written, and when a value counts as a repeat of its default.
///
/// ## Nesting Depth
///
/// The `max_depth` parameter limits how deeply containers can nest below the
/// top-level mapping. A `max_depth` of 0 means no nesting is allowed (flat
/// key-value pairs only).
///
/// Default value: `max_depth = 32`
///
/// ```
/// use canonical_qs::Config;
/// use std::collections::BTreeMap;
///
/// let query = BTreeMap::from([("a", BTreeMap::from([("b", 1)]))]);
///
/// let config = Config::new().max_depth(0);
/// assert!(config.to_query_string(&query).is_err());
///
/// let config = Config::new().max_depth(1);
/// assert_eq!(config.to_query_string(&query).unwrap(), "a[b]=1");
/// ```
///
/// ## Defaults
///
/// Values equal to the defaults at the same path are left out. The
/// [`ScalarEquality`] and [`ArrayDefaults`] policies decide what "equal"
/// means.
///
/// ```
/// use canonical_qs::{Config, ScalarEquality};
/// use std::collections::BTreeMap;
///
/// let query = BTreeMap::from([("page", "1")]);
/// let defaults = BTreeMap::from([("page", 1)]);
///
/// let config = Config::new();
/// assert_eq!(config.to_query_string_with_defaults(&query, &defaults).unwrap(), "");
///
/// let config = Config::new().scalar_equality(ScalarEquality::Strict);
/// assert_eq!(config.to_query_string_with_defaults(&query, &defaults).unwrap(), "page=1");
/// ```
#[derive(Clone, Copy, Debug)]
pub struct Config {
    max_depth: usize,
    encode_brackets: bool,
    scalar_equality: ScalarEquality,
    array_defaults: ArrayDefaults,
}

impl Default for Config {
    fn default() -> Self {
        Self::new()
    }
}

impl Config {
    pub const fn new() -> Self {
        Self {
            max_depth: 32,
            encode_brackets: false,
            scalar_equality: ScalarEquality::Textual,
            array_defaults: ArrayDefaults::Whole,
        }
    }

    /// Specifies the maximum nesting depth that will be encoded.
    /// Default is 32.
    pub const fn max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// By default the brackets that denote nesting are written as-is,
    /// e.g. `filter[ids][]=1`.
    ///
    /// Setting this to `true` percent-encodes them as well, which gives
    /// `filter%5Bids%5D%5B%5D=1`. That is the same as URI-component
    /// encoding the whole key.
    ///
    /// Brackets that are part of a key name are encoded either way. Pairs
    /// are always ordered by the fully encoded key, so both settings produce
    /// the pairs in the same order.
    pub const fn encode_brackets(mut self, encode_brackets: bool) -> Self {
        self.encode_brackets = encode_brackets;
        self
    }

    /// Specifies how scalars are compared against their defaults.
    ///
    /// The default is [`ScalarEquality::Textual`].
    pub const fn scalar_equality(mut self, scalar_equality: ScalarEquality) -> Self {
        self.scalar_equality = scalar_equality;
        self
    }

    /// Specifies how arrays are compared against default arrays.
    ///
    /// The default is [`ArrayDefaults::Whole`].
    pub const fn array_defaults(mut self, array_defaults: ArrayDefaults) -> Self {
        self.array_defaults = array_defaults;
        self
    }

    fn elision(self) -> Elision {
        Elision {
            scalars: self.scalar_equality,
            arrays: self.array_defaults,
        }
    }

    /// Converts a value into a [`QueryValue`] using this `Config`.
    pub fn to_value<T: ser::Serialize + ?Sized>(self, input: &T) -> Result<QueryValue> {
        input.serialize(ValueSerializer::new(self.max_depth))
    }

    /// Converts a value that must be a mapping at the top level.
    fn to_top_level<T: ser::Serialize + ?Sized>(self, input: &T) -> Result<QueryValue> {
        match self.to_value(input)? {
            value @ QueryValue::Map(_) => Ok(value),
            other => Err(Error::top_level(other.kind())),
        }
    }

    /// Encodes already-converted values using this `Config`.
    ///
    /// Trees built by hand are held to the same `max_depth` as serialized
    /// input.
    pub fn encode_value(self, query: &QueryValue, defaults: Option<&QueryValue>) -> Result<String> {
        if !matches!(query, QueryValue::Map(_)) {
            return Err(Error::top_level(query.kind()));
        }
        if let Some(defaults) = defaults.filter(|d| !matches!(d, QueryValue::Map(_))) {
            return Err(Error::top_level(defaults.kind()));
        }
        query.check_depth(self.max_depth)?;
        if let Some(defaults) = defaults {
            defaults.check_depth(self.max_depth)?;
        }

        let leaves = flatten(query, defaults, self.elision());
        let encoded = crate::encode::encode(&leaves, self.encode_brackets);
        tracing::debug!(
            pairs = leaves.len(),
            with_defaults = defaults.is_some(),
            len = encoded.len(),
            "encoded querystring"
        );
        Ok(encoded)
    }

    /// Serializes a value to a querystring using this `Config`.
    pub fn to_query_string<Q: ser::Serialize + ?Sized>(self, query: &Q) -> Result<String> {
        let query = self.to_top_level(query)?;
        self.encode_value(&query, None)
    }

    /// Serializes a value to a querystring using this `Config`, leaving out
    /// everything that matches `defaults`.
    pub fn to_query_string_with_defaults<Q, D>(self, query: &Q, defaults: &D) -> Result<String>
    where
        Q: ser::Serialize + ?Sized,
        D: ser::Serialize + ?Sized,
    {
        let query = self.to_top_level(query)?;
        let defaults = self.to_top_level(defaults)?;
        self.encode_value(&query, Some(&defaults))
    }

    /// Serializes a value to a querystring and writes it to `writer`.
    pub fn write_query_string<Q, D, W>(self, query: &Q, defaults: Option<&D>, writer: &mut W) -> Result<()>
    where
        Q: ser::Serialize + ?Sized,
        D: ser::Serialize + ?Sized,
        W: Write,
    {
        let encoded = match defaults {
            Some(defaults) => self.to_query_string_with_defaults(query, defaults)?,
            None => self.to_query_string(query)?,
        };
        writer.write_all(encoded.as_bytes()).map_err(Error::from)
    }
}
