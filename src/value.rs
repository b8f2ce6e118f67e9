//! The intermediate value tree that querystrings are built from.

pub(crate) mod ser;

use std::cmp::Ordering;
use std::collections::BTreeMap;
use std::fmt;

use crate::error::{Error, Result};

pub use ser::to_value;

/// 2^64, the first float above the `u64` range.
const U64_BOUND: f64 = 18_446_744_073_709_551_616.0;
/// -2^63, the smallest float inside the `i64` range.
const I64_MIN: f64 = -9_223_372_036_854_775_808.0;

/// A nested querystring value.
///
/// `Null` stands for both an explicit `null` and an absent value. Both are
/// dropped from the output.
#[derive(Clone, Debug, PartialEq)]
pub enum QueryValue {
    Null,
    Bool(bool),
    Number(Number),
    String(String),
    Array(Vec<QueryValue>),
    Map(BTreeMap<String, QueryValue>),
}

/// A numeric value.
///
/// The three variants compare mathematically, so `PosInt(1)` equals
/// `Float(1.0)`. Floats are always finite.
#[derive(Clone, Copy, Debug)]
pub enum Number {
    PosInt(u64),
    NegInt(i64),
    Float(f64),
}

/// A terminal value that ends up on the right-hand side of `key=value`.
#[derive(Clone, Debug, PartialEq)]
pub enum Scalar {
    Bool(bool),
    Number(Number),
    String(String),
}

/// How two scalars are compared when matching a value against its default.
///
/// Containers always compare structurally. This policy only decides when two
/// leaves are "the same".
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ScalarEquality {
    /// Scalars are equal when they render to the same text, so the string
    /// `"1"` matches the number `1`.
    #[default]
    Textual,
    /// Scalars are equal only when they are the same kind (bool, number or
    /// string) and have the same value.
    Strict,
}

impl Number {
    fn as_f64(self) -> f64 {
        match self {
            Number::PosInt(n) => n as f64,
            Number::NegInt(n) => n as f64,
            Number::Float(n) => n,
        }
    }

    fn as_i128(self) -> Option<i128> {
        match self {
            Number::PosInt(n) => Some(i128::from(n)),
            Number::NegInt(n) => Some(i128::from(n)),
            Number::Float(_) => None,
        }
    }

    /// Writes the canonical decimal form of the number.
    ///
    /// Integral floats that fit in a 64-bit integer print exactly like that
    /// integer, so `5.0` becomes `5` and `1e17` becomes `100000000000000000`.
    /// Anything else uses the shortest round-trip form.
    pub fn write_text(self, out: &mut String) {
        match self {
            Number::PosInt(n) => out.push_str(itoa::Buffer::new().format(n)),
            Number::NegInt(n) => out.push_str(itoa::Buffer::new().format(n)),
            Number::Float(n) if n.fract() == 0.0 && n >= I64_MIN && n < U64_BOUND => {
                // `-0.0` prints as `0`
                if n < 0.0 {
                    out.push_str(itoa::Buffer::new().format(n as i64))
                } else {
                    out.push_str(itoa::Buffer::new().format(n as u64))
                }
            }
            Number::Float(n) => out.push_str(ryu::Buffer::new().format_finite(n)),
        }
    }
}

impl PartialEq for Number {
    fn eq(&self, other: &Self) -> bool {
        self.cmp(other) == Ordering::Equal
    }
}

impl Eq for Number {}

impl PartialOrd for Number {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for Number {
    fn cmp(&self, other: &Self) -> Ordering {
        match (self.as_i128(), other.as_i128()) {
            (Some(a), Some(b)) => a.cmp(&b),
            _ => self.as_f64().total_cmp(&other.as_f64()),
        }
    }
}

impl fmt::Display for Number {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();
        self.write_text(&mut out);
        f.write_str(&out)
    }
}

impl Scalar {
    /// The text that gets percent-encoded into the querystring.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        self.write_text(&mut out);
        out
    }

    pub fn write_text(&self, out: &mut String) {
        match self {
            Scalar::Bool(true) => out.push_str("true"),
            Scalar::Bool(false) => out.push_str("false"),
            Scalar::Number(n) => n.write_text(out),
            Scalar::String(s) => out.push_str(s),
        }
    }

    /// Compares two scalars under the given policy.
    pub fn matches(&self, other: &Scalar, policy: ScalarEquality) -> bool {
        match (self, other) {
            (Scalar::Bool(a), Scalar::Bool(b)) => a == b,
            (Scalar::Number(a), Scalar::Number(b)) => a == b,
            (Scalar::String(a), Scalar::String(b)) => a == b,
            _ => match policy {
                ScalarEquality::Strict => false,
                ScalarEquality::Textual => self.to_text() == other.to_text(),
            },
        }
    }
}

impl QueryValue {
    /// Returns the value as a scalar, if it is one.
    pub fn as_scalar(&self) -> Option<Scalar> {
        match self {
            QueryValue::Bool(b) => Some(Scalar::Bool(*b)),
            QueryValue::Number(n) => Some(Scalar::Number(*n)),
            QueryValue::String(s) => Some(Scalar::String(s.clone())),
            _ => None,
        }
    }

    /// `Null` and the empty string carry no information and are never emitted.
    pub fn is_absent(&self) -> bool {
        match self {
            QueryValue::Null => true,
            QueryValue::String(s) => s.is_empty(),
            _ => false,
        }
    }

    /// Describes the shape of the value, for error messages.
    pub fn kind(&self) -> &'static str {
        match self {
            QueryValue::Null => "null",
            QueryValue::Bool(_) => "bool",
            QueryValue::Number(_) => "number",
            QueryValue::String(_) => "string",
            QueryValue::Array(_) => "sequence",
            QueryValue::Map(_) => "map",
        }
    }

    /// Fails when containers nest more than `max_depth` levels below the
    /// top-level value, using the same counting as the serializer.
    pub(crate) fn check_depth(&self, max_depth: usize) -> Result<()> {
        self.check_depth_at(0, max_depth)
    }

    fn check_depth_at(&self, depth: usize, max_depth: usize) -> Result<()> {
        let check = |child: &QueryValue| child.check_depth_at(depth + 1, max_depth);
        match self {
            QueryValue::Array(_) | QueryValue::Map(_) if depth > max_depth => {
                Err(Error::MaxDepthExceeded(max_depth))
            }
            QueryValue::Array(items) => items.iter().try_for_each(check),
            QueryValue::Map(entries) => entries.values().try_for_each(check),
            _ => Ok(()),
        }
    }

    fn rank(&self) -> u8 {
        match self {
            QueryValue::Bool(_) => 0,
            QueryValue::Number(_) => 1,
            QueryValue::String(_) => 2,
            QueryValue::Array(_) => 3,
            QueryValue::Map(_) => 4,
            QueryValue::Null => 5,
        }
    }

    /// Deep equality, using `policy` wherever two scalars meet.
    ///
    /// Arrays must have the same length and pairwise-equal elements. Maps
    /// must have the same keys and equal values. `Null` only equals `Null`.
    pub fn deep_eq(&self, other: &QueryValue, policy: ScalarEquality) -> bool {
        match (self, other) {
            (QueryValue::Null, QueryValue::Null) => true,
            (QueryValue::Array(a), QueryValue::Array(b)) => {
                a.len() == b.len() && a.iter().zip(b).all(|(x, y)| x.deep_eq(y, policy))
            }
            (QueryValue::Map(a), QueryValue::Map(b)) => {
                a.len() == b.len()
                    && a.iter()
                        .all(|(k, v)| b.get(k).is_some_and(|w| v.deep_eq(w, policy)))
            }
            _ => match (self.as_scalar(), other.as_scalar()) {
                (Some(a), Some(b)) => a.matches(&b, policy),
                _ => false,
            },
        }
    }

    /// The ascending order used when sorting array elements.
    ///
    /// Numbers compare numerically and strings by bytes. Values of different
    /// kinds order as bool, number, string, array, map, then null.
    pub fn sort_cmp(&self, other: &QueryValue) -> Ordering {
        match (self, other) {
            (QueryValue::Bool(a), QueryValue::Bool(b)) => a.cmp(b),
            (QueryValue::Number(a), QueryValue::Number(b)) => a.cmp(b),
            (QueryValue::String(a), QueryValue::String(b)) => a.cmp(b),
            (QueryValue::Array(a), QueryValue::Array(b)) => {
                for (x, y) in a.iter().zip(b) {
                    match x.sort_cmp(y) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    }
                }
                a.len().cmp(&b.len())
            }
            (QueryValue::Map(a), QueryValue::Map(b)) => {
                for ((ka, va), (kb, vb)) in a.iter().zip(b) {
                    match ka.cmp(kb).then_with(|| va.sort_cmp(vb)) {
                        Ordering::Equal => continue,
                        ord => return ord,
                    }
                }
                a.len().cmp(&b.len())
            }
            _ => self.rank().cmp(&other.rank()),
        }
    }
}

impl From<bool> for QueryValue {
    fn from(v: bool) -> Self {
        QueryValue::Bool(v)
    }
}

impl From<&str> for QueryValue {
    fn from(v: &str) -> Self {
        QueryValue::String(v.to_owned())
    }
}

impl From<String> for QueryValue {
    fn from(v: String) -> Self {
        QueryValue::String(v)
    }
}

impl From<u64> for QueryValue {
    fn from(v: u64) -> Self {
        QueryValue::Number(Number::PosInt(v))
    }
}

impl From<i64> for QueryValue {
    fn from(v: i64) -> Self {
        if v < 0 {
            QueryValue::Number(Number::NegInt(v))
        } else {
            QueryValue::Number(Number::PosInt(v as u64))
        }
    }
}

impl From<i32> for QueryValue {
    fn from(v: i32) -> Self {
        QueryValue::from(i64::from(v))
    }
}

impl<T: Into<QueryValue>> From<Option<T>> for QueryValue {
    fn from(v: Option<T>) -> Self {
        v.map_or(QueryValue::Null, Into::into)
    }
}

impl<T: Into<QueryValue>> From<Vec<T>> for QueryValue {
    fn from(v: Vec<T>) -> Self {
        QueryValue::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<K: Into<String>, V: Into<QueryValue>> FromIterator<(K, V)> for QueryValue {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        QueryValue::Map(iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(v: i64) -> QueryValue {
        QueryValue::from(v)
    }

    #[test]
    fn numbers_compare_across_representations() {
        assert_eq!(Number::PosInt(1), Number::Float(1.0));
        assert_eq!(Number::NegInt(-3), Number::Float(-3.0));
        assert!(Number::NegInt(-1) < Number::PosInt(0));
        assert!(Number::Float(1.5) < Number::PosInt(2));
        assert!(Number::PosInt(u64::MAX) > Number::NegInt(i64::MIN));
    }

    #[test]
    fn number_text_is_canonical() {
        assert_eq!(Number::PosInt(5).to_string(), "5");
        assert_eq!(Number::NegInt(-12).to_string(), "-12");
        assert_eq!(Number::Float(5.0).to_string(), "5");
        assert_eq!(Number::Float(-0.0).to_string(), "0");
        assert_eq!(Number::Float(1.25).to_string(), "1.25");
        assert_eq!(Number::Float(1e300).to_string(), "1e300");
        assert_eq!(Number::Float(1e17).to_string(), "100000000000000000");
        assert_eq!(Number::Float(-1e17).to_string(), "-100000000000000000");
        assert_eq!(
            Number::Float(1e17).to_string(),
            Number::PosInt(100_000_000_000_000_000).to_string()
        );
        assert_eq!(Number::Float(1e19).to_string(), "10000000000000000000");
        assert_eq!(Number::Float(-1e19).to_string(), "-1e19");
        assert_eq!(Number::Float(1e20).to_string(), "1e20");
    }

    #[test]
    fn textual_policy_matches_across_kinds() {
        let s = Scalar::String("1".into());
        let n = Scalar::Number(Number::PosInt(1));
        assert!(s.matches(&n, ScalarEquality::Textual));
        assert!(!s.matches(&n, ScalarEquality::Strict));

        let t = Scalar::String("true".into());
        assert!(t.matches(&Scalar::Bool(true), ScalarEquality::Textual));
        assert!(!t.matches(&Scalar::Bool(true), ScalarEquality::Strict));
    }

    #[test]
    fn deep_eq_is_structural() {
        let a: QueryValue = [("ids", QueryValue::from(vec![1, 2])), ("q", "x".into())]
            .into_iter()
            .collect();
        let b: QueryValue = [("q", QueryValue::from("x")), ("ids", vec![1, 2].into())]
            .into_iter()
            .collect();
        let c: QueryValue = [("ids", QueryValue::from(vec![2, 1])), ("q", "x".into())]
            .into_iter()
            .collect();
        assert!(a.deep_eq(&b, ScalarEquality::Strict));
        assert!(!a.deep_eq(&c, ScalarEquality::Strict));
        assert!(!num(1).deep_eq(&QueryValue::Null, ScalarEquality::Textual));
        assert!(QueryValue::Null.deep_eq(&QueryValue::Null, ScalarEquality::Strict));
        assert!(!QueryValue::Array(vec![]).deep_eq(&QueryValue::Map(BTreeMap::new()), ScalarEquality::Textual));
    }

    #[test]
    fn depth_check_counts_containers_below_the_top() {
        let leaf: QueryValue = [("c", 1)].into_iter().collect();
        let mid: QueryValue = [("b", leaf)].into_iter().collect();
        let top: QueryValue = [("a", mid)].into_iter().collect();

        assert!(top.check_depth(2).is_ok());
        assert!(matches!(top.check_depth(1), Err(Error::MaxDepthExceeded(1))));
        assert!(num(1).check_depth(0).is_ok());
    }

    #[test]
    fn sort_order_is_numeric_then_by_kind() {
        let mut values = vec![
            num(10),
            QueryValue::from("b"),
            num(2),
            QueryValue::Bool(true),
            QueryValue::from("a"),
            QueryValue::Number(Number::Float(0.5)),
        ];
        values.sort_by(QueryValue::sort_cmp);
        assert_eq!(
            values,
            vec![
                QueryValue::Bool(true),
                QueryValue::Number(Number::Float(0.5)),
                num(2),
                num(10),
                QueryValue::from("a"),
                QueryValue::from("b"),
            ]
        );
    }
}
