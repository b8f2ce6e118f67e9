//! Walks a value tree and collects the `(path, value)` pairs that end up in
//! the querystring.
//!
//! Values that are absent, or that repeat the caller's defaults, are left out
//! here so that the encoder only sees what actually needs to be written.

use std::fmt;

use crate::value::{QueryValue, Scalar, ScalarEquality};

/// How an array is matched against a default array at the same path.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ArrayDefaults {
    /// The array is left out only when it holds the same elements as the
    /// default, ignoring order. Otherwise every element is kept.
    #[default]
    Whole,
    /// Every element that equals some element of the default is left out,
    /// and the rest are kept.
    Difference,
}

/// One step of a [`Path`].
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum Segment {
    /// A named key, rendered as `key` or `[key]`.
    Key(String),
    /// The next slot of an array, rendered as `[]`.
    Append,
}

/// The route from the top-level mapping to a leaf.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct Path(Vec<Segment>);

impl Path {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn segments(&self) -> &[Segment] {
        &self.0
    }

    fn child(&self, segment: Segment) -> Self {
        let mut segments = Vec::with_capacity(self.0.len() + 1);
        segments.extend_from_slice(&self.0);
        segments.push(segment);
        Self(segments)
    }
}

impl From<Vec<Segment>> for Path {
    fn from(segments: Vec<Segment>) -> Self {
        Self(segments)
    }
}

/// Renders the unencoded key, e.g. `filter[search][]`.
impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                Segment::Key(key) if i == 0 => f.write_str(key)?,
                Segment::Key(key) => write!(f, "[{key}]")?,
                Segment::Append => f.write_str("[]")?,
            }
        }
        Ok(())
    }
}

/// A single `key=value` entry before it is encoded.
#[derive(Clone, Debug, PartialEq)]
pub struct LeafPair {
    pub path: Path,
    pub value: Scalar,
}

/// Settings that decide when a value counts as a repeat of its default.
#[derive(Clone, Copy, Debug, Default)]
pub struct Elision {
    pub scalars: ScalarEquality,
    pub arrays: ArrayDefaults,
}

/// Collects the leaf pairs of `value`, skipping absent values and values that
/// match `defaults` at the same path.
///
/// No depth limit is applied here. [`Config::encode_value`](crate::Config::encode_value)
/// checks `max_depth` before flattening.
///
/// ```
/// use canonical_qs::{Elision, Path, QueryValue, Segment, flatten};
///
/// let query: QueryValue = [("ids", vec![3, 1])].into_iter().collect();
/// let leaves = flatten(&query, None, Elision::default());
/// let keys: Vec<String> = leaves.iter().map(|leaf| leaf.path.to_string()).collect();
/// assert_eq!(keys, ["ids[]", "ids[]"]);
/// assert_eq!(leaves[0].value.to_text(), "1");
/// ```
pub fn flatten(value: &QueryValue, defaults: Option<&QueryValue>, elision: Elision) -> Vec<LeafPair> {
    let mut leaves = Vec::new();
    Flattener {
        elision,
        leaves: &mut leaves,
    }
    .visit(value, defaults, &Path::new());
    leaves
}

struct Flattener<'a> {
    elision: Elision,
    leaves: &'a mut Vec<LeafPair>,
}

impl Flattener<'_> {
    fn visit(&mut self, value: &QueryValue, default: Option<&QueryValue>, path: &Path) {
        // absence wins over any default
        if value.is_absent() {
            return;
        }

        match value {
            QueryValue::Array(items) => self.visit_array(items, default, path),
            QueryValue::Map(entries) => {
                let defaults = match default {
                    Some(QueryValue::Map(defaults)) => Some(defaults),
                    _ => None,
                };
                for (key, child) in entries {
                    let child_default = defaults.and_then(|d| d.get(key));
                    self.visit(child, child_default, &path.child(Segment::Key(key.clone())));
                }
            }
            _ => {
                let Some(scalar) = value.as_scalar() else {
                    return;
                };
                if default.is_some_and(|d| value.deep_eq(d, self.elision.scalars)) {
                    tracing::trace!(key = %path, "value matches default, skipping");
                    return;
                }
                self.leaves.push(LeafPair {
                    path: path.clone(),
                    value: scalar,
                });
            }
        }
    }

    fn visit_array(&mut self, items: &[QueryValue], default: Option<&QueryValue>, path: &Path) {
        if items.is_empty() {
            return;
        }

        // absent elements are never written, so they take no part in matching
        let mut sorted: Vec<&QueryValue> = items.iter().filter(|item| !item.is_absent()).collect();
        sorted.sort_by(|a, b| a.sort_cmp(b));

        if let Some(QueryValue::Array(default_items)) = default {
            let policy = self.elision.scalars;
            let default_items: Vec<&QueryValue> =
                default_items.iter().filter(|item| !item.is_absent()).collect();
            match self.elision.arrays {
                ArrayDefaults::Whole => {
                    if same_elements(&sorted, &default_items, policy) {
                        tracing::trace!(key = %path, "array matches default, skipping");
                        return;
                    }
                }
                ArrayDefaults::Difference => {
                    sorted.retain(|item| !default_items.iter().any(|d| item.deep_eq(d, policy)));
                    tracing::trace!(key = %path, kept = sorted.len(), "removed default elements");
                }
            }
        }

        let element_path = path.child(Segment::Append);
        for item in sorted {
            self.visit(item, None, &element_path);
        }
    }
}

/// Whether both slices hold the same elements, counting duplicates and
/// ignoring order.
///
/// Each element is paired with an unused equal element of the other side, so
/// elements that are equal under `policy` but sort apart still match.
fn same_elements(items: &[&QueryValue], defaults: &[&QueryValue], policy: ScalarEquality) -> bool {
    if items.len() != defaults.len() {
        return false;
    }
    let mut used = vec![false; defaults.len()];
    items.iter().all(|item| {
        let found = defaults
            .iter()
            .zip(used.iter_mut())
            .find(|(d, used)| !**used && item.deep_eq(d, policy));
        match found {
            Some((_, used)) => {
                *used = true;
                true
            }
            None => false,
        }
    })
}
