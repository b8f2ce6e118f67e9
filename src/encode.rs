//! Turns flattened leaf pairs into the final, sorted querystring.

use std::borrow::Cow;

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC};

use crate::flatten::{LeafPair, Segment};

/// URI component encoding.
///
/// Everything except the ASCII alphanumerics and the unreserved marks
/// U+002D (-), U+002E (.), U+005F (_) and U+007E (~) is percent-encoded.
/// That includes square brackets, `=`, `&`, `+` and space, which becomes `%20`.
const COMPONENT_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'.')
    .remove(b'_')
    .remove(b'~');

/// Percent-encodes one key segment or value.
///
/// Borrows the input when nothing needs encoding.
pub fn encode_component(s: &str) -> Cow<'_, str> {
    percent_encoding::utf8_percent_encode(s, COMPONENT_SET).into()
}

/// Renders and encodes the key of a leaf.
///
/// Key segments are always percent-encoded, so a literal `[` inside a key
/// can never be mistaken for nesting. The structural brackets are written
/// as-is unless `encode_brackets` is set.
fn encode_key(leaf: &LeafPair, encode_brackets: bool, out: &mut String) {
    let (open, close) = if encode_brackets {
        ("%5B", "%5D")
    } else {
        ("[", "]")
    };

    for (i, segment) in leaf.path.segments().iter().enumerate() {
        match segment {
            Segment::Key(key) if i == 0 => out.push_str(&encode_component(key)),
            Segment::Key(key) => {
                out.push_str(open);
                out.push_str(&encode_component(key));
                out.push_str(close);
            }
            Segment::Append => {
                out.push_str(open);
                out.push_str(close);
            }
        }
    }
}

/// Encodes the leaf pairs into a querystring without a leading `?`.
///
/// Pairs are ordered by their fully encoded key, brackets included, so the
/// order does not depend on `encode_brackets`. The sort is stable, so array
/// elements under the same key keep the order the flattener gave them.
///
/// ```
/// use canonical_qs::{Elision, QueryValue, encode, flatten};
///
/// let query: QueryValue = [("search", "Seb Ast"), ("page", "5")].into_iter().collect();
/// let leaves = flatten(&query, None, Elision::default());
/// assert_eq!(encode(&leaves, false), "page=5&search=Seb%20Ast");
/// ```
pub fn encode(leaves: &[LeafPair], encode_brackets: bool) -> String {
    // (sort key, written key, value)
    let mut pairs: Vec<(String, String, String)> = Vec::with_capacity(leaves.len());
    let mut text = String::new();
    for leaf in leaves {
        let mut sort_key = String::with_capacity(16);
        encode_key(leaf, true, &mut sort_key);
        let key = if encode_brackets {
            sort_key.clone()
        } else {
            let mut key = String::with_capacity(sort_key.len());
            encode_key(leaf, false, &mut key);
            key
        };

        text.clear();
        leaf.value.write_text(&mut text);
        pairs.push((sort_key, key, encode_component(&text).into_owned()));
    }

    pairs.sort_by(|(a, ..), (b, ..)| a.cmp(b));

    let capacity = pairs.iter().map(|(_, k, v)| k.len() + v.len() + 2).sum();
    let mut out = String::with_capacity(capacity);
    for (i, (_, key, value)) in pairs.iter().enumerate() {
        if i > 0 {
            out.push('&');
        }
        out.push_str(key);
        out.push('=');
        out.push_str(value);
    }
    out
}
