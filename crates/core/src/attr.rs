//! Attribute values as encoded by the source change stream.
//!
//! Every field arrives with a type tag; set-typed fields keep their tag here
//! so translation can apply set semantics deliberately instead of losing them
//! at parse time. `to_json` is the single exit point into plain JSON, and it
//! converts every set into an ordered sequence, so nothing downstream of
//! translation ever sees a set value.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use serde_json::Value as Json;

/// Top-level image: attribute name to tagged value.
pub type AttrMap = BTreeMap<String, Attr>;

/// One tagged attribute value. External serde tagging matches the stream's
/// wire shape: `{"S": "x"}`, `{"N": "1.5"}`, `{"SS": ["a", "b"]}`.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum Attr {
    #[serde(rename = "S")]
    Str(String),
    /// Numbers are carried as decimal text by the stream.
    #[serde(rename = "N")]
    Num(String),
    #[serde(rename = "BOOL")]
    Bool(bool),
    #[serde(rename = "NULL")]
    Null(bool),
    #[serde(rename = "L")]
    List(Vec<Attr>),
    #[serde(rename = "M")]
    Map(BTreeMap<String, Attr>),
    /// Unordered string set.
    #[serde(rename = "SS")]
    StrSet(Vec<String>),
    /// Unordered number set, elements as decimal text.
    #[serde(rename = "NS")]
    NumSet(Vec<String>),
}

impl Attr {
    /// Convert to plain JSON. Sets become ordered sequences (string sets
    /// lexicographic, number sets numeric) so the result is independent of
    /// stream-side set iteration order.
    pub fn to_json(&self) -> Json {
        match self {
            Attr::Str(s) => Json::String(s.clone()),
            Attr::Num(n) => num_to_json(n),
            Attr::Bool(b) => Json::Bool(*b),
            Attr::Null(_) => Json::Null,
            Attr::List(items) => Json::Array(items.iter().map(Attr::to_json).collect()),
            Attr::Map(map) => {
                Json::Object(map.iter().map(|(k, v)| (k.clone(), v.to_json())).collect())
            }
            Attr::StrSet(items) => {
                let mut sorted = items.clone();
                sorted.sort();
                Json::Array(sorted.into_iter().map(Json::String).collect())
            }
            Attr::NumSet(items) => {
                let mut sorted = items.clone();
                sort_numeric(&mut sorted);
                Json::Array(sorted.iter().map(|n| num_to_json(n)).collect())
            }
        }
    }
}

fn num_to_json(n: &str) -> Json {
    match n.parse::<serde_json::Number>() {
        Ok(num) => Json::Number(num),
        Err(_) => Json::String(n.to_string()),
    }
}

fn sort_numeric(items: &mut [String]) {
    items.sort_by(|a, b| match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x.total_cmp(&y),
        (Ok(_), Err(_)) => std::cmp::Ordering::Less,
        (Err(_), Ok(_)) => std::cmp::Ordering::Greater,
        (Err(_), Err(_)) => a.cmp(b),
    });
}

/// Convert a whole image to a JSON object map.
pub fn map_to_json(image: &AttrMap) -> serde_json::Map<String, Json> {
    image.iter().map(|(k, v)| (k.clone(), v.to_json())).collect()
}

/// Extract a document id attribute as a string. Absent or non-scalar
/// attributes yield an empty string; the transmission-boundary validation
/// gate reports those.
pub fn id_string(image: &AttrMap, attr: &str) -> String {
    match image.get(attr) {
        Some(Attr::Str(s)) => s.clone(),
        Some(Attr::Num(n)) => n.clone(),
        _ => String::new(),
    }
}

/// Deep structural equality over attribute values.
///
/// Primitives compare by value (numbers numerically), lists element-wise and
/// order-sensitively, sets as ordered sequences (order-insensitive but
/// multiset-sensitive), maps key-by-key after a key-count shortcut.
pub fn deep_equal(a: &Attr, b: &Attr) -> bool {
    match (a, b) {
        (Attr::Str(x), Attr::Str(y)) => x == y,
        (Attr::Num(x), Attr::Num(y)) => num_equal(x, y),
        (Attr::Bool(x), Attr::Bool(y)) => x == y,
        (Attr::Null(_), Attr::Null(_)) => true,
        (Attr::List(xs), Attr::List(ys)) => {
            xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| deep_equal(x, y))
        }
        (Attr::Map(xm), Attr::Map(ym)) => {
            if xm.len() != ym.len() {
                return false;
            }
            xm.iter().all(|(k, xv)| ym.get(k).is_some_and(|yv| deep_equal(xv, yv)))
        }
        (Attr::StrSet(xs), Attr::StrSet(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            let mut xs = xs.clone();
            let mut ys = ys.clone();
            xs.sort();
            ys.sort();
            xs == ys
        }
        (Attr::NumSet(xs), Attr::NumSet(ys)) => {
            if xs.len() != ys.len() {
                return false;
            }
            let mut xs = xs.clone();
            let mut ys = ys.clone();
            sort_numeric(&mut xs);
            sort_numeric(&mut ys);
            xs.iter().zip(&ys).all(|(x, y)| num_equal(x, y))
        }
        _ => false,
    }
}

fn num_equal(a: &str, b: &str) -> bool {
    match (a.parse::<f64>(), b.parse::<f64>()) {
        (Ok(x), Ok(y)) => x == y,
        _ => a == b,
    }
}
