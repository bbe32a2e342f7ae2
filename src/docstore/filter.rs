//! Declarative document predicates
//!
//! Field paths are dotted (`graphTxn.pruneHeight`). A path segment applied to
//! an array fans out over its elements, so `out.h1` matches when any output
//! carries the value. A numeric segment applied to an array selects by position.

use std::cmp::Ordering;

use serde::{Deserialize, Serialize};
use serde_json::Value;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Filter {
    /// Matches every document
    All,
    Eq(String, Value),
    Gt(String, Value),
    Gte(String, Value),
    /// Field is missing or null
    IsNull(String),
    /// Field is present with a non-null value
    Exists(String),
    And(Vec<Filter>),
    Or(Vec<Filter>),
    /// Some element of the array at the path satisfies every inner filter
    ElemMatch(String, Vec<Filter>),
}

impl Filter {
    pub fn eq(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Eq(path.into(), value.into())
    }

    pub fn gt(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gt(path.into(), value.into())
    }

    pub fn gte(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Filter::Gte(path.into(), value.into())
    }

    pub fn is_null(path: impl Into<String>) -> Self {
        Filter::IsNull(path.into())
    }

    pub fn exists(path: impl Into<String>) -> Self {
        Filter::Exists(path.into())
    }

    /// Evaluate the predicate against a document
    pub fn matches(&self, doc: &Value) -> bool {
        match self {
            Filter::All => true,
            Filter::Eq(path, expected) => resolve(doc, path).into_iter().any(|candidate| {
                candidate == expected
                    || matches!(candidate, Value::Array(items) if items.contains(expected))
            }),
            Filter::Gt(path, bound) => any_cmp(doc, path, bound, |o| o == Ordering::Greater),
            Filter::Gte(path, bound) => any_cmp(doc, path, bound, |o| o != Ordering::Less),
            Filter::IsNull(path) => {
                let candidates = resolve(doc, path);
                candidates.is_empty() || candidates.iter().any(|v| v.is_null())
            }
            Filter::Exists(path) => resolve(doc, path).iter().any(|v| !v.is_null()),
            Filter::And(filters) => filters.iter().all(|f| f.matches(doc)),
            Filter::Or(filters) => filters.iter().any(|f| f.matches(doc)),
            Filter::ElemMatch(path, filters) => {
                resolve(doc, path).into_iter().any(|candidate| match candidate {
                    Value::Array(items) => items
                        .iter()
                        .any(|item| filters.iter().all(|f| f.matches(item))),
                    _ => false,
                })
            }
        }
    }

    /// Equality term usable for an index lookup: a top-level `Eq` on a scalar,
    /// or the first such term of a top-level `And`.
    pub fn indexable_eq(&self) -> Option<(&str, &Value)> {
        match self {
            Filter::Eq(path, value) if is_scalar(value) => Some((path.as_str(), value)),
            Filter::And(filters) => filters.iter().find_map(Filter::indexable_eq),
            _ => None,
        }
    }
}

fn is_scalar(value: &Value) -> bool {
    !matches!(value, Value::Array(_) | Value::Object(_) | Value::Null)
}

fn any_cmp(doc: &Value, path: &str, bound: &Value, accept: impl Fn(Ordering) -> bool) -> bool {
    resolve(doc, path)
        .into_iter()
        .filter_map(|candidate| compare(candidate, bound))
        .any(accept)
}

/// Ordering between two JSON scalars of the same family
pub fn compare(a: &Value, b: &Value) -> Option<Ordering> {
    match (a, b) {
        (Value::Number(x), Value::Number(y)) => {
            if let (Some(x), Some(y)) = (x.as_u64(), y.as_u64()) {
                return Some(x.cmp(&y));
            }
            if let (Some(x), Some(y)) = (x.as_i64(), y.as_i64()) {
                return Some(x.cmp(&y));
            }
            x.as_f64()?.partial_cmp(&y.as_f64()?)
        }
        (Value::String(x), Value::String(y)) => Some(x.cmp(y)),
        (Value::Bool(x), Value::Bool(y)) => Some(x.cmp(y)),
        _ => None,
    }
}

/// Collect every value reachable at a dotted path
pub fn resolve<'a>(doc: &'a Value, path: &str) -> Vec<&'a Value> {
    let mut current = vec![doc];
    for segment in path.split('.') {
        let mut next = Vec::new();
        for value in current {
            step(value, segment, &mut next);
        }
        if next.is_empty() {
            return next;
        }
        current = next;
    }
    current
}

fn step<'a>(value: &'a Value, segment: &str, out: &mut Vec<&'a Value>) {
    match value {
        Value::Object(map) => {
            if let Some(v) = map.get(segment) {
                out.push(v);
            }
        }
        Value::Array(items) => {
            if let Ok(position) = segment.parse::<usize>() {
                if let Some(v) = items.get(position) {
                    out.push(v);
                }
                return;
            }
            for item in items {
                if let Value::Object(map) = item {
                    if let Some(v) = map.get(segment) {
                        out.push(v);
                    }
                }
            }
        }
        _ => {}
    }
}
