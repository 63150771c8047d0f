use super::Value;

use indexmap::IndexMap;
use std::fmt;

/// Bound parameters for one compiled statement.
///
/// Placeholder names come from a monotonic counter owned by the set, so they
/// are unique for the lifetime of the statement. Subqueries compiled into the
/// same statement push into the same set.
#[derive(Debug, Default, Clone, PartialEq)]
pub struct Params {
    values: IndexMap<String, Value>,
    next: usize,
}

/// Name of a bound parameter. Renders as `:uniq_<n>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Placeholder(String);

impl Params {
    pub fn new() -> Params {
        Params::default()
    }

    /// Bind a value, returning the placeholder referencing it.
    pub fn push(&mut self, value: Value) -> Placeholder {
        self.next += 1;
        let name = format!("uniq_{}", self.next);
        self.values.insert(name.clone(), value);
        Placeholder(name)
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name.trim_start_matches(':'))
    }

    /// Number of bound values.
    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Iterate `(name, value)` pairs in binding order. Names do not carry the
    /// leading `:`.
    pub fn iter(&self) -> impl ExactSizeIterator<Item = (&str, &Value)> + '_ {
        self.values.iter().map(|(name, value)| (&name[..], value))
    }
}

impl Placeholder {
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Placeholder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, ":{}", self.0)
    }
}
