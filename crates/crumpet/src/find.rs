use crate::Instance;

use crumpet_core::schema::SortEntry;
use indexmap::IndexMap;
use serde_json::Value as Json;

/// Options of a `find` call.
///
/// Converting criteria with `From` gives a plain filtered search:
/// `model.find(json!({"name": "a"}))`.
#[derive(Debug, Clone, Default)]
pub struct FindOptions {
    /// Criteria object. `null` matches every row.
    pub filter: Json,

    pub sort: Vec<SortEntry>,

    pub limit: Option<u64>,

    pub offset: Option<u64>,

    /// Single relations whose companion rows are loaded with each item
    pub join: Vec<String>,

    /// Also compute the number of matching rows, ignoring limit and offset
    pub count: bool,
}

/// Companion instances loaded for one item, keyed by relation name. `None`
/// when the item has no companion.
pub type Joined = IndexMap<String, Option<Instance>>;

#[derive(Debug, Default)]
pub struct FindResult {
    pub items: Vec<Instance>,

    /// One entry per item, in item order. Empty unless relations were joined.
    pub joined: Vec<Joined>,

    pub total_count: Option<u64>,
}

/// Result of searching through a many-to-many relation.
#[derive(Debug, Default)]
pub struct PivotFindResult {
    /// Companion rows
    pub items: Vec<Instance>,

    /// Pivot rows, one per item and in item order
    pub relation_items: Vec<Instance>,

    pub total_count: Option<u64>,
}

impl FindOptions {
    pub fn new() -> FindOptions {
        FindOptions::default()
    }

    pub fn filter(mut self, criteria: Json) -> FindOptions {
        self.filter = criteria;
        self
    }

    pub fn sort(mut self, entry: SortEntry) -> FindOptions {
        self.sort.push(entry);
        self
    }

    pub fn limit(mut self, limit: u64) -> FindOptions {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> FindOptions {
        self.offset = Some(offset);
        self
    }

    pub fn join(mut self, relation: impl Into<String>) -> FindOptions {
        self.join.push(relation.into());
        self
    }

    pub fn with_count(mut self) -> FindOptions {
        self.count = true;
        self
    }
}

impl From<Json> for FindOptions {
    fn from(criteria: Json) -> FindOptions {
        FindOptions::new().filter(criteria)
    }
}

impl FindResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

impl IntoIterator for FindResult {
    type Item = Instance;
    type IntoIter = std::vec::IntoIter<Instance>;

    fn into_iter(self) -> Self::IntoIter {
        self.items.into_iter()
    }
}

impl PivotFindResult {
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}
