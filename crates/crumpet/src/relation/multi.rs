use super::{collect_keys, require_companion};
use crate::{model::key_set, FindOptions, Instance, PivotFindResult};

use crumpet_core::{
    schema::relation::Multi,
    stmt::{Record, Value},
    Error, Result,
};
use crumpet_sql::{KeySelect, PivotSelect, Remove};
use serde_json::{Map, Value as Json};

/// Accessor for a many-to-many relation. Links are rows of the pivot model.
#[derive(Debug)]
pub struct MultiRelation<'a> {
    instance: &'a Instance,
    relation: Multi,
}

impl<'a> MultiRelation<'a> {
    pub(crate) fn new(instance: &'a Instance, relation: Multi) -> MultiRelation<'a> {
        MultiRelation { instance, relation }
    }

    pub fn name(&self) -> &str {
        &self.relation.name
    }

    pub fn relation(&self) -> &Multi {
        &self.relation
    }

    pub async fn link(&self, other: &Instance) -> Result<()> {
        self.link_using(other, Record::new()).await
    }

    /// Link `other`, storing `extra` in the pivot row.
    pub async fn link_using(&self, other: &Instance, extra: Record) -> Result<()> {
        self.instance.require_persisted()?;
        let key = require_companion(other, &self.relation.companion)?.clone();

        self.link_by_pk_using([key], extra).await?;
        Ok(())
    }

    /// Insert one pivot row per key. Returns the number of rows inserted.
    pub async fn link_by_pk<I>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        self.link_by_pk_using(keys, Record::new()).await
    }

    /// Insert one pivot row per key, each also holding `extra`.
    ///
    /// Rows are inserted one statement at a time; on failure the rows already
    /// inserted are kept.
    pub async fn link_by_pk_using<I>(&self, keys: I, extra: Record) -> Result<u64>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let owner_id = self.instance.require_persisted()?.clone();
        let db = self.instance.db();

        let mut linked = 0;
        for key in collect_keys(keys) {
            let mut values = extra.clone();
            values.insert(self.relation.my_foreign_key.clone(), owner_id.clone());
            values.insert(self.relation.other_foreign_key.clone(), key);

            db.insert(&self.relation.pivot, values).await?;
            linked += 1;
        }

        tracing::debug!(relation = %self.relation.name, linked, "linked");
        Ok(linked)
    }

    /// Delete the pivot rows pairing this instance with the given keys.
    pub async fn unlink_by_pk<I>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let owner_id = self.instance.require_persisted()?;
        let keys = collect_keys(keys);
        if keys.is_empty() {
            return Ok(0);
        }

        let mut criteria = self.owner_criteria(owner_id);
        criteria.insert(self.relation.other_foreign_key.clone(), key_set(&keys));

        let remove = Remove::new(&self.relation.pivot).filter(Json::Object(criteria));
        self.instance.db().remove(remove).await
    }

    /// Delete the pivot rows pairing this instance with companion rows
    /// matching `criteria`.
    pub async fn unlink_where(&self, criteria: Json) -> Result<u64> {
        let owner_id = self.instance.require_persisted()?;

        let remove = Remove::new(&self.relation.pivot)
            .filter(Json::Object(self.owner_criteria(owner_id)))
            .key_in(
                &self.relation.other_foreign_key,
                KeySelect::new(&self.relation.companion, criteria),
            );
        self.instance.db().remove(remove).await
    }

    pub async fn unlink_all(&self) -> Result<u64> {
        let owner_id = self.instance.require_persisted()?;

        let remove =
            Remove::new(&self.relation.pivot).filter(Json::Object(self.owner_criteria(owner_id)));
        self.instance.db().remove(remove).await
    }

    /// Linked companion rows along with their pivot rows. Criteria, sort and
    /// paging apply to the pivot model; the owner key is always pinned.
    pub async fn find(&self, options: impl Into<FindOptions>) -> Result<PivotFindResult> {
        let options = options.into();
        if !options.join.is_empty() {
            return Err(Error::invalid_criteria(format!(
                "relation `{}` cannot join other relations",
                self.relation.name
            )));
        }

        let owner_id = self.instance.require_persisted()?.clone();
        let db = self.instance.db();

        let mut select = PivotSelect::new(self.relation.clone(), owner_id);
        select.criteria = options.filter;
        select.sort = options.sort;
        select.limit = options.limit;
        select.offset = options.offset;
        select.count = options.count;

        let select = select.build(db.schema())?;

        let pivot = db.model(&self.relation.pivot)?;
        let companion = db.model(&self.relation.companion)?;

        let rows = db.all(&select.statement).await?;
        let mut result = PivotFindResult::default();

        for row in &rows {
            result
                .items
                .push(companion.build_from_database_result(row, Some(&self.relation.name))?);
            result
                .relation_items
                .push(pivot.build_from_database_result(row, Some(&select.prefix))?);
        }

        if let Some(count) = &select.count {
            result.total_count = Some(db.fetch_count(count).await?);
        }

        Ok(result)
    }

    fn owner_criteria(&self, owner_id: &Value) -> Map<String, Json> {
        let mut criteria = Map::new();
        criteria.insert(self.relation.my_foreign_key.clone(), Json::from(owner_id));
        criteria
    }
}
