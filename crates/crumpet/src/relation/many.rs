use super::{collect_keys, require_companion};
use crate::{
    model::{key_set, scoped},
    FindOptions, FindResult, Instance,
};

use crumpet_core::{schema::relation::Many, stmt::Value, Result};
use crumpet_sql::Update;
use serde_json::{Map, Value as Json};

/// Accessor for the owning side of a one-to-many relation. The companion rows
/// store the foreign key.
#[derive(Debug)]
pub struct ManyRelation<'a> {
    instance: &'a Instance,
    relation: Many,
}

impl<'a> ManyRelation<'a> {
    pub(crate) fn new(instance: &'a Instance, relation: Many) -> ManyRelation<'a> {
        ManyRelation { instance, relation }
    }

    pub fn name(&self) -> &str {
        &self.relation.name
    }

    pub fn relation(&self) -> &Many {
        &self.relation
    }

    /// Link `other`, also updating its in-memory foreign key.
    pub async fn link(&self, other: &mut Instance) -> Result<()> {
        let owner_id = self.instance.require_persisted()?.clone();
        let key = require_companion(other, &self.relation.companion)?.clone();

        self.link_by_pk([key]).await?;
        other.set(&self.relation.foreign_key, owner_id)?;

        Ok(())
    }

    /// Point the companion rows with the given primary keys at this instance.
    /// Returns the number of rows changed.
    pub async fn link_by_pk<I>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let owner_id = self.instance.require_persisted()?.clone();
        let keys = collect_keys(keys);
        if keys.is_empty() {
            return Ok(0);
        }

        let criteria = self.keys_criteria(&keys)?;
        self.assign(owner_id, criteria).await
    }

    /// Clear the foreign key of the linked companion rows with the given
    /// primary keys.
    pub async fn unlink_by_pk<I>(&self, keys: I) -> Result<u64>
    where
        I: IntoIterator,
        I::Item: Into<Value>,
    {
        let owner_id = self.instance.require_persisted()?.clone();
        let keys = collect_keys(keys);
        if keys.is_empty() {
            return Ok(0);
        }

        let criteria = scoped(self.keys_criteria(&keys)?, &self.relation.foreign_key, &owner_id);
        self.assign(Value::Null, criteria).await
    }

    /// Clear the foreign key of the linked companion rows matching
    /// `criteria`.
    pub async fn unlink_where(&self, criteria: Json) -> Result<u64> {
        let owner_id = self.instance.require_persisted()?.clone();
        let criteria = scoped(criteria, &self.relation.foreign_key, &owner_id);
        self.assign(Value::Null, criteria).await
    }

    pub async fn unlink_all(&self) -> Result<u64> {
        self.unlink_where(Json::Null).await
    }

    /// Search the linked companion rows.
    pub async fn find(&self, options: impl Into<FindOptions>) -> Result<FindResult> {
        let owner_id = self.instance.require_persisted()?;

        let mut options = options.into();
        options.filter = scoped(options.filter, &self.relation.foreign_key, owner_id);

        self.instance
            .db()
            .find(&self.relation.companion, options)
            .await
    }

    /// Number of linked companion rows matching `criteria`.
    pub async fn count(&self, criteria: Json) -> Result<u64> {
        let owner_id = self.instance.require_persisted()?;
        let criteria = scoped(criteria, &self.relation.foreign_key, owner_id);

        self.instance
            .db()
            .count(&self.relation.companion, criteria)
            .await
    }

    async fn assign(&self, value: Value, criteria: Json) -> Result<u64> {
        let update = Update::new(&self.relation.companion)
            .set(&self.relation.foreign_key, value)
            .filter(criteria);
        self.instance.db().update(update).await
    }

    fn keys_criteria(&self, keys: &[Value]) -> Result<Json> {
        let companion = self.instance.db().schema().model(&self.relation.companion)?;

        let mut criteria = Map::new();
        criteria.insert(companion.primary_key_name().to_string(), key_set(keys));
        Ok(Json::Object(criteria))
    }
}
