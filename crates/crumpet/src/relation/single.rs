use super::require_companion;
use crate::{model::pk_criteria, Instance};

use crumpet_core::{schema::relation::Single, stmt::Value, Result};
use crumpet_sql::Update;
use serde_json::{Map, Value as Json};

/// Accessor for a one-to-one or many-to-one relation.
#[derive(Debug)]
pub struct SingleRelation<'a> {
    instance: &'a mut Instance,
    relation: Single,
}

impl<'a> SingleRelation<'a> {
    pub(crate) fn new(instance: &'a mut Instance, relation: Single) -> SingleRelation<'a> {
        SingleRelation { instance, relation }
    }

    pub fn name(&self) -> &str {
        &self.relation.name
    }

    pub fn relation(&self) -> &Single {
        &self.relation
    }

    /// The related instance, if any.
    pub async fn get(&self) -> Result<Option<Instance>> {
        let companion = self.instance.db().model(&self.relation.companion)?;

        if self.relation.is_left {
            return match self.instance.field(&self.relation.foreign_key) {
                Some(key) if !key.is_null() => companion.find_by_pk(key.clone()).await,
                _ => Ok(None),
            };
        }

        let owner_id = self.instance.row_id();
        if !self.instance.is_created() || owner_id.is_null() {
            return Ok(None);
        }

        companion
            .find_one(foreign_key_equals(&self.relation.foreign_key, owner_id))
            .await
    }

    /// Point the relation at `other`. When `other` stores the foreign key its
    /// in-memory value is updated too.
    pub async fn link(&mut self, other: &mut Instance) -> Result<()> {
        self.instance.require_persisted()?;
        let key = require_companion(other, &self.relation.companion)?.clone();

        self.link_by_pk(key).await?;

        if !self.relation.is_left {
            let owner_id = self.instance.row_id().clone();
            other.set(&self.relation.foreign_key, owner_id)?;
        }

        Ok(())
    }

    /// Point the relation at the companion row whose primary key is `key`.
    ///
    /// On the reverse side of a one-to-one relation any companion row already
    /// linked to this instance is unlinked first.
    pub async fn link_by_pk(&mut self, key: impl Into<Value>) -> Result<()> {
        let owner_id = self.instance.require_persisted()?.clone();
        let key = key.into();
        let foreign_key = self.relation.foreign_key.clone();

        if self.relation.is_left {
            self.instance.set(&foreign_key, key)?;
            return self.instance.flush_fields(&[foreign_key.as_str()]).await;
        }

        let db = self.instance.db().clone();
        let companion = db.schema().model(&self.relation.companion)?;

        let detach = Update::new(&companion.name)
            .set(&foreign_key, Value::Null)
            .filter(foreign_key_equals(&foreign_key, &owner_id));
        db.update(detach).await?;

        let attach = Update::new(&companion.name)
            .set(&foreign_key, owner_id)
            .filter(pk_criteria(companion, &key));
        db.update(attach).await?;

        Ok(())
    }

    /// Clear the relation on whichever side stores the foreign key.
    pub async fn unlink(&mut self) -> Result<()> {
        let owner_id = self.instance.require_persisted()?.clone();
        let foreign_key = self.relation.foreign_key.clone();

        if self.relation.is_left {
            self.instance.set(&foreign_key, Value::Null)?;
            return self.instance.flush_fields(&[foreign_key.as_str()]).await;
        }

        let detach = Update::new(&self.relation.companion)
            .set(&foreign_key, Value::Null)
            .filter(foreign_key_equals(&foreign_key, &owner_id));
        self.instance.db().update(detach).await?;

        Ok(())
    }
}

fn foreign_key_equals(foreign_key: &str, owner_id: &Value) -> Json {
    let mut criteria = Map::new();
    criteria.insert(foreign_key.to_string(), Json::from(owner_id));
    Json::Object(criteria)
}
