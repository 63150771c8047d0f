use crate::{
    model::pk_criteria,
    relation::{ManyRelation, MultiRelation, RelationAccessor, SingleRelation},
    Db, ModelHandle,
};

use crumpet_core::{
    err,
    schema::{now_millis, Model, Relation, OPERATOR_MARKER, UPDATED_AT},
    stmt::{Record, Value},
    Error, Result,
};
use crumpet_sql::{Remove, Update};
use indexmap::IndexSet;

use std::sync::Arc;

/// One record of a model, either freshly built or loaded from the database.
#[derive(Debug, Clone)]
pub struct Instance {
    db: Db,
    model: Arc<Model>,

    /// One entry per model field, in definition order
    values: Record,

    /// Fields never assigned since build. They are left out of the insert so
    /// the column default applies.
    unset: IndexSet<String>,

    /// Set once the backing row exists
    created: bool,

    row_id: Value,
}

/// A named member of an instance, as returned by [`Instance::get`].
#[derive(Debug, Clone, Copy)]
pub enum Member<'a> {
    Field(&'a Value),
    Relation(&'a Relation),
}

impl Instance {
    pub(crate) fn new(db: Db, model: Arc<Model>, values: Record) -> Instance {
        Instance {
            db,
            model,
            values,
            unset: IndexSet::new(),
            created: false,
            row_id: Value::Null,
        }
    }

    pub(crate) fn with_unset(mut self, unset: IndexSet<String>) -> Instance {
        self.unset = unset;
        self
    }

    pub(crate) fn mark_created(&mut self, row_id: Value) {
        self.created = true;
        self.row_id = row_id;
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    /// Handle to this instance's model.
    pub fn handle(&self) -> ModelHandle {
        ModelHandle::new(self.db.clone(), self.model.clone())
    }

    pub fn is_created(&self) -> bool {
        self.created
    }

    pub fn row_id(&self) -> &Value {
        &self.row_id
    }

    /// Set the row id. Models with a declared primary key also get the key
    /// field updated.
    pub fn set_row_id(&mut self, row_id: impl Into<Value>) {
        let row_id = row_id.into();

        if let Some(pk) = self.model.primary_key_field() {
            self.unset.shift_remove(&pk.name);
            self.values.insert(pk.name.clone(), row_id.clone());
        }

        self.row_id = row_id;
    }

    pub fn fields(&self) -> &Record {
        &self.values
    }

    pub fn field(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    pub fn relations(&self) -> impl ExactSizeIterator<Item = &Relation> + '_ {
        self.model.relations.values()
    }

    /// Look `name` up among fields, then relations. Names starting with `$`
    /// never resolve.
    pub fn get(&self, name: &str) -> Option<Member<'_>> {
        if is_reserved(name) {
            return None;
        }

        if let Some(value) = self.values.get(name) {
            return Some(Member::Field(value));
        }

        self.model.relation(name).map(Member::Relation)
    }

    /// Assign a field value. Returns `Ok(false)` without changing anything
    /// when `name` is a relation or starts with `$`; relations are changed
    /// through their accessors.
    pub fn set(&mut self, name: &str, value: impl Into<Value>) -> Result<bool> {
        if is_reserved(name) || self.model.relation(name).is_some() {
            return Ok(false);
        }

        match self.values.get_mut(name) {
            Some(slot) => {
                *slot = value.into();
                self.unset.shift_remove(name);
                Ok(true)
            }
            None => Err(Error::unknown_field(&self.model.name, name)),
        }
    }

    pub fn has(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Insert the instance, or write every field if it was already created.
    pub async fn flush(&mut self) -> Result<()> {
        self.flush_impl(None).await
    }

    /// Like [`flush`](Self::flush), but an update only writes `fields`.
    pub async fn flush_fields(&mut self, fields: &[&str]) -> Result<()> {
        self.flush_impl(Some(fields)).await
    }

    async fn flush_impl(&mut self, fields: Option<&[&str]>) -> Result<()> {
        let updated_at = self.model.options.timestamps.updated.then(now_millis);
        if let Some(updated_at) = &updated_at {
            self.values.insert(UPDATED_AT.to_string(), updated_at.clone());
        }

        if !self.created {
            return self.insert().await;
        }

        let row_id = self.require_persisted()?.clone();

        let assignments = match fields {
            None => self.values.clone(),
            Some(fields) => {
                let mut assignments = Record::with_capacity(fields.len() + 1);
                for &name in fields {
                    let value = self
                        .values
                        .get(name)
                        .ok_or_else(|| Error::unknown_field(&self.model.name, name))?;
                    assignments.insert(name.to_string(), value.clone());
                }
                if let Some(updated_at) = updated_at {
                    assignments.insert(UPDATED_AT.to_string(), updated_at);
                }
                assignments
            }
        };

        let update = Update::new(&self.model.name)
            .set_all(assignments)
            .filter(pk_criteria(&self.model, &row_id));
        self.db.update(update).await?;

        // The key itself may have been reassigned
        if let Some(pk) = self.model.primary_key_field() {
            if let Some(value) = self.values.get(&pk.name).filter(|value| !value.is_null()) {
                self.row_id = value.clone();
            }
        }

        tracing::debug!(model = %self.model.name, row_id = ?self.row_id, "instance updated");
        Ok(())
    }

    async fn insert(&mut self) -> Result<()> {
        let values = self
            .values
            .iter()
            .filter(|(name, _)| !self.unset.contains(*name))
            .map(|(name, value)| (name.clone(), value.clone()))
            .collect();
        let outcome = self.db.insert(&self.model.name, values).await?;

        let row_id = self
            .model
            .primary_key_field()
            .and_then(|pk| self.values.get(&pk.name))
            .filter(|value| !value.is_null())
            .cloned()
            .unwrap_or(Value::I64(outcome.last_insert_row_id));

        self.set_row_id(row_id);
        self.created = true;
        self.apply_column_defaults()?;

        tracing::debug!(model = %self.model.name, row_id = ?self.row_id, "instance inserted");
        Ok(())
    }

    /// Unset fields now hold whatever default the column stored.
    fn apply_column_defaults(&mut self) -> Result<()> {
        for name in std::mem::take(&mut self.unset) {
            let Some(field) = self.model.field(&name) else {
                continue;
            };

            if let Some(default) = &field.spec.default {
                let stored = field.convert_to_database_form(default.clone())?;
                self.values.insert(name, field.convert_from_database_form(stored));
            }
        }

        Ok(())
    }

    /// Delete the backing row. The instance can be flushed again afterwards,
    /// inserting a new row.
    pub async fn remove(&mut self) -> Result<()> {
        let row_id = self.require_persisted()?.clone();

        let remove = Remove::new(&self.model.name).filter(pk_criteria(&self.model, &row_id));
        self.db.remove(remove).await?;

        self.created = false;
        self.set_row_id(Value::Null);

        tracing::debug!(model = %self.model.name, row_id = ?row_id, "instance removed");
        Ok(())
    }

    /// Accessor for the relation `name`, whatever its shape.
    pub fn relation(&mut self, name: &str) -> Result<RelationAccessor<'_>> {
        match self.expect_relation(name)?.clone() {
            Relation::Single(relation) => {
                Ok(RelationAccessor::Single(SingleRelation::new(self, relation)))
            }
            Relation::Many(relation) => Ok(RelationAccessor::Many(ManyRelation::new(self, relation))),
            Relation::Multi(relation) => {
                Ok(RelationAccessor::Multi(MultiRelation::new(self, relation)))
            }
        }
    }

    /// Accessor for a one-to-one or many-to-one relation.
    pub fn single(&mut self, name: &str) -> Result<SingleRelation<'_>> {
        match self.expect_relation(name)?.clone() {
            Relation::Single(relation) => Ok(SingleRelation::new(self, relation)),
            other => Err(self.wrong_shape(&other, "single")),
        }
    }

    /// Accessor for the owning side of a one-to-many relation.
    pub fn many(&self, name: &str) -> Result<ManyRelation<'_>> {
        match self.expect_relation(name)? {
            Relation::Many(relation) => Ok(ManyRelation::new(self, relation.clone())),
            other => Err(self.wrong_shape(other, "one-to-many")),
        }
    }

    /// Accessor for a many-to-many relation.
    pub fn multi(&self, name: &str) -> Result<MultiRelation<'_>> {
        match self.expect_relation(name)? {
            Relation::Multi(relation) => Ok(MultiRelation::new(self, relation.clone())),
            other => Err(self.wrong_shape(other, "many-to-many")),
        }
    }

    fn expect_relation(&self, name: &str) -> Result<&Relation> {
        self.model
            .relation(name)
            .ok_or_else(|| Error::unknown_relation(&self.model.name, name))
    }

    fn wrong_shape(&self, relation: &Relation, expected: &str) -> Error {
        err!(
            "relation `{}` on model `{}` is {:?}, not {expected}",
            relation.name(),
            self.model.name,
            relation.ty()
        )
    }

    /// The row id, provided the instance has been flushed.
    pub(crate) fn require_persisted(&self) -> Result<&Value> {
        if !self.created {
            return Err(Error::instance_invalid(
                &self.model.name,
                "instance has not been flushed",
            ));
        }

        if self.row_id.is_null() {
            return Err(Error::instance_invalid(&self.model.name, "instance has no row id"));
        }

        Ok(&self.row_id)
    }
}

fn is_reserved(name: &str) -> bool {
    name.starts_with(OPERATOR_MARKER)
}
