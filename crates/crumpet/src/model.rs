use crate::{Db, FindOptions, FindResult, Instance};

use crumpet_core::{
    schema::{Model, IMPLICIT_ROW_ID},
    stmt::{Record, Row, Value},
    Error, Result,
};
use crumpet_sql::{column_alias, Remove, Update};
use indexmap::IndexSet;
use serde_json::{json, Value as Json};

use std::sync::Arc;

/// Entry point for building and querying the instances of one model.
#[derive(Debug, Clone)]
pub struct ModelHandle {
    db: Db,
    model: Arc<Model>,
}

impl ModelHandle {
    pub(crate) fn new(db: Db, model: Arc<Model>) -> ModelHandle {
        ModelHandle { db, model }
    }

    pub fn db(&self) -> &Db {
        &self.db
    }

    pub fn model(&self) -> &Model {
        &self.model
    }

    pub fn name(&self) -> &str {
        &self.model.name
    }

    /// New, unflushed instance. Fields missing from `template` are generated
    /// or left null. Nothing is validated until the instance is flushed.
    pub fn build(&self, template: Record) -> Instance {
        let mut values = Record::with_capacity(self.model.fields.len());
        let mut unset = IndexSet::new();

        for field in self.model.fields.values() {
            let value = field
                .initial_value(template.get(&field.name))
                .unwrap_or_else(|| {
                    unset.insert(field.name.clone());
                    Value::Null
                });
            values.insert(field.name.clone(), value);
        }

        Instance::new(self.db.clone(), self.model.clone(), values).with_unset(unset)
    }

    /// Decode a result row into a created instance.
    ///
    /// With a prefix, columns are read from `<prefix>__<field>` aliases.
    pub fn build_from_database_result(&self, row: &Row, prefix: Option<&str>) -> Result<Instance> {
        let mut values = Record::with_capacity(self.model.fields.len());

        for field in self.model.fields.values() {
            let column = match prefix {
                Some(prefix) => column_alias(prefix, &field.name),
                None => field.name.clone(),
            };

            let value = row
                .get(&column)
                .ok_or_else(|| Error::missing_column(&self.model.name, &column))?;

            values.insert(
                field.name.clone(),
                field.convert_from_database_form(value.clone()),
            );
        }

        let row_id = match self.model.primary_key_field() {
            Some(pk) => values.get(&pk.name).cloned().unwrap_or_default(),
            None => self.implicit_row_id(row, prefix)?,
        };

        let mut instance = Instance::new(self.db.clone(), self.model.clone(), values);
        instance.mark_created(row_id);
        Ok(instance)
    }

    fn implicit_row_id(&self, row: &Row, prefix: Option<&str>) -> Result<Value> {
        let prefixed = prefix.map(|prefix| column_alias(prefix, IMPLICIT_ROW_ID));

        let value = prefixed
            .as_ref()
            .and_then(|column| row.get(column))
            .or_else(|| row.get(IMPLICIT_ROW_ID))
            .ok_or_else(|| Error::missing_column(&self.model.name, IMPLICIT_ROW_ID))?;

        match value {
            Value::I64(_) => Ok(value.clone()),
            other => Err(Error::instance_invalid(
                &self.model.name,
                format!("row id must be numeric, found {other:?}"),
            )),
        }
    }

    /// Returns `false` when every column a joined companion would be decoded
    /// from is null, i.e. the left join found no row.
    pub(crate) fn row_is_present(&self, row: &Row, prefix: &str) -> bool {
        let key = column_alias(prefix, self.model.primary_key_name());
        row.get(&key).is_some_and(|value| !value.is_null())
    }

    /// Build an instance and insert it.
    pub async fn create(&self, template: Record) -> Result<Instance> {
        let mut instance = self.build(template);
        instance.flush().await?;
        Ok(instance)
    }

    pub async fn find(&self, options: impl Into<FindOptions>) -> Result<FindResult> {
        self.db.find(&self.model.name, options.into()).await
    }

    /// First match, if any.
    pub async fn find_one(&self, options: impl Into<FindOptions>) -> Result<Option<Instance>> {
        let mut options = options.into();
        options.limit = Some(1);
        options.count = false;

        let result = self.find(options).await?;
        Ok(result.items.into_iter().next())
    }

    pub async fn find_by_pk(&self, pk: impl Into<Value>) -> Result<Option<Instance>> {
        self.find_one(pk_criteria(&self.model, &pk.into())).await
    }

    /// Like [`find_one`](Self::find_one), failing when nothing matches.
    pub async fn find_one_checked(&self, options: impl Into<FindOptions>) -> Result<Instance> {
        let options = options.into();
        let criteria = options.filter.clone();

        self.find_one(options).await?.ok_or_else(|| {
            Error::record_not_found(format!("model={}; criteria={criteria}", self.model.name))
        })
    }

    pub async fn find_by_pk_checked(&self, pk: impl Into<Value>) -> Result<Instance> {
        let pk = pk.into();

        self.find_by_pk(pk.clone()).await?.ok_or_else(|| {
            Error::record_not_found(format!("model={}; pk={pk:?}", self.model.name))
        })
    }

    /// Assign `set` on every row matching `criteria`, returning the number of
    /// changed rows.
    pub async fn update(&self, set: Record, criteria: Json) -> Result<u64> {
        let update = Update::new(&self.model.name).set_all(set).filter(criteria);
        self.db.update(update).await
    }

    /// Delete every row matching `criteria`. Criteria matching everything are
    /// rejected; use [`remove_all`](Self::remove_all) instead.
    pub async fn remove(&self, criteria: Json) -> Result<u64> {
        self.db
            .remove(Remove::new(&self.model.name).filter(criteria))
            .await
    }

    pub async fn remove_all(&self) -> Result<u64> {
        self.db.remove_all(&self.model.name).await
    }

    pub async fn count(&self, criteria: Json) -> Result<u64> {
        self.db.count(&self.model.name, criteria).await
    }
}

/// `{<pk>: pk}`
pub(crate) fn pk_criteria(model: &Model, pk: &Value) -> Json {
    let mut criteria = serde_json::Map::new();
    criteria.insert(model.primary_key_name().to_string(), Json::from(pk));
    Json::Object(criteria)
}

/// `{"$and": criteria, column: value}`
pub(crate) fn scoped(criteria: Json, column: &str, value: &Value) -> Json {
    let mut scoped = serde_json::Map::new();
    let is_empty = match &criteria {
        Json::Null => true,
        Json::Object(criteria) => criteria.is_empty(),
        _ => false,
    };
    if !is_empty {
        scoped.insert("$and".to_string(), criteria);
    }
    scoped.insert(column.to_string(), Json::from(value));
    Json::Object(scoped)
}

/// `{"$in": keys}` over database-ready keys
pub(crate) fn key_set(keys: &[Value]) -> Json {
    json!({ "$in": keys.iter().map(Json::from).collect::<Vec<_>>() })
}
