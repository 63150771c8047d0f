use super::{
    validate_name, Field, FieldSpec, Relation, CREATED_AT, IMPLICIT_ROW_ID, UPDATED_AT,
};
use crate::{stmt::Value, Error, Result};

use indexmap::IndexMap;

/// A declared record type, mapped to the table of the same name.
#[derive(Debug, Clone)]
pub struct Model {
    /// Name of the model, also used as the table name
    pub name: String,

    /// Fields in definition order. Column order follows this order.
    pub fields: IndexMap<String, Field>,

    /// Relation edges owned by this model, keyed by relation name
    pub relations: IndexMap<String, Relation>,

    /// Raw table constraints appended after the column list
    pub constraints: Vec<String>,

    pub options: ModelOptions,
}

#[derive(Debug, Default, Clone)]
pub struct ModelOptions {
    pub timestamps: Timestamps,

    /// Sort applied after any explicit sort entries that do not mention the
    /// same field.
    pub default_sort: Option<SortEntry>,
}

/// Automatic `created_at` / `updated_at` fields, stored as Unix milliseconds.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct Timestamps {
    pub created: bool,
    pub updated: bool,
}

/// One `ORDER BY` entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SortEntry {
    pub field: String,
    pub descending: bool,

    /// When `false` the entry is rendered with `COLLATE NOCASE`.
    pub case_sensitive: bool,
}

impl Model {
    pub(crate) fn new(name: &str, options: ModelOptions) -> Result<Model> {
        validate_name(name)?;

        let mut model = Model {
            name: name.to_string(),
            fields: IndexMap::new(),
            relations: IndexMap::new(),
            constraints: vec![],
            options,
        };

        if model.options.timestamps.created {
            model.insert_field(
                CREATED_AT,
                FieldSpec::integer().generate(|_| now_millis()),
            )?;
        }

        if model.options.timestamps.updated {
            model.insert_field(
                UPDATED_AT,
                FieldSpec::integer().generate(|_| now_millis()),
            )?;
        }

        Ok(model)
    }

    /// Name of the primary key column: the first field flagged as primary key,
    /// or the implicit row id.
    pub fn primary_key_name(&self) -> &str {
        match self.primary_key_field() {
            Some(field) => &field.name,
            None => IMPLICIT_ROW_ID,
        }
    }

    pub fn primary_key_field(&self) -> Option<&Field> {
        self.fields.values().find(|field| field.spec.primary_key)
    }

    pub fn has_declared_primary_key(&self) -> bool {
        self.primary_key_field().is_some()
    }

    pub fn field(&self, name: &str) -> Option<&Field> {
        self.fields.get(name)
    }

    /// Look up a field, failing with an unknown field error.
    pub fn expect_field(&self, name: &str) -> Result<&Field> {
        self.field(name)
            .ok_or_else(|| Error::unknown_field(&self.name, name))
    }

    pub fn relation(&self, name: &str) -> Option<&Relation> {
        self.relations.get(name)
    }

    /// Returns `true` if `name` is taken by a field or a relation.
    pub fn has_member(&self, name: &str) -> bool {
        self.fields.contains_key(name) || self.relations.contains_key(name)
    }

    pub(crate) fn insert_field(&mut self, name: &str, spec: FieldSpec) -> Result<()> {
        validate_name(name)?;

        if self.fields.contains_key(name) {
            return Err(Error::duplicate_field(&self.name, name));
        }

        if self.relations.contains_key(name) {
            return Err(Error::reserved_name(&self.name, name));
        }

        self.fields.insert(name.to_string(), Field::new(name, spec));
        Ok(())
    }

    pub(crate) fn insert_relation(&mut self, relation: Relation) -> Result<()> {
        if self.has_member(relation.name()) {
            return Err(Error::reserved_name(&self.name, relation.name()));
        }

        self.relations
            .insert(relation.name().to_string(), relation);
        Ok(())
    }
}

impl ModelOptions {
    pub fn timestamps(mut self, created: bool, updated: bool) -> ModelOptions {
        self.timestamps = Timestamps { created, updated };
        self
    }

    pub fn default_sort(mut self, sort: SortEntry) -> ModelOptions {
        self.default_sort = Some(sort);
        self
    }
}

impl SortEntry {
    /// Ascending, case-insensitive sort on `field`.
    pub fn asc(field: impl Into<String>) -> SortEntry {
        SortEntry {
            field: field.into(),
            descending: false,
            case_sensitive: false,
        }
    }

    /// Descending, case-insensitive sort on `field`.
    pub fn desc(field: impl Into<String>) -> SortEntry {
        SortEntry {
            descending: true,
            ..SortEntry::asc(field)
        }
    }

    pub fn case_sensitive(mut self) -> SortEntry {
        self.case_sensitive = true;
        self
    }
}

/// Current time as Unix milliseconds, the representation of timestamp fields.
pub fn now_millis() -> Value {
    Value::I64(chrono::Utc::now().timestamp_millis())
}
