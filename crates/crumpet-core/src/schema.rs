mod def;
pub use def::{ManyToManyOptions, ModelDef, RelationOptions};

mod field;
pub use field::{Converter, Field, FieldSpec, FieldType, Generator, Validator};

mod model;
pub use model::{now_millis, ModelOptions, Model, SortEntry, Timestamps};

mod name;
pub use name::{is_valid_name, validate_name};

pub mod relation;
pub use relation::{Relation, RelationType};

use crate::{Error, Result};

use indexmap::IndexMap;

/// Name of the implicit row identifier column used by models that declare
/// no primary key.
pub const IMPLICIT_ROW_ID: &str = "rowid";

/// Separates a relation name from a field of the related model in criteria
/// keys, e.g. `bars$name`.
pub const RELATION_FIELD_SEPARATOR: char = '$';

/// Prefix of criteria operators such as `$eq` or `$and`.
pub const OPERATOR_MARKER: char = '$';

/// Field added by [`Timestamps::created`].
pub const CREATED_AT: &str = "created_at";

/// Field added by [`Timestamps::updated`].
pub const UPDATED_AT: &str = "updated_at";

/// Registry of every model known to a database, in definition order.
#[derive(Debug, Default, Clone)]
pub struct Schema {
    models: IndexMap<String, Model>,
}

impl Schema {
    pub fn new() -> Schema {
        Schema::default()
    }

    /// Declare a new model. Fails if the name is not a valid identifier or a
    /// model with that name already exists.
    pub fn define_model(&mut self, name: &str, options: ModelOptions) -> Result<ModelDef<'_>> {
        if self.models.contains_key(name) {
            return Err(Error::duplicate_model(name));
        }

        let model = Model::new(name, options)?;
        self.models.insert(name.to_string(), model);

        Ok(ModelDef::new(self, name))
    }

    /// Returns a definition handle for an already declared model.
    pub fn model_mut(&mut self, name: &str) -> Result<ModelDef<'_>> {
        if !self.models.contains_key(name) {
            return Err(Error::unknown_model(name));
        }

        Ok(ModelDef::new(self, name))
    }

    pub fn model(&self, name: &str) -> Result<&Model> {
        self.models
            .get(name)
            .ok_or_else(|| Error::unknown_model(name))
    }

    pub fn get_model(&self, name: &str) -> Option<&Model> {
        self.models.get(name)
    }

    pub fn models(&self) -> impl ExactSizeIterator<Item = &Model> + '_ {
        self.models.values()
    }

    pub(crate) fn model_entry(&mut self, name: &str) -> Result<&mut Model> {
        self.models
            .get_mut(name)
            .ok_or_else(|| Error::unknown_model(name))
    }
}
