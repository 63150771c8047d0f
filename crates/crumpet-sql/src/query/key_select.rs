use crate::{where_tree, CompiledWhere};

use crumpet_core::{schema::Model, stmt::Params, Result, Schema};
use serde_json::Value as Json;

/// Primary keys of the rows of `model` matching `criteria`, rendered as the
/// operand of an `IN (..)` condition.
#[derive(Debug, Clone, PartialEq)]
pub struct KeySelect {
    pub model: String,
    pub criteria: Json,
}

impl KeySelect {
    pub fn new(model: impl Into<String>, criteria: Json) -> KeySelect {
        KeySelect {
            model: model.into(),
            criteria,
        }
    }

    pub(crate) fn write(&self, schema: &Schema, params: &mut Params) -> Result<String> {
        let model = schema.model(&self.model)?;
        let compiled = where_tree::compile(schema, model, &self.criteria, params)?;
        Ok(key_subquery(model, &compiled))
    }
}

pub(super) fn key_subquery(model: &Model, compiled: &CompiledWhere) -> String {
    format!(
        "SELECT {table}.{pk} FROM {table}{joins}{filter}",
        table = model.name,
        pk = model.primary_key_name(),
        joins = compiled.join_clause(),
        filter = compiled.where_clause(),
    )
}
