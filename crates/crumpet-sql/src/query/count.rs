use super::COUNT_ALIAS;
use crate::{where_tree, CompiledWhere};

use crumpet_core::{driver::Statement, schema::Model, stmt::Params, Result, Schema};
use serde_json::Value as Json;

/// `SELECT COUNT(..)` over the rows of a model matching some criteria.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Count {
    pub model: String,
    pub criteria: Json,
}

impl Count {
    pub fn new(model: impl Into<String>) -> Count {
        Count {
            model: model.into(),
            criteria: Json::Null,
        }
    }

    pub fn filter(mut self, criteria: Json) -> Count {
        self.criteria = criteria;
        self
    }

    pub fn build(&self, schema: &Schema) -> Result<Statement> {
        let model = schema.model(&self.model)?;
        let mut params = Params::new();
        let compiled = where_tree::compile(schema, model, &self.criteria, &mut params)?;

        Ok(Statement::new(count_sql(model, &compiled, ""), params))
    }
}

/// Counts distinct owner keys when the joins can multiply rows, so the total
/// matches the grouped item list. `extra_joins` is inserted before the
/// criteria joins.
pub(super) fn count_sql(model: &Model, compiled: &CompiledWhere, extra_joins: &str) -> String {
    let expr = match compiled.group_by {
        Some(_) => format!("COUNT(DISTINCT {}.{})", model.name, model.primary_key_name()),
        None => "COUNT(*)".to_string(),
    };

    format!(
        "SELECT {expr} AS {COUNT_ALIAS} FROM {}{extra_joins}{}{}",
        model.name,
        compiled.join_clause(),
        compiled.where_clause(),
    )
}
