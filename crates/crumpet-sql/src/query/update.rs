use super::{key_filter, where_clause};
use crate::{delim::Comma, where_tree};

use crumpet_core::{
    driver::Statement,
    stmt::{Params, Record, Value},
    Result, Schema,
};
use serde_json::Value as Json;

/// `UPDATE` of the rows matching some criteria.
///
/// When the criteria reference related models the rows are selected through
/// a primary key subquery, as SQLite cannot join in `UPDATE`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Update {
    pub model: String,
    pub assignments: Record,
    pub criteria: Json,
}

impl Update {
    pub fn new(model: impl Into<String>) -> Update {
        Update {
            model: model.into(),
            ..Update::default()
        }
    }

    pub fn set(mut self, field: impl Into<String>, value: impl Into<Value>) -> Update {
        self.assignments.insert(field.into(), value.into());
        self
    }

    pub fn set_all(mut self, assignments: Record) -> Update {
        self.assignments.extend(assignments);
        self
    }

    pub fn filter(mut self, criteria: Json) -> Update {
        self.criteria = criteria;
        self
    }

    /// Returns `None` when there is nothing to assign.
    pub fn build(&self, schema: &Schema) -> Result<Option<Statement>> {
        if self.assignments.is_empty() {
            return Ok(None);
        }

        let model = schema.model(&self.model)?;
        let mut params = Params::new();

        let mut assignments = Vec::with_capacity(self.assignments.len());
        for (name, value) in &self.assignments {
            let value = model
                .expect_field(name)?
                .convert_to_database_form(value.clone())?;
            assignments.push(format!("{name} = {}", params.push(value)));
        }

        let compiled = where_tree::compile(schema, model, &self.criteria, &mut params)?;
        let filter = key_filter(model, &compiled);

        let sql = format!(
            "UPDATE {} SET {}{}",
            model.name,
            Comma(&assignments),
            where_clause(&filter)
        );

        Ok(Some(Statement::new(sql, params)))
    }
}
