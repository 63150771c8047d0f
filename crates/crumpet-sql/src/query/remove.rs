use super::{key_filter, where_clause, KeySelect};
use crate::{where_tree, WhereNode};

use crumpet_core::{driver::Statement, stmt::Params, Error, Result, Schema};
use serde_json::Value as Json;

/// `DELETE` of the rows matching some criteria.
///
/// Criteria that compile to no condition are rejected; deleting every row is
/// only possible through [`Remove::all`].
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Remove {
    pub model: String,
    pub criteria: Json,

    /// Extra `<column> IN (<key select>)` conditions ANDed with the criteria
    pub key_in: Vec<(String, KeySelect)>,

    pub all: bool,
}

impl Remove {
    pub fn new(model: impl Into<String>) -> Remove {
        Remove {
            model: model.into(),
            ..Remove::default()
        }
    }

    /// Remove every row of `model`.
    pub fn all(model: impl Into<String>) -> Remove {
        Remove {
            all: true,
            ..Remove::new(model)
        }
    }

    pub fn filter(mut self, criteria: Json) -> Remove {
        self.criteria = criteria;
        self
    }

    /// Restrict removal to rows whose `column` is one of the keys selected by
    /// `select`.
    pub fn key_in(mut self, column: impl Into<String>, select: KeySelect) -> Remove {
        self.key_in.push((column.into(), select));
        self
    }

    pub fn build(&self, schema: &Schema) -> Result<Statement> {
        let model = schema.model(&self.model)?;

        if self.all {
            return Ok(Statement::new(
                format!("DELETE FROM {}", model.name),
                Params::new(),
            ));
        }

        let mut params = Params::new();
        let compiled = where_tree::compile(schema, model, &self.criteria, &mut params)?;

        if compiled.is_empty() && self.key_in.is_empty() {
            return Err(Error::empty_criteria("remove"));
        }

        let mut conditions = vec![key_filter(model, &compiled)];
        for (column, select) in &self.key_in {
            model.expect_field(column)?;
            conditions.push(WhereNode::Leaf(format!(
                "{}.{column} IN ({})",
                model.name,
                select.write(schema, &mut params)?
            )));
        }

        let sql = format!(
            "DELETE FROM {}{}",
            model.name,
            where_clause(&WhereNode::And(conditions))
        );

        Ok(Statement::new(sql, params))
    }
}
