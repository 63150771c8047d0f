use super::{count::count_sql, limit_clause, model_columns, order_clause};
use crate::{delim::Comma, CompiledWhere, Compiler};

use crumpet_core::{
    driver::Statement, schema::SortEntry, stmt::Params, Error, Result, Schema,
};
use serde_json::Value as Json;

/// `SELECT` of model rows, optionally with joined single-relation companions
/// and a parallel count query.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Select {
    pub model: String,
    pub criteria: Json,
    pub sort: Vec<SortEntry>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,

    /// Single relations whose companion columns are selected alongside
    pub join: Vec<String>,

    /// Also build a count query ignoring `limit` and `offset`
    pub count: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompiledSelect {
    pub statement: Statement,
    pub count: Option<Statement>,

    /// Column prefix of the primary rows
    pub prefix: String,

    /// Companions selected alongside, in join order
    pub joined: Vec<JoinedRelation>,
}

/// A companion model whose columns are selected under the relation's alias.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JoinedRelation {
    /// Relation name, also the column prefix
    pub name: String,
    pub model: String,
}

impl Select {
    pub fn new(model: impl Into<String>) -> Select {
        Select {
            model: model.into(),
            ..Select::default()
        }
    }

    pub fn filter(mut self, criteria: Json) -> Select {
        self.criteria = criteria;
        self
    }

    pub fn sort(mut self, entry: SortEntry) -> Select {
        self.sort.push(entry);
        self
    }

    pub fn limit(mut self, limit: u64) -> Select {
        self.limit = Some(limit);
        self
    }

    pub fn offset(mut self, offset: u64) -> Select {
        self.offset = Some(offset);
        self
    }

    pub fn join(mut self, relation: impl Into<String>) -> Select {
        self.join.push(relation.into());
        self
    }

    pub fn with_count(mut self) -> Select {
        self.count = true;
        self
    }

    pub fn build(&self, schema: &Schema) -> Result<CompiledSelect> {
        let model = schema.model(&self.model)?;

        let mut params = Params::new();
        let (compiled, joined) = self.compile(schema, &mut params)?;

        let mut columns = model_columns(model, &model.name);
        for relation in &joined {
            columns.extend(model_columns(schema.model(&relation.model)?, &relation.name));
        }

        let mut sql = format!(
            "SELECT {} FROM {}{}{}",
            Comma(&columns),
            model.name,
            compiled.join_clause(),
            compiled.where_clause(),
        );

        if let Some(group_by) = &compiled.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }

        sql.push_str(&order_clause(model, &self.sort)?);
        sql.push_str(&limit_clause(self.limit, self.offset));

        let count = if self.count {
            let mut params = Params::new();
            let (compiled, _) = self.compile(schema, &mut params)?;
            Some(Statement::new(count_sql(model, &compiled, ""), params))
        } else {
            None
        };

        Ok(CompiledSelect {
            statement: Statement::new(sql, params),
            count,
            prefix: model.name.clone(),
            joined,
        })
    }

    fn compile(
        &self,
        schema: &Schema,
        params: &mut Params,
    ) -> Result<(CompiledWhere, Vec<JoinedRelation>)> {
        let model = schema.model(&self.model)?;
        let mut compiler = Compiler::new(schema, model, params);
        let tree = compiler.compile(&self.criteria)?;

        let mut joined = Vec::with_capacity(self.join.len());
        for name in &self.join {
            let relation = compiler.join_relation(name)?;

            if relation.as_single().is_none() {
                return Err(Error::invalid_criteria(format!(
                    "relation `{name}` of `{}` does not resolve to a single row and cannot be joined",
                    model.name
                )));
            }

            if joined.iter().all(|joined: &JoinedRelation| joined.name != *name) {
                joined.push(JoinedRelation {
                    name: name.clone(),
                    model: relation.companion().to_string(),
                });
            }
        }

        Ok((compiler.finish(tree), joined))
    }
}
