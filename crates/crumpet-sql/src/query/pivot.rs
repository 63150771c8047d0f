use super::{count::count_sql, limit_clause, model_columns, order_clause, CompiledSelect, JoinedRelation};
use crate::{delim::Comma, where_tree, WhereNode};

use crumpet_core::{
    driver::Statement,
    schema::{relation::Multi, SortEntry},
    stmt::{Params, Value},
    Error, Result, Schema,
};
use serde_json::Value as Json;

/// Pivot rows of one owner joined with their companion rows.
///
/// Criteria, sort and paging apply to the pivot model. The companion is
/// inner-joined and aliased by the relation name.
#[derive(Debug, Clone)]
pub struct PivotSelect {
    pub relation: Multi,

    /// Row id of the owner whose pairs are selected
    pub owner: Value,

    pub criteria: Json,
    pub sort: Vec<SortEntry>,
    pub limit: Option<u64>,
    pub offset: Option<u64>,
    pub count: bool,
}

impl PivotSelect {
    pub fn new(relation: Multi, owner: impl Into<Value>) -> PivotSelect {
        PivotSelect {
            relation,
            owner: owner.into(),
            criteria: Json::Null,
            sort: vec![],
            limit: None,
            offset: None,
            count: false,
        }
    }

    pub fn build(&self, schema: &Schema) -> Result<CompiledSelect> {
        let rel = &self.relation;
        let pivot = schema.model(&rel.pivot)?;
        let companion = schema.model(&rel.companion)?;

        if constrains(&self.criteria, &rel.my_foreign_key) {
            return Err(Error::invalid_criteria(format!(
                "criteria of `{}` may not constrain the owner key `{}`",
                rel.name, rel.my_foreign_key
            )));
        }

        let inner_join = format!(
            " INNER JOIN {} AS {} ON {}",
            companion.name,
            rel.name,
            rel.join_condition(schema, &pivot.name, &companion.name, &rel.name)?
        );

        let mut params = Params::new();
        let (compiled, filter) = self.compile(schema, &mut params)?;

        let mut columns = model_columns(pivot, &pivot.name);
        columns.extend(model_columns(companion, &rel.name));

        let mut sql = format!(
            "SELECT {} FROM {}{inner_join}{}{}",
            Comma(&columns),
            pivot.name,
            compiled.join_clause(),
            super::where_clause(&filter),
        );

        if let Some(group_by) = &compiled.group_by {
            sql.push_str(" GROUP BY ");
            sql.push_str(group_by);
        }

        sql.push_str(&order_clause(pivot, &self.sort)?);
        sql.push_str(&limit_clause(self.limit, self.offset));

        let count = if self.count {
            let mut params = Params::new();
            let (mut compiled, filter) = self.compile(schema, &mut params)?;
            compiled.tree = filter;
            Some(Statement::new(count_sql(pivot, &compiled, &inner_join), params))
        } else {
            None
        };

        Ok(CompiledSelect {
            statement: Statement::new(sql, params),
            count,
            prefix: pivot.name.clone(),
            joined: vec![JoinedRelation {
                name: rel.name.clone(),
                model: companion.name.clone(),
            }],
        })
    }

    /// Compile the criteria, returning them along with the full filter that
    /// also pins the owner key.
    fn compile(
        &self,
        schema: &Schema,
        params: &mut Params,
    ) -> Result<(where_tree::CompiledWhere, WhereNode)> {
        let pivot = schema.model(&self.relation.pivot)?;

        let owner = WhereNode::Leaf(format!(
            "{}.{} = {}",
            pivot.name,
            self.relation.my_foreign_key,
            params.push(self.owner.clone())
        ));
        let compiled = where_tree::compile(schema, pivot, &self.criteria, params)?;
        let filter = WhereNode::And(vec![owner, compiled.tree.clone()]);

        Ok((compiled, filter))
    }
}

/// Whether `criteria` names `key` as a field, at any depth of `$and`/`$or`
/// groups.
fn constrains(criteria: &Json, key: &str) -> bool {
    match criteria {
        Json::Object(map) => map.iter().any(|(name, value)| match name.as_str() {
            "$and" | "$or" => constrains(value, key),
            name => name == key,
        }),
        Json::Array(groups) => groups.iter().any(|group| constrains(group, key)),
        _ => false,
    }
}
