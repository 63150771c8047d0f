use crate::delim::Comma;

use crumpet_core::{
    schema::{Field, Model, Relation, Schema, IMPLICIT_ROW_ID, OPERATOR_MARKER, RELATION_FIELD_SEPARATOR},
    stmt::{Params, Value},
    Error, Result,
};
use serde_json::{Map, Value as Json};
use std::fmt;

/// Compiled boolean expression over SQL fragments.
#[derive(Debug, Clone, PartialEq)]
pub enum WhereNode {
    /// A single SQL condition, e.g. `foo.name = :uniq_1`
    Leaf(String),

    /// All children must hold
    And(Vec<WhereNode>),

    /// At least one child must hold
    Or(Vec<WhereNode>),
}

/// A `LEFT JOIN` added while resolving `relation$field` references.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Join {
    pub table: String,

    /// Unique within one statement. Joins are deduplicated by alias.
    pub alias: String,

    pub condition: String,
}

/// Output of compiling a criteria object against a model.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledWhere {
    pub tree: WhereNode,

    /// Joins required by cross-relation field references, in first-use order
    pub joins: Vec<Join>,

    /// `<table>.<pk>` when a joined relation can multiply owner rows
    pub group_by: Option<String>,
}

/// Compiles criteria objects into [`WhereNode`] trees.
///
/// Values are bound into the borrowed [`Params`], so several compilations
/// feeding one statement share a placeholder sequence.
#[derive(Debug)]
pub struct Compiler<'a> {
    schema: &'a Schema,
    model: &'a Model,
    params: &'a mut Params,
    joins: Vec<Join>,
    group_by: Option<String>,
}

/// A resolved field reference.
struct Column<'a> {
    /// Qualified column, e.g. `bars.name`
    sql: String,

    /// `None` for the implicit row id, which is compared unconverted
    field: Option<&'a Field>,
}

/// Compile `criteria` against `model` in one pass.
pub fn compile(
    schema: &Schema,
    model: &Model,
    criteria: &Json,
    params: &mut Params,
) -> Result<CompiledWhere> {
    let mut compiler = Compiler::new(schema, model, params);
    let tree = compiler.compile(criteria)?;
    Ok(compiler.finish(tree))
}

impl WhereNode {
    /// Returns `true` if the node renders to no condition at all.
    pub fn is_empty(&self) -> bool {
        match self {
            WhereNode::Leaf(_) => false,
            WhereNode::And(children) | WhereNode::Or(children) => {
                children.iter().all(WhereNode::is_empty)
            }
        }
    }

    /// Render the condition without the `WHERE` keyword.
    pub fn to_sql(&self) -> Option<String> {
        self.render(false)
    }

    fn render(&self, nested: bool) -> Option<String> {
        if self.is_empty() {
            return None;
        }

        let (children, delim, empty) = match self {
            WhereNode::Leaf(sql) => return Some(sql.clone()),
            WhereNode::And(children) => (children, " AND ", None),
            // An empty group matches every row, and so does the whole `OR`
            WhereNode::Or(children) => (children, " OR ", Some("1")),
        };

        let mut parts: Vec<_> = children
            .iter()
            .filter_map(|child| child.render(true).or_else(|| empty.map(str::to_string)))
            .collect();

        match parts.len() {
            0 => None,
            1 => parts.pop(),
            _ if nested => Some(format!("({})", parts.join(delim))),
            _ => Some(parts.join(delim)),
        }
    }
}

impl fmt::Display for WhereNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.to_sql() {
            Some(sql) => f.write_str(&sql),
            None => Ok(()),
        }
    }
}

impl fmt::Display for Join {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "LEFT JOIN {} AS {} ON {}",
            self.table, self.alias, self.condition
        )
    }
}

impl CompiledWhere {
    pub fn is_empty(&self) -> bool {
        self.tree.is_empty()
    }

    pub fn has_joins(&self) -> bool {
        !self.joins.is_empty()
    }

    /// ` WHERE <tree>`, or an empty string when there is no condition.
    pub fn where_clause(&self) -> String {
        match self.tree.to_sql() {
            Some(sql) => format!(" WHERE {sql}"),
            None => String::new(),
        }
    }

    /// Every join, each preceded by a space.
    pub fn join_clause(&self) -> String {
        self.joins.iter().map(|join| format!(" {join}")).collect()
    }
}

impl<'a> Compiler<'a> {
    pub fn new(schema: &'a Schema, model: &'a Model, params: &'a mut Params) -> Compiler<'a> {
        Compiler {
            schema,
            model,
            params,
            joins: vec![],
            group_by: None,
        }
    }

    /// Compile a criteria object. `null` compiles to an empty tree; any other
    /// non-object is rejected.
    pub fn compile(&mut self, criteria: &Json) -> Result<WhereNode> {
        match criteria {
            Json::Null => Ok(WhereNode::And(vec![])),
            Json::Object(criteria) => Ok(WhereNode::And(self.logical(criteria)?)),
            other => Err(Error::invalid_criteria(format!(
                "criteria must be an object, found `{other}`"
            ))),
        }
    }

    /// Join the companion of relation `name`, aliased by the relation name.
    pub fn join_relation(&mut self, name: &str) -> Result<&'a Relation> {
        let model = self.model;
        let relation = model
            .relation(name)
            .ok_or_else(|| Error::unknown_relation(&model.name, name))?;
        let companion = self.schema.model(relation.companion())?;

        self.add_join(relation, companion, relation.name().to_string())?;
        Ok(relation)
    }

    pub fn finish(self, tree: WhereNode) -> CompiledWhere {
        tracing::trace!(model = %self.model.name, tree = %tree, joins = self.joins.len(), "compiled criteria");

        CompiledWhere {
            tree,
            joins: self.joins,
            group_by: self.group_by,
        }
    }

    fn logical(&mut self, criteria: &Map<String, Json>) -> Result<Vec<WhereNode>> {
        let mut nodes = Vec::with_capacity(criteria.len());

        for (key, value) in criteria {
            let node = match key.strip_prefix(OPERATOR_MARKER) {
                Some("and") => WhereNode::And(self.group(key, value)?),
                Some("or") => WhereNode::Or(self.group(key, value)?),
                Some(_) => return Err(Error::unknown_operator(key)),
                None => self.field(key, value)?,
            };
            nodes.push(node);
        }

        Ok(nodes)
    }

    /// Operand of `$and` / `$or`: an object, or a list of objects each of which
    /// is one AND group.
    fn group(&mut self, op: &str, value: &Json) -> Result<Vec<WhereNode>> {
        match value {
            Json::Object(criteria) => self.logical(criteria),
            Json::Array(items) => items
                .iter()
                .map(|item| match item {
                    Json::Object(criteria) => Ok(WhereNode::And(self.logical(criteria)?)),
                    other => Err(Error::invalid_criteria(format!(
                        "`{op}` expects objects, found `{other}`"
                    ))),
                })
                .collect(),
            other => Err(Error::invalid_criteria(format!(
                "`{op}` expects an object, found `{other}`"
            ))),
        }
    }

    fn field(&mut self, key: &str, value: &Json) -> Result<WhereNode> {
        let column = self.resolve(key)?;

        match value {
            Json::Object(ops) => Ok(WhereNode::And(self.operators(&column, ops)?)),
            Json::Array(_) => Err(Error::invalid_criteria(format!(
                "expected a value or an operator block for `{key}`, found a list"
            ))),
            value => self.compare(&column, "$eq", value),
        }
    }

    fn operators(&mut self, column: &Column<'a>, ops: &Map<String, Json>) -> Result<Vec<WhereNode>> {
        ops.iter()
            .map(|(op, value)| {
                if !op.starts_with(OPERATOR_MARKER) {
                    return Err(Error::invalid_criteria(format!(
                        "expected an operator for `{}`, found field `{op}`",
                        column.sql
                    )));
                }

                match &op[..] {
                    "$in" => self.list(column, value, false),
                    "$notin" => self.list(column, value, true),
                    _ => self.compare(column, op, value),
                }
            })
            .collect()
    }

    fn compare(&mut self, column: &Column<'a>, op: &str, value: &Json) -> Result<WhereNode> {
        let sql_op = comparison_operator(op).ok_or_else(|| Error::unknown_operator(op))?;

        let value = match (op, value) {
            (_, Json::Null) => Value::Null,
            // Patterns are matched against the stored form as written
            ("$like" | "$glob", Json::String(pattern)) => Value::String(pattern.clone()),
            ("$like" | "$glob", other) => {
                return Err(Error::invalid_criteria(format!(
                    "`{op}` expects a string pattern, found `{other}`"
                )))
            }
            (_, value) => self.convert(column, value)?,
        };

        if value.is_null() {
            return match op {
                "$eq" => Ok(WhereNode::Leaf(format!("{} IS NULL", column.sql))),
                "$ne" => Ok(WhereNode::Leaf(format!("{} IS NOT NULL", column.sql))),
                _ => Err(Error::invalid_criteria(format!(
                    "`{op}` cannot compare `{}` against null",
                    column.sql
                ))),
            };
        }

        let placeholder = self.params.push(value);
        Ok(WhereNode::Leaf(format!(
            "{} {sql_op} {placeholder}",
            column.sql
        )))
    }

    fn list(&mut self, column: &Column<'a>, value: &Json, negated: bool) -> Result<WhereNode> {
        let op = if negated { "$notin" } else { "$in" };

        let Json::Array(items) = value else {
            return Err(Error::invalid_criteria(format!(
                "`{op}` expects a list for `{}`, found `{value}`",
                column.sql
            )));
        };

        match &items[..] {
            [] => Err(Error::invalid_criteria(format!(
                "`{op}` requires a non-empty list for `{}`",
                column.sql
            ))),
            [item] => self.compare(column, if negated { "$ne" } else { "$eq" }, item),
            items => {
                let mut placeholders = Vec::with_capacity(items.len());
                for item in items {
                    let value = self.convert(column, item)?;
                    placeholders.push(self.params.push(value));
                }

                let keyword = if negated { "NOT IN" } else { "IN" };
                Ok(WhereNode::Leaf(format!(
                    "{} {keyword} ({})",
                    column.sql,
                    Comma(&placeholders)
                )))
            }
        }
    }

    fn convert(&self, column: &Column<'a>, value: &Json) -> Result<Value> {
        let value = Value::from(value);
        let value = match column.field {
            Some(field) => field.convert_to_database_form(value)?,
            None => value,
        };

        if !value.is_scalar() {
            return Err(Error::invalid_criteria(format!(
                "expected a scalar value for `{}`, found `{value}`",
                column.sql
            )));
        }

        Ok(value)
    }

    /// Resolve `field` or `relation$field`, adding the join the latter needs.
    fn resolve(&mut self, key: &str) -> Result<Column<'a>> {
        let model = self.model;

        let Some((relation_name, remote)) = key.split_once(RELATION_FIELD_SEPARATOR) else {
            let field = lookup(model, key).ok_or_else(|| Error::unknown_field(&model.name, key))?;
            return Ok(Column {
                sql: format!("{}.{key}", model.name),
                field,
            });
        };

        let relation = model
            .relation(relation_name)
            .ok_or_else(|| Error::unknown_relation(&model.name, relation_name))?;
        let companion = self.schema.model(relation.companion())?;

        if let Some(field) = lookup(companion, remote) {
            let alias = self.add_join(relation, companion, relation.name().to_string())?;
            return Ok(Column {
                sql: format!("{alias}.{remote}"),
                field,
            });
        }

        if let Relation::Multi(multi) = relation {
            let pivot = self.schema.model(&multi.pivot)?;

            if let Some(field) = lookup(pivot, remote) {
                let alias = self.add_join(relation, pivot, pivot_alias(relation.name()))?;
                return Ok(Column {
                    sql: format!("{alias}.{remote}"),
                    field,
                });
            }
        }

        Err(Error::unknown_field(relation.companion(), remote))
    }

    fn add_join(&mut self, relation: &Relation, target: &Model, alias: String) -> Result<String> {
        if self.joins.iter().any(|join| join.alias == alias) {
            return Ok(alias);
        }

        let condition = relation.join_condition(self.schema, &self.model.name, &target.name, &alias)?;
        self.joins.push(Join {
            table: target.name.clone(),
            alias: alias.clone(),
            condition,
        });

        if relation.multiplies_rows() && self.group_by.is_none() {
            self.group_by = Some(format!(
                "{}.{}",
                self.model.name,
                self.model.primary_key_name()
            ));
        }

        Ok(alias)
    }
}

/// Alias of the pivot table joined for `relation$pivotField` references.
pub fn pivot_alias(relation: &str) -> String {
    format!("{relation}__pivot")
}

/// `Some(None)` is the implicit row id of a model without a declared primary
/// key.
pub(crate) fn lookup<'m>(model: &'m Model, name: &str) -> Option<Option<&'m Field>> {
    match model.field(name) {
        Some(field) => Some(Some(field)),
        None if name == IMPLICIT_ROW_ID && !model.has_declared_primary_key() => Some(None),
        None => None,
    }
}

fn comparison_operator(op: &str) -> Option<&'static str> {
    Some(match op {
        "$eq" => "=",
        "$ne" => "<>",
        "$gt" => ">",
        "$gte" => ">=",
        "$lt" => "<",
        "$lte" => "<=",
        "$like" => "LIKE",
        "$glob" => "GLOB",
        _ => return None,
    })
}
