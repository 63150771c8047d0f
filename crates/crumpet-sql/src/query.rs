mod count;
pub use count::Count;

mod insert;
pub use insert::Insert;

mod key_select;
pub use key_select::KeySelect;

mod pivot;
pub use pivot::PivotSelect;

mod remove;
pub use remove::Remove;

mod select;
pub use select::{CompiledSelect, JoinedRelation, Select};

mod update;
pub use update::Update;

use crate::{column_alias, delim::Comma, where_tree::lookup, CompiledWhere, WhereNode};

use crumpet_core::{
    schema::{Model, SortEntry, IMPLICIT_ROW_ID},
    Error, Result,
};

/// Column alias of the single value returned by count queries.
pub const COUNT_ALIAS: &str = "count";

/// `<alias>.<col> AS <alias>__<col>` for every field of `model`, plus the
/// implicit row id when no primary key is declared.
fn model_columns(model: &Model, alias: &str) -> Vec<String> {
    let mut columns: Vec<_> = model
        .fields
        .keys()
        .map(|name| format!("{alias}.{name} AS {}", column_alias(alias, name)))
        .collect();

    if !model.has_declared_primary_key() {
        columns.push(format!(
            "{alias}.{IMPLICIT_ROW_ID} AS {}",
            column_alias(alias, IMPLICIT_ROW_ID)
        ));
    }

    columns
}

/// Filter for statements that cannot join: the compiled tree itself, or a
/// primary key subquery when the criteria required joins.
fn key_filter(model: &Model, compiled: &CompiledWhere) -> WhereNode {
    if !compiled.has_joins() {
        return compiled.tree.clone();
    }

    WhereNode::Leaf(format!(
        "{}.{} IN ({})",
        model.name,
        model.primary_key_name(),
        key_select::key_subquery(model, compiled)
    ))
}

fn where_clause(tree: &WhereNode) -> String {
    match tree.to_sql() {
        Some(sql) => format!(" WHERE {sql}"),
        None => String::new(),
    }
}

/// ` ORDER BY ..` for the explicit entries followed by the model's default
/// sort, unless an explicit entry already names the same field.
fn order_clause(model: &Model, sort: &[SortEntry]) -> Result<String> {
    let default = model
        .options
        .default_sort
        .as_ref()
        .filter(|default| !sort.iter().any(|entry| entry.field == default.field));

    let entries = sort
        .iter()
        .chain(default)
        .map(|entry| order_entry(model, entry))
        .collect::<Result<Vec<_>>>()?;

    if entries.is_empty() {
        return Ok(String::new());
    }

    Ok(format!(" ORDER BY {}", Comma(&entries)))
}

fn order_entry(model: &Model, entry: &SortEntry) -> Result<String> {
    if lookup(model, &entry.field).is_none() {
        return Err(Error::unknown_field(&model.name, &entry.field));
    }

    Ok(format!(
        "{}.{}{} {}",
        model.name,
        entry.field,
        if entry.case_sensitive { "" } else { " COLLATE NOCASE" },
        if entry.descending { "DESC" } else { "ASC" },
    ))
}

fn limit_clause(limit: Option<u64>, offset: Option<u64>) -> String {
    match (limit, offset) {
        (None, None) => String::new(),
        (Some(limit), None) => format!(" LIMIT {limit}"),
        (Some(limit), Some(offset)) => format!(" LIMIT {limit} OFFSET {offset}"),
        // SQLite only accepts OFFSET after a LIMIT
        (None, Some(offset)) => format!(" LIMIT -1 OFFSET {offset}"),
    }
}
