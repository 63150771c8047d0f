mod delim;

pub mod ddl;
pub use ddl::create_schema;

pub mod query;
pub use query::{
    CompiledSelect, Count, Insert, JoinedRelation, KeySelect, PivotSelect, Remove, Select, Update,
    COUNT_ALIAS,
};

pub mod where_tree;
pub use where_tree::{CompiledWhere, Compiler, Join, WhereNode};

/// Separator between a column prefix and a column name in result aliases,
/// e.g. `foo__name`.
pub const ALIAS_SEPARATOR: &str = "__";

/// Result column alias for `column` under `prefix`.
pub fn column_alias(prefix: &str, column: &str) -> String {
    format!("{prefix}{ALIAS_SEPARATOR}{column}")
}
