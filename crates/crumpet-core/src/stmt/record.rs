use super::Value;

use indexmap::IndexMap;

/// Field name to value map used as a build template or a set of assignments.
pub type Record = IndexMap<String, Value>;

/// One result row, keyed by column alias.
pub type Row = IndexMap<String, Value>;

/// Builds a [`Record`] from `key => value` pairs.
///
/// ```
/// let record = crumpet_core::record! { "id" => 1, "name" => "a" };
/// assert_eq!(record.len(), 2);
/// ```
#[macro_export]
macro_rules! record {
    () => {
        $crate::stmt::Record::new()
    };
    ( $( $key:expr => $value:expr ),+ $(,)? ) => {{
        let mut record = $crate::stmt::Record::new();
        $(
            record.insert(::std::string::String::from($key), $crate::stmt::Value::from($value));
        )+
        record
    }};
}
