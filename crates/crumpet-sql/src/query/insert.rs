use crate::delim::Comma;

use crumpet_core::{
    driver::Statement,
    stmt::{Params, Record, Value},
    Result, Schema,
};

/// `INSERT` of one row.
///
/// Every field of the model is converted to its database form. Values present
/// in the record are always bound, null included. Absent fields are converted
/// as null, so validation still applies, and left out when that yields null so
/// the column default applies.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Insert {
    pub model: String,
    pub values: Record,
}

impl Insert {
    pub fn new(model: impl Into<String>) -> Insert {
        Insert {
            model: model.into(),
            values: Record::new(),
        }
    }

    pub fn values(mut self, values: Record) -> Insert {
        self.values = values;
        self
    }

    pub fn value(mut self, field: impl Into<String>, value: impl Into<Value>) -> Insert {
        self.values.insert(field.into(), value.into());
        self
    }

    pub fn build(&self, schema: &Schema) -> Result<Statement> {
        let model = schema.model(&self.model)?;

        for name in self.values.keys() {
            model.expect_field(name)?;
        }

        let mut params = Params::new();
        let mut columns = vec![];
        let mut placeholders = vec![];

        for field in model.fields.values() {
            let value = match self.values.get(&field.name) {
                Some(value) => field.convert_to_database_form(value.clone())?,
                None => match field.convert_to_database_form(Value::Null)? {
                    Value::Null => continue,
                    value => value,
                },
            };

            columns.push(&field.name);
            placeholders.push(params.push(value));
        }

        let sql = if columns.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES", model.name)
        } else {
            format!(
                "INSERT INTO {} ({}) VALUES ({})",
                model.name,
                Comma(&columns),
                Comma(&placeholders)
            )
        };

        Ok(Statement::new(sql, params))
    }
}
