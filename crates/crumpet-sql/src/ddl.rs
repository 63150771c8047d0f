use crate::delim::Comma;

use crumpet_core::{
    schema::{Field, Model},
    Error, Result, Schema,
};

/// `CREATE TABLE` statements for every model, in definition order, joined with
/// `"; "`.
pub fn create_schema(schema: &Schema) -> Result<String> {
    let tables = schema
        .models()
        .map(create_table)
        .collect::<Result<Vec<_>>>()?;

    Ok(tables.join("; "))
}

/// `CREATE TABLE <name>(<columns>[, <constraints>])` for one model.
pub fn create_table(model: &Model) -> Result<String> {
    let primary_keys = model
        .fields
        .values()
        .filter(|field| field.spec.primary_key)
        .count();

    if primary_keys > 1 {
        return Err(Error::invalid_schema(format!(
            "model `{}` declares {primary_keys} primary key fields; compound primary keys are not supported",
            model.name
        )));
    }

    let mut defs = model
        .fields
        .values()
        .map(column_def)
        .collect::<Result<Vec<_>>>()?;
    defs.extend(model.constraints.iter().cloned());

    Ok(format!("CREATE TABLE {}({})", model.name, Comma(&defs)))
}

fn column_def(field: &Field) -> Result<String> {
    let spec = &field.spec;
    let mut def = field.name.clone();

    if let Some(ty) = &spec.ty {
        def.push_str(&format!(" {ty}"));
    }

    if spec.primary_key {
        def.push_str(" PRIMARY KEY");
    }

    if spec.unique {
        def.push_str(" UNIQUE");
    }

    if let Some(collation) = &spec.collation {
        def.push_str(&format!(" COLLATE {collation}"));
    }

    if !spec.nullable {
        def.push_str(" NOT NULL");
    }

    if let Some(default) = &spec.default {
        let default = field.convert_to_database_form(default.clone())?;
        def.push_str(&format!(" DEFAULT {}", default.to_sql_literal()));
    }

    Ok(def)
}
