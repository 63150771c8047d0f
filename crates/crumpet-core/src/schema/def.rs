use super::{
    relation::{Many, Multi, Single},
    validate_name, FieldSpec, FieldType, Model, ModelOptions, Relation, RelationType, Schema,
};
use crate::{Error, Result};

/// Definition handle for one model of a [`Schema`].
///
/// Every method resolves the model again through the schema, so relation
/// definitions can update the companion or pivot model as well.
#[derive(Debug)]
pub struct ModelDef<'a> {
    schema: &'a mut Schema,
    name: String,
}

/// Options shared by one-to-one, many-to-one and one-to-many definitions.
#[derive(Debug, Default, Clone)]
pub struct RelationOptions {
    /// Foreign key column name. Defaults to `<referenced model>id`.
    pub foreign_key: Option<String>,

    /// When set, the inverse relation is registered on the companion model
    /// under this name.
    pub companion_field: Option<String>,
}

#[derive(Debug, Default, Clone)]
pub struct ManyToManyOptions {
    /// Pivot model name, resolved or created. Defaults to `<owner>_<other>`.
    pub pivot: Option<String>,

    /// Pivot column referencing the owner. Defaults to `<owner>id`.
    pub my_foreign_key: Option<String>,

    /// Pivot column referencing the companion. Defaults to `<other>id`.
    pub other_foreign_key: Option<String>,

    pub companion_field: Option<String>,
}

impl<'a> ModelDef<'a> {
    pub(super) fn new(schema: &'a mut Schema, name: &str) -> ModelDef<'a> {
        ModelDef {
            schema,
            name: name.to_string(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn model(&self) -> Result<&Model> {
        self.schema.model(&self.name)
    }

    pub fn add_field(&mut self, name: &str, spec: FieldSpec) -> Result<&mut Self> {
        self.schema.model_entry(&self.name)?.insert_field(name, spec)?;
        Ok(self)
    }

    /// Add the field if absent, otherwise apply `f` to its existing spec.
    /// Properties `f` does not touch keep their current value.
    pub fn update_field(
        &mut self,
        name: &str,
        f: impl FnOnce(&mut FieldSpec),
    ) -> Result<&mut Self> {
        upsert_field(self.schema, &self.name, name, f)?;
        Ok(self)
    }

    /// Append a raw table constraint, emitted after the column list.
    pub fn add_constraint(&mut self, constraint: impl Into<String>) -> Result<&mut Self> {
        self.schema
            .model_entry(&self.name)?
            .constraints
            .push(constraint.into());
        Ok(self)
    }

    /// Append a `UNIQUE(..)` constraint over existing fields.
    pub fn add_unique(&mut self, fields: &[&str]) -> Result<&mut Self> {
        let model = self.schema.model_entry(&self.name)?;
        for field in fields {
            model.expect_field(field)?;
        }
        model.constraints.push(unique_constraint(fields));
        Ok(self)
    }

    /// This model stores a unique foreign key to `other`.
    pub fn one_to_one(
        &mut self,
        other: &str,
        name: &str,
        options: RelationOptions,
    ) -> Result<&mut Self> {
        let foreign_key = options
            .foreign_key
            .unwrap_or_else(|| default_foreign_key(other));

        self.check_relation_names(
            (self.name.as_str(), name),
            options.companion_field.as_deref().map(|cf| (other, cf)),
            &[(self.name.as_str(), foreign_key.as_str())],
        )?;

        add_foreign_key(self.schema, &self.name, &foreign_key, other, true)?;

        self.schema
            .model_entry(&self.name)?
            .insert_relation(Relation::Single(Single {
                name: name.to_string(),
                ty: RelationType::OneToOne,
                owner: self.name.clone(),
                companion: other.to_string(),
                is_left: true,
                foreign_key: foreign_key.clone(),
            }))?;

        if let Some(companion_field) = options.companion_field {
            self.schema
                .model_entry(other)?
                .insert_relation(Relation::Single(Single {
                    name: companion_field,
                    ty: RelationType::OneToOne,
                    owner: other.to_string(),
                    companion: self.name.clone(),
                    is_left: false,
                    foreign_key,
                }))?;
        }

        Ok(self)
    }

    /// Many rows of this model reference one row of `other`.
    pub fn many_to_one(
        &mut self,
        other: &str,
        name: &str,
        options: RelationOptions,
    ) -> Result<&mut Self> {
        let foreign_key = options
            .foreign_key
            .unwrap_or_else(|| default_foreign_key(other));

        self.check_relation_names(
            (self.name.as_str(), name),
            options.companion_field.as_deref().map(|cf| (other, cf)),
            &[(self.name.as_str(), foreign_key.as_str())],
        )?;

        add_foreign_key(self.schema, &self.name, &foreign_key, other, false)?;

        self.schema
            .model_entry(&self.name)?
            .insert_relation(Relation::Single(Single {
                name: name.to_string(),
                ty: RelationType::ManyToOne,
                owner: self.name.clone(),
                companion: other.to_string(),
                is_left: true,
                foreign_key: foreign_key.clone(),
            }))?;

        if let Some(companion_field) = options.companion_field {
            self.schema
                .model_entry(other)?
                .insert_relation(Relation::Many(Many {
                    name: companion_field,
                    ty: RelationType::OneToMany,
                    owner: other.to_string(),
                    companion: self.name.clone(),
                    is_left: false,
                    foreign_key,
                }))?;
        }

        Ok(self)
    }

    /// Many rows of `other` reference one row of this model.
    pub fn one_to_many(
        &mut self,
        other: &str,
        name: &str,
        options: RelationOptions,
    ) -> Result<&mut Self> {
        let foreign_key = options
            .foreign_key
            .unwrap_or_else(|| default_foreign_key(&self.name));

        self.check_relation_names(
            (self.name.as_str(), name),
            options.companion_field.as_deref().map(|cf| (other, cf)),
            &[(other, foreign_key.as_str())],
        )?;

        add_foreign_key(self.schema, other, &foreign_key, &self.name, false)?;

        self.schema
            .model_entry(&self.name)?
            .insert_relation(Relation::Many(Many {
                name: name.to_string(),
                ty: RelationType::OneToMany,
                owner: self.name.clone(),
                companion: other.to_string(),
                is_left: true,
                foreign_key: foreign_key.clone(),
            }))?;

        if let Some(companion_field) = options.companion_field {
            self.schema
                .model_entry(other)?
                .insert_relation(Relation::Single(Single {
                    name: companion_field,
                    ty: RelationType::ManyToOne,
                    owner: other.to_string(),
                    companion: self.name.clone(),
                    is_left: true,
                    foreign_key,
                }))?;
        }

        Ok(self)
    }

    /// Rows of this model and `other` are paired through a pivot model holding
    /// one row per related pair.
    pub fn many_to_many(
        &mut self,
        other: &str,
        name: &str,
        options: ManyToManyOptions,
    ) -> Result<&mut Self> {
        self.schema.model(other)?;

        let pivot = options
            .pivot
            .unwrap_or_else(|| format!("{}_{}", self.name, other));
        let my_foreign_key = options
            .my_foreign_key
            .unwrap_or_else(|| default_foreign_key(&self.name));
        let other_foreign_key = options
            .other_foreign_key
            .unwrap_or_else(|| default_foreign_key(other));

        if my_foreign_key == other_foreign_key {
            return Err(Error::duplicate_field(&pivot, &my_foreign_key));
        }

        if pivot == self.name || pivot == other {
            return Err(Error::reserved_name(&self.name, &pivot));
        }

        if name == pivot {
            return Err(Error::reserved_name(&self.name, name));
        }

        if options.companion_field.as_deref() == Some(pivot.as_str()) {
            return Err(Error::reserved_name(other, &pivot));
        }

        self.check_relation_names(
            (self.name.as_str(), name),
            options.companion_field.as_deref().map(|cf| (other, cf)),
            &[],
        )?;

        if self.schema.get_model(&pivot).is_none() {
            self.schema.define_model(&pivot, ModelOptions::default())?;
        }

        add_foreign_key(self.schema, &pivot, &my_foreign_key, &self.name, false)?;
        add_foreign_key(self.schema, &pivot, &other_foreign_key, other, false)?;
        self.schema
            .model_entry(&pivot)?
            .constraints
            .push(unique_constraint(&[&my_foreign_key, &other_foreign_key]));

        self.schema
            .model_entry(&self.name)?
            .insert_relation(Relation::Multi(Multi {
                name: name.to_string(),
                ty: RelationType::ManyToMany,
                owner: self.name.clone(),
                companion: other.to_string(),
                is_left: true,
                pivot: pivot.clone(),
                my_foreign_key: my_foreign_key.clone(),
                other_foreign_key: other_foreign_key.clone(),
            }))?;

        if let Some(companion_field) = options.companion_field {
            self.schema
                .model_entry(other)?
                .insert_relation(Relation::Multi(Multi {
                    name: companion_field,
                    ty: RelationType::ManyToMany,
                    owner: other.to_string(),
                    companion: self.name.clone(),
                    is_left: false,
                    pivot,
                    my_foreign_key: other_foreign_key,
                    other_foreign_key: my_foreign_key,
                }))?;
        }

        Ok(self)
    }

    /// Validate relation names before anything is mutated, so a failing
    /// definition leaves the schema untouched.
    ///
    /// `foreign_keys` lists columns about to be created or updated; a relation
    /// may not take one of their names.
    fn check_relation_names(
        &self,
        relation: (&str, &str),
        companion: Option<(&str, &str)>,
        foreign_keys: &[(&str, &str)],
    ) -> Result<()> {
        let mut names = vec![relation];
        names.extend(companion);

        for (i, &(model, name)) in names.iter().enumerate() {
            validate_name(name)?;

            // Relations are joined under their own name, which may not shadow
            // the owner's table
            let taken = name == model
                || self.schema.model(model)?.has_member(name)
                || foreign_keys.contains(&(model, name))
                || names[..i].contains(&(model, name));

            if taken {
                return Err(Error::reserved_name(model, name));
            }
        }

        for &(model, foreign_key) in foreign_keys {
            if self.schema.model(model)?.relation(foreign_key).is_some() {
                return Err(Error::reserved_name(model, foreign_key));
            }
        }

        Ok(())
    }
}

impl RelationOptions {
    pub fn new() -> RelationOptions {
        RelationOptions::default()
    }

    pub fn foreign_key(mut self, name: impl Into<String>) -> RelationOptions {
        self.foreign_key = Some(name.into());
        self
    }

    pub fn companion_field(mut self, name: impl Into<String>) -> RelationOptions {
        self.companion_field = Some(name.into());
        self
    }
}

impl ManyToManyOptions {
    pub fn new() -> ManyToManyOptions {
        ManyToManyOptions::default()
    }

    pub fn pivot(mut self, name: impl Into<String>) -> ManyToManyOptions {
        self.pivot = Some(name.into());
        self
    }

    pub fn my_foreign_key(mut self, name: impl Into<String>) -> ManyToManyOptions {
        self.my_foreign_key = Some(name.into());
        self
    }

    pub fn other_foreign_key(mut self, name: impl Into<String>) -> ManyToManyOptions {
        self.other_foreign_key = Some(name.into());
        self
    }

    pub fn companion_field(mut self, name: impl Into<String>) -> ManyToManyOptions {
        self.companion_field = Some(name.into());
        self
    }
}

fn default_foreign_key(model: &str) -> String {
    format!("{model}id")
}

fn unique_constraint(fields: &[&str]) -> String {
    format!("UNIQUE({})", fields.join(", "))
}

fn upsert_field(
    schema: &mut Schema,
    model: &str,
    name: &str,
    f: impl FnOnce(&mut FieldSpec),
) -> Result<()> {
    let model = schema.model_entry(model)?;

    if !model.fields.contains_key(name) {
        model.insert_field(name, FieldSpec::new())?;
    }

    f(&mut model.fields[name].spec);
    Ok(())
}

/// Create or update `column` on `model` as a foreign key to `target`'s primary
/// key and record the constraint.
fn add_foreign_key(
    schema: &mut Schema,
    model: &str,
    column: &str,
    target: &str,
    unique: bool,
) -> Result<()> {
    let target_model = schema.model(target)?;
    let target_pk = target_model.primary_key_name().to_string();
    let target_ty = target_model
        .primary_key_field()
        .and_then(|field| field.spec.ty.clone())
        .unwrap_or(FieldType::Integer);

    upsert_field(schema, model, column, |spec| {
        if spec.ty.is_none() {
            spec.ty = Some(target_ty);
        }
        if unique {
            spec.unique = true;
        }
    })?;

    schema.model_entry(model)?.constraints.push(format!(
        "FOREIGN KEY ({column}) REFERENCES {target}({target_pk}) ON UPDATE CASCADE ON DELETE CASCADE"
    ));

    Ok(())
}
