use crate::{stmt::Value, Error, Result};

use std::{fmt, sync::Arc};

/// Returns `false` to reject a value on its way to the database.
pub type Validator = Arc<dyn Fn(&Value) -> bool + Send + Sync>;

/// Converts a value between its application and database forms.
pub type Converter = Arc<dyn Fn(Value) -> Value + Send + Sync>;

/// Produces the initial value of a field for a freshly built instance. Receives
/// the template's value for the field, if any.
pub type Generator = Arc<dyn Fn(Option<&Value>) -> Value + Send + Sync>;

/// Storage type hint emitted in `CREATE TABLE`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FieldType {
    Integer,
    Real,
    Text,
    Blob,
    Numeric,
    Boolean,
    Custom(String),
}

/// A model field: its name plus the spec it was declared with.
#[derive(Debug, Clone)]
pub struct Field {
    pub name: String,
    pub spec: FieldSpec,
}

/// Declared properties of a field.
#[derive(Clone)]
pub struct FieldSpec {
    /// Storage type hint. Fields without one are emitted typeless.
    pub ty: Option<FieldType>,

    /// Defaults to `true`.
    pub nullable: bool,

    pub unique: bool,

    /// Emitted as the column's `DEFAULT`, after database-form conversion.
    pub default: Option<Value>,

    pub primary_key: bool,

    pub collation: Option<String>,

    pub validator: Option<Validator>,

    pub serializer: Option<Converter>,

    pub deserializer: Option<Converter>,

    pub generator: Option<Generator>,
}

impl Field {
    pub fn new(name: impl Into<String>, spec: FieldSpec) -> Field {
        Field {
            name: name.into(),
            spec,
        }
    }

    /// Convert an application value into what is sent to the database.
    ///
    /// Null passes through untouched when the field is nullable; the validator
    /// is not consulted in that case.
    pub fn convert_to_database_form(&self, value: Value) -> Result<Value> {
        if self.spec.nullable && value.is_null() {
            return Ok(Value::Null);
        }

        if let Some(validator) = &self.spec.validator {
            if !validator(&value) {
                return Err(Error::validation(&self.name));
            }
        }

        Ok(match &self.spec.serializer {
            Some(serializer) => serializer(value),
            None => value,
        })
    }

    /// Convert a value read from the database into its application form.
    pub fn convert_from_database_form(&self, value: Value) -> Value {
        match &self.spec.deserializer {
            Some(deserializer) => deserializer(value),
            None => value,
        }
    }

    /// Initial value for a freshly built instance: the template value when
    /// present (an explicit null included), else the generated value.
    /// Returns `None` when the field gets no value at all.
    pub fn initial_value(&self, template: Option<&Value>) -> Option<Value> {
        match (template, &self.spec.generator) {
            (Some(value), _) => Some(value.clone()),
            (None, Some(generator)) => Some(generator(None)),
            (None, None) => None,
        }
    }
}

impl FieldSpec {
    /// An untyped, nullable field with no constraints or hooks.
    pub fn new() -> FieldSpec {
        FieldSpec {
            ty: None,
            nullable: true,
            unique: false,
            default: None,
            primary_key: false,
            collation: None,
            validator: None,
            serializer: None,
            deserializer: None,
            generator: None,
        }
    }

    pub fn of_type(ty: FieldType) -> FieldSpec {
        FieldSpec {
            ty: Some(ty),
            ..FieldSpec::new()
        }
    }

    pub fn integer() -> FieldSpec {
        FieldSpec::of_type(FieldType::Integer)
    }

    pub fn real() -> FieldSpec {
        FieldSpec::of_type(FieldType::Real)
    }

    pub fn text() -> FieldSpec {
        FieldSpec::of_type(FieldType::Text)
    }

    pub fn blob() -> FieldSpec {
        FieldSpec::of_type(FieldType::Blob)
    }

    pub fn boolean() -> FieldSpec {
        FieldSpec::of_type(FieldType::Boolean)
    }

    pub fn primary_key(mut self) -> FieldSpec {
        self.primary_key = true;
        self
    }

    pub fn unique(mut self) -> FieldSpec {
        self.unique = true;
        self
    }

    pub fn not_null(mut self) -> FieldSpec {
        self.nullable = false;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> FieldSpec {
        self.default = Some(value.into());
        self
    }

    pub fn collate(mut self, collation: impl Into<String>) -> FieldSpec {
        self.collation = Some(collation.into());
        self
    }

    pub fn validate(mut self, f: impl Fn(&Value) -> bool + Send + Sync + 'static) -> FieldSpec {
        self.validator = Some(Arc::new(f));
        self
    }

    pub fn serialize(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> FieldSpec {
        self.serializer = Some(Arc::new(f));
        self
    }

    pub fn deserialize(mut self, f: impl Fn(Value) -> Value + Send + Sync + 'static) -> FieldSpec {
        self.deserializer = Some(Arc::new(f));
        self
    }

    pub fn generate(
        mut self,
        f: impl Fn(Option<&Value>) -> Value + Send + Sync + 'static,
    ) -> FieldSpec {
        self.generator = Some(Arc::new(f));
        self
    }
}

impl Default for FieldSpec {
    fn default() -> Self {
        FieldSpec::new()
    }
}

impl fmt::Debug for FieldSpec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FieldSpec")
            .field("ty", &self.ty)
            .field("nullable", &self.nullable)
            .field("unique", &self.unique)
            .field("default", &self.default)
            .field("primary_key", &self.primary_key)
            .field("collation", &self.collation)
            .field("validator", &self.validator.is_some())
            .field("serializer", &self.serializer.is_some())
            .field("deserializer", &self.deserializer.is_some())
            .field("generator", &self.generator.is_some())
            .finish()
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FieldType::Integer => f.write_str("INTEGER"),
            FieldType::Real => f.write_str("REAL"),
            FieldType::Text => f.write_str("TEXT"),
            FieldType::Blob => f.write_str("BLOB"),
            FieldType::Numeric => f.write_str("NUMERIC"),
            FieldType::Boolean => f.write_str("BOOLEAN"),
            FieldType::Custom(ty) => f.write_str(ty),
        }
    }
}
