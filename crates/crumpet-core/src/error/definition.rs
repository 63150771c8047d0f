use super::Error;

/// Error raised while declaring models, fields or relations.
///
/// Definition errors surface synchronously, before any statement reaches the
/// database.
#[derive(Debug)]
pub(super) struct DefinitionError {
    kind: DefinitionErrorKind,
}

#[derive(Debug)]
enum DefinitionErrorKind {
    /// Name does not match the identifier grammar
    InvalidName { name: Box<str> },

    /// A field with the same name already exists on the model
    DuplicateField { model: Box<str>, field: Box<str> },

    /// A model with the same name is already registered
    DuplicateModel { model: Box<str> },

    /// A relation name collides with an existing field or relation
    ReservedName { model: Box<str>, name: Box<str> },
}

impl std::error::Error for DefinitionError {}

impl core::fmt::Display for DefinitionError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        use DefinitionErrorKind::*;

        match &self.kind {
            InvalidName { name } => write!(f, "invalid identifier `{name}`"),
            DuplicateField { model, field } => {
                write!(f, "field `{field}` already defined on model `{model}`")
            }
            DuplicateModel { model } => write!(f, "model `{model}` already defined"),
            ReservedName { model, name } => write!(
                f,
                "name `{name}` is already taken by a field or relation of model `{model}`"
            ),
        }
    }
}

impl Error {
    pub fn invalid_name(name: impl Into<String>) -> Error {
        Error::definition(DefinitionErrorKind::InvalidName {
            name: name.into().into(),
        })
    }

    pub fn duplicate_field(model: impl Into<String>, field: impl Into<String>) -> Error {
        Error::definition(DefinitionErrorKind::DuplicateField {
            model: model.into().into(),
            field: field.into().into(),
        })
    }

    pub fn duplicate_model(model: impl Into<String>) -> Error {
        Error::definition(DefinitionErrorKind::DuplicateModel {
            model: model.into().into(),
        })
    }

    pub fn reserved_name(model: impl Into<String>, name: impl Into<String>) -> Error {
        Error::definition(DefinitionErrorKind::ReservedName {
            model: model.into().into(),
            name: name.into().into(),
        })
    }

    pub fn is_invalid_name(&self) -> bool {
        self.definition_kind()
            .is_some_and(|kind| matches!(kind, DefinitionErrorKind::InvalidName { .. }))
    }

    pub fn is_duplicate_field(&self) -> bool {
        self.definition_kind()
            .is_some_and(|kind| matches!(kind, DefinitionErrorKind::DuplicateField { .. }))
    }

    pub fn is_duplicate_model(&self) -> bool {
        self.definition_kind()
            .is_some_and(|kind| matches!(kind, DefinitionErrorKind::DuplicateModel { .. }))
    }

    pub fn is_reserved_name(&self) -> bool {
        self.definition_kind()
            .is_some_and(|kind| matches!(kind, DefinitionErrorKind::ReservedName { .. }))
    }

    fn definition(kind: DefinitionErrorKind) -> Error {
        Error::from(super::ErrorKind::Definition(DefinitionError { kind }))
    }

    fn definition_kind(&self) -> Option<&DefinitionErrorKind> {
        match self.kind() {
            super::ErrorKind::Definition(err) => Some(&err.kind),
            _ => None,
        }
    }
}
