use super::Error;

/// Error when a name used in a definition or criteria object does not
/// resolve to anything known.
#[derive(Debug)]
pub(super) struct UnresolvedError {
    kind: UnresolvedKind,
}

#[derive(Debug)]
enum UnresolvedKind {
    Model { model: Box<str> },
    Field { model: Box<str>, field: Box<str> },
    Relation { model: Box<str>, relation: Box<str> },
    Operator { operator: Box<str> },
}

impl std::error::Error for UnresolvedError {}

impl core::fmt::Display for UnresolvedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        match &self.kind {
            UnresolvedKind::Model { model } => write!(f, "unknown model `{model}`"),
            UnresolvedKind::Field { model, field } => {
                write!(f, "unknown field `{field}` on model `{model}`")
            }
            UnresolvedKind::Relation { model, relation } => {
                write!(f, "unknown relation `{relation}` on model `{model}`")
            }
            UnresolvedKind::Operator { operator } => write!(f, "unknown operator `{operator}`"),
        }
    }
}

impl Error {
    pub fn unknown_model(model: impl Into<String>) -> Error {
        Error::unresolved(UnresolvedKind::Model {
            model: model.into().into(),
        })
    }

    pub fn unknown_field(model: impl Into<String>, field: impl Into<String>) -> Error {
        Error::unresolved(UnresolvedKind::Field {
            model: model.into().into(),
            field: field.into().into(),
        })
    }

    pub fn unknown_relation(model: impl Into<String>, relation: impl Into<String>) -> Error {
        Error::unresolved(UnresolvedKind::Relation {
            model: model.into().into(),
            relation: relation.into().into(),
        })
    }

    pub fn unknown_operator(operator: impl Into<String>) -> Error {
        Error::unresolved(UnresolvedKind::Operator {
            operator: operator.into().into(),
        })
    }

    pub fn is_unknown_model(&self) -> bool {
        matches!(self.unresolved_kind(), Some(UnresolvedKind::Model { .. }))
    }

    pub fn is_unknown_field(&self) -> bool {
        matches!(self.unresolved_kind(), Some(UnresolvedKind::Field { .. }))
    }

    pub fn is_unknown_relation(&self) -> bool {
        matches!(self.unresolved_kind(), Some(UnresolvedKind::Relation { .. }))
    }

    pub fn is_unknown_operator(&self) -> bool {
        matches!(self.unresolved_kind(), Some(UnresolvedKind::Operator { .. }))
    }

    fn unresolved(kind: UnresolvedKind) -> Error {
        Error::from(super::ErrorKind::Unresolved(UnresolvedError { kind }))
    }

    fn unresolved_kind(&self) -> Option<&UnresolvedKind> {
        match self.kind() {
            super::ErrorKind::Unresolved(err) => Some(&err.kind),
            _ => None,
        }
    }
}
