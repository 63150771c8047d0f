use super::Error;

/// Error when a value fails its field's validator.
#[derive(Debug)]
pub(super) struct ValidationError {
    field: Box<str>,
}

impl std::error::Error for ValidationError {}

impl core::fmt::Display for ValidationError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "validation failed for field `{}`", self.field)
    }
}

impl Error {
    pub fn validation(field: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::Validation(ValidationError {
            field: field.into().into(),
        }))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::Validation(_))
    }
}
