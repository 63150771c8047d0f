use super::Error;

/// Error when a schema cannot be emitted or flushed.
///
/// This occurs when:
/// - A model marks more than one field as primary key
/// - The schema has already been flushed to the database
#[derive(Debug)]
pub(super) struct InvalidSchemaError {
    message: Box<str>,
    already_flushed: bool,
}

impl std::error::Error for InvalidSchemaError {}

impl core::fmt::Display for InvalidSchemaError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid schema: {}", self.message)
    }
}

impl Error {
    /// Creates an invalid schema error.
    pub fn invalid_schema(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidSchema(InvalidSchemaError {
            message: message.into().into(),
            already_flushed: false,
        }))
    }

    pub fn schema_already_flushed() -> Error {
        Error::from(super::ErrorKind::InvalidSchema(InvalidSchemaError {
            message: "schema has already been flushed".into(),
            already_flushed: true,
        }))
    }

    /// Returns `true` if this error is an invalid schema error.
    pub fn is_invalid_schema(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidSchema(_))
    }

    pub fn is_schema_already_flushed(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidSchema(err) if err.already_flushed)
    }
}
