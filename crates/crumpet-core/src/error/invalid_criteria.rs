use super::Error;

/// Error when a criteria object, or options passed alongside it, cannot be
/// compiled into a statement.
#[derive(Debug)]
pub(super) struct InvalidCriteriaError {
    message: Box<str>,
    empty: bool,
}

impl std::error::Error for InvalidCriteriaError {}

impl core::fmt::Display for InvalidCriteriaError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid criteria: {}", self.message)
    }
}

impl Error {
    pub fn invalid_criteria(message: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InvalidCriteria(InvalidCriteriaError {
            message: message.into().into(),
            empty: false,
        }))
    }

    /// Creates the error returned when an operation that must be filtered is
    /// handed an empty criteria object.
    pub fn empty_criteria(operation: &str) -> Error {
        Error::from(super::ErrorKind::InvalidCriteria(InvalidCriteriaError {
            message: format!("{operation} requires a non-empty criteria object").into(),
            empty: true,
        }))
    }

    pub fn is_invalid_criteria(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidCriteria(_))
    }

    pub fn is_empty_criteria(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InvalidCriteria(err) if err.empty)
    }
}
