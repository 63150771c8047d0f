use super::Error;

/// Error when an instance or model does not match the one a relation edge
/// was built for.
#[derive(Debug)]
pub(super) struct ModelMismatchError {
    expected: Box<str>,
    actual: Box<str>,
}

impl std::error::Error for ModelMismatchError {}

impl core::fmt::Display for ModelMismatchError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "model mismatch: expected `{}`, found `{}`",
            self.expected, self.actual
        )
    }
}

impl Error {
    pub fn model_mismatch(expected: impl Into<String>, actual: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::ModelMismatch(ModelMismatchError {
            expected: expected.into().into(),
            actual: actual.into().into(),
        }))
    }

    pub fn is_model_mismatch(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::ModelMismatch(_))
    }
}
