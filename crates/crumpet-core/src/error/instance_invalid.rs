use super::Error;

/// Error when an instance cannot take part in a relation operation because it
/// has not been flushed or carries no row identifier.
#[derive(Debug)]
pub(super) struct InstanceInvalidError {
    model: Box<str>,
    reason: Box<str>,
}

impl std::error::Error for InstanceInvalidError {}

impl core::fmt::Display for InstanceInvalidError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(f, "invalid `{}` instance: {}", self.model, self.reason)
    }
}

impl Error {
    pub fn instance_invalid(model: impl Into<String>, reason: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::InstanceInvalid(InstanceInvalidError {
            model: model.into().into(),
            reason: reason.into().into(),
        }))
    }

    pub fn is_instance_invalid(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::InstanceInvalid(_))
    }
}
