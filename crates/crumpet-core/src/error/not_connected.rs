use super::Error;

/// Error when a data-access operation runs without an active connection.
#[derive(Debug)]
pub(super) struct NotConnectedError;

impl std::error::Error for NotConnectedError {}

impl core::fmt::Display for NotConnectedError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        f.write_str("no database connection is set")
    }
}

impl Error {
    pub fn not_connected() -> Error {
        Error::from(super::ErrorKind::NotConnected(NotConnectedError))
    }

    pub fn is_not_connected(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::NotConnected(_))
    }
}
