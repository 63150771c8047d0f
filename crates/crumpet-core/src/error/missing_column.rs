use super::Error;

/// Error when a result row lacks a column the model expects.
#[derive(Debug)]
pub(super) struct MissingColumnError {
    model: Box<str>,
    column: Box<str>,
}

impl std::error::Error for MissingColumnError {}

impl core::fmt::Display for MissingColumnError {
    fn fmt(&self, f: &mut core::fmt::Formatter) -> core::fmt::Result {
        write!(
            f,
            "result row for model `{}` is missing column `{}`",
            self.model, self.column
        )
    }
}

impl Error {
    pub fn missing_column(model: impl Into<String>, column: impl Into<String>) -> Error {
        Error::from(super::ErrorKind::MissingColumn(MissingColumnError {
            model: model.into().into(),
            column: column.into().into(),
        }))
    }

    pub fn is_missing_column(&self) -> bool {
        matches!(self.kind(), super::ErrorKind::MissingColumn(_))
    }
}
