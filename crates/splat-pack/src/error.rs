use thiserror::Error;

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("Unsupported file type (leading bytes {magic:?})")]
    UnsupportedFormat { magic: Vec<u8> },

    #[error("Unable to read .ply file header: {0}")]
    HeaderFormat(String),

    #[error("Property '{0}' not found")]
    PropertyNotFound(String),

    #[error("Ply body is truncated: needs {needed} bytes but only {available} are available")]
    Truncated { needed: usize, available: usize },
}

impl ConvertError {
    pub(crate) fn header(reason: impl Into<String>) -> Self {
        Self::HeaderFormat(reason.into())
    }

    /// Whether this is the soft rejection of input that isn't a ply file at all.
    ///
    /// Callers usually want to report these and move on, while every other
    /// variant means the input claimed to be a ply file but couldn't be converted.
    pub fn is_unsupported(&self) -> bool {
        matches!(self, Self::UnsupportedFormat { .. })
    }
}
