/// Result alias that carries the custom [`AlchemyError`] type.
pub type Result<T> = std::result::Result<T, AlchemyError>;

/// Common error type for the core crate.
///
/// Transitions themselves never fail; these variants only surface from the
/// infrastructure around them (configuration files, the key-value store and
/// render surfaces).
#[derive(Debug, thiserror::Error)]
pub enum AlchemyError {
    /// Free-form message for failures without a dedicated variant.
    #[error("{0}")]
    Message(String),
    /// Wrapper around standard IO errors.
    #[error("{0}")]
    Io(#[from] std::io::Error),
    /// JSON encoding or decoding failed.
    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
    /// A palette was configured without any colors.
    #[error("palette `{0}` must contain at least one color")]
    InvalidPalette(String),
}

impl AlchemyError {
    /// Creates a new error that simply wraps the provided message.
    pub fn msg<T: Into<String>>(msg: T) -> Self {
        Self::Message(msg.into())
    }
}

impl From<&str> for AlchemyError {
    fn from(value: &str) -> Self {
        Self::msg(value)
    }
}

impl From<String> for AlchemyError {
    fn from(value: String) -> Self {
        Self::Message(value)
    }
}
