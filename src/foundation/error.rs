/// Convenience result type used across rotoframe.
pub type RotoResult<T> = Result<T, RotoError>;

/// Top-level error taxonomy.
///
/// Nothing in the crate recovers from these; every failure propagates to the caller, which
/// stands in for the host application reporting the error to the user.
#[derive(thiserror::Error, Debug)]
pub enum RotoError {
    /// A layer or image handle does not resolve, or a named layer is missing.
    #[error("invalid reference: {0}")]
    InvalidReference(String),

    /// A host primitive rejected its operands.
    #[error("host error: {0}")]
    Host(String),

    /// Invalid user-provided configuration or arguments.
    #[error("validation error: {0}")]
    Validation(String),

    /// Errors when serializing or deserializing data structures.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl RotoError {
    /// Build a [`RotoError::InvalidReference`] value.
    pub fn invalid_reference(msg: impl Into<String>) -> Self {
        Self::InvalidReference(msg.into())
    }

    /// Build a [`RotoError::Host`] value.
    pub fn host(msg: impl Into<String>) -> Self {
        Self::Host(msg.into())
    }

    /// Build a [`RotoError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`RotoError::Serde`] value.
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}

impl From<serde_json::Error> for RotoError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serde(err.to_string())
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
