use crate::Value;

/// Error type returned by this crate.
#[derive(Debug, thiserror::Error)]
pub enum GenericError {
    /// Input whose type a wrapper cannot coerce into its payload.
    #[error("invalid value: ({})", .0.type_name())]
    InvalidValue(Value),
    /// Malformed serialized text handed to a JSON decoding hook.
    #[error("json error: {0}")]
    Json(#[from] serde_json::Error),
}

impl GenericError {
    /// Builds the coercion error and logs the rejected type.
    pub(crate) fn invalid(value: Value) -> Self {
        #[cfg(feature = "tracing")]
        tracing::debug!("rejected generic value of type {}", value.type_name());
        Self::InvalidValue(value)
    }
}
