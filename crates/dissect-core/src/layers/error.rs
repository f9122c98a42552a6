use thiserror::Error;

use super::LayerType;

/// Errors returned by layer decoders.
///
/// # Examples
/// ```
/// use dissect_core::DecodeError;
///
/// let err = DecodeError::Truncated { needed: 28, actual: 27 };
/// assert!(err.to_string().contains("truncated"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum DecodeError {
    #[error("truncated header: need {needed} bytes, got {actual}")]
    Truncated { needed: usize, actual: usize },
    #[error("malformed {layer} header: {reason}")]
    Malformed { layer: LayerType, reason: String },
}

/// Errors returned while building a [`crate::LayerRegistry`].
///
/// These are startup-time programming errors; they never occur while
/// decoding.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    #[error("layer type {tag} is already registered")]
    ConstructionConflict { tag: LayerType },
    #[error("decoder does not declare support for layer type {tag}")]
    UnsupportedTag { tag: LayerType },
}
