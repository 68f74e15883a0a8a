//! Forge error types.

use thiserror::Error;

/// Errors from operation construction, forging or verification.
#[derive(Debug, Error)]
pub enum ForgeError {
    /// Local and remote forge disagree. Never sign on this path.
    #[error("Forge verification mismatch: local {local} != remote {remote}")]
    VerificationMismatch {
        /// Hex the local forge produced
        local: String,
        /// Hex the node produced
        remote: String,
    },

    /// Address string is not a source/destination this forge can encode
    #[error("Invalid address: {0}")]
    InvalidAddress(String),

    /// Operation kind has no local binary encoding
    #[error("Unsupported operation kind: {0}")]
    UnsupportedKind(&'static str),

    /// Evidence payload malformed (wrong length, bad hex)
    #[error("Invalid evidence payload: {0}")]
    InvalidEvidence(String),

    /// Underlying codec failure
    #[error(transparent)]
    Codec(#[from] shared_codec::CodecError),
}
