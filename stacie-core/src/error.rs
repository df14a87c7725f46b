//! Error types for credential derivation and realm encryption.
//!
//! Every fatal condition maps to one variant of [`Error`]. Length-alignment
//! advisories for salts and nonces are deliberately *not* errors; they are
//! emitted as `tracing` warnings and never abort a derivation.

use thiserror::Error;

/// Errors that can occur during derivation or envelope operations.
///
/// Error messages never contain key material or other derived secrets;
/// the `context` fields name the offending input, not its value.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum Error {
    /// A length precondition on an input failed.
    #[error("invalid length: {context}")]
    InvalidLength {
        /// Which input violated its length contract.
        context: &'static str,
    },

    /// An argument was outside its permitted domain.
    #[error("invalid argument: {context}")]
    InvalidArgument {
        /// Which argument was rejected.
        context: &'static str,
    },

    /// A decrypted envelope carried an inconsistent length header or
    /// trailing pad octets that disagree with the pad field.
    #[error("envelope padding is inconsistent")]
    InvalidPadding,

    /// AES-GCM tag verification failed while opening an envelope.
    #[error("envelope authentication failed")]
    AuthenticationFailure,

    /// The secure random source refused to produce bytes.
    #[error("secure random source unavailable")]
    RandomSourceUnavailable,
}

impl Error {
    /// Creates an invalid-length error.
    #[must_use]
    pub const fn length(context: &'static str) -> Self {
        Self::InvalidLength { context }
    }

    /// Creates an invalid-argument error.
    #[must_use]
    pub const fn argument(context: &'static str) -> Self {
        Self::InvalidArgument { context }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::length("salt shorter than 64 octets");
        assert_eq!(format!("{err}"), "invalid length: salt shorter than 64 octets");

        let err = Error::argument("serial out of range");
        assert_eq!(format!("{err}"), "invalid argument: serial out of range");

        let err = Error::AuthenticationFailure;
        assert!(format!("{err}").contains("authentication failed"));
    }
}
