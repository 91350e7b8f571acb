//! Error types for certificate and private key decoding
//!
//! Only hard failures are represented here. A buffer that simply is not in a
//! given format is not an error; the decoder moves on to the next strategy.

use thiserror::Error;

/// Errors that can occur while turning caller-supplied buffers into a
/// [`CertificateBundle`](crate::CertificateBundle)
#[derive(Error, Debug)]
pub enum CertificateError {
    /// Certificate buffer is not a PKCS#12 archive, DER certificate or PEM certificate
    #[error("Failed to parse certificate container: {reason}")]
    MalformedContainer { reason: String },

    /// Certificate carries no key and no separate key buffer was supplied
    #[error("No private key specified for certificate '{subject}'")]
    MissingPrivateKey { subject: String },

    /// Key is password protected
    #[error("Encrypted private keys are not supported ({format})")]
    UnsupportedEncryptedKey { format: &'static str },

    /// Key buffer did not match any supported key encoding
    #[error("Private key could not be decoded")]
    KeyDecodeFailure,

    /// Key buffer was recognized as `format` but its contents are broken
    #[error("Corrupt {format} private key: {reason}")]
    CorruptKey { format: &'static str, reason: String },

    /// Private key does not belong to the certificate's public key
    #[error("Private key does not match the public key of certificate '{subject}'")]
    KeyMismatch { subject: String },

    /// Invalid decoder configuration value
    #[error("Invalid configuration for '{var_name}': {reason}")]
    InvalidConfig { var_name: String, reason: String },
}

/// Result type alias for decoding operations
pub type CertificateResult<T> = Result<T, CertificateError>;

impl CertificateError {
    pub(crate) fn corrupt(format: &'static str, reason: impl Into<String>) -> Self {
        CertificateError::CorruptKey {
            format,
            reason: reason.into(),
        }
    }

    /// Stable classification string, suitable for an `error_code` field
    pub fn code(&self) -> &'static str {
        match self {
            CertificateError::MalformedContainer { .. } => "MalformedContainer",
            CertificateError::MissingPrivateKey { .. } => "MissingPrivateKey",
            CertificateError::UnsupportedEncryptedKey { .. } => "UnsupportedEncryptedKey",
            CertificateError::KeyDecodeFailure => "KeyDecodeFailure",
            CertificateError::CorruptKey { .. } => "CorruptKey",
            CertificateError::KeyMismatch { .. } => "KeyMismatch",
            CertificateError::InvalidConfig { .. } => "InvalidConfig",
        }
    }

    /// True when the key would likely load if a password were supported
    pub fn is_encrypted_key(&self) -> bool {
        matches!(self, CertificateError::UnsupportedEncryptedKey { .. })
    }

    /// Check if the caller sent material we cannot use (as opposed to a configuration problem)
    pub fn is_format_error(&self) -> bool {
        !matches!(self, CertificateError::InvalidConfig { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_codes() {
        assert_eq!(
            CertificateError::MissingPrivateKey {
                subject: "CN=Unit Test".to_string()
            }
            .code(),
            "MissingPrivateKey"
        );
        assert_eq!(CertificateError::KeyDecodeFailure.code(), "KeyDecodeFailure");
        assert_eq!(
            CertificateError::corrupt("PKCS#1 DER", "truncated").code(),
            "CorruptKey"
        );
    }

    #[test]
    fn test_encrypted_key_is_distinct() {
        let err = CertificateError::UnsupportedEncryptedKey { format: "PKCS#1 PEM" };
        assert!(err.is_encrypted_key());
        assert!(err.is_format_error());
        assert!(!CertificateError::KeyDecodeFailure.is_encrypted_key());
    }

    #[test]
    fn test_error_display() {
        let err = CertificateError::InvalidConfig {
            var_name: "PUSH_CERT_PEM_MIN_LEN".to_string(),
            reason: "invalid digit found in string".to_string(),
        };
        assert!(err.to_string().contains("PUSH_CERT_PEM_MIN_LEN"));
        assert!(!err.is_format_error());

        let err = CertificateError::corrupt("PKCS#1 DER", "expected INTEGER tag, found 0x04");
        assert_eq!(
            err.to_string(),
            "Corrupt PKCS#1 DER private key: expected INTEGER tag, found 0x04"
        );
    }
}
