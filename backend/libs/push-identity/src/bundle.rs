use crate::error::{CertificateError, CertificateResult};
use pem::{EncodeConfig, Pem};
use rsa::pkcs1::{EncodeRsaPrivateKey, LineEnding};
use rsa::RsaPrivateKey;
use sha1::{Digest, Sha1};
use sha2::Sha256;
use std::fmt;

/// Where the private key of a bundle was found
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum KeySource {
    /// Shipped inside the certificate container (PKCS#12)
    Container,
    /// `RSA PRIVATE KEY` PEM section
    Pkcs1Pem,
    /// `PRIVATE KEY` PEM section
    Pkcs8Pem,
    /// Raw PKCS#1 DER
    Pkcs1Der,
    /// Key buffer was itself a certificate container holding a key
    NestedContainer,
}

impl KeySource {
    pub fn as_str(&self) -> &'static str {
        match self {
            KeySource::Container => "container",
            KeySource::Pkcs1Pem => "pkcs1_pem",
            KeySource::Pkcs8Pem => "pkcs8_pem",
            KeySource::Pkcs1Der => "pkcs1_der",
            KeySource::NestedContainer => "nested_container",
        }
    }
}

impl fmt::Display for KeySource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Certificate together with its resolved RSA private key
///
/// A bundle only exists once a usable private key has been found. The SHA-1
/// thumbprint is the stable identity used to share provider connections
/// between requests signed with the same certificate.
#[derive(Clone)]
pub struct CertificateBundle {
    certificate_der: Vec<u8>,
    subject: String,
    common_name: Option<String>,
    not_after: i64,
    private_key: RsaPrivateKey,
    key_source: KeySource,
    thumbprint: String,
    sha256_fingerprint: String,
}

impl CertificateBundle {
    pub(crate) fn new(
        certificate_der: Vec<u8>,
        subject: String,
        common_name: Option<String>,
        not_after: i64,
        private_key: RsaPrivateKey,
        key_source: KeySource,
    ) -> Self {
        let thumbprint = hex::encode_upper(Sha1::digest(&certificate_der));
        let sha256_fingerprint = hex::encode(Sha256::digest(&certificate_der));

        Self {
            certificate_der,
            subject,
            common_name,
            not_after,
            private_key,
            key_source,
            thumbprint,
            sha256_fingerprint,
        }
    }

    /// Uppercase hex SHA-1 of the certificate DER
    pub fn thumbprint(&self) -> &str {
        &self.thumbprint
    }

    /// Lowercase hex SHA-256 of the certificate DER
    pub fn sha256_fingerprint(&self) -> &str {
        &self.sha256_fingerprint
    }

    /// Subject distinguished name, e.g. `CN=Unit Test, O=PushMQ`
    pub fn subject(&self) -> &str {
        &self.subject
    }

    pub fn common_name(&self) -> Option<&str> {
        self.common_name.as_deref()
    }

    /// Expiry as a Unix timestamp
    pub fn not_after(&self) -> i64 {
        self.not_after
    }

    /// Check if the certificate is still valid at `unix_time`
    pub fn is_valid_at(&self, unix_time: i64) -> bool {
        unix_time <= self.not_after
    }

    pub fn key_source(&self) -> KeySource {
        self.key_source
    }

    pub fn certificate_der(&self) -> &[u8] {
        &self.certificate_der
    }

    pub fn private_key(&self) -> &RsaPrivateKey {
        &self.private_key
    }

    /// Always true; decoding fails instead of producing a bundle without a key
    pub fn has_private_key(&self) -> bool {
        true
    }

    /// Certificate followed by the PKCS#1 key, as PEM text
    ///
    /// This is the identity format most TLS client libraries accept for
    /// certificate-based provider authentication.
    pub fn identity_pem(&self) -> CertificateResult<String> {
        let mut out = pem::encode_config(
            &Pem::new("CERTIFICATE", self.certificate_der.clone()),
            EncodeConfig::new().set_line_ending(pem::LineEnding::LF),
        );
        let key_pem = self
            .private_key
            .to_pkcs1_pem(LineEnding::LF)
            .map_err(|e| CertificateError::corrupt("PKCS#1 PEM", e.to_string()))?;
        out.push_str(&key_pem);
        Ok(out)
    }
}

impl fmt::Debug for CertificateBundle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CertificateBundle")
            .field("subject", &self.subject)
            .field("thumbprint", &self.thumbprint)
            .field("not_after", &self.not_after)
            .field("key_source", &self.key_source)
            .finish_non_exhaustive()
    }
}
