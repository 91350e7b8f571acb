use crate::bundle::{CertificateBundle, KeySource};
use crate::config::DecoderConfig;
use crate::container::{self, CertificateInfo};
use crate::error::{CertificateError, CertificateResult};
use crate::key::{self, ResolvedKey};
use rsa::traits::PublicKeyParts;
use rsa::RsaPrivateKey;
use tracing::{debug, info};

/// Decodes certificate and private key buffers into a [`CertificateBundle`]
///
/// The decoder holds no state besides its configuration and may be shared
/// freely between threads.
#[derive(Debug, Clone, Default)]
pub struct CertificateDecoder {
    config: DecoderConfig,
}

impl CertificateDecoder {
    pub fn new(config: DecoderConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &DecoderConfig {
        &self.config
    }

    /// Decode `cert`, taking the private key from the certificate container
    /// itself or else from `key`
    ///
    /// When the container already carries a key, `key` is ignored. Otherwise
    /// `key` is tried as PEM, then raw PKCS#1 DER, then as a second
    /// certificate container.
    pub fn decode(&self, cert: &[u8], key: Option<&[u8]>) -> CertificateResult<CertificateBundle> {
        let container = container::parse(cert, &self.config.pkcs12_passphrase)?;
        debug!(
            container_format = %container.format,
            subject = %container.certificate.subject,
            embedded_key = container.private_key.is_some(),
            "Parsed certificate container"
        );

        let (private_key, key_source) = match container.private_key {
            Some(private_key) => {
                if key.is_some() {
                    debug!("Certificate container carries a key, ignoring separate key buffer");
                }
                (private_key, KeySource::Container)
            }
            None => {
                let key = key.ok_or_else(|| CertificateError::MissingPrivateKey {
                    subject: container.certificate.subject.clone(),
                })?;
                self.resolve_key(key)?
            }
        };

        if self.config.verify_key_match {
            verify_key_match(&container.certificate, &private_key)?;
        }

        let CertificateInfo {
            der,
            subject,
            common_name,
            not_after,
            ..
        } = container.certificate;
        let bundle = CertificateBundle::new(der, subject, common_name, not_after, private_key, key_source);

        info!(
            thumbprint = %bundle.thumbprint(),
            subject = %bundle.subject(),
            key_source = %key_source,
            "Decoded certificate bundle"
        );

        Ok(bundle)
    }

    fn resolve_key(&self, key: &[u8]) -> CertificateResult<ResolvedKey> {
        if let Some(found) = key::sniff_pem(key, self.config.pem_min_len).into_result()? {
            return Ok(found);
        }
        debug!(len = key.len(), "Key buffer is not PEM");

        if let Some(found) = key::sniff_der(key).into_result()? {
            return Ok(found);
        }
        debug!(len = key.len(), "Key buffer is not PKCS#1 DER");

        if let Some(found) = key::sniff_container(key, &self.config.pkcs12_passphrase).into_result()? {
            return Ok(found);
        }
        debug!(len = key.len(), "Key buffer is not a certificate container with a key");

        Err(CertificateError::KeyDecodeFailure)
    }
}

fn verify_key_match(certificate: &CertificateInfo, private_key: &RsaPrivateKey) -> CertificateResult<()> {
    let matches = certificate
        .public_key
        .as_ref()
        .is_some_and(|public| public.n() == private_key.n() && public.e() == private_key.e());

    if matches {
        Ok(())
    } else {
        Err(CertificateError::KeyMismatch {
            subject: certificate.subject.clone(),
        })
    }
}

/// Decode with the default configuration
pub fn decode(cert: &[u8], key: Option<&[u8]>) -> CertificateResult<CertificateBundle> {
    CertificateDecoder::default().decode(cert, key)
}
