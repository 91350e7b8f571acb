//! Certificate container parsing
//!
//! A caller-supplied certificate buffer may be a PKCS#12 archive (certificate
//! plus key), a bare X.509 certificate in DER, or PEM text with a
//! `CERTIFICATE` section. Formats are tried in that order.

use crate::error::{CertificateError, CertificateResult};
use p12_keystore::{KeyStore, KeyStoreEntry};
use rsa::pkcs8::{DecodePrivateKey, DecodePublicKey};
use rsa::{RsaPrivateKey, RsaPublicKey};
use std::fmt;
use tracing::{debug, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum ContainerFormat {
    Pkcs12,
    Der,
    Pem,
}

impl fmt::Display for ContainerFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            ContainerFormat::Pkcs12 => "pkcs12",
            ContainerFormat::Der => "der",
            ContainerFormat::Pem => "pem",
        })
    }
}

/// Attributes read from a parsed X.509 certificate
#[derive(Debug, Clone)]
pub(crate) struct CertificateInfo {
    pub der: Vec<u8>,
    pub subject: String,
    pub common_name: Option<String>,
    pub not_after: i64,
    /// `None` when the certificate key is not RSA
    pub public_key: Option<RsaPublicKey>,
}

impl CertificateInfo {
    pub(crate) fn from_der(der: &[u8]) -> Result<Self, String> {
        let (rest, cert) = x509_parser::parse_x509_certificate(der).map_err(|e| e.to_string())?;
        let der = der[..der.len() - rest.len()].to_vec();

        let subject = cert.subject().to_string();
        let common_name = cert
            .subject()
            .iter_common_name()
            .next()
            .and_then(|cn| cn.as_str().ok())
            .map(str::to_string);
        let not_after = cert.validity().not_after.timestamp();
        let public_key = RsaPublicKey::from_public_key_der(cert.public_key().raw).ok();

        Ok(Self {
            der,
            subject,
            common_name,
            not_after,
            public_key,
        })
    }
}

/// A parsed certificate buffer
#[derive(Debug)]
pub(crate) struct Container {
    pub format: ContainerFormat,
    pub certificate: CertificateInfo,
    pub private_key: Option<RsaPrivateKey>,
}

/// Parse `buf` as the first container format that accepts it
pub(crate) fn parse(buf: &[u8], passphrase: &str) -> CertificateResult<Container> {
    let mut reasons = Vec::with_capacity(3);

    match from_pkcs12(buf, passphrase) {
        Ok(container) => return Ok(container),
        Err(reason) => reasons.push(format!("pkcs12: {reason}")),
    }

    match CertificateInfo::from_der(buf) {
        Ok(certificate) => {
            return Ok(Container {
                format: ContainerFormat::Der,
                certificate,
                private_key: None,
            })
        }
        Err(reason) => reasons.push(format!("der: {reason}")),
    }

    match from_pem(buf) {
        Ok(container) => return Ok(container),
        Err(reason) => reasons.push(format!("pem: {reason}")),
    }

    debug!(reasons = ?reasons, "Buffer is not a certificate container");
    Err(CertificateError::MalformedContainer {
        reason: reasons.join("; "),
    })
}

fn from_pkcs12(buf: &[u8], passphrase: &str) -> Result<Container, String> {
    let store = KeyStore::from_pkcs12(buf, passphrase).map_err(|e| e.to_string())?;

    if let Some((alias, chain)) = store.private_key_chain() {
        let leaf = chain
            .chain()
            .first()
            .ok_or_else(|| format!("key chain '{alias}' holds no certificate"))?;
        let certificate = CertificateInfo::from_der(leaf.as_der())?;

        let private_key = match RsaPrivateKey::from_pkcs8_der(chain.key()) {
            Ok(key) => Some(key),
            Err(e) => {
                warn!(
                    alias = %alias,
                    error = %e,
                    "PKCS#12 private key is not a usable RSA key"
                );
                None
            }
        };

        return Ok(Container {
            format: ContainerFormat::Pkcs12,
            certificate,
            private_key,
        });
    }

    let der = store
        .entries()
        .find_map(|(_, entry)| match entry {
            KeyStoreEntry::Certificate(cert) => Some(cert.as_der()),
            KeyStoreEntry::PrivateKeyChain(_) => None,
        })
        .ok_or_else(|| "archive holds no certificate".to_string())?;

    Ok(Container {
        format: ContainerFormat::Pkcs12,
        certificate: CertificateInfo::from_der(der)?,
        private_key: None,
    })
}

fn from_pem(buf: &[u8]) -> Result<Container, String> {
    let sections = pem::parse_many(buf).map_err(|e| e.to_string())?;
    let section = sections
        .iter()
        .find(|p| p.tag() == "CERTIFICATE")
        .ok_or_else(|| "no CERTIFICATE section".to_string())?;

    Ok(Container {
        format: ContainerFormat::Pem,
        certificate: CertificateInfo::from_der(section.contents())?,
        private_key: None,
    })
}
