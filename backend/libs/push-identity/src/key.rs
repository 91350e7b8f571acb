//! Private key sniff strategies for a separately supplied key buffer

use crate::armor::{self, ENCRYPTED_PRIVATE_KEY, PRIVATE_KEY, RSA_PRIVATE_KEY};
use crate::bundle::KeySource;
use crate::container;
use crate::error::CertificateError;
use crate::pkcs1;
use crate::sniff::Sniff;
use rsa::pkcs8::DecodePrivateKey;
use rsa::RsaPrivateKey;
use tracing::debug;

const FORMAT_PKCS1_PEM: &str = "PKCS#1 PEM";
const FORMAT_PKCS8_PEM: &str = "PKCS#8 PEM";

/// Leading characters of every PEM begin line
const PEM_MARKER: &[u8] = b"--";

pub(crate) type ResolvedKey = (RsaPrivateKey, KeySource);

/// PEM text holding an `RSA PRIVATE KEY` or `PRIVATE KEY` section
pub(crate) fn sniff_pem(buf: &[u8], min_len: usize) -> Sniff<ResolvedKey> {
    if buf.len() <= min_len || !buf.starts_with(PEM_MARKER) {
        return Sniff::NoMatch;
    }
    let Ok(text) = std::str::from_utf8(buf) else {
        return Sniff::NoMatch;
    };

    if armor::has_section(text, ENCRYPTED_PRIVATE_KEY) {
        return Sniff::Failed(CertificateError::UnsupportedEncryptedKey {
            format: FORMAT_PKCS8_PEM,
        });
    }

    match Sniff::from(armor::find_section(text, RSA_PRIVATE_KEY, FORMAT_PKCS1_PEM)) {
        Sniff::Matched(der) => {
            return match pkcs1::sniff_private_key(&der, FORMAT_PKCS1_PEM) {
                Sniff::NoMatch => Sniff::Failed(CertificateError::corrupt(
                    FORMAT_PKCS1_PEM,
                    "section body is not an RSAPrivateKey structure",
                )),
                other => other.map(|key| (key, KeySource::Pkcs1Pem)),
            };
        }
        Sniff::Failed(err) => return Sniff::Failed(err),
        Sniff::NoMatch => {}
    }

    Sniff::from(armor::find_section(text, PRIVATE_KEY, FORMAT_PKCS8_PEM))
        .and_then(|der| {
            RsaPrivateKey::from_pkcs8_der(&der)
                .map_err(|e| CertificateError::corrupt(FORMAT_PKCS8_PEM, e.to_string()))
        })
        .map(|key| (key, KeySource::Pkcs8Pem))
}

/// Raw PKCS#1 DER
pub(crate) fn sniff_der(buf: &[u8]) -> Sniff<ResolvedKey> {
    pkcs1::sniff_private_key(buf, pkcs1::FORMAT_DER).map(|key| (key, KeySource::Pkcs1Der))
}

/// A certificate container that carries its own private key
pub(crate) fn sniff_container(buf: &[u8], passphrase: &str) -> Sniff<ResolvedKey> {
    match container::parse(buf, passphrase) {
        Ok(container::Container {
            private_key: Some(key),
            format,
            ..
        }) => {
            debug!(container_format = %format, "Key buffer is a certificate container");
            Sniff::Matched((key, KeySource::NestedContainer))
        }
        Ok(_) => {
            debug!("Key buffer is a certificate container without a private key");
            Sniff::NoMatch
        }
        Err(_) => Sniff::NoMatch,
    }
}
