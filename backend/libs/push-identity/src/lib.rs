//! Push Identity Library
//!
//! Turns certificate and private key buffers received with a push request
//! into a [`CertificateBundle`] usable for certificate-based provider
//! authentication.
//!
//! **Supported inputs**:
//! - Certificate: PKCS#12 archive, X.509 DER, or PEM `CERTIFICATE` text
//! - Key: embedded in the PKCS#12 archive, PEM (`RSA PRIVATE KEY` or
//!   `PRIVATE KEY`), raw PKCS#1 DER, or a second PKCS#12 archive
//!
//! Password protected keys are rejected with
//! [`CertificateError::UnsupportedEncryptedKey`].
//!
//! ```no_run
//! use push_identity::{CertificateDecoder, DecoderConfig};
//!
//! # fn run(cert: &[u8], key: &[u8]) -> push_identity::CertificateResult<()> {
//! let decoder = CertificateDecoder::new(DecoderConfig::from_env()?);
//! let bundle = decoder.decode(cert, Some(key))?;
//! println!("{} {}", bundle.thumbprint(), bundle.subject());
//! # Ok(())
//! # }
//! ```

mod armor;
mod container;
mod key;
mod pkcs1;
mod sniff;

pub mod bundle;
pub mod config;
pub mod decoder;
pub mod error;

pub use bundle::{CertificateBundle, KeySource};
pub use config::DecoderConfig;
pub use decoder::{decode, CertificateDecoder};
pub use error::{CertificateError, CertificateResult};
