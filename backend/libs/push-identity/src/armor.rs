//! Line scanner for PEM armored private key sections
//!
//! Private key PEM is read by hand rather than with the `pem` crate so that
//! RFC 1421 headers (`Proc-Type`, `DEK-Info`) can be inspected and encrypted
//! keys rejected explicitly.

use crate::error::{CertificateError, CertificateResult};
use base64::engine::general_purpose::STANDARD;
use base64::Engine;

const BEGIN: &str = "-----BEGIN ";
const END: &str = "-----END";

/// Label of legacy PKCS#1 sections
pub(crate) const RSA_PRIVATE_KEY: &str = "RSA PRIVATE KEY";
/// Label of unencrypted PKCS#8 sections
pub(crate) const PRIVATE_KEY: &str = "PRIVATE KEY";
/// Label of password protected PKCS#8 sections
pub(crate) const ENCRYPTED_PRIVATE_KEY: &str = "ENCRYPTED PRIVATE KEY";

fn begin_label(line: &str) -> Option<&str> {
    line.strip_prefix(BEGIN)
        .map(|rest| rest.trim_end_matches('-').trim())
}

fn is_encryption_header(line: &str) -> bool {
    let upper = line.to_ascii_uppercase();
    upper.starts_with("PROC-TYPE:") && upper.contains("ENCRYPTED")
}

/// Check whether any BEGIN line in `text` carries `label`
pub(crate) fn has_section(text: &str, label: &str) -> bool {
    text.lines()
        .filter_map(|line| begin_label(line.trim()))
        .any(|found| found.eq_ignore_ascii_case(label))
}

/// Decode the body of the first section labeled `label`
///
/// Returns `Ok(None)` when no such section exists. Lines containing a colon
/// inside the section are headers and are skipped, except an encryption
/// header which fails with [`CertificateError::UnsupportedEncryptedKey`].
pub(crate) fn find_section(
    text: &str,
    label: &str,
    format: &'static str,
) -> CertificateResult<Option<Vec<u8>>> {
    let mut body: Option<String> = None;

    for line in text.lines() {
        let line = line.trim();

        match body.as_mut() {
            None => {
                if begin_label(line).is_some_and(|found| found.eq_ignore_ascii_case(label)) {
                    body = Some(String::new());
                }
            }
            Some(data) => {
                if line.starts_with(END) {
                    let der = STANDARD
                        .decode(data.as_bytes())
                        .map_err(|e| CertificateError::corrupt(format, e.to_string()))?;
                    return Ok(Some(der));
                }
                if line.contains(':') {
                    if is_encryption_header(line) {
                        return Err(CertificateError::UnsupportedEncryptedKey { format });
                    }
                    continue;
                }
                data.push_str(line);
            }
        }
    }

    match body {
        Some(_) => Err(CertificateError::corrupt(
            format,
            format!("missing END line for {label} section"),
        )),
        None => Ok(None),
    }
}
