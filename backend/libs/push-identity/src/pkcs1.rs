//! PKCS#1 `RSAPrivateKey` reader
//!
//! ```text
//! RSAPrivateKey ::= SEQUENCE {
//!     version           INTEGER (0),
//!     modulus           INTEGER,
//!     publicExponent    INTEGER,
//!     privateExponent   INTEGER,
//!     prime1            INTEGER,
//!     prime2            INTEGER,
//!     exponent1         INTEGER,
//!     exponent2         INTEGER,
//!     coefficient       INTEGER }
//! ```
//!
//! A buffer whose SEQUENCE header or version does not look like the above is
//! not a PKCS#1 key. Once both have matched, any further problem is corruption.

use crate::error::{CertificateError, CertificateResult};
use crate::sniff::Sniff;
use rsa::traits::PrivateKeyParts;
use rsa::{BigUint, RsaPrivateKey};

const TAG_SEQUENCE: u8 = 0x30;
const TAG_INTEGER: u8 = 0x02;
const VERSION_ZERO: [u8; 3] = [TAG_INTEGER, 0x01, 0x00];

/// Label used in error messages for keys read from raw DER
pub(crate) const FORMAT_DER: &str = "PKCS#1 DER";

struct DerReader<'a> {
    buf: &'a [u8],
    pos: usize,
}

impl<'a> DerReader<'a> {
    fn new(buf: &'a [u8]) -> Self {
        Self { buf, pos: 0 }
    }

    fn read_u8(&mut self) -> Option<u8> {
        let byte = *self.buf.get(self.pos)?;
        self.pos += 1;
        Some(byte)
    }

    fn take(&mut self, len: usize) -> Option<&'a [u8]> {
        let end = self.pos.checked_add(len)?;
        let slice = self.buf.get(self.pos..end)?;
        self.pos = end;
        Some(slice)
    }

    /// Outer SEQUENCE tag plus a short-form or 1-2 byte long-form length
    fn sequence_header(&mut self) -> Option<()> {
        if self.read_u8()? != TAG_SEQUENCE {
            return None;
        }
        match self.read_u8()? {
            len if len < 0x80 => {}
            0x81 => {
                self.read_u8()?;
            }
            0x82 => {
                self.take(2)?;
            }
            _ => return None,
        }
        Some(())
    }

    fn version_zero(&mut self) -> Option<()> {
        (self.take(VERSION_ZERO.len())? == VERSION_ZERO).then_some(())
    }

    /// Read one INTEGER and return its magnitude with sign-guard zeros removed
    fn integer(&mut self, field: &str, format: &'static str) -> CertificateResult<&'a [u8]> {
        let truncated = || CertificateError::corrupt(format, format!("{field} is truncated"));

        let tag = self.read_u8().ok_or_else(truncated)?;
        if tag != TAG_INTEGER {
            return Err(CertificateError::corrupt(
                format,
                format!("expected INTEGER tag for {field}, found 0x{tag:02x}"),
            ));
        }

        let len = match self.read_u8().ok_or_else(truncated)? {
            0x81 => self.read_u8().ok_or_else(truncated)? as usize,
            0x82 => {
                let bytes = self.take(2).ok_or_else(truncated)?;
                u16::from_be_bytes([bytes[0], bytes[1]]) as usize
            }
            len if len < 0x80 => len as usize,
            other => {
                return Err(CertificateError::corrupt(
                    format,
                    format!("unsupported length encoding 0x{other:02x} for {field}"),
                ))
            }
        };

        let mut value = self.take(len).ok_or_else(truncated)?;
        while let [0x00, rest @ ..] = value {
            value = rest;
        }
        Ok(value)
    }
}

/// Raw big-endian fields of a PKCS#1 key, borrowed from the input buffer
#[derive(Debug)]
pub(crate) struct RsaKeyFields<'a> {
    pub modulus: &'a [u8],
    pub public_exponent: &'a [u8],
    pub private_exponent: &'a [u8],
    pub prime1: &'a [u8],
    pub prime2: &'a [u8],
    pub exponent1: &'a [u8],
    pub exponent2: &'a [u8],
    pub coefficient: &'a [u8],
}

impl RsaKeyFields<'_> {
    /// Build the key and check the stored CRT values against the primes
    pub(crate) fn into_private_key(self, format: &'static str) -> CertificateResult<RsaPrivateKey> {
        let key = RsaPrivateKey::from_components(
            BigUint::from_bytes_be(self.modulus),
            BigUint::from_bytes_be(self.public_exponent),
            BigUint::from_bytes_be(self.private_exponent),
            vec![
                BigUint::from_bytes_be(self.prime1),
                BigUint::from_bytes_be(self.prime2),
            ],
        )
        .map_err(|e| CertificateError::corrupt(format, e.to_string()))?;

        let dp = BigUint::from_bytes_be(self.exponent1);
        let dq = BigUint::from_bytes_be(self.exponent2);
        let qinv = BigUint::from_bytes_be(self.coefficient);

        if key.dp() != Some(&dp) || key.dq() != Some(&dq) {
            return Err(CertificateError::corrupt(
                format,
                "exponent1/exponent2 do not match the primes",
            ));
        }
        if key.crt_coefficient().as_ref() != Some(&qinv) {
            return Err(CertificateError::corrupt(
                format,
                "coefficient does not match the primes",
            ));
        }

        Ok(key)
    }
}

/// Read the PKCS#1 field layout from `der`
pub(crate) fn read_fields<'a>(
    der: &'a [u8],
    format: &'static str,
) -> CertificateResult<Option<RsaKeyFields<'a>>> {
    let mut reader = DerReader::new(der);
    if reader.sequence_header().is_none() || reader.version_zero().is_none() {
        return Ok(None);
    }

    Ok(Some(RsaKeyFields {
        modulus: reader.integer("modulus", format)?,
        public_exponent: reader.integer("publicExponent", format)?,
        private_exponent: reader.integer("privateExponent", format)?,
        prime1: reader.integer("prime1", format)?,
        prime2: reader.integer("prime2", format)?,
        exponent1: reader.integer("exponent1", format)?,
        exponent2: reader.integer("exponent2", format)?,
        coefficient: reader.integer("coefficient", format)?,
    }))
}

/// Probe `der` for a PKCS#1 RSA private key
pub(crate) fn sniff_private_key(der: &[u8], format: &'static str) -> Sniff<RsaPrivateKey> {
    Sniff::from(read_fields(der, format)).and_then(|fields| fields.into_private_key(format))
}
