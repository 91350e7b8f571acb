use crate::error::{CertificateError, CertificateResult};

/// Default minimum key buffer length before PEM sniffing is attempted
pub const DEFAULT_PEM_MIN_LEN: usize = 100;

/// Certificate decoder configuration
#[derive(Debug, Clone)]
pub struct DecoderConfig {
    /// Passphrase used to open PKCS#12 archives
    pub pkcs12_passphrase: String,
    /// Key buffers up to this length are never treated as PEM
    pub pem_min_len: usize,
    /// Reject keys whose public half differs from the certificate's
    pub verify_key_match: bool,
}

impl Default for DecoderConfig {
    fn default() -> Self {
        Self {
            pkcs12_passphrase: String::new(),
            pem_min_len: DEFAULT_PEM_MIN_LEN,
            verify_key_match: true,
        }
    }
}

impl DecoderConfig {
    /// Create configuration with defaults (passwordless archives, key matching on)
    pub fn new() -> Self {
        Self::default()
    }

    /// Set PKCS#12 passphrase
    pub fn with_passphrase(mut self, passphrase: impl Into<String>) -> Self {
        self.pkcs12_passphrase = passphrase.into();
        self
    }

    /// Set minimum PEM sniff length
    pub fn with_pem_min_len(mut self, pem_min_len: usize) -> Self {
        self.pem_min_len = pem_min_len;
        self
    }

    /// Enable or disable the key/certificate match check
    pub fn with_key_match_verification(mut self, verify: bool) -> Self {
        self.verify_key_match = verify;
        self
    }

    /// Load configuration from environment variables
    ///
    /// **Environment Variables**:
    /// - `PUSH_CERT_PASSPHRASE`: PKCS#12 passphrase (default: empty)
    /// - `PUSH_CERT_PEM_MIN_LEN`: minimum PEM sniff length (default: 100)
    /// - `PUSH_CERT_VERIFY_KEY_MATCH`: `true`/`false` (default: true)
    pub fn from_env() -> CertificateResult<Self> {
        let defaults = Self::default();

        let pkcs12_passphrase =
            std::env::var("PUSH_CERT_PASSPHRASE").unwrap_or(defaults.pkcs12_passphrase);

        let pem_min_len = match std::env::var("PUSH_CERT_PEM_MIN_LEN") {
            Ok(raw) => raw
                .trim()
                .parse::<usize>()
                .map_err(|e| CertificateError::InvalidConfig {
                    var_name: "PUSH_CERT_PEM_MIN_LEN".to_string(),
                    reason: e.to_string(),
                })?,
            Err(_) => defaults.pem_min_len,
        };

        let verify_key_match = match std::env::var("PUSH_CERT_VERIFY_KEY_MATCH") {
            Ok(raw) => raw
                .trim()
                .parse::<bool>()
                .map_err(|e| CertificateError::InvalidConfig {
                    var_name: "PUSH_CERT_VERIFY_KEY_MATCH".to_string(),
                    reason: e.to_string(),
                })?,
            Err(_) => defaults.verify_key_match,
        };

        Ok(Self {
            pkcs12_passphrase,
            pem_min_len,
            verify_key_match,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;

    fn clear_env() {
        std::env::remove_var("PUSH_CERT_PASSPHRASE");
        std::env::remove_var("PUSH_CERT_PEM_MIN_LEN");
        std::env::remove_var("PUSH_CERT_VERIFY_KEY_MATCH");
    }

    #[test]
    fn test_default_config() {
        let cfg = DecoderConfig::default();
        assert_eq!(cfg.pkcs12_passphrase, "");
        assert_eq!(cfg.pem_min_len, 100);
        assert!(cfg.verify_key_match);
    }

    #[test]
    fn test_builder() {
        let cfg = DecoderConfig::new()
            .with_passphrase("changeit")
            .with_pem_min_len(0)
            .with_key_match_verification(false);

        assert_eq!(cfg.pkcs12_passphrase, "changeit");
        assert_eq!(cfg.pem_min_len, 0);
        assert!(!cfg.verify_key_match);
    }

    #[test]
    #[serial]
    fn test_from_env_defaults() {
        clear_env();
        let cfg = DecoderConfig::from_env().unwrap();
        assert_eq!(cfg.pkcs12_passphrase, "");
        assert_eq!(cfg.pem_min_len, DEFAULT_PEM_MIN_LEN);
        assert!(cfg.verify_key_match);
    }

    #[test]
    #[serial]
    fn test_from_env_overrides() {
        clear_env();
        std::env::set_var("PUSH_CERT_PASSPHRASE", "1234");
        std::env::set_var("PUSH_CERT_PEM_MIN_LEN", "64");
        std::env::set_var("PUSH_CERT_VERIFY_KEY_MATCH", "false");

        let cfg = DecoderConfig::from_env().unwrap();
        assert_eq!(cfg.pkcs12_passphrase, "1234");
        assert_eq!(cfg.pem_min_len, 64);
        assert!(!cfg.verify_key_match);

        clear_env();
    }

    #[test]
    #[serial]
    fn test_from_env_invalid_value() {
        clear_env();
        std::env::set_var("PUSH_CERT_PEM_MIN_LEN", "lots");

        let err = DecoderConfig::from_env().unwrap_err();
        assert!(matches!(
            err,
            CertificateError::InvalidConfig { ref var_name, .. } if var_name == "PUSH_CERT_PEM_MIN_LEN"
        ));

        clear_env();
    }
}
