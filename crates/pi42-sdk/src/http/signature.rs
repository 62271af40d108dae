/*
[INPUT]:  API credentials and canonical request payloads
[OUTPUT]: Hex-encoded HMAC-SHA256 signatures
[POS]:    HTTP layer - request signing for authenticated endpoints
[UPDATE]: When changing signing algorithm or header format
*/

use std::fmt;

use hmac::{Hmac, Mac};
use sha2::Sha256;

use crate::http::{Pi42Error, Result};

type HmacSha256 = Hmac<Sha256>;

/// Header carrying the API key
pub const API_KEY_HEADER: &str = "api-key";
/// Header carrying the request signature
pub const SIGNATURE_HEADER: &str = "signature";

/// Compute the hex HMAC-SHA256 of `payload` keyed by `secret`.
///
/// Refuses to sign with an empty secret.
pub fn sign_payload(secret: &str, payload: &str) -> Result<String> {
    if secret.is_empty() {
        return Err(Pi42Error::Config(
            "API secret is required for authenticated endpoints".to_string(),
        ));
    }
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes())
        .map_err(|e| Pi42Error::Config(format!("invalid API secret: {e}")))?;
    mac.update(payload.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// API key pair used for authenticated requests
#[derive(Clone)]
pub struct Credentials {
    pub api_key: String,
    api_secret: String,
}

impl Credentials {
    pub fn new(api_key: impl Into<String>, api_secret: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            api_secret: api_secret.into(),
        }
    }

    /// Both key and secret are present
    pub fn is_usable(&self) -> bool {
        !self.api_key.is_empty() && !self.api_secret.is_empty()
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("api_key", &self.api_key)
            .field("api_secret", &"<redacted>")
            .finish()
    }
}

/// Signs canonical request payloads with the held credentials
#[derive(Debug, Clone)]
pub struct RequestSigner {
    credentials: Credentials,
}

impl RequestSigner {
    pub fn new(credentials: Credentials) -> Self {
        Self { credentials }
    }

    pub fn api_key(&self) -> &str {
        &self.credentials.api_key
    }

    /// Sign a canonical payload (query string or compact JSON body)
    pub fn sign(&self, payload: &str) -> Result<String> {
        if self.credentials.api_key.is_empty() {
            return Err(Pi42Error::Config(
                "API key is required for authenticated endpoints".to_string(),
            ));
        }
        sign_payload(&self.credentials.api_secret, payload)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sign_known_vector() {
        // RFC 4231 test case 2
        let signature = sign_payload("Jefe", "what do ya want for nothing?").unwrap();
        assert_eq!(
            signature,
            "5bdcc146bf60754e6a042426089575c75a003f089d2739839dec58b964ec3843"
        );
    }

    #[test]
    fn test_sign_is_deterministic() {
        let payload = r#"{"symbol":"BTCINR","timestamp":"1700000000000"}"#;
        let first = sign_payload("secret", payload).unwrap();
        let second = sign_payload("secret", payload).unwrap();
        assert_eq!(first, second);
        assert_eq!(first.len(), 64);
        assert_ne!(first, sign_payload("other", payload).unwrap());
    }

    #[test]
    fn test_empty_secret_rejected() {
        let err = sign_payload("", "timestamp=1").unwrap_err();
        assert!(err.is_config_error());

        let signer = RequestSigner::new(Credentials::new("key", ""));
        assert!(signer.sign("timestamp=1").unwrap_err().is_config_error());
    }

    #[test]
    fn test_credentials_debug_redacts_secret() {
        let credentials = Credentials::new("my-key", "super-secret");
        let rendered = format!("{credentials:?}");
        assert!(rendered.contains("my-key"));
        assert!(!rendered.contains("super-secret"));
    }
}
