//! Signed, single-use tokens for temporary access to local files.
//!
//! A token is `base64url(path_id:issued_at:nonce:signature)` where the
//! signature is HMAC-SHA256 over `path_id:issued_at:nonce`.

use std::time::Duration;

use chrono::Utc;
use hmac::{Hmac, Mac};
use moka::sync::Cache;
use sha2::Sha256;

use super::disposition::quote;
use super::error::UploadError;

type HmacSha256 = Hmac<Sha256>;

const MAX_REMEMBERED_TOKENS: u64 = 100_000;

/// Route prefix for temporary access URLs.
pub const TEMPORARY_URL_PREFIX: &str = "/user_uploads/temporary/";

/// Signs and verifies temporary access tokens.
#[derive(Clone)]
pub struct AccessTokenSigner {
    mac: HmacSha256,
    max_age: Duration,
    consumed: Cache<String, ()>,
}

impl std::fmt::Debug for AccessTokenSigner {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AccessTokenSigner")
            .field("max_age", &self.max_age)
            .finish_non_exhaustive()
    }
}

impl AccessTokenSigner {
    /// Creates a signer.
    ///
    /// # Errors
    ///
    /// Returns `Configuration` for an empty secret.
    pub fn new(secret: &str, max_age: Duration) -> Result<Self, UploadError> {
        if secret.is_empty() {
            return Err(UploadError::configuration("upload access token secret is empty"));
        }
        let mac = HmacSha256::new_from_slice(secret.as_bytes())
            .map_err(|e| UploadError::configuration(e.to_string()))?;

        Ok(Self {
            mac,
            max_age,
            consumed: Cache::builder()
                .max_capacity(MAX_REMEMBERED_TOKENS)
                .time_to_live(max_age)
                .build(),
        })
    }

    /// Issues a token for `path_id`.
    #[must_use]
    pub fn sign(&self, path_id: &str) -> String {
        self.sign_at(path_id, Utc::now().timestamp())
    }

    fn sign_at(&self, path_id: &str, issued_at: i64) -> String {
        let nonce: [u8; 16] = rand::random();
        let payload = format!("{path_id}:{issued_at}:{}", base64_url::encode(&nonce));
        let signature = base64_url::encode(&self.signature(&payload));
        base64_url::encode(&format!("{payload}:{signature}"))
    }

    /// Returns the path id of a token with a valid signature that has not
    /// expired. Does not check or record use.
    #[must_use]
    pub fn verify(&self, token: &str) -> Option<String> {
        let decoded = String::from_utf8(base64_url::decode(token).ok()?).ok()?;
        let (payload, signature) = decoded.rsplit_once(':')?;
        let signature = base64_url::decode(signature).ok()?;

        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.verify_slice(&signature).ok()?;

        let mut parts = payload.rsplitn(3, ':');
        let _nonce = parts.next()?;
        let issued_at: i64 = parts.next()?.parse().ok()?;
        let path_id = parts.next()?;

        let age = Utc::now().timestamp() - issued_at;
        let max_age = i64::try_from(self.max_age.as_secs()).unwrap_or(i64::MAX);
        if !(0..=max_age).contains(&age) {
            return None;
        }

        Some(path_id.to_string())
    }

    /// Marks `token` as used. Returns `false` if it already was.
    pub fn consume(&self, token: &str) -> bool {
        self.consumed
            .entry(token.to_string())
            .or_insert(())
            .is_fresh()
    }

    fn signature(&self, payload: &str) -> Vec<u8> {
        let mut mac = self.mac.clone();
        mac.update(payload.as_bytes());
        mac.finalize().into_bytes().to_vec()
    }
}

/// Temporary URL serving `file_name` through `token`.
#[must_use]
pub fn access_url(token: &str, file_name: &str) -> String {
    format!("{TEMPORARY_URL_PREFIX}{token}/{}", quote(file_name))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn signer() -> AccessTokenSigner {
        AccessTokenSigner::new("test-secret", Duration::from_secs(60)).unwrap()
    }

    #[test]
    fn test_token_roundtrip() {
        let signer = signer();
        let token = signer.sign("5/abc/doc.pdf");
        assert_eq!(signer.verify(&token).as_deref(), Some("5/abc/doc.pdf"));
    }

    #[test]
    fn test_verify_does_not_consume() {
        let signer = signer();
        let token = signer.sign("5/abc/doc.pdf");
        assert!(signer.verify(&token).is_some());
        assert!(signer.verify(&token).is_some());
        assert!(signer.consume(&token));
    }

    #[test]
    fn test_token_is_single_use() {
        let signer = signer();
        let token = signer.sign("5/abc/doc.pdf");
        assert!(signer.consume(&token));
        assert!(!signer.consume(&token));
        assert!(signer.verify(&token).is_some());
    }

    #[test]
    fn test_tokens_for_same_path_differ() {
        let signer = signer();
        assert_ne!(signer.sign("5/abc/doc.pdf"), signer.sign("5/abc/doc.pdf"));
    }

    #[test]
    fn test_expired_token_rejected() {
        let signer = signer();
        let token = signer.sign_at("5/abc/doc.pdf", Utc::now().timestamp() - 61);
        assert!(signer.verify(&token).is_none());
    }

    #[test]
    fn test_token_from_the_future_rejected() {
        let signer = signer();
        let token = signer.sign_at("5/abc/doc.pdf", Utc::now().timestamp() + 3600);
        assert!(signer.verify(&token).is_none());
    }

    #[test]
    fn test_other_secret_rejected() {
        let other = AccessTokenSigner::new("other-secret", Duration::from_secs(60)).unwrap();
        let token = other.sign("5/abc/doc.pdf");
        assert!(signer().verify(&token).is_none());
    }

    #[test]
    fn test_tampered_path_rejected() {
        let signer = signer();
        let token = signer.sign("5/abc/doc.pdf");
        let decoded = String::from_utf8(base64_url::decode(&token).unwrap()).unwrap();
        let forged = base64_url::encode(&decoded.replacen("5/abc/doc.pdf", "6/abc/doc.pdf", 1));
        assert!(signer.verify(&forged).is_none());
    }

    #[test]
    fn test_garbage_rejected() {
        let signer = signer();
        assert!(signer.verify("").is_none());
        assert!(signer.verify("not a token").is_none());
        assert!(signer.verify(&base64_url::encode("a:b")).is_none());
    }

    #[test]
    fn test_empty_secret_rejected() {
        assert!(matches!(
            AccessTokenSigner::new("", Duration::from_secs(60)),
            Err(UploadError::Configuration(_))
        ));
    }

    #[test]
    fn test_access_url() {
        assert_eq!(
            access_url("tok", "my file.pdf"),
            "/user_uploads/temporary/tok/my%20file.pdf"
        );
    }
}
