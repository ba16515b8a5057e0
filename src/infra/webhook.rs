//! HMAC-SHA256 webhook signatures in the CMS's `t=<ms>,v1=<sig>` format.
//!
//! The signed message is `<t>.<raw body>`; the digest is base64url encoded.

use std::time::Duration;

use async_trait::async_trait;
use base64::{Engine as _, engine::general_purpose::URL_SAFE_NO_PAD};
use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;
use tracing::debug;

use crate::application::revalidation::{SignatureError, SignatureVerifier};

/// Request header carrying the webhook signature.
pub const SIGNATURE_HEADER: &str = "sanity-webhook-signature";

/// Default wait for the content repository to become consistent after a write.
pub const DEFAULT_CONSISTENCY_WINDOW: Duration = Duration::from_millis(3000);

type HmacSha256 = Hmac<Sha256>;

#[derive(Debug, Clone)]
pub struct HmacSignatureVerifier {
    consistency_window: Duration,
}

impl HmacSignatureVerifier {
    pub fn new(consistency_window: Duration) -> Self {
        Self { consistency_window }
    }
}

impl Default for HmacSignatureVerifier {
    fn default() -> Self {
        Self::new(DEFAULT_CONSISTENCY_WINDOW)
    }
}

#[async_trait]
impl SignatureVerifier for HmacSignatureVerifier {
    async fn verify(
        &self,
        secret: &str,
        signature: Option<&str>,
        body: &[u8],
    ) -> Result<(), SignatureError> {
        let header = signature
            .map(str::trim)
            .filter(|value| !value.is_empty())
            .ok_or(SignatureError::Missing)?;
        let parsed = ParsedSignature::parse(header)?;

        let provided = URL_SAFE_NO_PAD
            .decode(parsed.digest.trim_end_matches('='))
            .map_err(|_| SignatureError::Malformed("digest is not base64url"))?;
        let expected = sign(secret, parsed.timestamp, body)?;

        if provided.ct_eq(&expected).unwrap_u8() == 0 {
            return Err(SignatureError::Mismatch);
        }

        if !self.consistency_window.is_zero() {
            debug!(
                wait_ms = self.consistency_window.as_millis() as u64,
                "waiting for content repository consistency"
            );
            tokio::time::sleep(self.consistency_window).await;
        }
        Ok(())
    }
}

struct ParsedSignature<'a> {
    timestamp: &'a str,
    digest: &'a str,
}

impl<'a> ParsedSignature<'a> {
    fn parse(header: &'a str) -> Result<Self, SignatureError> {
        let mut timestamp = None;
        let mut digest = None;
        for part in header.split(',') {
            match part.trim().split_once('=') {
                Some(("t", value)) => timestamp = Some(value),
                Some(("v1", value)) => digest = Some(value),
                _ => {}
            }
        }

        let timestamp = timestamp
            .filter(|value| !value.is_empty() && value.bytes().all(|b| b.is_ascii_digit()))
            .ok_or(SignatureError::Malformed("missing or invalid timestamp"))?;
        let digest = digest
            .filter(|value| !value.is_empty())
            .ok_or(SignatureError::Malformed("missing v1 digest"))?;
        Ok(Self { timestamp, digest })
    }
}

fn sign(secret: &str, timestamp: &str, body: &[u8]) -> Result<Vec<u8>, SignatureError> {
    let mut mac = <HmacSha256 as hmac::digest::KeyInit>::new_from_slice(secret.as_bytes())
        .map_err(|_| SignatureError::Malformed("unusable secret"))?;
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac.finalize().into_bytes()[..].to_vec())
}

/// Build a signature header value for `body`, as the CMS would send it.
pub fn encode_signature_header(
    secret: &str,
    timestamp_ms: i64,
    body: &[u8],
) -> Result<String, SignatureError> {
    let timestamp = timestamp_ms.to_string();
    let digest = sign(secret, &timestamp, body)?;
    Ok(format!("t={timestamp},v1={}", URL_SAFE_NO_PAD.encode(&digest)))
}
