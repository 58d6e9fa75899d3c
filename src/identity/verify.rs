//! Webhook signature verification.
//!
//! The identity provider signs deliveries with the svix scheme: the secret is
//! `whsec_` + base64(key), the signed content is `"{id}.{timestamp}.{body}"`,
//! and the `svix-signature` header carries space-separated `v1,<base64>`
//! candidates. Verification succeeds when any candidate matches; comparisons
//! are constant-time via `Mac::verify_slice`.

use anyhow::{anyhow, bail, Result};
use base64::{engine::general_purpose::STANDARD as BASE64, Engine as _};
use hmac::{Hmac, Mac};
use sha2::Sha256;

type HmacSha256 = Hmac<Sha256>;

/// Deliveries whose timestamp is further than this from now are rejected,
/// bounding the replay window.
const TIMESTAMP_TOLERANCE_SECS: i64 = 5 * 60;

const SECRET_PREFIX: &str = "whsec_";
const SIGNATURE_VERSION: &str = "v1,";

/// The three signature headers of one delivery.
#[derive(Debug, Clone, Copy)]
pub struct SignatureHeaders<'a> {
    pub id: &'a str,
    pub timestamp: &'a str,
    pub signature: &'a str,
}

/// Verify a delivery against the shared secret. Err means reject with 400.
pub fn verify(secret: &str, headers: SignatureHeaders<'_>, body: &[u8]) -> Result<()> {
    verify_at(secret, headers, body, chrono::Utc::now().timestamp())
}

fn verify_at(secret: &str, headers: SignatureHeaders<'_>, body: &[u8], now: i64) -> Result<()> {
    let key = decode_secret(secret)?;

    let ts: i64 = headers
        .timestamp
        .parse()
        .map_err(|_| anyhow!("malformed svix-timestamp header"))?;
    if (now - ts).abs() > TIMESTAMP_TOLERANCE_SECS {
        bail!("webhook timestamp outside tolerance");
    }

    let mac = signed_content_mac(&key, headers.id, headers.timestamp, body)?;

    for candidate in headers.signature.split_ascii_whitespace() {
        let Some(encoded) = candidate.strip_prefix(SIGNATURE_VERSION) else {
            continue;
        };
        let Ok(sig) = BASE64.decode(encoded) else {
            continue;
        };
        if mac.clone().verify_slice(&sig).is_ok() {
            return Ok(());
        }
    }

    bail!("no matching webhook signature")
}

/// Compute the `v1,<base64>` signature for a delivery.
///
/// The counterpart of [`verify`]; the test suites use it to produce
/// authentic deliveries.
pub fn sign(secret: &str, id: &str, timestamp: &str, body: &[u8]) -> Result<String> {
    let key = decode_secret(secret)?;
    let mac = signed_content_mac(&key, id, timestamp, body)?;
    let sig = BASE64.encode(mac.finalize().into_bytes());
    Ok(format!("{SIGNATURE_VERSION}{sig}"))
}

fn signed_content_mac(key: &[u8], id: &str, timestamp: &str, body: &[u8]) -> Result<HmacSha256> {
    let mut mac = HmacSha256::new_from_slice(key)
        .map_err(|_| anyhow!("webhook secret key rejected by HMAC"))?;
    mac.update(id.as_bytes());
    mac.update(b".");
    mac.update(timestamp.as_bytes());
    mac.update(b".");
    mac.update(body);
    Ok(mac)
}

fn decode_secret(secret: &str) -> Result<Vec<u8>> {
    let encoded = secret.strip_prefix(SECRET_PREFIX).unwrap_or(secret);
    BASE64
        .decode(encoded)
        .map_err(|_| anyhow!("webhook secret is not valid base64"))
}

// ─── Tests ───────────────────────────────────────────────────────────────────
