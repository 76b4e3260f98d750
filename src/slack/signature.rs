//! Slack request signature verification.
//!
//! Slack signs every Events API request with
//! `v0=hex(HMAC-SHA256(signing_secret, "v0:{timestamp}:{body}"))`.

use hmac::{Hmac, Mac};
use sha2::Sha256;
use subtle::ConstantTimeEq;

use crate::error::{BotError, Result};

/// Maximum accepted age of a request, in seconds.
pub const MAX_REQUEST_AGE_SECS: i64 = 60 * 5;

/// Verify `provided_sig` for `body` sent at `timestamp`, as seen at `now` (unix seconds).
///
/// # Errors
///
/// Returns [`BotError::Signature`] when the timestamp is malformed or stale,
/// or when the signature does not match.
pub fn verify(
    signing_secret: &[u8],
    timestamp: &str,
    body: &[u8],
    provided_sig: &str,
    now: i64,
) -> Result<()> {
    let ts: i64 = timestamp
        .parse()
        .map_err(|_| BotError::Signature("invalid timestamp"))?;
    if now.abs_diff(ts) > MAX_REQUEST_AGE_SECS.unsigned_abs() {
        return Err(BotError::Signature("stale timestamp"));
    }

    let expected = sign(signing_secret, timestamp, body)?;
    if expected.as_bytes().ct_eq(provided_sig.as_bytes()).unwrap_u8() != 1 {
        return Err(BotError::Signature("signature mismatch"));
    }
    Ok(())
}

fn sign(signing_secret: &[u8], timestamp: &str, body: &[u8]) -> Result<String> {
    let mut mac = Hmac::<Sha256>::new_from_slice(signing_secret)
        .map_err(|_| BotError::Signature("invalid signing secret"))?;
    mac.update(b"v0:");
    mac.update(timestamp.as_bytes());
    mac.update(b":");
    mac.update(body);
    Ok(format!("v0={}", hex::encode(mac.finalize().into_bytes())))
}

#[cfg(test)]
pub(crate) fn sign_for_test(signing_secret: &[u8], timestamp: &str, body: &[u8]) -> String {
    sign(signing_secret, timestamp, body).expect("hmac accepts any key length")
}
