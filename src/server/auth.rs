//! Signed WebSocket handshakes.
//!
//! A client proves it knows the shared secret by sending the current unix
//! time as `ts` and `hex(HMAC-SHA256(secret, ts))` as `sig` in the query
//! string. Requests more than [`MAX_CLOCK_SKEW_SECS`] away from server time
//! are refused.

use hmac::{ Hmac, Mac };
use sha2::Sha256;
use std::collections::HashMap;
use thiserror::Error;
use url::form_urlencoded;

type HmacSha256 = Hmac<Sha256>;

pub const MAX_CLOCK_SKEW_SECS: i64 = 300;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum AuthError {
    #[error("missing ts/sig")]
    MissingParams,
    #[error("timestamp out of range")]
    TimestampOutOfRange,
    #[error("bad signature")]
    BadSignature,
}

pub fn sign(secret: &str, ts: &str) -> Result<String, AuthError> {
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(
        |_| AuthError::BadSignature
    )?;
    mac.update(ts.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Checks the `ts`/`sig` pair carried in a handshake query string.
pub fn verify_query(secret: &str, query: &str, now: i64) -> Result<(), AuthError> {
    let params: HashMap<String, String> = form_urlencoded
        ::parse(query.as_bytes())
        .into_owned()
        .collect();

    let ts = params
        .get("ts")
        .or_else(|| params.get("X-Api-Ts"))
        .ok_or(AuthError::MissingParams)?;
    let sig = params
        .get("sig")
        .or_else(|| params.get("X-Api-Sign"))
        .ok_or(AuthError::MissingParams)?;

    let ts_i: i64 = ts.parse().map_err(|_| AuthError::TimestampOutOfRange)?;
    let skew = now.checked_sub(ts_i).map(i64::unsigned_abs);
    if !matches!(skew, Some(s) if s <= MAX_CLOCK_SKEW_SECS as u64) {
        return Err(AuthError::TimestampOutOfRange);
    }

    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).map_err(
        |_| AuthError::BadSignature
    )?;
    mac.update(ts.as_bytes());
    let expected = hex::decode(sig).map_err(|_| AuthError::BadSignature)?;
    mac.verify_slice(&expected).map_err(|_| AuthError::BadSignature)
}
