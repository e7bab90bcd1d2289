//! # Webhook signature scheme
//!
//! The payment provider signs every webhook delivery with a shared secret. The signature header looks like
//!
//! ```text
//!    t=1718000000,v1=5257a869e7ecebeda32affa62cdca3fa51cad7e77a0e56ff536d0ce8e108d8bd,v0=...
//! ```
//!
//! where `t` is the unix timestamp (in seconds) at which the payload was signed and each `v1` entry is a hex-encoded
//! HMAC-SHA256 of the string `{t}.{body}` keyed with the endpoint secret. Other schemes (`v0`) are ignored.
//!
//! Header structure is checked before any cryptographic work is done, and the body is never parsed before the
//! signature has been confirmed.
use chrono::{DateTime, Duration, Utc};
use feg_common::Secret;
use hmac::{Hmac, Mac};
use log::*;
use sha2::Sha256;
use thiserror::Error;

type HmacSha256 = Hmac<Sha256>;

pub const SIGNATURE_HEADER: &str = "stripe-signature";
pub const DEFAULT_TOLERANCE_SECONDS: i64 = 300;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SignatureError {
    #[error("No signature header was provided")]
    MissingHeader,
    #[error("Unable to extract timestamp and signatures from header")]
    MalformedHeader,
    #[error("The signature header timestamp is not a valid number")]
    InvalidTimestamp,
    #[error("Timestamp outside the tolerance zone ({0}s)")]
    TimestampOutsideTolerance(i64),
    #[error("No signatures found matching the expected signature for payload")]
    Mismatch,
}

/// The parsed form of the signature header
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureHeader {
    pub timestamp: i64,
    pub signatures: Vec<String>,
}

impl SignatureHeader {
    pub fn parse(header: Option<&str>) -> Result<Self, SignatureError> {
        let header = header.map(str::trim).filter(|h| !h.is_empty()).ok_or(SignatureError::MissingHeader)?;
        let mut timestamp = None;
        let mut signatures = Vec::new();
        for (key, value) in header.split(',').filter_map(|part| part.trim().split_once('=')) {
            match key {
                "t" => timestamp = Some(value),
                "v1" => signatures.push(value.to_string()),
                _ => {},
            }
        }
        let (Some(ts), false) = (timestamp, signatures.is_empty()) else {
            return Err(SignatureError::MalformedHeader);
        };
        let timestamp = ts.parse::<i64>().map_err(|_| SignatureError::InvalidTimestamp)?;
        Ok(Self { timestamp, signatures })
    }

    pub fn to_header_value(&self) -> String {
        let sigs = self.signatures.iter().map(|s| format!("v1={s}")).collect::<Vec<_>>().join(",");
        format!("t={},{sigs}", self.timestamp)
    }
}

fn signer(secret: &str, timestamp: i64, payload: &[u8]) -> HmacSha256 {
    // HMAC accepts keys of any length, so this cannot fail
    let mut mac = HmacSha256::new_from_slice(secret.as_bytes()).unwrap_or_else(|_| unreachable!());
    mac.update(timestamp.to_string().as_bytes());
    mac.update(b".");
    mac.update(payload);
    mac
}

/// Produces the hex-encoded `v1` signature for `payload` signed at `timestamp`.
pub fn compute_signature(secret: &str, timestamp: i64, payload: &[u8]) -> String {
    hex::encode(signer(secret, timestamp, payload).finalize().into_bytes())
}

/// Checks the signature header against the raw request body.
///
/// `tolerance` bounds the age of the signature timestamp relative to `now`. Pass `None` to skip the age check.
/// Returns the signing timestamp on success.
pub fn verify_signature(
    payload: &[u8],
    header: &SignatureHeader,
    secret: &Secret<String>,
    tolerance: Option<Duration>,
    now: DateTime<Utc>,
) -> Result<i64, SignatureError> {
    let mac = signer(secret.reveal(), header.timestamp, payload);
    let matched = header
        .signatures
        .iter()
        .filter_map(|sig| hex::decode(sig).ok())
        .any(|sig| mac.clone().verify_slice(&sig).is_ok());
    if !matched {
        debug!("🔏️ None of the {} v1 signatures match the payload", header.signatures.len());
        return Err(SignatureError::Mismatch);
    }
    if let Some(tolerance) = tolerance {
        let age = now.timestamp() - header.timestamp;
        if age.abs() > tolerance.num_seconds() {
            warn!("🔏️ Webhook signature timestamp is {age}s away from now.");
            return Err(SignatureError::TimestampOutsideTolerance(tolerance.num_seconds()));
        }
    }
    Ok(header.timestamp)
}
