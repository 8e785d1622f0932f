//! Signed QR payloads for passes
//!
//! Format: `PH1.<pass-uuid>.<signature>` where the signature is the first
//! 32 hex characters of `SHA-256(secret "." pass_id "." booking_id)`.

use sha2::{Digest, Sha256};
use thiserror::Error;
use uuid::Uuid;

const PREFIX: &str = "PH1";
const SIGNATURE_LEN: usize = 32;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QrError {
    #[error("Malformed pass code")]
    Malformed,
    #[error("Pass code signature mismatch")]
    BadSignature,
}

fn signature(secret: &str, pass_id: Uuid, booking_id: Uuid) -> String {
    let mut hasher = Sha256::new();
    hasher.update(secret.as_bytes());
    hasher.update(b".");
    hasher.update(pass_id.as_hyphenated().to_string().as_bytes());
    hasher.update(b".");
    hasher.update(booking_id.as_hyphenated().to_string().as_bytes());
    let mut hex = hex::encode(hasher.finalize());
    hex.truncate(SIGNATURE_LEN);
    hex
}

/// Build the payload encoded into a pass QR code
pub fn encode_payload(secret: &str, pass_id: Uuid, booking_id: Uuid) -> String {
    format!("{}.{}.{}", PREFIX, pass_id, signature(secret, pass_id, booking_id))
}

/// Extract the pass id from a payload without checking its signature.
/// The caller loads the pass and then calls [`verify_payload`].
pub fn parse_pass_id(payload: &str) -> Result<Uuid, QrError> {
    let mut parts = payload.trim().split('.');
    match (parts.next(), parts.next(), parts.next(), parts.next()) {
        (Some(PREFIX), Some(id), Some(sig), None) if sig.len() == SIGNATURE_LEN => {
            Uuid::parse_str(id).map_err(|_| QrError::Malformed)
        }
        _ => Err(QrError::Malformed),
    }
}

/// Check that `payload` was issued for this pass and booking
pub fn verify_payload(secret: &str, payload: &str, pass_id: Uuid, booking_id: Uuid) -> Result<(), QrError> {
    if parse_pass_id(payload)? != pass_id {
        return Err(QrError::BadSignature);
    }
    let expected = encode_payload(secret, pass_id, booking_id);
    if payload.trim() == expected {
        Ok(())
    } else {
        Err(QrError::BadSignature)
    }
}
