use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use base64::Engine as _;
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::error::{ApiError, Result};

// JWT segments are URL-safe base64, normally unpadded
const SEGMENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::URL_SAFE,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

#[derive(Debug, Deserialize)]
struct Claims {
    exp: f64,
}

/// Read the `exp` claim of an access token. The signature is not checked;
/// the API does that on every request.
pub fn expiry(token: &str) -> Result<DateTime<Utc>> {
    let payload = token
        .split('.')
        .nth(1)
        .ok_or_else(|| ApiError::Claims("missing payload segment".to_string()))?;

    let bytes = SEGMENT
        .decode(payload)
        .map_err(|e| ApiError::Claims(e.to_string()))?;

    let claims: Claims =
        serde_json::from_slice(&bytes).map_err(|e| ApiError::Claims(e.to_string()))?;

    DateTime::from_timestamp(claims.exp as i64, 0)
        .ok_or_else(|| ApiError::Claims(format!("exp out of range: {}", claims.exp)))
}

pub fn is_expired(token: &str, now: DateTime<Utc>) -> Result<bool> {
    Ok(now >= expiry(token)?)
}

#[cfg(test)]
pub(crate) fn token_expiring_at(exp: i64) -> String {
    let header = SEGMENT.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
    let payload = SEGMENT.encode(format!(r#"{{"token_type":"access","exp":{exp},"user_id":1}}"#));
    format!("{header}.{payload}.signature")
}
