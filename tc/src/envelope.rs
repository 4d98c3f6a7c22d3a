//! Response envelope normalization
//!
//! The remote API is inconsistent about wrapping: some endpoints return
//! `{ "success": true, "data": ... }`, others return the payload flat.
//! Everything coming off the wire passes through [`ApiEnvelope`] so the
//! rest of the client (and the state mirror above it) only ever sees one
//! canonical shape.

use serde::Deserialize;
use serde::de::DeserializeOwned;
use tracing::debug;

use crate::error::ApiError;

/// A `{ success, data }` wrapper as some endpoints produce it
#[derive(Debug, Deserialize)]
#[serde(bound(deserialize = "T: Deserialize<'de>"))]
pub struct Wrapped<T> {
    pub success: bool,
    #[serde(default)]
    pub data: Option<T>,
    #[serde(default)]
    pub message: Option<String>,
}

/// Either a wrapped or a flat payload
///
/// Untagged: serde tries the wrapper first, then the bare shape.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub enum ApiEnvelope<T> {
    Wrapped(Wrapped<T>),
    Bare(T),
}

impl<T> ApiEnvelope<T> {
    /// Normalize to the inner payload or an error
    ///
    /// A wrapper with `success: false` becomes [`ApiError::Rejected`]; a
    /// successful wrapper without data is an invalid response.
    pub fn into_result(self) -> Result<T, ApiError> {
        match self {
            Self::Bare(value) => Ok(value),
            Self::Wrapped(w) if w.success => w
                .data
                .ok_or_else(|| ApiError::InvalidResponse("success envelope without data".to_string())),
            Self::Wrapped(w) => {
                let message = w.message.unwrap_or_else(|| "request failed".to_string());
                debug!(%message, "envelope: server rejected request");
                Err(ApiError::Rejected(message))
            }
        }
    }
}

/// Parse a response body into the payload type, accepting both shapes
pub fn parse_payload<T: DeserializeOwned>(body: &str) -> Result<T, ApiError> {
    let envelope: ApiEnvelope<T> = serde_json::from_str(body)
        .map_err(|e| ApiError::InvalidResponse(format!("failed to parse response body: {}", e)))?;
    envelope.into_result()
}
