//! Frame action bodies and payment callback parsing
//!
//! The processor posts a regular frame action to `/callback/{device_id}`:
//! ```text
//! { "untrustedData": { "fid": 42, "transactionId": "0xabc...", ... }, "trustedData": { ... } }
//! ```
//! Presence of both fields is the only success signal. The signed
//! `trustedData` message is not verified.

use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum CallbackError {
    #[error("callback body is not a frame action: {0}")]
    Malformed(String),

    #[error("callback is missing {0}")]
    MissingField(&'static str),
}

/// A frame action POST body (only the fields this server reads)
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FrameAction {
    #[serde(rename = "untrustedData", default)]
    pub untrusted_data: Option<UntrustedData>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UntrustedData {
    #[serde(default)]
    pub fid: Option<Value>,

    #[serde(rename = "transactionId", default)]
    pub transaction_id: Option<String>,
}

/// A payment the processor reported as completed
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PaymentConfirmation {
    pub transaction_id: String,
    pub user: String,
}

impl FrameAction {
    /// Parse a body, tolerating an empty one (first frame load)
    pub fn parse(body: &[u8]) -> Result<Self, CallbackError> {
        if body.iter().all(u8::is_ascii_whitespace) {
            return Ok(Self::default());
        }
        serde_json::from_slice(body).map_err(|e| CallbackError::Malformed(e.to_string()))
    }

    /// Acting user's fid, stringified
    pub fn fid(&self) -> Option<String> {
        let fid = self.untrusted_data.as_ref()?.fid.as_ref()?;
        match fid {
            Value::Number(n) => Some(n.to_string()),
            Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
            _ => None,
        }
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.untrusted_data
            .as_ref()?
            .transaction_id
            .as_deref()
            .map(str::trim)
            .filter(|s| !s.is_empty())
    }

    /// Interpret this action as a payment callback
    pub fn confirmation(&self) -> Result<PaymentConfirmation, CallbackError> {
        let transaction_id = self
            .transaction_id()
            .ok_or(CallbackError::MissingField("transactionId"))?;
        let user = self.fid().ok_or(CallbackError::MissingField("fid"))?;

        Ok(PaymentConfirmation {
            transaction_id: transaction_id.to_string(),
            user,
        })
    }
}
