//! Payment processor client

use async_trait::async_trait;
use reqwest::Client;
use serde::Serialize;
use std::time::Duration;
use thiserror::Error;
use tumbller_shared::codec::{CodecError, PaymentFrame};

/// Body sent to the payment processor
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct PaymentRequest {
    pub api_key: String,
    /// Payer fid
    pub sender: String,
    pub amount: String,
    pub token: String,
    pub receiver: String,
    /// Where the processor posts back once the transaction lands
    pub callback_url: String,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment processor returned status {0}")]
    Status(u16),

    #[error("payment processor timed out")]
    Timeout,

    #[error("payment processor unreachable: {0}")]
    Transport(String),

    #[error("malformed payment frame: {0}")]
    Codec(#[from] CodecError),
}

/// Starts a payment and returns the frame the payer should see next
#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn request_payment(&self, request: &PaymentRequest) -> Result<PaymentFrame, PaymentError>;
}

/// Gateway speaking to an HTTP payment processor that answers with a frame
pub struct HttpPaymentGateway {
    endpoint: String,
    client: Client,
}

impl HttpPaymentGateway {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, PaymentError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        Ok(Self {
            endpoint: endpoint.into(),
            client,
        })
    }
}

#[async_trait]
impl PaymentGateway for HttpPaymentGateway {
    async fn request_payment(&self, request: &PaymentRequest) -> Result<PaymentFrame, PaymentError> {
        let response = self
            .client
            .post(&self.endpoint)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    PaymentError::Timeout
                } else {
                    PaymentError::Transport(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(PaymentError::Status(status.as_u16()));
        }

        let html = response
            .text()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        Ok(PaymentFrame::decode(&html)?)
    }
}
