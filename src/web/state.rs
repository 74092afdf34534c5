//! Application state
//!
//! Holds every shared component the handlers need

use std::sync::Arc;

use crate::command::CommandRelay;
use crate::config::AppConfig;
use crate::payment::{PaymentGateway, PaymentRequest};
use crate::session::Arbiter;
use crate::snapshot::SnapshotStore;
use crate::store::TransactionStore;

use super::render::Views;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub arbiter: Arbiter,
    pub relay: Arc<CommandRelay>,
    pub payments: Arc<dyn PaymentGateway>,
    pub transactions: Arc<dyn TransactionStore>,
    pub snapshots: Arc<SnapshotStore>,
    pub views: Views,
}

impl AppState {
    pub fn new(
        config: AppConfig,
        arbiter: Arbiter,
        relay: CommandRelay,
        payments: Arc<dyn PaymentGateway>,
        transactions: Arc<dyn TransactionStore>,
        snapshots: SnapshotStore,
    ) -> Self {
        let views = Views::new(config.base_url.clone(), config.frame_image_url.clone());
        Self {
            config: Arc::new(config),
            arbiter,
            relay: Arc::new(relay),
            payments,
            transactions,
            snapshots: Arc::new(snapshots),
            views,
        }
    }

    /// Payment request for `sender` buying a session on `device_id`
    pub fn payment_request(&self, device_id: &str, sender: String) -> PaymentRequest {
        PaymentRequest {
            api_key: self.config.api_key.clone(),
            sender,
            amount: self.config.payment_amount.clone(),
            token: self.config.payment_token.clone(),
            receiver: self.config.payment_receiver.clone(),
            callback_url: format!("{}/callback/{}", self.config.base_url, device_id),
        }
    }
}
