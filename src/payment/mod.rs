//! Payment adapter and callback handling
//!
//! The processor is trusted at face value: a callback carrying a transaction
//! id and a fid is treated as a completed payment.

mod callback;
mod gateway;

pub use callback::FrameAction;
pub use gateway::{HttpPaymentGateway, PaymentError, PaymentGateway, PaymentRequest};
