//! Hosted checkout sessions.

pub mod stripe;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

pub use stripe::StripeGateway;

#[derive(Debug, Clone)]
pub struct CheckoutSessionRequest {
    pub order_id: Uuid,
    pub product_name: String,
    pub product_description: String,
    /// Unit price in minor units.
    pub unit_amount: i64,
    pub quantity: i32,
    pub currency: String,
    pub customer_email: String,
    pub success_url: String,
    pub cancel_url: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct CheckoutSession {
    pub id: String,
    pub url: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionPaymentStatus {
    Paid,
    Unpaid,
    Expired,
}

#[derive(Debug, Error)]
pub enum PaymentError {
    #[error("payment gateway is not configured")]
    NotConfigured,
    #[error("payment gateway request failed: {0}")]
    Transport(String),
    #[error("payment gateway rejected the request ({status}): {body}")]
    Rejected { status: u16, body: String },
    #[error("unexpected payment gateway response: {0}")]
    InvalidResponse(String),
}

#[async_trait]
pub trait PaymentGateway: Send + Sync {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError>;

    async fn session_status(&self, session_id: &str) -> Result<SessionPaymentStatus, PaymentError>;
}
