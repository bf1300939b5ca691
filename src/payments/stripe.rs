use async_trait::async_trait;
use serde::Deserialize;

use super::{
    CheckoutSession, CheckoutSessionRequest, PaymentError, PaymentGateway, SessionPaymentStatus,
};

const STRIPE_API_BASE: &str = "https://api.stripe.com/v1";
const DESCRIPTION_LIMIT: usize = 100;

/// Stripe Checkout over the form-encoded REST API.
pub struct StripeGateway {
    secret_key: Option<String>,
    base_url: String,
    client: reqwest::Client,
}

#[derive(Debug, Deserialize)]
struct StripeSession {
    id: String,
    url: Option<String>,
    status: Option<String>,
    payment_status: Option<String>,
}

impl StripeGateway {
    pub fn new(secret_key: Option<String>) -> Self {
        Self {
            secret_key,
            base_url: STRIPE_API_BASE.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    fn secret(&self) -> Result<&str, PaymentError> {
        self.secret_key.as_deref().ok_or(PaymentError::NotConfigured)
    }

    fn form_fields(request: &CheckoutSessionRequest) -> Vec<(String, String)> {
        let description: String = request
            .product_description
            .chars()
            .take(DESCRIPTION_LIMIT)
            .collect();

        let mut fields = vec![
            ("mode".to_string(), "payment".to_string()),
            ("payment_method_types[0]".to_string(), "card".to_string()),
            ("success_url".to_string(), request.success_url.clone()),
            ("cancel_url".to_string(), request.cancel_url.clone()),
            ("customer_email".to_string(), request.customer_email.clone()),
            ("client_reference_id".to_string(), request.order_id.to_string()),
            ("metadata[order_id]".to_string(), request.order_id.to_string()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.clone(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.product_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.unit_amount.to_string(),
            ),
            (
                "line_items[0][quantity]".to_string(),
                request.quantity.to_string(),
            ),
        ];
        if !description.trim().is_empty() {
            fields.push((
                "line_items[0][price_data][product_data][description]".to_string(),
                description,
            ));
        }
        fields
    }

    async fn read_session(response: reqwest::Response) -> Result<StripeSession, PaymentError> {
        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(PaymentError::Rejected {
                status: status.as_u16(),
                body,
            });
        }
        response
            .json::<StripeSession>()
            .await
            .map_err(|e| PaymentError::InvalidResponse(e.to_string()))
    }
}

fn payment_status_of(session: &StripeSession) -> SessionPaymentStatus {
    match (session.payment_status.as_deref(), session.status.as_deref()) {
        (Some("paid") | Some("no_payment_required"), _) => SessionPaymentStatus::Paid,
        (_, Some("expired")) => SessionPaymentStatus::Expired,
        _ => SessionPaymentStatus::Unpaid,
    }
}

#[async_trait]
impl PaymentGateway for StripeGateway {
    async fn create_session(
        &self,
        request: &CheckoutSessionRequest,
    ) -> Result<CheckoutSession, PaymentError> {
        let secret = self.secret()?;
        let response = self
            .client
            .post(format!("{}/checkout/sessions", self.base_url))
            .bearer_auth(secret)
            .form(&Self::form_fields(request))
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        let session = Self::read_session(response).await?;
        let url = session
            .url
            .ok_or_else(|| PaymentError::InvalidResponse("session has no url".into()))?;
        Ok(CheckoutSession {
            id: session.id,
            url,
        })
    }

    async fn session_status(&self, session_id: &str) -> Result<SessionPaymentStatus, PaymentError> {
        let secret = self.secret()?;
        let response = self
            .client
            .get(format!("{}/checkout/sessions/{}", self.base_url, session_id))
            .bearer_auth(secret)
            .send()
            .await
            .map_err(|e| PaymentError::Transport(e.to_string()))?;

        let session = Self::read_session(response).await?;
        Ok(payment_status_of(&session))
    }
}
