use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct BuyerContact {
    pub name: String,
    pub phone_number: String,
    pub address: String,
}

#[derive(Debug, Clone, Deserialize, Serialize, ToSchema)]
pub struct CreateCheckoutSessionRequest {
    pub listing_id: Uuid,
    pub quantity: Option<i32>,
    pub buyer: BuyerContact,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct CheckoutSessionResponse {
    pub order_id: Uuid,
    pub session_id: String,
    pub url: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CompleteCheckoutRequest {
    pub session_id: String,
}
