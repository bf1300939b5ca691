use axum::{Json, Router, extract::State, routing::post};

use crate::{
    dto::checkout::{CheckoutSessionResponse, CompleteCheckoutRequest, CreateCheckoutSessionRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Order,
    response::ApiResponse,
    services::checkout_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/session", post(create_session))
        .route("/complete", post(complete))
}

#[utoipa::path(
    post,
    path = "/api/checkout/session",
    request_body = CreateCheckoutSessionRequest,
    responses(
        (status = 200, description = "Hosted checkout session", body = ApiResponse<CheckoutSessionResponse>),
        (status = 400, description = "Invalid contact details or out of stock"),
        (status = 404, description = "Listing not found"),
        (status = 502, description = "Payment gateway failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn create_session(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCheckoutSessionRequest>,
) -> AppResult<Json<ApiResponse<CheckoutSessionResponse>>> {
    let resp = checkout_service::create_session(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/checkout/complete",
    request_body = CompleteCheckoutRequest,
    responses(
        (status = 200, description = "Order reconciled with the payment gateway", body = ApiResponse<Order>),
        (status = 404, description = "No order for this session"),
        (status = 502, description = "Payment gateway failure")
    ),
    security(("bearer_auth" = [])),
    tag = "Checkout"
)]
pub async fn complete(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CompleteCheckoutRequest>,
) -> AppResult<Json<ApiResponse<Order>>> {
    let resp = checkout_service::complete(&state, &user, payload).await?;
    Ok(Json(resp))
}
