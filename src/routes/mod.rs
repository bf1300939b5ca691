use axum::Router;

use crate::state::AppState;

pub mod artisans;
pub mod auth;
pub mod checkout;
pub mod doc;
pub mod health;
pub mod listings;
pub mod orders;
pub mod params;
pub mod users;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/users", users::router())
        .nest("/artisans", artisans::router())
        .nest("/listings", listings::router())
        .nest("/checkout", checkout::router())
        .nest("/orders", orders::router())
}
