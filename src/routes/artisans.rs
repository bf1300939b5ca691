use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::{listings::ListingList, orders::OrderList, profiles::UpdateArtisanProfileRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{ArtisanSummary, User},
    response::ApiResponse,
    routes::params::{OrderListQuery, Pagination},
    services::{listing_service, order_service, profile_service},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/me", get(get_profile).put(update_profile))
        .route("/me/listings", get(my_listings))
        .route("/me/orders", get(my_orders))
        .route("/{id}", get(get_artisan))
}

#[utoipa::path(
    get,
    path = "/api/artisans/me",
    responses(
        (status = 200, description = "Artisan profile", body = ApiResponse<User>),
        (status = 403, description = "Caller is not an artisan")
    ),
    security(("bearer_auth" = [])),
    tag = "Artisans"
)]
pub async fn get_profile(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = profile_service::get_artisan_me(&state, &user).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/artisans/me",
    request_body = UpdateArtisanProfileRequest,
    responses(
        (status = 200, description = "Updated artisan profile", body = ApiResponse<User>),
        (status = 400, description = "Invalid input"),
        (status = 403, description = "Caller is not an artisan")
    ),
    security(("bearer_auth" = [])),
    tag = "Artisans"
)]
pub async fn update_profile(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<UpdateArtisanProfileRequest>,
) -> AppResult<Json<ApiResponse<User>>> {
    let resp = profile_service::update_artisan_me(&state, &user, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/artisans/me/listings",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
    ),
    responses(
        (status = 200, description = "Every listing owned by the artisan, drafts included", body = ApiResponse<ListingList>),
        (status = 403, description = "Caller is not an artisan")
    ),
    security(("bearer_auth" = [])),
    tag = "Artisans"
)]
pub async fn my_listings(
    State(state): State<AppState>,
    user: AuthUser,
    Query(pagination): Query<Pagination>,
) -> AppResult<Json<ApiResponse<ListingList>>> {
    let resp = listing_service::list_artisan_listings(&state, &user, pagination).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/artisans/me/orders",
    params(OrderListQuery),
    responses(
        (status = 200, description = "Orders placed on the artisan's listings", body = ApiResponse<OrderList>),
        (status = 403, description = "Caller is not an artisan")
    ),
    security(("bearer_auth" = [])),
    tag = "Artisans"
)]
pub async fn my_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<Json<ApiResponse<OrderList>>> {
    let resp = order_service::artisan_orders(&state, &user, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/artisans/{id}",
    params(("id" = Uuid, Path, description = "Artisan ID")),
    responses(
        (status = 200, description = "Public seller summary", body = ApiResponse<ArtisanSummary>),
        (status = 404, description = "Not Found")
    ),
    tag = "Artisans"
)]
pub async fn get_artisan(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ArtisanSummary>>> {
    let resp = profile_service::public_artisan(&state, id).await?;
    Ok(Json(resp))
}
