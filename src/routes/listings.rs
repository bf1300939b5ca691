use axum::{
    Json, Router,
    extract::{DefaultBodyLimit, Multipart, Path, Query, State},
    http::{StatusCode, header},
    response::{IntoResponse, Response},
    routing::{get, patch, post},
};
use uuid::Uuid;

use crate::{
    ai::ImageInput,
    dto::listings::{
        CreateReviewRequest, GenerateListingForm, GenerateListingResponse, ListingDetail,
        ListingList, UpdateListingRequest, UpdateListingStatusRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Listing, Review},
    response::ApiResponse,
    routes::params::ListingQuery,
    services::listing_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    let upload_limit = DefaultBodyLimit::max(listing_service::MAX_UPLOAD_BYTES);
    Router::new()
        .route("/", get(list_listings))
        .route("/generate", post(generate_listing).layer(upload_limit))
        .route(
            "/{id}",
            get(get_listing).put(update_listing).delete(delete_listing),
        )
        .route("/{id}/status", patch(update_listing_status))
        .route("/{id}/images/{image_id}", get(get_listing_image))
        .route("/{id}/reviews", post(add_review))
}

#[utoipa::path(
    get,
    path = "/api/listings",
    params(ListingQuery),
    responses(
        (status = 200, description = "Search marketplace listings", body = ApiResponse<ListingList>),
        (status = 400, description = "Invalid price range")
    ),
    tag = "Listings"
)]
pub async fn list_listings(
    State(state): State<AppState>,
    Query(query): Query<ListingQuery>,
) -> AppResult<Json<ApiResponse<ListingList>>> {
    let resp = listing_service::search_listings(&state, query).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    post,
    path = "/api/listings/generate",
    request_body(content = GenerateListingForm, content_type = "multipart/form-data"),
    responses(
        (status = 201, description = "Draft listing generated from voice and images", body = ApiResponse<GenerateListingResponse>),
        (status = 400, description = "Missing transcription or invalid images"),
        (status = 403, description = "Caller is not an artisan"),
        (status = 413, description = "Upload exceeds 10 MiB")
    ),
    security(("bearer_auth" = [])),
    tag = "Listings"
)]
pub async fn generate_listing(
    State(state): State<AppState>,
    user: AuthUser,
    multipart: Multipart,
) -> AppResult<(StatusCode, Json<ApiResponse<GenerateListingResponse>>)> {
    let (transcription, images) = read_generation_form(multipart).await?;
    let resp = listing_service::generate_listing(&state, &user, transcription, images).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}

async fn read_generation_form(mut multipart: Multipart) -> AppResult<(String, Vec<ImageInput>)> {
    let mut transcription = None;
    let mut images = Vec::new();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_string);
        match name.as_deref() {
            Some("transcription") => transcription = Some(field.text().await?),
            Some("images") => {
                if images.len() == listing_service::MAX_IMAGES {
                    return Err(AppError::BadRequest(format!(
                        "At most {} images are allowed",
                        listing_service::MAX_IMAGES
                    )));
                }
                let filename = field.file_name().unwrap_or("image").to_string();
                let content_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                let bytes = field.bytes().await?.to_vec();
                images.push(ImageInput {
                    filename,
                    content_type,
                    bytes,
                });
            }
            _ => {}
        }
    }

    let transcription =
        transcription.ok_or_else(|| AppError::BadRequest("transcription is required".into()))?;
    Ok((transcription, images))
}

#[utoipa::path(
    get,
    path = "/api/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing with seller and reviews", body = ApiResponse<ListingDetail>),
        (status = 404, description = "Not Found")
    ),
    tag = "Listings"
)]
pub async fn get_listing(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<ListingDetail>>> {
    let resp = listing_service::get_listing(&state, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    put,
    path = "/api/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = UpdateListingRequest,
    responses(
        (status = 200, description = "Updated listing", body = ApiResponse<Listing>),
        (status = 403, description = "Not the listing owner"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Listings"
)]
pub async fn update_listing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateListingRequest>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let resp = listing_service::update_listing(&state, &user, id, payload).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    patch,
    path = "/api/listings/{id}/status",
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = UpdateListingStatusRequest,
    responses(
        (status = 200, description = "Status changed", body = ApiResponse<Listing>),
        (status = 400, description = "Unknown status or listing not ready to publish"),
        (status = 403, description = "Not the listing owner")
    ),
    security(("bearer_auth" = [])),
    tag = "Listings"
)]
pub async fn update_listing_status(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateListingStatusRequest>,
) -> AppResult<Json<ApiResponse<Listing>>> {
    let resp = listing_service::update_listing_status(&state, &user, id, &payload.status).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    delete,
    path = "/api/listings/{id}",
    params(("id" = Uuid, Path, description = "Listing ID")),
    responses(
        (status = 200, description = "Listing deleted"),
        (status = 403, description = "Not the owner or an admin"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Listings"
)]
pub async fn delete_listing(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<Json<ApiResponse<serde_json::Value>>> {
    let resp = listing_service::delete_listing(&state, &user, id).await?;
    Ok(Json(resp))
}

#[utoipa::path(
    get,
    path = "/api/listings/{id}/images/{image_id}",
    params(
        ("id" = Uuid, Path, description = "Listing ID"),
        ("image_id" = Uuid, Path, description = "Image ID")
    ),
    responses(
        (status = 200, description = "Raw image bytes", content_type = "image/*"),
        (status = 404, description = "Not Found")
    ),
    tag = "Listings"
)]
pub async fn get_listing_image(
    State(state): State<AppState>,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> AppResult<Response> {
    let image = listing_service::get_image(&state, id, image_id).await?;
    Ok((
        [
            (header::CONTENT_TYPE, image.content_type),
            (header::CACHE_CONTROL, "public, max-age=86400".to_string()),
        ],
        image.data,
    )
        .into_response())
}

#[utoipa::path(
    post,
    path = "/api/listings/{id}/reviews",
    params(("id" = Uuid, Path, description = "Listing ID")),
    request_body = CreateReviewRequest,
    responses(
        (status = 201, description = "Review added", body = ApiResponse<Review>),
        (status = 400, description = "Invalid rating or comment"),
        (status = 404, description = "Not Found")
    ),
    security(("bearer_auth" = [])),
    tag = "Listings"
)]
pub async fn add_review(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<CreateReviewRequest>,
) -> AppResult<(StatusCode, Json<ApiResponse<Review>>)> {
    let resp = listing_service::add_review(&state, &user, id, payload).await?;
    Ok((StatusCode::CREATED, Json(resp)))
}
