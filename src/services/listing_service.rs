use std::collections::HashMap;

use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::extension::postgres::PgExpr;
use sea_orm::sea_query::{Expr, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, ConnectionTrait, EntityTrait, PaginatorTrait,
    QueryFilter, QueryOrder, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    ai::{self, GeneratedListing, ImageInput},
    audit,
    dto::listings::{
        CreateReviewRequest, GenerateListingResponse, ListingDetail, ListingList,
        UpdateListingRequest,
    },
    entity::{
        listing_images::{
            ActiveModel as ImageActive, Column as ImgCol, Entity as ListingImages,
            Model as ImageModel,
        },
        listings::{
            ActiveModel as ListingActive, Column, Entity as Listings, Model as ListingModel,
        },
        orders::{Column as OrderCol, Entity as Orders},
        reviews::{
            ActiveModel as ReviewActive, Column as ReviewCol, Entity as Reviews,
            Model as ReviewModel,
        },
        users::{Column as UserCol, Entity as Users},
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_artisan},
    models::{ArtisanSummary, Listing, ListingStatus, OrderStatus, Review, Role, ShippingInfo},
    response::{ApiResponse, Meta},
    routes::params::{LISTING_PAGE_SIZE, ListingQuery, ListingSortBy, Pagination, SortOrder},
    services::profile_service::artisan_summary,
    state::AppState,
    validation::require_non_empty,
};

pub const MAX_IMAGES: usize = 10;
/// Cap on a whole listing-generation upload, applied at the route and the server edge.
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub async fn search_listings(
    state: &AppState,
    query: ListingQuery,
) -> AppResult<ApiResponse<ListingList>> {
    let (page, limit, offset) = query.pagination().normalize_with(LISTING_PAGE_SIZE);
    let condition = search_condition(&query)?;

    let sort_col = match query.sort_by.unwrap_or(ListingSortBy::CreatedAt) {
        ListingSortBy::CreatedAt => Column::CreatedAt,
        ListingSortBy::Price => Column::Price,
        ListingSortBy::Title => Column::Title,
    };
    let mut finder = Listings::find().filter(condition);
    finder = match query.sort_order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(sort_col),
        SortOrder::Desc => finder.order_by_desc(sort_col),
    };

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    tracing::debug!(total, page, returned = models.len(), "listing search");

    let items = listings_with_images(state, models).await?;
    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success("Listings", ListingList { items }, Some(meta)))
}

/// Builds the marketplace filter: visible statuses plus every supplied criterion.
pub fn search_condition(query: &ListingQuery) -> AppResult<Condition> {
    if query.min_price.is_some_and(|p| p < 0) || query.max_price.is_some_and(|p| p < 0) {
        return Err(AppError::BadRequest("Prices cannot be negative".into()));
    }
    if let (Some(min), Some(max)) = (query.min_price, query.max_price) {
        if min > max {
            return Err(AppError::BadRequest(
                "min_price cannot be greater than max_price".into(),
            ));
        }
    }

    let visible: Vec<&str> = ListingStatus::visible().iter().map(|s| s.as_str()).collect();
    let mut condition = Condition::all().add(Column::Status.is_in(visible));

    if let Some(search) = non_empty(&query.q) {
        let pattern = contains_pattern(search);
        let matching_artisans = Query::select()
            .column(UserCol::Id)
            .from(Users)
            .cond_where(
                Condition::any()
                    .add(Expr::col(UserCol::DisplayName).ilike(pattern.clone()))
                    .add(Expr::col(UserCol::Location).ilike(pattern.clone())),
            )
            .to_owned();
        condition = condition.add(
            Condition::any()
                .add(Expr::col(Column::Title).ilike(pattern.clone()))
                .add(Expr::col(Column::Description).ilike(pattern.clone()))
                .add(Expr::col(Column::Category).ilike(pattern))
                .add(Column::ArtisanId.in_subquery(matching_artisans)),
        );
    }

    if let Some(category) = non_empty(&query.category) {
        condition = condition.add(Expr::col(Column::Category).ilike(escape_like(category)));
    }

    if let Some(location) = non_empty(&query.location) {
        let pattern = contains_pattern(location);
        let located_artisans = Query::select()
            .column(UserCol::Id)
            .from(Users)
            .cond_where(
                Condition::any()
                    .add(Expr::col(UserCol::Location).ilike(pattern.clone()))
                    .add(Expr::col(UserCol::Address).ilike(pattern)),
            )
            .to_owned();
        condition = condition.add(Column::ArtisanId.in_subquery(located_artisans));
    }

    if let Some(min_price) = query.min_price {
        condition = condition.add(Column::Price.gte(min_price));
    }
    if let Some(max_price) = query.max_price {
        condition = condition.add(Column::Price.lte(max_price));
    }

    Ok(condition)
}

pub async fn get_listing(state: &AppState, id: Uuid) -> AppResult<ApiResponse<ListingDetail>> {
    let model = Listings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if !parse_status(&model.status)?.is_visible() {
        return Err(AppError::NotFound);
    }

    let artisan = Users::find_by_id(model.artisan_id)
        .one(&state.orm)
        .await?
        .map(|u| artisan_summary(&u))
        .unwrap_or_else(ArtisanSummary::fallback);

    let reviews = Reviews::find()
        .filter(ReviewCol::ListingId.eq(id))
        .order_by_desc(ReviewCol::CreatedAt)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(review_from_entity)
        .collect();

    let listing = listing_with_images(state, model).await?;
    Ok(ApiResponse::success(
        "Listing",
        ListingDetail {
            listing,
            artisan,
            reviews,
        },
        None,
    ))
}

/// Stores the uploaded images and the AI-generated content as a draft listing.
pub async fn generate_listing(
    state: &AppState,
    user: &AuthUser,
    transcription: String,
    images: Vec<ImageInput>,
) -> AppResult<ApiResponse<GenerateListingResponse>> {
    ensure_artisan(user)?;
    require_non_empty("transcription", &transcription)?;
    validate_images(&images)?;

    let draft = ai::generate_or_fallback(state.generator.as_ref(), &transcription, &images).await;
    let price = ai::parse_price_minor(&draft.suggested_price);
    let listing_id = Uuid::new_v4();

    let txn = state.orm.begin().await?;
    let model = draft_active_model(
        listing_id,
        user.user_id,
        &transcription,
        &draft,
        price,
        state.generator.model_name(),
    )
    .insert(&txn)
    .await?;

    let mut image_ids = Vec::with_capacity(images.len());
    for (position, image) in images.into_iter().enumerate() {
        let image_id = Uuid::new_v4();
        ImageActive {
            id: Set(image_id),
            listing_id: Set(listing_id),
            filename: Set(image.filename),
            content_type: Set(image.content_type),
            data: Set(image.bytes),
            position: Set(position as i32),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;
        image_ids.push(image_id);
    }
    txn.commit().await?;

    tracing::info!(
        %listing_id,
        images = image_ids.len(),
        fallback_used = draft.fallback_used,
        "draft listing generated"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        "listing_generate",
        "listings",
        serde_json::json!({ "listing_id": listing_id, "fallback_used": draft.fallback_used }),
    )
    .await;

    let listing = listing_from_entity(model, image_ids.clone(), &state.config.public_base_url)?;
    Ok(ApiResponse::success(
        "Listing created successfully",
        GenerateListingResponse {
            listing_id,
            image_ids,
            draft,
            listing,
        },
        Some(Meta::empty()),
    ))
}

fn draft_active_model(
    id: Uuid,
    artisan_id: Uuid,
    transcription: &str,
    draft: &GeneratedListing,
    price: i64,
    model_name: &str,
) -> ListingActive {
    ListingActive {
        id: Set(id),
        artisan_id: Set(artisan_id),
        title: Set(draft.title.clone()),
        description: Set(draft.description.clone()),
        price: Set(price),
        original_price: Set(price),
        suggested_price: Set(Some(draft.suggested_price.clone())),
        category: Set(draft.category.clone()),
        tags: Set(serde_json::json!(draft.tags)),
        features: Set(serde_json::json!(draft.features)),
        specifications: Set(serde_json::json!(draft.specifications)),
        story: Set(draft.story.clone()),
        transcription: Set(Some(transcription.to_string())),
        status: Set(ListingStatus::Draft.as_str().to_string()),
        ai_generated: Set(true),
        ai_metadata: Set(Some(serde_json::json!({
            "model": model_name,
            "generated_at": Utc::now(),
            "fallback_used": draft.fallback_used,
        }))),
        in_stock: Set(draft.in_stock),
        stock_count: Set(draft.stock_count),
        shipping_info: Set(serde_json::json!(draft.shipping_info)),
        created_at: NotSet,
        updated_at: NotSet,
    }
}

pub fn validate_images(images: &[ImageInput]) -> AppResult<()> {
    match image_problem(images) {
        Some(problem) => Err(AppError::BadRequest(problem)),
        None => Ok(()),
    }
}

/// First reason an image set cannot be turned into a listing, if any.
pub fn image_problem(images: &[ImageInput]) -> Option<String> {
    if images.is_empty() {
        return Some("At least one image is required".into());
    }
    if images.len() > MAX_IMAGES {
        return Some(format!("At most {MAX_IMAGES} images are allowed"));
    }
    if let Some(image) = images.iter().find(|i| !i.content_type.starts_with("image/")) {
        return Some(format!("File {} is not an image", image.filename));
    }
    images
        .iter()
        .find(|i| i.bytes.is_empty())
        .map(|image| format!("File {} is empty", image.filename))
}

pub async fn update_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateListingRequest,
) -> AppResult<ApiResponse<Listing>> {
    let existing = find_owned_listing(state, user, id, false).await?;
    let mut active: ListingActive = existing.into();

    if let Some(title) = payload.title {
        require_non_empty("title", &title)?;
        active.title = Set(title.trim().to_string());
    }
    if let Some(description) = payload.description {
        active.description = Set(description);
    }
    if let Some(price) = payload.price {
        if price < 0 {
            return Err(AppError::BadRequest("price cannot be negative".into()));
        }
        active.price = Set(price);
    }
    if let Some(original_price) = payload.original_price {
        if original_price < 0 {
            return Err(AppError::BadRequest("original_price cannot be negative".into()));
        }
        active.original_price = Set(original_price);
    }
    if let Some(category) = payload.category {
        require_non_empty("category", &category)?;
        active.category = Set(category.trim().to_string());
    }
    if let Some(tags) = payload.tags {
        let tags: Vec<String> = tags
            .into_iter()
            .map(|t| t.trim().to_string())
            .filter(|t| !t.is_empty())
            .take(ai::MAX_TAGS)
            .collect();
        active.tags = Set(serde_json::json!(tags));
    }
    if let Some(features) = payload.features {
        active.features = Set(serde_json::json!(features));
    }
    if let Some(specifications) = payload.specifications {
        active.specifications = Set(serde_json::json!(specifications));
    }
    if let Some(story) = payload.story {
        active.story = Set(story);
    }
    if let Some(in_stock) = payload.in_stock {
        active.in_stock = Set(in_stock);
    }
    if let Some(stock_count) = payload.stock_count {
        if stock_count < 0 {
            return Err(AppError::BadRequest("stock_count cannot be negative".into()));
        }
        active.stock_count = Set(stock_count);
    }
    if let Some(shipping_info) = payload.shipping_info {
        active.shipping_info = Set(serde_json::json!(shipping_info));
    }
    active.updated_at = Set(Utc::now().into());

    let updated = active.update(&state.orm).await?;
    audit::record(
        &state.pool,
        Some(user.user_id),
        "listing_update",
        "listings",
        serde_json::json!({ "listing_id": id }),
    )
    .await;

    let listing = listing_with_images(state, updated).await?;
    Ok(ApiResponse::success("Updated", listing, Some(Meta::empty())))
}

pub async fn update_listing_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    status: &str,
) -> AppResult<ApiResponse<Listing>> {
    let status = status.parse::<ListingStatus>().map_err(AppError::BadRequest)?;
    let existing = find_owned_listing(state, user, id, false).await?;
    if status.is_visible() && existing.price <= 0 {
        return Err(AppError::BadRequest("Set a price before publishing".into()));
    }

    let mut active: ListingActive = existing.into();
    active.status = Set(status.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let updated = active.update(&state.orm).await?;

    audit::record(
        &state.pool,
        Some(user.user_id),
        "listing_status",
        "listings",
        serde_json::json!({ "listing_id": id, "status": status.as_str() }),
    )
    .await;

    let listing = listing_with_images(state, updated).await?;
    Ok(ApiResponse::success(
        format!("Listing status updated to {}", status.as_str()),
        listing,
        Some(Meta::empty()),
    ))
}

pub async fn delete_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    find_owned_listing(state, user, id, true).await?;
    // images and reviews cascade with the listing
    let result = Listings::delete_by_id(id).exec(&state.orm).await?;
    if result.rows_affected == 0 {
        return Err(AppError::NotFound);
    }

    audit::record(
        &state.pool,
        Some(user.user_id),
        "listing_delete",
        "listings",
        serde_json::json!({ "listing_id": id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Listing deleted successfully",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn get_image(
    state: &AppState,
    listing_id: Uuid,
    image_id: Uuid,
) -> AppResult<ImageModel> {
    ListingImages::find_by_id(image_id)
        .filter(ImgCol::ListingId.eq(listing_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)
}

pub async fn list_artisan_listings(
    state: &AppState,
    user: &AuthUser,
    pagination: Pagination,
) -> AppResult<ApiResponse<ListingList>> {
    ensure_artisan(user)?;
    let (page, limit, offset) = pagination.normalize();
    let finder = Listings::find()
        .filter(Column::ArtisanId.eq(user.user_id))
        .order_by_desc(Column::CreatedAt);

    let total = finder.clone().count(&state.orm).await? as i64;
    let models = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?;

    let items = listings_with_images(state, models).await?;
    Ok(ApiResponse::success(
        "Listings",
        ListingList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

pub async fn add_review(
    state: &AppState,
    user: &AuthUser,
    listing_id: Uuid,
    payload: CreateReviewRequest,
) -> AppResult<ApiResponse<Review>> {
    if !(1..=5).contains(&payload.rating) {
        return Err(AppError::BadRequest("rating must be between 1 and 5".into()));
    }
    require_non_empty("comment", &payload.comment)?;

    let listing = Listings::find_by_id(listing_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    if !parse_status(&listing.status)?.is_visible() {
        return Err(AppError::NotFound);
    }
    if listing.artisan_id == user.user_id {
        return Err(AppError::BadRequest("You cannot review your own listing".into()));
    }

    let reviewer = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    let fulfilled = [
        OrderStatus::Confirmed.as_str(),
        OrderStatus::Shipped.as_str(),
        OrderStatus::Delivered.as_str(),
    ];
    let purchases = Orders::find()
        .filter(OrderCol::BuyerId.eq(user.user_id))
        .filter(OrderCol::ListingId.eq(listing_id))
        .filter(OrderCol::Status.is_in(fulfilled))
        .count(&state.orm)
        .await?;

    let review = ReviewActive {
        id: Set(Uuid::new_v4()),
        listing_id: Set(listing_id),
        user_id: Set(user.user_id),
        user_name: Set(reviewer.display_name),
        rating: Set(payload.rating),
        comment: Set(payload.comment.trim().to_string()),
        verified: Set(purchases > 0),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    refresh_artisan_rating(state, listing.artisan_id).await?;
    audit::record(
        &state.pool,
        Some(user.user_id),
        "review_create",
        "reviews",
        serde_json::json!({ "listing_id": listing_id, "review_id": review.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Review added",
        review_from_entity(review),
        Some(Meta::empty()),
    ))
}

async fn refresh_artisan_rating(state: &AppState, artisan_id: Uuid) -> AppResult<()> {
    sqlx::query(
        r#"
        UPDATE users SET rating = COALESCE((
            SELECT AVG(r.rating)::float8
            FROM reviews r
            JOIN listings l ON l.id = r.listing_id
            WHERE l.artisan_id = $1
        ), 0)
        WHERE id = $1
        "#,
    )
    .bind(artisan_id)
    .execute(&state.pool)
    .await?;
    Ok(())
}

/// Loads a listing the caller may modify. Admins pass only when `allow_admin` is set.
async fn find_owned_listing(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    allow_admin: bool,
) -> AppResult<ListingModel> {
    let listing = Listings::find_by_id(id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    let is_owner = listing.artisan_id == user.user_id;
    let is_admin = allow_admin && user.role == Role::Admin;
    if !is_owner && !is_admin {
        return Err(AppError::Forbidden);
    }
    Ok(listing)
}

async fn listing_with_images(state: &AppState, model: ListingModel) -> AppResult<Listing> {
    let mut listings = listings_with_images(state, vec![model]).await?;
    listings.pop().ok_or(AppError::NotFound)
}

pub(crate) async fn listings_with_images(
    state: &AppState,
    models: Vec<ListingModel>,
) -> AppResult<Vec<Listing>> {
    let ids: Vec<Uuid> = models.iter().map(|m| m.id).collect();
    let mut images = image_ids_by_listing(&state.orm, &ids).await?;
    models
        .into_iter()
        .map(|m| {
            let image_ids = images.remove(&m.id).unwrap_or_default();
            listing_from_entity(m, image_ids, &state.config.public_base_url)
        })
        .collect()
}

pub(crate) async fn image_ids_by_listing<C: ConnectionTrait>(
    conn: &C,
    listing_ids: &[Uuid],
) -> AppResult<HashMap<Uuid, Vec<Uuid>>> {
    if listing_ids.is_empty() {
        return Ok(HashMap::new());
    }
    let rows: Vec<(Uuid, Uuid)> = ListingImages::find()
        .select_only()
        .column(ImgCol::ListingId)
        .column(ImgCol::Id)
        .filter(ImgCol::ListingId.is_in(listing_ids.iter().copied()))
        .order_by_asc(ImgCol::Position)
        .into_tuple()
        .all(conn)
        .await?;

    let mut grouped: HashMap<Uuid, Vec<Uuid>> = HashMap::new();
    for (listing_id, image_id) in rows {
        grouped.entry(listing_id).or_default().push(image_id);
    }
    Ok(grouped)
}

pub fn image_url(base_url: &str, listing_id: Uuid, image_id: Uuid) -> String {
    format!(
        "{}/api/listings/{listing_id}/images/{image_id}",
        base_url.trim_end_matches('/')
    )
}

fn parse_status(raw: &str) -> AppResult<ListingStatus> {
    raw.parse::<ListingStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

pub fn listing_from_entity(
    model: ListingModel,
    image_ids: Vec<Uuid>,
    base_url: &str,
) -> AppResult<Listing> {
    let images = image_ids
        .iter()
        .map(|image_id| image_url(base_url, model.id, *image_id))
        .collect();
    Ok(Listing {
        id: model.id,
        artisan_id: model.artisan_id,
        title: model.title,
        description: model.description,
        price: model.price,
        original_price: model.original_price,
        suggested_price: model.suggested_price,
        category: model.category,
        tags: serde_json::from_value(model.tags).unwrap_or_default(),
        features: serde_json::from_value(model.features).unwrap_or_default(),
        specifications: serde_json::from_value(model.specifications).unwrap_or_default(),
        story: model.story,
        status: parse_status(&model.status)?,
        ai_generated: model.ai_generated,
        in_stock: model.in_stock,
        stock_count: model.stock_count,
        shipping_info: serde_json::from_value::<ShippingInfo>(model.shipping_info)
            .unwrap_or_default(),
        image_ids,
        images,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

fn review_from_entity(model: ReviewModel) -> Review {
    Review {
        id: model.id,
        listing_id: model.listing_id,
        user_id: model.user_id,
        user_name: model.user_name,
        rating: model.rating,
        comment: model.comment,
        verified: model.verified,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|s| !s.is_empty())
}

/// Escapes LIKE metacharacters so user input matches literally.
fn escape_like(input: &str) -> String {
    let mut escaped = String::with_capacity(input.len());
    for c in input.chars() {
        if matches!(c, '%' | '_' | '\\') {
            escaped.push('\\');
        }
        escaped.push(c);
    }
    escaped
}

fn contains_pattern(input: &str) -> String {
    format!("%{}%", escape_like(input))
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    fn image(name: &str, content_type: &str) -> ImageInput {
        ImageInput {
            filename: name.into(),
            content_type: content_type.into(),
            bytes: vec![0xFF, 0xD8],
        }
    }

    #[test]
    fn escapes_like_metacharacters() {
        assert_eq!(escape_like("50%_off\\"), "50\\%\\_off\\\\");
        assert_eq!(contains_pattern("jaipur"), "%jaipur%");
    }

    #[test]
    fn rejects_inverted_price_range() {
        let query = ListingQuery {
            min_price: Some(5_000),
            max_price: Some(1_000),
            ..Default::default()
        };
        assert!(matches!(search_condition(&query), Err(AppError::BadRequest(_))));

        let negative = ListingQuery {
            min_price: Some(-1),
            ..Default::default()
        };
        assert!(search_condition(&negative).is_err());
    }

    #[test]
    fn search_sql_includes_every_filter() {
        let query = ListingQuery {
            q: Some("diya".into()),
            category: Some("Crafts".into()),
            location: Some("Rajasthan".into()),
            min_price: Some(100),
            max_price: Some(50_000),
            ..Default::default()
        };
        let sql = Listings::find()
            .filter(search_condition(&query).expect("valid query"))
            .build(DbBackend::Postgres)
            .to_string();

        assert!(sql.contains(r#""status" IN ('active', 'published')"#));
        assert!(sql.contains("ILIKE '%diya%'"));
        assert!(sql.contains("ILIKE 'Crafts'"));
        assert!(sql.contains("ILIKE '%Rajasthan%'"));
        assert!(sql.contains(r#""price" >= 100"#));
        assert!(sql.contains(r#""price" <= 50000"#));
    }

    #[test]
    fn blank_filters_are_ignored() {
        let query = ListingQuery {
            q: Some("   ".into()),
            category: Some(String::new()),
            ..Default::default()
        };
        let sql = Listings::find()
            .filter(search_condition(&query).expect("valid query"))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(!sql.contains("ILIKE"));
    }

    #[test]
    fn image_validation() {
        assert!(validate_images(&[]).is_err());
        assert!(validate_images(&[image("a.jpg", "image/jpeg")]).is_ok());
        assert!(validate_images(&[image("notes.pdf", "application/pdf")]).is_err());
        let many: Vec<_> = (0..=MAX_IMAGES)
            .map(|i| image(&format!("{i}.png"), "image/png"))
            .collect();
        assert!(validate_images(&many).is_err());
        let empty = ImageInput {
            filename: "empty.png".into(),
            content_type: "image/png".into(),
            bytes: Vec::new(),
        };
        assert!(validate_images(&[empty]).is_err());
    }

    #[test]
    fn image_urls_are_absolute() {
        let listing = Uuid::nil();
        let image = Uuid::nil();
        assert_eq!(
            image_url("http://localhost:3000/", listing, image),
            format!("http://localhost:3000/api/listings/{listing}/images/{image}")
        );
    }
}
