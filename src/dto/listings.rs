use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::{
    ai::GeneratedListing,
    models::{ArtisanSummary, Listing, Review, ShippingInfo},
};

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListingList {
    pub items: Vec<Listing>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ListingDetail {
    pub listing: Listing,
    pub artisan: ArtisanSummary,
    pub reviews: Vec<Review>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct GenerateListingResponse {
    pub listing_id: Uuid,
    pub image_ids: Vec<Uuid>,
    pub draft: GeneratedListing,
    pub listing: Listing,
}

/// Edits to the structured listing; absent fields are left unchanged.
#[derive(Debug, Clone, Default, Deserialize, Serialize, ToSchema)]
pub struct UpdateListingRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub price: Option<i64>,
    pub original_price: Option<i64>,
    pub category: Option<String>,
    pub tags: Option<Vec<String>>,
    pub features: Option<Vec<String>>,
    pub specifications: Option<BTreeMap<String, String>>,
    pub story: Option<String>,
    pub in_stock: Option<bool>,
    pub stock_count: Option<i32>,
    pub shipping_info: Option<ShippingInfo>,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct UpdateListingStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, Serialize, ToSchema)]
pub struct CreateReviewRequest {
    pub rating: i32,
    pub comment: String,
}

/// Multipart form accepted by the generate endpoint.
#[derive(Debug, ToSchema)]
pub struct GenerateListingForm {
    pub transcription: String,
    #[schema(value_type = Vec<String>, format = Binary)]
    pub images: Vec<Vec<u8>>,
}
