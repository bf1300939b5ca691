use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Buyer,
    Artisan,
    Admin,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Buyer => "buyer",
            Role::Artisan => "artisan",
            Role::Admin => "admin",
        }
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "buyer" | "user" => Ok(Role::Buyer),
            "artisan" | "artist" => Ok(Role::Artisan),
            "admin" => Ok(Role::Admin),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum ListingStatus {
    Draft,
    Active,
    Inactive,
    Published,
}

impl ListingStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            ListingStatus::Draft => "draft",
            ListingStatus::Active => "active",
            ListingStatus::Inactive => "inactive",
            ListingStatus::Published => "published",
        }
    }

    /// Statuses shown in the public marketplace.
    pub fn visible() -> [ListingStatus; 2] {
        [ListingStatus::Active, ListingStatus::Published]
    }

    pub fn is_visible(&self) -> bool {
        Self::visible().contains(self)
    }
}

impl FromStr for ListingStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "draft" => Ok(ListingStatus::Draft),
            "active" => Ok(ListingStatus::Active),
            "inactive" => Ok(ListingStatus::Inactive),
            "published" => Ok(ListingStatus::Published),
            other => Err(format!(
                "Invalid status {other}. Must be one of: draft, active, inactive, published"
            )),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Confirmed,
    Shipped,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Pending => "pending",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Shipped => "shipped",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    pub fn can_transition_to(&self, next: OrderStatus) -> bool {
        use OrderStatus::*;
        matches!(
            (self, next),
            (Pending, Confirmed)
                | (Confirmed, Shipped)
                | (Shipped, Delivered)
                | (Pending, Cancelled)
                | (Confirmed, Cancelled)
        )
    }
}

impl FromStr for OrderStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(OrderStatus::Pending),
            "confirmed" => Ok(OrderStatus::Confirmed),
            "shipped" => Ok(OrderStatus::Shipped),
            "delivered" => Ok(OrderStatus::Delivered),
            "cancelled" => Ok(OrderStatus::Cancelled),
            other => Err(format!("unknown order status: {other}")),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct User {
    pub id: Uuid,
    pub email: String,
    pub display_name: String,
    pub role: Role,
    pub phone_number: Option<String>,
    pub address: Option<String>,
    pub location: Option<String>,
    pub profile_picture: Option<String>,
    pub bio: Option<String>,
    pub specialization: Option<String>,
    pub portfolio_url: Option<String>,
    pub years_of_experience: Option<i32>,
    pub rating: f64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

pub const FALLBACK_AVATAR: &str = "/placeholder.svg";

/// Seller display data attached to listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ArtisanSummary {
    pub id: Option<Uuid>,
    pub name: String,
    pub location: String,
    pub experience: String,
    pub rating: f64,
    pub bio: String,
    pub avatar: String,
}

impl ArtisanSummary {
    pub fn fallback() -> Self {
        Self {
            id: None,
            name: "Unknown Artisan".to_string(),
            location: "N/A".to_string(),
            experience: "N/A".to_string(),
            rating: 0.0,
            bio: "No bio available.".to_string(),
            avatar: FALLBACK_AVATAR.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ShippingInfo {
    pub estimated_days: String,
    pub return_policy: String,
}

impl Default for ShippingInfo {
    fn default() -> Self {
        Self {
            estimated_days: "3-5 business days".to_string(),
            return_policy: "30-day returns".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Listing {
    pub id: Uuid,
    pub artisan_id: Uuid,
    pub title: String,
    pub description: String,
    /// Price in minor units (paise).
    pub price: i64,
    pub original_price: i64,
    pub suggested_price: Option<String>,
    pub category: String,
    pub tags: Vec<String>,
    pub features: Vec<String>,
    pub specifications: BTreeMap<String, String>,
    pub story: String,
    pub status: ListingStatus,
    pub ai_generated: bool,
    pub in_stock: bool,
    pub stock_count: i32,
    pub shipping_info: ShippingInfo,
    pub image_ids: Vec<Uuid>,
    pub images: Vec<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Review {
    pub id: Uuid,
    pub listing_id: Uuid,
    pub user_id: Uuid,
    pub user_name: String,
    pub rating: i32,
    pub comment: String,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Order {
    pub id: Uuid,
    pub listing_id: Option<Uuid>,
    pub buyer_id: Uuid,
    pub product_title: String,
    pub product_image: Option<String>,
    pub unit_price: i64,
    pub buyer_name: String,
    pub buyer_email: String,
    pub buyer_phone: String,
    pub shipping_address: String,
    pub quantity: i32,
    pub amount: i64,
    pub status: OrderStatus,
    pub payment_method: String,
    pub checkout_session_id: Option<String>,
    pub tracking_number: Option<String>,
    pub estimated_delivery: Option<String>,
    pub delivered_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}
