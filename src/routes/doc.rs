use utoipa::{
    Modify, OpenApi,
    openapi::{
        self,
        OpenApi as OpenApiSpec,
        security::{HttpAuthScheme, HttpBuilder, SecurityScheme},
    },
};
use utoipa_scalar::{Scalar, Servable};

use crate::{
    ai::GeneratedListing,
    dto::{
        auth::{
            LoginRequest, LoginResponse, RegisterRequest, VerifyTokenRequest, VerifyTokenResponse,
        },
        checkout::{
            BuyerContact, CheckoutSessionResponse, CompleteCheckoutRequest,
            CreateCheckoutSessionRequest,
        },
        listings::{
            CreateReviewRequest, GenerateListingForm, GenerateListingResponse, ListingDetail,
            ListingList, UpdateListingRequest, UpdateListingStatusRequest,
        },
        orders::{OrderList, UpdateOrderStatusRequest},
        profiles::{UpdateArtisanProfileRequest, UpdateProfileRequest},
    },
    models::{
        ArtisanSummary, Listing, ListingStatus, Order, OrderStatus, Review, Role, ShippingInfo,
        User,
    },
    response::{ApiResponse, Meta},
    routes::{artisans, auth, checkout, health, listings, orders, params, users},
};

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(
        health::health_check,
        auth::register,
        auth::login,
        auth::verify_token,
        users::get_me,
        users::update_me,
        users::delete_me,
        artisans::get_profile,
        artisans::update_profile,
        artisans::my_listings,
        artisans::my_orders,
        artisans::get_artisan,
        listings::list_listings,
        listings::generate_listing,
        listings::get_listing,
        listings::update_listing,
        listings::update_listing_status,
        listings::delete_listing,
        listings::get_listing_image,
        listings::add_review,
        checkout::create_session,
        checkout::complete,
        orders::list_orders,
        orders::get_order,
        orders::update_order_status
    ),
    components(
        schemas(
            User,
            Role,
            ArtisanSummary,
            Listing,
            ListingStatus,
            ShippingInfo,
            Review,
            Order,
            OrderStatus,
            GeneratedListing,
            RegisterRequest,
            LoginRequest,
            LoginResponse,
            VerifyTokenRequest,
            VerifyTokenResponse,
            UpdateProfileRequest,
            UpdateArtisanProfileRequest,
            ListingList,
            ListingDetail,
            GenerateListingForm,
            GenerateListingResponse,
            UpdateListingRequest,
            UpdateListingStatusRequest,
            CreateReviewRequest,
            BuyerContact,
            CreateCheckoutSessionRequest,
            CheckoutSessionResponse,
            CompleteCheckoutRequest,
            OrderList,
            UpdateOrderStatusRequest,
            health::HealthData,
            params::Pagination,
            params::ListingQuery,
            params::OrderListQuery,
            Meta,
            ApiResponse<User>,
            ApiResponse<Listing>,
            ApiResponse<ListingList>,
            ApiResponse<ListingDetail>,
            ApiResponse<Order>,
            ApiResponse<OrderList>
        )
    ),
    security(
        ("bearer_auth" = [])
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Health", description = "Health check endpoint"),
        (name = "Auth", description = "Authentication endpoints"),
        (name = "Users", description = "Account profile endpoints"),
        (name = "Artisans", description = "Artisan profile and dashboard endpoints"),
        (name = "Listings", description = "Marketplace listing endpoints"),
        (name = "Checkout", description = "Hosted checkout endpoints"),
        (name = "Orders", description = "Order endpoints"),
    )
)]
pub struct ApiDoc;

pub fn scalar_docs() -> Scalar<OpenApiSpec> {
    Scalar::with_url("/docs", ApiDoc::openapi())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_api_path_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/health",
            "/api/auth/verify-token",
            "/api/listings",
            "/api/listings/generate",
            "/api/listings/{id}/status",
            "/api/checkout/session",
            "/api/artisans/me/orders",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
