use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, EntityTrait, QueryFilter, QuerySelect, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::checkout::{
        BuyerContact, CheckoutSessionResponse, CompleteCheckoutRequest,
        CreateCheckoutSessionRequest,
    },
    entity::{
        listings::{Column as ListingCol, Entity as Listings, Model as ListingModel},
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{ListingStatus, Order, OrderStatus},
    payments::{CheckoutSessionRequest, SessionPaymentStatus},
    response::{ApiResponse, Meta},
    services::{listing_service, order_service::order_from_entity},
    state::AppState,
    validation::{require_non_empty, require_phone},
};

pub const PAYMENT_METHOD: &str = "card";

/// Records a pending order and opens a hosted checkout session for it.
pub async fn create_session(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCheckoutSessionRequest,
) -> AppResult<ApiResponse<CheckoutSessionResponse>> {
    validate_contact(&payload.buyer)?;
    let quantity = payload.quantity.unwrap_or(1);
    if quantity < 1 {
        return Err(AppError::BadRequest("quantity must be at least 1".into()));
    }

    let listing = Listings::find_by_id(payload.listing_id)
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;
    ensure_purchasable(&listing, quantity)?;

    let buyer = Users::find_by_id(user.user_id)
        .one(&state.orm)
        .await?
        .ok_or_else(|| AppError::Unauthorized("Unknown user".into()))?;

    let product_image = listing_service::image_ids_by_listing(&state.orm, &[listing.id])
        .await?
        .remove(&listing.id)
        .and_then(|ids| ids.first().copied())
        .map(|image_id| {
            listing_service::image_url(&state.config.public_base_url, listing.id, image_id)
        });

    let order_id = Uuid::new_v4();
    let amount = listing
        .price
        .checked_mul(quantity as i64)
        .ok_or_else(|| AppError::BadRequest("Order amount is too large".into()))?;

    let order = OrderActive {
        id: Set(order_id),
        listing_id: Set(Some(listing.id)),
        buyer_id: Set(user.user_id),
        product_title: Set(listing.title.clone()),
        product_image: Set(product_image),
        unit_price: Set(listing.price),
        buyer_name: Set(payload.buyer.name.trim().to_string()),
        buyer_email: Set(buyer.email.clone()),
        buyer_phone: Set(payload.buyer.phone_number.trim().to_string()),
        shipping_address: Set(payload.buyer.address.trim().to_string()),
        quantity: Set(quantity),
        amount: Set(amount),
        status: Set(OrderStatus::Pending.as_str().to_string()),
        payment_method: Set(PAYMENT_METHOD.to_string()),
        checkout_session_id: Set(None),
        tracking_number: Set(None),
        estimated_delivery: Set(None),
        delivered_at: Set(None),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    let request = CheckoutSessionRequest {
        order_id,
        product_name: listing.title.clone(),
        product_description: listing.description.clone(),
        unit_amount: listing.price,
        quantity,
        currency: state.config.checkout.currency.clone(),
        customer_email: buyer.email,
        success_url: state.config.checkout.success_url.clone(),
        cancel_url: state.config.checkout.cancel_url.clone(),
    };

    let session = match state.payments.create_session(&request).await {
        Ok(session) => session,
        Err(err) => {
            tracing::error!(error = %err, %order_id, "checkout session creation failed");
            let mut active: OrderActive = order.into();
            active.status = Set(OrderStatus::Cancelled.as_str().to_string());
            active.updated_at = Set(Utc::now().into());
            active.update(&state.orm).await?;
            return Err(AppError::Upstream(format!(
                "Failed to create checkout session: {err}"
            )));
        }
    };

    let mut active: OrderActive = order.into();
    active.checkout_session_id = Set(Some(session.id.clone()));
    active.updated_at = Set(Utc::now().into());
    active.update(&state.orm).await?;

    tracing::info!(%order_id, session_id = %session.id, amount, "checkout session created");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout_session",
        "orders",
        serde_json::json!({ "order_id": order_id, "session_id": session.id }),
    )
    .await;

    Ok(ApiResponse::success(
        "Checkout session created",
        CheckoutSessionResponse {
            order_id,
            session_id: session.id,
            url: session.url,
        },
        Some(Meta::empty()),
    ))
}

/// Reconciles a pending order with the gateway once the buyer returns.
pub async fn complete(
    state: &AppState,
    user: &AuthUser,
    payload: CompleteCheckoutRequest,
) -> AppResult<ApiResponse<Order>> {
    require_non_empty("session_id", &payload.session_id)?;

    let order = Orders::find()
        .filter(OrderCol::CheckoutSessionId.eq(payload.session_id.clone()))
        .filter(OrderCol::BuyerId.eq(user.user_id))
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    if order.status != OrderStatus::Pending.as_str() {
        return Ok(ApiResponse::success(
            "Order already processed",
            order_from_entity(order)?,
            Some(Meta::empty()),
        ));
    }

    let payment = state
        .payments
        .session_status(&payload.session_id)
        .await
        .map_err(|err| AppError::Upstream(format!("Failed to verify payment: {err}")))?;

    let next = match payment {
        SessionPaymentStatus::Paid => OrderStatus::Confirmed,
        SessionPaymentStatus::Expired => OrderStatus::Cancelled,
        SessionPaymentStatus::Unpaid => {
            return Ok(ApiResponse::success(
                "Payment pending",
                order_from_entity(order)?,
                Some(Meta::empty()),
            ));
        }
    };

    let txn = state.orm.begin().await?;
    let locked = Orders::find_by_id(order.id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;
    if locked.status != OrderStatus::Pending.as_str() {
        txn.rollback().await?;
        return Ok(ApiResponse::success(
            "Order already processed",
            order_from_entity(locked)?,
            Some(Meta::empty()),
        ));
    }

    if next == OrderStatus::Confirmed {
        if let Some(listing_id) = locked.listing_id {
            Listings::update_many()
                .col_expr(
                    ListingCol::StockCount,
                    Expr::cust_with_values("GREATEST(stock_count - ?, 0)", [locked.quantity]),
                )
                .col_expr(
                    ListingCol::InStock,
                    Expr::cust_with_values("stock_count - ? > 0", [locked.quantity]),
                )
                .filter(ListingCol::Id.eq(listing_id))
                .exec(&txn)
                .await?;
        }
    }

    let mut active: OrderActive = locked.into();
    active.status = Set(next.as_str().to_string());
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(order_id = %order.id, status = next.as_str(), "checkout completed");
    audit::record(
        &state.pool,
        Some(user.user_id),
        "checkout_complete",
        "orders",
        serde_json::json!({ "order_id": order.id, "status": next.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Order {}", next.as_str()),
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

pub fn validate_contact(buyer: &BuyerContact) -> AppResult<()> {
    require_non_empty("name", &buyer.name)?;
    require_phone(&buyer.phone_number)?;
    require_non_empty("address", &buyer.address)?;
    Ok(())
}

fn ensure_purchasable(listing: &ListingModel, quantity: i32) -> AppResult<()> {
    let visible = listing
        .status
        .parse::<ListingStatus>()
        .is_ok_and(|s| s.is_visible());
    if !visible {
        return Err(AppError::NotFound);
    }
    if !listing.in_stock || listing.stock_count < quantity {
        return Err(AppError::BadRequest(format!(
            "Only {} left in stock",
            listing.stock_count.max(0)
        )));
    }
    if listing.price <= 0 {
        return Err(AppError::BadRequest("Listing has no price".into()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn listing(status: &str, stock: i32) -> ListingModel {
        let now = Utc::now().fixed_offset();
        ListingModel {
            id: Uuid::new_v4(),
            artisan_id: Uuid::new_v4(),
            title: "Blue Pottery Vase".into(),
            description: "Hand-painted Jaipur blue pottery".into(),
            price: 129_900,
            original_price: 149_900,
            suggested_price: Some("₹1,299".into()),
            category: "Pottery".into(),
            tags: serde_json::json!(["pottery"]),
            features: serde_json::json!([]),
            specifications: serde_json::json!({}),
            story: String::new(),
            transcription: None,
            status: status.into(),
            ai_generated: true,
            ai_metadata: None,
            in_stock: stock > 0,
            stock_count: stock,
            shipping_info: serde_json::json!({}),
            created_at: now,
            updated_at: now,
        }
    }

    #[test]
    fn contact_requires_every_field() {
        let contact = BuyerContact {
            name: "Asha".into(),
            phone_number: "+91 98765 43210".into(),
            address: "12 MG Road, Pune".into(),
        };
        assert!(validate_contact(&contact).is_ok());

        let bad_phone = BuyerContact {
            phone_number: "12ab".into(),
            ..contact.clone()
        };
        assert!(validate_contact(&bad_phone).is_err());

        let no_address = BuyerContact {
            address: "  ".into(),
            ..contact
        };
        assert!(validate_contact(&no_address).is_err());
    }

    #[test]
    fn drafts_and_sold_out_listings_cannot_be_bought() {
        assert!(ensure_purchasable(&listing("active", 3), 2).is_ok());
        assert!(ensure_purchasable(&listing("published", 1), 1).is_ok());
        assert!(matches!(
            ensure_purchasable(&listing("draft", 3), 1),
            Err(AppError::NotFound)
        ));
        assert!(matches!(
            ensure_purchasable(&listing("active", 1), 2),
            Err(AppError::BadRequest(_))
        ));
        assert!(ensure_purchasable(&listing("active", 0), 1).is_err());
    }
}
