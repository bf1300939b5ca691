use chrono::Utc;
use sea_orm::sea_query::{LockType, Query};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, PaginatorTrait, QueryFilter,
    QueryOrder, QuerySelect, Select, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit,
    dto::orders::{OrderList, UpdateOrderStatusRequest},
    entity::{
        listings::{Column as ListingCol, Entity as Listings},
        orders::{
            ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_artisan},
    models::{Order, OrderStatus, Role},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    state::AppState,
};

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let condition = Condition::all().add(OrderCol::BuyerId.eq(user.user_id));
    paginate_orders(state, condition, &query).await
}

/// Orders placed against the calling artisan's listings.
pub async fn artisan_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    ensure_artisan(user)?;
    let own_listings = Query::select()
        .column(ListingCol::Id)
        .from(Listings)
        .and_where(ListingCol::ArtisanId.eq(user.user_id))
        .to_owned();
    let condition = Condition::all().add(OrderCol::ListingId.in_subquery(own_listings));
    paginate_orders(state, condition, &query).await
}

async fn paginate_orders(
    state: &AppState,
    mut condition: Condition,
    query: &OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination().normalize();
    if let Some(status) = query.status.as_deref().filter(|s| !s.is_empty()) {
        let status = status.parse::<OrderStatus>().map_err(AppError::BadRequest)?;
        condition = condition.add(OrderCol::Status.eq(status.as_str()));
    }

    let finder = sorted(Orders::find().filter(condition), query.sort_order);
    let total = finder.clone().count(&state.orm).await? as i64;
    let items = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect::<AppResult<Vec<_>>>()?;

    Ok(ApiResponse::success(
        "Ok",
        OrderList { items },
        Some(Meta::new(page, limit, total)),
    ))
}

fn sorted(finder: Select<Orders>, order: Option<SortOrder>) -> Select<Orders> {
    match order.unwrap_or(SortOrder::Desc) {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    }
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Order>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::BuyerId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?
        .ok_or(AppError::NotFound)?;

    Ok(ApiResponse::success(
        "OK",
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

/// Moves an order along its fulfillment path. Only admins and the artisan who
/// owns the ordered listing may do this.
pub async fn update_order_status(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderStatusRequest,
) -> AppResult<ApiResponse<Order>> {
    let next = payload
        .status
        .parse::<OrderStatus>()
        .map_err(AppError::BadRequest)?;

    let txn = state.orm.begin().await?;
    let order = Orders::find_by_id(id)
        .lock(LockType::Update)
        .one(&txn)
        .await?
        .ok_or(AppError::NotFound)?;

    if user.role != Role::Admin {
        let owns_listing = match order.listing_id {
            Some(listing_id) => Listings::find_by_id(listing_id)
                .one(&txn)
                .await?
                .is_some_and(|l| l.artisan_id == user.user_id),
            None => false,
        };
        if !owns_listing {
            return Err(AppError::Forbidden);
        }
    }

    let current = parse_status(&order.status)?;
    if !current.can_transition_to(next) {
        return Err(AppError::BadRequest(format!(
            "Cannot move order from {} to {}",
            current.as_str(),
            next.as_str()
        )));
    }

    let now = Utc::now();
    let mut active: OrderActive = order.into();
    active.status = Set(next.as_str().to_string());
    if let Some(tracking) = payload.tracking_number.filter(|t| !t.trim().is_empty()) {
        active.tracking_number = Set(Some(tracking));
    }
    if let Some(estimate) = payload.estimated_delivery.filter(|e| !e.trim().is_empty()) {
        active.estimated_delivery = Set(Some(estimate));
    }
    if next == OrderStatus::Delivered {
        active.delivered_at = Set(Some(now.into()));
    }
    active.updated_at = Set(now.into());
    let order = active.update(&txn).await?;
    txn.commit().await?;

    tracing::info!(
        order_id = %id,
        from = current.as_str(),
        to = next.as_str(),
        "order status changed"
    );
    audit::record(
        &state.pool,
        Some(user.user_id),
        "order_status",
        "orders",
        serde_json::json!({ "order_id": id, "status": next.as_str() }),
    )
    .await;

    Ok(ApiResponse::success(
        format!("Order {}", next.as_str()),
        order_from_entity(order)?,
        Some(Meta::empty()),
    ))
}

fn parse_status(raw: &str) -> AppResult<OrderStatus> {
    raw.parse::<OrderStatus>()
        .map_err(|e| AppError::Internal(anyhow::anyhow!(e)))
}

pub(crate) fn order_from_entity(model: OrderModel) -> AppResult<Order> {
    Ok(Order {
        id: model.id,
        listing_id: model.listing_id,
        buyer_id: model.buyer_id,
        product_title: model.product_title,
        product_image: model.product_image,
        unit_price: model.unit_price,
        buyer_name: model.buyer_name,
        buyer_email: model.buyer_email,
        buyer_phone: model.buyer_phone,
        shipping_address: model.shipping_address,
        quantity: model.quantity,
        amount: model.amount,
        status: parse_status(&model.status)?,
        payment_method: model.payment_method,
        checkout_session_id: model.checkout_session_id,
        tracking_number: model.tracking_number,
        estimated_delivery: model.estimated_delivery,
        delivered_at: model.delivered_at.map(|dt| dt.with_timezone(&Utc)),
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::{DbBackend, QueryTrait};

    #[test]
    fn unknown_stored_status_is_internal() {
        assert!(matches!(parse_status("lost"), Err(AppError::Internal(_))));
        assert_eq!(parse_status("shipped").ok(), Some(OrderStatus::Shipped));
    }

    #[test]
    fn orders_default_to_newest_first() {
        let sql = sorted(Orders::find(), None)
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.ends_with(r#"ORDER BY "orders"."created_at" DESC"#));

        let sql = sorted(Orders::find(), Some(SortOrder::Asc))
            .build(DbBackend::Postgres)
            .to_string();
        assert!(sql.ends_with(r#"ORDER BY "orders"."created_at" ASC"#));
    }
}
