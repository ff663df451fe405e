use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::sea_query::{Expr, LockType};
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, FromQueryResult, JoinType,
    PaginatorTrait, QueryFilter, QueryOrder, QuerySelect, RelationTrait, Set, TransactionTrait,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::orders::{
        CheckoutData, CheckoutRequest, OrderList, OrderWithItems, UpdateOrderItemRequest,
        UpdateOrderRequest,
    },
    entity::{
        cart_items::{self, Column as CartItemCol, Entity as CartItems},
        carts::{ActiveModel as CartActive, Column as CartCol, Entity as Carts},
        coupons::{Column as CouponCol, Entity as Coupons},
        order_items::{
            ActiveModel as OrderItemActive, Column as OrderItemCol, Entity as OrderItems,
            Model as OrderItemModel,
        },
        orders::{ActiveModel as OrderActive, Column as OrderCol, Entity as Orders, Model as OrderModel},
        payments::{
            ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments,
            Model as PaymentModel,
        },
        products::{Column as ProdCol, Entity as Products},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Order, OrderItem, Payment, PaymentMethod},
    response::{ApiResponse, Meta},
    routes::params::{OrderListQuery, SortOrder},
    services::coupon_service::{discount_amount, is_coupon_valid},
    services::payment_service::build_tx_ref,
    state::AppState,
};

const ORDER_STATUSES: [&str; 2] = ["processing", "shipped"];

/// Convert the caller's active cart into an order. Every step runs inside a
/// single transaction: the cart row and the product rows are locked up
/// front, stock is decremented conditionally, and the payment (including
/// the external gateway call) must succeed before anything commits. Any
/// failure rolls the whole attempt back.
pub async fn checkout(
    state: &AppState,
    user: &AuthUser,
    payload: CheckoutRequest,
) -> AppResult<ApiResponse<CheckoutData>> {
    let txn = state.orm.begin().await?;

    let cart = Carts::find()
        .filter(
            Condition::all()
                .add(CartCol::UserId.eq(user.user_id))
                .add(CartCol::Status.eq("active")),
        )
        .order_by_desc(CartCol::CreatedAt)
        .lock(LockType::Update)
        .one(&txn)
        .await?;
    let cart = match cart {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    #[derive(Debug, FromQueryResult)]
    struct CartLineRow {
        product_id: Uuid,
        quantity: i32,
        price: i64,
        stock: i32,
    }

    let rows = CartItems::find()
        .select_only()
        .column_as(CartItemCol::ProductId, "product_id")
        .column_as(CartItemCol::Quantity, "quantity")
        .column_as(ProdCol::Price, "price")
        .column_as(ProdCol::Stock, "stock")
        .join(JoinType::InnerJoin, cart_items::Relation::Products.def())
        .filter(CartItemCol::CartId.eq(cart.id))
        .lock(LockType::Update)
        .into_model::<CartLineRow>()
        .all(&txn)
        .await?;

    if rows.is_empty() {
        return Err(AppError::BadRequest("Cart is empty".into()));
    }

    let mut subtotal: i64 = 0;
    for row in &rows {
        if row.quantity <= 0 {
            return Err(AppError::BadRequest("Cart has invalid quantity".into()));
        }
        if row.stock < row.quantity {
            return Err(AppError::InsufficientStock(row.product_id));
        }
        subtotal += row.price * (row.quantity as i64);
    }

    let total = match payload.coupon_code.as_deref().filter(|c| !c.is_empty()) {
        Some(code) => {
            let coupon = Coupons::find()
                .filter(CouponCol::Code.eq(code))
                .one(&txn)
                .await?
                .ok_or(AppError::InvalidCoupon)?;
            let now = Utc::now();
            if !is_coupon_valid(coupon.expired, coupon.expiry_date.with_timezone(&Utc), now) {
                return Err(AppError::ExpiredCoupon);
            }
            subtotal - discount_amount(subtotal, coupon.discount_percentage)
        }
        None => subtotal,
    };

    let order_id = Uuid::new_v4();
    let order = OrderActive {
        id: Set(order_id),
        user_id: Set(user.user_id),
        status: Set("processing".into()),
        shipped: Set(false),
        total_amount: Set(total),
        created_at: NotSet,
        updated_at: NotSet,
    }
    .insert(&txn)
    .await?;

    let mut order_items: Vec<OrderItem> = Vec::new();
    for row in &rows {
        let item = OrderItemActive {
            id: Set(Uuid::new_v4()),
            order_id: Set(order.id),
            product_id: Set(row.product_id),
            quantity: Set(row.quantity),
            price: Set(row.price),
            created_at: NotSet,
        }
        .insert(&txn)
        .await?;

        order_items.push(order_item_from_entity(item));

        // Conditional decrement: the stock filter makes the update a no-op
        // when another checkout got there first, even without the row lock.
        let result = Products::update_many()
            .col_expr(ProdCol::Stock, Expr::col(ProdCol::Stock).sub(row.quantity))
            .filter(ProdCol::Id.eq(row.product_id))
            .filter(ProdCol::Stock.gte(row.quantity))
            .exec(&txn)
            .await?;
        if result.rows_affected == 0 {
            return Err(AppError::InsufficientStock(row.product_id));
        }
    }

    let tx_ref = build_tx_ref(order.id);
    let payment = PaymentActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(order.id),
        user_id: Set(user.user_id),
        amount: Set(total),
        payment_method: Set(payload.payment_method.as_str().into()),
        transaction_id: Set(tx_ref.clone()),
        payment_status: Set("Pending".into()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| AppError::PaymentCreation(err.to_string()))?;

    // The gateway call happens before commit: a rejection or timeout rolls
    // back the order, items, payment and stock decrements in one go.
    let payment_link = match payload.payment_method {
        PaymentMethod::Flutterwave => {
            let account = Users::find_by_id(user.user_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user record missing")))?;
            let charge = state.gateway.initiate(&tx_ref, total, &account.email).await?;
            charge.payment_link
        }
        PaymentMethod::BankTransfer | PaymentMethod::Card => None,
    };

    CartItems::delete_many()
        .filter(CartItemCol::CartId.eq(cart.id))
        .exec(&txn)
        .await?;

    let mut cart_active: CartActive = cart.into();
    cart_active.status = Set("checked_out".into());
    cart_active.total = Set(total);
    cart_active.update(&txn).await?;

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "checkout",
        Some("orders"),
        Some(serde_json::json!({ "order_id": order.id, "total": total })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Checkout success",
        CheckoutData {
            order: order_from_entity(order),
            items: order_items,
            payment: payment_from_entity(payment),
            payment_link,
        },
        Some(Meta::empty()),
    ))
}

pub async fn list_orders(
    state: &AppState,
    user: &AuthUser,
    query: OrderListQuery,
) -> AppResult<ApiResponse<OrderList>> {
    let (page, limit, offset) = query.pagination.normalize();
    let mut condition = Condition::all().add(OrderCol::UserId.eq(user.user_id));
    if let Some(status) = query.status.as_ref().filter(|s| !s.is_empty()) {
        condition = condition.add(OrderCol::Status.eq(status.clone()));
    }

    let sort_order = query.sort_order.unwrap_or(SortOrder::Desc);

    let mut finder = Orders::find().filter(condition);
    finder = match sort_order {
        SortOrder::Asc => finder.order_by_asc(OrderCol::CreatedAt),
        SortOrder::Desc => finder.order_by_desc(OrderCol::CreatedAt),
    };

    let total = finder.clone().count(&state.orm).await? as i64;

    let orders = finder
        .limit(limit as u64)
        .offset(offset as u64)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_from_entity)
        .collect();

    let meta = Meta::new(page, limit, total);
    Ok(ApiResponse::success(
        "Orders",
        OrderList { items: orders },
        Some(meta),
    ))
}

pub async fn get_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderWithItems>> {
    let order = find_owned_order(state, user, id).await?;

    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order.id))
        .all(&state.orm)
        .await?
        .into_iter()
        .map(order_item_from_entity)
        .collect();

    let payment = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(&state.orm)
        .await?
        .map(payment_from_entity);

    Ok(ApiResponse::success(
        "Order",
        OrderWithItems {
            order: order_from_entity(order),
            items,
            payment,
        },
        Some(Meta::empty()),
    ))
}

pub async fn update_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderRequest,
) -> AppResult<ApiResponse<Order>> {
    let order = find_owned_order(state, user, id).await?;

    let mut status = order.status.clone();
    if let Some(requested) = payload.status.as_ref() {
        validate_order_status(requested)?;
        status = requested.clone();
    }
    // Keep the flag and the status in step with each other.
    let mut shipped = payload.shipped.unwrap_or(order.shipped);
    if shipped {
        status = "shipped".into();
    } else if status == "shipped" {
        shipped = true;
    }

    let mut active: OrderActive = order.into();
    active.status = Set(status);
    active.shipped = Set(shipped);
    active.updated_at = Set(Utc::now().into());
    let order = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Order updated",
        order_from_entity(order),
        Some(Meta::empty()),
    ))
}

pub async fn delete_order(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let order = find_owned_order(state, user, id).await?;
    Orders::delete_by_id(order.id).exec(&state.orm).await?;

    Ok(ApiResponse::success(
        "Order deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn get_order_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<OrderItem>> {
    let item = find_owned_order_item(state, user, id).await?;
    Ok(ApiResponse::success(
        "OrderItem",
        order_item_from_entity(item),
        None,
    ))
}

/// Post-checkout line edit. The order total and the payment amount are
/// recomputed from the remaining lines in the same transaction, so the two
/// can never drift apart.
pub async fn update_order_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateOrderItemRequest,
) -> AppResult<ApiResponse<OrderItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let item = find_owned_order_item(state, user, id).await?;

    let txn = state.orm.begin().await?;

    let order_id = item.order_id;
    let mut active: OrderItemActive = item.into();
    active.quantity = Set(payload.quantity);
    let item = active.update(&txn).await?;

    reconcile_order_totals(&txn, order_id).await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "OrderItem updated",
        order_item_from_entity(item),
        Some(Meta::empty()),
    ))
}

pub async fn delete_order_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let item = find_owned_order_item(state, user, id).await?;

    let txn = state.orm.begin().await?;

    let order_id = item.order_id;
    OrderItems::delete_by_id(item.id).exec(&txn).await?;
    reconcile_order_totals(&txn, order_id).await?;

    txn.commit().await?;

    Ok(ApiResponse::success(
        "OrderItem removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn reconcile_order_totals(
    txn: &sea_orm::DatabaseTransaction,
    order_id: Uuid,
) -> AppResult<()> {
    let items = OrderItems::find()
        .filter(OrderItemCol::OrderId.eq(order_id))
        .all(txn)
        .await?;
    let total: i64 = items
        .iter()
        .map(|item| item.price * item.quantity as i64)
        .sum();

    let order = Orders::find_by_id(order_id)
        .one(txn)
        .await?
        .ok_or(AppError::NotFound)?;
    let mut active: OrderActive = order.into();
    active.total_amount = Set(total);
    active.updated_at = Set(Utc::now().into());
    active.update(txn).await?;

    if let Some(payment) = Payments::find()
        .filter(PaymentCol::OrderId.eq(order_id))
        .one(txn)
        .await?
    {
        let mut active: PaymentActive = payment.into();
        active.amount = Set(total);
        active.update(txn).await?;
    }

    Ok(())
}

async fn find_owned_order(state: &AppState, user: &AuthUser, id: Uuid) -> AppResult<OrderModel> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::UserId.eq(user.user_id))
                .add(OrderCol::Id.eq(id)),
        )
        .one(&state.orm)
        .await?;
    order.ok_or(AppError::NotFound)
}

async fn find_owned_order_item(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<OrderItemModel> {
    let item = OrderItems::find_by_id(id).one(&state.orm).await?;
    let item = match item {
        Some(item) => item,
        None => return Err(AppError::NotFound),
    };

    let owned = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(item.order_id))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    if owned.is_none() {
        return Err(AppError::NotFound);
    }
    Ok(item)
}

fn validate_order_status(status: &str) -> Result<(), AppError> {
    if ORDER_STATUSES.contains(&status) {
        Ok(())
    } else {
        Err(AppError::BadRequest("Invalid order status".into()))
    }
}

pub fn order_from_entity(model: OrderModel) -> Order {
    Order {
        id: model.id,
        user_id: model.user_id,
        status: model.status,
        shipped: model.shipped,
        total_amount: model.total_amount,
        created_at: model.created_at.with_timezone(&Utc),
        updated_at: model.updated_at.with_timezone(&Utc),
    }
}

pub fn order_item_from_entity(model: OrderItemModel) -> OrderItem {
    OrderItem {
        id: model.id,
        order_id: model.order_id,
        product_id: model.product_id,
        quantity: model.quantity,
        price: model.price,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

pub fn payment_from_entity(model: PaymentModel) -> Payment {
    Payment {
        id: model.id,
        order_id: model.order_id,
        user_id: model.user_id,
        amount: model.amount,
        payment_method: model.payment_method,
        transaction_id: model.transaction_id,
        payment_status: model.payment_status,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
