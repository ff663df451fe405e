use axum::{
    Json, Router,
    extract::{Path, Query, State},
    routing::get,
};
use uuid::Uuid;

use crate::{
    dto::orders::{
        CheckoutData, CheckoutRequest, OrderList, OrderWithItems, UpdateOrderItemRequest,
        UpdateOrderRequest,
    },
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Order, OrderItem},
    response::ApiResponse,
    routes::params::OrderListQuery,
    services::order_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new().route("/", get(list_orders)).route(
        "/{id}",
        get(get_order).put(update_order).delete(delete_order),
    )
}

pub fn order_items_router() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(get_order_item)
            .put(update_order_item)
            .delete(delete_order_item),
    )
}

#[utoipa::path(
    post,
    path = "/api/checkout",
    request_body = CheckoutRequest,
    responses(
        (status = 200, description = "Cart converted into an order", body = ApiResponse<CheckoutData>),
        (status = 400, description = "Empty cart, invalid or expired coupon, insufficient stock, or payment failure"),
        (status = 404, description = "No active cart"),
        (status = 502, description = "Payment gateway rejected the charge"),
        (status = 504, description = "Payment gateway timed out"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn checkout(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CheckoutRequest>,
) -> AppResult<ApiResponse<CheckoutData>> {
    order_service::checkout(&state, &user, payload).await
}

#[utoipa::path(
    get,
    path = "/api/orders",
    params(
        ("page" = Option<i64>, Query, description = "Page number, default 1"),
        ("per_page" = Option<i64>, Query, description = "Items per page, default 20"),
        ("status" = Option<String>, Query, description = "Filter by status"),
        ("sort_order" = Option<String>, Query, description = "Sort order: asc, desc")
    ),
    responses(
        (status = 200, description = "List caller's orders", body = ApiResponse<OrderList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn list_orders(
    State(state): State<AppState>,
    user: AuthUser,
    Query(query): Query<OrderListQuery>,
) -> AppResult<ApiResponse<OrderList>> {
    order_service::list_orders(&state, &user, query).await
}

#[utoipa::path(
    get,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order with items and payment", body = ApiResponse<OrderWithItems>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<OrderWithItems>> {
    order_service::get_order(&state, &user, id).await
}

#[utoipa::path(
    put,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    request_body = UpdateOrderRequest,
    responses(
        (status = 200, description = "Order updated", body = ApiResponse<Order>),
        (status = 400, description = "Invalid status"),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderRequest>,
) -> AppResult<ApiResponse<Order>> {
    order_service::update_order(&state, &user, id, payload).await
}

#[utoipa::path(
    delete,
    path = "/api/orders/{id}",
    params(
        ("id" = Uuid, Path, description = "Order ID")
    ),
    responses(
        (status = 200, description = "Order deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Order not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn delete_order(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    order_service::delete_order(&state, &user, id).await
}

#[utoipa::path(
    get,
    path = "/api/order-items/{id}",
    params(
        ("id" = Uuid, Path, description = "Order item ID")
    ),
    responses(
        (status = 200, description = "Order item", body = ApiResponse<OrderItem>),
        (status = 404, description = "Order item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn get_order_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<OrderItem>> {
    order_service::get_order_item(&state, &user, id).await
}

#[utoipa::path(
    put,
    path = "/api/order-items/{id}",
    params(
        ("id" = Uuid, Path, description = "Order item ID")
    ),
    request_body = UpdateOrderItemRequest,
    responses(
        (status = 200, description = "Order item updated, totals reconciled", body = ApiResponse<OrderItem>),
        (status = 400, description = "Invalid quantity"),
        (status = 404, description = "Order item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn update_order_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateOrderItemRequest>,
) -> AppResult<ApiResponse<OrderItem>> {
    order_service::update_order_item(&state, &user, id, payload).await
}

#[utoipa::path(
    delete,
    path = "/api/order-items/{id}",
    params(
        ("id" = Uuid, Path, description = "Order item ID")
    ),
    responses(
        (status = 200, description = "Order item removed, totals reconciled", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Order item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Orders"
)]
pub async fn delete_order_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    order_service::delete_order_item(&state, &user, id).await
}
