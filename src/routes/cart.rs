use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::cart::{AddCartItemRequest, CartDetail, UpdateCartItemRequest, UpdateCartRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::{Cart, CartItem},
    response::ApiResponse,
    services::cart_service,
    state::AppState,
};

pub fn carts_router() -> Router<AppState> {
    Router::new().route("/", post(create_cart)).route(
        "/{id}",
        get(get_cart).put(update_cart).delete(delete_cart),
    )
}

pub fn cart_items_router() -> Router<AppState> {
    Router::new().route("/", post(add_cart_item)).route(
        "/{id}",
        get(get_cart_item)
            .put(update_cart_item)
            .delete(remove_cart_item),
    )
}

#[utoipa::path(
    post,
    path = "/api/carts",
    responses(
        (status = 201, description = "Cart created", body = ApiResponse<Cart>),
        (status = 200, description = "Caller already has an active cart", body = ApiResponse<Cart>),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn create_cart(
    State(state): State<AppState>,
    user: AuthUser,
) -> AppResult<ApiResponse<Cart>> {
    cart_service::create_cart(&state, &user).await
}

#[utoipa::path(
    get,
    path = "/api/carts/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart ID")
    ),
    responses(
        (status = 200, description = "Cart with item details and totals", body = ApiResponse<CartDetail>),
        (status = 404, description = "Cart not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<CartDetail>> {
    cart_service::get_cart(&state, &user, id).await
}

#[utoipa::path(
    put,
    path = "/api/carts/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart ID")
    ),
    request_body = UpdateCartRequest,
    responses(
        (status = 200, description = "Cart updated", body = ApiResponse<Cart>),
        (status = 404, description = "Cart not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCartRequest>,
) -> AppResult<ApiResponse<Cart>> {
    cart_service::update_cart(&state, &user, id, payload).await
}

#[utoipa::path(
    delete,
    path = "/api/carts/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart ID")
    ),
    responses(
        (status = 200, description = "Cart deleted", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn delete_cart(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    cart_service::delete_cart(&state, &user, id).await
}

#[utoipa::path(
    post,
    path = "/api/cart-items",
    request_body = AddCartItemRequest,
    responses(
        (status = 201, description = "Cart item created or updated", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity or not enough stock"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn add_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<AddCartItemRequest>,
) -> AppResult<ApiResponse<CartItem>> {
    cart_service::add_item(&state, &user, payload).await
}

#[utoipa::path(
    get,
    path = "/api/cart-items/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "Cart item", body = ApiResponse<CartItem>),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn get_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<CartItem>> {
    cart_service::get_item(&state, &user, id).await
}

#[utoipa::path(
    put,
    path = "/api/cart-items/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item ID")
    ),
    request_body = UpdateCartItemRequest,
    responses(
        (status = 200, description = "Cart item updated", body = ApiResponse<CartItem>),
        (status = 400, description = "Invalid quantity or not enough stock"),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn update_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateCartItemRequest>,
) -> AppResult<ApiResponse<CartItem>> {
    cart_service::update_item(&state, &user, id, payload).await
}

#[utoipa::path(
    delete,
    path = "/api/cart-items/{id}",
    params(
        ("id" = Uuid, Path, description = "Cart item ID")
    ),
    responses(
        (status = 200, description = "Cart item removed", body = ApiResponse<serde_json::Value>),
        (status = 404, description = "Cart item not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Cart"
)]
pub async fn remove_cart_item(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<serde_json::Value>> {
    cart_service::remove_item(&state, &user, id).await
}
