use chrono::{DateTime, Utc};
use sqlx::FromRow;
use uuid::Uuid;

use crate::{
    audit::log_audit,
    db::DbPool,
    dto::cart::{
        AddCartItemRequest, CartDetail, CartItemDetail, UpdateCartItemRequest, UpdateCartRequest,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Cart, CartItem, Product},
    response::{ApiResponse, Meta},
    state::AppState,
};

const CART_STATUSES: [&str; 2] = ["active", "checked_out"];

#[derive(FromRow)]
struct CartLineRow {
    item_id: Uuid,
    quantity: i32,
    product_id: Uuid,
    name: String,
    description: Option<String>,
    price: i64,
    stock: i32,
    product_created_at: DateTime<Utc>,
}

pub async fn create_cart(state: &AppState, user: &AuthUser) -> AppResult<ApiResponse<Cart>> {
    if let Some(cart) = find_active_cart(&state.pool, user.user_id).await? {
        return Ok(ApiResponse::success("Active cart", cart, None));
    }

    let cart: Cart = sqlx::query_as(
        "INSERT INTO carts (id, user_id) VALUES ($1, $2) RETURNING *",
    )
    .bind(Uuid::new_v4())
    .bind(user.user_id)
    .fetch_one(&state.pool)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_create",
        Some("carts"),
        Some(serde_json::json!({ "cart_id": cart.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::created("Cart created", cart, None))
}

pub async fn get_cart(
    state: &AppState,
    user: &AuthUser,
    cart_id: Uuid,
) -> AppResult<ApiResponse<CartDetail>> {
    let cart = find_owned_cart(&state.pool, user.user_id, cart_id).await?;

    let rows = sqlx::query_as::<_, CartLineRow>(
        r#"
        SELECT ci.id AS item_id, ci.quantity,
               p.id AS product_id, p.name, p.description, p.price, p.stock,
               p.created_at AS product_created_at
        FROM cart_items ci
        JOIN products p ON p.id = ci.product_id
        WHERE ci.cart_id = $1
        ORDER BY ci.created_at DESC
        "#,
    )
    .bind(cart.id)
    .fetch_all(&state.pool)
    .await?;

    let mut total_items: i64 = 0;
    let mut total_cost: i64 = 0;
    let items = rows
        .into_iter()
        .map(|row| {
            total_items += row.quantity as i64;
            total_cost += row.price * row.quantity as i64;
            CartItemDetail {
                id: row.item_id,
                product: Product {
                    id: row.product_id,
                    name: row.name,
                    description: row.description,
                    price: row.price,
                    stock: row.stock,
                    created_at: row.product_created_at,
                },
                quantity: row.quantity,
            }
        })
        .collect();

    let detail = CartDetail {
        cart,
        items,
        total_items,
        total_cost,
    };
    Ok(ApiResponse::success("Cart", detail, Some(Meta::empty())))
}

pub async fn update_cart(
    state: &AppState,
    user: &AuthUser,
    cart_id: Uuid,
    payload: UpdateCartRequest,
) -> AppResult<ApiResponse<Cart>> {
    if !CART_STATUSES.contains(&payload.status.as_str()) {
        return Err(AppError::BadRequest("Invalid cart status".into()));
    }

    let cart: Option<Cart> = sqlx::query_as(
        "UPDATE carts SET status = $3 WHERE id = $1 AND user_id = $2 RETURNING *",
    )
    .bind(cart_id)
    .bind(user.user_id)
    .bind(&payload.status)
    .fetch_optional(&state.pool)
    .await?;

    match cart {
        Some(cart) => Ok(ApiResponse::success("Cart updated", cart, None)),
        None => Err(AppError::NotFound),
    }
}

pub async fn delete_cart(
    state: &AppState,
    user: &AuthUser,
    cart_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query("DELETE FROM carts WHERE id = $1 AND user_id = $2")
        .bind(cart_id)
        .bind(user.user_id)
        .execute(&state.pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "Cart deleted",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

pub async fn add_item(
    state: &AppState,
    user: &AuthUser,
    payload: AddCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let cart = match payload.cart_id {
        Some(cart_id) => find_owned_cart(&state.pool, user.user_id, cart_id).await?,
        None => get_or_create_active_cart(&state.pool, user.user_id).await?,
    };

    let product: Option<Product> = sqlx::query_as("SELECT * FROM products WHERE id = $1")
        .bind(payload.product_id)
        .fetch_optional(&state.pool)
        .await?;
    let product = match product {
        Some(p) => p,
        None => return Err(AppError::BadRequest("product not found".to_string())),
    };

    if payload.quantity > product.stock {
        return Err(AppError::BadRequest(
            "Not enough stock available".to_string(),
        ));
    }

    let exist: Option<CartItem> =
        sqlx::query_as("SELECT * FROM cart_items WHERE cart_id = $1 AND product_id = $2")
            .bind(cart.id)
            .bind(payload.product_id)
            .fetch_optional(&state.pool)
            .await?;

    let cart_item = if let Some(item) = exist {
        sqlx::query_as::<_, CartItem>(
            r#"
            UPDATE cart_items
            SET quantity = $2
            WHERE id = $1
            RETURNING *
            "#,
        )
        .bind(item.id)
        .bind(payload.quantity)
        .fetch_one(&state.pool)
        .await?
    } else {
        sqlx::query_as(
            "INSERT INTO cart_items (id, cart_id, product_id, quantity) VALUES ($1, $2, $3, $4) RETURNING *",
        )
        .bind(Uuid::new_v4())
        .bind(cart.id)
        .bind(payload.product_id)
        .bind(payload.quantity)
        .fetch_one(&state.pool)
        .await?
    };

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "cart_update",
        Some("cart_items"),
        Some(serde_json::json!({ "product_id": payload.product_id, "quantity": payload.quantity })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::created("CartItem created", cart_item, None))
}

pub async fn get_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<CartItem>> {
    let item = find_owned_item(&state.pool, user.user_id, item_id).await?;
    Ok(ApiResponse::success("CartItem", item, None))
}

pub async fn update_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
    payload: UpdateCartItemRequest,
) -> AppResult<ApiResponse<CartItem>> {
    if payload.quantity <= 0 {
        return Err(AppError::BadRequest(
            "quantity must be greater than 0".to_string(),
        ));
    }

    let item = find_owned_item(&state.pool, user.user_id, item_id).await?;

    let stock: (i32,) = sqlx::query_as("SELECT stock FROM products WHERE id = $1")
        .bind(item.product_id)
        .fetch_one(&state.pool)
        .await?;
    if payload.quantity > stock.0 {
        return Err(AppError::BadRequest(
            "Not enough stock available".to_string(),
        ));
    }

    let item: CartItem =
        sqlx::query_as("UPDATE cart_items SET quantity = $2 WHERE id = $1 RETURNING *")
            .bind(item.id)
            .bind(payload.quantity)
            .fetch_one(&state.pool)
            .await?;

    Ok(ApiResponse::success("CartItem updated", item, None))
}

pub async fn remove_item(
    state: &AppState,
    user: &AuthUser,
    item_id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let result = sqlx::query(
        r#"
        DELETE FROM cart_items ci
        USING carts c
        WHERE ci.cart_id = c.id AND ci.id = $1 AND c.user_id = $2
        "#,
    )
    .bind(item_id)
    .bind(user.user_id)
    .execute(&state.pool)
    .await?;

    if result.rows_affected() == 0 {
        return Err(AppError::NotFound);
    }

    Ok(ApiResponse::success(
        "CartItem removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_active_cart(pool: &DbPool, user_id: Uuid) -> AppResult<Option<Cart>> {
    let cart = sqlx::query_as(
        "SELECT * FROM carts WHERE user_id = $1 AND status = 'active' ORDER BY created_at DESC LIMIT 1",
    )
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    Ok(cart)
}

async fn get_or_create_active_cart(pool: &DbPool, user_id: Uuid) -> AppResult<Cart> {
    if let Some(cart) = find_active_cart(pool, user_id).await? {
        return Ok(cart);
    }
    let cart = sqlx::query_as("INSERT INTO carts (id, user_id) VALUES ($1, $2) RETURNING *")
        .bind(Uuid::new_v4())
        .bind(user_id)
        .fetch_one(pool)
        .await?;
    Ok(cart)
}

async fn find_owned_cart(pool: &DbPool, user_id: Uuid, cart_id: Uuid) -> AppResult<Cart> {
    let cart: Option<Cart> = sqlx::query_as("SELECT * FROM carts WHERE id = $1 AND user_id = $2")
        .bind(cart_id)
        .bind(user_id)
        .fetch_optional(pool)
        .await?;
    cart.ok_or(AppError::NotFound)
}

async fn find_owned_item(pool: &DbPool, user_id: Uuid, item_id: Uuid) -> AppResult<CartItem> {
    let item: Option<CartItem> = sqlx::query_as(
        r#"
        SELECT ci.*
        FROM cart_items ci
        JOIN carts c ON c.id = ci.cart_id
        WHERE ci.id = $1 AND c.user_id = $2
        "#,
    )
    .bind(item_id)
    .bind(user_id)
    .fetch_optional(pool)
    .await?;
    item.ok_or(AppError::NotFound)
}
