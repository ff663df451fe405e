use axum::Router;
use axum::routing::post;

use crate::state::AppState;

pub mod addresses;
pub mod admin;
pub mod auth;
pub mod cart;
pub mod coupons;
pub mod doc;
pub mod favorites;
pub mod health;
pub mod orders;
pub mod params;
pub mod payments;
pub mod products;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/auth", auth::router())
        .nest("/products", products::router())
        .nest("/favorites", favorites::router())
        .nest("/carts", cart::carts_router())
        .nest("/cart-items", cart::cart_items_router())
        .route("/checkout", post(orders::checkout))
        .nest("/orders", orders::router())
        .nest("/order-items", orders::order_items_router())
        .nest("/coupons", coupons::router())
        .nest("/payments", payments::router())
        .nest("/addresses", addresses::router())
        .nest("/admin", admin::router())
}
