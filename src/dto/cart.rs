use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Cart, Product};

#[derive(Debug, Deserialize, ToSchema)]
pub struct AddCartItemRequest {
    /// Defaults to the caller's active cart when omitted.
    pub cart_id: Option<Uuid>,
    pub product_id: Uuid,
    pub quantity: i32,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartRequest {
    pub status: String,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct UpdateCartItemRequest {
    pub quantity: i32,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CartItemDetail {
    pub id: Uuid,
    pub product: Product,
    pub quantity: i32,
}

/// Cart plus its lines and live totals computed from the current items.
#[derive(Debug, Serialize, ToSchema)]
pub struct CartDetail {
    pub cart: Cart,
    pub items: Vec<CartItemDetail>,
    pub total_items: i64,
    pub total_cost: i64,
}
