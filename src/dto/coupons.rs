use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::models::Coupon;

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreateCouponRequest {
    /// Auto-generated when omitted.
    pub code: Option<String>,
    pub discount_percentage: i32,
    pub expiry_date: DateTime<Utc>,
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct ExtendCouponRequest {
    pub days: i64,
}

#[derive(Debug, Serialize, ToSchema)]
#[serde(transparent)]
pub struct CouponList {
    #[schema(value_type = Vec<Coupon>)]
    pub items: Vec<Coupon>,
}
