use serde::{Deserialize, Serialize};
use utoipa::ToSchema;
use uuid::Uuid;

use crate::models::{Payment, PaymentMethod};

#[derive(Debug, Deserialize, ToSchema)]
pub struct CreatePaymentRequest {
    pub order_id: Uuid,
    #[serde(default)]
    pub payment_method: PaymentMethod,
    /// Defaults to the order total when omitted.
    pub amount: Option<i64>,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct PaymentWithLink {
    pub payment: Payment,
    pub payment_link: Option<String>,
}
