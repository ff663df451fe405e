use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set, TransactionTrait};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::payments::{CreatePaymentRequest, PaymentWithLink},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        payments::{ActiveModel as PaymentActive, Column as PaymentCol, Entity as Payments},
        users::Entity as Users,
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::{Payment, PaymentMethod},
    response::{ApiResponse, Meta},
    services::order_service::payment_from_entity,
    state::AppState,
};

/// Transaction reference handed to the gateway; stable per order/payment so
/// retries can be deduplicated.
pub fn build_tx_ref(id: Uuid) -> String {
    let date = Utc::now().format("%Y%m%d");
    let suffix = id.to_string();
    let short = &suffix[..8];
    format!("ZTX-{}-{}", date, short)
}

/// Create a payment for an order the caller owns. For the gateway method the
/// charge is initiated before the transaction commits, so a gateway failure
/// leaves no orphaned Pending row behind.
pub async fn create_payment(
    state: &AppState,
    user: &AuthUser,
    payload: CreatePaymentRequest,
) -> AppResult<ApiResponse<PaymentWithLink>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(payload.order_id))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    let order = match order {
        Some(o) => o,
        None => return Err(AppError::NotFound),
    };

    let existing = Payments::find()
        .filter(PaymentCol::OrderId.eq(order.id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::PaymentCreation(
            "order already has a payment".into(),
        ));
    }

    let amount = payload.amount.unwrap_or(order.total_amount);
    if amount <= 0 {
        return Err(AppError::PaymentCreation(
            "amount must be greater than 0".into(),
        ));
    }

    let txn = state.orm.begin().await?;

    let payment_id = Uuid::new_v4();
    let tx_ref = build_tx_ref(payment_id);
    let payment = PaymentActive {
        id: Set(payment_id),
        order_id: Set(order.id),
        user_id: Set(user.user_id),
        amount: Set(amount),
        payment_method: Set(payload.payment_method.as_str().into()),
        transaction_id: Set(tx_ref.clone()),
        payment_status: Set("Pending".into()),
        created_at: NotSet,
    }
    .insert(&txn)
    .await
    .map_err(|err| AppError::PaymentCreation(err.to_string()))?;

    let payment_link = match payload.payment_method {
        PaymentMethod::Flutterwave => {
            let account = Users::find_by_id(user.user_id)
                .one(&txn)
                .await?
                .ok_or_else(|| AppError::Internal(anyhow::anyhow!("user record missing")))?;
            let charge = state.gateway.initiate(&tx_ref, amount, &account.email).await?;
            charge.payment_link
        }
        PaymentMethod::BankTransfer | PaymentMethod::Card => None,
    };

    txn.commit().await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "payment_create",
        Some("payments"),
        Some(serde_json::json!({ "payment_id": payment.id, "order_id": order.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::created(
        "Payment created",
        PaymentWithLink {
            payment: payment_from_entity(payment),
            payment_link,
        },
        Some(Meta::empty()),
    ))
}

pub async fn get_payment(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Payment>> {
    let payment = Payments::find()
        .filter(
            Condition::all()
                .add(PaymentCol::Id.eq(id))
                .add(PaymentCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;

    match payment {
        Some(payment) => Ok(ApiResponse::success(
            "Payment",
            payment_from_entity(payment),
            None,
        )),
        None => Err(AppError::NotFound),
    }
}

#[cfg(test)]
mod tests {
    use super::build_tx_ref;
    use uuid::Uuid;

    #[test]
    fn tx_ref_embeds_date_and_id_prefix() {
        let id = Uuid::new_v4();
        let tx_ref = build_tx_ref(id);
        assert!(tx_ref.starts_with("ZTX-"));
        assert!(tx_ref.ends_with(&id.to_string()[..8]));
        // ZTX- + yyyymmdd + - + 8 hex chars
        assert_eq!(tx_ref.len(), 4 + 8 + 1 + 8);
    }
}
