use chrono::{DateTime, Duration, Utc};
use sea_orm::ActiveValue::NotSet;
use sea_orm::{
    ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, QueryOrder, Set,
};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::coupons::{CouponList, CreateCouponRequest, ExtendCouponRequest},
    entity::coupons::{
        ActiveModel as CouponActive, Column as CouponCol, Entity as Coupons, Model as CouponModel,
    },
    error::{AppError, AppResult},
    middleware::auth::{AuthUser, ensure_admin},
    models::Coupon,
    response::{ApiResponse, Meta},
    state::AppState,
};

/// Validity is recomputed from the clock on every read. The stored `expired`
/// flag is a deactivation switch, never a cache of this result.
pub fn is_coupon_valid(expired: bool, expiry_date: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    !expired && expiry_date > now
}

/// Discount in minor units. Integer math, truncated toward zero, so the
/// discounted total never exceeds the original.
pub fn discount_amount(subtotal: i64, percent: i32) -> i64 {
    subtotal * percent as i64 / 100
}

pub fn generate_code() -> String {
    let suffix = Uuid::new_v4().simple().to_string();
    format!("CPN-{}", suffix[..10].to_uppercase())
}

pub async fn list_coupons(state: &AppState) -> AppResult<ApiResponse<CouponList>> {
    let now = Utc::now();
    let items: Vec<Coupon> = Coupons::find()
        .filter(
            Condition::all()
                .add(CouponCol::Expired.eq(false))
                .add(CouponCol::ExpiryDate.gt(now)),
        )
        .order_by_asc(CouponCol::ExpiryDate)
        .all(&state.orm)
        .await?
        .into_iter()
        .map(coupon_from_entity)
        .collect();

    Ok(ApiResponse::success(
        "Coupons",
        CouponList { items },
        Some(Meta::empty()),
    ))
}

pub async fn create_coupon(
    state: &AppState,
    user: &AuthUser,
    payload: CreateCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(user)?;

    if !(1..=100).contains(&payload.discount_percentage) {
        return Err(AppError::BadRequest(
            "discount percentage must be between 1 and 100".into(),
        ));
    }
    if payload.expiry_date <= Utc::now() {
        return Err(AppError::BadRequest(
            "expiry date must be in the future".into(),
        ));
    }

    let code = match payload.code.filter(|c| !c.is_empty()) {
        Some(code) => code,
        None => generate_code(),
    };

    let exist = Coupons::find()
        .filter(CouponCol::Code.eq(code.clone()))
        .one(&state.orm)
        .await?;
    if exist.is_some() {
        return Err(AppError::BadRequest("coupon code already exists".into()));
    }

    let coupon = CouponActive {
        id: Set(Uuid::new_v4()),
        code: Set(code),
        discount_percentage: Set(payload.discount_percentage),
        expiry_date: Set(payload.expiry_date.into()),
        expired: Set(false),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "coupon_create",
        Some("coupons"),
        Some(serde_json::json!({ "coupon_id": coupon.id, "code": coupon.code })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::created(
        "Coupon created",
        coupon_from_entity(coupon),
        Some(Meta::empty()),
    ))
}

pub async fn extend_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: ExtendCouponRequest,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(user)?;

    if payload.days <= 0 {
        return Err(AppError::BadRequest("days must be greater than 0".into()));
    }

    let coupon = Coupons::find_by_id(id).one(&state.orm).await?;
    let coupon = match coupon {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    // Extending a coupon whose expiry has already passed is a no-op.
    let now = Utc::now();
    if coupon.expiry_date.with_timezone(&Utc) <= now {
        return Ok(ApiResponse::success(
            "Coupon already expired, expiry unchanged",
            coupon_from_entity(coupon),
            Some(Meta::empty()),
        ));
    }

    let new_expiry = coupon.expiry_date.with_timezone(&Utc) + Duration::days(payload.days);
    let mut active: CouponActive = coupon.into();
    active.expiry_date = Set(new_expiry.into());
    active.expired = Set(false);
    let coupon = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "coupon_extend",
        Some("coupons"),
        Some(serde_json::json!({ "coupon_id": coupon.id, "days": payload.days })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Coupon extended",
        coupon_from_entity(coupon),
        Some(Meta::empty()),
    ))
}

pub async fn deactivate_coupon(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<Coupon>> {
    ensure_admin(user)?;

    let coupon = Coupons::find_by_id(id).one(&state.orm).await?;
    let coupon = match coupon {
        Some(c) => c,
        None => return Err(AppError::NotFound),
    };

    let mut active: CouponActive = coupon.into();
    active.expired = Set(true);
    let coupon = active.update(&state.orm).await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "coupon_deactivate",
        Some("coupons"),
        Some(serde_json::json!({ "coupon_id": coupon.id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::success(
        "Coupon deactivated",
        coupon_from_entity(coupon),
        Some(Meta::empty()),
    ))
}

pub fn coupon_from_entity(model: CouponModel) -> Coupon {
    Coupon {
        id: model.id,
        code: model.code,
        discount_percentage: model.discount_percentage,
        expiry_date: model.expiry_date.with_timezone(&Utc),
        expired: model.expired,
        created_at: model.created_at.with_timezone(&Utc),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn coupon_with_future_expiry_is_valid() {
        let now = Utc::now();
        assert!(is_coupon_valid(false, now + Duration::hours(1), now));
    }

    #[test]
    fn coupon_expiring_exactly_now_is_invalid() {
        let now = Utc::now();
        assert!(!is_coupon_valid(false, now, now));
    }

    #[test]
    fn deactivated_coupon_is_invalid_regardless_of_expiry() {
        let now = Utc::now();
        assert!(!is_coupon_valid(true, now + Duration::days(30), now));
    }

    #[test]
    fn discount_is_percentage_of_subtotal() {
        assert_eq!(discount_amount(2000, 10), 200);
        assert_eq!(discount_amount(999, 50), 499);
        assert_eq!(discount_amount(0, 25), 0);
    }

    #[test]
    fn generated_codes_are_prefixed_and_unique() {
        let a = generate_code();
        let b = generate_code();
        assert!(a.starts_with("CPN-"));
        assert_eq!(a.len(), 14);
        assert_ne!(a, b);
    }
}
