use axum::{
    Json, Router,
    extract::{Path, State},
    routing::{get, post},
};
use uuid::Uuid;

use crate::{
    dto::coupons::{CouponList, CreateCouponRequest, ExtendCouponRequest},
    error::AppResult,
    middleware::auth::AuthUser,
    models::Coupon,
    response::ApiResponse,
    services::coupon_service,
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_coupons).post(create_coupon))
        .route("/{id}/extend", post(extend_coupon))
        .route("/{id}/deactivate", post(deactivate_coupon))
}

#[utoipa::path(
    get,
    path = "/api/coupons",
    responses(
        (status = 200, description = "List currently valid coupons", body = ApiResponse<CouponList>)
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn list_coupons(
    State(state): State<AppState>,
    _user: AuthUser,
) -> AppResult<ApiResponse<CouponList>> {
    coupon_service::list_coupons(&state).await
}

#[utoipa::path(
    post,
    path = "/api/coupons",
    request_body = CreateCouponRequest,
    responses(
        (status = 201, description = "Coupon created", body = ApiResponse<Coupon>),
        (status = 400, description = "Invalid percentage, past expiry, or duplicate code"),
        (status = 403, description = "Forbidden"),
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn create_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Json(payload): Json<CreateCouponRequest>,
) -> AppResult<ApiResponse<Coupon>> {
    coupon_service::create_coupon(&state, &user, payload).await
}

#[utoipa::path(
    post,
    path = "/api/coupons/{id}/extend",
    params(
        ("id" = Uuid, Path, description = "Coupon ID")
    ),
    request_body = ExtendCouponRequest,
    responses(
        (status = 200, description = "Expiry extended, or unchanged when already past", body = ApiResponse<Coupon>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Coupon not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn extend_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<ExtendCouponRequest>,
) -> AppResult<ApiResponse<Coupon>> {
    coupon_service::extend_coupon(&state, &user, id, payload).await
}

#[utoipa::path(
    post,
    path = "/api/coupons/{id}/deactivate",
    params(
        ("id" = Uuid, Path, description = "Coupon ID")
    ),
    responses(
        (status = 200, description = "Coupon deactivated (idempotent)", body = ApiResponse<Coupon>),
        (status = 403, description = "Forbidden"),
        (status = 404, description = "Coupon not found"),
    ),
    security(("bearer_auth" = [])),
    tag = "Coupons"
)]
pub async fn deactivate_coupon(
    State(state): State<AppState>,
    user: AuthUser,
    Path(id): Path<Uuid>,
) -> AppResult<ApiResponse<Coupon>> {
    coupon_service::deactivate_coupon(&state, &user, id).await
}
