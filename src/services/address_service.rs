use chrono::Utc;
use sea_orm::ActiveValue::NotSet;
use sea_orm::{ActiveModelTrait, ColumnTrait, Condition, EntityTrait, QueryFilter, Set};
use uuid::Uuid;

use crate::{
    audit::log_audit,
    dto::addresses::{CreateAddressRequest, UpdateAddressRequest},
    entity::{
        orders::{Column as OrderCol, Entity as Orders},
        shipping_addresses::{
            ActiveModel as AddressActive, Column as AddressCol, Entity as ShippingAddresses,
            Model as AddressModel,
        },
    },
    error::{AppError, AppResult},
    middleware::auth::AuthUser,
    models::ShippingAddress,
    response::{ApiResponse, Meta},
    state::AppState,
};

pub async fn create_address(
    state: &AppState,
    user: &AuthUser,
    payload: CreateAddressRequest,
) -> AppResult<ApiResponse<ShippingAddress>> {
    let order = Orders::find()
        .filter(
            Condition::all()
                .add(OrderCol::Id.eq(payload.order_id))
                .add(OrderCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    if order.is_none() {
        return Err(AppError::NotFound);
    }

    let existing = ShippingAddresses::find()
        .filter(AddressCol::OrderId.eq(payload.order_id))
        .one(&state.orm)
        .await?;
    if existing.is_some() {
        return Err(AppError::BadRequest(
            "order already has a shipping address".into(),
        ));
    }

    let address = AddressActive {
        id: Set(Uuid::new_v4()),
        order_id: Set(payload.order_id),
        user_id: Set(user.user_id),
        street: Set(payload.street),
        city: Set(payload.city),
        state: Set(payload.state),
        zip_code: Set(payload.zip_code),
        created_at: NotSet,
    }
    .insert(&state.orm)
    .await?;

    if let Err(err) = log_audit(
        &state.pool,
        Some(user.user_id),
        "address_create",
        Some("shipping_addresses"),
        Some(serde_json::json!({ "address_id": address.id, "order_id": address.order_id })),
    )
    .await
    {
        tracing::warn!(error = %err, "audit log failed");
    }

    Ok(ApiResponse::created(
        "Shipping address created",
        address_from_entity(address),
        Some(Meta::empty()),
    ))
}

pub async fn get_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<ShippingAddress>> {
    let address = find_owned_address(state, user, id).await?;
    Ok(ApiResponse::success(
        "Shipping address",
        address_from_entity(address),
        None,
    ))
}

pub async fn update_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
    payload: UpdateAddressRequest,
) -> AppResult<ApiResponse<ShippingAddress>> {
    let address = find_owned_address(state, user, id).await?;

    let mut active: AddressActive = address.into();
    if let Some(street) = payload.street {
        active.street = Set(street);
    }
    if let Some(city) = payload.city {
        active.city = Set(city);
    }
    if let Some(state_name) = payload.state {
        active.state = Set(state_name);
    }
    if let Some(zip_code) = payload.zip_code {
        active.zip_code = Set(zip_code);
    }
    let address = active.update(&state.orm).await?;

    Ok(ApiResponse::success(
        "Shipping address updated",
        address_from_entity(address),
        Some(Meta::empty()),
    ))
}

pub async fn delete_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<ApiResponse<serde_json::Value>> {
    let address = find_owned_address(state, user, id).await?;
    ShippingAddresses::delete_by_id(address.id)
        .exec(&state.orm)
        .await?;

    Ok(ApiResponse::success(
        "Shipping address removed",
        serde_json::json!({}),
        Some(Meta::empty()),
    ))
}

async fn find_owned_address(
    state: &AppState,
    user: &AuthUser,
    id: Uuid,
) -> AppResult<AddressModel> {
    let address = ShippingAddresses::find()
        .filter(
            Condition::all()
                .add(AddressCol::Id.eq(id))
                .add(AddressCol::UserId.eq(user.user_id)),
        )
        .one(&state.orm)
        .await?;
    address.ok_or(AppError::NotFound)
}

fn address_from_entity(model: AddressModel) -> ShippingAddress {
    ShippingAddress {
        id: model.id,
        order_id: model.order_id,
        user_id: model.user_id,
        street: model.street,
        city: model.city,
        state: model.state,
        zip_code: model.zip_code,
        created_at: model.created_at.with_timezone(&Utc),
    }
}
