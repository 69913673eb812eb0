use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use tracing::{info, instrument};
use uuid::Uuid;

use crate::{
    auth::{
        extractors::StaffUser,
        password::hash_password,
        repo_types::UserUpdate,
        services::{create_user, normalize_email, UserFields},
    },
    error::{ApiError, Payload},
    state::AppState,
    store::StoreError,
};

use super::dto::{AdminUser, AdminUserPayload};

pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/admin/users/", get(list_users).post(add_user))
        .route(
            "/admin/users/:id/",
            get(get_user).patch(edit_user).delete(delete_user),
        )
}

#[instrument(skip(state, staff), fields(staff_id = %staff.id))]
pub async fn list_users(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
) -> Result<Json<Vec<AdminUser>>, ApiError> {
    let users = state.users.list_users().await?;
    Ok(Json(users.into_iter().map(AdminUser::from).collect()))
}

#[instrument(skip(state, staff, payload), fields(staff_id = %staff.id))]
pub async fn add_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Payload(payload): Payload<AdminUserPayload>,
) -> Result<(StatusCode, Json<AdminUser>), ApiError> {
    let changes = payload.validate(true)?;
    let email = changes.email.unwrap_or_default();

    if state
        .users
        .find_user_by_email(&normalize_email(&email))
        .await?
        .is_some()
    {
        return Err(StoreError::DuplicateEmail.into());
    }

    let defaults = UserFields::default();
    let fields = UserFields {
        name: changes.name.unwrap_or_default(),
        is_active: changes.is_active.unwrap_or(defaults.is_active),
        is_staff: changes.is_staff.unwrap_or(defaults.is_staff),
        is_superuser: changes.is_superuser.unwrap_or(defaults.is_superuser),
    };
    let user = create_user(
        state.users.as_ref(),
        &email,
        &changes.password.unwrap_or_default(),
        fields,
    )
    .await?;
    info!(user_id = %user.id, "user added by operator");
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, staff), fields(staff_id = %staff.id))]
pub async fn get_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<Json<AdminUser>, ApiError> {
    let user = state
        .users
        .find_user_by_id(id)
        .await?
        .ok_or(ApiError::NotFound)?;
    Ok(Json(user.into()))
}

#[instrument(skip(state, staff, payload), fields(staff_id = %staff.id))]
pub async fn edit_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
    Payload(payload): Payload<AdminUserPayload>,
) -> Result<Json<AdminUser>, ApiError> {
    let changes = payload.validate(false)?;

    let update = UserUpdate {
        email: changes.email.as_deref().map(normalize_email),
        name: changes.name,
        password_hash: changes.password.as_deref().map(hash_password).transpose()?,
        is_active: changes.is_active,
        is_staff: changes.is_staff,
        is_superuser: changes.is_superuser,
    };

    let user = state
        .users
        .update_user(id, &update)
        .await?
        .ok_or(ApiError::NotFound)?;
    info!(user_id = %user.id, "user edited by operator");
    Ok(Json(user.into()))
}

#[instrument(skip(state, staff), fields(staff_id = %staff.id))]
pub async fn delete_user(
    State(state): State<AppState>,
    StaffUser(staff): StaffUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    if !state.users.delete_user(id).await? {
        return Err(ApiError::NotFound);
    }
    info!(user_id = %id, "user deleted by operator");
    Ok(StatusCode::NO_CONTENT)
}
