use axum::{
    extract::{FromRef, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tracing::{info, instrument};

use crate::{
    auth::{
        dto::{TokenRequest, TokenResponse, UserPayload, UserResponse, BAD_CREDENTIALS},
        extractors::AuthUser,
        jwt::JwtKeys,
        password::hash_password,
        repo_types::{User, UserUpdate},
        services::{authenticate, create_user, normalize_email, record_login, UserFields},
    },
    error::{ApiError, FieldErrors, Payload, NON_FIELD},
    state::AppState,
    store::StoreError,
};

pub fn user_routes() -> Router<AppState> {
    Router::new()
        .route("/user/create/", post(create))
        .route("/user/token/", post(token))
        .route("/user/me/", get(get_me).patch(patch_me).put(put_me))
}

#[instrument(skip(state, payload))]
pub async fn create(
    State(state): State<AppState>,
    Payload(payload): Payload<UserPayload>,
) -> Result<(StatusCode, Json<UserResponse>), ApiError> {
    let changes = payload.validate(false)?;
    let email = changes.email.unwrap_or_default();
    let password = changes.password.unwrap_or_default();
    let name = changes.name.unwrap_or_default();

    if state
        .users
        .find_user_by_email(&normalize_email(&email))
        .await?
        .is_some()
    {
        return Err(StoreError::DuplicateEmail.into());
    }

    let user = create_user(
        state.users.as_ref(),
        &email,
        &password,
        UserFields::named(name),
    )
    .await?;
    Ok((StatusCode::CREATED, Json(user.into())))
}

#[instrument(skip(state, payload))]
pub async fn token(
    State(state): State<AppState>,
    Payload(payload): Payload<TokenRequest>,
) -> Result<Json<TokenResponse>, ApiError> {
    let (email, password) = payload.validate()?;

    let user = authenticate(state.users.as_ref(), &email, &password)
        .await?
        .ok_or_else(|| ApiError::Validation(FieldErrors::single(NON_FIELD, BAD_CREDENTIALS)))?;

    let user = record_login(state.users.as_ref(), user.id).await?;
    let token = JwtKeys::from_ref(&state).sign(user.id)?;

    info!(user_id = %user.id, email = %user.email, "token issued");
    Ok(Json(TokenResponse { token }))
}

#[instrument(skip(user), fields(user_id = %user.id))]
pub async fn get_me(AuthUser(user): AuthUser) -> Json<UserResponse> {
    Json(user.into())
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn patch_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(payload): Payload<UserPayload>,
) -> Result<Json<UserResponse>, ApiError> {
    update_me(&state, user, payload, true).await
}

#[instrument(skip(state, user, payload), fields(user_id = %user.id))]
pub async fn put_me(
    State(state): State<AppState>,
    AuthUser(user): AuthUser,
    Payload(payload): Payload<UserPayload>,
) -> Result<Json<UserResponse>, ApiError> {
    update_me(&state, user, payload, false).await
}

async fn update_me(
    state: &AppState,
    user: User,
    payload: UserPayload,
    partial: bool,
) -> Result<Json<UserResponse>, ApiError> {
    let changes = payload.validate(partial)?;

    let update = UserUpdate {
        email: changes.email.as_deref().map(normalize_email),
        name: changes.name,
        password_hash: changes.password.as_deref().map(hash_password).transpose()?,
        ..UserUpdate::default()
    };

    let user = state
        .users
        .update_user(user.id, &update)
        .await?
        .ok_or_else(|| ApiError::Unauthorized("User inactive or deleted.".into()))?;

    info!(user_id = %user.id, "profile updated");
    Ok(Json(user.into()))
}
