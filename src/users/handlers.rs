use axum::{
    extract::{FromRef, Path, State},
    http::StatusCode,
    response::Redirect,
    Json,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::jwt::{AuthUser, JwtKeys},
    error::{ApiError, ApiResult},
    state::AppState,
    store::Record,
};

use super::{
    dto::{
        AuthResponse, LoginRequest, RefreshRequest, RegisterRequest, UpdateFollowingRequest,
        UpdatePasswordRequest,
    },
    model::User,
    service::UserService,
};

fn signed_pair(keys: &JwtKeys, user: User) -> ApiResult<AuthResponse> {
    let access_token = keys.sign_access(user.id)?;
    let refresh_token = keys.sign_refresh(user.id)?;
    Ok(AuthResponse {
        access_token,
        refresh_token,
        user,
    })
}

#[instrument(skip(state, payload))]
pub async fn register(
    State(state): State<AppState>,
    Json(payload): Json<RegisterRequest>,
) -> ApiResult<(StatusCode, Json<User>)> {
    let users = UserService::from_state(&state);
    let user = users.register(payload).await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    Json(payload): Json<LoginRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let users = UserService::from_state(&state);
    let user = users.login(&payload.email, &payload.password).await?;

    let keys = JwtKeys::from_ref(&state);
    Ok(Json(signed_pair(&keys, user)?))
}

#[instrument(skip(state, payload))]
pub async fn refresh(
    State(state): State<AppState>,
    Json(payload): Json<RefreshRequest>,
) -> ApiResult<Json<AuthResponse>> {
    let keys = JwtKeys::from_ref(&state);
    let claims = keys
        .verify_refresh(&payload.refresh_token)
        .map_err(|_| ApiError::Unauthorized("invalid or expired refresh token".into()))?;

    // The account may have been deleted since the pair was issued.
    let user = UserService::from_state(&state).get_user_info(claims.sub).await?;
    Ok(Json(signed_pair(&keys, user)?))
}

#[instrument(skip(state))]
pub async fn activate(
    State(state): State<AppState>,
    Path((id, activation_key)): Path<(Uuid, String)>,
) -> ApiResult<Redirect> {
    let users = UserService::from_state(&state);
    users.activate(id, &activation_key).await?;
    // The link is opened in a browser; land the user on the front-end.
    Ok(Redirect::to(&state.config.service_url))
}

#[instrument(skip(state))]
pub async fn list_users(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
) -> ApiResult<Json<Vec<User>>> {
    let users = UserService::from_state(&state).get_users().await?;
    Ok(Json(users))
}

#[instrument(skip(state))]
pub async fn current_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
) -> ApiResult<Json<User>> {
    let user = UserService::from_state(&state).get_user_info(caller).await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    let user = UserService::from_state(&state).get_user_info(id).await?;
    Ok(Json(user))
}

#[instrument(skip(state, patch))]
pub async fn update_profile(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(patch): Json<Record>,
) -> ApiResult<Json<User>> {
    let user = UserService::from_state(&state)
        .update_profile(caller, id, patch)
        .await?;
    Ok(Json(user))
}

#[instrument(skip(state, payload))]
pub async fn update_password(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdatePasswordRequest>,
) -> ApiResult<Json<User>> {
    let user = UserService::from_state(&state)
        .update_password(caller, id, payload.password, payload.password_reset)
        .await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn update_following(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(payload): Json<UpdateFollowingRequest>,
) -> ApiResult<Json<User>> {
    let user = UserService::from_state(&state)
        .update_following(caller, id, payload.following, payload.state)
        .await?;
    Ok(Json(user))
}

#[instrument(skip(state))]
pub async fn delete_user(
    State(state): State<AppState>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<User>> {
    let user = UserService::from_state(&state).delete_user(caller, id).await?;
    Ok(Json(user))
}
