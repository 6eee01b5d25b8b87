use std::collections::HashMap;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde_json::Value;
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::jwt::AuthUser,
    entity::EntitySchema,
    error::{ApiError, ApiResult},
    state::AppState,
    store::Record,
};

use super::service::OwnedRecordService;

fn service(state: &AppState, schema: &'static EntitySchema) -> OwnedRecordService {
    OwnedRecordService::new(schema, state.store.clone())
}

#[instrument(skip(state, body), fields(entity = schema.name))]
pub async fn add_record(
    State(state): State<AppState>,
    Extension(schema): Extension<&'static EntitySchema>,
    AuthUser(caller): AuthUser,
    Json(body): Json<Record>,
) -> ApiResult<(StatusCode, Json<Record>)> {
    let added = service(&state, schema).add(caller, body).await?;
    Ok((StatusCode::CREATED, Json(added)))
}

#[instrument(skip(state), fields(entity = schema.name))]
pub async fn get_record(
    State(state): State<AppState>,
    Extension(schema): Extension<&'static EntitySchema>,
    AuthUser(_caller): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Record>> {
    let found = service(&state, schema)
        .get(id)
        .await?
        .ok_or_else(|| ApiError::NotFound(format!("no {} record with id {id}", schema.name)))?;
    Ok(Json(found))
}

#[instrument(skip(state), fields(entity = schema.name))]
pub async fn list_records(
    State(state): State<AppState>,
    Extension(schema): Extension<&'static EntitySchema>,
    AuthUser(_caller): AuthUser,
    Query(query): Query<HashMap<String, String>>,
) -> ApiResult<Json<Vec<Record>>> {
    let filter: Record = query
        .into_iter()
        .map(|(k, v)| (k, Value::String(v)))
        .collect();
    let found = service(&state, schema).get_all(filter).await?;
    Ok(Json(found))
}

#[instrument(skip(state), fields(entity = schema.name))]
pub async fn list_user_records(
    State(state): State<AppState>,
    Extension(schema): Extension<&'static EntitySchema>,
    AuthUser(_caller): AuthUser,
    Path(user_id): Path<Uuid>,
) -> ApiResult<Json<Vec<Record>>> {
    let found = service(&state, schema).get_user_owned(user_id).await?;
    Ok(Json(found))
}

#[instrument(skip(state, pairs), fields(entity = schema.name))]
pub async fn set_record(
    State(state): State<AppState>,
    Extension(schema): Extension<&'static EntitySchema>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
    Json(pairs): Json<Record>,
) -> ApiResult<Json<Record>> {
    let updated = service(&state, schema).set(caller, id, pairs).await?;
    Ok(Json(updated))
}

#[instrument(skip(state), fields(entity = schema.name))]
pub async fn del_record(
    State(state): State<AppState>,
    Extension(schema): Extension<&'static EntitySchema>,
    AuthUser(caller): AuthUser,
    Path(id): Path<Uuid>,
) -> ApiResult<Json<Record>> {
    let removed = service(&state, schema).del(caller, id).await?;
    Ok(Json(removed))
}
