use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use tracing::info;

use service::access::AuthContext;
use service::users::domain::{User, UserPatch};

use crate::errors::JsonApiError;
use crate::routes::auth::{require_non_blank, ServerState};

#[derive(Debug, Default, Deserialize)]
pub struct UpdateUserRequest {
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: Option<String>,
}

#[utoipa::path(get, path = "/users", tag = "users", responses((status = 200, description = "All users, id ascending", body = [crate::openapi::UserDoc]), (status = 403, description = "Admin only")))]
pub async fn list(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>) -> Result<Json<Vec<User>>, JsonApiError> {
    ctx.require_admin()?;
    Ok(Json(state.users.list_all().await?))
}

#[utoipa::path(get, path = "/users/{id}", tag = "users", params(("id" = i64, Path, description = "User id")), responses((status = 200, description = "OK", body = crate::openapi::UserDoc), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found")))]
pub async fn get(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>, Path(id): Path<i64>) -> Result<Json<User>, JsonApiError> {
    ctx.require_self_or_admin(id)?;
    state.users.get_by_id(id).await?.map(Json).ok_or_else(|| JsonApiError::not_found("user"))
}

#[utoipa::path(put, path = "/users/{id}", tag = "users", params(("id" = i64, Path, description = "User id")), request_body = crate::openapi::UpdateUserRequestDoc, responses((status = 200, description = "Updated", body = crate::openapi::UserDoc), (status = 400, description = "Validation Error"), (status = 403, description = "Forbidden"), (status = 404, description = "Not Found"), (status = 409, description = "Email taken")))]
pub async fn update(
    State(state): State<ServerState>,
    Extension(ctx): Extension<AuthContext>,
    Path(id): Path<i64>,
    Json(input): Json<UpdateUserRequest>,
) -> Result<Json<User>, JsonApiError> {
    ctx.require_self_or_admin(id)?;
    require_non_blank("email", &input.email)?;
    let patch = UserPatch { first_name: input.first_name, last_name: input.last_name, email: input.email, password: input.password };
    state.users.update(id, patch).await?.map(Json).ok_or_else(|| JsonApiError::not_found("user"))
}

#[utoipa::path(delete, path = "/users/{id}", tag = "users", params(("id" = i64, Path, description = "User id")), responses((status = 204, description = "Deleted"), (status = 403, description = "Admin only"), (status = 404, description = "Not Found"), (status = 409, description = "User still owns entries")))]
pub async fn delete(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    ctx.require_admin()?;
    if state.catalog.remove_owner(id, state.owner_delete_policy).await? {
        info!(user_id = id, admin_id = ctx.user_id, policy = ?state.owner_delete_policy, "admin_deleted_user");
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found("user"))
    }
}

#[utoipa::path(patch, path = "/users/{id}/deactivate", tag = "users", params(("id" = i64, Path, description = "User id")), responses((status = 204, description = "Deactivated"), (status = 403, description = "Admin only"), (status = 404, description = "Not Found")))]
pub async fn deactivate(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>, Path(id): Path<i64>) -> Result<StatusCode, JsonApiError> {
    ctx.require_admin()?;
    if state.users.deactivate(id).await? {
        Ok(StatusCode::NO_CONTENT)
    } else {
        Err(JsonApiError::not_found("user"))
    }
}
