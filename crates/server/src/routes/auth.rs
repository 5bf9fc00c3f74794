use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::{header, Method, StatusCode},
    middleware::Next,
    response::Response,
    Extension, Json,
};
use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use serde::{Deserialize, Serialize};
use tracing::warn;

use configs::{AuthConfig, CatalogConfig, OwnerDeletePolicy};
use service::access::AuthContext;
use service::catalog::{repository::EntryRepository, CatalogService};
use service::credentials::CredentialService;
use service::users::{
    domain::{RegisterInput, User},
    repository::UserRepository,
    UserDirectory,
};

use crate::errors::JsonApiError;

pub const AUTH_COOKIE: &str = "auth_token";

#[derive(Clone)]
pub struct ServerState {
    pub credentials: Arc<CredentialService>,
    pub users: Arc<UserDirectory>,
    pub catalog: Arc<CatalogService>,
    pub owner_delete_policy: OwnerDeletePolicy,
}

impl ServerState {
    /// Wire the services over the given repositories.
    pub fn new(
        user_repo: Arc<dyn UserRepository>,
        entry_repo: Arc<dyn EntryRepository>,
        auth: &AuthConfig,
        catalog: &CatalogConfig,
    ) -> Self {
        let credentials = Arc::new(CredentialService::from_config(auth));
        let users = Arc::new(UserDirectory::new(user_repo, credentials.clone()));
        let catalog_svc = Arc::new(CatalogService::new(entry_repo, users.clone(), catalog.max_page_size));
        Self { credentials, users, catalog: catalog_svc, owner_delete_policy: catalog.owner_delete_policy }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub first_name: Option<String>,
    #[serde(default)]
    pub last_name: Option<String>,
    #[serde(default)]
    pub password: String,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginRequest {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
}

#[derive(Serialize)]
pub struct LoginOutput {
    pub token: String,
    pub token_type: &'static str,
    pub user: User,
}

pub(crate) fn require_non_blank(field: &str, value: &str) -> Result<(), JsonApiError> {
    if value.trim().is_empty() {
        return Err(JsonApiError::bad_request(format!("{field} is required")));
    }
    Ok(())
}

#[utoipa::path(post, path = "/auth/register", tag = "auth", request_body = crate::openapi::RegisterRequestDoc, responses((status = 201, description = "Registered", body = crate::openapi::UserDoc), (status = 400, description = "Bad Request"), (status = 409, description = "Conflict")))]
pub async fn register(State(state): State<ServerState>, Json(input): Json<RegisterRequest>) -> Result<(StatusCode, Json<User>), JsonApiError> {
    require_non_blank("username", &input.username)?;
    require_non_blank("email", &input.email)?;
    require_non_blank("password", &input.password)?;
    let user = state
        .users
        .register(RegisterInput {
            username: input.username,
            email: input.email,
            first_name: input.first_name,
            last_name: input.last_name,
            password: input.password,
        })
        .await?;
    Ok((StatusCode::CREATED, Json(user)))
}

#[utoipa::path(post, path = "/auth/login", tag = "auth", request_body = crate::openapi::LoginRequestDoc, responses((status = 200, description = "Logged In", body = crate::openapi::LoginResponseDoc), (status = 401, description = "Unauthorized")))]
pub async fn login(State(state): State<ServerState>, jar: CookieJar, Json(input): Json<LoginRequest>) -> Result<(CookieJar, Json<LoginOutput>), JsonApiError> {
    require_non_blank("username", &input.username)?;
    require_non_blank("password", &input.password)?;
    let session = state.users.authenticate(&input.username, &input.password).await?;

    let mut cookie = Cookie::new(AUTH_COOKIE, session.token.clone());
    cookie.set_path("/");
    cookie.set_http_only(true);
    cookie.set_secure(false);
    cookie.set_same_site(SameSite::Lax);
    let jar = jar.add(cookie);
    Ok((jar, Json(LoginOutput { token: session.token, token_type: "Bearer", user: session.user })))
}

#[utoipa::path(post, path = "/auth/logout", tag = "auth", responses((status = 204, description = "Cookie cleared")))]
pub async fn logout(jar: CookieJar) -> (CookieJar, StatusCode) {
    let jar = jar.remove(Cookie::build(AUTH_COOKIE).path("/"));
    (jar, StatusCode::NO_CONTENT)
}

#[utoipa::path(get, path = "/auth/me", tag = "auth", responses((status = 200, description = "Current user", body = crate::openapi::UserDoc), (status = 401, description = "Unauthorized"), (status = 404, description = "Account no longer exists")))]
pub async fn me(State(state): State<ServerState>, Extension(ctx): Extension<AuthContext>) -> Result<Json<User>, JsonApiError> {
    state.users.get_by_id(ctx.user_id).await?.map(Json).ok_or_else(|| JsonApiError::not_found("user"))
}

fn is_public(method: &Method, path: &str) -> bool {
    path == "/health"
        || path == "/auth/login"
        || path == "/auth/register"
        || path.starts_with("/docs")
        || path.starts_with("/api-docs")
        || method == Method::OPTIONS
}

/// Global middleware: everything except the public routes needs `Authorization: Bearer <token>`
/// or the `auth_token` cookie. The resolved `AuthContext` is stored in request extensions.
pub async fn require_bearer_token_state(
    State(state): State<ServerState>,
    mut req: Request,
    next: Next,
) -> Result<Response, JsonApiError> {
    let path = req.uri().path().to_string();
    if is_public(req.method(), &path) {
        return Ok(next.run(req).await);
    }

    let token = match req.headers().get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(h) => match h.strip_prefix("Bearer ") {
            Some(t) => t.trim().to_string(),
            None => {
                warn!(path = %path, "invalid Authorization format (expect Bearer)");
                return Err(JsonApiError::unauthorized("expected a Bearer token"));
            }
        },
        None => match CookieJar::from_headers(req.headers()).get(AUTH_COOKIE) {
            Some(c) if !c.value().is_empty() => c.value().to_string(),
            _ => {
                warn!(path = %path, "missing Authorization header and auth_token cookie");
                return Err(JsonApiError::unauthorized("authentication required"));
            }
        },
    };

    match state.credentials.validate(&token) {
        Ok(ctx) => {
            req.extensions_mut().insert(ctx);
            Ok(next.run(req).await)
        }
        Err(e) => {
            warn!(path = %path, err = %e, "token validation failed");
            Err(e.into())
        }
    }
}

