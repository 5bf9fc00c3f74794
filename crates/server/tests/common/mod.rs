#![allow(dead_code)]

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, HeaderMap, Request, StatusCode};
use axum::Router;
use configs::{AdminSeed, AuthConfig, CatalogConfig, OwnerDeletePolicy};
use serde_json::{json, Value};
use service::catalog::repository::mock::MockEntryRepository;
use service::users::repository::mock::MockUserRepository;
use tower::Service;

use server::routes::{self, auth::ServerState};

fn cors() -> tower_http::cors::CorsLayer { tower_http::cors::CorsLayer::very_permissive() }

/// Router over in-memory repositories; no database needed.
pub fn build_app(policy: OwnerDeletePolicy) -> (Router, ServerState) {
    let auth = AuthConfig { jwt_secret: "test-secret".into(), token_ttl_minutes: 60, bootstrap_admin: None };
    let catalog = CatalogConfig { owner_delete_policy: policy, max_page_size: 100 };
    let state = ServerState::new(
        Arc::new(MockUserRepository::default()),
        Arc::new(MockEntryRepository::default()),
        &auth,
        &catalog,
    );
    (routes::build_router(state.clone(), cors()), state)
}

pub struct Reply {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub body: Value,
}

pub async fn send(app: &Router, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> anyhow::Result<Reply> {
    let mut req = Request::builder().method(method).uri(uri);
    if let Some(t) = token {
        req = req.header(header::AUTHORIZATION, format!("Bearer {t}"));
    }
    let req = match body {
        Some(b) => req.header(header::CONTENT_TYPE, "application/json").body(Body::from(serde_json::to_vec(&b)?))?,
        None => req.body(Body::empty())?,
    };
    let resp = app.clone().call(req).await?;
    let status = resp.status();
    let headers = resp.headers().clone();
    let bytes = axum::body::to_bytes(resp.into_body(), usize::MAX).await?;
    let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes)? };
    Ok(Reply { status, headers, body })
}

pub async fn register(app: &Router, username: &str, password: &str) -> anyhow::Result<Reply> {
    let payload = json!({"username": username, "email": format!("{username}@example.com"), "password": password});
    send(app, "POST", "/auth/register", None, Some(payload)).await
}

/// Register (when needed) and log in; returns the user id and token.
pub async fn login_as(app: &Router, username: &str) -> anyhow::Result<(i64, String)> {
    let password = format!("{username}-pass");
    let _ = register(app, username, &password).await?;
    let reply = send(app, "POST", "/auth/login", None, Some(json!({"username": username, "password": password}))).await?;
    assert_eq!(reply.status, StatusCode::OK, "login failed: {}", reply.body);
    let id = reply.body["user"]["id"].as_i64().expect("user id");
    let token = reply.body["token"].as_str().expect("token").to_string();
    Ok((id, token))
}

pub async fn admin_token(app: &Router, state: &ServerState) -> anyhow::Result<(i64, String)> {
    let seed = AdminSeed { username: "oak".into(), email: "oak@example.com".into(), password: "professor".into() };
    state.users.ensure_admin(&seed).await?;
    let reply = send(app, "POST", "/auth/login", None, Some(json!({"username": "oak", "password": "professor"}))).await?;
    assert_eq!(reply.status, StatusCode::OK);
    Ok((reply.body["user"]["id"].as_i64().expect("id"), reply.body["token"].as_str().expect("token").to_string()))
}

pub fn entry_body(number: i32, name: &str) -> Value {
    json!({
        "number": number,
        "name": name,
        "height_m": 0.7,
        "weight_kg": 6.9,
        "types": ["Grass", "Poison"],
        "abilities": ["Overgrow"],
        "hp": 45, "attack": 49, "defense": 49,
        "special_attack": 65, "special_defense": 65, "speed": 45
    })
}
