//! In-process stand-in for the console backend.

#![allow(dead_code)]

use axum::{
    Json, Router,
    extract::{Multipart, Path, State},
    http::{HeaderMap, StatusCode, header},
    response::{IntoResponse, Response},
    routing::{delete, get, post},
};
use client::AdminClient;
use cookie::Cookie;
use reqwest::cookie::Jar;
use serde_json::{Value, json};
use shared::{config::ApiConfig, models::LoginRequest};
use std::sync::{Arc, Mutex};
use tokio::net::TcpListener;
use url::Url;

pub const SESSION_TOKEN: &str = "session-abc";
pub const EMAIL: &str = "ada@example.com";
pub const PASSWORD: &str = "secret";

/// One multipart part as the backend received it.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordedPart {
    pub name: String,
    pub file_name: Option<String>,
    pub value: String,
}

#[derive(Debug, Default)]
pub struct BackendState {
    pub parts: Mutex<Vec<RecordedPart>>,
    pub profile_status: Mutex<Option<StatusCode>>,
    pub products_status: Mutex<Option<StatusCode>>,
    pub logout_status: Mutex<Option<StatusCode>>,
    pub profile_calls: Mutex<u32>,
}

impl BackendState {
    pub fn take_parts(&self) -> Vec<RecordedPart> {
        std::mem::take(&mut *self.parts.lock().unwrap())
    }

    pub fn fail_profile(&self, status: StatusCode) {
        *self.profile_status.lock().unwrap() = Some(status);
    }

    pub fn fail_products(&self, status: StatusCode) {
        *self.products_status.lock().unwrap() = Some(status);
    }

    pub fn fail_logout(&self, status: StatusCode) {
        *self.logout_status.lock().unwrap() = Some(status);
    }
}

pub struct MockBackend {
    pub base_url: String,
    pub state: Arc<BackendState>,
}

impl MockBackend {
    /// Client with an empty cookie jar.
    pub fn client(&self) -> AdminClient {
        let config = ApiConfig {
            base_url: Some(Url::parse(&self.base_url).unwrap()),
            ..ApiConfig::default()
        };
        AdminClient::new(&config, Arc::new(Jar::default())).unwrap()
    }

    /// Client whose jar already holds a valid session cookie.
    pub fn signed_in_client(&self) -> AdminClient {
        let client = self.client();
        let origin = Url::parse(&self.base_url).unwrap();
        client
            .jar()
            .add_cookie_str(&format!("token={SESSION_TOKEN}; Path=/"), &origin);
        client
    }
}

pub async fn spawn() -> MockBackend {
    let state = Arc::new(BackendState::default());
    let router = Router::new()
        .route("/login", post(login))
        .route("/logout", post(logout))
        .route("/admin/profile", get(profile))
        .route("/blogs", get(list_blogs).post(create_blog))
        .route("/blogs/update/{id}", post(update_blog))
        .route("/blogs/delete/{id}", delete(delete_blog))
        .route("/blogs/like/{id}", post(like_blog))
        .route("/products", get(list_products).post(create_product))
        .route("/products/update/{id}", post(update_product))
        .route("/products/delete/{id}", delete(delete_product))
        .with_state(state.clone());

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let address = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });

    MockBackend {
        base_url: format!("http://{address}"),
        state,
    }
}

fn has_session(headers: &HeaderMap) -> bool {
    headers
        .get(header::COOKIE)
        .and_then(|value| value.to_str().ok())
        .is_some_and(|raw| {
            Cookie::split_parse(raw)
                .flatten()
                .any(|cookie| cookie.name() == "token" && cookie.value() == SESSION_TOKEN)
        })
}

fn unauthorized() -> Response {
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "error": "Unauthorized" })),
    )
        .into_response()
}

async fn login(Json(request): Json<LoginRequest>) -> Response {
    if request.email == EMAIL && request.password == PASSWORD {
        (
            [(
                header::SET_COOKIE,
                format!("token={SESSION_TOKEN}; Path=/; HttpOnly"),
            )],
            Json(json!({ "message": "Logged in" })),
        )
            .into_response()
    } else {
        (
            StatusCode::UNAUTHORIZED,
            Json(json!({ "message": "Invalid email or password" })),
        )
            .into_response()
    }
}

async fn logout(State(state): State<Arc<BackendState>>) -> Response {
    if let Some(status) = *state.logout_status.lock().unwrap() {
        return status.into_response();
    }
    (
        [(header::SET_COOKIE, "token=; Path=/; Max-Age=0".to_string())],
        Json(json!({ "message": "Logged out" })),
    )
        .into_response()
}

async fn profile(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    *state.profile_calls.lock().unwrap() += 1;
    if let Some(status) = *state.profile_status.lock().unwrap() {
        return (status, "backend unavailable").into_response();
    }
    if !has_session(&headers) {
        return unauthorized();
    }
    Json(json!({
        "id": "u-1",
        "username": "ada",
        "email": EMAIL,
        "role": "admin"
    }))
    .into_response()
}

async fn record_parts(state: &BackendState, mut multipart: Multipart) -> Vec<RecordedPart> {
    let mut received = Vec::new();
    while let Ok(Some(field)) = multipart.next_field().await {
        let name = field.name().unwrap_or_default().to_string();
        let file_name = field.file_name().map(str::to_string);
        let bytes = field.bytes().await.unwrap_or_default();
        let value = if file_name.is_some() {
            format!("{} bytes", bytes.len())
        } else {
            String::from_utf8_lossy(&bytes).into_owned()
        };
        received.push(RecordedPart {
            name,
            file_name,
            value,
        });
    }
    state.parts.lock().unwrap().extend(received.clone());
    received
}

fn text_of(parts: &[RecordedPart], name: &str) -> Option<String> {
    parts
        .iter()
        .find(|part| part.name == name && part.file_name.is_none())
        .map(|part| part.value.clone())
}

fn file_of(parts: &[RecordedPart], name: &str) -> Option<String> {
    parts
        .iter()
        .find(|part| part.name == name)
        .and_then(|part| part.file_name.clone())
}

async fn list_blogs(headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    Json(json!({
        "blogs": [
            { "_id": "blog-1", "title": "Hello", "content": "World", "featured_image": "hello.png", "likes": 2 },
            { "_id": "blog-2", "title": "Second", "content": "Post" }
        ]
    }))
    .into_response()
}

async fn create_blog(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    let parts = record_parts(&state, multipart).await;
    let Some(image) = file_of(&parts, "featured_image") else {
        return (
            StatusCode::BAD_REQUEST,
            Json(json!({ "error": "Featured image is required" })),
        )
            .into_response();
    };
    (
        StatusCode::CREATED,
        Json(json!({
            "blog": {
                "_id": "blog-new",
                "title": text_of(&parts, "title"),
                "content": text_of(&parts, "content"),
                "featured_image": image,
                "likes": 0,
                "likers": []
            }
        })),
    )
        .into_response()
}

async fn update_blog(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    let parts = record_parts(&state, multipart).await;
    if id == "ack-only" {
        return Json(json!({ "message": "Blog updated" })).into_response();
    }
    Json(json!({
        "UpdateBlog": {
            "_id": id,
            "title": text_of(&parts, "title").unwrap_or_else(|| "Hello".into()),
            "content": text_of(&parts, "content").unwrap_or_else(|| "World".into())
        }
    }))
    .into_response()
}

async fn delete_blog(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    if id == "missing" {
        return (
            StatusCode::NOT_FOUND,
            Json(json!({ "error": "Blog not found" })),
        )
            .into_response();
    }
    Json(json!({ "message": "Blog deleted" })).into_response()
}

async fn like_blog(headers: HeaderMap, Path(_id): Path<String>) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    Json(json!({ "likes": 3 })).into_response()
}

fn product_json(id: &str, parts: &[RecordedPart]) -> Value {
    let images: Vec<Value> = parts
        .iter()
        .filter(|part| part.name == "images")
        .filter_map(|part| part.file_name.clone())
        .enumerate()
        .map(|(index, url)| json!({ "url": url, "isPrimary": index == 0 }))
        .collect();
    json!({
        "_id": id,
        "name": text_of(parts, "name").unwrap_or_else(|| "Lamp".into()),
        "description": text_of(parts, "description").unwrap_or_else(|| "Desk lamp".into()),
        "price": text_of(parts, "price").and_then(|raw| raw.parse::<f64>().ok()).unwrap_or(19.99),
        "stock": text_of(parts, "stock").and_then(|raw| raw.parse::<u32>().ok()).unwrap_or(4),
        "category": text_of(parts, "category").unwrap_or_else(|| "lighting".into()),
        "status": text_of(parts, "status").unwrap_or_else(|| "active".into()),
        "images": images
    })
}

async fn list_products(State(state): State<Arc<BackendState>>, headers: HeaderMap) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    if let Some(status) = *state.products_status.lock().unwrap() {
        return status.into_response();
    }
    Json(json!([
        product_json("prod-1", &[]),
        { "_id": "prod-legacy", "name": "Legacy", "status": "archived", "stock": -2, "images": null }
    ]))
    .into_response()
}

async fn create_product(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    multipart: Multipart,
) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    let parts = record_parts(&state, multipart).await;
    (
        StatusCode::CREATED,
        Json(json!({ "product": product_json("prod-new", &parts) })),
    )
        .into_response()
}

async fn update_product(
    State(state): State<Arc<BackendState>>,
    headers: HeaderMap,
    Path(id): Path<String>,
    multipart: Multipart,
) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    let parts = record_parts(&state, multipart).await;
    Json(json!({ "message": "Product updated", "product": product_json(&id, &parts) }))
        .into_response()
}

async fn delete_product(headers: HeaderMap, Path(id): Path<String>) -> Response {
    if !has_session(&headers) {
        return unauthorized();
    }
    if id == "missing" {
        return (StatusCode::NOT_FOUND, "not here").into_response();
    }
    StatusCode::NO_CONTENT.into_response()
}

pub fn credentials() -> LoginRequest {
    LoginRequest::new(EMAIL, PASSWORD)
}
