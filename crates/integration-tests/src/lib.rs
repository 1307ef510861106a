//! Integration tests for QKart.
//!
//! # Running Tests
//!
//! ```bash
//! cargo test -p qkart-integration-tests
//! ```
//!
//! No external services are needed: [`TestBackend`] serves the QKart REST API
//! from memory on an ephemeral local port, answering with the same JSON shapes
//! and error bodies as the real backend.
//!
//! # Test Categories
//!
//! - `backend_client` - `BackendClient` against the HTTP API
//! - `storefront_flow` - Auth, cart and session persistence end to end
//! - `search_debounce` - Debounced search over real HTTP

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use axum::extract::{Query, State};
use axum::http::{HeaderMap, StatusCode, header::AUTHORIZATION};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use qkart_storefront::ClientConfig;
use serde::Deserialize;
use serde_json::{Value, json};
use tokio::task::JoinHandle;
use url::Url;

/// Balance granted to every new account, as on the real backend.
pub const STARTING_BALANCE: i64 = 5000;

// =============================================================================
// Fixtures
// =============================================================================

/// A catalog entry in the backend's JSON shape.
#[must_use]
pub fn product_json(id: &str, name: &str, category: &str, cost: Value) -> Value {
    json!({
        "_id": id,
        "name": name,
        "category": category,
        "cost": cost,
        "rating": 4,
        "image": format!("https://crio-directus-assets.s3.ap-south-1.amazonaws.com/{id}.png"),
    })
}

/// A small catalog covering several categories.
#[must_use]
pub fn sample_catalog() -> Vec<Value> {
    vec![
        product_json(
            "BW0jAAeDJmlZCF8i",
            "Tan Leatherette Weekender Duffle",
            "Fashion",
            json!(150),
        ),
        product_json(
            "KCRwjF7lN97HnEaY",
            "The Minimalist Slim Leather Watch",
            "Fashion",
            json!(60),
        ),
        product_json(
            "a4sLtEcMpzabRyfx",
            "Atomberg 1200mm BLDC Ceiling Fan",
            "Home & Kitchen",
            json!(120),
        ),
        product_json("upLK9JbQ4rMhTwt4", "OnePlus 6T", "Phones", json!(450)),
    ]
}

// =============================================================================
// TestBackend
// =============================================================================

#[derive(Default)]
struct ServerState {
    catalog: Vec<Value>,
    users: HashMap<String, String>,
    carts: HashMap<String, Vec<(String, i64)>>,
    hits: Vec<String>,
}

type Shared = Arc<Mutex<ServerState>>;

fn lock(state: &Shared) -> MutexGuard<'_, ServerState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// In-memory QKart backend served over HTTP.
///
/// The server task is stopped when the value is dropped.
pub struct TestBackend {
    addr: SocketAddr,
    state: Shared,
    server: JoinHandle<()>,
}

impl TestBackend {
    /// Serve `catalog` on `127.0.0.1` at an ephemeral port.
    ///
    /// # Errors
    ///
    /// Returns an error if the listener cannot be bound.
    pub async fn spawn(catalog: Vec<Value>) -> std::io::Result<Self> {
        let state: Shared = Arc::new(Mutex::new(ServerState {
            catalog,
            ..ServerState::default()
        }));

        let api = Router::new()
            .route("/products", get(list_products))
            .route("/products/search", get(search_products))
            .route("/cart", get(get_cart).post(post_cart))
            .route("/auth/register", post(register))
            .route("/auth/login", post(login))
            .with_state(Arc::clone(&state));
        let app = Router::new().nest("/api/v1", api);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await?;
        let addr = listener.local_addr()?;
        let server = tokio::spawn(async move {
            if let Err(e) = axum::serve(listener, app).await {
                tracing::error!(error = %e, "Test backend stopped");
            }
        });

        Ok(Self {
            addr,
            state,
            server,
        })
    }

    /// Base URL of the API, e.g. `http://127.0.0.1:41234/api/v1`.
    ///
    /// # Panics
    ///
    /// Panics if the bound address does not form a valid URL.
    #[must_use]
    pub fn endpoint(&self) -> Url {
        Url::parse(&format!("http://{}/api/v1", self.addr)).expect("socket address is a valid URL")
    }

    /// Client configuration pointing at this backend.
    ///
    /// Caching is disabled so request counts reflect every call.
    #[must_use]
    pub fn config(&self) -> ClientConfig {
        let mut config = ClientConfig::with_endpoint(self.endpoint());
        config.catalog_cache_ttl = Duration::ZERO;
        config.request_timeout = Duration::from_secs(5);
        config
    }

    /// Create an account directly.
    pub fn add_user(&self, username: &str, password: &str) {
        lock(&self.state)
            .users
            .insert(username.to_string(), password.to_string());
    }

    /// Overwrite a user's cart with raw `(productId, qty)` records.
    pub fn set_cart(&self, username: &str, records: &[(&str, i64)]) {
        lock(&self.state).carts.insert(
            username.to_string(),
            records
                .iter()
                .map(|(id, qty)| ((*id).to_string(), *qty))
                .collect(),
        );
    }

    /// A user's cart as stored on the server.
    #[must_use]
    pub fn cart_of(&self, username: &str) -> Vec<(String, i64)> {
        lock(&self.state)
            .carts
            .get(username)
            .cloned()
            .unwrap_or_default()
    }

    /// Every request seen so far as `"<METHOD> <path>[?query]"`.
    #[must_use]
    pub fn hits(&self) -> Vec<String> {
        lock(&self.state).hits.clone()
    }

    /// Number of requests whose description starts with `prefix`.
    #[must_use]
    pub fn count(&self, prefix: &str) -> usize {
        lock(&self.state)
            .hits
            .iter()
            .filter(|hit| hit.starts_with(prefix))
            .count()
    }
}

impl Drop for TestBackend {
    fn drop(&mut self) {
        self.server.abort();
    }
}

/// Bearer token issued to `username`.
#[must_use]
pub fn token_for(username: &str) -> String {
    format!("token-{username}")
}

// =============================================================================
// Handlers
// =============================================================================

fn failure(status: StatusCode, message: &str) -> Response {
    (status, Json(json!({ "success": false, "message": message }))).into_response()
}

fn cart_json(records: &[(String, i64)]) -> Value {
    Value::Array(
        records
            .iter()
            .map(|(id, qty)| json!({ "productId": id, "qty": qty }))
            .collect(),
    )
}

/// Resolve the bearer token to a username.
fn authenticate(state: &ServerState, headers: &HeaderMap) -> Option<String> {
    let token = headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?;
    let username = token.strip_prefix("token-")?;
    state
        .users
        .contains_key(username)
        .then(|| username.to_string())
}

async fn list_products(State(state): State<Shared>) -> Json<Vec<Value>> {
    let mut state = lock(&state);
    state.hits.push("GET /products".to_string());
    Json(state.catalog.clone())
}

#[derive(Deserialize)]
struct SearchParams {
    #[serde(default)]
    value: String,
}

async fn search_products(
    State(state): State<Shared>,
    Query(params): Query<SearchParams>,
) -> Response {
    let mut state = lock(&state);
    state
        .hits
        .push(format!("GET /products/search?value={}", params.value));

    let needle = params.value.to_lowercase();
    let matches: Vec<Value> = state
        .catalog
        .iter()
        .filter(|product| {
            ["name", "category"].iter().any(|field| {
                product[field]
                    .as_str()
                    .is_some_and(|text| text.to_lowercase().contains(&needle))
            })
        })
        .cloned()
        .collect();

    if matches.is_empty() {
        (StatusCode::NOT_FOUND, Json(Value::Array(Vec::new()))).into_response()
    } else {
        Json(matches).into_response()
    }
}

async fn get_cart(State(state): State<Shared>, headers: HeaderMap) -> Response {
    let mut state = lock(&state);
    state.hits.push("GET /cart".to_string());

    let Some(username) = authenticate(&state, &headers) else {
        return failure(
            StatusCode::UNAUTHORIZED,
            "Protected route, Oauth2 Bearer token not found",
        );
    };
    let records = state.carts.get(&username).cloned().unwrap_or_default();
    Json(cart_json(&records)).into_response()
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CartBody {
    product_id: String,
    qty: i64,
}

async fn post_cart(
    State(state): State<Shared>,
    headers: HeaderMap,
    Json(body): Json<CartBody>,
) -> Response {
    let mut state = lock(&state);
    state
        .hits
        .push(format!("POST /cart {} {}", body.product_id, body.qty));

    let Some(username) = authenticate(&state, &headers) else {
        return failure(
            StatusCode::UNAUTHORIZED,
            "Protected route, Oauth2 Bearer token not found",
        );
    };
    let exists = state
        .catalog
        .iter()
        .any(|product| product["_id"].as_str() == Some(body.product_id.as_str()));
    if !exists {
        return failure(StatusCode::NOT_FOUND, "Product doesn't exist");
    }

    let cart = state.carts.entry(username).or_default();
    if body.qty <= 0 {
        cart.retain(|(id, _)| id != &body.product_id);
    } else if let Some(record) = cart.iter_mut().find(|(id, _)| id == &body.product_id) {
        record.1 = body.qty;
    } else {
        cart.push((body.product_id, body.qty));
    }
    Json(cart_json(cart)).into_response()
}

#[derive(Deserialize)]
struct AuthBody {
    username: String,
    password: String,
}

async fn register(State(state): State<Shared>, Json(body): Json<AuthBody>) -> Response {
    let mut state = lock(&state);
    state.hits.push(format!("POST /auth/register {}", body.username));

    if state.users.contains_key(&body.username) {
        return failure(StatusCode::BAD_REQUEST, "Username is already taken");
    }
    state.users.insert(body.username, body.password);
    (StatusCode::CREATED, Json(json!({ "success": true }))).into_response()
}

async fn login(State(state): State<Shared>, Json(body): Json<AuthBody>) -> Response {
    let mut state = lock(&state);
    state.hits.push(format!("POST /auth/login {}", body.username));

    match state.users.get(&body.username) {
        Some(password) if *password == body.password => (
            StatusCode::CREATED,
            Json(json!({
                "success": true,
                "token": token_for(&body.username),
                "username": body.username,
                "balance": STARTING_BALANCE,
            })),
        )
            .into_response(),
        Some(_) => failure(StatusCode::BAD_REQUEST, "Password is incorrect"),
        None => failure(StatusCode::BAD_REQUEST, "Username does not exist"),
    }
}
