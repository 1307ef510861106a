//! In-memory [`Backend`] for unit tests.

use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use qkart_core::{
    AuthToken, CartRecord, Credentials, LoginResponse, Product, ProductId, apply_quantity_change,
};
use rust_decimal::Decimal;
use secrecy::ExposeSecret;

use super::{Backend, BackendError};

pub const VALID_TOKEN: &str = "testtoken";

/// Scriptable backend that records every call.
#[derive(Default)]
pub struct FakeBackend {
    pub catalog: Vec<Product>,
    pub cart: Mutex<Vec<CartRecord>>,
    pub users: Mutex<HashMap<String, String>>,
    pub calls: Mutex<Vec<String>>,
    /// Per-query artificial latency for search.
    pub search_delays: HashMap<String, Duration>,
    /// When set, every call fails with a server error.
    pub offline: bool,
}

impl FakeBackend {
    pub fn with_catalog(catalog: Vec<Product>) -> Self {
        Self {
            catalog,
            ..Self::default()
        }
    }

    pub fn with_user(self, username: &str, password: &str) -> Self {
        self.users
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .insert(username.to_string(), password.to_string());
        self
    }

    pub fn with_cart(self, records: Vec<CartRecord>) -> Self {
        *self.cart.lock().unwrap_or_else(std::sync::PoisonError::into_inner) = records;
        self
    }

    pub fn calls(&self) -> Vec<String> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone()
    }

    fn record(&self, call: String) -> Result<(), BackendError> {
        self.calls
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .push(call);
        if self.offline {
            return Err(BackendError::Api {
                status: 503,
                message: "Service Unavailable".to_string(),
            });
        }
        Ok(())
    }

    fn authorize(token: &AuthToken) -> Result<(), BackendError> {
        if token.expose() == VALID_TOKEN {
            Ok(())
        } else {
            Err(BackendError::Unauthorized(
                "Protected route, Oauth2 Bearer token not found".to_string(),
            ))
        }
    }
}

#[async_trait]
impl Backend for FakeBackend {
    async fn fetch_products(&self) -> Result<Vec<Product>, BackendError> {
        self.record("fetch_products".to_string())?;
        Ok(self.catalog.clone())
    }

    async fn search_products(&self, query: &str) -> Result<Vec<Product>, BackendError> {
        self.record(format!("search:{query}"))?;
        if let Some(delay) = self.search_delays.get(query) {
            tokio::time::sleep(*delay).await;
        }
        let needle = query.to_lowercase();
        Ok(self
            .catalog
            .iter()
            .filter(|p| {
                p.name.to_lowercase().contains(&needle)
                    || p.category.to_lowercase().contains(&needle)
            })
            .cloned()
            .collect())
    }

    async fn fetch_cart(&self, token: &AuthToken) -> Result<Vec<CartRecord>, BackendError> {
        self.record("fetch_cart".to_string())?;
        Self::authorize(token)?;
        Ok(self
            .cart
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner)
            .clone())
    }

    async fn mutate_cart(
        &self,
        token: &AuthToken,
        product_id: &ProductId,
        qty: i64,
    ) -> Result<Vec<CartRecord>, BackendError> {
        self.record(format!("mutate_cart:{product_id}:{qty}"))?;
        Self::authorize(token)?;
        if !self.catalog.iter().any(|p| &p.id == product_id) {
            return Err(BackendError::NotFound("Product doesn't exist".to_string()));
        }
        let mut cart = self
            .cart
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        *cart = apply_quantity_change(&cart, product_id, qty);
        Ok(cart.clone())
    }

    async fn register(&self, credentials: &Credentials) -> Result<(), BackendError> {
        self.record(format!("register:{}", credentials.username))?;
        let mut users = self
            .users
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        if users.contains_key(&credentials.username) {
            return Err(BackendError::Rejected {
                status: 400,
                message: "Username is already taken".to_string(),
            });
        }
        users.insert(
            credentials.username.clone(),
            credentials.password.expose_secret().to_string(),
        );
        Ok(())
    }

    async fn login(&self, credentials: &Credentials) -> Result<LoginResponse, BackendError> {
        self.record(format!("login:{}", credentials.username))?;
        let users = self
            .users
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        match users.get(&credentials.username) {
            Some(password) if password == credentials.password.expose_secret() => {
                Ok(LoginResponse {
                    token: AuthToken::new(VALID_TOKEN),
                    username: credentials.username.clone(),
                    balance: Decimal::from(5000),
                })
            }
            Some(_) => Err(BackendError::Rejected {
                status: 400,
                message: "Password is incorrect".to_string(),
            }),
            None => Err(BackendError::Rejected {
                status: 400,
                message: "Username does not exist".to_string(),
            }),
        }
    }
}
