//! Cart service.
//!
//! Holds the catalog and the raw cart records for the current user. Every view
//! of the cart is recomputed from those two lists via [`CartSummary`]; the
//! records themselves are only ever replaced wholesale by what the backend
//! returns.

use std::sync::Arc;

use qkart_core::{
    AuthToken, CartRecord, CartSummary, Product, ProductId, apply_quantity_change, is_duplicate,
};
use tracing::{debug, instrument};

use super::report;
use crate::backend::Backend;
use crate::error::{Result, StorefrontError};
use crate::notify::{Notification, Notifier};
use crate::session::{self, SessionStore};

/// Shown when adding a product the cart already tracks.
pub const ALREADY_IN_CART_MESSAGE: &str =
    "Item already in cart. Use the cart sidebar to update quantity or remove item.";

/// Outcome of [`CartService::add_to_cart`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddToCart {
    /// The product was added with quantity one.
    Added,
    /// The cart already tracks the product; nothing was sent.
    AlreadyInCart,
}

/// Cart state for the logged-in user.
pub struct CartService {
    backend: Arc<dyn Backend>,
    session: Arc<dyn SessionStore>,
    notifier: Arc<dyn Notifier>,
    catalog: Vec<Product>,
    records: Vec<CartRecord>,
}

impl CartService {
    /// Create an empty cart service. Call [`load`](Self::load) to populate it.
    #[must_use]
    pub fn new(
        backend: Arc<dyn Backend>,
        session: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Self {
        Self {
            backend,
            session,
            notifier,
            catalog: Vec::new(),
            records: Vec::new(),
        }
    }

    /// The loaded catalog.
    #[must_use]
    pub fn catalog(&self) -> &[Product] {
        &self.catalog
    }

    /// The raw cart records as last reported by the backend.
    #[must_use]
    pub fn records(&self) -> &[CartRecord] {
        &self.records
    }

    /// The reconciled cart.
    #[must_use]
    pub fn summary(&self) -> CartSummary {
        CartSummary::from_parts(&self.records, &self.catalog)
    }

    // =========================================================================
    // Loading
    // =========================================================================

    /// Fetch the catalog and, when logged in, the cart.
    ///
    /// Without a stored token the cart is empty and not requested.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::Backend` if either request fails, or
    /// `StorefrontError::Session` if the session cannot be read.
    #[instrument(skip(self))]
    pub async fn load(&mut self) -> Result<()> {
        let catalog = self
            .backend
            .fetch_products()
            .await
            .map_err(|e| report(self.notifier.as_ref(), e.into()))?;
        self.catalog = catalog;

        let records = match self.token().map_err(|e| report(self.notifier.as_ref(), e))? {
            Some(token) => self
                .backend
                .fetch_cart(&token)
                .await
                .map_err(|e| report(self.notifier.as_ref(), e.into()))?,
            None => Vec::new(),
        };
        self.records = records;

        debug!(
            products = self.catalog.len(),
            records = self.records.len(),
            "Cart loaded"
        );
        Ok(())
    }

    // =========================================================================
    // Mutations
    // =========================================================================

    /// Add a product with quantity one.
    ///
    /// A product the cart already tracks (at any quantity) is left alone and
    /// the user is pointed at the cart instead.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::NotLoggedIn` without a session, or the
    /// mutation error from [`set_quantity`](Self::set_quantity).
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn add_to_cart(&mut self, product_id: &ProductId) -> Result<AddToCart> {
        let token = self.require_token()?;

        if is_duplicate(&self.records, product_id) {
            self.notifier
                .notify(Notification::warning(ALREADY_IN_CART_MESSAGE));
            return Ok(AddToCart::AlreadyInCart);
        }

        self.mutate(&token, product_id, 1).await?;
        self.notifier.notify(Notification::success("Item added to cart"));
        Ok(AddToCart::Added)
    }

    /// Set the quantity of a product; zero or less removes it.
    ///
    /// On success the backend's cart replaces the local records. On failure
    /// the records are left as they were.
    ///
    /// # Errors
    ///
    /// Returns `StorefrontError::NotLoggedIn` without a session, or
    /// `StorefrontError::Backend` if the mutation fails.
    #[instrument(skip(self), fields(product_id = %product_id))]
    pub async fn set_quantity(&mut self, product_id: &ProductId, qty: i64) -> Result<CartSummary> {
        let token = self.require_token()?;
        self.mutate(&token, product_id, qty).await?;
        Ok(self.summary())
    }

    /// Remove a product from the cart.
    ///
    /// # Errors
    ///
    /// See [`set_quantity`](Self::set_quantity).
    pub async fn remove(&mut self, product_id: &ProductId) -> Result<CartSummary> {
        self.set_quantity(product_id, 0).await
    }

    /// The cart as it would look after setting `product_id` to `qty`.
    ///
    /// Nothing is sent. This is the view a caller can show while the change
    /// is in flight; the backend's answer to the real change replaces it.
    #[must_use]
    pub fn preview_quantity(&self, product_id: &ProductId, qty: i64) -> CartSummary {
        let staged = apply_quantity_change(&self.records, product_id, qty);
        CartSummary::from_parts(&staged, &self.catalog)
    }

    async fn mutate(&mut self, token: &AuthToken, product_id: &ProductId, qty: i64) -> Result<()> {
        let staged = apply_quantity_change(&self.records, product_id, qty);

        let records = self
            .backend
            .mutate_cart(token, product_id, qty)
            .await
            .map_err(|e| report(self.notifier.as_ref(), e.into()))?;

        if records != staged {
            debug!(
                staged = staged.len(),
                returned = records.len(),
                "Backend cart differs from the staged change"
            );
        }
        self.records = records;
        Ok(())
    }

    // =========================================================================
    // Session
    // =========================================================================

    fn token(&self) -> Result<Option<AuthToken>> {
        Ok(session::load_session(self.session.as_ref())?.map(|s| s.token))
    }

    fn require_token(&self) -> Result<AuthToken> {
        self.token()
            .and_then(|token| token.ok_or(StorefrontError::NotLoggedIn))
            .map_err(|e| report(self.notifier.as_ref(), e))
    }
}
