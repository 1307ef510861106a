//! Cart inspection and mutation.

use std::io;

use qkart_core::ProductId;
use qkart_storefront::{CartService, Storefront};
use rust_decimal::Decimal;

use crate::CliError;
use crate::render;

/// Print the reconciled cart.
pub async fn show(storefront: &Storefront) -> Result<(), CliError> {
    let cart = loaded(storefront).await?;
    print(storefront, &cart)
}

/// Add a product with quantity one.
pub async fn add(storefront: &Storefront, product_id: &str) -> Result<(), CliError> {
    let mut cart = loaded(storefront).await?;
    cart.add_to_cart(&ProductId::new(product_id)).await?;
    print(storefront, &cart)
}

/// Set the quantity of a product.
pub async fn set(storefront: &Storefront, product_id: &str, qty: i64) -> Result<(), CliError> {
    let mut cart = loaded(storefront).await?;
    cart.set_quantity(&ProductId::new(product_id), qty).await?;
    print(storefront, &cart)
}

/// Remove a product.
pub async fn remove(storefront: &Storefront, product_id: &str) -> Result<(), CliError> {
    let mut cart = loaded(storefront).await?;
    cart.remove(&ProductId::new(product_id)).await?;
    print(storefront, &cart)
}

async fn loaded(storefront: &Storefront) -> Result<CartService, CliError> {
    let mut cart = storefront.cart();
    cart.load().await?;
    Ok(cart)
}

fn print(storefront: &Storefront, cart: &CartService) -> Result<(), CliError> {
    let balance: Option<Decimal> = storefront
        .auth()
        .current_session()?
        .map(|session| session.balance);
    render::cart(&mut io::stdout().lock(), &cart.summary(), balance)?;
    Ok(())
}
