//! Plain-text rendering of storefront values.

use std::io::{self, Write};

use qkart_core::{CartSummary, Product, UserSession, format_amount};
use qkart_storefront::SearchState;
use rust_decimal::Decimal;

/// One line per product: id, name, category, cost and rating.
pub fn catalog(out: &mut impl Write, products: &[Product]) -> io::Result<()> {
    if products.is_empty() {
        return writeln!(out, "No products found");
    }
    for product in products {
        let category = if product.category.is_empty() {
            "-"
        } else {
            product.category.as_str()
        };
        writeln!(
            out,
            "{}  {}  [{}]  {}  {:.1}/5",
            product.id,
            product.name,
            category,
            format_amount(product.effective_cost()),
            product.rating_stars()
        )?;
    }
    Ok(())
}

/// The settled state of a search.
pub fn search(out: &mut impl Write, state: &SearchState) -> io::Result<()> {
    match state {
        SearchState::Idle => writeln!(out, "Type something to search"),
        SearchState::Loading { query } => writeln!(out, "Searching for \"{query}\"..."),
        SearchState::Results { products, .. } => catalog(out, products),
        SearchState::NoMatches { .. } => writeln!(out, "No products found"),
        SearchState::Failed { message, .. } => writeln!(out, "{message}"),
    }
}

/// Cart line items with totals. `balance` adds an affordability line.
pub fn cart(
    out: &mut impl Write,
    summary: &CartSummary,
    balance: Option<Decimal>,
) -> io::Result<()> {
    if summary.is_empty() {
        writeln!(out, "Cart is empty")?;
    } else {
        for item in &summary.items {
            writeln!(
                out,
                "{}  {}  {} x {} = {}",
                item.product.id,
                item.product.name,
                item.qty,
                format_amount(item.product.effective_cost()),
                format_amount(item.line_total())
            )?;
        }
    }

    writeln!(out, "Items: {}", summary.item_count)?;
    writeln!(out, "Total: {}", format_amount(summary.total))?;

    if let Some(balance) = balance {
        let verdict = if summary.can_afford(balance) {
            "sufficient"
        } else {
            "insufficient"
        };
        writeln!(out, "Wallet: {} ({verdict})", format_amount(balance))?;
    }
    Ok(())
}

/// Who is logged in.
pub fn session(out: &mut impl Write, session: Option<&UserSession>) -> io::Result<()> {
    match session {
        Some(session) => writeln!(
            out,
            "Logged in as {} (wallet {})",
            session.username,
            format_amount(session.balance)
        ),
        None => writeln!(out, "Not logged in"),
    }
}
