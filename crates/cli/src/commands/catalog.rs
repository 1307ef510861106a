//! Catalog browsing and search.

use std::io::{self, Write};

use qkart_storefront::{SearchState, Storefront};

use crate::CliError;
use crate::render;

/// List the whole catalog.
pub async fn products(storefront: &Storefront) -> Result<(), CliError> {
    let mut cart = storefront.cart();
    cart.load().await?;
    render::catalog(&mut io::stdout().lock(), cart.catalog())?;
    Ok(())
}

/// Feed `queries` to the debounced search back to back and print what the
/// last one settles on.
pub async fn search(storefront: &Storefront, queries: &[String]) -> Result<(), CliError> {
    let controller = storefront.search();
    let mut states = controller.subscribe();

    for query in queries {
        controller.input(query.as_str());
    }

    let last = queries.last().map(String::as_str).unwrap_or_default();
    let state = if last.trim().is_empty() {
        SearchState::Idle
    } else {
        states
            .wait_for(|state| is_settled(state, last))
            .await
            .map_err(|_| CliError::SearchAborted)?
            .clone()
    };

    if matches!(state, SearchState::Failed { .. }) {
        return Err(CliError::SearchFailed);
    }

    let mut out = io::stdout().lock();
    render::search(&mut out, &state)?;
    out.flush()?;
    Ok(())
}

/// Whether `state` is the final answer for `query`.
fn is_settled(state: &SearchState, query: &str) -> bool {
    match state {
        SearchState::Results { query: q, .. }
        | SearchState::NoMatches { query: q }
        | SearchState::Failed { query: q, .. } => q == query,
        SearchState::Idle | SearchState::Loading { .. } => false,
    }
}
