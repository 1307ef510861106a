//! QKart CLI - Browse, search and manage a cart from the terminal.
//!
//! # Usage
//!
//! ```bash
//! # List the catalog
//! qkart products
//!
//! # Search; each argument is a keystroke burst fed to the debounced search
//! qkart search l le leather
//!
//! # Accounts
//! qkart register -u crio.do -p learnbydoing -c learnbydoing
//! qkart login -u crio.do -p learnbydoing
//! qkart whoami
//! qkart logout
//!
//! # Cart
//! qkart cart show
//! qkart cart add KCRwjF7lN97HnEaY
//! qkart cart set KCRwjF7lN97HnEaY 3
//! qkart cart remove KCRwjF7lN97HnEaY
//! ```
//!
//! # Environment Variables
//!
//! See `qkart_storefront::config`. `QKART_API_ENDPOINT` is required.

#![cfg_attr(not(test), forbid(unsafe_code))]

use std::process::ExitCode;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use qkart_storefront::{
    ClientConfig, SentryConfig, Storefront, StorefrontError, TracingNotifier,
};
use sentry::integrations::tracing as sentry_tracing;
use thiserror::Error;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod commands;
mod render;

#[derive(Parser)]
#[command(name = "qkart")]
#[command(author, version, about = "QKart storefront CLI")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List every product in the catalog
    Products,
    /// Search the catalog as if typing each query in turn
    Search {
        /// Successive contents of the search box
        #[arg(required = true)]
        queries: Vec<String>,
    },
    /// Create an account
    Register {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,

        /// Password confirmation
        #[arg(short, long)]
        confirm: String,
    },
    /// Log in and remember the session
    Login {
        #[arg(short, long)]
        username: String,

        #[arg(short, long)]
        password: String,
    },
    /// Forget the saved session
    Logout,
    /// Show the logged-in user
    Whoami,
    /// Inspect or change the cart
    Cart {
        #[command(subcommand)]
        action: CartAction,
    },
}

#[derive(Subcommand)]
enum CartAction {
    /// Show the reconciled cart
    Show,
    /// Add a product with quantity one
    Add { product_id: String },
    /// Set the quantity of a product (0 removes it)
    Set {
        product_id: String,
        #[arg(allow_negative_numbers = true)]
        qty: i64,
    },
    /// Remove a product
    Remove { product_id: String },
}

/// Errors that end the process with a failure exit code.
#[derive(Debug, Error)]
pub enum CliError {
    /// The storefront already told the user what went wrong.
    #[error(transparent)]
    Storefront(#[from] StorefrontError),

    /// A search settled in the failed state; the failure was already shown.
    #[error("Search failed")]
    SearchFailed,

    /// Search state channel closed before the search settled.
    #[error("Search ended before producing a result")]
    SearchAborted,

    /// Writing to the terminal failed.
    #[error("Failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

impl CliError {
    /// Whether the user has already been notified about this failure.
    const fn is_reported(&self) -> bool {
        matches!(self, Self::Storefront(_) | Self::SearchFailed)
    }
}

/// Initialize Sentry error tracking and return guard that must be kept alive.
fn init_sentry(config: &SentryConfig) -> Option<sentry::ClientInitGuard> {
    let dsn = config.dsn.as_ref()?;

    let guard = sentry::init((
        dsn.as_str(),
        sentry::ClientOptions {
            release: sentry::release_name!(),
            environment: config.environment.clone().map(std::borrow::Cow::Owned),
            attach_stacktrace: true,
            ..Default::default()
        },
    ));

    Some(guard)
}

/// Filter tracing events to Sentry event types.
fn sentry_event_filter(metadata: &tracing::Metadata<'_>) -> sentry_tracing::EventFilter {
    match *metadata.level() {
        tracing::Level::ERROR | tracing::Level::WARN => sentry_tracing::EventFilter::Event,
        tracing::Level::INFO | tracing::Level::DEBUG => sentry_tracing::EventFilter::Breadcrumb,
        _ => sentry_tracing::EventFilter::Ignore,
    }
}

fn init_tracing(with_sentry: bool) {
    // Defaults to info level for our crates if RUST_LOG is not set
    let env_filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| "qkart_cli=info,qkart_storefront=info".into());

    let sentry_layer =
        with_sentry.then(|| sentry_tracing::layer().event_filter(sentry_event_filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_target(false))
        .with(sentry_layer)
        .init();
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    // Configuration is needed before tracing so Sentry can be initialized first
    let config = ClientConfig::from_env();
    // Returning from main drops the guard, which flushes pending Sentry events
    let sentry_guard = config.as_ref().ok().and_then(|c| init_sentry(&c.sentry));
    init_tracing(sentry_guard.is_some());

    let config = match config {
        Ok(config) => config,
        Err(e) => {
            tracing::error!("{e}");
            return ExitCode::FAILURE;
        }
    };

    let storefront = match Storefront::from_config(config, Arc::new(TracingNotifier)) {
        Ok(storefront) => storefront,
        Err(e) => {
            tracing::error!("Failed to create backend client: {e}");
            return ExitCode::FAILURE;
        }
    };

    finish(run(cli, &storefront).await)
}

/// Log a failure the user has not seen yet and pick the exit code.
fn finish(result: Result<(), CliError>) -> ExitCode {
    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            if !e.is_reported() {
                tracing::error!("Command failed: {e}");
            }
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli, storefront: &Storefront) -> Result<(), CliError> {
    match cli.command {
        Commands::Products => commands::catalog::products(storefront).await,
        Commands::Search { queries } => commands::catalog::search(storefront, &queries).await,
        Commands::Register {
            username,
            password,
            confirm,
        } => commands::account::register(storefront, username, password, confirm).await,
        Commands::Login { username, password } => {
            commands::account::login(storefront, username, password).await
        }
        Commands::Logout => commands::account::logout(storefront),
        Commands::Whoami => commands::account::whoami(storefront),
        Commands::Cart { action } => match action {
            CartAction::Show => commands::cart::show(storefront).await,
            CartAction::Add { product_id } => commands::cart::add(storefront, &product_id).await,
            CartAction::Set { product_id, qty } => {
                commands::cart::set(storefront, &product_id, qty).await
            }
            CartAction::Remove { product_id } => {
                commands::cart::remove(storefront, &product_id).await
            }
        },
    }
}
