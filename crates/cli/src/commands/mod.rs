//! Subcommand implementations.
//!
//! Every command reports failures through the storefront notifier and writes
//! its result to stdout.

pub mod account;
pub mod cart;
pub mod catalog;
