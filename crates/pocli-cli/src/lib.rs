#![forbid(unsafe_code)]
#![deny(
    warnings,
    dead_code,
    unused,
    unused_imports,
    unused_must_use,
    unreachable_pub,
    clippy::all,
    clippy::pedantic,
    clippy::nursery,
    rustdoc::broken_intra_doc_links,
    rustdoc::bare_urls,
    missing_docs
)]
#![allow(clippy::redundant_pub_crate)]

//! Command-line client for the attestation policy management service.
//!
//! Layout:
//! - `cli.rs`: argument parsing, client wiring, and command dispatch
//! - `client.rs`: CLI error taxonomy and the shared application context
//! - `auth.rs`: authenticator variants and their construction
//! - `transport.rs`: endpoint and HTTP client construction for each TLS mode
//! - `management.rs`: the management service client
//! - `commands/`: command handlers grouped by concern
//! - `output.rs`: renderers and formatting helpers
//! - `main.rs`: thin entrypoint delegating to `run()`

pub(crate) mod auth;
pub(crate) mod cli;
pub(crate) mod client;
pub(crate) mod commands;
pub(crate) mod management;
pub(crate) mod output;
pub(crate) mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use cli::run;
