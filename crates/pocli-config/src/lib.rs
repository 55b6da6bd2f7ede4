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

//! Layered configuration for the policy management client.
//!
//! Layout: `model.rs` (typed configuration and the per-source layer),
//! `discover.rs` (config file search), `env.rs` (environment variable layer),
//! `loader.rs` (precedence merge producing the effective [`Configuration`]).

pub mod defaults;
pub mod discover;
pub mod env;
pub mod error;
pub mod loader;
pub mod model;

pub use discover::{ConfigFile, candidate_paths, discover_config_file};
pub use env::layer_from_env;
pub use error::{ConfigError, ConfigResult};
pub use loader::{ConfigSources, read_config_file, resolve};
pub use model::{AuthMethod, ConfigLayer, Configuration, Credentials, ParseAuthMethodError};
