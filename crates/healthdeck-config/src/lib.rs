#![forbid(unsafe_code)]
#![warn(
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

//! Configuration for the health dashboard.
//!
//! Layout: `defaults.rs` (documented defaults and env names), `model.rs`
//! (`DashboardConfig` and the YAML file shape), `loader.rs` (layered loading),
//! `validate.rs` (validation/parsing helpers), `error.rs` (`ConfigError`).

pub mod defaults;
pub mod error;
pub mod loader;
pub mod model;
pub mod validate;

pub use error::{ConfigError, ConfigResult};
pub use loader::{load, load_with_env};
pub use model::{ConfigFile, DashboardConfig};
pub use validate::{parse_api_url, parse_model_list};
