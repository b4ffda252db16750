//! # Storefront
//!
//! Catalog and product-verification backend, usable both as a standalone
//! binary and as a library.
//!
//! Catalog reads go through a read-through cache in front of SQLite. Codes are
//! short, printable identifiers attached to physical items; scanning one
//! verifies it and counts the scan.
//!
//! ## Library Usage
//!
//! ```toml
//! [dependencies]
//! storefront = { version = "0.0.1", default-features = false }
//! ```
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use storefront::config::Config;
//! use storefront::server::{AppState, create_router};
//!
//! let config = Config::load(None)?;
//! let state = Arc::new(AppState::from_config(&config)?);
//! let router = create_router(state);
//! // Serve with axum...
//! ```
//!
//! ## Feature Flags
//!
//! - `cli` (default): Builds the `storefront` binary. Disable with `default-features = false`.

pub mod auth;
pub mod cache;
pub mod catalog;
pub mod codes;
pub mod config;
pub mod error;
pub mod server;
pub mod store;
pub mod types;
