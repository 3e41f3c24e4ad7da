//! Alltagsgold storefront library.
//!
//! This crate provides the storefront API as a library, allowing it to be
//! tested in-process and reused by the CLI.

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod analytics;
pub mod config;
pub mod error;
pub mod images;
pub mod middleware;
pub mod product_cache;
pub mod revalidate;
pub mod routes;
pub mod shopify;
pub mod state;
