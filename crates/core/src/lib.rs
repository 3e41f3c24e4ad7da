//! Alltagsgold Core - Shared types library.
//!
//! This crate provides common types used across all Alltagsgold components:
//! - `storefront` - Headless storefront API in front of Shopify
//! - `cli` - Command-line tools for catalog export and image URLs
//!
//! # Architecture
//!
//! The core crate contains only types and traits - no I/O, no HTTP clients.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for Shopify IDs, handles and CHF prices

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
