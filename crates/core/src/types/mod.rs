//! Core types for Alltagsgold.
//!
//! This module provides type-safe wrappers for common domain concepts.

pub mod handle;
pub mod id;
pub mod price;

pub use handle::{Handle, HandleError};
pub use id::*;
pub use price::{CurrencyCode, Price, PriceError, RoundingAdjustment, round_to_swiss_francs};
