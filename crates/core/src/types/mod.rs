//! Core type definitions.
//!
//! Newtype wrappers that make illegal states unrepresentable:
//! typed IDs, validated emails, and minor-unit prices.

mod email;
mod id;
mod price;

pub use email::{Email, EmailError};
pub use id::*;
pub use price::{CurrencyCode, CurrencyCodeError, Price};
