//! Jarsy Core - Shared types library.
//!
//! Common types used by the storefront service. The core crate contains
//! only types - no I/O, no HTTP clients - so it can be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, and emails

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
