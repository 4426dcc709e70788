//! Green Mango Core - Shared types library.
//!
//! This crate provides common types used across the Green Mango client
//! components:
//! - `client` - Storefront client core (cart, catalog, orders, session)
//!
//! # Architecture
//!
//! The core crate contains only types - no I/O, no HTTP clients, no storage.
//! This keeps it lightweight and allows it to be used anywhere.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs, prices, statuses, and
//!   catalog paging parameters

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod types;

pub use types::*;
