//! Fernwood Core - Shared types and the cart state machine.
//!
//! This crate provides the types shared across Fernwood components:
//! - `storefront` - Public-facing JSON API for the shop client
//! - `integration-tests` - End-to-end cart flow tests
//!
//! # Architecture
//!
//! The core crate contains only types and pure logic - no I/O, no HTTP
//! clients, no sessions. The cart state machine lives here so its
//! transitions can be tested without a web framework in the loop.
//!
//! # Modules
//!
//! - [`types`] - Newtype wrappers for type-safe IDs and prices
//! - [`cart`] - The cart entity, its command type, and the transition
//!   function

#![cfg_attr(not(test), forbid(unsafe_code))]

pub mod cart;
pub mod types;

pub use cart::{Cart, CartCommand, CartLine, ProductSnapshot, VariantSelection};
pub use types::*;
