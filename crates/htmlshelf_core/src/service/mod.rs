//! Policy services over repositories.
//!
//! # Responsibility
//! - Turn fallible repository calls into the non-fatal behavior the
//!   container and hydration rely on.

pub mod durable_store;
