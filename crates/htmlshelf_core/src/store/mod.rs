//! Reactive state container with durable write-behind.
//!
//! # Responsibility
//! - Hold the authoritative in-memory [`AppState`](crate::model::app_state::AppState).
//! - Apply mutations synchronously, notify subscribers, then hand a full
//!   snapshot to a single background writer.
//! - Gate container creation behind a one-shot hydration.
//!
//! # Invariants
//! - A [`FilesStore`] only exists after hydration finished, so no user
//!   mutation can be overwritten by a late snapshot load.
//! - Durable writes happen in mutation order; intermediate snapshots may be
//!   skipped when newer ones are already queued.

mod container;
mod hydration;
mod persist;

pub use container::{FilesStore, SubscriptionId};
pub use hydration::{Hydration, HydrationPhase};
