//! Corpus event bus.
//!
//! Building blocks for the store-wide event system:
//!
//! - [`EventBus`]: in-process publish/subscribe hub backed by
//!   `tokio::sync::broadcast`.
//! - [`StoreEvent`]: the canonical domain event envelope.
//! - [`names`]: the dot-separated event names the store emits.

pub mod bus;
pub mod names;

pub use bus::{EventBus, StoreEvent};
