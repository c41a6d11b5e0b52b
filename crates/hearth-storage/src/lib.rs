//! Interaction storage for Hearth.
//!
//! Two layers with different lifetimes: [`EphemeralStore`] holds recent
//! interactions in memory with a 24-hour expiration, and [`DurableStore`]
//! is an embedded redb archive for records that must survive restarts
//! (promoted interactions and negative-feedback captures).
//! [`InteractionLifecycle`] ties the two together and owns the feedback
//! transitions.

pub mod durable;
pub mod ephemeral;
pub mod error;
pub mod lifecycle;

pub use durable::{DurableStore, NegativeFeedback};
pub use ephemeral::{EphemeralStore, INTERACTION_TTL};
pub use error::{Result, StorageError};
pub use lifecycle::{InteractionLifecycle, LifecycleError};
