//! Automation hub integration.
//!
//! Talks to a Home-Assistant-compatible hub over its REST API and keeps a
//! TTL cache of device states fresh through a supervised WebSocket
//! subscription. The cache accepts last-writer-wins semantics: each slot is
//! overwritten atomically and no ordering is guaranteed across slots.

pub mod cache;
pub mod client;
pub mod entities;
pub mod error;
pub mod subscription;

pub use cache::{CacheStats, HubService, StateCache};
pub use client::HubClient;
pub use entities::{
    Domain, EntityAttributes, EntityState, HubConnectionConfig, ServiceCall,
};
pub use error::{HubError, HubResult};
pub use subscription::{SubscriptionHandle, SubscriptionState, spawn_subscription};
