//! TTL cache of device states.
//!
//! Entries past their TTL are treated as absent, not stale-but-valid: a
//! read sweeps the expired slot and reports a miss. Slots are overwritten
//! atomically and independently, which is what lets the push subscription
//! share the cache with request handling without coordination.

use crate::client::HubClient;
use crate::entities::{Domain, EntityState, ServiceCall};
use crate::error::HubResult;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

/// Default time a cached device state stays valid.
pub const DEFAULT_STATE_TTL: Duration = Duration::from_secs(30);

#[derive(Debug, Clone)]
struct CacheSlot {
    state: EntityState,
    cached_at: Instant,
}

/// Cache occupancy snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CacheStats {
    pub total_entries: usize,
    pub fresh_entries: usize,
}

/// Shared TTL map of entity states. Cloning shares the underlying map.
#[derive(Clone)]
pub struct StateCache {
    slots: Arc<RwLock<HashMap<String, CacheSlot>>>,
    ttl: Duration,
}

impl StateCache {
    pub fn new() -> Self {
        Self::with_ttl(DEFAULT_STATE_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            slots: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    /// Look up a fresh entry. An expired slot is swept and reported as a
    /// miss.
    pub async fn get(&self, entity_id: &str) -> Option<EntityState> {
        let mut slots = self.slots.write().await;
        match slots.get(entity_id) {
            Some(slot) if slot.cached_at.elapsed() <= self.ttl => Some(slot.state.clone()),
            Some(_) => {
                slots.remove(entity_id);
                None
            }
            None => None,
        }
    }

    /// Insert or overwrite a slot, resetting its TTL.
    pub async fn put(&self, state: EntityState) {
        let mut slots = self.slots.write().await;
        slots.insert(
            state.entity_id.clone(),
            CacheSlot {
                state,
                cached_at: Instant::now(),
            },
        );
    }

    /// Drop one slot. Returns whether it was present.
    pub async fn invalidate(&self, entity_id: &str) -> bool {
        self.slots.write().await.remove(entity_id).is_some()
    }

    pub async fn clear(&self) {
        self.slots.write().await.clear();
    }

    pub async fn stats(&self) -> CacheStats {
        let slots = self.slots.read().await;
        let fresh = slots
            .values()
            .filter(|slot| slot.cached_at.elapsed() <= self.ttl)
            .count();
        CacheStats {
            total_entries: slots.len(),
            fresh_entries: fresh,
        }
    }
}

impl Default for StateCache {
    fn default() -> Self {
        Self::new()
    }
}

/// REST client and cache wired together. Reads are read-through; control
/// paths invalidate and then re-read live.
#[derive(Clone)]
pub struct HubService {
    client: Arc<HubClient>,
    cache: StateCache,
}

impl HubService {
    pub fn new(client: HubClient, cache: StateCache) -> Self {
        Self {
            client: Arc::new(client),
            cache,
        }
    }

    pub fn cache(&self) -> &StateCache {
        &self.cache
    }

    pub fn client(&self) -> &HubClient {
        &self.client
    }

    /// Cache-first read. A miss fetches live and populates the slot.
    pub async fn state(&self, entity_id: &str) -> HubResult<EntityState> {
        if let Some(state) = self.cache.get(entity_id).await {
            return Ok(state);
        }
        let state = self.client.get_state(entity_id).await?;
        self.cache.put(state.clone()).await;
        Ok(state)
    }

    /// Live read that bypasses the cache and repopulates it.
    pub async fn fresh_state(&self, entity_id: &str) -> HubResult<EntityState> {
        let state = self.client.get_state(entity_id).await?;
        self.cache.put(state.clone()).await;
        Ok(state)
    }

    pub async fn invalidate(&self, entity_id: &str) {
        self.cache.invalidate(entity_id).await;
    }

    /// Live domain listing. Never served from cache.
    pub async fn list_domain(&self, domain: Domain) -> HubResult<Vec<EntityState>> {
        self.client.get_states_by_domain(domain).await
    }

    pub async fn call_service(&self, call: ServiceCall) -> HubResult<Value> {
        self.client.call_service(call).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entity(entity_id: &str, state: &str) -> EntityState {
        serde_json::from_value(serde_json::json!({
            "entity_id": entity_id,
            "state": state,
        }))
        .unwrap()
    }

    #[tokio::test]
    async fn test_put_then_get() {
        let cache = StateCache::new();
        cache.put(entity("light.kitchen", "on")).await;

        let got = cache.get("light.kitchen").await.unwrap();
        assert_eq!(got.state, "on");
        assert!(cache.get("light.bedroom").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_expired_entry_is_absent() {
        let cache = StateCache::with_ttl(Duration::from_secs(30));
        cache.put(entity("light.kitchen", "on")).await;

        tokio::time::advance(Duration::from_secs(31)).await;
        assert!(cache.get("light.kitchen").await.is_none());

        // The sweep removed the slot entirely.
        let stats = cache.stats().await;
        assert_eq!(stats.total_entries, 0);
    }

    #[tokio::test(start_paused = true)]
    async fn test_overwrite_resets_ttl() {
        let cache = StateCache::with_ttl(Duration::from_secs(30));
        cache.put(entity("light.kitchen", "on")).await;

        tokio::time::advance(Duration::from_secs(20)).await;
        cache.put(entity("light.kitchen", "off")).await;

        tokio::time::advance(Duration::from_secs(20)).await;
        let got = cache.get("light.kitchen").await.unwrap();
        assert_eq!(got.state, "off");
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = StateCache::new();
        cache.put(entity("switch.fan", "off")).await;

        assert!(cache.invalidate("switch.fan").await);
        assert!(!cache.invalidate("switch.fan").await);
        assert!(cache.get("switch.fan").await.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_stats_counts_fresh_entries() {
        let cache = StateCache::with_ttl(Duration::from_secs(30));
        cache.put(entity("light.old", "on")).await;
        tokio::time::advance(Duration::from_secs(31)).await;
        cache.put(entity("light.new", "on")).await;

        let stats = cache.stats().await;
        assert_eq!(stats.total_entries, 2);
        assert_eq!(stats.fresh_entries, 1);
    }
}
