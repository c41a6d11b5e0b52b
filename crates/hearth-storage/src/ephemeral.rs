//! In-memory interaction store with per-record expiration.

use std::collections::{HashMap, HashSet};
use std::sync::Arc;

use hearth_core::Interaction;
use tokio::sync::RwLock;
use tokio::time::{Duration, Instant};

/// How long an unjudged interaction lives.
pub const INTERACTION_TTL: Duration = Duration::from_secs(24 * 60 * 60);

#[derive(Debug, Clone)]
struct Entry {
    interaction: Interaction,
    /// `None` once promoted; promoted records never expire.
    expires_at: Option<Instant>,
}

impl Entry {
    fn is_expired(&self) -> bool {
        match self.expires_at {
            Some(deadline) => Instant::now() >= deadline,
            None => false,
        }
    }
}

/// Volatile store for recent interactions.
///
/// Records expire 24 hours after creation unless promoted. Expiry is
/// enforced on access, the same way the state cache ages entries out;
/// expired records are never visible to callers.
#[derive(Clone)]
pub struct EphemeralStore {
    records: Arc<RwLock<HashMap<String, Entry>>>,
    /// Ids judged good. Never expires.
    thumbs_up: Arc<RwLock<HashSet<String>>>,
    /// Ids judged bad, kept for the standard window.
    thumbs_down: Arc<RwLock<HashMap<String, Instant>>>,
    ttl: Duration,
}

impl EphemeralStore {
    pub fn new() -> Self {
        Self::with_ttl(INTERACTION_TTL)
    }

    pub fn with_ttl(ttl: Duration) -> Self {
        Self {
            records: Arc::new(RwLock::new(HashMap::new())),
            thumbs_up: Arc::new(RwLock::new(HashSet::new())),
            thumbs_down: Arc::new(RwLock::new(HashMap::new())),
            ttl,
        }
    }

    fn key(session_id: &str, interaction_id: &str) -> String {
        format!("{}:{}", session_id, interaction_id)
    }

    /// Store a new interaction with the standard expiration.
    pub async fn put(&self, interaction: Interaction) {
        let key = Self::key(&interaction.session_id, &interaction.interaction_id);
        let entry = Entry {
            interaction,
            expires_at: Some(Instant::now() + self.ttl),
        };
        self.records.write().await.insert(key, entry);
    }

    /// Fetch one interaction. Expired records read as absent and are
    /// dropped on the way.
    pub async fn get(&self, session_id: &str, interaction_id: &str) -> Option<Interaction> {
        let key = Self::key(session_id, interaction_id);
        let mut records = self.records.write().await;
        match records.get(&key) {
            Some(entry) if entry.is_expired() => {
                records.remove(&key);
                None
            }
            Some(entry) => Some(entry.interaction.clone()),
            None => None,
        }
    }

    /// Replace a record and remove its expiration.
    pub async fn promote(&self, interaction: Interaction) {
        let key = Self::key(&interaction.session_id, &interaction.interaction_id);
        let entry = Entry {
            interaction,
            expires_at: None,
        };
        self.records.write().await.insert(key, entry);
    }

    pub async fn remove(&self, session_id: &str, interaction_id: &str) -> bool {
        self.records
            .write()
            .await
            .remove(&Self::key(session_id, interaction_id))
            .is_some()
    }

    /// All live interactions for one session, newest first.
    pub async fn list_session(&self, session_id: &str) -> Vec<Interaction> {
        let mut records = self.records.write().await;
        records.retain(|_, entry| !entry.is_expired());

        let mut out: Vec<Interaction> = records
            .values()
            .filter(|e| e.interaction.session_id == session_id)
            .map(|e| e.interaction.clone())
            .collect();
        out.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        out
    }

    /// Number of live records, expired ones swept on the way.
    pub async fn live_count(&self) -> usize {
        let mut records = self.records.write().await;
        records.retain(|_, entry| !entry.is_expired());
        records.len()
    }

    /// Record the id in the permanent thumbs-up set.
    pub async fn mark_thumbs_up(&self, interaction_id: &str) {
        self.thumbs_up
            .write()
            .await
            .insert(interaction_id.to_string());
    }

    /// Record the id in the expiring thumbs-down set.
    pub async fn mark_thumbs_down(&self, interaction_id: &str) {
        self.thumbs_down
            .write()
            .await
            .insert(interaction_id.to_string(), Instant::now() + self.ttl);
    }

    pub async fn thumbs_up_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = self.thumbs_up.read().await.iter().cloned().collect();
        ids.sort();
        ids
    }

    pub async fn thumbs_down_ids(&self) -> Vec<String> {
        let mut set = self.thumbs_down.write().await;
        let now = Instant::now();
        set.retain(|_, deadline| now < *deadline);

        let mut ids: Vec<String> = set.keys().cloned().collect();
        ids.sort();
        ids
    }
}

impl Default for EphemeralStore {
    fn default() -> Self {
        Self::new()
    }
}
