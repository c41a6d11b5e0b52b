//! Durable archive backed by redb.
//!
//! Two tables: promoted interactions keyed by interaction id, and
//! negative-feedback records keyed by their own id. Values are
//! JSON-serialized bytes.

use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};
use hearth_core::Interaction;
use redb::{Database, ReadableTable, TableDefinition};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::{Result, StorageError};

const INTERACTIONS: TableDefinition<&str, &[u8]> = TableDefinition::new("interactions");
const NEGATIVE_FEEDBACK: TableDefinition<&str, &[u8]> = TableDefinition::new("negative_feedback");

/// A preserved record of an interaction the user judged bad.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NegativeFeedback {
    pub id: String,
    pub interaction_id: String,
    pub session_id: String,
    pub user_message: String,
    pub final_response: String,
    pub reason: String,
    pub recorded_at: DateTime<Utc>,
}

/// Embedded database holding records that must outlive the process.
pub struct DurableStore {
    db: Database,
    temp_path: Option<PathBuf>,
}

impl DurableStore {
    /// Open (or create) the database file at `path`.
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let db = if path.exists() {
            Database::open(path).map_err(|e| StorageError::Backend(e.to_string()))?
        } else {
            Database::create(path).map_err(|e| StorageError::Backend(e.to_string()))?
        };

        let store = Self {
            db,
            temp_path: None,
        };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Throwaway database in the system temp directory, removed on drop.
    pub fn memory() -> Result<Self> {
        let path = std::env::temp_dir().join(format!("hearth_{}.redb", Uuid::new_v4()));
        let db = Database::create(&path).map_err(|e| StorageError::Backend(e.to_string()))?;

        let store = Self {
            db,
            temp_path: Some(path),
        };
        store.ensure_tables()?;
        Ok(store)
    }

    /// Create both tables so later read transactions never miss them.
    fn ensure_tables(&self) -> Result<()> {
        let txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        {
            txn.open_table(INTERACTIONS)
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            txn.open_table(NEGATIVE_FEEDBACK)
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        txn.commit()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    /// Insert or replace an interaction, keyed by its id. The row carries
    /// the interaction plus the time this mirror write happened; the
    /// interaction's own timestamp stays the creation time.
    pub fn upsert_interaction(&self, interaction: &Interaction) -> Result<()> {
        let mut row = serde_json::to_value(interaction)?;
        row["updated_at"] = serde_json::to_value(Utc::now())?;
        let bytes = serde_json::to_vec(&row)?;

        let txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        {
            let mut table = txn
                .open_table(INTERACTIONS)
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            table
                .insert(interaction.interaction_id.as_str(), bytes.as_slice())
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        txn.commit()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(())
    }

    pub fn get_interaction(&self, interaction_id: &str) -> Result<Option<Interaction>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let table = txn
            .open_table(INTERACTIONS)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        match table
            .get(interaction_id)
            .map_err(|e| StorageError::Backend(e.to_string()))?
        {
            Some(raw) => {
                let interaction = serde_json::from_slice(raw.value())?;
                Ok(Some(interaction))
            }
            None => Ok(None),
        }
    }

    /// Preserve the essentials of a poorly-judged interaction before it
    /// is discarded. Returns the new record's id.
    pub fn record_negative_feedback(
        &self,
        interaction: &Interaction,
        reason: &str,
    ) -> Result<String> {
        let record = NegativeFeedback {
            id: Uuid::new_v4().to_string(),
            interaction_id: interaction.interaction_id.clone(),
            session_id: interaction.session_id.clone(),
            user_message: interaction.user_message.clone(),
            final_response: interaction.final_response.clone(),
            reason: reason.to_string(),
            recorded_at: Utc::now(),
        };
        let bytes = serde_json::to_vec(&record)?;

        let txn = self
            .db
            .begin_write()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        {
            let mut table = txn
                .open_table(NEGATIVE_FEEDBACK)
                .map_err(|e| StorageError::Backend(e.to_string()))?;
            table
                .insert(record.id.as_str(), bytes.as_slice())
                .map_err(|e| StorageError::Backend(e.to_string()))?;
        }
        txn.commit()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        Ok(record.id)
    }

    /// All negative-feedback records, oldest first.
    pub fn list_negative_feedback(&self) -> Result<Vec<NegativeFeedback>> {
        let txn = self
            .db
            .begin_read()
            .map_err(|e| StorageError::Backend(e.to_string()))?;
        let table = txn
            .open_table(NEGATIVE_FEEDBACK)
            .map_err(|e| StorageError::Backend(e.to_string()))?;

        let mut out = Vec::new();
        for row in table
            .iter()
            .map_err(|e| StorageError::Backend(e.to_string()))?
        {
            let (_, raw) = row.map_err(|e| StorageError::Backend(e.to_string()))?;
            let record: NegativeFeedback = serde_json::from_slice(raw.value())?;
            out.push(record);
        }
        out.sort_by_key(|r| r.recorded_at);
        Ok(out)
    }
}

impl Drop for DurableStore {
    fn drop(&mut self) {
        if let Some(path) = &self.temp_path {
            let _ = std::fs::remove_file(path);
        }
    }
}
