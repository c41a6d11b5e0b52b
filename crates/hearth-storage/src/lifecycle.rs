//! Interaction lifecycle: record, judge, expire.

use std::sync::Arc;

use hearth_core::{Feedback, Interaction};
use tracing::{debug, warn};

use crate::durable::DurableStore;
use crate::ephemeral::EphemeralStore;

/// Feedback failures that map to client errors at the API boundary.
#[derive(Debug, thiserror::Error)]
pub enum LifecycleError {
    #[error("Invalid feedback value: {0}")]
    InvalidFeedback(String),
    #[error("Interaction not found: {0}")]
    NotFound(String),
}

/// Coordinates the ephemeral window and the durable archive.
///
/// New interactions live in memory for 24 hours. A thumbs-up promotes the
/// record past the window and mirrors it durably; a thumbs-down archives a
/// negative-feedback record and discards the interaction. Durable writes
/// are best effort and never roll back the in-memory transition.
#[derive(Clone)]
pub struct InteractionLifecycle {
    ephemeral: EphemeralStore,
    durable: Arc<DurableStore>,
}

impl InteractionLifecycle {
    pub fn new(ephemeral: EphemeralStore, durable: Arc<DurableStore>) -> Self {
        Self { ephemeral, durable }
    }

    pub fn ephemeral(&self) -> &EphemeralStore {
        &self.ephemeral
    }

    pub fn durable(&self) -> &DurableStore {
        &self.durable
    }

    /// Log a freshly completed exchange into the expiring window.
    pub async fn record(&self, interaction: Interaction) {
        debug!(
            "Recording interaction {} for session {}",
            interaction.interaction_id, interaction.session_id
        );
        self.ephemeral.put(interaction).await;
    }

    pub async fn get(&self, session_id: &str, interaction_id: &str) -> Option<Interaction> {
        self.ephemeral.get(session_id, interaction_id).await
    }

    pub async fn list_session(&self, session_id: &str) -> Vec<Interaction> {
        self.ephemeral.list_session(session_id).await
    }

    /// Apply a raw feedback value to a stored interaction.
    ///
    /// The value is validated before any store is touched, so a rejected
    /// submission leaves the record exactly as it was.
    pub async fn apply_feedback(
        &self,
        session_id: &str,
        interaction_id: &str,
        raw: &str,
    ) -> Result<Feedback, LifecycleError> {
        let feedback =
            Feedback::parse(raw).ok_or_else(|| LifecycleError::InvalidFeedback(raw.to_string()))?;

        let mut interaction = self
            .ephemeral
            .get(session_id, interaction_id)
            .await
            .ok_or_else(|| LifecycleError::NotFound(interaction_id.to_string()))?;

        // Feedback is one-directional; a second submission changes nothing
        // and reports the state the record is already in.
        if let Some(existing) = interaction.feedback {
            debug!(
                "Interaction {} already judged {}",
                interaction_id,
                existing.as_str()
            );
            return Ok(existing);
        }

        match feedback {
            Feedback::ThumbsUp => {
                interaction.feedback = Some(Feedback::ThumbsUp);
                self.ephemeral.promote(interaction.clone()).await;
                self.ephemeral.mark_thumbs_up(interaction_id).await;
                if let Err(e) = self.durable.upsert_interaction(&interaction) {
                    warn!(
                        "Failed to mirror promoted interaction {}: {}",
                        interaction_id, e
                    );
                }
                debug!("Interaction {} promoted", interaction_id);
            }
            Feedback::ThumbsDown => {
                if let Err(e) = self
                    .durable
                    .record_negative_feedback(&interaction, "User gave thumbs down")
                {
                    warn!(
                        "Failed to archive negative feedback for {}: {}",
                        interaction_id, e
                    );
                }
                self.ephemeral.remove(session_id, interaction_id).await;
                self.ephemeral.mark_thumbs_down(interaction_id).await;
                debug!("Interaction {} removed after thumbs down", interaction_id);
            }
        }

        Ok(feedback)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;
    use hearth_core::RoutingKind;
    use tokio::time::Duration;

    fn lifecycle() -> InteractionLifecycle {
        InteractionLifecycle::new(
            EphemeralStore::new(),
            Arc::new(DurableStore::memory().unwrap()),
        )
    }

    fn interaction(interaction_id: &str) -> Interaction {
        Interaction {
            interaction_id: interaction_id.to_string(),
            session_id: "default".to_string(),
            timestamp: Utc::now(),
            user_message: "turn on the lights".to_string(),
            llm_prompt: None,
            llm_response: None,
            tools_used: vec!["ha_control_light".to_string()],
            tool_results: None,
            final_response: "Turned on 2 lights".to_string(),
            feedback: None,
            routing: RoutingKind::DirectShortcut,
        }
    }

    #[tokio::test]
    async fn test_invalid_feedback_rejected_before_mutation() {
        let lifecycle = lifecycle();
        lifecycle.record(interaction("abc123")).await;

        let err = lifecycle
            .apply_feedback("default", "abc123", "maybe")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::InvalidFeedback(_)));
        assert_eq!(err.to_string(), "Invalid feedback value: maybe");

        let untouched = lifecycle.get("default", "abc123").await.unwrap();
        assert!(untouched.feedback.is_none());
        assert!(lifecycle.durable().get_interaction("abc123").unwrap().is_none());
    }

    #[tokio::test]
    async fn test_feedback_for_missing_interaction() {
        let lifecycle = lifecycle();
        let err = lifecycle
            .apply_feedback("default", "nope", "thumbs_up")
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::NotFound(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn test_thumbs_up_promotes_past_the_window() {
        let lifecycle = lifecycle();
        lifecycle.record(interaction("abc123")).await;

        let applied = lifecycle
            .apply_feedback("default", "abc123", "thumbs_up")
            .await
            .unwrap();
        assert_eq!(applied, Feedback::ThumbsUp);

        tokio::time::advance(Duration::from_secs(48 * 60 * 60)).await;
        let kept = lifecycle.get("default", "abc123").await.unwrap();
        assert_eq!(kept.feedback, Some(Feedback::ThumbsUp));

        let mirrored = lifecycle.durable().get_interaction("abc123").unwrap().unwrap();
        assert_eq!(mirrored.feedback, Some(Feedback::ThumbsUp));
        assert_eq!(
            lifecycle.ephemeral().thumbs_up_ids().await,
            vec!["abc123".to_string()]
        );
    }

    #[tokio::test]
    async fn test_second_feedback_is_a_no_op() {
        let lifecycle = lifecycle();
        lifecycle.record(interaction("abc123")).await;

        lifecycle
            .apply_feedback("default", "abc123", "thumbs_up")
            .await
            .unwrap();
        let repeated = lifecycle
            .apply_feedback("default", "abc123", "thumbs_down")
            .await
            .unwrap();

        // The original judgement stands and nothing was archived.
        assert_eq!(repeated, Feedback::ThumbsUp);
        assert!(lifecycle.get("default", "abc123").await.is_some());
        assert!(lifecycle.durable().list_negative_feedback().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_thumbs_down_removes_and_archives() {
        let lifecycle = lifecycle();
        lifecycle.record(interaction("abc123")).await;

        let applied = lifecycle
            .apply_feedback("default", "abc123", "thumbs_down")
            .await
            .unwrap();
        assert_eq!(applied, Feedback::ThumbsDown);

        assert!(lifecycle.get("default", "abc123").await.is_none());
        assert_eq!(
            lifecycle.ephemeral().thumbs_down_ids().await,
            vec!["abc123".to_string()]
        );

        let archived = lifecycle.durable().list_negative_feedback().unwrap();
        assert_eq!(archived.len(), 1);
        assert_eq!(archived[0].interaction_id, "abc123");
        assert_eq!(archived[0].reason, "User gave thumbs down");
        assert_eq!(archived[0].user_message, "turn on the lights");
    }
}
