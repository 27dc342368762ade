use chrono::{DateTime, Utc};
use tracing::{debug, info, warn};

use crate::enforcement::{self, ChatActions, EnforcementOutcome};
use crate::policy::{evaluate, Decision, Thresholds};
use crate::scoring::Scorer;

/// What kind of chat a message arrived in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatKind {
    Private,
    Group,
    Supergroup,
    Channel,
}

impl ChatKind {
    /// Only multi-user chats are in moderation scope; one-on-one chats and
    /// channel posts are left alone.
    pub fn is_multi_user(self) -> bool {
        matches!(self, ChatKind::Group | ChatKind::Supergroup)
    }
}

/// A text message received from the chat platform. Built once per update,
/// consumed once by the pipeline, never persisted.
#[derive(Debug, Clone)]
pub struct InboundMessage {
    pub message_id: i32,
    pub chat_id: i64,
    pub chat_title: Option<String>,
    pub chat_kind: ChatKind,
    pub sender_id: u64,
    pub sender_username: Option<String>,
    pub sender_first_name: Option<String>,
    pub text: String,
    pub sent_at: DateTime<Utc>,
}

impl InboundMessage {
    /// Human-readable sender label for log lines: @username, then first
    /// name, then a generic placeholder.
    pub fn sender_label(&self) -> String {
        if let Some(username) = &self.sender_username {
            format!("@{}", username)
        } else if let Some(name) = &self.sender_first_name {
            name.clone()
        } else {
            "this user".to_string()
        }
    }
}

/// Terminal state of one message's trip through the pipeline. Reported for
/// logging and tests, never raised as an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessOutcome {
    /// Filtered out before scoring: no text, or not a multi-user chat.
    Skipped,
    /// Scored below every threshold; message untouched.
    Allowed,
    /// Scoring unavailable; message allowed through by policy.
    AllowedFailOpen,
    Enforced(EnforcementOutcome),
}

/// The moderation pipeline: filter, score, decide, enforce.
///
/// Holds no per-message state; the scorer and platform actions are shared,
/// read-only collaborators, so one pipeline instance serves every update.
pub struct Pipeline<S, A> {
    scorer: S,
    actions: A,
    thresholds: Thresholds,
}

impl<S: Scorer, A: ChatActions> Pipeline<S, A> {
    pub fn new(scorer: S, actions: A, thresholds: Thresholds) -> Self {
        Self {
            scorer,
            actions,
            thresholds,
        }
    }

    /// Run one message through moderation. Infallible by design: every
    /// failure mode ends in a logged outcome, never an error, so one bad
    /// message can never stall the update stream.
    pub async fn process(&self, message: &InboundMessage) -> ProcessOutcome {
        let text = message.text.trim();
        if text.is_empty() {
            debug!("Ignoring message without text in chat {}", message.chat_id);
            return ProcessOutcome::Skipped;
        }
        if !message.chat_kind.is_multi_user() {
            debug!(
                "Ignoring message in {:?} chat {}",
                message.chat_kind, message.chat_id
            );
            return ProcessOutcome::Skipped;
        }

        info!(
            "Message from {} in {:?} chat {}: {}",
            message.sender_id,
            message.chat_kind,
            message.chat_id,
            truncate(text, 80)
        );

        // Fail-open: a scoring outage must never block message flow, so any
        // scoring failure is an explicit Allow with a warning.
        let result = match self.scorer.score(text).await {
            Ok(result) => result,
            Err(failure) => {
                warn!("No usable response from scoring API: {}", failure);
                return ProcessOutcome::AllowedFailOpen;
            }
        };

        info!(
            "Analyzed '{}' | avg={:.2}, toxic={:.2}, obscene={:.2}",
            truncate(text, 30),
            result.average,
            result.toxicity,
            result.obscene
        );

        match evaluate(&result, &self.thresholds) {
            Decision::Allow => ProcessOutcome::Allowed,
            Decision::Delete => {
                let outcome = enforcement::enforce(&self.actions, message).await;
                ProcessOutcome::Enforced(outcome)
            }
        }
    }
}

/// Cut a log excerpt at a char boundary.
fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        text.to_string()
    } else {
        let cut: String = text.chars().take(max_chars).collect();
        format!("{}...", cut)
    }
}
