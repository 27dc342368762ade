use async_trait::async_trait;
use tracing::{error, info, warn};

use crate::pipeline::InboundMessage;

/// Failure kinds for a single chat-platform action, classified by the
/// platform adapter so enforcement can branch with an exhaustive match
/// instead of inspecting raw transport errors.
#[derive(Debug, thiserror::Error)]
pub enum ActionError {
    /// The bot lacks the rights to perform this action in the chat.
    #[error("insufficient permissions")]
    PermissionDenied,
    /// The recipient cannot be reached with a direct message (blocked the
    /// bot, never started a conversation, or deactivated their account).
    #[error("recipient unreachable for direct messages")]
    RecipientBlocked,
    #[error("{0}")]
    Unexpected(String),
}

/// The two platform capabilities enforcement needs. Implemented against
/// Telegram in `bot.rs`; tests substitute recording fakes.
#[async_trait]
pub trait ChatActions: Send + Sync {
    async fn delete_message(&self, chat_id: i64, message_id: i32) -> Result<(), ActionError>;

    async fn send_direct_message(&self, user_id: u64, text: &str) -> Result<(), ActionError>;
}

/// Why an enforcement run fell short, for the outcome log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureReason {
    PermissionDenied,
    RecipientBlocked,
    Unexpected,
}

/// Net effect of one enforcement run. Transient, used only for logging and
/// assertions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EnforcementOutcome {
    pub deleted: bool,
    pub notified: bool,
    pub failure: Option<FailureReason>,
}

fn notification_text(message: &InboundMessage) -> String {
    let chat_label = message.chat_title.as_deref().unwrap_or("this group");
    format!(
        "Your recent message in {} was deleted because it contained toxic \
         or inappropriate language.\n\n\
         Please follow community guidelines to keep the chat positive.",
        chat_label
    )
}

/// Delete the message, then try to warn the sender privately.
///
/// Deletion always comes first; notification is attempted only after a
/// successful delete. An unreachable sender gets no notice at all — no
/// fallback message is posted into the chat, deliberately, so the chat never
/// sees any moderation trace.
pub async fn enforce<A: ChatActions + ?Sized>(
    actions: &A,
    message: &InboundMessage,
) -> EnforcementOutcome {
    match actions
        .delete_message(message.chat_id, message.message_id)
        .await
    {
        Ok(()) => {}
        Err(ActionError::PermissionDenied) => {
            error!(
                "Missing permissions in chat {}. \
                 Please grant 'Delete Messages' admin permission.",
                message.chat_id
            );
            return EnforcementOutcome {
                deleted: false,
                notified: false,
                failure: Some(FailureReason::PermissionDenied),
            };
        }
        Err(e) => {
            error!(
                "Error deleting message {} in chat {}: {}",
                message.message_id, message.chat_id, e
            );
            return EnforcementOutcome {
                deleted: false,
                notified: false,
                failure: Some(FailureReason::Unexpected),
            };
        }
    }

    info!(
        "Deleted message from {} in chat {}",
        message.sender_label(),
        message.chat_id
    );

    match actions
        .send_direct_message(message.sender_id, &notification_text(message))
        .await
    {
        Ok(()) => {
            info!("Sent private warning to {}", message.sender_id);
            EnforcementOutcome {
                deleted: true,
                notified: true,
                failure: None,
            }
        }
        Err(ActionError::RecipientBlocked) => {
            warn!(
                "Cannot DM user {}. They might have blocked the bot.",
                message.sender_id
            );
            EnforcementOutcome {
                deleted: true,
                notified: false,
                failure: Some(FailureReason::RecipientBlocked),
            }
        }
        Err(e) => {
            error!("Error notifying user {}: {}", message.sender_id, e);
            EnforcementOutcome {
                deleted: true,
                notified: false,
                failure: Some(FailureReason::Unexpected),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Mutex;

    use super::*;
    use crate::pipeline::{ChatKind, InboundMessage};

    /// Scripted platform that records every call it receives.
    struct FakeActions {
        delete_result: Mutex<Option<ActionError>>,
        notify_result: Mutex<Option<ActionError>>,
        delete_calls: AtomicUsize,
        notify_calls: AtomicUsize,
        last_notification: Mutex<Option<String>>,
    }

    impl FakeActions {
        fn new(delete_result: Option<ActionError>, notify_result: Option<ActionError>) -> Self {
            Self {
                delete_result: Mutex::new(delete_result),
                notify_result: Mutex::new(notify_result),
                delete_calls: AtomicUsize::new(0),
                notify_calls: AtomicUsize::new(0),
                last_notification: Mutex::new(None),
            }
        }
    }

    #[async_trait]
    impl ChatActions for FakeActions {
        async fn delete_message(&self, _chat_id: i64, _message_id: i32) -> Result<(), ActionError> {
            self.delete_calls.fetch_add(1, Ordering::SeqCst);
            match self.delete_result.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }

        async fn send_direct_message(&self, _user_id: u64, text: &str) -> Result<(), ActionError> {
            self.notify_calls.fetch_add(1, Ordering::SeqCst);
            *self.last_notification.lock().unwrap() = Some(text.to_string());
            match self.notify_result.lock().unwrap().take() {
                Some(err) => Err(err),
                None => Ok(()),
            }
        }
    }

    fn make_message(chat_title: Option<&str>) -> InboundMessage {
        InboundMessage {
            message_id: 42,
            chat_id: -100123,
            chat_title: chat_title.map(str::to_string),
            chat_kind: ChatKind::Supergroup,
            sender_id: 777,
            sender_username: Some("offender".to_string()),
            sender_first_name: Some("Off".to_string()),
            text: "some toxic text".to_string(),
            sent_at: chrono::Utc::now(),
        }
    }

    #[tokio::test]
    async fn delete_then_notify_succeeds() {
        let actions = FakeActions::new(None, None);
        let outcome = enforce(&actions, &make_message(Some("Rust Chat"))).await;

        assert_eq!(
            outcome,
            EnforcementOutcome {
                deleted: true,
                notified: true,
                failure: None,
            }
        );
        assert_eq!(actions.delete_calls.load(Ordering::SeqCst), 1);
        assert_eq!(actions.notify_calls.load(Ordering::SeqCst), 1);

        let text = actions.last_notification.lock().unwrap().clone().unwrap();
        assert!(text.contains("Rust Chat"));
    }

    #[tokio::test]
    async fn permission_denied_skips_notification() {
        let actions = FakeActions::new(Some(ActionError::PermissionDenied), None);
        let outcome = enforce(&actions, &make_message(Some("Rust Chat"))).await;

        assert_eq!(
            outcome,
            EnforcementOutcome {
                deleted: false,
                notified: false,
                failure: Some(FailureReason::PermissionDenied),
            }
        );
        assert_eq!(actions.notify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn unexpected_delete_failure_skips_notification() {
        let actions = FakeActions::new(Some(ActionError::Unexpected("boom".into())), None);
        let outcome = enforce(&actions, &make_message(None)).await;

        assert_eq!(
            outcome,
            EnforcementOutcome {
                deleted: false,
                notified: false,
                failure: Some(FailureReason::Unexpected),
            }
        );
        assert_eq!(actions.notify_calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn blocked_recipient_is_accepted_without_fallback() {
        let actions = FakeActions::new(None, Some(ActionError::RecipientBlocked));
        let outcome = enforce(&actions, &make_message(Some("Rust Chat"))).await;

        assert_eq!(
            outcome,
            EnforcementOutcome {
                deleted: true,
                notified: false,
                failure: Some(FailureReason::RecipientBlocked),
            }
        );
        // Exactly one DM attempt, and nothing else sent anywhere.
        assert_eq!(actions.notify_calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn unexpected_notify_failure_keeps_deletion() {
        let actions = FakeActions::new(None, Some(ActionError::Unexpected("boom".into())));
        let outcome = enforce(&actions, &make_message(None)).await;

        assert_eq!(
            outcome,
            EnforcementOutcome {
                deleted: true,
                notified: false,
                failure: Some(FailureReason::Unexpected),
            }
        );
    }

    #[tokio::test]
    async fn notification_falls_back_to_generic_chat_label() {
        let actions = FakeActions::new(None, None);
        enforce(&actions, &make_message(None)).await;

        let text = actions.last_notification.lock().unwrap().clone().unwrap();
        assert!(text.contains("this group"));
    }
}
