//! Conversation read-state and reply threading
//!
//! Conversations are threads between one user and staff. Messages carry two
//! per-audience read flags; the flag for an audience is cleared in bulk when
//! that audience opens the thread, never per-message. Replies quote the
//! original through a frozen snippet copied at compose time.

use serde_json::json;
use uuid::Uuid;

use crate::error::Error;
use crate::models::{
    AdminConversationOverview, Conversation, ConversationSummary, Message, NewMessage,
};
use crate::Backend;

/// Maximum quoted characters carried into a reply snippet
pub const SNIPPET_CHARS: usize = 30;

/// Display name shown for staff senders without a configured one
pub const STAFF_FALLBACK_NAME: &str = "Staff";

/// Columns requested for a transcript, with the sender identity embedded
const TRANSCRIPT_COLUMNS: &str =
    "*, sender:profiles(id,first_name,last_name,role,admin_display_name)";

/// Which side of a conversation the caller is on.
///
/// Read flags are per-audience: opening a thread as one audience never
/// touches the other audience's flag.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Audience {
    User,
    Admin,
}

impl Audience {
    /// The read-flag column this audience clears by opening a thread
    pub fn read_flag_column(self) -> &'static str {
        match self {
            Audience::User => "is_read_by_user",
            Audience::Admin => "is_read_by_admin",
        }
    }
}

/// The message being quoted by a reply
#[derive(Debug, Clone)]
pub struct ReplyTarget {
    pub message_id: Uuid,
    pub sender_name: String,
    pub content: String,
}

/// Build the frozen snippet stored on a reply.
///
/// The quoted content is truncated to [`SNIPPET_CHARS`] characters (Unicode
/// scalar values, never a byte slice) and ends with an ellipsis. The stored
/// shape opens a quote that is never closed; rows already in the messages
/// table carry exactly this form, so readers must not expect a balanced
/// quote. The snippet is a denormalized copy: later edits to the quoted
/// message do not propagate to snippets already stored.
pub fn reply_snippet(sender_name: &str, content: &str) -> String {
    let truncated: String = content.chars().take(SNIPPET_CHARS).collect();
    format!("Replying to {}: \"{}...", sender_name, truncated)
}

/// How a message's sender should be displayed
pub fn sender_display_name(message: &Message) -> String {
    match &message.sender {
        Some(sender) if sender.role == crate::models::Role::Admin => sender
            .admin_display_name
            .clone()
            .unwrap_or_else(|| STAFF_FALLBACK_NAME.to_string()),
        Some(sender) => sender
            .first_name
            .clone()
            .unwrap_or_else(|| "User".to_string()),
        None => STAFF_FALLBACK_NAME.to_string(),
    }
}

/// Messaging operations for one signed-in actor
pub struct MessagingService<'a> {
    backend: &'a Backend,
    audience: Audience,
    actor_id: Uuid,
}

impl<'a> MessagingService<'a> {
    /// Create a service bound to the signed-in actor and their audience
    pub fn new(backend: &'a Backend, audience: Audience, actor_id: Uuid) -> Self {
        Self {
            backend,
            audience,
            actor_id,
        }
    }

    /// List the caller's conversations, most recent activity first.
    ///
    /// Ordering comes from the remote procedure itself; the client imposes
    /// no secondary sort, no pagination, and no caching; every render
    /// re-fetches.
    pub async fn list_my_conversations(&self) -> Result<Vec<ConversationSummary>, Error> {
        self.backend
            .rpc("get_my_conversations", json!({}))
            .execute::<Vec<ConversationSummary>>()
            .await
    }

    /// Admin-side overview of all conversations with unread-by-admin flags
    pub async fn list_admin_overview(&self) -> Result<Vec<AdminConversationOverview>, Error> {
        self.backend
            .rpc("get_admin_conversations_overview", json!({}))
            .execute::<Vec<AdminConversationOverview>>()
            .await
    }

    /// Whether any of the caller's conversations has unread messages
    /// (drives the nav badge)
    pub async fn has_unread(&self) -> Result<bool, Error> {
        match self.audience {
            Audience::User => Ok(self
                .list_my_conversations()
                .await?
                .iter()
                .any(|c| c.has_unread_user)),
            Audience::Admin => Ok(self
                .list_admin_overview()
                .await?
                .iter()
                .any(|c| c.has_unread_admin)),
        }
    }

    /// Open a conversation: clear the opener's read flag on every message in
    /// it, then fetch the full transcript ascending by creation time.
    ///
    /// The clear is one blanket update scoped to the conversation, so two
    /// tabs opening concurrently issue the same idempotent write. The other
    /// audience's flag is never touched.
    pub async fn open_conversation(&self, conversation_id: Uuid) -> Result<Vec<Message>, Error> {
        self.mark_read(conversation_id).await?;
        self.fetch_transcript(conversation_id).await
    }

    /// Bulk-clear the opener's unread state for a conversation
    pub async fn mark_read(&self, conversation_id: Uuid) -> Result<(), Error> {
        self.backend
            .from("messages")
            .update(json!({ self.audience.read_flag_column(): true }))
            .eq("conversation_id", conversation_id)
            .execute_no_return()
            .await
    }

    /// Fetch a conversation's transcript, oldest first, senders resolved
    pub async fn fetch_transcript(&self, conversation_id: Uuid) -> Result<Vec<Message>, Error> {
        self.backend
            .from("messages")
            .select(TRANSCRIPT_COLUMNS)
            .eq("conversation_id", conversation_id)
            .order("created_at", true)
            .execute::<Message>()
            .await
    }

    /// Compose a message, optionally as a reply carrying a frozen snippet of
    /// the quoted message.
    ///
    /// On failure the composed content stays with the caller; nothing is
    /// mutated locally, so the input can be retried manually.
    pub async fn send_message(
        &self,
        conversation_id: Uuid,
        content: &str,
        reply_to: Option<&ReplyTarget>,
    ) -> Result<(), Error> {
        let content = content.trim();
        if content.is_empty() {
            return Err(Error::validation("Message content is required"));
        }

        let payload = NewMessage {
            conversation_id,
            sender_id: self.actor_id,
            content: content.to_string(),
            parent_message_id: reply_to.map(|r| r.message_id),
            reply_snippet: reply_to.map(|r| reply_snippet(&r.sender_name, &r.content)),
        };

        self.backend
            .from("messages")
            .insert(payload)
            .execute_no_return()
            .await
    }

    /// Start a new conversation and return it for immediate opening
    pub async fn start_conversation(&self, topic: &str) -> Result<Conversation, Error> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(Error::validation("A topic is required"));
        }

        let created: Vec<Conversation> = self
            .backend
            .from("conversations")
            .insert(json!({ "user_id": self.actor_id, "topic": topic }))
            .execute()
            .await?;

        created
            .into_iter()
            .next()
            .ok_or_else(|| Error::general("Conversation insert returned no row"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Role, SenderProfile};
    use chrono::Utc;

    #[test]
    fn snippet_truncates_long_content_to_thirty_chars() {
        let content = "a".repeat(80);
        let snippet = reply_snippet("Rivka", &content);
        assert_eq!(
            snippet,
            format!("Replying to Rivka: \"{}...", "a".repeat(30))
        );
    }

    #[test]
    fn snippet_counts_characters_not_bytes() {
        // 40 multibyte characters must truncate to 30 characters, not panic
        // on a byte boundary.
        let content = "é".repeat(40);
        let snippet = reply_snippet("Chaim", &content);
        assert_eq!(
            snippet,
            format!("Replying to Chaim: \"{}...", "é".repeat(30))
        );
    }

    #[test]
    fn snippet_keeps_short_content_whole() {
        let snippet = reply_snippet("Dev", "hello");
        assert_eq!(snippet, "Replying to Dev: \"hello...");
    }

    fn message_with_sender(sender: Option<SenderProfile>) -> Message {
        Message {
            id: Uuid::new_v4(),
            conversation_id: Uuid::new_v4(),
            sender_id: Uuid::new_v4(),
            content: Some("hi".into()),
            parent_message_id: None,
            reply_snippet: None,
            is_read_by_user: false,
            is_read_by_admin: false,
            created_at: Utc::now(),
            sender,
        }
    }

    #[test]
    fn admin_sender_uses_display_name_with_staff_fallback() {
        let named = message_with_sender(Some(SenderProfile {
            id: Uuid::new_v4(),
            first_name: Some("Sarah".into()),
            last_name: None,
            role: Role::Admin,
            admin_display_name: Some("Sarah (Staff)".into()),
        }));
        assert_eq!(sender_display_name(&named), "Sarah (Staff)");

        let unnamed = message_with_sender(Some(SenderProfile {
            id: Uuid::new_v4(),
            first_name: Some("Sarah".into()),
            last_name: None,
            role: Role::Admin,
            admin_display_name: None,
        }));
        assert_eq!(sender_display_name(&unnamed), STAFF_FALLBACK_NAME);
    }

    #[test]
    fn user_sender_uses_first_name() {
        let msg = message_with_sender(Some(SenderProfile {
            id: Uuid::new_v4(),
            first_name: Some("Moshe".into()),
            last_name: None,
            role: Role::User,
            admin_display_name: None,
        }));
        assert_eq!(sender_display_name(&msg), "Moshe");
    }
}
