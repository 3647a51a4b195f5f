//! Chat message stream.
//!
//! Chat lives outside the game snapshot: it is an ordered, append-mostly log
//! (newest first, matching how the view renders it) whose only in-place
//! mutation is reaction toggling.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use geoclash_protocol::{ChatBroadcast, MessageReaction};

/// One chat line and its reactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChatMessageRecord {
    /// Server timestamp in string form; doubles as the reaction target id.
    pub id: String,
    pub sender: String,
    pub text: String,
    pub timestamp_ms: i64,
    /// emoji → users who reacted with it. A key with no users is removed.
    pub reactions: BTreeMap<String, Vec<String>>,
}

/// Ordered chat log, newest message first.
#[derive(Debug, Clone, Default)]
pub struct ChatLog {
    messages: Vec<ChatMessageRecord>,
}

impl ChatLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an inbound chat line. `now_ms` supplies the timestamp when the
    /// server did not include one.
    pub fn push_broadcast(&mut self, broadcast: &ChatBroadcast, now_ms: i64) {
        let timestamp_ms = broadcast
            .timestamp
            .map(|t| t.timestamp_millis())
            .unwrap_or(now_ms);
        self.messages.insert(
            0,
            ChatMessageRecord {
                id: timestamp_ms.to_string(),
                sender: broadcast.player_name.clone(),
                text: broadcast.message.clone(),
                timestamp_ms,
                reactions: BTreeMap::new(),
            },
        );
    }

    /// Toggle a reaction: add it if this user hasn't reacted with this emoji,
    /// remove it if they have. The emoji key disappears once nobody holds it.
    /// Unknown message ids are ignored.
    pub fn toggle_reaction(&mut self, reaction: &MessageReaction) {
        let Some(message) = self.messages.iter_mut().find(|m| m.id == reaction.message_id)
        else {
            return;
        };
        let users = message.reactions.entry(reaction.emoji.clone()).or_default();
        if let Some(pos) = users.iter().position(|u| u == &reaction.username) {
            users.remove(pos);
            if users.is_empty() {
                message.reactions.remove(&reaction.emoji);
            }
        } else {
            users.push(reaction.username.clone());
        }
    }

    /// All messages, newest first.
    pub fn messages(&self) -> &[ChatMessageRecord] {
        &self.messages
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
