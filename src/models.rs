use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

use serde::{Deserialize, Serialize};

/// Label used as the reply sender when the quoted message is our own
pub const SELF_SENDER_LABEL: &str = "you";

/// Duration shown for voice notes that never recorded one
pub const DEFAULT_VOICE_DURATION: &str = "0:32";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Contact {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub avatar: Option<String>,
    pub last_message: Option<String>,
    pub last_message_time: Option<String>,
    pub unread_count: u32,
    pub status: ContactStatus,
    pub last_seen: Option<String>,
}

impl Contact {
    pub fn new(id: &str, name: &str, phone: &str) -> Self {
        Contact {
            id: id.to_string(),
            name: name.to_string(),
            phone: phone.to_string(),
            avatar: None,
            last_message: None,
            last_message_time: None,
            unread_count: 0,
            status: ContactStatus::Offline,
            last_seen: None,
        }
    }

    /// First letter of every word in the display name ("Sarah Johnson" -> "SJ")
    pub fn initials(&self) -> String {
        self.name
            .split_whitespace()
            .filter_map(|word| word.chars().next())
            .collect()
    }

    pub fn is_online(&self) -> bool {
        self.status == ContactStatus::Online
    }

    /// Text shown under the contact name in the chat header
    pub fn presence_label(&self) -> String {
        match (&self.status, &self.last_seen) {
            (ContactStatus::Online, _) => "Online".to_string(),
            (_, Some(last_seen)) => last_seen.clone(),
            (ContactStatus::Away, None) => "Away".to_string(),
            (ContactStatus::Offline, None) => "Offline".to_string(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ContactStatus {
    Online,
    Offline,
    Away,
}

/// Delivery progress of an outgoing message. Ordering follows the delivery chain,
/// so `Sent < Delivered < Read`.
#[derive(Debug, PartialEq, Eq, PartialOrd, Ord, Clone, Copy, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeliveryStatus {
    Sent = 1,      // Accepted locally
    Delivered = 2, // Acknowledged by the recipient's device
    Read = 3,      // Seen by the recipient
}

impl DeliveryStatus {
    /// Tick marks rendered next to the timestamp
    pub fn icon(&self) -> &'static str {
        match self {
            DeliveryStatus::Sent => "✓",
            DeliveryStatus::Delivered | DeliveryStatus::Read => "✓✓",
        }
    }
}

impl fmt::Display for DeliveryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DeliveryStatus::Sent => "sent",
            DeliveryStatus::Delivered => "delivered",
            DeliveryStatus::Read => "read",
        };
        f.write_str(name)
    }
}

/// Body of a message. Text and voice are mutually exclusive.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MessageContent {
    Text(String),
    Voice { duration: Option<String> },
}

/// Copy of the quoted message taken when the reply was started. Later edits to the
/// original are not reflected here.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplySnapshot {
    pub id: String,
    pub text: String,
    pub sender: String,
}

impl ReplySnapshot {
    pub fn capture(message: &Message, contact_name: &str) -> Self {
        let sender = if message.is_sent {
            SELF_SENDER_LABEL.to_string()
        } else {
            contact_name.to_string()
        };

        ReplySnapshot {
            id: message.id.clone(),
            text: message.text().to_string(),
            sender,
        }
    }
}

/// Emoji -> reactor ids. An emoji is only present while at least one reactor holds it.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reactions(BTreeMap<String, BTreeSet<String>>);

impl Reactions {
    pub fn new() -> Self {
        Reactions(BTreeMap::new())
    }

    /// Flip `reactor`'s membership for `emoji`. Returns true if the reactor now holds it.
    pub fn toggle(&mut self, emoji: &str, reactor: &str) -> bool {
        let reactors = self.0.entry(emoji.to_string()).or_default();

        if reactors.remove(reactor) {
            if reactors.is_empty() {
                self.0.remove(emoji);
            }
            false
        } else {
            reactors.insert(reactor.to_string());
            true
        }
    }

    pub fn count(&self, emoji: &str) -> usize {
        self.0.get(emoji).map(|reactors| reactors.len()).unwrap_or(0)
    }

    pub fn has_reacted(&self, emoji: &str, reactor: &str) -> bool {
        self.0
            .get(emoji)
            .map(|reactors| reactors.contains(reactor))
            .unwrap_or(false)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    /// (emoji, reactor count) pairs in emoji order
    pub fn summary(&self) -> Vec<(&str, usize)> {
        self.0
            .iter()
            .map(|(emoji, reactors)| (emoji.as_str(), reactors.len()))
            .collect()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: String,
    pub content: MessageContent,
    pub timestamp: String,
    pub is_sent: bool,
    pub status: Option<DeliveryStatus>,
    pub reactions: Reactions,
    pub is_edited: bool,
    pub reply_to: Option<ReplySnapshot>,
}

impl Message {
    /// Message from the remote contact
    pub fn incoming(id: &str, text: &str, timestamp: &str) -> Self {
        Message {
            id: id.to_string(),
            content: MessageContent::Text(text.to_string()),
            timestamp: timestamp.to_string(),
            is_sent: false,
            status: None,
            reactions: Reactions::new(),
            is_edited: false,
            reply_to: None,
        }
    }

    /// Message authored by the local user
    pub fn outgoing(id: &str, text: &str, timestamp: &str, status: DeliveryStatus) -> Self {
        Message {
            id: id.to_string(),
            content: MessageContent::Text(text.to_string()),
            timestamp: timestamp.to_string(),
            is_sent: true,
            status: Some(status),
            reactions: Reactions::new(),
            is_edited: false,
            reply_to: None,
        }
    }

    /// Text body, empty for voice messages
    pub fn text(&self) -> &str {
        match &self.content {
            MessageContent::Text(text) => text,
            MessageContent::Voice { .. } => "",
        }
    }

    pub fn is_voice_message(&self) -> bool {
        matches!(self.content, MessageContent::Voice { .. })
    }

    pub fn voice_duration(&self) -> Option<&str> {
        match &self.content {
            MessageContent::Voice { duration } => {
                Some(duration.as_deref().unwrap_or(DEFAULT_VOICE_DURATION))
            }
            MessageContent::Text(_) => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoryKind {
    Text,
    Image,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Story {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    /// Text body, or an image reference for image stories
    pub content: String,
    pub timestamp: String,
    pub views: u32,
    pub kind: StoryKind,
    pub background_color: Option<String>,
}

impl Story {
    pub fn background(&self) -> &str {
        self.background_color.as_deref().unwrap_or("#000")
    }
}
