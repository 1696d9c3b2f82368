// Conversation state for the active contact
// Owns the ordered message list and applies compose/status/react/edit/reply

use log::{debug, info, warn};
use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use uuid::Uuid;

use crate::config::ChatConfig;
use crate::models::{Contact, DeliveryStatus, Message, MessageContent, Reactions, ReplySnapshot};

pub mod delivery;

/// Change notifications for the presenter
#[derive(Debug, Clone, PartialEq)]
pub enum ConversationEvent {
    /// A new message was appended to the end of the conversation
    Appended(Message),
    /// An existing message changed in place (status, reactions or text)
    Updated(Message),
}

/// Everything guarded by the conversation lock. Delivery timers take the same lock,
/// so they observe `closed` and never race with user mutations.
pub(crate) struct ConversationState {
    messages: Vec<Message>,
    pending: HashMap<String, JoinHandle<()>>,
    closed: bool,
    events: mpsc::Sender<ConversationEvent>,
}

impl ConversationState {
    fn find_mut(&mut self, message_id: &str) -> Option<&mut Message> {
        self.messages.iter_mut().find(|m| m.id == message_id)
    }

    fn emit(&self, event: ConversationEvent) {
        // Never block the caller; a slow presenter just misses a redraw hint
        if let Err(e) = self.events.try_send(event) {
            debug!("Conversation event not delivered to presenter: {}", e);
        }
    }

    /// Monotone status update. Returns the updated message if the status moved forward.
    pub(crate) fn advance_status(&mut self, message_id: &str, new_status: DeliveryStatus) -> Option<Message> {
        let message = match self.find_mut(message_id) {
            Some(message) => message,
            None => {
                debug!("Status update for unknown message ID: {}", message_id);
                return None;
            }
        };

        if !message.is_sent {
            debug!("Ignoring status update for incoming message {}", message_id);
            return None;
        }

        match message.status {
            Some(current) if current >= new_status => None,
            previous => {
                debug!("Updating message {} status from {:?} to {:?}", message_id, previous, new_status);
                message.status = Some(new_status);
                let updated = message.clone();
                self.emit(ConversationEvent::Updated(updated.clone()));
                Some(updated)
            }
        }
    }
}

pub(crate) fn lock_state(state: &Mutex<ConversationState>) -> MutexGuard<'_, ConversationState> {
    state.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

/// Display timestamp in the chat bubble format ("2:30 PM")
pub fn display_time() -> String {
    chrono::Local::now().format("%-I:%M %p").to_string()
}

pub struct ConversationManager {
    contact: Contact,
    state: Arc<Mutex<ConversationState>>,
    delivery_delay: Duration,
}

impl ConversationManager {
    pub fn new(contact: Contact, config: &ChatConfig) -> (Self, mpsc::Receiver<ConversationEvent>) {
        Self::with_history(contact, Vec::new(), config)
    }

    /// Open a conversation that already has messages (oldest first)
    pub fn with_history(
        contact: Contact,
        history: Vec<Message>,
        config: &ChatConfig,
    ) -> (Self, mpsc::Receiver<ConversationEvent>) {
        let (events, event_rx) = mpsc::channel(config.event_buffer.max(1));
        info!("Opening conversation with {} ({} messages)", contact.name, history.len());

        let state = ConversationState {
            messages: history,
            pending: HashMap::new(),
            closed: false,
            events,
        };

        (
            Self {
                contact,
                state: Arc::new(Mutex::new(state)),
                delivery_delay: config.delivery_delay(),
            },
            event_rx,
        )
    }

    pub fn contact(&self) -> &Contact {
        &self.contact
    }

    /// Snapshot of the conversation, oldest first
    pub fn messages(&self) -> Vec<Message> {
        lock_state(&self.state).messages.clone()
    }

    pub fn get(&self, message_id: &str) -> Option<Message> {
        lock_state(&self.state)
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .cloned()
    }

    pub fn len(&self) -> usize {
        lock_state(&self.state).messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of delivery timers that have not fired yet
    pub fn pending_deliveries(&self) -> usize {
        lock_state(&self.state).pending.len()
    }

    pub fn is_closed(&self) -> bool {
        lock_state(&self.state).closed
    }

    /// Append an outgoing text message. Blank text is rejected.
    pub fn compose(&self, text: &str, reply_to: Option<ReplySnapshot>) -> Option<Message> {
        if text.trim().is_empty() {
            debug!("Rejecting empty message for {}", self.contact.id);
            return None;
        }
        self.append_outgoing(MessageContent::Text(text.to_string()), reply_to)
    }

    /// Append an outgoing voice note. Voice notes carry no text.
    pub fn compose_voice(&self, duration: Option<&str>, reply_to: Option<ReplySnapshot>) -> Option<Message> {
        let content = MessageContent::Voice {
            duration: duration.map(|d| d.to_string()),
        };
        self.append_outgoing(content, reply_to)
    }

    fn append_outgoing(&self, content: MessageContent, reply_to: Option<ReplySnapshot>) -> Option<Message> {
        let message = Message {
            id: Uuid::new_v4().to_string(),
            content,
            timestamp: display_time(),
            is_sent: true,
            status: Some(DeliveryStatus::Sent),
            reactions: Reactions::new(),
            is_edited: false,
            reply_to,
        };

        let mut state = lock_state(&self.state);
        if state.closed {
            warn!("Dropping message composed after conversation with {} was closed", self.contact.id);
            return None;
        }

        info!("Composed message {} to {}", message.id, self.contact.id);
        state.messages.push(message.clone());
        state.emit(ConversationEvent::Appended(message.clone()));
        delivery::schedule_delivery(&self.state, &mut state, &message.id, self.delivery_delay);

        Some(message)
    }

    /// Move a sent message forward in the delivery chain. Never moves backwards.
    pub fn advance_status(&self, message_id: &str, new_status: DeliveryStatus) -> bool {
        let mut state = lock_state(&self.state);
        if state.closed {
            return false;
        }
        state.advance_status(message_id, new_status).is_some()
    }

    /// The contact opened the chat: everything we sent is now read
    pub fn mark_all_read(&self) -> usize {
        let mut state = lock_state(&self.state);
        if state.closed {
            return 0;
        }

        let sent_ids: Vec<String> = state
            .messages
            .iter()
            .filter(|m| m.is_sent)
            .map(|m| m.id.clone())
            .collect();

        sent_ids
            .iter()
            .filter(|id| state.advance_status(id, DeliveryStatus::Read).is_some())
            .count()
    }

    /// Toggle `reactor`'s `emoji` on a message. Returns false for unknown messages.
    pub fn react(&self, message_id: &str, emoji: &str, reactor: &str) -> bool {
        let mut state = lock_state(&self.state);
        if state.closed {
            return false;
        }

        let updated = match state.find_mut(message_id) {
            Some(message) => {
                let added = message.reactions.toggle(emoji, reactor);
                debug!(
                    "{} {} {} on message {}",
                    reactor,
                    if added { "added" } else { "removed" },
                    emoji,
                    message_id
                );
                message.clone()
            }
            None => {
                debug!("Reaction for unknown message ID: {}", message_id);
                return false;
            }
        };

        state.emit(ConversationEvent::Updated(updated));
        true
    }

    /// Replace the text of one of our own messages
    pub fn edit_text(&self, message_id: &str, new_text: &str) -> bool {
        let mut state = lock_state(&self.state);
        if state.closed {
            return false;
        }

        let updated = match state.find_mut(message_id) {
            Some(message) if message.is_sent => match &mut message.content {
                MessageContent::Text(text) if !new_text.trim().is_empty() && text.as_str() != new_text => {
                    *text = new_text.to_string();
                    message.is_edited = true;
                    message.clone()
                }
                _ => {
                    debug!("Edit of message {} rejected: empty, unchanged or voice", message_id);
                    return false;
                }
            },
            Some(_) => {
                debug!("Edit of message {} rejected: not authored locally", message_id);
                return false;
            }
            None => {
                debug!("Edit for unknown message ID: {}", message_id);
                return false;
            }
        };

        info!("Edited message {}", message_id);
        state.emit(ConversationEvent::Updated(updated));
        true
    }

    /// Snapshot a message for quoting in the next compose
    pub fn reply(&self, message_id: &str) -> Option<ReplySnapshot> {
        let state = lock_state(&self.state);
        state
            .messages
            .iter()
            .find(|m| m.id == message_id)
            .map(|m| ReplySnapshot::capture(m, &self.contact.name))
    }

    /// Tear down: cancel every pending delivery timer and refuse further mutations
    pub fn close(&self) {
        let mut state = lock_state(&self.state);
        if state.closed {
            return;
        }
        state.closed = true;
        let cancelled = delivery::cancel_all(&mut state);
        info!(
            "Closed conversation with {} ({} pending deliveries cancelled)",
            self.contact.id, cancelled
        );
    }
}

impl Drop for ConversationManager {
    fn drop(&mut self) {
        self.close();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_contact() -> Contact {
        Contact::new("1", "Sarah Johnson", "+1 (555) 123-4567")
    }

    fn history() -> Vec<Message> {
        vec![
            Message::incoming("1", "Hey! How's your day going?", "2:30 PM"),
            Message::outgoing("2", "Great, thanks!", "2:32 PM", DeliveryStatus::Delivered),
        ]
    }

    // No runtime here: compose still appends, delivery simply isn't scheduled
    #[test]
    fn test_compose_rejects_blank_text() {
        let (manager, _rx) = ConversationManager::new(test_contact(), &ChatConfig::default());

        assert!(manager.compose("", None).is_none());
        assert!(manager.compose("   \n\t", None).is_none());
        assert!(manager.is_empty());
    }

    #[test]
    fn test_compose_without_runtime_appends_sent_message() {
        let (manager, mut rx) = ConversationManager::new(test_contact(), &ChatConfig::default());

        let message = manager.compose("hi", None).expect("message should be composed");
        assert!(message.is_sent);
        assert_eq!(message.status, Some(DeliveryStatus::Sent));
        assert_eq!(manager.pending_deliveries(), 0);
        assert_eq!(rx.try_recv().ok(), Some(ConversationEvent::Appended(message)));
    }

    #[test]
    fn test_advance_status_never_regresses() {
        let (manager, _rx) = ConversationManager::with_history(test_contact(), history(), &ChatConfig::default());

        assert!(manager.advance_status("2", DeliveryStatus::Read));
        assert!(!manager.advance_status("2", DeliveryStatus::Delivered));
        assert!(!manager.advance_status("2", DeliveryStatus::Read));
        assert_eq!(manager.get("2").and_then(|m| m.status), Some(DeliveryStatus::Read));
    }

    #[test]
    fn test_advance_status_ignores_incoming_and_unknown() {
        let (manager, _rx) = ConversationManager::with_history(test_contact(), history(), &ChatConfig::default());

        assert!(!manager.advance_status("1", DeliveryStatus::Read));
        assert_eq!(manager.get("1").and_then(|m| m.status), None);
        assert!(!manager.advance_status("missing", DeliveryStatus::Read));
    }

    #[test]
    fn test_edit_rules() {
        let (manager, _rx) = ConversationManager::with_history(test_contact(), history(), &ChatConfig::default());

        // Remote message
        assert!(!manager.edit_text("1", "changed"));
        let remote = manager.get("1").expect("message 1");
        assert_eq!(remote.text(), "Hey! How's your day going?");
        assert!(!remote.is_edited);

        // Empty and unchanged
        assert!(!manager.edit_text("2", ""));
        assert!(!manager.edit_text("2", "   "));
        assert!(!manager.edit_text("2", "Great, thanks!"));
        assert!(!manager.get("2").expect("message 2").is_edited);

        assert!(manager.edit_text("2", "Great, thank you!"));
        let edited = manager.get("2").expect("message 2");
        assert_eq!(edited.text(), "Great, thank you!");
        assert!(edited.is_edited);
    }

    #[test]
    fn test_reply_snapshot_does_not_follow_edits() {
        let (manager, _rx) = ConversationManager::with_history(test_contact(), history(), &ChatConfig::default());

        let snapshot = manager.reply("2").expect("message 2 exists");
        assert_eq!(snapshot.sender, "you");
        manager.edit_text("2", "Rewritten");
        assert_eq!(snapshot.text, "Great, thanks!");

        let remote = manager.reply("1").expect("message 1 exists");
        assert_eq!(remote.sender, "Sarah Johnson");
        assert!(manager.reply("missing").is_none());
    }

    #[test]
    fn test_mutations_after_close_are_ignored() {
        let (manager, _rx) = ConversationManager::with_history(test_contact(), history(), &ChatConfig::default());
        manager.close();

        assert!(manager.is_closed());
        assert!(manager.compose("late", None).is_none());
        assert!(!manager.react("1", "👍", "me"));
        assert!(!manager.edit_text("2", "late edit"));
        assert_eq!(manager.mark_all_read(), 0);
        assert_eq!(manager.len(), 2);
    }
}
