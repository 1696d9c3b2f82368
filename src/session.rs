// Chat session facade used by the presenter
//
// Holds the contact list plus at most one open conversation and one story viewer.
// Opening a new conversation or story sequence tears the previous one down first,
// which cancels its timers.

use log::info;
use tokio::sync::mpsc;

use crate::config::ChatConfig;
use crate::contacts::ContactList;
use crate::conversation::{ConversationEvent, ConversationManager};
use crate::mock;
use crate::models::{Message, ReplySnapshot};
use crate::story::{StoryEvent, StoryViewer};
use crate::typing::TypingIndicator;

pub struct ChatSession {
    config: ChatConfig,
    contacts: ContactList,
    conversation: Option<ConversationManager>,
    typing: Option<TypingIndicator>,
    pending_reply: Option<ReplySnapshot>,
    stories: Option<StoryViewer>,
}

impl ChatSession {
    pub fn new(config: ChatConfig) -> Self {
        ChatSession {
            config,
            contacts: ContactList::new(mock::contacts()),
            conversation: None,
            typing: None,
            pending_reply: None,
            stories: None,
        }
    }

    pub fn config(&self) -> &ChatConfig {
        &self.config
    }

    pub fn contacts(&self) -> &ContactList {
        &self.contacts
    }

    /// Switch the active chat. The previous conversation is closed, not merged.
    pub fn open_conversation(&mut self, contact_id: &str) -> Option<mpsc::Receiver<ConversationEvent>> {
        let contact = self.contacts.get(contact_id)?.clone();
        self.close_conversation();

        let (manager, events) =
            ConversationManager::with_history(contact.clone(), mock::messages_for(&contact.id), &self.config);
        self.typing = Some(TypingIndicator::new(&contact.name));
        self.conversation = Some(manager);
        self.contacts.select(&contact.id);

        Some(events)
    }

    pub fn conversation(&self) -> Option<&ConversationManager> {
        self.conversation.as_ref()
    }

    pub fn close_conversation(&mut self) {
        if let Some(conversation) = self.conversation.take() {
            conversation.close();
            self.contacts.clear_selection();
        }
        self.typing = None;
        self.pending_reply = None;
    }

    /// Quote a message in the next send
    pub fn start_reply(&mut self, message_id: &str) -> Option<&ReplySnapshot> {
        let snapshot = self.conversation.as_ref()?.reply(message_id)?;
        self.pending_reply = Some(snapshot);
        self.pending_reply.as_ref()
    }

    pub fn cancel_reply(&mut self) {
        self.pending_reply = None;
    }

    pub fn pending_reply(&self) -> Option<&ReplySnapshot> {
        self.pending_reply.as_ref()
    }

    /// Send text in the open chat, attaching the pending reply if any.
    /// The reply stays pending when the text is rejected.
    pub fn send(&mut self, text: &str) -> Option<Message> {
        let conversation = self.conversation.as_ref()?;
        let message = conversation.compose(text, self.pending_reply.clone())?;
        self.after_send(&message);
        Some(message)
    }

    pub fn send_voice(&mut self, duration: Option<&str>) -> Option<Message> {
        let conversation = self.conversation.as_ref()?;
        let message = conversation.compose_voice(duration, self.pending_reply.clone())?;
        self.after_send(&message);
        Some(message)
    }

    fn after_send(&mut self, message: &Message) {
        self.pending_reply = None;
        if let Some(contact_id) = self.conversation.as_ref().map(|c| c.contact().id.clone()) {
            let preview = if message.is_voice_message() { "🎤 Voice message" } else { message.text() };
            self.contacts.set_last_message(&contact_id, preview, &message.timestamp);
        }
    }

    pub fn typing(&self) -> Option<&TypingIndicator> {
        self.typing.as_ref()
    }

    pub fn typing_mut(&mut self) -> Option<&mut TypingIndicator> {
        self.typing.as_mut()
    }

    /// Play `user_id`'s stories from `start`. A user without stories gets an inert viewer.
    pub fn open_stories(&mut self, user_id: &str, start: usize) -> mpsc::Receiver<StoryEvent> {
        self.close_stories();

        let stories = mock::stories_for(user_id);
        info!("Opening {} stories of user {}", stories.len(), user_id);
        let (viewer, events) = StoryViewer::open(stories, start, &self.config);
        self.stories = Some(viewer);
        events
    }

    pub fn stories(&self) -> Option<&StoryViewer> {
        self.stories.as_ref()
    }

    pub fn stories_mut(&mut self) -> Option<&mut StoryViewer> {
        self.stories.as_mut()
    }

    pub fn close_stories(&mut self) {
        if let Some(mut viewer) = self.stories.take() {
            viewer.close();
        }
    }

    /// Stop every timer owned by the session
    pub fn shutdown(&mut self) {
        self.close_stories();
        self.close_conversation();
        info!("Chat session shut down");
    }
}
