// Core of the ChatSphere chat mockup: conversation state, story playback and the
// collaborators the presenter talks to. Re-exported for the binary and the tests.
pub mod config;
pub mod contacts;
pub mod conversation;
pub mod identity;
pub mod mock;
pub mod models;
pub mod session;
pub mod story;
pub mod typing;

// Re-export main types for convenience
pub use config::{ChatConfig, StoryEndBehavior};
pub use conversation::{ConversationEvent, ConversationManager};
pub use models::*;
pub use session::ChatSession;
pub use story::{StoryPlayer, StoryViewer};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_creation_and_delivery_status() {
        let msg = Message::outgoing("msg123", "Hello, world!", "2:30 PM", DeliveryStatus::Sent);

        assert_eq!(msg.id, "msg123");
        assert_eq!(msg.text(), "Hello, world!");
        assert_eq!(msg.timestamp, "2:30 PM");
        assert!(msg.is_sent);
        assert_eq!(msg.status, Some(DeliveryStatus::Sent));
        assert!(msg.reactions.is_empty());
        assert!(!msg.is_edited);
        assert!(msg.reply_to.is_none());

        let incoming = Message::incoming("msg456", "Hi back", "2:31 PM");
        assert!(!incoming.is_sent);
        assert_eq!(incoming.status, None, "incoming messages carry no delivery status");
    }

    #[test]
    fn test_message_validation() {
        // Very long content is structurally fine
        let long_content = "A".repeat(10000);
        let long_message = Message::outgoing("msg789", &long_content, "2:30 PM", DeliveryStatus::Sent);
        assert_eq!(long_message.text().len(), 10000);

        let voice = Message {
            content: MessageContent::Voice {
                duration: Some("0:07".to_string()),
            },
            ..Message::outgoing("voice1", "", "2:30 PM", DeliveryStatus::Sent)
        };
        assert_eq!(voice.text(), "");
        assert_eq!(voice.voice_duration(), Some("0:07"));
    }

    #[test]
    fn test_contact_status() {
        let contacts = mock::contacts();

        let online: Vec<&str> = contacts
            .iter()
            .filter(|c| c.status == ContactStatus::Online)
            .map(|c| c.id.as_str())
            .collect();
        assert_eq!(online, vec!["1", "3", "5"]);

        match contacts[1].status {
            ContactStatus::Offline => (),
            _ => panic!("Expected Offline status"),
        }
    }
}
