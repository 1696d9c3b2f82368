// Canned data the demo runs on. There is no backend; every session starts from this.

use crate::models::{Contact, ContactStatus, DeliveryStatus, Message, Story, StoryKind};

fn contact(
    id: &str,
    name: &str,
    phone: &str,
    last_message: &str,
    last_message_time: &str,
    unread_count: u32,
    last_seen: Option<&str>,
) -> Contact {
    Contact {
        id: id.to_string(),
        name: name.to_string(),
        phone: phone.to_string(),
        avatar: None,
        last_message: Some(last_message.to_string()),
        last_message_time: Some(last_message_time.to_string()),
        unread_count,
        status: if last_seen.is_some() {
            ContactStatus::Offline
        } else {
            ContactStatus::Online
        },
        last_seen: last_seen.map(|s| s.to_string()),
    }
}

pub fn contacts() -> Vec<Contact> {
    vec![
        contact("1", "Sarah Johnson", "+1 (555) 123-4567", "Hey! How's your day going?", "2:34 PM", 2, None),
        contact(
            "2",
            "Mike Chen",
            "+1 (555) 987-6543",
            "Thanks for the help earlier!",
            "1:15 PM",
            0,
            Some("Last seen 30 minutes ago"),
        ),
        contact("3", "Emily Davis", "+1 (555) 456-7890", "Can we meet tomorrow?", "12:45 PM", 1, None),
        contact(
            "4",
            "Alex Rodriguez",
            "+1 (555) 321-0987",
            "Perfect! See you then.",
            "11:30 AM",
            0,
            Some("Last seen 2 hours ago"),
        ),
        contact("5", "Jordan Smith", "+1 (555) 654-3210", "Check out this cool article!", "Yesterday", 0, None),
    ]
}

/// Conversation history shown when a chat is opened
pub fn messages_for(_contact_id: &str) -> Vec<Message> {
    vec![
        Message::incoming("1", "Hey! How's your day going?", "2:30 PM"),
        Message::outgoing(
            "2",
            "It's going great! Just finished a big project at work. How about you?",
            "2:32 PM",
            DeliveryStatus::Delivered,
        ),
        Message::incoming(
            "3",
            "That's awesome! I'm just catching up on some reading. What kind of project was it?",
            "2:33 PM",
        ),
        Message::outgoing(
            "4",
            "It was a new mobile app design for our client. Really exciting stuff! 🚀",
            "2:34 PM",
            DeliveryStatus::Delivered,
        ),
    ]
}

fn text_story(id: &str, owner: &Contact, content: &str, timestamp: &str, views: u32, color: &str) -> Story {
    Story {
        id: id.to_string(),
        user_id: owner.id.clone(),
        user_name: owner.name.clone(),
        content: content.to_string(),
        timestamp: timestamp.to_string(),
        views,
        kind: StoryKind::Text,
        background_color: Some(color.to_string()),
    }
}

/// Stories posted by `user_id`, oldest first. Unknown users have none.
pub fn stories_for(user_id: &str) -> Vec<Story> {
    let owner = match contacts().into_iter().find(|c| c.id == user_id) {
        Some(owner) => owner,
        None => return Vec::new(),
    };

    match user_id {
        "1" => vec![
            text_story("s1", &owner, "Beautiful sunset today! 🌅", "2h ago", 24, "#25D366"),
            Story {
                id: "s2".to_string(),
                user_id: owner.id.clone(),
                user_name: owner.name.clone(),
                content: "stories/beach.jpg".to_string(),
                timestamp: "1h ago".to_string(),
                views: 18,
                kind: StoryKind::Image,
                background_color: None,
            },
            text_story("s3", &owner, "Coffee time ☕", "30m ago", 9, "#128C7E"),
        ],
        "3" => vec![text_story("s4", &owner, "Working on something exciting!", "5h ago", 31, "#075E54")],
        _ => Vec::new(),
    }
}
