// Console rendering and command parsing for the ChatSphere front end
//
// Everything here turns core state into printable text; no state lives in this module.

use rand::Rng;
use textwrap::wrap;

use chatsphere::models::{Contact, DeliveryStatus, Message, ReplySnapshot, StoryKind};
use chatsphere::story::StoryFrame;
use chatsphere::typing::TypingIndicator;

/// Width of a message bubble's text column
const BUBBLE_WIDTH: usize = 48;
/// Total width of the chat pane; sent bubbles are pushed to the right edge
const PANE_WIDTH: usize = 72;
const WAVEFORM_BARS: usize = 20;
const SEGMENT_WIDTH: usize = 10;

/// A line of user input, parsed
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Contacts(String),
    Open(String),
    Reply(String),
    CancelReply,
    React { message: String, emoji: String },
    Edit { message: String, text: String },
    Voice(Option<String>),
    MarkRead,
    Typing,
    Stories { user: String, start: usize },
    NextStory,
    PreviousStory,
    LikeStory,
    ReplyStory(String),
    CloseStory,
    Quit,
    Send(String),
    Invalid(String),
}

impl Command {
    pub fn parse(line: &str) -> Command {
        let trimmed = line.trim();
        if !trimmed.starts_with('/') {
            return Command::Send(line.to_string());
        }

        let (name, rest) = match trimmed.split_once(char::is_whitespace) {
            Some((name, rest)) => (name, rest.trim()),
            None => (trimmed, ""),
        };
        let mut args = rest.split_whitespace();

        match name {
            "/help" => Command::Help,
            "/contacts" => Command::Contacts(rest.to_string()),
            "/open" if !rest.is_empty() => Command::Open(rest.to_string()),
            "/reply" if !rest.is_empty() => Command::Reply(rest.to_string()),
            "/cancel" => Command::CancelReply,
            "/react" => match (args.next(), args.next()) {
                (Some(message), Some(emoji)) => Command::React {
                    message: message.to_string(),
                    emoji: emoji.to_string(),
                },
                _ => Command::Invalid("usage: /react <message> <emoji>".to_string()),
            },
            "/edit" => match rest.split_once(char::is_whitespace) {
                Some((message, text)) => Command::Edit {
                    message: message.to_string(),
                    text: text.trim().to_string(),
                },
                None => Command::Invalid("usage: /edit <message> <new text>".to_string()),
            },
            "/voice" => Command::Voice(args.next().map(|d| d.to_string())),
            "/read" => Command::MarkRead,
            "/typing" => Command::Typing,
            "/stories" => match args.next() {
                Some(user) => Command::Stories {
                    user: user.to_string(),
                    start: args.next().and_then(|s| s.parse().ok()).unwrap_or(0),
                },
                None => Command::Invalid("usage: /stories <user> [start]".to_string()),
            },
            "/next" => Command::NextStory,
            "/prev" => Command::PreviousStory,
            "/like" => Command::LikeStory,
            "/story-reply" => Command::ReplyStory(rest.to_string()),
            "/close" => Command::CloseStory,
            "/quit" | "/exit" => Command::Quit,
            other => Command::Invalid(format!("unknown or incomplete command: {}", other)),
        }
    }
}

pub fn help_text() -> String {
    [
        "Commands:",
        "  <text>                     send a message",
        "  /contacts [query]          list or search contacts",
        "  /open <contact>            open a chat",
        "  /reply <#n|id>             quote a message in the next send (/cancel to drop it)",
        "  /react <#n|id> <emoji>     toggle a reaction",
        "  /edit <#n|id> <text>       edit one of your messages",
        "  /voice [m:ss]              send a voice note",
        "  /read                      pretend the contact read everything",
        "  /typing                    toggle the contact's typing indicator",
        "  /stories <user> [start]    play a user's stories (/next /prev /like /story-reply /close)",
        "  /quit                      leave",
    ]
    .join("\n")
}

pub fn render_contacts(contacts: &[&Contact], selected: Option<&str>) -> String {
    if contacts.is_empty() {
        return "  No contacts found".to_string();
    }

    contacts
        .iter()
        .map(|contact| {
            let marker = if selected == Some(contact.id.as_str()) { ">" } else { " " };
            let online = if contact.is_online() { "●" } else { " " };
            let unread = if contact.unread_count > 0 {
                format!(" ({})", contact.unread_count)
            } else {
                String::new()
            };
            let preview = contact
                .last_message
                .clone()
                .or_else(|| contact.last_seen.clone())
                .unwrap_or_else(|| "No messages yet".to_string());

            format!(
                "{} [{}] {} {} {:<20} {:>10}{}\n        {}",
                marker,
                contact.id,
                contact.initials(),
                online,
                contact.name,
                contact.last_message_time.as_deref().unwrap_or(""),
                unread,
                preview
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_header(contact: &Contact) -> String {
    let title = format!("{} {}  ·  {}", contact.initials(), contact.name, contact.presence_label());
    format!("{}\n{}", title, "─".repeat(PANE_WIDTH))
}

fn voice_waveform() -> String {
    const LEVELS: [char; 8] = ['▁', '▂', '▃', '▄', '▅', '▆', '▇', '█'];
    let mut rng = rand::thread_rng();
    (0..WAVEFORM_BARS)
        .map(|_| LEVELS[rng.gen_range(0..LEVELS.len())])
        .collect()
}

fn truncate(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    let cut: String = text.chars().take(max_chars.saturating_sub(1)).collect();
    format!("{}…", cut)
}

pub fn render_message(message: &Message, position: usize) -> String {
    let mut lines = Vec::new();

    if let Some(reply) = &message.reply_to {
        lines.push(format!("┃ {}: {}", reply.sender, truncate(&reply.text, BUBBLE_WIDTH - 4)));
    }

    match message.voice_duration() {
        Some(duration) => lines.push(format!("▶ {} {}", voice_waveform(), duration)),
        None => lines.extend(wrap(message.text(), BUBBLE_WIDTH).into_iter().map(|l| l.into_owned())),
    }

    if !message.reactions.is_empty() {
        let badges: Vec<String> = message
            .reactions
            .summary()
            .into_iter()
            .map(|(emoji, count)| format!("{} {}", emoji, count))
            .collect();
        lines.push(badges.join("  "));
    }

    let mut footer = format!("#{} ", position);
    if message.is_edited {
        footer.push_str("edited ");
    }
    footer.push_str(&message.timestamp);
    if let (true, Some(status)) = (message.is_sent, message.status) {
        footer.push(' ');
        footer.push_str(status.icon());
        if status == DeliveryStatus::Read {
            footer.push_str(" read");
        }
    }
    lines.push(footer);

    let indent = if message.is_sent {
        " ".repeat(PANE_WIDTH - BUBBLE_WIDTH)
    } else {
        String::new()
    };
    lines
        .iter()
        .map(|line| format!("{}{}", indent, line))
        .collect::<Vec<_>>()
        .join("\n")
}

pub fn render_conversation(
    contact: &Contact,
    messages: &[Message],
    typing: Option<&TypingIndicator>,
    pending_reply: Option<&ReplySnapshot>,
) -> String {
    let mut out = vec![render_header(contact)];
    out.extend(
        messages
            .iter()
            .enumerate()
            .map(|(i, message)| render_message(message, i + 1)),
    );

    if let Some(label) = typing.and_then(|t| t.label()) {
        out.push(label);
    }
    if let Some(reply) = pending_reply {
        out.push(format!("Replying to {}: {}", reply.sender, truncate(&reply.text, BUBBLE_WIDTH)));
    }
    out.join("\n\n")
}

pub fn render_story_frame(frame: &StoryFrame) -> String {
    let bars: Vec<String> = frame
        .segments
        .iter()
        .map(|fill| {
            let filled = ((fill / 100.0) * SEGMENT_WIDTH as f64).round() as usize;
            let filled = filled.min(SEGMENT_WIDTH);
            format!("{}{}", "█".repeat(filled), "░".repeat(SEGMENT_WIDTH - filled))
        })
        .collect();

    let body = match frame.story.kind {
        StoryKind::Text => frame.story.content.clone(),
        StoryKind::Image => format!("[image: {}]", frame.story.content),
    };
    let like = if frame.liked { "♥ liked" } else { "♡" };

    format!(
        "{}\n{}  ·  {}   ({}/{})\n\n    {}    (background {})\n\n{}   👁 {} views",
        bars.join(" "),
        frame.story.user_name,
        frame.story.timestamp,
        frame.index + 1,
        frame.total,
        body,
        frame.story.background(),
        like,
        frame.story.views
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use chatsphere::models::MessageContent;

    #[test]
    fn test_parse_commands() {
        assert_eq!(Command::parse("hello there"), Command::Send("hello there".to_string()));
        assert_eq!(
            Command::parse("/react #2 ❤️"),
            Command::React {
                message: "#2".to_string(),
                emoji: "❤️".to_string()
            }
        );
        assert_eq!(
            Command::parse("/edit #4 new words here"),
            Command::Edit {
                message: "#4".to_string(),
                text: "new words here".to_string()
            }
        );
        assert_eq!(
            Command::parse("/stories 1 2"),
            Command::Stories {
                user: "1".to_string(),
                start: 2
            }
        );
        assert!(matches!(Command::parse("/open"), Command::Invalid(_)));
        assert!(matches!(Command::parse("/bogus"), Command::Invalid(_)));
    }

    #[test]
    fn test_render_message_footer() {
        let mut message = Message::outgoing("m1", "hi", "2:30 PM", DeliveryStatus::Read);
        message.is_edited = true;
        message.reactions.toggle("👍", "me");

        let rendered = render_message(&message, 3);
        assert!(rendered.contains("#3 edited 2:30 PM ✓✓ read"));
        assert!(rendered.contains("👍 1"));
    }

    #[test]
    fn test_render_voice_message() {
        let mut message = Message::outgoing("v1", "", "2:30 PM", DeliveryStatus::Sent);
        message.content = MessageContent::Voice { duration: None };

        let rendered = render_message(&message, 1);
        assert!(rendered.contains("▶ "));
        assert!(rendered.contains("0:32"));
    }
}
