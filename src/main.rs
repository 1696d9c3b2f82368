#![deny(dead_code)] // DO NOT REMOVE THIS EVER
use anyhow::{anyhow, Result};
use clap::Parser;
use log::{debug, info, warn, LevelFilter};
use std::env;
use std::path::PathBuf;
use tokio::sync::mpsc;

mod ui;
mod utils;

use crate::ui::Command;
use chatsphere::config;
use chatsphere::identity::{IdentityProvider, PhoneIdentity};
use chatsphere::story::StoryEvent;
use chatsphere::{ChatSession, ConversationEvent, ConversationManager};

/// Reactor id used for the local user's reactions
const LOCAL_REACTOR: &str = "me";

/// Command line arguments for ChatSphere
#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "ChatSphere: a console chat mockup with reactions, replies and stories.",
    long_about = "ChatSphere runs entirely on mock data: no network, no persistence.\n\n\
    Sign-in accepts any phone number of 10+ characters and any 4+ character code.\n\
    CHATSPHERE_PHONE and CHATSPHERE_CODE skip the prompts."
)]
struct Args {
    /// JSON config file (defaults to <config dir>/chatsphere/config.json)
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Where log output goes
    #[arg(long, value_name = "PATH", default_value = "chatsphere.log")]
    log_file: PathBuf,

    /// Log at debug level
    #[arg(short, long)]
    verbose: bool,

    /// Open this contact's chat right after sign-in
    #[arg(long, value_name = "ID")]
    contact: Option<String>,
}

/// Walk through the phone / code screens, preferring environment variables
fn sign_in(identity: &mut PhoneIdentity) -> Result<()> {
    while !identity.is_authenticated() {
        let phone = match env::var("CHATSPHERE_PHONE") {
            Ok(phone) => phone,
            Err(_) => {
                eprintln!("Enter your phone number to get started:");
                utils::read_line()?.ok_or_else(|| anyhow!("Input closed during sign-in"))?
            }
        };
        if let Err(e) = identity.request_code(&phone) {
            eprintln!("{}", e);
            if env::var("CHATSPHERE_PHONE").is_ok() {
                return Err(anyhow!("CHATSPHERE_PHONE rejected: {}", e));
            }
            continue;
        }

        let code = match env::var("CHATSPHERE_CODE") {
            Ok(code) => code,
            Err(_) => {
                eprintln!("Enter the verification code sent to your phone:");
                utils::read_line()?.ok_or_else(|| anyhow!("Input closed during sign-in"))?
            }
        };
        if let Err(e) = identity.verify(&code) {
            eprintln!("{}", e);
            if env::var("CHATSPHERE_CODE").is_ok() {
                return Err(anyhow!("CHATSPHERE_CODE rejected: {}", e));
            }
        }
    }
    Ok(())
}

/// Read stdin on a plain thread so timers keep firing while we wait for input
fn spawn_stdin_reader() -> mpsc::Receiver<String> {
    let (tx, rx) = mpsc::channel(16);
    std::thread::spawn(move || loop {
        match utils::read_line() {
            Ok(Some(line)) => {
                if tx.blocking_send(line).is_err() {
                    break;
                }
            }
            Ok(None) => break,
            Err(e) => {
                warn!("Failed to read stdin: {}", e);
                break;
            }
        }
    });
    rx
}

/// Wait on an optional receiver; an absent one never yields
async fn recv_or_pending<T>(rx: &mut Option<mpsc::Receiver<T>>) -> Option<T> {
    match rx {
        Some(rx) => rx.recv().await,
        None => std::future::pending().await,
    }
}

/// Accept "#n" (1-based position as rendered) or a raw message id
fn resolve_message_id(conversation: &ConversationManager, token: &str) -> Option<String> {
    let messages = conversation.messages();
    match token.strip_prefix('#') {
        Some(position) => position
            .parse::<usize>()
            .ok()
            .and_then(|n| n.checked_sub(1))
            .and_then(|i| messages.get(i))
            .map(|m| m.id.clone()),
        None => messages.iter().find(|m| m.id == token).map(|m| m.id.clone()),
    }
}

fn redraw_conversation(session: &ChatSession) {
    if let Some(conversation) = session.conversation() {
        println!(
            "\n{}\n",
            ui::render_conversation(
                conversation.contact(),
                &conversation.messages(),
                session.typing(),
                session.pending_reply(),
            )
        );
    }
}

fn redraw_story(session: &ChatSession) {
    match session.stories().and_then(|viewer| viewer.frame()) {
        Some(frame) => println!("\n{}\n", ui::render_story_frame(&frame)),
        None => println!("No stories to show."),
    }
}

async fn animate_typing(session: &mut ChatSession) {
    let interval = session.config().typing_interval();
    let typing = match session.typing_mut() {
        Some(typing) => typing,
        None => {
            println!("Open a chat first.");
            return;
        }
    };

    let now_typing = !typing.is_typing();
    typing.set_typing(now_typing);
    if !now_typing {
        println!("(contact stopped typing)");
        return;
    }
    for _ in 0..3 {
        if let Some(label) = typing.label() {
            println!("{}", label);
        }
        typing.tick();
        tokio::time::sleep(interval).await;
    }
}

/// Apply one command. Returns false when the user wants to leave.
async fn handle_command(
    session: &mut ChatSession,
    command: Command,
    conversation_events: &mut Option<mpsc::Receiver<ConversationEvent>>,
    story_events: &mut Option<mpsc::Receiver<StoryEvent>>,
) -> bool {
    match command {
        Command::Help => println!("{}", ui::help_text()),
        Command::Contacts(query) => {
            let selected = session.contacts().selected().map(|c| c.id.clone());
            let matches = session.contacts().search(&query);
            println!("{}", ui::render_contacts(&matches, selected.as_deref()));
        }
        Command::Open(contact_id) => match session.open_conversation(&contact_id) {
            Some(events) => {
                *conversation_events = Some(events);
                redraw_conversation(session);
            }
            None => println!("No contact with id {}", contact_id),
        },
        Command::Reply(token) => {
            let id = session.conversation().and_then(|c| resolve_message_id(c, &token));
            match id.and_then(|id| session.start_reply(&id).cloned()) {
                Some(reply) => println!("Replying to {}: {}", reply.sender, reply.text),
                None => println!("No message {} to reply to", token),
            }
        }
        Command::CancelReply => session.cancel_reply(),
        Command::React { message, emoji } => {
            let applied = session
                .conversation()
                .and_then(|c| resolve_message_id(c, &message).map(|id| c.react(&id, &emoji, LOCAL_REACTOR)))
                .unwrap_or(false);
            if !applied {
                println!("No message {} to react to", message);
            }
        }
        Command::Edit { message, text } => {
            let applied = session
                .conversation()
                .and_then(|c| resolve_message_id(c, &message).map(|id| c.edit_text(&id, &text)))
                .unwrap_or(false);
            if !applied {
                println!("Only your own messages can be edited, and only to new non-empty text");
            }
        }
        Command::Voice(duration) => {
            if session.send_voice(duration.as_deref()).is_none() {
                println!("Open a chat first.");
            }
        }
        Command::MarkRead => {
            let count = session.conversation().map(|c| c.mark_all_read()).unwrap_or(0);
            debug!("{} messages marked read", count);
        }
        Command::Typing => {
            animate_typing(session).await;
            redraw_conversation(session);
        }
        Command::Stories { user, start } => {
            *story_events = Some(session.open_stories(&user, start));
            redraw_story(session);
        }
        Command::NextStory => {
            if let Some(viewer) = session.stories_mut() {
                viewer.next();
            }
        }
        Command::PreviousStory => {
            if let Some(viewer) = session.stories_mut() {
                viewer.previous();
            }
        }
        Command::LikeStory => {
            if let Some(viewer) = session.stories() {
                let liked = viewer.toggle_like();
                println!("{}", if liked { "♥ liked" } else { "♡ unliked" });
            }
        }
        Command::ReplyStory(text) => {
            if let Some(viewer) = session.stories() {
                viewer.set_reply_draft(&text);
                match viewer.send_reply() {
                    Some(reply) => println!("Reply sent: {}", reply),
                    None => println!("Nothing to send"),
                }
            }
        }
        Command::CloseStory => {
            session.close_stories();
            *story_events = None;
            println!("Story viewer closed.");
        }
        Command::Quit => return false,
        Command::Send(text) => {
            if session.conversation().is_none() {
                println!("Open a chat first (/contacts, then /open <id>).");
            } else if session.send(&text).is_none() {
                debug!("Nothing sent for blank input");
            }
        }
        Command::Invalid(reason) => println!("{}", reason),
    }
    true
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let level = if args.verbose { LevelFilter::Debug } else { LevelFilter::Info };
    utils::setup_logging(args.log_file.to_str(), level)?;
    info!("ChatSphere starting up");
    info!("System information: {} {}", std::env::consts::OS, std::env::consts::ARCH);

    if let Some(path) = args.config.clone() {
        config::set_config_path_override(path);
    }
    let config = config::load_config()?;
    info!("Using configuration: {:?}", config);

    let mut identity = PhoneIdentity::new();
    sign_in(&mut identity)?;
    println!("Welcome to ChatSphere\n");

    let mut session = ChatSession::new(config);
    let mut conversation_events: Option<mpsc::Receiver<ConversationEvent>> = None;
    let mut story_events: Option<mpsc::Receiver<StoryEvent>> = None;

    println!("{}", ui::render_contacts(&session.contacts().search(""), None));
    println!("\n{}\n", ui::help_text());

    if let Some(contact_id) = args.contact.as_deref() {
        match session.open_conversation(contact_id) {
            Some(events) => {
                conversation_events = Some(events);
                redraw_conversation(&session);
            }
            None => warn!("Contact {} from --contact not found", contact_id),
        }
    }

    let mut input = spawn_stdin_reader();

    loop {
        tokio::select! {
            line = input.recv() => {
                let line = match line {
                    Some(line) => line,
                    None => break,
                };
                let command = Command::parse(&line);
                if !handle_command(&mut session, command, &mut conversation_events, &mut story_events).await {
                    break;
                }
            }
            Some(event) = recv_or_pending(&mut conversation_events) => {
                debug!("Conversation event: {:?}", event);
                redraw_conversation(&session);
            }
            Some(event) = recv_or_pending(&mut story_events) => {
                match event {
                    StoryEvent::Advanced(_) => redraw_story(&session),
                    StoryEvent::Closed => {
                        session.close_stories();
                        story_events = None;
                        println!("Story viewer closed.");
                    }
                }
            }
        }
    }

    session.shutdown();
    identity.sign_out();
    println!("Chat session ended.");
    Ok(())
}
