// Common test utilities for integration tests
// Shared logging setup and fixtures
#![allow(dead_code)]

use std::sync::Once;
use std::time::Duration;

use log::LevelFilter;

use chatsphere::{
    mock,
    models::{Contact, Message, Story, StoryKind},
    ChatConfig, StoryEndBehavior,
};

// Initialize logging once
static INIT_LOGGER: Once = Once::new();

/// Set up the logger for the tests
pub fn setup_logging() {
    INIT_LOGGER.call_once(|| {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Debug)
            .is_test(true)
            .init();
    });
}

/// The contact every conversation test talks to
pub fn sarah() -> Contact {
    mock::contacts()
        .into_iter()
        .find(|c| c.id == "1")
        .expect("mock contact 1 exists")
}

pub fn history() -> Vec<Message> {
    mock::messages_for("1")
}

/// `n` text stories owned by the same user
pub fn stories(n: usize) -> Vec<Story> {
    (0..n)
        .map(|i| Story {
            id: format!("story{}", i),
            user_id: "1".to_string(),
            user_name: "Sarah Johnson".to_string(),
            content: format!("Story number {}", i),
            timestamp: format!("{}h ago", n - i),
            views: 5,
            kind: StoryKind::Text,
            background_color: Some("#25D366".to_string()),
        })
        .collect()
}

pub fn config_with_end(end: StoryEndBehavior) -> ChatConfig {
    ChatConfig {
        story_end: end,
        ..ChatConfig::default()
    }
}

pub fn delivery_delay() -> Duration {
    ChatConfig::default().delivery_delay()
}

pub fn story_duration() -> Duration {
    ChatConfig::default().story_duration()
}

pub fn tick_period() -> Duration {
    ChatConfig::default().tick_period()
}

/// Approximate float comparison for progress values
pub fn assert_progress(actual: f64, expected: f64) {
    assert!(
        (actual - expected).abs() < 1e-6,
        "Expected progress {}, got {}",
        expected,
        actual
    );
}
