//! Ephemeral story playback
//!
//! [`StoryPlayer`] is the pure state machine: it only moves when `tick`, `next`,
//! `previous` or `close` is called. [`ticker::StoryViewer`] drives it from a tokio
//! interval and owns the cancellation of that interval.

use log::{debug, info, warn};
use std::time::Duration;

use crate::config::{ChatConfig, StoryEndBehavior};
use crate::models::Story;

pub mod ticker;

pub use ticker::{StoryEvent, StoryViewer};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackState {
    /// Showing `index`; `elapsed` is how much of its duration has played
    Playing { index: usize, elapsed: Duration },
    Closed,
}

/// Result of one ticker step
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TickOutcome {
    /// Progress grew, same story
    Progressed,
    /// The current story ran out and playback moved to this index
    Advanced(usize),
    /// The last story ran out: the player closed or is holding on the last story
    Finished,
    /// Nothing to do (closed, or already holding at the end)
    Ignored,
}

/// Where moving forward from an index leads
enum Forward {
    To(usize),
    Close,
    Hold,
}

/// Everything the presenter needs to draw the current story
#[derive(Debug, Clone, PartialEq)]
pub struct StoryFrame {
    pub story: Story,
    pub index: usize,
    pub total: usize,
    /// 0..=100 for the current story
    pub progress: f64,
    /// One progress bar per story in the sequence
    pub segments: Vec<f64>,
    pub liked: bool,
    pub reply_draft: String,
}

pub struct StoryPlayer {
    stories: Vec<Story>,
    state: PlaybackState,
    story_duration: Duration,
    tick_period: Duration,
    end_behavior: StoryEndBehavior,
    // Per-story UI state, reset whenever a story is entered
    liked: bool,
    reply_draft: String,
}

impl StoryPlayer {
    /// Start playing `stories` at `start`. An empty sequence or out-of-range start
    /// yields an inert, closed player.
    pub fn new(stories: Vec<Story>, start: usize, config: &ChatConfig) -> Self {
        let state = if start < stories.len() {
            PlaybackState::Playing {
                index: start,
                elapsed: Duration::ZERO,
            }
        } else {
            warn!(
                "Story index {} out of range for {} stories; nothing to play",
                start,
                stories.len()
            );
            PlaybackState::Closed
        };

        StoryPlayer {
            stories,
            state,
            story_duration: config.story_duration().max(Duration::from_millis(1)),
            tick_period: config.tick_period().max(Duration::from_millis(1)),
            end_behavior: config.story_end,
            liked: false,
            reply_draft: String::new(),
        }
    }

    pub fn state(&self) -> PlaybackState {
        self.state
    }

    pub fn is_playing(&self) -> bool {
        matches!(self.state, PlaybackState::Playing { .. })
    }

    pub fn index(&self) -> Option<usize> {
        match self.state {
            PlaybackState::Playing { index, .. } => Some(index),
            PlaybackState::Closed => None,
        }
    }

    pub fn current(&self) -> Option<&Story> {
        self.index().and_then(|index| self.stories.get(index))
    }

    pub fn len(&self) -> usize {
        self.stories.len()
    }

    pub fn is_empty(&self) -> bool {
        self.stories.is_empty()
    }

    pub fn tick_period(&self) -> Duration {
        self.tick_period
    }

    /// Progress of the current story, 0..=100
    pub fn progress(&self) -> f64 {
        match self.state {
            PlaybackState::Playing { elapsed, .. } => {
                let ratio = elapsed.as_secs_f64() / self.story_duration.as_secs_f64();
                (ratio * 100.0).min(100.0)
            }
            PlaybackState::Closed => 0.0,
        }
    }

    /// Progress bar fill for every story: full before the cursor, empty after it
    pub fn segments(&self) -> Vec<f64> {
        let current = self.index();
        let progress = self.progress();

        (0..self.stories.len())
            .map(|i| match current {
                Some(index) if i < index => 100.0,
                Some(index) if i == index => progress,
                _ => 0.0,
            })
            .collect()
    }

    pub fn liked(&self) -> bool {
        self.liked
    }

    pub fn reply_draft(&self) -> &str {
        &self.reply_draft
    }

    fn forward_from(&self, index: usize) -> Forward {
        if index + 1 < self.stories.len() {
            return Forward::To(index + 1);
        }
        match self.end_behavior {
            StoryEndBehavior::Loop => Forward::To(0),
            StoryEndBehavior::Close => Forward::Close,
            StoryEndBehavior::Hold => Forward::Hold,
        }
    }

    fn enter(&mut self, index: usize) {
        debug!("Entering story {} of {}", index + 1, self.stories.len());
        self.state = PlaybackState::Playing {
            index,
            elapsed: Duration::ZERO,
        };
        self.liked = false;
        self.reply_draft.clear();
    }

    /// One ticker period has elapsed
    pub fn tick(&mut self) -> TickOutcome {
        let (index, elapsed) = match self.state {
            PlaybackState::Playing { index, elapsed } => (index, elapsed),
            PlaybackState::Closed => return TickOutcome::Ignored,
        };

        // Holding on the last story
        if elapsed >= self.story_duration {
            return TickOutcome::Ignored;
        }

        let elapsed = elapsed + self.tick_period;
        if elapsed < self.story_duration {
            self.state = PlaybackState::Playing { index, elapsed };
            return TickOutcome::Progressed;
        }

        match self.forward_from(index) {
            Forward::To(next) => {
                self.enter(next);
                TickOutcome::Advanced(next)
            }
            Forward::Close => {
                self.close();
                TickOutcome::Finished
            }
            Forward::Hold => {
                self.state = PlaybackState::Playing {
                    index,
                    elapsed: self.story_duration,
                };
                TickOutcome::Finished
            }
        }
    }

    /// User skipped forward. Returns the index now playing, or None once closed.
    pub fn next(&mut self) -> Option<usize> {
        let index = self.index()?;
        match self.forward_from(index) {
            Forward::To(next) => self.enter(next),
            Forward::Close => self.close(),
            Forward::Hold => self.enter(index),
        }
        self.index()
    }

    /// User went back. At the first story this restarts it (or wraps when looping).
    pub fn previous(&mut self) -> Option<usize> {
        let index = self.index()?;
        let target = if index > 0 {
            index - 1
        } else if self.end_behavior == StoryEndBehavior::Loop {
            self.stories.len() - 1
        } else {
            0
        };
        self.enter(target);
        Some(target)
    }

    /// Jump straight to a story (e.g. tapping a progress segment)
    pub fn jump_to(&mut self, index: usize) -> Option<usize> {
        if !self.is_playing() || index >= self.stories.len() {
            return self.index();
        }
        self.enter(index);
        Some(index)
    }

    pub fn close(&mut self) {
        if self.is_playing() {
            info!("Story player closed");
        }
        self.state = PlaybackState::Closed;
        self.liked = false;
        self.reply_draft.clear();
    }

    pub fn toggle_like(&mut self) -> bool {
        if self.is_playing() {
            self.liked = !self.liked;
        }
        self.liked
    }

    pub fn set_reply_draft(&mut self, text: &str) {
        if self.is_playing() {
            self.reply_draft = text.to_string();
        }
    }

    /// Send the drafted reply. Blank drafts are kept and nothing is sent.
    pub fn send_reply(&mut self) -> Option<String> {
        let story_id = self.current()?.id.clone();
        let reply = self.reply_draft.trim().to_string();
        if reply.is_empty() {
            return None;
        }

        info!("Reply sent to story {}: {}", story_id, reply);
        self.reply_draft.clear();
        Some(reply)
    }

    pub fn frame(&self) -> Option<StoryFrame> {
        let index = self.index()?;
        let story = self.stories.get(index)?.clone();

        Some(StoryFrame {
            story,
            index,
            total: self.stories.len(),
            progress: self.progress(),
            segments: self.segments(),
            liked: self.liked,
            reply_draft: self.reply_draft.clone(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::StoryKind;

    fn stories(n: usize) -> Vec<Story> {
        (0..n)
            .map(|i| Story {
                id: format!("s{}", i),
                user_id: "1".to_string(),
                user_name: "Sarah Johnson".to_string(),
                content: format!("Story {}", i),
                timestamp: "2h ago".to_string(),
                views: 10,
                kind: StoryKind::Text,
                background_color: None,
            })
            .collect()
    }

    fn config(end: StoryEndBehavior) -> ChatConfig {
        ChatConfig {
            story_end: end,
            ..ChatConfig::default()
        }
    }

    fn ticks_per_story(config: &ChatConfig) -> u64 {
        config.story_duration_ms / config.tick_period_ms
    }

    #[test]
    fn test_full_duration_advances_and_resets_progress() {
        let config = config(StoryEndBehavior::Close);
        let mut player = StoryPlayer::new(stories(3), 0, &config);

        for _ in 0..ticks_per_story(&config) - 1 {
            assert_eq!(player.tick(), TickOutcome::Progressed);
        }
        assert!(player.progress() > 97.0);

        assert_eq!(player.tick(), TickOutcome::Advanced(1));
        assert_eq!(player.index(), Some(1));
        assert_eq!(player.progress(), 0.0);
    }

    #[test]
    fn test_progress_is_linear() {
        let config = config(StoryEndBehavior::Close);
        let mut player = StoryPlayer::new(stories(3), 0, &config);

        for _ in 0..25 {
            player.tick();
        }
        assert!((player.progress() - 50.0).abs() < 1e-9);
        assert_eq!(player.segments(), vec![50.0, 0.0, 0.0]);
    }

    #[test]
    fn test_last_story_close_policy() {
        let config = config(StoryEndBehavior::Close);
        let mut player = StoryPlayer::new(stories(2), 1, &config);

        let outcomes: Vec<TickOutcome> = (0..ticks_per_story(&config)).map(|_| player.tick()).collect();
        assert_eq!(outcomes.last(), Some(&TickOutcome::Finished));
        assert_eq!(player.state(), PlaybackState::Closed);
        assert_eq!(player.tick(), TickOutcome::Ignored);
    }

    #[test]
    fn test_last_story_loop_policy() {
        let config = config(StoryEndBehavior::Loop);
        let mut player = StoryPlayer::new(stories(2), 1, &config);

        for _ in 0..ticks_per_story(&config) {
            player.tick();
        }
        assert_eq!(player.index(), Some(0));
        assert_eq!(player.previous(), Some(1), "previous at the first story wraps when looping");
    }

    #[test]
    fn test_last_story_hold_policy() {
        let config = config(StoryEndBehavior::Hold);
        let mut player = StoryPlayer::new(stories(2), 1, &config);

        for _ in 0..ticks_per_story(&config) {
            player.tick();
        }
        assert_eq!(player.index(), Some(1));
        assert_eq!(player.progress(), 100.0);
        assert_eq!(player.tick(), TickOutcome::Ignored);

        // Skipping forward restarts the held story
        assert_eq!(player.next(), Some(1));
        assert_eq!(player.progress(), 0.0);
    }

    #[test]
    fn test_navigation_resets_progress_and_like() {
        let config = config(StoryEndBehavior::Close);
        let mut player = StoryPlayer::new(stories(3), 0, &config);

        for _ in 0..10 {
            player.tick();
        }
        assert!(player.toggle_like());
        player.set_reply_draft("nice");

        assert_eq!(player.next(), Some(1));
        assert_eq!(player.progress(), 0.0);
        assert!(!player.liked());
        assert_eq!(player.reply_draft(), "");

        assert_eq!(player.previous(), Some(0));
        assert_eq!(player.previous(), Some(0), "previous at the first story restarts it");
    }

    #[test]
    fn test_next_past_end_closes() {
        let config = config(StoryEndBehavior::Close);
        let mut player = StoryPlayer::new(stories(1), 0, &config);

        assert_eq!(player.next(), None);
        assert!(!player.is_playing());
        assert!(player.frame().is_none());
    }

    #[test]
    fn test_inert_player() {
        let config = config(StoryEndBehavior::Close);

        let mut empty = StoryPlayer::new(Vec::new(), 0, &config);
        assert!(empty.current().is_none());
        assert_eq!(empty.tick(), TickOutcome::Ignored);
        assert_eq!(empty.next(), None);

        let out_of_range = StoryPlayer::new(stories(3), 3, &config);
        assert!(out_of_range.frame().is_none());
        assert_eq!(out_of_range.segments(), vec![0.0, 0.0, 0.0]);
    }

    #[test]
    fn test_closed_player_ignores_everything() {
        let config = config(StoryEndBehavior::Loop);
        let mut player = StoryPlayer::new(stories(3), 0, &config);
        player.close();

        for _ in 0..200 {
            assert_eq!(player.tick(), TickOutcome::Ignored);
        }
        assert_eq!(player.next(), None);
        assert_eq!(player.previous(), None);
        assert_eq!(player.jump_to(1), None);
        assert!(!player.toggle_like());
    }

    #[test]
    fn test_story_reply() {
        let config = config(StoryEndBehavior::Close);
        let mut player = StoryPlayer::new(stories(2), 0, &config);

        player.set_reply_draft("   ");
        assert_eq!(player.send_reply(), None);

        player.set_reply_draft("  Love this!  ");
        assert_eq!(player.send_reply(), Some("Love this!".to_string()));
        assert_eq!(player.reply_draft(), "");
    }
}
