// Timer-driven story playback
//
// The viewer owns exactly one ticker task at a time. Every restart bumps the
// epoch under the player lock before the new task is spawned, and a task exits
// as soon as it sees a newer epoch, so two tickers never advance the same player.

use log::{debug, warn};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{interval_at, Instant, MissedTickBehavior};

use super::{StoryFrame, StoryPlayer, TickOutcome};
use crate::config::ChatConfig;
use crate::models::Story;

/// Playback notifications for the presenter
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoryEvent {
    /// Playback moved to this story index
    Advanced(usize),
    /// The viewer closed (user action or end of sequence)
    Closed,
}

struct ViewerShared {
    player: StoryPlayer,
    epoch: u64,
    events: mpsc::Sender<StoryEvent>,
}

impl ViewerShared {
    fn emit(&self, event: StoryEvent) {
        if let Err(e) = self.events.try_send(event) {
            debug!("Story event not delivered to presenter: {}", e);
        }
    }
}

fn lock_shared(shared: &Mutex<ViewerShared>) -> MutexGuard<'_, ViewerShared> {
    shared.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}

pub struct StoryViewer {
    shared: Arc<Mutex<ViewerShared>>,
    ticker: Option<JoinHandle<()>>,
}

impl StoryViewer {
    /// Open the viewer on `stories` at `start` and start ticking
    pub fn open(stories: Vec<Story>, start: usize, config: &ChatConfig) -> (Self, mpsc::Receiver<StoryEvent>) {
        let (events, event_rx) = mpsc::channel(config.event_buffer.max(1));
        let player = StoryPlayer::new(stories, start, config);

        let mut viewer = StoryViewer {
            shared: Arc::new(Mutex::new(ViewerShared {
                player,
                epoch: 0,
                events,
            })),
            ticker: None,
        };
        viewer.restart_ticker();

        (viewer, event_rx)
    }

    /// Stop the current ticker and, if still playing, start a fresh one whose first
    /// tick is a full period away
    fn restart_ticker(&mut self) {
        if let Some(old) = self.ticker.take() {
            old.abort();
        }

        let (epoch, period) = {
            let mut shared = lock_shared(&self.shared);
            shared.epoch += 1;
            if !shared.player.is_playing() {
                return;
            }
            (shared.epoch, shared.player.tick_period())
        };

        let runtime = match tokio::runtime::Handle::try_current() {
            Ok(handle) => handle,
            Err(_) => {
                warn!("No async runtime available; story playback will not advance on its own");
                return;
            }
        };

        self.ticker = Some(runtime.spawn(run_ticker(Arc::clone(&self.shared), epoch, period)));
    }

    fn navigate(&mut self, step: impl FnOnce(&mut StoryPlayer) -> Option<usize>) -> Option<usize> {
        let index = {
            let mut shared = lock_shared(&self.shared);
            if !shared.player.is_playing() {
                return None;
            }
            let index = step(&mut shared.player);
            match index {
                Some(index) => shared.emit(StoryEvent::Advanced(index)),
                None => shared.emit(StoryEvent::Closed),
            }
            index
        };
        self.restart_ticker();
        index
    }

    pub fn next(&mut self) -> Option<usize> {
        self.navigate(StoryPlayer::next)
    }

    pub fn previous(&mut self) -> Option<usize> {
        self.navigate(StoryPlayer::previous)
    }

    /// Jump to `index`. An index past the end leaves playback untouched.
    pub fn jump_to(&mut self, index: usize) -> Option<usize> {
        {
            let shared = lock_shared(&self.shared);
            if index >= shared.player.len() {
                debug!("Ignoring jump to story {} of {}", index, shared.player.len());
                return shared.player.index();
            }
        }
        self.navigate(|player| player.jump_to(index))
    }

    pub fn toggle_like(&self) -> bool {
        lock_shared(&self.shared).player.toggle_like()
    }

    pub fn set_reply_draft(&self, text: &str) {
        lock_shared(&self.shared).player.set_reply_draft(text);
    }

    pub fn send_reply(&self) -> Option<String> {
        lock_shared(&self.shared).player.send_reply()
    }

    pub fn is_open(&self) -> bool {
        lock_shared(&self.shared).player.is_playing()
    }

    /// Whether a ticker task is currently alive
    pub fn is_ticking(&self) -> bool {
        self.ticker
            .as_ref()
            .map(|handle| !handle.is_finished())
            .unwrap_or(false)
    }

    pub fn index(&self) -> Option<usize> {
        lock_shared(&self.shared).player.index()
    }

    pub fn progress(&self) -> f64 {
        lock_shared(&self.shared).player.progress()
    }

    /// Snapshot for rendering; None means there is nothing to draw
    pub fn frame(&self) -> Option<StoryFrame> {
        lock_shared(&self.shared).player.frame()
    }

    pub fn close(&mut self) {
        {
            let mut shared = lock_shared(&self.shared);
            shared.epoch += 1;
            if shared.player.is_playing() {
                shared.player.close();
                shared.emit(StoryEvent::Closed);
            }
        }
        if let Some(ticker) = self.ticker.take() {
            ticker.abort();
        }
    }
}

impl Drop for StoryViewer {
    fn drop(&mut self) {
        self.close();
    }
}

async fn run_ticker(shared: Arc<Mutex<ViewerShared>>, epoch: u64, period: Duration) {
    let mut interval = interval_at(Instant::now() + period, period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Delay);

    loop {
        interval.tick().await;

        let mut guard = lock_shared(&shared);
        if guard.epoch != epoch {
            debug!("Story ticker epoch {} superseded; stopping", epoch);
            break;
        }

        match guard.player.tick() {
            TickOutcome::Progressed => {}
            TickOutcome::Advanced(index) => guard.emit(StoryEvent::Advanced(index)),
            TickOutcome::Finished => {
                if !guard.player.is_playing() {
                    guard.emit(StoryEvent::Closed);
                }
                debug!("Story sequence finished; ticker stopping");
                break;
            }
            TickOutcome::Ignored => break,
        }
    }
}
