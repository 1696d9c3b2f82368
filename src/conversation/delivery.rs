// Simulated delivery acknowledgement
//
// Each composed message gets one deferred task that marks it delivered after the
// configured delay. The task handle lives in the conversation state so teardown
// can abort it.

use log::{debug, warn};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use super::{lock_state, ConversationState};
use crate::models::DeliveryStatus;

/// Schedule the delivered transition for `message_id`.
///
/// Must be called with the conversation lock held (`state` is the guarded value of
/// `shared`), so the handle is registered before the task can possibly run.
pub(crate) fn schedule_delivery(
    shared: &Arc<Mutex<ConversationState>>,
    state: &mut ConversationState,
    message_id: &str,
    delay: Duration,
) {
    let runtime = match tokio::runtime::Handle::try_current() {
        Ok(handle) => handle,
        Err(_) => {
            warn!("No async runtime available; message {} will stay sent", message_id);
            return;
        }
    };

    let task_state = Arc::clone(shared);
    let id = message_id.to_string();

    let handle = runtime.spawn(async move {
        tokio::time::sleep(delay).await;

        let mut state = lock_state(&task_state);
        if state.closed {
            debug!("Delivery timer for {} fired after teardown; ignoring", id);
            return;
        }

        state.pending.remove(&id);
        // Only the status changes; edits and reactions made meanwhile are kept
        if state.advance_status(&id, DeliveryStatus::Delivered).is_some() {
            debug!("Message {} acknowledged as delivered", id);
        }
    });

    if let Some(previous) = state.pending.insert(message_id.to_string(), handle) {
        previous.abort();
    }
}

/// Abort every outstanding delivery task. Returns how many were cancelled.
pub(crate) fn cancel_all(state: &mut ConversationState) -> usize {
    let mut cancelled = 0;
    for (id, handle) in state.pending.drain() {
        if !handle.is_finished() {
            debug!("Cancelling delivery timer for {}", id);
            cancelled += 1;
        }
        handle.abort();
    }
    cancelled
}
