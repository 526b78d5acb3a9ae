use std::time::Duration;

use tokio::runtime::Handle;
use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio::time::{self, Instant, MissedTickBehavior};

use crate::common::ClientEvent;

/// Owned handle to the periodic poll of one conversation epoch. The task is
/// aborted when the handle is cancelled or dropped, whichever comes first.
#[derive(Debug)]
pub struct PollTimer {
    epoch: u64,
    task: JoinHandle<()>,
}

impl PollTimer {
    /// First tick fires one full `every` after start; selecting a
    /// conversation already fetched it.
    pub fn start(
        runtime: &Handle,
        epoch: u64,
        every: Duration,
        events: mpsc::Sender<ClientEvent>,
    ) -> Self {
        let task = runtime.spawn(async move {
            let mut ticker = time::interval_at(Instant::now() + every, every);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            loop {
                ticker.tick().await;
                if events.send(ClientEvent::PollTick { epoch }).await.is_err() {
                    break;
                }
            }
        });
        log::debug!("Polling started for epoch {epoch} every {every:?}");
        Self { epoch, task }
    }

    pub fn epoch(&self) -> u64 {
        self.epoch
    }

    pub fn cancel(self) {
        log::debug!("Polling stopped for epoch {}", self.epoch);
    }
}

impl Drop for PollTimer {
    fn drop(&mut self) {
        self.task.abort();
    }
}

/// One-shot `RefetchDue` after `delay`, giving the backend time to make a
/// freshly sent message readable.
pub fn schedule_refetch(
    runtime: &Handle,
    epoch: u64,
    delay: Duration,
    events: mpsc::Sender<ClientEvent>,
) -> JoinHandle<()> {
    runtime.spawn(async move {
        time::sleep(delay).await;
        if events.send(ClientEvent::RefetchDue { epoch }).await.is_err() {
            log::debug!("Event channel closed before refetch of epoch {epoch}");
        }
    })
}
