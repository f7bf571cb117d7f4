// Copyright © SixtyFPS GmbH <info@slint.dev>
// SPDX-License-Identifier: MIT

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::{Instant, MissedTickBehavior};

use crate::feed::displaystate::DisplayState;
use crate::feed::feedclient::{FeedClientPointer, FeedError};
use crate::feed::timelabels::{time_labels, Clock, LocalClock};
use crate::ValueStore;

pub type ClockPointer = Arc<dyn Clock + Send + Sync>;

/// Shortest timer period a loop accepts.
pub const MIN_INTERVAL: Duration = Duration::from_secs(1);

/// What a successful cycle did with its snapshot.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum CycleOutcome {
    /// The snapshot replaced the display state.
    Published,
    /// A cycle started later had already published, so the snapshot was dropped.
    Superseded,
}

/// Counters over all cycles of a loop.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct CycleStats {
    pub started: u64,
    pub published: u64,
    pub superseded: u64,
    pub failed: u64,
}

#[derive(Default)]
struct Counters {
    started: AtomicU64,
    published: AtomicU64,
    superseded: AtomicU64,
    failed: AtomicU64,
}

struct Acquisition {
    client: FeedClientPointer,
    clock: ClockPointer,
    store: ValueStore<DisplayState>,
    next_ticket: AtomicU64,
    /// Ticket of the cycle whose snapshot is currently shown.
    shown_ticket: Mutex<u64>,
    counters: Counters,
}

impl Acquisition {
    fn take_ticket(&self) -> u64 {
        self.counters.started.fetch_add(1, Ordering::Relaxed);
        self.next_ticket.fetch_add(1, Ordering::SeqCst) + 1
    }

    async fn run_cycle(&self, ticket: u64) -> Result<CycleOutcome, FeedError> {
        match self.acquire().await {
            Ok(state) => Ok(self.publish(ticket, state)),
            Err(e) => {
                self.counters.failed.fetch_add(1, Ordering::Relaxed);
                log::warn!("Acquisition cycle {ticket} failed, keeping the previous display state: {e}");
                Err(e)
            }
        }
    }

    async fn acquire(&self) -> Result<DisplayState, FeedError> {
        let batch = self.client.fetch().await?;
        let now = self.clock.now();

        DisplayState::from_batch(&batch, time_labels(&now), now.naive_local())
    }

    fn publish(&self, ticket: u64, state: DisplayState) -> CycleOutcome {
        let mut shown_ticket = self.shown_ticket.lock().unwrap_or_else(PoisonError::into_inner);

        if ticket < *shown_ticket {
            self.counters.superseded.fetch_add(1, Ordering::Relaxed);
            log::debug!("Dropping result of cycle {ticket}, cycle {} is already shown", *shown_ticket);
            return CycleOutcome::Superseded;
        }

        log::debug!("Cycle {ticket} publishes {state:?}");
        *shown_ticket = ticket;
        self.store.set(state);
        self.counters.published.fetch_add(1, Ordering::Relaxed);

        CycleOutcome::Published
    }
}

/// Keeps the display state in sync with the feed.
///
/// A repeating timer runs a cycle every interval while the loop is started, and [`refresh`]
/// runs one on demand. Cycles may overlap; the snapshot of the most recently started successful
/// cycle is the one that stays visible. A failed cycle leaves the display state untouched.
///
/// [`refresh`]: AcquisitionLoop::refresh
pub struct AcquisitionLoop {
    acquisition: Arc<Acquisition>,
    interval: Duration,
    timer: Option<JoinHandle<()>>,
}

impl AcquisitionLoop {
    /// Creates a stopped loop that labels samples with the local clock.
    pub fn new(
        client: FeedClientPointer,
        store: ValueStore<DisplayState>,
        interval: Duration,
    ) -> Self {
        Self::with_clock(client, store, interval, Arc::new(LocalClock))
    }

    /// Creates a stopped loop. Intervals below [`MIN_INTERVAL`] are raised to it.
    pub fn with_clock(
        client: FeedClientPointer,
        store: ValueStore<DisplayState>,
        interval: Duration,
        clock: ClockPointer,
    ) -> Self {
        if interval < MIN_INTERVAL {
            log::warn!("Refresh interval {interval:?} is too short, using {MIN_INTERVAL:?}");
        }

        Self {
            acquisition: Arc::new(Acquisition {
                client,
                clock,
                store,
                next_ticket: AtomicU64::new(0),
                shown_ticket: Mutex::new(0),
                counters: Counters::default(),
            }),
            interval: interval.max(MIN_INTERVAL),
            timer: None,
        }
    }

    /// Starts the repeating timer. The first cycle runs one interval from now.
    ///
    /// Must be called from within a tokio runtime.
    pub fn start(&mut self) {
        if self.is_running() {
            log::warn!("Acquisition loop is already running");
            return;
        }

        let acquisition = self.acquisition.clone();
        let period = self.interval;

        self.timer = Some(tokio::spawn(async move {
            let mut ticker = tokio::time::interval_at(Instant::now() + period, period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

            loop {
                ticker.tick().await;
                let ticket = acquisition.take_ticket();
                let _ = acquisition.run_cycle(ticket).await;
            }
        }));

        log::info!("Acquisition loop started, refreshing every {:?}", period);
    }

    /// Stops the timer. Once this returns, the timer makes no further feed requests.
    pub async fn stop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
            let _ = timer.await;
            log::info!("Acquisition loop stopped");
        }
    }

    pub fn is_running(&self) -> bool {
        self.timer.as_ref().is_some_and(|timer| !timer.is_finished())
    }

    /// Runs one cycle in the background, regardless of the timer.
    pub fn refresh(&self) -> JoinHandle<Result<CycleOutcome, FeedError>> {
        let acquisition = self.acquisition.clone();
        let ticket = acquisition.take_ticket();

        tokio::spawn(async move { acquisition.run_cycle(ticket).await })
    }

    /// Runs one cycle and waits for it. Failures are logged and returned; the display state is
    /// only replaced on success.
    pub async fn run_cycle(&self) -> Result<CycleOutcome, FeedError> {
        let ticket = self.acquisition.take_ticket();
        self.acquisition.run_cycle(ticket).await
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn store(&self) -> &ValueStore<DisplayState> {
        &self.acquisition.store
    }

    pub fn stats(&self) -> CycleStats {
        let counters = &self.acquisition.counters;

        CycleStats {
            started: counters.started.load(Ordering::Relaxed),
            published: counters.published.load(Ordering::Relaxed),
            superseded: counters.superseded.load(Ordering::Relaxed),
            failed: counters.failed.load(Ordering::Relaxed),
        }
    }
}

impl Drop for AcquisitionLoop {
    fn drop(&mut self) {
        if let Some(timer) = self.timer.take() {
            timer.abort();
        }
    }
}
