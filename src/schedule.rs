//! Fixed-interval trigger for ingestion cycles.
//!
//! Each cycle runs to completion before the next wait starts, so at most one
//! cycle is ever in flight. A cycle that overruns its slot skips the ticks it
//! missed instead of firing them back to back.

use crate::ingest::Ingestor;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::watch;
use tokio::time::{sleep_until, Instant};
use tracing::{error, info};

/// Read side of the scheduler, answering "when is the next run?"
#[derive(Debug, Clone)]
pub struct ScheduleHandle {
    next_run: watch::Receiver<Option<Instant>>,
}

impl ScheduleHandle {
    /// Time left until the next cycle starts; `None` while a cycle is running
    /// or before the scheduler has started.
    pub fn time_until_next(&self) -> Option<Duration> {
        self.next_run
            .borrow()
            .map(|at| at.saturating_duration_since(Instant::now()))
    }
}

pub struct Scheduler {
    period: Duration,
    run_immediately: bool,
    next_run: watch::Sender<Option<Instant>>,
}

impl Scheduler {
    pub fn new(period: Duration) -> Self {
        let (next_run, _) = watch::channel(None);
        Self {
            period,
            run_immediately: true,
            next_run,
        }
    }

    /// Wait a full period before the first cycle
    pub fn delay_first_run(mut self) -> Self {
        self.run_immediately = false;
        self
    }

    pub fn handle(&self) -> ScheduleHandle {
        ScheduleHandle {
            next_run: self.next_run.subscribe(),
        }
    }

    /// Run cycles until `shutdown` flips to true or its sender goes away
    pub async fn run(&self, ingestor: Arc<Ingestor>, mut shutdown: watch::Receiver<bool>) {
        let mut next = if self.run_immediately {
            Instant::now()
        } else {
            Instant::now() + self.period
        };
        info!(period_secs = self.period.as_secs(), "Scheduler started");

        loop {
            self.next_run.send_replace(Some(next));

            tokio::select! {
                _ = sleep_until(next) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                    continue;
                }
            }

            self.next_run.send_replace(None);
            if let Err(e) = ingestor.run_cycle().await {
                error!(error = %e, "Ingestion cycle failed");
            }

            next += self.period;
            let now = Instant::now();
            if next <= now {
                let behind = now.duration_since(next);
                let skipped = behind.as_nanos() / self.period.as_nanos().max(1) + 1;
                next += self.period * skipped as u32;
                info!(skipped, "Cycle overran its slot, skipping missed runs");
            }
        }

        self.next_run.send_replace(None);
        info!("Scheduler stopped");
    }
}
