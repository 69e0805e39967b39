// src/engine/cycle.rs
use futures::future::join_all;
use tracing::{debug, error, info, warn};

use crate::config::FailurePolicy;
use crate::core::{ChangeEvent, Target};
use crate::error::{PageWatchError, PageWatchResult};
use crate::notify::Notification;

use super::dispatch::{deliver, Dispatcher};
use super::{poll_target, RunSummary, Shutdown};

impl Dispatcher {
    /// Lock-step polling: every active target is fetched once per cycle and the
    /// cycle's changes go out as a single notification.
    ///
    /// One coordinating task owns all targets. Fetches inside a cycle run
    /// concurrently and the cycle only ends once all of them have returned.
    pub(super) async fn run_batched(&self, mut targets: Vec<Target>, shutdown: Shutdown) -> PageWatchResult<RunSummary> {
        let total = targets.len();
        let mut summary = RunSummary::default();
        let mut cycle: u64 = 0;

        info!("Watching {} targets, one notification per cycle", total);

        loop {
            cycle += 1;
            debug!("Cycle {} started", cycle);

            let events = self.poll_cycle(&mut targets, &mut summary, &shutdown).await?;
            summary.changes += events.len();

            if let Some(notification) = Notification::for_batch(&events) {
                let notification = notification.with_degraded(&summary.degraded);
                if let Err(e) = deliver(self.sink.as_ref(), &notification).await {
                    shutdown.trigger("notification delivery failed");
                    return Err(e);
                }
                summary.notifications_sent += 1;
            }

            if targets.iter().all(|target| !target.is_active()) {
                error!("Every target is degraded, stopping");
                shutdown.trigger("no targets left");
                return Err(PageWatchError::AllTargetsDegraded(total));
            }

            tokio::select! {
                _ = tokio::time::sleep(self.settings.delay) => {}
                _ = shutdown.wait() => {
                    debug!("Dispatcher stopped after {} cycles: {:?}", cycle, summary);
                    return Ok(summary);
                }
            }
        }
    }

    async fn poll_cycle(
        &self,
        targets: &mut [Target],
        summary: &mut RunSummary,
        shutdown: &Shutdown,
    ) -> PageWatchResult<Vec<ChangeEvent>> {
        let source = self.source.as_ref();
        let diff_context = self.settings.diff_context;

        let polls = targets
            .iter_mut()
            .filter(|target| target.is_active())
            .map(move |target| async move {
                let result = poll_target(target, source, diff_context).await;
                (target, result)
            });
        let results = join_all(polls).await;

        let mut events = Vec::new();
        for (target, result) in results {
            match result {
                Ok(Some(event)) => events.push(event),
                Ok(None) => {}
                Err(e) => match self.settings.on_failure {
                    FailurePolicy::Isolate if e.is_fetch_error() => {
                        warn!("Watching {} failed, no longer watched: {}", target.address(), e);
                        target.degrade(e.to_string());
                        summary.degraded.extend(target.degraded());
                    }
                    _ => {
                        error!("Watching {} failed: {}", target.address(), e);
                        shutdown.trigger(format!("watching {} failed", target.address()));
                        return Err(e);
                    }
                },
            }
        }

        Ok(events)
    }
}
