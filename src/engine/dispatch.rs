// src/engine/dispatch.rs
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio::task::{JoinError, JoinSet};
use tracing::{debug, error, info, warn};

use crate::config::DispatchMode;
use crate::core::{ChangeEvent, Target};
use crate::error::{PageWatchError, PageWatchResult};
use crate::notify::{Notification, NotificationSink};
use crate::source::SnapshotSource;

use super::{RunSummary, Shutdown, WatchLoop, WatchSettings};

/// Runs the watchers and turns their change events into notifications
pub struct Dispatcher {
    pub(super) source: Arc<dyn SnapshotSource>,
    pub(super) sink: Arc<dyn NotificationSink>,
    pub(super) settings: WatchSettings,
}

fn joined<T>(result: Result<PageWatchResult<T>, JoinError>) -> PageWatchResult<T> {
    result.map_err(|e| PageWatchError::Unexpected(format!("Task failed: {}", e)))?
}

/// Send one notification, logging its subject first
pub(super) async fn deliver(sink: &dyn NotificationSink, notification: &Notification) -> PageWatchResult<()> {
    info!("{}", notification.subject);
    sink.send(notification).await.map_err(|e| {
        error!("Delivery failed: {}", e);
        e
    })
}

impl Dispatcher {
    pub fn new(
        source: Arc<dyn SnapshotSource>,
        sink: Arc<dyn NotificationSink>,
        settings: WatchSettings,
    ) -> Self {
        Self { source, sink, settings }
    }

    /// Watch `targets` until `shutdown` fires or a fatal error occurs
    pub async fn run(&self, targets: Vec<Target>, shutdown: Shutdown) -> PageWatchResult<RunSummary> {
        if targets.is_empty() {
            return Err(PageWatchError::Config("No pages to watch".to_string()));
        }

        match self.settings.dispatch {
            DispatchMode::PerEvent => self.run_per_event(targets, shutdown).await,
            DispatchMode::Batched => self.run_batched(targets, shutdown).await,
        }
    }

    /// One task per target feeding a bounded queue; every change is mailed on its own
    async fn run_per_event(&self, targets: Vec<Target>, shutdown: Shutdown) -> PageWatchResult<RunSummary> {
        let total = targets.len();
        let (tx, mut rx) = mpsc::channel::<ChangeEvent>(self.settings.queue_capacity);

        let mut watchers = JoinSet::new();
        for target in targets {
            let watch = WatchLoop::new(target, self.source.clone(), &self.settings, tx.clone(), shutdown.clone());
            watchers.spawn(watch.run());
        }
        drop(tx);
        info!("Watching {} targets, one notification per change", total);

        let mut summary = RunSummary::default();
        let mut deliveries: JoinSet<PageWatchResult<()>> = JoinSet::new();
        let mut failure: Option<PageWatchError> = None;

        loop {
            tokio::select! {
                _ = shutdown.wait() => break,
                Some(event) = rx.recv() => self.dispatch_event(event, &mut summary, &mut deliveries),
                Some(result) = deliveries.join_next() => match joined(result) {
                    Ok(()) => summary.notifications_sent += 1,
                    Err(e) => {
                        shutdown.trigger("notification delivery failed");
                        failure = Some(e);
                        break;
                    }
                },
                Some(result) = watchers.join_next() => match joined(result) {
                    Ok(target) => {
                        if let Some(degraded) = target.degraded() {
                            summary.degraded.push(degraded);
                        }
                        if watchers.is_empty() && !shutdown.is_triggered() {
                            error!("Every target is degraded, stopping");
                            shutdown.trigger("no targets left");
                            failure = Some(PageWatchError::AllTargetsDegraded(total));
                            break;
                        }
                    }
                    Err(e) => {
                        shutdown.trigger("a watcher failed");
                        failure = Some(e);
                        break;
                    }
                },
            }
        }

        // Stop the watchers, keeping the first error any of them finished with
        watchers.abort_all();
        while let Some(result) = watchers.join_next().await {
            match result {
                Ok(Ok(target)) => {
                    if let Some(degraded) = target.degraded() {
                        summary.degraded.push(degraded);
                    }
                }
                Ok(Err(e)) => {
                    failure.get_or_insert(e);
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    failure.get_or_insert(PageWatchError::Unexpected(format!("Task failed: {}", e)));
                }
            }
        }

        let failure = self.finish_deliveries(rx, deliveries, &mut summary, failure).await;

        debug!("Dispatcher stopped: {:?}", summary);
        match failure {
            Some(e) => Err(e),
            None => Ok(summary),
        }
    }

    /// Deliver the changes still queued and wait for the deliveries in flight.
    ///
    /// After a delivery failure nothing more is sent: queued changes are dropped
    /// and pending deliveries cancelled.
    async fn finish_deliveries(
        &self,
        mut rx: mpsc::Receiver<ChangeEvent>,
        mut deliveries: JoinSet<PageWatchResult<()>>,
        summary: &mut RunSummary,
        mut failure: Option<PageWatchError>,
    ) -> Option<PageWatchError> {
        rx.close();
        if matches!(failure, Some(PageWatchError::Delivery(_))) {
            deliveries.abort_all();
            let mut dropped = 0;
            while rx.recv().await.is_some() {
                dropped += 1;
            }
            if dropped > 0 {
                warn!("Dropping {} queued changes after delivery failure", dropped);
            }
        } else {
            while let Some(event) = rx.recv().await {
                self.dispatch_event(event, summary, &mut deliveries);
            }
        }

        while let Some(result) = deliveries.join_next().await {
            match result {
                Ok(Ok(())) => summary.notifications_sent += 1,
                Ok(Err(e)) => {
                    failure.get_or_insert(e);
                }
                Err(e) if e.is_cancelled() => {}
                Err(e) => {
                    failure.get_or_insert(PageWatchError::Unexpected(format!("Task failed: {}", e)));
                }
            }
        }

        failure
    }

    fn dispatch_event(
        &self,
        event: ChangeEvent,
        summary: &mut RunSummary,
        deliveries: &mut JoinSet<PageWatchResult<()>>,
    ) {
        summary.changes += 1;
        let notification = Notification::for_change(&event).with_degraded(&summary.degraded);
        let sink = self.sink.clone();
        deliveries.spawn(async move { deliver(sink.as_ref(), &notification).await });
    }
}
