// src/engine/watch.rs
use std::sync::Arc;
use std::time::Duration;
use chrono::Local;
use tokio::sync::mpsc;
use tracing::{debug, error, warn};

use crate::config::FailurePolicy;
use crate::core::{detect, ChangeEvent, Target};
use crate::error::{PageWatchError, PageWatchResult};
use crate::source::SnapshotSource;

use super::{Shutdown, WatchSettings};

/// Fetch a target once, run change detection and store the result
pub async fn poll_target(
    target: &mut Target,
    source: &dyn SnapshotSource,
    diff_context: usize,
) -> PageWatchResult<Option<ChangeEvent>> {
    debug!("Polling {} ({})", target.address(), target.selector());

    let content = source.fetch(target.address(), target.selector()).await?;
    let outcome = detect(target, &content, diff_context);

    Ok(target.apply(outcome, Local::now()))
}

/// Drives one target through fetch, detect and sleep until shutdown or failure
pub struct WatchLoop {
    target: Target,
    source: Arc<dyn SnapshotSource>,
    delay: Duration,
    diff_context: usize,
    on_failure: FailurePolicy,
    events: mpsc::Sender<ChangeEvent>,
    shutdown: Shutdown,
}

impl WatchLoop {
    pub fn new(
        target: Target,
        source: Arc<dyn SnapshotSource>,
        settings: &WatchSettings,
        events: mpsc::Sender<ChangeEvent>,
        shutdown: Shutdown,
    ) -> Self {
        Self {
            target,
            source,
            delay: settings.delay,
            diff_context: settings.diff_context,
            on_failure: settings.on_failure,
            events,
            shutdown,
        }
    }

    /// Run until shutdown, returning the target's final state.
    ///
    /// A fetch error either fails the loop and fires the shutdown signal (`exit`)
    /// or degrades the target and ends the loop quietly (`isolate`). Any other
    /// error is always fatal.
    pub async fn run(mut self) -> PageWatchResult<Target> {
        loop {
            match poll_target(&mut self.target, self.source.as_ref(), self.diff_context).await {
                Ok(Some(event)) => {
                    if self.events.send(event).await.is_err() {
                        debug!("Dispatcher is gone, stopping watch on {}", self.target.address());
                        return Ok(self.target);
                    }
                }
                Ok(None) => {}
                Err(e) => return self.fail(e),
            }

            tokio::select! {
                _ = tokio::time::sleep(self.delay) => {}
                _ = self.shutdown.wait() => {
                    debug!("Stopping watch on {}", self.target.address());
                    return Ok(self.target);
                }
            }
        }
    }

    fn fail(mut self, error: PageWatchError) -> PageWatchResult<Target> {
        match self.on_failure {
            FailurePolicy::Isolate if error.is_fetch_error() => {
                warn!("Watching {} failed, no longer watched: {}", self.target.address(), error);
                self.target.degrade(error.to_string());
                Ok(self.target)
            }
            _ => {
                error!("Watching {} failed: {}", self.target.address(), error);
                self.shutdown.trigger(format!("watching {} failed", self.target.address()));
                Err(error)
            }
        }
    }
}
