// src/engine/mod.rs
mod cycle;
mod dispatch;
mod shutdown;
mod watch;

#[cfg(test)]
pub(crate) mod testing;

use std::time::Duration;
use serde::Serialize;

use crate::config::{Config, DispatchMode, FailurePolicy};
use crate::core::DegradedTarget;
use crate::error::PageWatchResult;

pub use dispatch::Dispatcher;
pub use shutdown::Shutdown;
pub use watch::{poll_target, WatchLoop};

/// Runtime knobs shared read-only by every watch task
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WatchSettings {
    pub delay: Duration,
    pub diff_context: usize,
    pub dispatch: DispatchMode,
    pub on_failure: FailurePolicy,
    pub queue_capacity: usize,
}

impl WatchSettings {
    pub fn from_config(config: &Config) -> PageWatchResult<Self> {
        Ok(Self {
            delay: config.delay()?,
            diff_context: config.diff_context,
            dispatch: config.dispatch,
            on_failure: config.on_failure,
            queue_capacity: config.queue_capacity.max(1),
        })
    }
}

/// What a run did before it stopped
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct RunSummary {
    /// Change events seen by the dispatcher
    pub changes: usize,
    /// Notifications the sink accepted
    pub notifications_sent: usize,
    pub degraded: Vec<DegradedTarget>,
}
