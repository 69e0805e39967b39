// src/app.rs
use std::sync::Arc;
use futures::future::join_all;
use serde::Serialize;
use tracing::info;

use crate::config::Config;
use crate::core::Target;
use crate::engine::{Dispatcher, RunSummary, Shutdown, WatchSettings};
use crate::error::PageWatchResult;
use crate::notify::{LogSink, NotificationSink, SmtpSink};
use crate::source::{HttpSnapshotSource, SnapshotSource};

/// Result of fetching one target during `check`
#[derive(Debug, Clone, Serialize)]
pub struct CheckReport {
    pub address: String,
    pub selector: String,
    pub bytes: Option<usize>,
    pub error: Option<String>,
}

/// Main application struct: the loaded configuration and the commands run against it
pub struct App {
    config: Config,
}

impl App {
    /// Create a new application instance
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Targets built from the watch list, selectors defaulted
    pub fn targets(&self) -> Vec<Target> {
        self.config.watch.iter().map(Target::from_config).collect()
    }

    /// Watch every configured page until `shutdown` fires or a fatal error occurs.
    ///
    /// With `dry_run` notifications are logged instead of mailed.
    pub async fn run(&self, dry_run: bool, shutdown: Shutdown) -> PageWatchResult<RunSummary> {
        self.config.validate(!dry_run)?;

        let source: Arc<dyn SnapshotSource> = Arc::new(HttpSnapshotSource::from_config(&self.config.http)?);
        let sink: Arc<dyn NotificationSink> = if dry_run {
            info!("Dry run, notifications are only logged");
            Arc::new(LogSink)
        } else {
            Arc::new(SmtpSink::from_config(&self.config.smtp)?)
        };

        self.run_with(source, sink, shutdown).await
    }

    /// Same as [`App::run`] with caller-provided collaborators
    pub async fn run_with(
        &self,
        source: Arc<dyn SnapshotSource>,
        sink: Arc<dyn NotificationSink>,
        shutdown: Shutdown,
    ) -> PageWatchResult<RunSummary> {
        let settings = WatchSettings::from_config(&self.config)?;
        info!(
            "Polling {} pages every {:?} ({:?}, on failure: {:?})",
            self.config.watch.len(), settings.delay, settings.dispatch, settings.on_failure
        );

        Dispatcher::new(source, sink, settings)
            .run(self.targets(), shutdown)
            .await
    }

    /// Fetch every page once without notifying, to try out addresses and selectors
    pub async fn check(&self) -> PageWatchResult<Vec<CheckReport>> {
        self.config.validate(false)?;
        let source = HttpSnapshotSource::from_config(&self.config.http)?;
        Ok(self.check_with(&source).await)
    }

    pub async fn check_with(&self, source: &dyn SnapshotSource) -> Vec<CheckReport> {
        let targets = self.targets();
        let fetches = targets.iter().map(move |target| async move {
            let result = source.fetch(target.address(), target.selector()).await;
            CheckReport {
                address: target.address().to_string(),
                selector: target.selector().to_string(),
                bytes: result.as_ref().ok().map(String::len),
                error: result.err().map(|e| e.to_string()),
            }
        });

        join_all(fetches).await
    }
}
