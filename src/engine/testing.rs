// src/engine/testing.rs
//! Scripted collaborators for exercising the loops without a network
use std::collections::HashMap;
use std::sync::Mutex;
use std::time::Duration;
use async_trait::async_trait;

use crate::error::{PageWatchError, PageWatchResult};
use crate::notify::{Notification, NotificationSink};
use crate::source::SnapshotSource;

#[derive(Debug, Clone)]
enum Step {
    Content(String),
    Status(u16),
}

#[derive(Debug, Default)]
struct Script {
    steps: Vec<Step>,
    fetches: usize,
}

/// Plays back a fixed sequence of responses per address, repeating the last one forever
#[derive(Debug, Default)]
pub struct ScriptedSource {
    scripts: Mutex<HashMap<String, Script>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn script(self, address: &str, contents: &[&str]) -> Self {
        self.push(address, contents.iter().map(|c| Step::Content(c.to_string())));
        self
    }

    /// After the scripted contents, answer with an HTTP status error
    pub fn then_status(self, address: &str, status: u16) -> Self {
        self.push(address, std::iter::once(Step::Status(status)));
        self
    }

    fn push(&self, address: &str, steps: impl Iterator<Item = Step>) {
        let mut scripts = self.scripts.lock().unwrap();
        scripts.entry(address.to_string()).or_default().steps.extend(steps);
    }

    pub fn fetches(&self, address: &str) -> usize {
        self.scripts.lock().unwrap().get(address).map_or(0, |s| s.fetches)
    }
}

#[async_trait]
impl SnapshotSource for ScriptedSource {
    async fn fetch(&self, address: &str, _selector: &str) -> PageWatchResult<String> {
        let step = {
            let mut scripts = self.scripts.lock().unwrap();
            let script = scripts.get_mut(address).expect("address has no script");
            let index = script.fetches.min(script.steps.len() - 1);
            script.fetches += 1;
            script.steps[index].clone()
        };

        match step {
            Step::Content(content) => Ok(content),
            Step::Status(status) => Err(PageWatchError::Status {
                address: address.to_string(),
                status,
            }),
        }
    }
}

/// Keeps every notification it is given
#[derive(Debug, Default)]
pub struct RecordingSink {
    sent: Mutex<Vec<Notification>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn sent(&self) -> Vec<Notification> {
        self.sent.lock().unwrap().clone()
    }

    pub fn count(&self) -> usize {
        self.sent.lock().unwrap().len()
    }
}

#[async_trait]
impl NotificationSink for RecordingSink {
    async fn send(&self, notification: &Notification) -> PageWatchResult<()> {
        self.sent.lock().unwrap().push(notification.clone());
        Ok(())
    }
}

/// Let the paused clock run for `minutes`
pub async fn advance_minutes(minutes: u64) {
    tokio::time::sleep(Duration::from_secs(minutes * 60)).await;
}
