// src/notify/log_sink.rs
use async_trait::async_trait;
use tracing::info;

use crate::error::PageWatchResult;

use super::{Notification, NotificationSink};

/// Writes notifications to the log instead of mailing them (dry runs)
#[derive(Debug, Default, Clone, Copy)]
pub struct LogSink;

#[async_trait]
impl NotificationSink for LogSink {
    async fn send(&self, notification: &Notification) -> PageWatchResult<()> {
        info!("{}\n{}", notification.subject, notification.body);
        Ok(())
    }
}
