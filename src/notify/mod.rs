// src/notify/mod.rs
mod log_sink;
mod smtp;

use std::fmt::Write;
use async_trait::async_trait;
use chrono::{DateTime, Local};
use serde::{Serialize, Deserialize};

use crate::core::{ChangeEvent, DegradedTarget};
use crate::error::PageWatchResult;

pub use log_sink::LogSink;
pub use smtp::SmtpSink;

const TIME_FORMAT: &str = "%H:%M:%S";

/// A message ready for delivery
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Notification {
    pub subject: String,
    pub body: String,
}

/// Delivers notifications to the operator
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait NotificationSink: Send + Sync {
    async fn send(&self, notification: &Notification) -> PageWatchResult<()>;
}

fn stamp(at: &DateTime<Local>) -> String {
    at.format(TIME_FORMAT).to_string()
}

impl Notification {
    /// One notification for a single change
    pub fn for_change(event: &ChangeEvent) -> Self {
        Self {
            subject: format!("[{}] {} changed", stamp(&event.detected_at), event.address),
            body: format!("The following change was detected.\n\n{}", event.diff),
        }
    }

    /// One notification covering every change of a polling cycle, `None` when nothing changed
    pub fn for_batch(events: &[ChangeEvent]) -> Option<Self> {
        match events {
            [] => None,
            [event] => Some(Self::for_change(event)),
            _ => {
                let latest = events.iter().map(|e| e.detected_at).max()?;
                let mut body = String::from("The following changes were detected.\n\n");
                for event in events {
                    let _ = writeln!(body, "[{}] {}", stamp(&event.detected_at), event.address);
                }
                for event in events {
                    let _ = write!(body, "\n== {} ==\n{}", event.address, event.diff);
                }

                Some(Self {
                    subject: format!("[{}] {} pages changed", stamp(&latest), events.len()),
                    body,
                })
            }
        }
    }

    /// Append the list of targets that are no longer watched
    pub fn with_degraded(mut self, degraded: &[DegradedTarget]) -> Self {
        if degraded.is_empty() {
            return self;
        }

        self.body.push_str("\nNo longer watched:\n");
        for target in degraded {
            let _ = writeln!(self.body, "- {}: {}", target.address, target.reason);
        }
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use crate::core::UnifiedDiff;

    fn event(address: &str, old: &str, new: &str, second: u32) -> ChangeEvent {
        ChangeEvent {
            address: address.to_string(),
            detected_at: Local.with_ymd_and_hms(2024, 5, 1, 9, 30, second).unwrap(),
            diff: UnifiedDiff::between(old, new, 0),
        }
    }

    #[test]
    fn test_single_change() {
        let notification = Notification::for_change(&event("site1", "<p>hi</p>", "<p>bye</p>", 5));

        assert_eq!(notification.subject, "[09:30:05] site1 changed");
        assert!(notification.body.starts_with("The following change was detected."));
        assert!(notification.body.contains("-<p>hi</p>"));
        assert!(notification.body.contains("+<p>bye</p>"));
    }

    #[test]
    fn test_batch_lists_every_target() {
        let events = vec![
            event("site1", "a\n", "b\n", 1),
            event("site2", "x\n", "y\n", 2),
        ];

        let notification = Notification::for_batch(&events).unwrap();

        assert_eq!(notification.subject, "[09:30:02] 2 pages changed");
        assert!(notification.body.contains("[09:30:01] site1\n"));
        assert!(notification.body.contains("[09:30:02] site2\n"));
        assert!(notification.body.contains("== site1 ==\n--- Before"));
        assert!(notification.body.contains("+y\n"));
    }

    #[test]
    fn test_batch_edge_sizes() {
        assert!(Notification::for_batch(&[]).is_none());

        let single = event("site1", "a\n", "b\n", 1);
        assert_eq!(
            Notification::for_batch(std::slice::from_ref(&single)),
            Some(Notification::for_change(&single))
        );
    }

    #[test]
    fn test_degraded_footer() {
        let degraded = vec![DegradedTarget {
            address: "site3".to_string(),
            reason: "Status code error: site3 - 404".to_string(),
        }];

        let plain = Notification::for_change(&event("site1", "a", "b", 0));
        let with_footer = plain.clone().with_degraded(&degraded);

        assert_eq!(plain.clone().with_degraded(&[]), plain);
        assert!(with_footer.body.ends_with("No longer watched:\n- site3: Status code error: site3 - 404\n"));
    }
}
