// src/core/detector.rs
use chrono::{DateTime, Local};
use tracing::{debug, info};

use super::diff::UnifiedDiff;
use super::target::Target;

/// What a freshly fetched snapshot means for a target
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// First successful observation; nothing to compare against yet
    Baseline { content: String },
    Unchanged,
    Changed { diff: UnifiedDiff, content: String },
}

/// A detected change on one target
#[derive(Debug, Clone)]
pub struct ChangeEvent {
    pub address: String,
    pub detected_at: DateTime<Local>,
    pub diff: UnifiedDiff,
}

/// Compare a target's stored content with newly fetched content.
///
/// Pure: the target is only read. Use [`Target::apply`] to store the result.
pub fn detect(target: &Target, new_content: &str, context: usize) -> Outcome {
    if !target.baseline_established() {
        return Outcome::Baseline {
            content: new_content.to_string(),
        };
    }

    if target.last_content() == new_content {
        return Outcome::Unchanged;
    }

    Outcome::Changed {
        diff: UnifiedDiff::between(target.last_content(), new_content, context),
        content: new_content.to_string(),
    }
}

impl Target {
    /// Store a detection outcome, returning the change event to report, if any
    pub fn apply(&mut self, outcome: Outcome, at: DateTime<Local>) -> Option<ChangeEvent> {
        match outcome {
            Outcome::Baseline { content } => {
                self.record_baseline(content, at);
                info!("[registered] {}", self.address());
                None
            }
            Outcome::Unchanged => {
                debug!("No change on {}", self.address());
                None
            }
            Outcome::Changed { diff, content } => {
                self.record_change(content, at);
                let (added, removed) = diff.line_counts();
                info!("[changed] {} (+{} -{})", self.address(), added, removed);
                Some(ChangeEvent {
                    address: self.address().to_string(),
                    detected_at: at,
                    diff,
                })
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::diff::DiffLine;

    fn observe(target: &mut Target, content: &str) -> (bool, Option<ChangeEvent>) {
        let outcome = detect(target, content, 0);
        let unchanged = outcome == Outcome::Unchanged;
        (unchanged, target.apply(outcome, Local::now()))
    }

    #[test]
    fn test_first_fetch_is_baseline() {
        let target = Target::new("site1", None);

        assert_eq!(
            detect(&target, "<p>hi</p>", 0),
            Outcome::Baseline { content: "<p>hi</p>".to_string() }
        );
    }

    #[test]
    fn test_baseline_unchanged_changed_sequence() {
        let mut target = Target::new("site1", None);

        // Baseline: nothing reported, content stored
        let (_, event) = observe(&mut target, "<p>hi</p>");
        assert!(event.is_none());
        assert!(target.baseline_established());
        assert_eq!(target.last_content(), "<p>hi</p>");

        // Same content again
        let (unchanged, event) = observe(&mut target, "<p>hi</p>");
        assert!(unchanged);
        assert!(event.is_none());

        // Real change
        let (_, event) = observe(&mut target, "<p>bye</p>");
        let event = event.expect("change should be reported");
        assert_eq!(event.address, "site1");
        assert_eq!(target.last_content(), "<p>bye</p>");
        assert_eq!(target.last_changed_at(), Some(event.detected_at));

        let lines = &event.diff.hunks()[0].lines;
        assert!(lines.contains(&DiffLine::Removed("<p>hi</p>".to_string())));
        assert!(lines.contains(&DiffLine::Added("<p>bye</p>".to_string())));
    }

    #[test]
    fn test_empty_first_fetch_still_sets_baseline() {
        let mut target = Target::new("site1", Some("#missing"));

        let (_, event) = observe(&mut target, "");
        assert!(event.is_none());
        assert!(target.baseline_established());

        let (_, event) = observe(&mut target, "<span>now here</span>");
        assert!(event.is_some());
    }

    #[test]
    fn test_change_diff_patches_old_into_new() {
        let mut target = Target::new("site1", None);
        observe(&mut target, "<li>a</li>\n<li>b</li>\n");

        let old = target.last_content().to_string();
        let new = "<li>a</li>\n<li>c</li>\n<li>b</li>\n";
        let (_, event) = observe(&mut target, new);

        assert_eq!(event.unwrap().diff.apply(&old).unwrap(), new);
    }

    #[test]
    fn test_detect_does_not_touch_target() {
        let mut target = Target::new("site1", None);
        observe(&mut target, "old");

        let outcome = detect(&target, "new", 0);
        assert!(matches!(outcome, Outcome::Changed { .. }));
        assert_eq!(target.last_content(), "old");
    }
}
