// src/core/target.rs
use chrono::{DateTime, Local};
use serde::{Serialize, Deserialize};

use crate::config::WatchConfig;

/// Selector used when a target does not name one
pub const DEFAULT_SELECTOR: &str = "body";

/// Health of a target's monitoring
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum TargetState {
    Active,
    Degraded(String),
}

/// A target that stopped being watched, and why
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DegradedTarget {
    pub address: String,
    pub reason: String,
}

/// One watched page and everything remembered about it between polls
#[derive(Debug, Clone)]
pub struct Target {
    address: String,
    selector: String,
    last_content: String,
    baseline_established: bool,
    last_changed_at: Option<DateTime<Local>>,
    state: TargetState,
}

impl Target {
    /// Create a target, falling back to the whole document when no selector is given
    pub fn new(address: impl Into<String>, selector: Option<&str>) -> Self {
        let selector = selector
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .unwrap_or(DEFAULT_SELECTOR);

        Self {
            address: address.into(),
            selector: selector.to_string(),
            last_content: String::new(),
            baseline_established: false,
            last_changed_at: None,
            state: TargetState::Active,
        }
    }

    pub fn from_config(config: &WatchConfig) -> Self {
        Self::new(config.address.clone(), config.selector.as_deref())
    }

    pub fn address(&self) -> &str {
        &self.address
    }

    pub fn selector(&self) -> &str {
        &self.selector
    }

    pub fn last_content(&self) -> &str {
        &self.last_content
    }

    pub fn baseline_established(&self) -> bool {
        self.baseline_established
    }

    pub fn last_changed_at(&self) -> Option<DateTime<Local>> {
        self.last_changed_at
    }

    pub fn state(&self) -> &TargetState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state == TargetState::Active
    }

    pub fn degraded(&self) -> Option<DegradedTarget> {
        match &self.state {
            TargetState::Active => None,
            TargetState::Degraded(reason) => Some(DegradedTarget {
                address: self.address.clone(),
                reason: reason.clone(),
            }),
        }
    }

    /// Record the first observation. Later calls are ignored; the baseline is set once.
    pub(crate) fn record_baseline(&mut self, content: String, at: DateTime<Local>) {
        if self.baseline_established {
            return;
        }
        self.last_content = content;
        self.last_changed_at = Some(at);
        self.baseline_established = true;
    }

    pub(crate) fn record_change(&mut self, content: String, at: DateTime<Local>) {
        self.last_content = content;
        self.last_changed_at = Some(at);
    }

    pub(crate) fn degrade(&mut self, reason: impl Into<String>) {
        self.state = TargetState::Degraded(reason.into());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_selector_defaults_to_body() {
        assert_eq!(Target::new("site1", None).selector(), "body");
        assert_eq!(Target::new("site1", Some("  ")).selector(), "body");
        assert_eq!(Target::new("site1", Some("#stock")).selector(), "#stock");
    }

    #[test]
    fn test_baseline_is_recorded_once() {
        let mut target = Target::new("site1", None);
        assert!(!target.baseline_established());
        assert_eq!(target.last_content(), "");

        target.record_baseline("<p>hi</p>".to_string(), Local::now());
        target.record_baseline("<p>other</p>".to_string(), Local::now());

        assert!(target.baseline_established());
        assert_eq!(target.last_content(), "<p>hi</p>");
    }

    #[test]
    fn test_degrade_keeps_reason() {
        let mut target = Target::new("site1", None);
        target.degrade("status 404");

        assert!(!target.is_active());
        assert_eq!(target.state(), &TargetState::Degraded("status 404".to_string()));
        assert_eq!(target.degraded().unwrap().reason, "status 404");
    }
}
