// src/source/mod.rs
mod html;

use async_trait::async_trait;

use crate::error::PageWatchResult;

pub use html::{extract, HttpSnapshotSource};

/// Produces the current content of a target
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SnapshotSource: Send + Sync {
    /// Fetch `address` and return the part of it selected by `selector`
    async fn fetch(&self, address: &str, selector: &str) -> PageWatchResult<String>;
}
