pub mod app;
pub mod config;
pub mod core;
pub mod engine;
pub mod error;
pub mod notify;
pub mod source;
pub mod utils;

// Re-export main types for easier access
pub use app::App;
pub use config::Config;
pub use core::{
    ChangeEvent,
    Outcome,
    Target,
    UnifiedDiff
};
pub use engine::{Dispatcher, RunSummary, Shutdown};
pub use error::{PageWatchError, PageWatchResult};
pub use notify::{Notification, NotificationSink};
pub use source::SnapshotSource;
