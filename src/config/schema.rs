use serde::{Serialize, Deserialize};

/// Main configuration structure
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Pause between polls, in minutes
    pub delay_minutes: f64,

    #[serde(default)]
    pub dispatch: DispatchMode,

    #[serde(default)]
    pub on_failure: FailurePolicy,

    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: usize,

    #[serde(default)]
    pub diff_context: usize,

    #[serde(default)]
    pub http: HttpConfig,

    #[serde(default)]
    pub smtp: SmtpConfig,

    #[serde(default)]
    pub watch: Vec<WatchConfig>,
}

/// How change events become notifications
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum DispatchMode {
    /// One notification per change, sent as soon as it is seen
    #[default]
    PerEvent,
    /// All targets polled in lock-step, one notification per cycle
    Batched,
}

/// What a fetch error does to the run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FailurePolicy {
    #[default]
    Exit,
    Isolate,
}

/// HTTP client settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpConfig {
    #[serde(default = "default_user_agent")]
    pub user_agent: String,
    #[serde(default = "default_timeout_seconds")]
    pub timeout_seconds: u64,
}

/// Outbound mail settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SmtpConfig {
    pub host: String,
    pub port: u16,
    #[serde(default)]
    pub security: SmtpSecurity,
    pub user: String,
    pub pass: String,
    pub from: String,
    pub to: Vec<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SmtpSecurity {
    #[default]
    StartTls,
    Tls,
    Plain,
}

/// One page to watch
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WatchConfig {
    pub address: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub selector: Option<String>,
}

fn default_queue_capacity() -> usize {
    64
}

fn default_user_agent() -> String {
    format!("pagewatch/{}", env!("CARGO_PKG_VERSION"))
}

fn default_timeout_seconds() -> u64 {
    30
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            user_agent: default_user_agent(),
            timeout_seconds: default_timeout_seconds(),
        }
    }
}

impl Default for SmtpConfig {
    fn default() -> Self {
        Self {
            host: String::new(),
            port: 587,
            security: SmtpSecurity::StartTls,
            user: String::new(),
            pass: String::new(),
            from: String::new(),
            to: Vec::new(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            delay_minutes: 5.0,
            dispatch: DispatchMode::default(),
            on_failure: FailurePolicy::default(),
            queue_capacity: default_queue_capacity(),
            diff_context: 0,
            http: HttpConfig::default(),
            smtp: SmtpConfig::default(),
            watch: Vec::new(),
        }
    }
}

impl Config {
    /// A starting point written by `pagewatch init`
    pub fn sample() -> Self {
        Self {
            smtp: SmtpConfig {
                host: "smtp.example.com".to_string(),
                user: "watcher".to_string(),
                from: "watcher@example.com".to_string(),
                to: vec!["me@example.com".to_string()],
                ..SmtpConfig::default()
            },
            watch: vec![WatchConfig {
                address: "https://example.com".to_string(),
                selector: Some("body".to_string()),
            }],
            ..Self::default()
        }
    }
}
