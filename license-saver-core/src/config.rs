//! Configuration management
//!
//! Settings come from an optional JSON file and from the command line, the
//! latter taking precedence:
//! ```json
//! {
//!   "tenant": "abcdefghij0123456789",
//!   "url": "https://editor.signavio.com",
//!   "user": "admin@example.com",
//!   "password": "...",
//!   "allowlist": ["keep@example.com"],
//!   "pollIntervalMs": 500,
//!   "maxPollErrors": 20
//! }
//! ```

use std::fmt;
use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use url::Url;

use crate::domain::result::{Error, Result};
use crate::domain::Allowlist;

const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);
const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(500);
const DEFAULT_MAX_POLL_ERRORS: u32 = 20;

/// Raw settings as read from a file or collected from CLI flags
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Settings {
    #[serde(default)]
    pub tenant: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub password: Option<String>,
    #[serde(default)]
    pub allowlist: Vec<String>,
    #[serde(default)]
    pub dry_run: Option<bool>,
    #[serde(default)]
    pub all_pages: Option<bool>,
    #[serde(default)]
    pub request_timeout_secs: Option<u64>,
    #[serde(default)]
    pub poll_interval_ms: Option<u64>,
    #[serde(default)]
    pub max_poll_errors: Option<u32>,
    #[serde(default)]
    pub poll_timeout_secs: Option<u64>,
}

impl Settings {
    /// Load settings from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        serde_json::from_str(&content)
            .map_err(|e| Error::config(format!("Invalid settings file {:?}: {}", path, e)))
    }

    /// Layer `overrides` on top of these settings
    pub fn merge(self, overrides: Settings) -> Settings {
        Settings {
            tenant: overrides.tenant.or(self.tenant),
            url: overrides.url.or(self.url),
            user: overrides.user.or(self.user),
            password: overrides.password.or(self.password),
            allowlist: if overrides.allowlist.is_empty() {
                self.allowlist
            } else {
                overrides.allowlist
            },
            dry_run: overrides.dry_run.or(self.dry_run),
            all_pages: overrides.all_pages.or(self.all_pages),
            request_timeout_secs: overrides.request_timeout_secs.or(self.request_timeout_secs),
            poll_interval_ms: overrides.poll_interval_ms.or(self.poll_interval_ms),
            max_poll_errors: overrides.max_poll_errors.or(self.max_poll_errors),
            poll_timeout_secs: overrides.poll_timeout_secs.or(self.poll_timeout_secs),
        }
    }

    /// Names of mandatory settings that are missing or blank
    pub fn missing_required(&self) -> Vec<&'static str> {
        [
            ("tenant", &self.tenant),
            ("user", &self.user),
            ("password", &self.password),
            ("url", &self.url),
        ]
        .into_iter()
        .filter(|(_, value)| value.as_deref().map_or(true, |s| s.trim().is_empty()))
        .map(|(name, _)| name)
        .collect()
    }
}

/// How a deletion job is followed until it finishes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    /// Pause between two status requests
    pub interval: Duration,
    /// Consecutive failed status requests tolerated before giving up
    pub max_errors: u32,
    /// Maximum time to wait for a single job, unbounded when `None`
    pub deadline: Option<Duration>,
}

impl Default for PollPolicy {
    fn default() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            max_errors: DEFAULT_MAX_POLL_ERRORS,
            deadline: None,
        }
    }
}

/// Validated license-saver configuration
#[derive(Clone)]
pub struct Config {
    pub tenant: String,
    /// Base URL without trailing slash
    pub url: String,
    pub user: String,
    pub password: String,
    /// Operator-supplied allowlist, without the API user
    pub allowlist: Allowlist,
    pub dry_run: bool,
    pub all_pages: bool,
    pub request_timeout: Duration,
    pub poll: PollPolicy,
}

impl fmt::Debug for Config {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Config")
            .field("tenant", &self.tenant)
            .field("url", &self.url)
            .field("user", &self.user)
            .field("password", &"<redacted>")
            .field("allowlist", &self.allowlist)
            .field("dry_run", &self.dry_run)
            .field("all_pages", &self.all_pages)
            .field("request_timeout", &self.request_timeout)
            .field("poll", &self.poll)
            .finish()
    }
}

impl Config {
    pub fn from_settings(settings: Settings) -> Result<Self> {
        let missing = settings.missing_required();
        if !missing.is_empty() {
            return Err(Error::MissingSettings(missing));
        }

        let url = settings.url.unwrap_or_default().trim().trim_end_matches('/').to_string();
        let parsed = Url::parse(&url).map_err(|e| Error::config(format!("Invalid URL {:?}: {}", url, e)))?;
        if !matches!(parsed.scheme(), "http" | "https") || parsed.host_str().is_none() {
            return Err(Error::config(format!("URL must be an http(s) address, got {:?}", url)));
        }

        let max_errors = settings.max_poll_errors.unwrap_or(DEFAULT_MAX_POLL_ERRORS);
        if max_errors == 0 {
            return Err(Error::config("maxPollErrors must be at least 1"));
        }

        let poll = PollPolicy {
            interval: settings
                .poll_interval_ms
                .map(Duration::from_millis)
                .unwrap_or(DEFAULT_POLL_INTERVAL),
            max_errors,
            deadline: settings.poll_timeout_secs.map(Duration::from_secs),
        };

        Ok(Self {
            tenant: settings.tenant.unwrap_or_default().trim().to_string(),
            url,
            user: settings.user.unwrap_or_default().trim().to_string(),
            password: settings.password.unwrap_or_default(),
            allowlist: settings.allowlist.iter().collect(),
            dry_run: settings.dry_run.unwrap_or(false),
            all_pages: settings.all_pages.unwrap_or(false),
            request_timeout: settings
                .request_timeout_secs
                .map(Duration::from_secs)
                .unwrap_or(DEFAULT_REQUEST_TIMEOUT),
            poll,
        })
    }

    /// Load an optional settings file and layer `overrides` on top
    pub fn load(path: Option<&Path>, overrides: Settings) -> Result<Self> {
        let base = match path {
            Some(path) => Settings::load(path)?,
            None => Settings::default(),
        };
        Self::from_settings(base.merge(overrides))
    }
}
