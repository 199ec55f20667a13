use std::fmt;
use std::sync::LazyLock;
use std::time::Duration;

use url::Url;
use zeroize::Zeroizing;

use crate::error::ConfigError;

pub const DEFAULT_MIN: i64 = 0;
pub const DEFAULT_MAX: i64 = 1_000_000_000;
pub const DEFAULT_INTERVAL_SECS: u64 = 60 * 60;
pub const DEFAULT_ENDPOINT: &str = "https://api.random.org/json-rpc/1/invoke";
pub const DEFAULT_REMOTE_TIMEOUT: Duration = Duration::from_secs(10);

// Parsed once; `default_endpoint_constant_is_a_valid_url` guards the literal.
static DEFAULT_ENDPOINT_URL: LazyLock<Url> = LazyLock::new(|| {
    Url::parse(DEFAULT_ENDPOINT).expect("DEFAULT_ENDPOINT is a valid URL")
});

/// Inclusive integer bounds, `min <= max`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Range {
    min: i64,
    max: i64,
}

impl Range {
    pub fn new(min: i64, max: i64) -> Result<Self, ConfigError> {
        if min > max {
            return Err(ConfigError::InvertedRange { min, max });
        }
        Ok(Self { min, max })
    }

    pub fn min(&self) -> i64 {
        self.min
    }

    pub fn max(&self) -> i64 {
        self.max
    }

    pub fn contains(&self, value: i64) -> bool {
        (self.min..=self.max).contains(&value)
    }
}

impl Default for Range {
    fn default() -> Self {
        Self {
            min: DEFAULT_MIN,
            max: DEFAULT_MAX,
        }
    }
}

impl fmt::Display for Range {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}, {}]", self.min, self.max)
    }
}

/// Pre-obtained API key for the remote source.
///
/// The key is wiped from memory on drop and never appears in `Debug`
/// output or logs.
#[derive(Clone)]
pub struct Credential(Zeroizing<String>);

impl Credential {
    /// Returns `None` for an empty or blank key, which disables the remote
    /// source the same way an absent key does.
    pub fn new(key: impl Into<String>) -> Option<Self> {
        let key = Zeroizing::new(key.into());
        if key.trim().is_empty() {
            return None;
        }
        Some(Self(key))
    }

    pub fn expose(&self) -> &str {
        self.0.as_str()
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}

/// How the heartbeat repeats, fixed when the scheduler is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BeatMode {
    /// Emit exactly one value, then stop.
    OneShot,
    /// Emit a value every period until cancelled.
    Repeating(Duration),
}

/// Heartbeat period in whole seconds; zero means single-shot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Interval(u64);

impl Interval {
    pub const ZERO: Interval = Interval(0);

    pub const fn from_secs(secs: u64) -> Self {
        Self(secs)
    }

    pub fn as_secs(&self) -> u64 {
        self.0
    }

    pub fn mode(&self) -> BeatMode {
        match self.0 {
            0 => BeatMode::OneShot,
            secs => BeatMode::Repeating(Duration::from_secs(secs)),
        }
    }
}

impl Default for Interval {
    fn default() -> Self {
        Self(DEFAULT_INTERVAL_SECS)
    }
}

/// Where and how long to ask the remote service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RemoteSettings {
    pub endpoint: Url,
    pub timeout: Duration,
}

impl Default for RemoteSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT_URL.clone(),
            timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }
}

/// Everything a run needs, built once before the loop and never mutated.
#[derive(Debug, Clone, Default)]
pub struct Configuration {
    pub range: Range,
    pub credential: Option<Credential>,
    pub interval: Interval,
    pub remote: RemoteSettings,
    /// Seed for the local generator; `None` seeds from OS entropy.
    pub seed: Option<u64>,
}

impl Configuration {
    pub fn new(
        range: Range,
        credential: Option<Credential>,
        interval: Interval,
    ) -> Self {
        Self {
            range,
            credential,
            interval,
            remote: RemoteSettings::default(),
            seed: None,
        }
    }

    pub fn with_remote(mut self, remote: RemoteSettings) -> Self {
        self.remote = remote;
        self
    }

    pub fn with_seed(mut self, seed: Option<u64>) -> Self {
        self.seed = seed;
        self
    }
}
