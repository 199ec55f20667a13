use std::fmt;
use std::time::Duration;

use tracing::{debug, warn};

use crate::config::{Credential, DEFAULT_REMOTE_TIMEOUT, Range};
use crate::error::RemoteError;
use crate::source::{LocalIntegerSource, RemoteIntegerSource};

/// Which path produced a [`GeneratedValue`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueOrigin {
    /// The remote service answered.
    Remote,
    /// No credential configured; the remote source was not consulted.
    Local,
    /// The remote source failed and the local generator stood in.
    Fallback,
}

/// One value for one beat.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GeneratedValue {
    pub value: i64,
    pub origin: ValueOrigin,
}

/// Remote-first, local-fallback value acquisition.
///
/// [`next_value`](Self::next_value) never fails: every [`RemoteError`] is
/// logged at `warn` and replaced by a local draw. The credential only
/// decides whether the remote source is tried at all.
pub struct FallbackSelector<R> {
    credential: Option<Credential>,
    remote: R,
    local: LocalIntegerSource,
    remote_timeout: Duration,
}

impl<R> fmt::Debug for FallbackSelector<R> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FallbackSelector")
            .field("remote_type", &std::any::type_name::<R>())
            .field("remote_enabled", &self.credential.is_some())
            .field("local", &self.local)
            .field("remote_timeout", &self.remote_timeout)
            .finish()
    }
}

impl<R: RemoteIntegerSource> FallbackSelector<R> {
    pub fn new(
        credential: Option<Credential>,
        remote: R,
        local: LocalIntegerSource,
    ) -> Self {
        Self {
            credential,
            remote,
            local,
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
        }
    }

    /// Upper bound on a single remote attempt, on top of whatever timeout
    /// the remote source applies itself.
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    pub fn remote_enabled(&self) -> bool {
        self.credential.is_some()
    }

    pub async fn next_value(&mut self, range: Range) -> GeneratedValue {
        let Some(credential) = self.credential.as_ref() else {
            return GeneratedValue {
                value: self.local.draw(range),
                origin: ValueOrigin::Local,
            };
        };

        match self.attempt_remote(credential, range).await {
            Ok(value) => {
                debug!(value, "remote source answered");
                GeneratedValue {
                    value,
                    origin: ValueOrigin::Remote,
                }
            }
            Err(err) => {
                warn!(
                    error = %err,
                    range = %range,
                    "remote source failed, falling back to local generator"
                );
                GeneratedValue {
                    value: self.local.draw(range),
                    origin: ValueOrigin::Fallback,
                }
            }
        }
    }

    async fn attempt_remote(
        &self,
        credential: &Credential,
        range: Range,
    ) -> Result<i64, RemoteError> {
        let attempt = self.remote.fetch(credential, range);
        match tokio::time::timeout(self.remote_timeout, attempt).await {
            Ok(Ok(value)) if range.contains(value) => Ok(value),
            Ok(Ok(value)) => Err(RemoteError::OutOfRange { value, range }),
            Ok(Err(err)) => Err(err),
            Err(_) => Err(RemoteError::Timeout(self.remote_timeout)),
        }
    }
}
