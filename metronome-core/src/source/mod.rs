mod local;
mod random_org;

pub use local::LocalIntegerSource;
pub use random_org::{RandomOrgClient, SERVICE_LIMIT};

use async_trait::async_trait;

use crate::config::Credential;
use crate::error::RemoteError;

/// A bounded integer source reached over the network.
///
/// Implementations perform one round trip per call and must return
/// `Ok(v)` only when `range.contains(v)`.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait RemoteIntegerSource: Send + Sync {
    async fn fetch(
        &self,
        credential: &Credential,
        range: crate::config::Range,
    ) -> Result<i64, RemoteError>;
}
