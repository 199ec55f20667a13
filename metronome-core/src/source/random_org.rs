use std::fmt;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;
use url::Url;

use super::RemoteIntegerSource;
use crate::config::{Credential, Range, RemoteSettings};
use crate::error::{ConfigError, RemoteError};

/// Largest magnitude RANDOM.ORG accepts for `min` and `max`.
pub const SERVICE_LIMIT: i64 = 1_000_000_000;

const JSON_RPC_VERSION: &str = "2.0";
const JSON_RPC_CONTENT_TYPE: &str = "application/json-rpc";
const GENERATE_INTEGERS: &str = "generateIntegers";

/// JSON-RPC client for the RANDOM.ORG `generateIntegers` method.
pub struct RandomOrgClient {
    http: reqwest::Client,
    endpoint: Url,
    timeout: Duration,
    next_id: AtomicU64,
}

impl fmt::Debug for RandomOrgClient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RandomOrgClient")
            .field("endpoint", &self.endpoint.as_str())
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl RandomOrgClient {
    pub fn new(settings: &RemoteSettings) -> Result<Self, ConfigError> {
        let http = reqwest::Client::builder()
            .timeout(settings.timeout)
            .build()
            .map_err(ConfigError::HttpClient)?;

        Ok(Self {
            http,
            endpoint: settings.endpoint.clone(),
            timeout: settings.timeout,
            next_id: AtomicU64::new(0),
        })
    }

    pub fn endpoint(&self) -> &Url {
        &self.endpoint
    }

    fn classify(&self, err: reqwest::Error) -> RemoteError {
        if err.is_timeout() {
            RemoteError::Timeout(self.timeout)
        } else {
            RemoteError::Transport(err)
        }
    }
}

fn supported(range: Range) -> bool {
    range.min() >= -SERVICE_LIMIT && range.max() <= SERVICE_LIMIT
}

#[derive(Serialize)]
struct GenerateIntegersRequest<'a> {
    jsonrpc: &'static str,
    method: &'static str,
    params: GenerateIntegersParams<'a>,
    id: u64,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateIntegersParams<'a> {
    api_key: &'a str,
    n: u32,
    min: i64,
    max: i64,
}

#[derive(Debug, Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<GenerateIntegersResult>,
    #[serde(default)]
    error: Option<RpcErrorBody>,
    #[serde(default)]
    id: Value,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateIntegersResult {
    #[serde(default)]
    random: Option<RandomData>,
    #[serde(default)]
    bits_left: Option<i64>,
    #[serde(default)]
    requests_left: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct RandomData {
    #[serde(default)]
    data: Vec<i64>,
}

#[derive(Debug, Deserialize)]
struct RpcErrorBody {
    code: i64,
    #[serde(default)]
    message: String,
}

#[async_trait]
impl RemoteIntegerSource for RandomOrgClient {
    async fn fetch(
        &self,
        credential: &Credential,
        range: Range,
    ) -> Result<i64, RemoteError> {
        if !supported(range) {
            return Err(RemoteError::UnsupportedRange(range));
        }

        let id = self.next_id.fetch_add(1, Ordering::Relaxed);
        let request = GenerateIntegersRequest {
            jsonrpc: JSON_RPC_VERSION,
            method: GENERATE_INTEGERS,
            params: GenerateIntegersParams {
                api_key: credential.expose(),
                n: 1,
                min: range.min(),
                max: range.max(),
            },
            id,
        };

        // Content type must be set before `.json()` or it is overwritten.
        let response = self
            .http
            .post(self.endpoint.clone())
            .header(CONTENT_TYPE, JSON_RPC_CONTENT_TYPE)
            .json(&request)
            .send()
            .await
            .map_err(|e| self.classify(e))?;

        let status = response.status();
        if !status.is_success() {
            return Err(RemoteError::Status(status));
        }

        let body = response.bytes().await.map_err(|e| self.classify(e))?;
        let parsed: RpcResponse = serde_json::from_slice(&body)?;

        if let Some(error) = parsed.error {
            return Err(RemoteError::Rpc {
                code: error.code,
                message: error.message,
            });
        }

        if parsed.id != Value::from(id) {
            return Err(RemoteError::IdMismatch {
                expected: id,
                received: parsed.id.to_string(),
            });
        }

        let result = parsed.result.ok_or(RemoteError::MissingValue)?;
        let value = result
            .random
            .and_then(|random| random.data.first().copied())
            .ok_or(RemoteError::MissingValue)?;

        if !range.contains(value) {
            return Err(RemoteError::OutOfRange { value, range });
        }

        debug!(
            request_id = id,
            requests_left = ?result.requests_left,
            bits_left = ?result.bits_left,
            "random.org quota"
        );

        Ok(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn request_uses_random_org_field_names() {
        let request = GenerateIntegersRequest {
            jsonrpc: JSON_RPC_VERSION,
            method: GENERATE_INTEGERS,
            params: GenerateIntegersParams {
                api_key: "key",
                n: 1,
                min: 1,
                max: 10,
            },
            id: 3,
        };
        let json = serde_json::to_value(&request).unwrap();
        assert_eq!(
            json,
            serde_json::json!({
                "jsonrpc": "2.0",
                "method": "generateIntegers",
                "params": { "apiKey": "key", "n": 1, "min": 1, "max": 10 },
                "id": 3
            })
        );
    }

    #[test]
    fn service_limit_bounds_supported_ranges() {
        assert!(supported(Range::new(-SERVICE_LIMIT, SERVICE_LIMIT).unwrap()));
        assert!(!supported(Range::new(0, SERVICE_LIMIT + 1).unwrap()));
        assert!(!supported(Range::new(-SERVICE_LIMIT - 1, 0).unwrap()));
    }

    #[tokio::test]
    async fn unsupported_range_fails_without_io() {
        let settings = RemoteSettings {
            endpoint: Url::parse("http://127.0.0.1:9/").unwrap(),
            timeout: Duration::from_secs(1),
        };
        let client = RandomOrgClient::new(&settings).unwrap();
        let credential = Credential::new("key").unwrap();
        let range = Range::new(0, i64::MAX).unwrap();

        let err = client.fetch(&credential, range).await.unwrap_err();
        assert!(matches!(err, RemoteError::UnsupportedRange(r) if r == range));
    }
}
