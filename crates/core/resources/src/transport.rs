use std::collections::BTreeMap;

use dashboard_result::{create_error, Result};
use serde_json::Value;

/// Request verb
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Method {
    Get,
    Put,
}

/// Call handed to the [`Transport`]
#[derive(Clone, PartialEq, Debug)]
pub struct TransportRequest {
    pub method: Method,
    pub path: String,
    pub params: BTreeMap<String, String>,
    pub body: Option<Value>,
}

impl TransportRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        TransportRequest {
            method,
            path: path.into(),
            params: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::Get, path)
    }

    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::Put, path)
    }

    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.insert(key.into(), value.into());
        self
    }

    pub fn body(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// How a call went, as far as the caller needs to know
#[derive(Clone, Copy, PartialEq, Eq, Hash, Debug)]
pub enum Status {
    Success,
    ClientError(u16),
    ServerError(u16),
    /// Never reached the server, includes timeouts
    NetworkError,
}

/// Response handed back by the [`Transport`]
#[derive(Clone, PartialEq, Debug)]
pub struct TransportResponse {
    pub status: Status,
    pub body: Value,
}

/// Which client error means "missing entitlement" rather than a plain failure
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct EntitlementPolicy {
    /// Client error status carrying the denial
    pub status: u16,
    /// Value of the body's `type` field that marks the denial
    pub code: String,
}

impl Default for EntitlementPolicy {
    fn default() -> Self {
        EntitlementPolicy {
            status: 403,
            code: "PremiumRequired".to_string(),
        }
    }
}

impl From<&dashboard_config::Transport> for EntitlementPolicy {
    fn from(config: &dashboard_config::Transport) -> Self {
        EntitlementPolicy {
            status: config.entitlement_status,
            code: config.entitlement_code.clone(),
        }
    }
}

impl TransportResponse {
    pub fn ok(body: Value) -> Self {
        TransportResponse {
            status: Status::Success,
            body,
        }
    }

    pub fn failed(status: Status) -> Self {
        TransportResponse {
            status,
            body: Value::Null,
        }
    }

    /// Classify the response, giving back the body on success
    pub fn into_result(self, policy: &EntitlementPolicy) -> Result<Value> {
        match self.status {
            Status::Success => Ok(self.body),
            Status::ClientError(code)
                if code == policy.status
                    && self.body.get("type").and_then(Value::as_str) == Some(policy.code.as_str()) =>
            {
                Err(create_error!(EntitlementDenied {
                    entitlement: policy.code.clone()
                }))
            }
            Status::ClientError(code) => Err(create_error!(ClientError { code })),
            Status::ServerError(code) => Err(create_error!(ServerError { code })),
            Status::NetworkError => Err(create_error!(NetworkError)),
        }
    }
}

/// Anything able to carry a request to the backend and bring back a response.
///
/// Timeouts and retries are the transport's business, they surface here as
/// ordinary failed responses.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn call(&self, request: TransportRequest) -> TransportResponse;
}
