use std::{sync::Arc, time::Duration};

use serde::{Serialize, de::DeserializeOwned};
use serde_json::Value;
use thiserror::Error;
use tokio::sync::Mutex;

mod http;
pub mod operations;
mod ws;

pub use ws::Subscription;

use crate::{http::HttpTransport, ws::SubscriptionHub};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OperationKind {
    Query,
    Mutation,
    Subscription,
}

pub trait Operation {
    const NAME: &'static str;
    const ROOT_FIELD: &'static str;
    const KIND: OperationKind;
    const DOCUMENT: &'static str;
    type Variables: Serialize + Send + Sync;
    type Output: DeserializeOwned + Send;
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum FetchPolicy {
    #[default]
    CacheFirst,
    NetworkOnly,
}

#[derive(Debug, Clone, Error)]
pub enum ClientError {
    #[error("client misconfigured: {0}")]
    Misconfigured(String),

    #[error("HTTP request failed: {0}")]
    Request(String),

    #[error("server responded with status {0}")]
    Status(u16),

    #[error("GraphQL errors: {}", .0.join("; "))]
    Graphql(Vec<String>),

    #[error("Failed to serialize/deserialize message: {0}")]
    Serde(String),

    #[error("operation {0} must use a different transport")]
    WrongTransport(&'static str),

    #[error("subscription socket closed")]
    SocketClosed,
}

impl From<reqwest::Error> for ClientError {
    fn from(e: reqwest::Error) -> Self {
        ClientError::Request(e.to_string())
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(e: serde_json::Error) -> Self {
        ClientError::Serde(e.to_string())
    }
}

#[derive(Clone, Debug)]
pub struct ClientConfig {
    pub http_url: String,
    pub ws_url: String,
    pub keep_alive: Duration,
    pub cache_ttl: Duration,
}

impl ClientConfig {
    pub fn new(http_url: impl Into<String>, ws_url: impl Into<String>) -> Self {
        Self {
            http_url: http_url.into(),
            ws_url: ws_url.into(),
            keep_alive: Duration::from_secs(10),
            cache_ttl: Duration::from_secs(300),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct GraphqlRequest<'a, V> {
    pub query: &'static str,
    pub operation_name: &'static str,
    pub variables: &'a V,
}

impl<'a, V: Serialize> GraphqlRequest<'a, V> {
    pub fn of<O: Operation<Variables = V>>(variables: &'a V) -> Self {
        Self {
            query: O::DOCUMENT,
            operation_name: O::NAME,
            variables,
        }
    }
}

/// Unwraps a `{data, errors}` envelope into the data object.
pub(crate) fn take_data(mut envelope: Value) -> Result<Value, ClientError> {
    if let Some(errors) = envelope.get("errors").and_then(Value::as_array) {
        if !errors.is_empty() {
            let messages = errors
                .iter()
                .map(|e| {
                    e.get("message")
                        .and_then(Value::as_str)
                        .unwrap_or("unknown error")
                        .to_string()
                })
                .collect();
            return Err(ClientError::Graphql(messages));
        }
    }
    match envelope.get_mut("data").map(Value::take) {
        Some(data) if !data.is_null() => Ok(data),
        _ => Err(ClientError::Serde("response carried no data".to_string())),
    }
}

fn decode_root<O: Operation>(data: &Value) -> Result<O::Output, ClientError> {
    let root = data.get(O::ROOT_FIELD).cloned().unwrap_or(Value::Null);
    Ok(serde_json::from_value(root)?)
}

/// Single execution entry point for every backend call.
///
/// Queries and mutations travel over HTTP, subscriptions over one shared
/// socket that is opened on first use and closed by [`GraphqlClient::close`].
#[derive(Clone)]
pub struct GraphqlClient {
    config: ClientConfig,
    token: Option<String>,
    http: HttpTransport,
    cache: moka::sync::Cache<String, Value>,
    hub: Arc<Mutex<Option<SubscriptionHub>>>,
}

impl GraphqlClient {
    pub fn new(config: ClientConfig, token: Option<String>) -> Result<Self, ClientError> {
        if config.http_url.trim().is_empty() {
            return Err(ClientError::Misconfigured(
                "GraphQL HTTP endpoint is not set".to_string(),
            ));
        }
        if config.ws_url.trim().is_empty() {
            return Err(ClientError::Misconfigured(
                "GraphQL WebSocket endpoint is not set".to_string(),
            ));
        }
        let http = HttpTransport::new(config.http_url.clone());
        let cache = moka::sync::Cache::builder()
            .time_to_live(config.cache_ttl)
            .max_capacity(1024)
            .build();
        Ok(Self {
            config,
            token,
            http,
            cache,
            hub: Arc::new(Mutex::new(None)),
        })
    }

    /// A client with the same endpoints bound to another credential.
    /// Cache and socket are not shared across credentials.
    pub fn with_token(&self, token: Option<String>) -> Result<Self, ClientError> {
        Self::new(self.config.clone(), token)
    }

    pub async fn execute<O: Operation>(
        &self,
        variables: &O::Variables,
        policy: FetchPolicy,
    ) -> Result<O::Output, ClientError> {
        if O::KIND == OperationKind::Subscription {
            return Err(ClientError::WrongTransport(O::NAME));
        }
        let cache_key = match O::KIND {
            OperationKind::Query => Some(format!(
                "{}:{}",
                O::NAME,
                serde_json::to_string(variables)?
            )),
            _ => None,
        };
        if let (Some(key), FetchPolicy::CacheFirst) = (&cache_key, policy) {
            if let Some(data) = self.cache.get(key) {
                log::debug!("cache hit for {}", O::NAME);
                return decode_root::<O>(&data);
            }
        }

        let request = GraphqlRequest::of::<O>(variables);
        let data = self.http.post(&request, self.token.as_deref()).await?;
        let output = decode_root::<O>(&data)?;
        if let Some(key) = cache_key {
            self.cache.insert(key, data);
        }
        Ok(output)
    }

    pub async fn subscribe<O: Operation>(
        &self,
        variables: &O::Variables,
    ) -> Result<Subscription<O::Output>, ClientError> {
        if O::KIND != OperationKind::Subscription {
            return Err(ClientError::WrongTransport(O::NAME));
        }
        let payload = serde_json::to_value(GraphqlRequest::of::<O>(variables))?;
        let mut hub = self.hub.lock().await;
        let hub = hub.get_or_insert_with(|| {
            SubscriptionHub::start(
                self.config.ws_url.clone(),
                self.token.clone(),
                self.config.keep_alive,
            )
        });
        hub.subscribe(O::ROOT_FIELD, payload)
    }

    pub async fn close(&self) {
        let hub = self.hub.lock().await.take();
        if let Some(hub) = hub {
            hub.close().await;
        }
    }

    pub fn invalidate_cache(&self) {
        self.cache.invalidate_all();
    }
}

/// Header value sent with every operation; empty without a credential.
pub(crate) fn authorization_value(token: Option<&str>) -> String {
    match token {
        Some(token) => format!("Bearer {}", token),
        None => String::new(),
    }
}

#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

#[cfg(test)]
mod tests {
    use serde_json::json;

    use crate::{
        operations::{
            NoVars,
            courts::{CourtInput, CreateCourt, FetchCourts},
        },
        test_support::HttpStub,
    };

    use super::*;

    fn courts_body() -> Value {
        json!({ "data": { "fetchCourts": [
            { "id": "c1", "name": "Court 1", "price": 250.0, "active": true }
        ] } })
    }

    #[test]
    fn test_missing_endpoint_is_fatal() {
        let result = GraphqlClient::new(ClientConfig::new("", "ws://localhost:1"), None);
        assert!(matches!(result, Err(ClientError::Misconfigured(_))));
        let result = GraphqlClient::new(ClientConfig::new("http://localhost:1", " "), None);
        assert!(matches!(result, Err(ClientError::Misconfigured(_))));
    }

    #[test]
    fn test_take_data_collects_errors() {
        let envelope = json!({
            "data": null,
            "errors": [{ "message": "bad credentials" }, { "message": "second" }]
        });
        match take_data(envelope) {
            Err(ClientError::Graphql(messages)) => {
                assert_eq!(messages, vec!["bad credentials", "second"])
            }
            other => panic!("unexpected: {:?}", other),
        }
        let ok = take_data(json!({ "data": { "logout": true } })).unwrap();
        assert_eq!(ok["logout"], true);
    }

    #[test]
    fn test_authorization_value() {
        assert_eq!(authorization_value(Some("abc")), "Bearer abc");
        assert_eq!(authorization_value(None), "");
    }

    #[tokio::test]
    async fn test_bearer_header_attached() {
        let stub = HttpStub::start(vec![courts_body(), courts_body()]).await;
        let config = ClientConfig::new(stub.url(), "ws://127.0.0.1:1");

        let client = GraphqlClient::new(config.clone(), Some("tok-1".to_string())).unwrap();
        let courts = client
            .execute::<FetchCourts>(&NoVars {}, FetchPolicy::NetworkOnly)
            .await
            .expect("Failed to fetch courts");
        assert_eq!(courts[0].name, "Court 1");

        let anonymous = client.with_token(None).unwrap();
        anonymous
            .execute::<FetchCourts>(&NoVars {}, FetchPolicy::NetworkOnly)
            .await
            .expect("Failed to fetch courts");

        let requests = stub.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].header("authorization"), Some("Bearer tok-1"));
        assert_eq!(requests[1].header("authorization"), Some(""));
        assert_eq!(requests[0].body["operationName"], "FetchCourts");
    }

    #[tokio::test]
    async fn test_cache_first_and_network_only() {
        let stub = HttpStub::start(vec![courts_body(), courts_body(), courts_body()]).await;
        let client = GraphqlClient::new(ClientConfig::new(stub.url(), "ws://127.0.0.1:1"), None)
            .unwrap();

        client
            .execute::<FetchCourts>(&NoVars {}, FetchPolicy::CacheFirst)
            .await
            .unwrap();
        client
            .execute::<FetchCourts>(&NoVars {}, FetchPolicy::CacheFirst)
            .await
            .unwrap();
        assert_eq!(stub.requests().len(), 1);

        client
            .execute::<FetchCourts>(&NoVars {}, FetchPolicy::NetworkOnly)
            .await
            .unwrap();
        assert_eq!(stub.requests().len(), 2);

        client.invalidate_cache();
        client
            .execute::<FetchCourts>(&NoVars {}, FetchPolicy::CacheFirst)
            .await
            .unwrap();
        assert_eq!(stub.requests().len(), 3);
    }

    #[tokio::test]
    async fn test_graphql_errors_surface() {
        let stub = HttpStub::start(vec![json!({
            "data": null,
            "errors": [{ "message": "price must be positive" }]
        })])
        .await;
        let client = GraphqlClient::new(ClientConfig::new(stub.url(), "ws://127.0.0.1:1"), None)
            .unwrap();
        let result = client
            .execute::<CreateCourt>(
                &operations::CreateVars {
                    input: CourtInput {
                        name: "Court 9".to_string(),
                        price: -1.0,
                        active: true,
                    },
                },
                FetchPolicy::NetworkOnly,
            )
            .await;
        assert!(matches!(result, Err(ClientError::Graphql(m)) if m[0] == "price must be positive"));
    }

    #[tokio::test]
    async fn test_subscribe_rejects_queries() {
        let client = GraphqlClient::new(
            ClientConfig::new("http://127.0.0.1:1", "ws://127.0.0.1:1"),
            None,
        )
        .unwrap();
        let result = client.subscribe::<FetchCourts>(&NoVars {}).await;
        assert!(matches!(result, Err(ClientError::WrongTransport("FetchCourts"))));
    }
}
