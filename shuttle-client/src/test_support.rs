use std::{
    collections::VecDeque,
    sync::{Arc, Mutex},
};

use axum::{Json, Router, extract::State, http::HeaderMap, routing::post};
use serde_json::Value;
use tokio::net::TcpListener;

#[derive(Clone, Debug)]
pub struct RecordedRequest {
    pub headers: Vec<(String, String)>,
    pub body: Value,
}

impl RecordedRequest {
    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(k, _)| k.eq_ignore_ascii_case(name))
            .map(|(_, v)| v.as_str())
    }

    pub fn operation(&self) -> Option<&str> {
        self.body.get("operationName").and_then(Value::as_str)
    }
}

#[derive(Clone, Default)]
struct StubState {
    responses: Arc<Mutex<VecDeque<Value>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

async fn answer(
    State(state): State<StubState>,
    headers: HeaderMap,
    Json(body): Json<Value>,
) -> Json<Value> {
    let headers = headers
        .iter()
        .map(|(k, v)| {
            (
                k.as_str().to_string(),
                v.to_str().unwrap_or_default().to_string(),
            )
        })
        .collect();
    state
        .requests
        .lock()
        .unwrap()
        .push(RecordedRequest { headers, body });
    let response = state.responses.lock().unwrap().pop_front();
    Json(response.unwrap_or(Value::Null))
}

/// Loopback GraphQL endpoint answering each request with the next canned body.
pub struct HttpStub {
    url: String,
    state: StubState,
}

impl HttpStub {
    pub async fn start(responses: Vec<Value>) -> Self {
        let state = StubState {
            responses: Arc::new(Mutex::new(responses.into())),
            ..Default::default()
        };
        let app = Router::new()
            .route("/graphql", post(answer))
            .with_state(state.clone());
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let url = format!("http://{}/graphql", listener.local_addr().unwrap());
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        Self { url, state }
    }

    pub fn url(&self) -> String {
        self.url.clone()
    }

    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.state.requests.lock().unwrap().clone()
    }

    pub fn operations(&self) -> Vec<String> {
        self.requests()
            .iter()
            .filter_map(|r| r.operation().map(str::to_string))
            .collect()
    }
}
