use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use serde::Serialize;
use serde_json::Value;

use crate::{ClientError, GraphqlRequest, authorization_value, take_data};

#[derive(Clone)]
pub(crate) struct HttpTransport {
    url: String,
    http_client: reqwest::Client,
}

impl HttpTransport {
    pub fn new(url: String) -> Self {
        Self {
            url,
            http_client: reqwest::Client::new(),
        }
    }

    pub async fn post<V: Serialize>(
        &self,
        request: &GraphqlRequest<'_, V>,
        token: Option<&str>,
    ) -> Result<Value, ClientError> {
        let body = serde_json::to_string(request)?;
        log::debug!("POST {} ({})", self.url, request.operation_name);
        let resp = self
            .http_client
            .post(&self.url)
            .header(CONTENT_TYPE, "application/json")
            .header(AUTHORIZATION, authorization_value(token))
            .body(body)
            .send()
            .await?;
        let status = resp.status();
        let text = resp.text().await?;
        if !status.is_success() {
            log::warn!(
                "{} failed with status {}: {}",
                request.operation_name,
                status,
                text
            );
            // GraphQL servers may still report the cause in the body
            if let Ok(envelope) = serde_json::from_str::<Value>(&text) {
                if let Err(e @ ClientError::Graphql(_)) = take_data(envelope) {
                    return Err(e);
                }
            }
            return Err(ClientError::Status(status.as_u16()));
        }
        let envelope: Value = serde_json::from_str(&text)?;
        take_data(envelope)
    }
}
