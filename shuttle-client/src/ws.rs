use std::{marker::PhantomData, sync::Arc, time::Duration};

use dashmap::DashMap;
use futures_util::{SinkExt, StreamExt, stream::SplitSink};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use tokio::{
    net::TcpStream,
    sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel},
    task::JoinHandle,
};
use tokio_tungstenite::{
    MaybeTlsStream, WebSocketStream,
    tungstenite::{
        Message,
        client::IntoClientRequest,
        http::{HeaderValue, header::SEC_WEBSOCKET_PROTOCOL},
    },
};
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::{ClientError, authorization_value, take_data};

const PROTOCOL: &str = "graphql-transport-ws";

const RECONNECT_DELAY: Duration = Duration::from_secs(5);

const RETRY_AFTER_DROP: Duration = Duration::from_secs(1);

const ACK_TIMEOUT: Duration = Duration::from_secs(10);

type Socket = WebSocketStream<MaybeTlsStream<TcpStream>>;
type SocketSink = SplitSink<Socket, Message>;
type EventSender = UnboundedSender<Result<Value, ClientError>>;
type LiveSubscriptions = Arc<DashMap<String, LiveSubscription>>;

#[derive(Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ClientFrame<'a> {
    ConnectionInit { payload: Value },
    Subscribe { id: &'a str, payload: &'a Value },
    Complete { id: &'a str },
    Ping,
    Pong,
}

#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ServerFrame {
    ConnectionAck,
    Next { id: String, payload: Value },
    Error { id: String, payload: Value },
    Complete { id: String },
    Ping,
    Pong,
}

enum HubCommand {
    Subscribe {
        id: String,
        payload: Value,
        events: EventSender,
    },
    Complete {
        id: String,
    },
}

struct LiveSubscription {
    payload: Value,
    events: EventSender,
}

enum ConnectionEnd {
    Closed,
    Dropped,
}

/// Owner of the subscription socket. Reconnects until closed and
/// re-authenticates and re-subscribes after every reconnect.
pub(crate) struct SubscriptionHub {
    tx: UnboundedSender<HubCommand>,
    cancellation_token: CancellationToken,
    handle: JoinHandle<()>,
}

impl SubscriptionHub {
    pub fn start(url: String, token: Option<String>, keep_alive: Duration) -> Self {
        let (tx, rx) = unbounded_channel();
        let cancellation_token = CancellationToken::new();
        let handle = tokio::spawn(run(url, token, keep_alive, rx, cancellation_token.clone()));
        Self {
            tx,
            cancellation_token,
            handle,
        }
    }

    pub fn subscribe<T: DeserializeOwned>(
        &self,
        root_field: &'static str,
        payload: Value,
    ) -> Result<Subscription<T>, ClientError> {
        let id = Uuid::new_v4().to_string();
        let (events, rx) = unbounded_channel();
        self.tx
            .send(HubCommand::Subscribe {
                id: id.clone(),
                payload,
                events,
            })
            .map_err(|_| ClientError::SocketClosed)?;
        Ok(Subscription {
            id,
            root_field,
            rx,
            tx: self.tx.clone(),
            _marker: PhantomData,
        })
    }

    pub async fn close(self) {
        self.cancellation_token.cancel();
        if let Err(e) = self.handle.await {
            log::error!("Subscription socket task failed: {}", e);
        }
    }
}

/// Stream of results for one subscription. Dropping it completes the
/// subscription on the server.
pub struct Subscription<T> {
    id: String,
    root_field: &'static str,
    rx: UnboundedReceiver<Result<Value, ClientError>>,
    tx: UnboundedSender<HubCommand>,
    _marker: PhantomData<fn() -> T>,
}

impl<T: DeserializeOwned> Subscription<T> {
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Next event, or `None` once the server completed the subscription or
    /// the socket was closed.
    pub async fn next(&mut self) -> Option<Result<T, ClientError>> {
        let event = self.rx.recv().await?;
        Some(event.and_then(|envelope| {
            let data = take_data(envelope)?;
            let root = data.get(self.root_field).cloned().unwrap_or(Value::Null);
            Ok(serde_json::from_value(root)?)
        }))
    }
}

impl<T> Drop for Subscription<T> {
    fn drop(&mut self) {
        let _ = self.tx.send(HubCommand::Complete {
            id: self.id.clone(),
        });
    }
}

async fn connect(url: &str) -> Result<Socket, tokio_tungstenite::tungstenite::Error> {
    let mut request = url.into_client_request()?;
    request
        .headers_mut()
        .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(PROTOCOL));
    let (ws, _) = tokio_tungstenite::connect_async(request).await?;
    Ok(ws)
}

async fn run(
    url: String,
    token: Option<String>,
    keep_alive: Duration,
    mut rx: UnboundedReceiver<HubCommand>,
    cancellation_token: CancellationToken,
) {
    let live: LiveSubscriptions = Arc::new(DashMap::new());
    loop {
        let ws = tokio::select! {
            ws = connect(&url) => ws,
            _ = cancellation_token.cancelled() => break,
        };
        let ws = match ws {
            Ok(ws) => ws,
            Err(e) => {
                log::warn!("Failed to connect to {}: {}", url, e);
                tokio::select! {
                    _ = tokio::time::sleep(RECONNECT_DELAY) => continue,
                    _ = cancellation_token.cancelled() => break,
                }
            }
        };
        log::info!("Connected to {}", url);

        let end = serve(
            ws,
            token.as_deref(),
            keep_alive,
            &mut rx,
            &live,
            &cancellation_token,
        )
        .await;
        if let ConnectionEnd::Closed = end {
            break;
        }
        tokio::select! {
            _ = tokio::time::sleep(RETRY_AFTER_DROP) => {},
            _ = cancellation_token.cancelled() => break,
        }
        log::info!("Reconnecting to {}", url);
    }
    // dropping the senders ends every open subscription stream
    live.clear();
}

async fn send_frame(write: &mut SocketSink, frame: &ClientFrame<'_>) -> Result<(), ClientError> {
    let text = serde_json::to_string(frame)?;
    write
        .send(Message::Text(text.into()))
        .await
        .map_err(|_| ClientError::SocketClosed)
}

async fn serve(
    ws: Socket,
    token: Option<&str>,
    keep_alive: Duration,
    rx: &mut UnboundedReceiver<HubCommand>,
    live: &LiveSubscriptions,
    cancellation_token: &CancellationToken,
) -> ConnectionEnd {
    let (mut write, mut read) = ws.split();

    let init = ClientFrame::ConnectionInit {
        payload: json!({ "Authorization": authorization_value(token) }),
    };
    if send_frame(&mut write, &init).await.is_err() {
        return ConnectionEnd::Dropped;
    }
    let acked = tokio::time::timeout(ACK_TIMEOUT, async {
        while let Some(msg) = read.next().await {
            match msg {
                Ok(Message::Text(text)) => {
                    if let Ok(ServerFrame::ConnectionAck) = serde_json::from_str(&text) {
                        return true;
                    }
                }
                Ok(Message::Close(_)) | Err(_) => return false,
                Ok(_) => {}
            }
        }
        false
    })
    .await;
    if !matches!(acked, Ok(true)) {
        log::warn!("Server did not acknowledge the connection");
        return ConnectionEnd::Dropped;
    }

    let resubscribe: Vec<(String, Value)> = live
        .iter()
        .map(|entry| (entry.key().clone(), entry.value().payload.clone()))
        .collect();
    for (id, payload) in &resubscribe {
        let frame = ClientFrame::Subscribe { id, payload };
        if send_frame(&mut write, &frame).await.is_err() {
            return ConnectionEnd::Dropped;
        }
    }

    let mut ticker = tokio::time::interval(keep_alive);
    ticker.tick().await;
    loop {
        tokio::select! {
            _ = cancellation_token.cancelled() => {
                let _ = write.send(Message::Close(None)).await;
                return ConnectionEnd::Closed;
            }
            cmd = rx.recv() => match cmd {
                Some(HubCommand::Subscribe { id, payload, events }) => {
                    let frame = ClientFrame::Subscribe { id: &id, payload: &payload };
                    let sent = send_frame(&mut write, &frame).await;
                    live.insert(id, LiveSubscription { payload, events });
                    if sent.is_err() {
                        return ConnectionEnd::Dropped;
                    }
                }
                Some(HubCommand::Complete { id }) => {
                    if live.remove(&id).is_some()
                        && send_frame(&mut write, &ClientFrame::Complete { id: &id }).await.is_err()
                    {
                        return ConnectionEnd::Dropped;
                    }
                }
                None => {
                    let _ = write.send(Message::Close(None)).await;
                    return ConnectionEnd::Closed;
                }
            },
            msg = read.next() => match msg {
                Some(Ok(Message::Text(text))) => {
                    let frame = match serde_json::from_str::<ServerFrame>(&text) {
                        Ok(frame) => frame,
                        Err(e) => {
                            log::warn!("Unrecognized subscription frame: {}", e);
                            continue;
                        }
                    };
                    if handle_frame(frame, &mut write, live).await.is_err() {
                        return ConnectionEnd::Dropped;
                    }
                }
                Some(Ok(Message::Close(_))) | None => {
                    log::info!("Subscription socket closed by server");
                    return ConnectionEnd::Dropped;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    log::warn!("Error receiving message: {}", e);
                    return ConnectionEnd::Dropped;
                }
            },
            _ = ticker.tick() => {
                if send_frame(&mut write, &ClientFrame::Ping).await.is_err() {
                    return ConnectionEnd::Dropped;
                }
            }
        }
    }
}

async fn handle_frame(
    frame: ServerFrame,
    write: &mut SocketSink,
    live: &LiveSubscriptions,
) -> Result<(), ClientError> {
    match frame {
        ServerFrame::Next { id, payload } => {
            if let Some(sub) = live.get(&id) {
                let _ = sub.events.send(Ok(payload));
            } else {
                log::debug!("No listener for subscription {}", id);
            }
        }
        ServerFrame::Error { id, payload } => {
            let messages = payload
                .as_array()
                .map(|errors| {
                    errors
                        .iter()
                        .filter_map(|e| e.get("message").and_then(Value::as_str))
                        .map(str::to_string)
                        .collect()
                })
                .unwrap_or_default();
            if let Some((_, sub)) = live.remove(&id) {
                let _ = sub.events.send(Err(ClientError::Graphql(messages)));
            }
        }
        ServerFrame::Complete { id } => {
            live.remove(&id);
        }
        ServerFrame::Ping => send_frame(write, &ClientFrame::Pong).await?,
        ServerFrame::Pong | ServerFrame::ConnectionAck => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use tokio::net::TcpListener;
    use tokio_tungstenite::tungstenite::handshake::server::{ErrorResponse, Request, Response};

    use crate::{
        ClientConfig, GraphqlClient, Operation, OperationKind, operations::IdVars,
    };

    use super::*;

    struct GameUpdated;

    impl Operation for GameUpdated {
        const NAME: &'static str = "GameUpdated";
        const ROOT_FIELD: &'static str = "gameUpdated";
        const KIND: OperationKind = OperationKind::Subscription;
        const DOCUMENT: &'static str =
            "subscription GameUpdated($id: ID!) { gameUpdated(id: $id) { id status } }";
        type Variables = IdVars;
        type Output = Value;
    }

    type ServerSocket = WebSocketStream<TcpStream>;

    async fn accept(listener: &TcpListener) -> ServerSocket {
        let (stream, _) = listener.accept().await.expect("Failed to accept");
        let callback = |_req: &Request, mut response: Response| -> Result<Response, ErrorResponse> {
            response
                .headers_mut()
                .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static(PROTOCOL));
            Ok(response)
        };
        tokio_tungstenite::accept_hdr_async(stream, callback)
            .await
            .expect("Failed to upgrade")
    }

    async fn next_frame(ws: &mut ServerSocket) -> Value {
        loop {
            let msg = ws
                .next()
                .await
                .expect("socket closed")
                .expect("socket error");
            if let Message::Text(text) = msg {
                let value: Value = serde_json::from_str(&text).expect("invalid json");
                if value["type"] != "ping" {
                    return value;
                }
            }
        }
    }

    async fn send(ws: &mut ServerSocket, value: Value) {
        ws.send(Message::Text(value.to_string().into()))
            .await
            .expect("Failed to send");
    }

    async fn setup() -> (TcpListener, GraphqlClient) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let ws_url = format!("ws://{}", listener.local_addr().unwrap());
        let client = GraphqlClient::new(
            ClientConfig::new("http://127.0.0.1:1", ws_url),
            Some("tok-9".to_string()),
        )
        .unwrap();
        (listener, client)
    }

    #[tokio::test]
    async fn test_subscription_over_socket() {
        let (listener, client) = setup().await;
        let mut sub = client
            .subscribe::<GameUpdated>(&IdVars::new("g1"))
            .await
            .expect("Failed to subscribe");

        let mut ws = accept(&listener).await;
        let init = next_frame(&mut ws).await;
        assert_eq!(init["type"], "connection_init");
        assert_eq!(init["payload"]["Authorization"], "Bearer tok-9");
        send(&mut ws, json!({ "type": "connection_ack" })).await;

        let subscribe = next_frame(&mut ws).await;
        assert_eq!(subscribe["type"], "subscribe");
        assert_eq!(subscribe["id"], sub.id());
        assert_eq!(subscribe["payload"]["operationName"], "GameUpdated");
        assert_eq!(subscribe["payload"]["variables"]["id"], "g1");

        send(
            &mut ws,
            json!({
                "type": "next",
                "id": sub.id(),
                "payload": { "data": { "gameUpdated": { "id": "g1", "status": "completed" } } }
            }),
        )
        .await;
        let event = sub.next().await.expect("stream ended").expect("event error");
        assert_eq!(event["status"], "completed");

        send(&mut ws, json!({ "type": "complete", "id": sub.id() })).await;
        assert!(sub.next().await.is_none());

        client.close().await;
    }

    #[tokio::test]
    async fn test_reconnect_reauthenticates_and_resubscribes() {
        let (listener, client) = setup().await;
        let sub = client
            .subscribe::<GameUpdated>(&IdVars::new("g2"))
            .await
            .expect("Failed to subscribe");

        let mut ws = accept(&listener).await;
        next_frame(&mut ws).await;
        send(&mut ws, json!({ "type": "connection_ack" })).await;
        next_frame(&mut ws).await;
        drop(ws);

        let mut ws = accept(&listener).await;
        let init = next_frame(&mut ws).await;
        assert_eq!(init["type"], "connection_init");
        assert_eq!(init["payload"]["Authorization"], "Bearer tok-9");
        send(&mut ws, json!({ "type": "connection_ack" })).await;
        let resubscribe = next_frame(&mut ws).await;
        assert_eq!(resubscribe["type"], "subscribe");
        assert_eq!(resubscribe["id"], sub.id());

        client.close().await;
    }

    #[tokio::test]
    async fn test_close_ends_streams() {
        let (listener, client) = setup().await;
        let mut sub = client
            .subscribe::<GameUpdated>(&IdVars::new("g3"))
            .await
            .expect("Failed to subscribe");
        let mut ws = accept(&listener).await;
        next_frame(&mut ws).await;
        send(&mut ws, json!({ "type": "connection_ack" })).await;
        next_frame(&mut ws).await;

        client.close().await;
        assert!(sub.next().await.is_none());
    }

    #[test]
    fn test_frame_wire_format() {
        let frame = serde_json::to_value(ClientFrame::Complete { id: "x" }).unwrap();
        assert_eq!(frame, json!({ "type": "complete", "id": "x" }));
        let ping = serde_json::to_value(ClientFrame::Ping).unwrap();
        assert_eq!(ping, json!({ "type": "ping" }));

        let parsed: ServerFrame =
            serde_json::from_str(r#"{"type":"ping","payload":{"ts":1}}"#).unwrap();
        assert!(matches!(parsed, ServerFrame::Ping));
    }
}
