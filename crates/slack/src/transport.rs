//! Socket Mode websocket transport.
//!
//! Opens a session URL with the app-level token, then reads JSON frames off
//! the socket. `hello` frames are swallowed, `disconnect` frames and socket
//! closes surface as [`TransportError::Closed`] so the runner reconnects.

use async_trait::async_trait;
use futures::{SinkExt, StreamExt};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::{json, Value};
use tokio::net::TcpStream;
use tokio::sync::Mutex;
use tokio_tungstenite::{
    connect_async, tungstenite::Message as WsMessage, MaybeTlsStream, WebSocketStream,
};
use tracing::{debug, info};

use crate::{
    api::SLACK_API_BASE_URL,
    events::{MessageEvent, SlackEnvelope, SlackEvent},
    socket::{SocketTransport, TransportError},
};

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Frame {
    Hello,
    Disconnect { reason: String },
    Envelope(SlackEnvelope),
    Ignored,
}

pub struct WebSocketTransport {
    client: Client,
    app_token: SecretString,
    base_url: String,
    stream: Mutex<Option<WsStream>>,
}

impl WebSocketTransport {
    pub fn new(app_token: SecretString) -> Self {
        Self::with_base_url(app_token, SLACK_API_BASE_URL)
    }

    pub fn with_base_url(app_token: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            app_token,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            stream: Mutex::new(None),
        }
    }

    async fn open_session_url(&self) -> Result<String, TransportError> {
        let response = self
            .client
            .post(format!("{}/apps.connections.open", self.base_url))
            .bearer_auth(self.app_token.expose_secret())
            .send()
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;

        let body: Value =
            response.json().await.map_err(|error| TransportError::Connect(error.to_string()))?;
        session_url(&body)
    }
}

#[async_trait]
impl SocketTransport for WebSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        let url = self.open_session_url().await?;
        let (stream, _response) = connect_async(url.as_str())
            .await
            .map_err(|error| TransportError::Connect(error.to_string()))?;
        *self.stream.lock().await = Some(stream);
        info!(event_name = "ingress.slack.socket_opened", "socket mode websocket opened");
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        let mut guard = self.stream.lock().await;
        let Some(stream) = guard.as_mut() else {
            return Err(TransportError::Receive("websocket is not connected".to_owned()));
        };

        loop {
            let message = match stream.next().await {
                Some(Ok(message)) => message,
                Some(Err(error)) => {
                    *guard = None;
                    return Err(TransportError::Closed(error.to_string()));
                }
                None => {
                    *guard = None;
                    return Err(TransportError::Closed("websocket stream ended".to_owned()));
                }
            };

            let text = match message {
                WsMessage::Text(text) => text.as_str().to_owned(),
                WsMessage::Binary(bytes) => String::from_utf8(bytes.to_vec())
                    .map_err(|error| TransportError::Receive(error.to_string()))?,
                WsMessage::Close(_) => {
                    *guard = None;
                    return Err(TransportError::Closed("close frame received".to_owned()));
                }
                WsMessage::Ping(_) | WsMessage::Pong(_) | WsMessage::Frame(_) => continue,
            };

            let value: Value = match serde_json::from_str(&text) {
                Ok(value) => value,
                Err(error) => {
                    debug!(error = %error, "skipping non-json socket frame");
                    continue;
                }
            };

            match decode_socket_frame(&value) {
                Frame::Hello => debug!("socket mode hello received"),
                Frame::Ignored => {}
                Frame::Disconnect { reason } => {
                    *guard = None;
                    return Err(TransportError::Closed(reason));
                }
                Frame::Envelope(envelope) => return Ok(Some(envelope)),
            }
        }
    }

    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError> {
        let mut guard = self.stream.lock().await;
        let Some(stream) = guard.as_mut() else {
            return Err(TransportError::Acknowledge("websocket is not connected".to_owned()));
        };

        let ack = json!({ "envelope_id": envelope_id }).to_string();
        stream
            .send(WsMessage::Text(ack.into()))
            .await
            .map_err(|error| TransportError::Acknowledge(error.to_string()))
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        let Some(mut stream) = self.stream.lock().await.take() else {
            return Ok(());
        };
        stream.close(None).await.map_err(|error| TransportError::Disconnect(error.to_string()))
    }
}

fn session_url(body: &Value) -> Result<String, TransportError> {
    if body.get("ok").and_then(Value::as_bool) != Some(true) {
        let error = body.get("error").and_then(Value::as_str).unwrap_or("unknown");
        return Err(TransportError::Connect(format!("apps.connections.open failed: {error}")));
    }

    let url = body.get("url").and_then(Value::as_str).unwrap_or_default();
    if !url.starts_with("wss://") {
        return Err(TransportError::Connect(format!("unexpected socket url `{url}`")));
    }
    Ok(url.to_owned())
}

pub fn decode_socket_frame(value: &Value) -> Frame {
    match value.get("type").and_then(Value::as_str) {
        Some("hello") => return Frame::Hello,
        Some("disconnect") => {
            let reason = value.get("reason").and_then(Value::as_str).unwrap_or("unspecified");
            return Frame::Disconnect { reason: reason.to_owned() };
        }
        _ => {}
    }

    let Some(envelope_id) = value.get("envelope_id").and_then(Value::as_str) else {
        return Frame::Ignored;
    };

    let event = match value.get("type").and_then(Value::as_str) {
        Some("events_api") => decode_event(value.pointer("/payload/event")),
        other => SlackEvent::Unsupported { event_type: other.unwrap_or("unknown").to_owned() },
    };

    Frame::Envelope(SlackEnvelope { envelope_id: envelope_id.to_owned(), event })
}

fn decode_event(event: Option<&Value>) -> SlackEvent {
    let Some(event) = event else {
        return SlackEvent::Unsupported { event_type: "missing".to_owned() };
    };
    let event_type = event.get("type").and_then(Value::as_str).unwrap_or("unknown");
    let unsupported = || SlackEvent::Unsupported { event_type: event_type.to_owned() };

    // A channel mention also arrives as `app_mention`; only `message` is
    // decoded so one mention yields one prompt.
    if event_type != "message" {
        return unsupported();
    }
    // Edits, joins and bot posts (including our own prompt) carry one of these.
    if event.get("subtype").is_some() || event.get("bot_id").is_some() {
        return unsupported();
    }

    let field = |name: &str| event.get(name).and_then(Value::as_str).map(str::to_owned);
    match (field("channel"), field("user"), field("text")) {
        (Some(channel_id), Some(user_id), Some(text)) => SlackEvent::Message(MessageEvent {
            channel_id,
            user_id,
            text,
            ts: field("ts").unwrap_or_default(),
        }),
        _ => unsupported(),
    }
}
