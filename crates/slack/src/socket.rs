use std::{sync::Arc, time::Duration};

use anyhow::Result;
use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info, warn};

use crate::events::{EventContext, EventDispatcher, SlackEnvelope, SlackEvent};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransportError {
    #[error("transport failed to connect: {0}")]
    Connect(String),
    #[error("transport read failed: {0}")]
    Receive(String),
    #[error("transport ack failed: {0}")]
    Acknowledge(String),
    #[error("transport disconnect failed: {0}")]
    Disconnect(String),
    #[error("transport closed by peer: {0}")]
    Closed(String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ReconnectPolicy {
    pub max_retries: u32,
    pub base_delay_ms: u64,
    pub max_delay_ms: u64,
}

impl Default for ReconnectPolicy {
    fn default() -> Self {
        Self { max_retries: 5, base_delay_ms: 250, max_delay_ms: 5_000 }
    }
}

impl ReconnectPolicy {
    fn backoff(&self, attempt: u32) -> Duration {
        let exponent = attempt.min(16);
        let multiplier = 1_u64 << exponent;
        let delay_ms = self.base_delay_ms.saturating_mul(multiplier).min(self.max_delay_ms);
        Duration::from_millis(delay_ms)
    }
}

/// Source of inbound event envelopes.
///
/// `next_envelope` yields `Ok(None)` only when the stream is finished for
/// good; a dropped or server-closed connection is `Err(TransportError::Closed)`
/// so the runner reconnects.
#[async_trait]
pub trait SocketTransport: Send + Sync {
    async fn connect(&self) -> Result<(), TransportError>;
    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError>;
    async fn acknowledge(&self, envelope_id: &str) -> Result<(), TransportError>;
    async fn disconnect(&self) -> Result<(), TransportError>;
}

#[derive(Default)]
pub struct NoopSocketTransport;

#[async_trait]
impl SocketTransport for NoopSocketTransport {
    async fn connect(&self) -> Result<(), TransportError> {
        Ok(())
    }

    async fn next_envelope(&self) -> Result<Option<SlackEnvelope>, TransportError> {
        Ok(None)
    }

    async fn acknowledge(&self, _envelope_id: &str) -> Result<(), TransportError> {
        Ok(())
    }

    async fn disconnect(&self) -> Result<(), TransportError> {
        Ok(())
    }
}

struct SessionFailure {
    connected: bool,
    error: TransportError,
}

pub struct SocketModeRunner {
    transport: Arc<dyn SocketTransport>,
    dispatcher: EventDispatcher,
    reconnect_policy: ReconnectPolicy,
}

impl SocketModeRunner {
    pub fn new(
        transport: Arc<dyn SocketTransport>,
        dispatcher: EventDispatcher,
        reconnect_policy: ReconnectPolicy,
    ) -> Self {
        Self { transport, dispatcher, reconnect_policy }
    }

    /// Pumps envelopes until the transport finishes. Connection failures are
    /// retried with backoff; a session that managed to connect resets the
    /// retry budget. Exhausted retries end the listener without failing the
    /// process.
    pub async fn start(&self) -> Result<()> {
        let mut attempt = 0_u32;
        loop {
            let failure = match self.connect_and_pump(attempt).await {
                Ok(()) => return Ok(()),
                Err(failure) => failure,
            };

            if failure.connected {
                attempt = 0;
            }

            warn!(
                event_name = "ingress.slack.transport_failed",
                attempt,
                max_retries = self.reconnect_policy.max_retries,
                error = %failure.error,
                "socket mode transport failed"
            );

            if attempt >= self.reconnect_policy.max_retries {
                warn!(
                    max_retries = self.reconnect_policy.max_retries,
                    "socket mode retries exhausted; continuing process without crash"
                );
                return Ok(());
            }

            let delay = self.reconnect_policy.backoff(attempt);
            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }
            attempt += 1;
        }
    }

    async fn connect_and_pump(&self, attempt: u32) -> Result<(), SessionFailure> {
        info!(attempt, "opening socket mode transport connection");
        self.transport
            .connect()
            .await
            .map_err(|error| SessionFailure { connected: false, error })?;
        info!(attempt, "socket mode transport connected");

        loop {
            let next = self
                .transport
                .next_envelope()
                .await
                .map_err(|error| SessionFailure { connected: true, error })?;
            let Some(envelope) = next else {
                info!(attempt, "socket mode transport stream closed");
                return self
                    .transport
                    .disconnect()
                    .await
                    .map_err(|error| SessionFailure { connected: true, error });
            };
            self.process(&envelope).await;
        }
    }

    async fn process(&self, envelope: &SlackEnvelope) {
        let (channel_id, user_id) = correlation_fields(envelope);

        debug!(
            event_name = "ingress.slack.envelope_received",
            envelope_id = %envelope.envelope_id,
            event_type = ?envelope.event.event_type(),
            correlation_id = %envelope.envelope_id,
            channel_id = channel_id.unwrap_or("unknown"),
            user_id = user_id.unwrap_or("unknown"),
            "received slack envelope"
        );

        if let Err(error) = self.transport.acknowledge(&envelope.envelope_id).await {
            warn!(
                event_name = "ingress.slack.ack_sent",
                envelope_id = %envelope.envelope_id,
                correlation_id = %envelope.envelope_id,
                error = %error,
                "failed to acknowledge slack envelope"
            );
        }

        let context = EventContext { correlation_id: envelope.envelope_id.clone() };
        if let Err(error) = self.dispatcher.dispatch(envelope, &context).await {
            warn!(
                envelope_id = %envelope.envelope_id,
                correlation_id = %envelope.envelope_id,
                channel_id = channel_id.unwrap_or("unknown"),
                user_id = user_id.unwrap_or("unknown"),
                error = %error,
                "event dispatch failed; continuing socket loop"
            );
        }
    }
}

fn correlation_fields(envelope: &SlackEnvelope) -> (Option<&str>, Option<&str>) {
    match &envelope.event {
        SlackEvent::Message(event) => {
            (Some(event.channel_id.as_str()), Some(event.user_id.as_str()))
        }
        SlackEvent::Unsupported { .. } => (None, None),
    }
}
