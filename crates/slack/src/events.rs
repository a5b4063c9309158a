use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, info};

use crate::{
    api::{PostedMessage, SlackApi, SlackApiError},
    blocks,
};

pub const ORDER_COMMAND: &str = "order";

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct SlackEnvelope {
    pub envelope_id: String,
    pub event: SlackEvent,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum SlackEvent {
    Message(MessageEvent),
    Unsupported { event_type: String },
}

impl SlackEvent {
    pub fn event_type(&self) -> SlackEventType {
        match self {
            Self::Message(_) => SlackEventType::Message,
            Self::Unsupported { .. } => SlackEventType::Unsupported,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum SlackEventType {
    Message,
    Unsupported,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MessageEvent {
    pub channel_id: String,
    pub user_id: String,
    pub text: String,
    pub ts: String,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventContext {
    pub correlation_id: String,
}

impl Default for EventContext {
    fn default() -> Self {
        Self { correlation_id: "unknown-correlation-id".to_owned() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum HandlerResult {
    Posted(PostedMessage),
    Ignored,
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum EventHandlerError {
    #[error(transparent)]
    Platform(#[from] SlackApiError),
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DispatchError {
    #[error(transparent)]
    Handler(#[from] EventHandlerError),
}

#[async_trait]
pub trait EventHandler: Send + Sync {
    fn event_type(&self) -> SlackEventType;
    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError>;
}

#[derive(Default)]
pub struct EventDispatcher {
    handlers: HashMap<SlackEventType, Arc<dyn EventHandler>>,
}

impl EventDispatcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<H>(&mut self, handler: H)
    where
        H: EventHandler + 'static,
    {
        self.handlers.insert(handler.event_type(), Arc::new(handler));
    }

    pub async fn dispatch(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, DispatchError> {
        let Some(handler) = self.handlers.get(&envelope.event.event_type()) else {
            return Ok(HandlerResult::Ignored);
        };

        handler.handle(envelope, ctx).await.map_err(DispatchError::from)
    }

    pub fn handler_count(&self) -> usize {
        self.handlers.len()
    }
}

pub fn order_dispatcher(api: Arc<dyn SlackApi>, bot_id: impl Into<String>) -> EventDispatcher {
    let mut dispatcher = EventDispatcher::new();
    dispatcher.register(MentionHandler::new(api, bot_id));
    dispatcher
}

/// Posts the order prompt when someone writes `<@bot> order ...`.
pub struct MentionHandler {
    api: Arc<dyn SlackApi>,
    bot_id: String,
}

impl MentionHandler {
    pub fn new(api: Arc<dyn SlackApi>, bot_id: impl Into<String>) -> Self {
        Self { api, bot_id: bot_id.into() }
    }
}

#[async_trait]
impl EventHandler for MentionHandler {
    fn event_type(&self) -> SlackEventType {
        SlackEventType::Message
    }

    async fn handle(
        &self,
        envelope: &SlackEnvelope,
        ctx: &EventContext,
    ) -> Result<HandlerResult, EventHandlerError> {
        let SlackEvent::Message(event) = &envelope.event else {
            return Ok(HandlerResult::Ignored);
        };

        let Some(command) = mention_command(&event.text, &self.bot_id) else {
            return Ok(HandlerResult::Ignored);
        };
        if command != ORDER_COMMAND {
            debug!(
                correlation_id = %ctx.correlation_id,
                channel_id = %event.channel_id,
                command,
                "mention without order command ignored"
            );
            return Ok(HandlerResult::Ignored);
        }

        let prompt = blocks::order_prompt_message(&self.bot_id);
        let posted = self.api.post_message(&event.channel_id, &prompt).await?;
        info!(
            event_name = "order.prompt.posted",
            correlation_id = %ctx.correlation_id,
            channel_id = %posted.channel_id,
            user_id = %event.user_id,
            message_ts = %posted.ts,
            "posted order prompt"
        );

        Ok(HandlerResult::Posted(posted))
    }
}

/// First word after an exact `<@BOT_ID> ` prefix, or `None` when the text
/// is not addressed to the bot.
pub fn mention_command<'a>(text: &'a str, bot_id: &str) -> Option<&'a str> {
    let rest = text.strip_prefix("<@")?.strip_prefix(bot_id)?.strip_prefix("> ")?;
    Some(rest.split_whitespace().next().unwrap_or_default())
}
