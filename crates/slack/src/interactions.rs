//! Interactive callback handling for the order flow.
//!
//! Slack posts `payload=<url-encoded JSON>` for button clicks and dialog
//! submissions. The dispatcher checks method, decodes the payload, verifies
//! the token and then either opens the order dialog or validates the
//! requested delivery time and schedules the confirmation.

use std::{sync::Arc, time::Duration};

use brewbot_core::{
    orders::{FIELD_CHANNEL_ID, FIELD_MESSAGE_TS},
    ApplicationError, Clock, DeliveryWindow, DrinkType, InterfaceError, OrderStore,
};
use secrecy::{ExposeSecret, SecretString};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    api::SlackApi,
    blocks::{
        self, DialogValidationErrors, OrderSummary, ReplacementMessage, ACTION_COFFEE_ORDER,
        FIELD_TIME_TO_DELIVER,
    },
    events::EventContext,
};

const KIND_BUTTON_CLICK: &str = "interactive_message";
const KIND_DIALOG_SUBMIT: &str = "dialog_submission";
const DELIVERY_TIME_FORMAT: &str = "%H:%M";

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionEvent {
    ButtonClick {
        token: String,
        user_id: String,
        trigger_id: String,
        channel_id: String,
        message_ts: String,
        action_value: String,
    },
    DialogSubmit {
        token: String,
        user_id: String,
        channel_id: String,
        callback_id: String,
        submission: OrderSubmission,
    },
    Unsupported {
        kind: String,
        token: String,
    },
}

impl InteractionEvent {
    fn token(&self) -> &str {
        match self {
            Self::ButtonClick { token, .. }
            | Self::DialogSubmit { token, .. }
            | Self::Unsupported { token, .. } => token,
        }
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Deserialize)]
pub struct OrderSubmission {
    #[serde(rename = "timeToDeliver", default)]
    pub time_to_deliver: String,
    #[serde(default)]
    pub customization: Option<String>,
    #[serde(rename = "drinkType", default)]
    pub drink_type: Option<String>,
}

#[derive(Deserialize)]
struct IdRef {
    id: String,
}

#[derive(Deserialize)]
struct RawAction {
    #[serde(default)]
    value: String,
}

#[derive(Deserialize)]
struct RawButtonClick {
    token: String,
    user: IdRef,
    channel: IdRef,
    #[serde(default)]
    trigger_id: String,
    #[serde(default)]
    message_ts: String,
    #[serde(default)]
    actions: Vec<RawAction>,
}

#[derive(Deserialize)]
struct RawDialogSubmit {
    token: String,
    user: IdRef,
    channel: IdRef,
    #[serde(default)]
    callback_id: String,
    submission: OrderSubmission,
}

/// Pulls the `payload` field out of a form-encoded body and decodes it.
pub fn decode_interaction_body(body: &str) -> Result<InteractionEvent, ApplicationError> {
    let encoded = body
        .split('&')
        .find_map(|pair| pair.strip_prefix("payload="))
        .ok_or_else(|| ApplicationError::MalformedPayload("missing `payload` field".to_owned()))?;

    let plus_decoded = encoded.replace('+', " ");
    let decoded = urlencoding::decode(&plus_decoded)
        .map_err(|error| ApplicationError::MalformedPayload(error.to_string()))?;

    decode_interaction(&decoded)
}

pub fn decode_interaction(json: &str) -> Result<InteractionEvent, ApplicationError> {
    let malformed =
        |error: serde_json::Error| ApplicationError::MalformedPayload(error.to_string());
    let value: Value = serde_json::from_str(json).map_err(malformed)?;
    let kind = value.get("type").and_then(Value::as_str).map(str::to_owned);

    match kind.as_deref() {
        Some(KIND_BUTTON_CLICK) => {
            let raw: RawButtonClick = serde_json::from_value(value).map_err(malformed)?;
            Ok(InteractionEvent::ButtonClick {
                token: raw.token,
                user_id: raw.user.id,
                trigger_id: raw.trigger_id,
                channel_id: raw.channel.id,
                message_ts: raw.message_ts,
                action_value: raw
                    .actions
                    .into_iter()
                    .next()
                    .map(|action| action.value)
                    .unwrap_or_default(),
            })
        }
        Some(KIND_DIALOG_SUBMIT) => {
            let raw: RawDialogSubmit = serde_json::from_value(value).map_err(malformed)?;
            Ok(InteractionEvent::DialogSubmit {
                token: raw.token,
                user_id: raw.user.id,
                channel_id: raw.channel.id,
                callback_id: raw.callback_id,
                submission: raw.submission,
            })
        }
        Some(kind) => Ok(InteractionEvent::Unsupported {
            kind: kind.to_owned(),
            token: value.get("token").and_then(Value::as_str).unwrap_or_default().to_owned(),
        }),
        None => Err(ApplicationError::MalformedPayload("missing payload `type`".to_owned())),
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum InteractionResponse {
    Replace(ReplacementMessage),
    ValidationFailed(DialogValidationErrors),
    Accepted,
    Rejected(InterfaceError),
}

impl InteractionResponse {
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Replace(_) | Self::ValidationFailed(_) | Self::Accepted => 200,
            Self::Rejected(InterfaceError::MethodNotAllowed { .. }) => 405,
            Self::Rejected(InterfaceError::Unauthorized { .. }) => 401,
            Self::Rejected(InterfaceError::Internal { .. }) => 500,
        }
    }
}

#[derive(Clone, Debug)]
pub struct InteractionSettings {
    pub verification_token: SecretString,
    pub bot_id: String,
    pub confirmation_delay: Duration,
    pub window: DeliveryWindow,
}

#[derive(Clone)]
pub struct InteractionDispatcher {
    api: Arc<dyn SlackApi>,
    store: OrderStore,
    settings: InteractionSettings,
    clock: Arc<dyn Clock>,
}

impl InteractionDispatcher {
    pub fn new(
        api: Arc<dyn SlackApi>,
        store: OrderStore,
        settings: InteractionSettings,
        clock: Arc<dyn Clock>,
    ) -> Self {
        Self { api, store, settings, clock }
    }

    pub fn store(&self) -> &OrderStore {
        &self.store
    }

    pub async fn handle(
        &self,
        method: &str,
        body: &str,
        ctx: &EventContext,
    ) -> InteractionResponse {
        match self.try_handle(method, body, ctx).await {
            Ok(response) => response,
            Err(failure) => {
                match &failure {
                    ApplicationError::PlatformCallFailed(_) => error!(
                        event_name = "interaction.rejected",
                        correlation_id = %ctx.correlation_id,
                        error = %failure,
                        "interaction failed on platform call"
                    ),
                    _ => warn!(
                        event_name = "interaction.rejected",
                        correlation_id = %ctx.correlation_id,
                        error = %failure,
                        "interaction rejected"
                    ),
                }
                InteractionResponse::Rejected(failure.into_interface(ctx.correlation_id.clone()))
            }
        }
    }

    async fn try_handle(
        &self,
        method: &str,
        body: &str,
        ctx: &EventContext,
    ) -> Result<InteractionResponse, ApplicationError> {
        if method != "POST" {
            return Err(ApplicationError::MethodNotAllowed(method.to_owned()));
        }

        let event = decode_interaction_body(body)?;
        if event.token() != self.settings.verification_token.expose_secret() {
            return Err(ApplicationError::Unauthorized);
        }

        match event {
            InteractionEvent::ButtonClick {
                user_id,
                trigger_id,
                channel_id,
                message_ts,
                action_value,
                ..
            } => {
                if action_value != ACTION_COFFEE_ORDER {
                    debug!(
                        correlation_id = %ctx.correlation_id,
                        user_id = %user_id,
                        action_value = %action_value,
                        "ignoring click on unknown action"
                    );
                    return Ok(InteractionResponse::Accepted);
                }
                self.on_button_click(&user_id, &trigger_id, &channel_id, &message_ts, ctx).await
            }
            InteractionEvent::DialogSubmit { user_id, channel_id, submission, .. } => {
                Ok(self.on_dialog_submit(&user_id, &channel_id, &submission, ctx).await)
            }
            InteractionEvent::Unsupported { kind, .. } => {
                debug!(
                    correlation_id = %ctx.correlation_id,
                    kind = %kind,
                    "ignoring unsupported interaction payload"
                );
                Ok(InteractionResponse::Accepted)
            }
        }
    }

    async fn on_button_click(
        &self,
        user_id: &str,
        trigger_id: &str,
        channel_id: &str,
        message_ts: &str,
        ctx: &EventContext,
    ) -> Result<InteractionResponse, ApplicationError> {
        self.store
            .update(user_id, |order| {
                order.set(FIELD_MESSAGE_TS, message_ts);
                order.set(FIELD_CHANNEL_ID, channel_id);
            })
            .await;

        self.api
            .open_dialog(trigger_id, &blocks::order_dialog(user_id))
            .await
            .map_err(|error| ApplicationError::PlatformCallFailed(error.to_string()))?;

        info!(
            event_name = "order.dialog.opened",
            correlation_id = %ctx.correlation_id,
            user_id,
            channel_id,
            message_ts,
            "opened order dialog"
        );
        Ok(InteractionResponse::Replace(blocks::taking_order_message(message_ts)))
    }

    async fn on_dialog_submit(
        &self,
        user_id: &str,
        channel_id: &str,
        submission: &OrderSubmission,
        ctx: &EventContext,
    ) -> InteractionResponse {
        let deliver_at =
            match self.settings.window.validate(&submission.time_to_deliver, self.clock.now()) {
                Ok(deliver_at) => deliver_at,
                Err(rejection) => {
                    info!(
                        event_name = "order.submission.rejected",
                        correlation_id = %ctx.correlation_id,
                        user_id,
                        channel_id,
                        reason = %rejection,
                        "delivery time rejected"
                    );
                    return InteractionResponse::ValidationFailed(DialogValidationErrors::single(
                        FIELD_TIME_TO_DELIVER,
                        rejection.to_string(),
                    ));
                }
            };

        let summary = OrderSummary {
            drink: drink_label(submission.drink_type.as_deref()),
            deliver_at: deliver_at.format(DELIVERY_TIME_FORMAT).to_string(),
            customization: submission
                .customization
                .as_deref()
                .map(str::trim)
                .filter(|text| !text.is_empty())
                .map(str::to_owned),
        };

        info!(
            event_name = "order.submission.accepted",
            correlation_id = %ctx.correlation_id,
            user_id,
            channel_id,
            deliver_at = %summary.deliver_at,
            "order accepted; confirmation scheduled"
        );
        self.spawn_confirmation(user_id, channel_id, summary, ctx).await;
        InteractionResponse::Accepted
    }

    /// Posts the confirmation after the configured delay, then clears the
    /// pending order unless a newer click replaced it meanwhile.
    async fn spawn_confirmation(
        &self,
        user_id: &str,
        channel_id: &str,
        summary: OrderSummary,
        ctx: &EventContext,
    ) {
        let expected_ts = self.store.get(user_id, FIELD_MESSAGE_TS).await;
        let api = Arc::clone(&self.api);
        let store = self.store.clone();
        let delay = self.settings.confirmation_delay;
        let message = blocks::order_confirmation_message(&self.settings.bot_id, &summary);
        let user_id = user_id.to_owned();
        let channel_id = channel_id.to_owned();
        let correlation_id = ctx.correlation_id.clone();

        tokio::spawn(async move {
            tokio::time::sleep(delay).await;

            match api.post_message(&channel_id, &message).await {
                Ok(posted) => info!(
                    event_name = "order.confirmation.posted",
                    correlation_id = %correlation_id,
                    user_id = %user_id,
                    channel_id = %posted.channel_id,
                    "posted order confirmation"
                ),
                Err(failure) => error!(
                    event_name = "order.confirmation.failed",
                    correlation_id = %correlation_id,
                    user_id = %user_id,
                    channel_id = %channel_id,
                    error = %failure,
                    "order confirmation could not be posted"
                ),
            }

            store.remove_if(&user_id, |order| order.message_ts() == expected_ts.as_deref()).await;
        });
    }
}

fn drink_label(raw: Option<&str>) -> String {
    match raw {
        Some(value) => DrinkType::from_value(value)
            .map_or_else(|| value.to_owned(), |drink| drink.label().to_owned()),
        None => "Coffee".to_owned(),
    }
}
