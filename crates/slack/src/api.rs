//! Outbound Slack Web API calls.
//!
//! Slack answers most application-level failures with HTTP 200 and
//! `{"ok": false, "error": "..."}`, so both the status and the `ok` flag
//! are checked. Nothing here retries.

use async_trait::async_trait;
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use serde_json::{json, Value};
use thiserror::Error;

use crate::blocks::{Dialog, MessageTemplate};

pub const SLACK_API_BASE_URL: &str = "https://slack.com/api";

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SlackApiError {
    #[error("slack `{method}` request failed: {detail}")]
    Http { method: String, detail: String },
    #[error("slack `{method}` returned error `{error}`")]
    Api { method: String, error: String },
    #[error("slack `{method}` returned an unreadable response: {detail}")]
    Decode { method: String, detail: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PostedMessage {
    pub channel_id: String,
    pub ts: String,
}

#[async_trait]
pub trait SlackApi: Send + Sync {
    async fn post_message(
        &self,
        channel_id: &str,
        message: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError>;

    async fn open_dialog(&self, trigger_id: &str, dialog: &Dialog) -> Result<(), SlackApiError>;
}

pub struct WebApiClient {
    client: Client,
    bot_token: SecretString,
    base_url: String,
}

impl WebApiClient {
    pub fn new(bot_token: SecretString) -> Self {
        Self::with_base_url(bot_token, SLACK_API_BASE_URL)
    }

    pub fn with_base_url(bot_token: SecretString, base_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            bot_token,
            base_url: base_url.into().trim_end_matches('/').to_owned(),
        }
    }

    async fn call<B>(&self, method: &str, body: &B) -> Result<Value, SlackApiError>
    where
        B: Serialize + ?Sized,
    {
        let url = format!("{}/{method}", self.base_url);
        let response = self
            .client
            .post(&url)
            .bearer_auth(self.bot_token.expose_secret())
            .json(body)
            .send()
            .await
            .map_err(|error| SlackApiError::Http {
                method: method.to_owned(),
                detail: error.to_string(),
            })?;

        let status = response.status();
        let text = response.text().await.map_err(|error| SlackApiError::Http {
            method: method.to_owned(),
            detail: error.to_string(),
        })?;

        if !status.is_success() {
            return Err(SlackApiError::Http {
                method: method.to_owned(),
                detail: format!("status {status}: {text}"),
            });
        }

        parse_api_response(method, &text)
    }
}

#[async_trait]
impl SlackApi for WebApiClient {
    async fn post_message(
        &self,
        channel_id: &str,
        message: &MessageTemplate,
    ) -> Result<PostedMessage, SlackApiError> {
        let body = json!({
            "channel": channel_id,
            "text": message.text,
            "attachments": message.attachments,
        });
        let response = self.call("chat.postMessage", &body).await?;

        Ok(PostedMessage {
            channel_id: response
                .get("channel")
                .and_then(Value::as_str)
                .unwrap_or(channel_id)
                .to_owned(),
            ts: response.get("ts").and_then(Value::as_str).unwrap_or_default().to_owned(),
        })
    }

    async fn open_dialog(&self, trigger_id: &str, dialog: &Dialog) -> Result<(), SlackApiError> {
        let body = json!({ "trigger_id": trigger_id, "dialog": dialog });
        self.call("dialog.open", &body).await.map(|_| ())
    }
}

fn parse_api_response(method: &str, text: &str) -> Result<Value, SlackApiError> {
    let value: Value = serde_json::from_str(text).map_err(|error| SlackApiError::Decode {
        method: method.to_owned(),
        detail: error.to_string(),
    })?;

    if value.get("ok").and_then(Value::as_bool) == Some(true) {
        return Ok(value);
    }

    let error = value.get("error").and_then(Value::as_str).unwrap_or("unknown").to_owned();
    Err(SlackApiError::Api { method: method.to_owned(), error })
}

#[cfg(test)]
mod tests {
    use super::{parse_api_response, SlackApiError};

    #[test]
    fn ok_response_is_returned() {
        let value = parse_api_response("chat.postMessage", r#"{"ok":true,"ts":"1.2"}"#)
            .expect("ok response");
        assert_eq!(value["ts"], "1.2");
    }

    #[test]
    fn application_error_is_surfaced_with_method() {
        let body = r#"{"ok":false,"error":"expired_trigger_id"}"#;
        let error = parse_api_response("dialog.open", body).expect_err("api error");
        assert_eq!(
            error,
            SlackApiError::Api {
                method: "dialog.open".to_owned(),
                error: "expired_trigger_id".to_owned()
            }
        );
        assert_eq!(error.to_string(), "slack `dialog.open` returned error `expired_trigger_id`");
    }

    #[test]
    fn missing_ok_flag_is_treated_as_failure() {
        let error = parse_api_response("chat.postMessage", r#"{"ts":"1.2"}"#).expect_err("failure");
        assert!(matches!(error, SlackApiError::Api { ref error, .. } if error == "unknown"));
    }

    #[test]
    fn non_json_body_is_a_decode_error() {
        let error = parse_api_response("chat.postMessage", "<html>").expect_err("decode failure");
        assert!(matches!(error, SlackApiError::Decode { .. }));
    }
}
