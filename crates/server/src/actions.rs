use axum::{
    body::Bytes,
    extract::State,
    http::{header, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::any,
    Json, Router,
};
use brewbot_slack::{
    events::EventContext,
    interactions::{InteractionDispatcher, InteractionResponse},
};
use serde_json::json;
use uuid::Uuid;

pub const ACTIONS_PATH: &str = "/slack/message_actions";

pub fn router(dispatcher: InteractionDispatcher) -> Router {
    // Every method reaches the handler so non-POST requests get the JSON 405.
    Router::new().route(ACTIONS_PATH, any(message_actions)).with_state(dispatcher)
}

pub async fn message_actions(
    State(dispatcher): State<InteractionDispatcher>,
    method: Method,
    body: Bytes,
) -> Response {
    let context = EventContext { correlation_id: format!("req-{}", Uuid::new_v4()) };
    let body = String::from_utf8_lossy(&body);

    let response = dispatcher.handle(method.as_str(), &body, &context).await;
    render(response)
}

fn render(response: InteractionResponse) -> Response {
    let status =
        StatusCode::from_u16(response.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    match response {
        InteractionResponse::Replace(message) => (status, Json(message)).into_response(),
        InteractionResponse::ValidationFailed(errors) => (status, Json(errors)).into_response(),
        InteractionResponse::Accepted => {
            (status, [(header::CONTENT_TYPE, "application/json")]).into_response()
        }
        InteractionResponse::Rejected(error) => (
            status,
            Json(json!({
                "error": error.user_message(),
                "correlation_id": error.correlation_id(),
            })),
        )
            .into_response(),
    }
}
