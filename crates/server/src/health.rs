use axum::{extract::State, http::StatusCode, routing::get, Json, Router};
use brewbot_core::OrderStore;
use chrono::Utc;
use serde::Serialize;

#[derive(Clone)]
pub struct HealthState {
    store: OrderStore,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub pending_orders: usize,
    pub checked_at: String,
}

pub fn router(store: OrderStore) -> Router {
    Router::new().route("/health", get(health)).with_state(HealthState { store })
}

pub async fn health(State(state): State<HealthState>) -> (StatusCode, Json<HealthResponse>) {
    let payload = HealthResponse {
        status: "ready",
        pending_orders: state.store.len().await,
        checked_at: Utc::now().to_rfc3339(),
    };

    (StatusCode::OK, Json(payload))
}

#[cfg(test)]
mod tests {
    use axum::{extract::State, http::StatusCode, Json};
    use brewbot_core::OrderStore;

    use crate::health::{health, HealthState};

    #[tokio::test]
    async fn health_reports_pending_order_count() {
        let store = OrderStore::new();
        store.set("U1", "message_ts", "1.0").await;
        store.set("U2", "message_ts", "2.0").await;

        let (status, Json(payload)) = health(State(HealthState { store })).await;

        assert_eq!(status, StatusCode::OK);
        assert_eq!(payload.status, "ready");
        assert_eq!(payload.pending_orders, 2);
        assert!(!payload.checked_at.is_empty());
    }
}
