use std::sync::Arc;

use brewbot_core::{
    config::{AppConfig, ConfigError},
    OrderStore, SystemClock,
};
use brewbot_slack::{
    api::{SlackApi, WebApiClient},
    events::order_dispatcher,
    interactions::{InteractionDispatcher, InteractionSettings},
    socket::{NoopSocketTransport, ReconnectPolicy, SocketModeRunner, SocketTransport},
    transport::WebSocketTransport,
};
use thiserror::Error;
use tracing::info;

/// Shared handles built once at startup and passed to every task.
#[derive(Clone)]
pub struct AppContext {
    pub config: AppConfig,
    pub store: OrderStore,
    pub interactions: InteractionDispatcher,
}

pub struct Application {
    pub context: AppContext,
    pub slack_runner: SocketModeRunner,
    pub transport_mode: &'static str,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let window = config.order.delivery_window()?;
    let api: Arc<dyn SlackApi> = Arc::new(WebApiClient::new(config.slack.bot_token.clone()));
    let store = OrderStore::new();

    let interactions = InteractionDispatcher::new(
        Arc::clone(&api),
        store.clone(),
        InteractionSettings {
            verification_token: config.slack.verification_token.clone(),
            bot_id: config.slack.bot_id.clone(),
            confirmation_delay: config.order.confirmation_delay(),
            window,
        },
        Arc::new(SystemClock),
    );

    let (transport, transport_mode): (Arc<dyn SocketTransport>, &'static str) =
        match &config.slack.app_token {
            Some(app_token) => (Arc::new(WebSocketTransport::new(app_token.clone())), "socket"),
            None => (Arc::new(NoopSocketTransport), "noop"),
        };
    let slack_runner = SocketModeRunner::new(
        transport,
        order_dispatcher(api, config.slack.bot_id.clone()),
        ReconnectPolicy::default(),
    );

    info!(
        event_name = "system.bootstrap.ready",
        correlation_id = "bootstrap",
        transport_mode,
        "application bootstrap complete"
    );

    Ok(Application {
        context: AppContext { config, store, interactions },
        slack_runner,
        transport_mode,
    })
}
