use brewbot_core::config::AppConfig;
use secrecy::ExposeSecret;

/// Effective configuration with every secret reduced to its prefix.
pub fn render_summary(config: &AppConfig) -> String {
    let app_token = config
        .slack
        .app_token
        .as_ref()
        .map_or_else(|| "<unset>".to_string(), |token| redact_token(token.expose_secret()));

    let lines = [
        "effective config (source precedence: overrides > env > file > default):".to_string(),
        render_line("slack.bot_token", &redact_token(config.slack.bot_token.expose_secret())),
        render_line("slack.app_token", &app_token),
        render_line(
            "slack.verification_token",
            &redact_token(config.slack.verification_token.expose_secret()),
        ),
        render_line("slack.bot_id", &config.slack.bot_id),
        render_line("server.bind_address", &config.server.bind_address),
        render_line("server.port", &config.server.port.to_string()),
        render_line(
            "server.graceful_shutdown_secs",
            &config.server.graceful_shutdown_secs.to_string(),
        ),
        render_line(
            "order.confirmation_delay_ms",
            &config.order.confirmation_delay_ms.to_string(),
        ),
        render_line("order.min_lead_minutes", &config.order.min_lead_minutes.to_string()),
        render_line("order.utc_offset_hours", &config.order.utc_offset_hours.to_string()),
        render_line("order.pending_ttl_secs", &config.order.pending_ttl_secs.to_string()),
        render_line("order.sweep_interval_secs", &config.order.sweep_interval_secs.to_string()),
        render_line("logging.level", &config.logging.level),
        render_line("logging.format", &format!("{:?}", config.logging.format).to_lowercase()),
    ];

    lines.join("\n")
}

fn render_line(key: &str, value: &str) -> String {
    format!("- {key} = {value}")
}

fn redact_token(token: &str) -> String {
    let trimmed = token.trim();
    if trimmed.is_empty() {
        return "<empty>".to_string();
    }

    if let Some((prefix, _)) = trimmed.split_once('-') {
        return format!("{prefix}-***");
    }

    "<redacted>".to_string()
}
