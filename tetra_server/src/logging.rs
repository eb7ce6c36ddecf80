//! Structured logging setup.
//!
//! Library code logs through the `log` facade; the subscriber installed here
//! picks those records up alongside native `tracing` events.

use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

const DEFAULT_FILTER: &str = "info,sqlx=warn,hyper=warn,reqwest=warn";

/// Initialize logging. `RUST_LOG` overrides the default filter.
///
/// # Example
///
/// ```no_run
/// use tetra_server::logging;
///
/// logging::init();
/// tracing::info!("Server starting");
/// ```
pub fn init() {
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_FILTER));

    let fmt_layer = tracing_subscriber::fmt::layer()
        .with_target(true)
        .with_line_number(true);

    tracing_subscriber::registry()
        .with(env_filter)
        .with(fmt_layer)
        .init();
}

/// Log the outcome of an API call that changed tournament state.
pub fn log_tournament_event(event: &str, guild_id: &str, tournament_id: i64, detail: &str) {
    tracing::info!(
        event = event,
        guild_id = guild_id,
        tournament_id = tournament_id,
        "{}",
        detail
    );
}

/// Log a failed API call. Server-side failures are warnings.
pub fn log_api_error(path: &str, status: u16, message: &str) {
    if status >= 500 {
        tracing::warn!(http_path = path, http_status = status, "API error: {}", message);
    } else {
        tracing::debug!(http_path = path, http_status = status, "API rejection: {}", message);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_helpers_do_not_panic() {
        log_tournament_event("register", "guild", 1, "player joined");
        log_api_error("/api/v1/players/1", 404, "Player not found");
        log_api_error("/health", 503, "store unreachable");
    }
}
