//! HTTP API for tournament registration and rosters.
//!
//! # Endpoints Overview
//!
//! ## Tournaments (scoped to a guild)
//! - `POST /api/v1/guilds/{guild_id}/tournaments` - Create tournament
//! - `GET /api/v1/guilds/{guild_id}/tournaments?q=` - Autocomplete by name
//! - `GET /api/v1/guilds/{guild_id}/tournaments/{id}` - Details embed
//! - `PATCH /api/v1/guilds/{guild_id}/tournaments/{id}` - Edit
//! - `POST /api/v1/guilds/{guild_id}/tournaments/{id}/status` - Open, close or finish
//! - `POST /api/v1/guilds/{guild_id}/tournaments/{id}/register` - Register a player
//! - `POST /api/v1/guilds/{guild_id}/tournaments/{id}/unregister` - Remove a registration
//! - `POST /api/v1/guilds/{guild_id}/tournaments/{id}/check-in` - Check a player in
//! - `GET /api/v1/guilds/{guild_id}/tournaments/{id}/players` - Rendered roster
//!
//! ## Players
//! - `DELETE /api/v1/players/{discord_id}` - Delete a player everywhere
//!
//! ## Health Check
//! - `GET /health` - Server health status
//!
//! A refused registration is not an error: it answers `200 OK` with
//! `"allowed": false` and the denial reason.

pub mod players;
pub mod tournaments;

use axum::{
    Json, Router,
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tetra_tourney::{
    db::StoreError,
    roster::RenderError,
    tetrio::ProviderError,
    tournament::{TournamentError, TournamentManager},
};
use tower_http::cors::CorsLayer;

use crate::logging;

/// Application state shared across all HTTP handlers.
#[derive(Clone)]
pub struct AppState {
    pub manager: Arc<TournamentManager>,
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

pub type ApiResult<T> = Result<Json<T>, ApiError>;

/// Build an error response with an explicit status.
pub fn api_error(status: StatusCode, message: impl Into<String>) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: message.into(),
        }),
    )
}

/// Map a manager error to a status code and a client-safe message.
pub fn error_response(path: &str, err: TournamentError) -> ApiError {
    let status = match &err {
        TournamentError::NotFound(_)
        | TournamentError::PlayerNotFound(_)
        | TournamentError::Provider(ProviderError::NotFound(_)) => StatusCode::NOT_FOUND,
        TournamentError::NotEditable(_)
        | TournamentError::NotRegistered
        | TournamentError::ConcurrentModification(_)
        | TournamentError::Store(StoreError::AccountLinked(_)) => StatusCode::CONFLICT,
        TournamentError::InvalidInput(_) => StatusCode::BAD_REQUEST,
        TournamentError::UnsupportedGame(_) => StatusCode::UNPROCESSABLE_ENTITY,
        TournamentError::Render(RenderError::UnsupportedFormat(_)) => StatusCode::NOT_IMPLEMENTED,
        TournamentError::Provider(_) => StatusCode::BAD_GATEWAY,
        TournamentError::Store(_) | TournamentError::Rank(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };

    if status.is_server_error() {
        logging::log_api_error(path, status.as_u16(), &err.to_string());
    }

    api_error(status, err.client_message())
}

/// Create the API router with all endpoints and middleware.
pub fn create_router(state: AppState) -> Router {
    let v1_routes = Router::new()
        .route(
            "/guilds/{guild_id}/tournaments",
            post(tournaments::create_tournament).get(tournaments::search_tournaments),
        )
        .route(
            "/guilds/{guild_id}/tournaments/{tournament_id}",
            get(tournaments::get_tournament).patch(tournaments::edit_tournament),
        )
        .route(
            "/guilds/{guild_id}/tournaments/{tournament_id}/status",
            post(tournaments::set_status),
        )
        .route(
            "/guilds/{guild_id}/tournaments/{tournament_id}/register",
            post(tournaments::register),
        )
        .route(
            "/guilds/{guild_id}/tournaments/{tournament_id}/unregister",
            post(tournaments::unregister),
        )
        .route(
            "/guilds/{guild_id}/tournaments/{tournament_id}/check-in",
            post(tournaments::check_in),
        )
        .route(
            "/guilds/{guild_id}/tournaments/{tournament_id}/players",
            get(players::list_players),
        )
        .route(
            "/players/{discord_id}",
            get(players::player_info).delete(players::delete_player),
        );

    Router::new()
        .route("/health", get(health_check))
        .nest("/api/v1", v1_routes)
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Health check endpoint.
///
/// Returns `200 OK` when the store answers, `503` otherwise.
async fn health_check(State(state): State<AppState>) -> impl IntoResponse {
    let store_healthy = state.manager.health_check().await.is_ok();

    let status_code = if store_healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    let response = json!({
        "status": if store_healthy { "healthy" } else { "unhealthy" },
        "version": env!("CARGO_PKG_VERSION"),
        "store": store_healthy,
    });

    (status_code, Json(response))
}
