//! Tournament management API handlers.
//!
//! Register a player:
//! ```bash
//! curl -X POST http://localhost:8080/api/v1/guilds/42/tournaments/1/register \
//!   -H "Content-Type: application/json" \
//!   -d '{"discord_id": "1234", "tetrio_username": "osk"}'
//! ```

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tetra_tourney::{
    rank::Tier,
    roster::EmbedPayload,
    tournament::{NewTournament, Tournament, TournamentChoice, TournamentEdit, TournamentId, TournamentStatus},
};

use super::{ApiResult, AppState, error_response};
use crate::logging;

#[derive(Debug, Deserialize)]
pub struct CreateTournamentRequest {
    pub organized_by: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub game: Option<String>,
    #[serde(default)]
    pub max_players: Option<u32>,
    #[serde(default)]
    pub rank_cap: Option<String>,
    #[serde(default)]
    pub tr_cap: Option<u32>,
    #[serde(default)]
    pub country_lock: Option<String>,
    #[serde(default)]
    pub add_roles: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct SearchQuery {
    #[serde(default)]
    pub q: String,
}

#[derive(Debug, Deserialize)]
pub struct StatusRequest {
    pub status: TournamentStatus,
}

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub discord_id: String,
    pub tetrio_username: String,
}

#[derive(Debug, Deserialize)]
pub struct PlayerRequest {
    pub discord_id: String,
}

#[derive(Debug, Serialize)]
pub struct RegistrationResponse {
    pub allowed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
    pub roles_to_add: Vec<String>,
    pub registered_count: usize,
}

#[derive(Debug, Serialize)]
pub struct CheckInResponse {
    pub checked_in: bool,
    pub already_checked_in: bool,
}

#[derive(Debug, Serialize)]
pub struct UnregisterResponse {
    pub unregistered: bool,
}

type TournamentPath = Path<(String, TournamentId)>;

fn path_of(guild_id: &str, tournament_id: TournamentId, action: &str) -> String {
    format!("/api/v1/guilds/{guild_id}/tournaments/{tournament_id}/{action}")
        .trim_end_matches('/')
        .to_string()
}

/// Create a tournament.
///
/// Returns `201 Created` with the stored tournament. The rank cap is given
/// as a tier label such as `"s+"`.
pub async fn create_tournament(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    Json(request): Json<CreateTournamentRequest>,
) -> Result<(StatusCode, Json<Tournament>), super::ApiError> {
    let rank_cap = request
        .rank_cap
        .as_deref()
        .map(str::parse::<Tier>)
        .transpose()
        .map_err(|e| super::api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let mut new = NewTournament::tetrio(guild_id.clone(), request.organized_by, request.name);
    new.description = request.description;
    if let Some(game) = request.game {
        new.game = game.trim().to_uppercase();
    }
    new.max_players = request.max_players;
    new.rank_cap = rank_cap;
    new.tr_cap = request.tr_cap;
    new.country_lock = request.country_lock;
    new.add_roles = request.add_roles;

    let tournament = state
        .manager
        .create_tournament(new)
        .await
        .map_err(|e| error_response(&format!("/api/v1/guilds/{guild_id}/tournaments"), e))?;

    logging::log_tournament_event("create", &guild_id, tournament.id, &tournament.name);
    Ok((StatusCode::CREATED, Json(tournament)))
}

/// Autocomplete tournament names in a guild.
pub async fn search_tournaments(
    State(state): State<AppState>,
    Path(guild_id): Path<String>,
    Query(query): Query<SearchQuery>,
) -> ApiResult<Vec<TournamentChoice>> {
    state
        .manager
        .search_tournaments(&guild_id, &query.q)
        .await
        .map(Json)
        .map_err(|e| error_response(&format!("/api/v1/guilds/{guild_id}/tournaments"), e))
}

/// Tournament details as a chat embed.
pub async fn get_tournament(
    State(state): State<AppState>,
    Path((guild_id, tournament_id)): TournamentPath,
) -> ApiResult<EmbedPayload> {
    state
        .manager
        .tournament_details(&guild_id, tournament_id)
        .await
        .map(Json)
        .map_err(|e| error_response(&path_of(&guild_id, tournament_id, ""), e))
}

/// Apply an organizer edit. Finished tournaments answer `409 Conflict`.
pub async fn edit_tournament(
    State(state): State<AppState>,
    Path((guild_id, tournament_id)): TournamentPath,
    Json(edit): Json<TournamentEdit>,
) -> ApiResult<Tournament> {
    let tournament = state
        .manager
        .edit_tournament(&guild_id, tournament_id, edit)
        .await
        .map_err(|e| error_response(&path_of(&guild_id, tournament_id, ""), e))?;

    logging::log_tournament_event("edit", &guild_id, tournament_id, &tournament.name);
    Ok(Json(tournament))
}

pub async fn set_status(
    State(state): State<AppState>,
    Path((guild_id, tournament_id)): TournamentPath,
    Json(request): Json<StatusRequest>,
) -> ApiResult<Tournament> {
    let tournament = state
        .manager
        .set_status(&guild_id, tournament_id, request.status)
        .await
        .map_err(|e| error_response(&path_of(&guild_id, tournament_id, "status"), e))?;

    logging::log_tournament_event("status", &guild_id, tournament_id, request.status.as_str());
    Ok(Json(tournament))
}

/// Register a player.
///
/// # Response
///
/// ```json
/// { "allowed": false, "reason": "tier above cap", "roles_to_add": [], "registered_count": 12 }
/// ```
///
/// # Errors
///
/// - `404 Not Found`: Tournament or TETR.IO user doesn't exist
/// - `409 Conflict`: Account linked elsewhere, or the tournament kept changing
/// - `502 Bad Gateway`: TETR.IO unreachable
pub async fn register(
    State(state): State<AppState>,
    Path((guild_id, tournament_id)): TournamentPath,
    Json(request): Json<RegisterRequest>,
) -> ApiResult<RegistrationResponse> {
    let outcome = state
        .manager
        .register_player(
            &guild_id,
            tournament_id,
            &request.discord_id,
            &request.tetrio_username,
        )
        .await
        .map_err(|e| error_response(&path_of(&guild_id, tournament_id, "register"), e))?;

    if outcome.decision.is_allowed() {
        logging::log_tournament_event("register", &guild_id, tournament_id, &request.discord_id);
    }

    Ok(Json(RegistrationResponse {
        allowed: outcome.decision.is_allowed(),
        reason: outcome.decision.reason().map(|r| r.message().to_string()),
        roles_to_add: outcome.roles_to_add,
        registered_count: outcome.registered_count,
    }))
}

pub async fn unregister(
    State(state): State<AppState>,
    Path((guild_id, tournament_id)): TournamentPath,
    Json(request): Json<PlayerRequest>,
) -> ApiResult<UnregisterResponse> {
    state
        .manager
        .unregister_player(&guild_id, tournament_id, &request.discord_id)
        .await
        .map_err(|e| error_response(&path_of(&guild_id, tournament_id, "unregister"), e))?;

    logging::log_tournament_event("unregister", &guild_id, tournament_id, &request.discord_id);
    Ok(Json(UnregisterResponse { unregistered: true }))
}

pub async fn check_in(
    State(state): State<AppState>,
    Path((guild_id, tournament_id)): TournamentPath,
    Json(request): Json<PlayerRequest>,
) -> ApiResult<CheckInResponse> {
    let newly = state
        .manager
        .check_in_player(&guild_id, tournament_id, &request.discord_id)
        .await
        .map_err(|e| error_response(&path_of(&guild_id, tournament_id, "check-in"), e))?;

    Ok(Json(CheckInResponse {
        checked_in: true,
        already_checked_in: !newly,
    }))
}
