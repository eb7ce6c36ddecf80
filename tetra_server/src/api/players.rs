//! Player roster and player management handlers.

use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use tetra_tourney::{
    roster::{EmbedPayload, ListFormat, Rendered, SortKey},
    tournament::TournamentId,
};

use super::{ApiResult, AppState, api_error, error_response};

/// Query of the roster listing. Tags are parsed here so unknown values are
/// rejected before any work is done.
#[derive(Debug, Default, Deserialize)]
pub struct ListQuery {
    #[serde(default)]
    pub sort: Option<String>,
    #[serde(default)]
    pub format: Option<String>,
    #[serde(default)]
    pub checked_in: bool,
}

#[derive(Debug, Serialize)]
pub struct DeletePlayerResponse {
    pub removed_from_tournaments: u64,
}

/// Rendered player list.
///
/// # Query Parameters
///
/// - `sort`: `default`, `rank`, `tr`, `apm` or `pps`
/// - `format`: `ascii` or `embed`; `challonge`, `csv` and `json` answer `501`
/// - `checked_in`: only list checked-in players
pub async fn list_players(
    State(state): State<AppState>,
    Path((guild_id, tournament_id)): Path<(String, TournamentId)>,
    Query(query): Query<ListQuery>,
) -> ApiResult<Rendered> {
    let sort = match query.sort.as_deref() {
        Some(tag) => tag
            .parse::<SortKey>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?,
        None => SortKey::default(),
    };
    let format = match query.format.as_deref() {
        Some(tag) => tag
            .parse::<ListFormat>()
            .map_err(|e| api_error(StatusCode::BAD_REQUEST, e))?,
        None => ListFormat::default(),
    };

    state
        .manager
        .list_players(&guild_id, tournament_id, sort, format, query.checked_in)
        .await
        .map(Json)
        .map_err(|e| {
            error_response(
                &format!("/api/v1/guilds/{guild_id}/tournaments/{tournament_id}/players"),
                e,
            )
        })
}

/// Card of a stored player with their TETR.IO rank and avatar.
pub async fn player_info(
    State(state): State<AppState>,
    Path(discord_id): Path<String>,
) -> ApiResult<EmbedPayload> {
    state
        .manager
        .player_info(&discord_id)
        .await
        .map(Json)
        .map_err(|e| error_response(&format!("/api/v1/players/{discord_id}"), e))
}

/// Delete a player and remove them from every tournament.
pub async fn delete_player(
    State(state): State<AppState>,
    Path(discord_id): Path<String>,
) -> ApiResult<DeletePlayerResponse> {
    let deletion = state
        .manager
        .delete_player(&discord_id)
        .await
        .map_err(|e| error_response(&format!("/api/v1/players/{discord_id}"), e))?;

    tracing::info!(
        discord_id = discord_id.as_str(),
        removed_from_tournaments = deletion.removed_from_tournaments,
        "Player deleted"
    );
    Ok(Json(DeletePlayerResponse {
        removed_from_tournaments: deletion.removed_from_tournaments,
    }))
}
