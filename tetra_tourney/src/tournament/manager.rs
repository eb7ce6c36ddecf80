//! Tournament manager: registration, roster listing and organizer actions.
//!
//! The manager is the calling layer around the pure engine. It reads records
//! from the repositories, fetches player data from the rank provider, asks
//! [`eligibility::evaluate`] for a decision and commits it with the store's
//! conditional writes.

use super::models::{
    MAX_TR_CAP, NewTournament, PlayerDeletion, PlayerRecord, RegistrationOutcome, Tournament,
    TournamentChoice, TournamentEdit, TournamentId, TournamentStatus,
};
use crate::db::{PlayerRepository, StoreError, TournamentRepository, WriteOutcome};
use crate::eligibility::{self, Decision};
use crate::rank::RankError;
use crate::roster::{self, EmbedPayload, ListFormat, RenderError, Rendered, RosterEntry, SortKey, SubsetFilter};
use crate::tetrio::{ProviderError, RankProvider};
use log::{debug, error, info, warn};
use std::sync::Arc;
use thiserror::Error;

/// Attempts at a conditional write before giving up
pub const DEFAULT_MAX_ATTEMPTS: usize = 3;

/// Most choices a chat client shows for autocomplete
pub const AUTOCOMPLETE_LIMIT: usize = 25;

/// Tournament errors
#[derive(Debug, Error)]
pub enum TournamentError {
    #[error("Tournament not found: {0}")]
    NotFound(TournamentId),

    #[error("Tournament {0} is finished and can no longer be changed")]
    NotEditable(TournamentId),

    #[error("Player listing is not available for {0} tournaments")]
    UnsupportedGame(String),

    #[error("Player is not registered in this tournament")]
    NotRegistered,

    #[error("Player not found: {0}")]
    PlayerNotFound(String),

    #[error("Invalid value: {0}")]
    InvalidInput(String),

    #[error("Tournament {0} kept changing during the update; try again")]
    ConcurrentModification(TournamentId),

    #[error(transparent)]
    Render(#[from] RenderError),

    #[error("Store error: {0}")]
    Store(#[from] StoreError),

    #[error("Rank provider error: {0}")]
    Provider(#[from] ProviderError),

    #[error("Rank data error: {0}")]
    Rank(#[from] RankError),
}

impl TournamentError {
    /// Message safe to show to end users.
    ///
    /// Store internals and upstream failures are replaced by generic text.
    pub fn client_message(&self) -> String {
        match self {
            TournamentError::Store(StoreError::AccountLinked(_)) => {
                "This TETR.IO account is already linked to another user".to_string()
            }
            TournamentError::Store(_) | TournamentError::Rank(_) => {
                "Internal server error".to_string()
            }
            TournamentError::Provider(ProviderError::NotFound(name)) => {
                format!("TETR.IO user not found: {name}")
            }
            TournamentError::Provider(_) => {
                "TETR.IO is not reachable right now, try again later".to_string()
            }
            TournamentError::Render(RenderError::UnsupportedFormat(_)) => {
                "This format is not implemented yet".to_string()
            }
            _ => self.to_string(),
        }
    }
}

pub type TournamentResult<T> = Result<T, TournamentError>;

/// Tournament manager
#[derive(Clone)]
pub struct TournamentManager {
    tournaments: Arc<dyn TournamentRepository>,
    players: Arc<dyn PlayerRepository>,
    provider: Arc<dyn RankProvider>,
    max_attempts: usize,
}

impl TournamentManager {
    /// Create a new tournament manager
    pub fn new(
        tournaments: Arc<dyn TournamentRepository>,
        players: Arc<dyn PlayerRepository>,
        provider: Arc<dyn RankProvider>,
    ) -> Self {
        Self {
            tournaments,
            players,
            provider,
            max_attempts: DEFAULT_MAX_ATTEMPTS,
        }
    }

    /// Override how often a conflicting write is retried
    pub fn with_max_attempts(mut self, attempts: usize) -> Self {
        self.max_attempts = attempts.max(1);
        self
    }

    /// Create a new tournament
    pub async fn create_tournament(&self, new: NewTournament) -> TournamentResult<Tournament> {
        if new.name.trim().is_empty() {
            return Err(TournamentError::InvalidInput("name must not be empty".to_string()));
        }
        validate_tr_cap(new.tr_cap)?;
        validate_country_lock(new.country_lock.as_deref())?;

        let tournament = self.tournaments.create(new).await?;
        info!(
            "Created tournament {} ({}) in guild {}",
            tournament.id, tournament.name, tournament.guild_id
        );
        Ok(tournament)
    }

    /// Get a tournament of a guild
    pub async fn get_tournament(
        &self,
        guild_id: &str,
        tournament_id: TournamentId,
    ) -> TournamentResult<Tournament> {
        self.tournaments
            .find_in_guild(guild_id, tournament_id)
            .await?
            .ok_or(TournamentError::NotFound(tournament_id))
    }

    /// Summary embed of a tournament
    pub async fn tournament_details(
        &self,
        guild_id: &str,
        tournament_id: TournamentId,
    ) -> TournamentResult<EmbedPayload> {
        Ok(self.get_tournament(guild_id, tournament_id).await?.details_embed())
    }

    /// Autocomplete choices for tournament names
    pub async fn search_tournaments(
        &self,
        guild_id: &str,
        query: &str,
    ) -> TournamentResult<Vec<TournamentChoice>> {
        Ok(self
            .tournaments
            .search_by_name(guild_id, query.trim(), AUTOCOMPLETE_LIMIT)
            .await?)
    }

    /// Register a player for a tournament.
    ///
    /// A denial is a normal outcome and is returned as `Ok`. The player's
    /// TETR.IO data is fetched once; if the tournament changes between the
    /// decision and the write, the decision is re-made against the new state.
    pub async fn register_player(
        &self,
        guild_id: &str,
        tournament_id: TournamentId,
        discord_id: &str,
        tetrio_username: &str,
    ) -> TournamentResult<RegistrationOutcome> {
        let mut tournament = self.get_tournament(guild_id, tournament_id).await?;

        let data = self.provider.fetch_user(tetrio_username).await?;
        let snapshot = data.snapshot()?;
        let mut linked = false;

        for attempt in 1..=self.max_attempts {
            let decision = eligibility::evaluate(discord_id, &snapshot, &tournament.constraints());

            if let Decision::Denied(reason) = decision {
                info!(
                    "Registration of {} in tournament {} denied: {}",
                    discord_id, tournament_id, reason
                );
                return Ok(RegistrationOutcome {
                    decision,
                    roles_to_add: Vec::new(),
                    registered_count: tournament.players.len(),
                });
            }

            if !linked {
                self.players
                    .upsert(&PlayerRecord {
                        discord_id: discord_id.to_string(),
                        tetrio_id: data.user.id.clone(),
                        data: data.clone(),
                    })
                    .await?;
                linked = true;
            }

            match self
                .tournaments
                .append_player(guild_id, tournament_id, discord_id, tournament.version)
                .await?
            {
                WriteOutcome::Applied => {
                    info!(
                        "Registered {} ({}) in tournament {}",
                        discord_id, data.user.username, tournament_id
                    );
                    return Ok(RegistrationOutcome {
                        decision,
                        roles_to_add: tournament.add_roles.clone(),
                        registered_count: tournament.players.len() + 1,
                    });
                }
                WriteOutcome::Conflict => {
                    warn!(
                        "Tournament {} changed during registration of {} (attempt {}/{})",
                        tournament_id, discord_id, attempt, self.max_attempts
                    );
                    tournament = self.get_tournament(guild_id, tournament_id).await?;
                }
            }
        }

        Err(TournamentError::ConcurrentModification(tournament_id))
    }

    /// Remove a player's registration
    pub async fn unregister_player(
        &self,
        guild_id: &str,
        tournament_id: TournamentId,
        discord_id: &str,
    ) -> TournamentResult<()> {
        let tournament = self.get_tournament(guild_id, tournament_id).await?;
        if !tournament.is_editable() {
            return Err(TournamentError::NotEditable(tournament_id));
        }

        if !self
            .tournaments
            .remove_player(guild_id, tournament_id, discord_id)
            .await?
        {
            return Err(TournamentError::NotRegistered);
        }

        info!("Unregistered {} from tournament {}", discord_id, tournament_id);
        Ok(())
    }

    /// Check a registered player in. Returns `false` if they already were.
    pub async fn check_in_player(
        &self,
        guild_id: &str,
        tournament_id: TournamentId,
        discord_id: &str,
    ) -> TournamentResult<bool> {
        let tournament = self.get_tournament(guild_id, tournament_id).await?;
        if !tournament.is_editable() {
            return Err(TournamentError::NotEditable(tournament_id));
        }
        if !tournament.is_registered(discord_id) {
            return Err(TournamentError::NotRegistered);
        }

        let newly = self
            .tournaments
            .check_in(guild_id, tournament_id, discord_id)
            .await?;
        debug!(
            "Check-in of {} in tournament {}: {}",
            discord_id,
            tournament_id,
            if newly { "new" } else { "already checked in" }
        );
        Ok(newly)
    }

    /// Roster in display order
    pub async fn roster(
        &self,
        guild_id: &str,
        tournament_id: TournamentId,
        sort: SortKey,
        checked_in_only: bool,
    ) -> TournamentResult<(Tournament, Vec<RosterEntry>)> {
        let tournament = self.get_tournament(guild_id, tournament_id).await?;
        if !tournament.is_tetrio() {
            return Err(TournamentError::UnsupportedGame(tournament.game));
        }

        let records = self.players.find_many(&tournament.players).await?;
        if records.len() != tournament.players.len() {
            let missing: Vec<&str> = tournament
                .players
                .iter()
                .filter(|id| !records.iter().any(|record| &record.discord_id == *id))
                .map(String::as_str)
                .collect();
            error!(
                "Tournament {} lists players without records: {:?}",
                tournament_id, missing
            );
            return Err(StoreError::Corrupt(format!(
                "tournament {tournament_id} lists {} player(s) without a record",
                missing.len()
            ))
            .into());
        }

        let entries = records
            .iter()
            .map(|record| record.data.roster_entry(&record.discord_id))
            .collect::<Result<Vec<_>, _>>()?;

        let subset = if checked_in_only {
            SubsetFilter::CheckedIn(tournament.checked_in.iter().cloned().collect())
        } else {
            SubsetFilter::All
        };

        let ordered = roster::order(&entries, sort, &subset);
        Ok((tournament, ordered))
    }

    /// Rendered player list
    pub async fn list_players(
        &self,
        guild_id: &str,
        tournament_id: TournamentId,
        sort: SortKey,
        format: ListFormat,
        checked_in_only: bool,
    ) -> TournamentResult<Rendered> {
        let (tournament, ordered) = self
            .roster(guild_id, tournament_id, sort, checked_in_only)
            .await?;
        Ok(roster::render(&ordered, format, &tournament.name)?)
    }

    /// Apply an organizer edit
    pub async fn edit_tournament(
        &self,
        guild_id: &str,
        tournament_id: TournamentId,
        edit: TournamentEdit,
    ) -> TournamentResult<Tournament> {
        validate_tr_cap(edit.tr_cap)?;
        if edit.max_players == Some(0) {
            return Err(TournamentError::InvalidInput(
                "max players must be greater than 0".to_string(),
            ));
        }

        self.update(guild_id, tournament_id, |t| {
            edit.clone().apply(t);
            Ok(())
        })
        .await
    }

    /// Open, close or finish a tournament. Finishing is final.
    pub async fn set_status(
        &self,
        guild_id: &str,
        tournament_id: TournamentId,
        status: TournamentStatus,
    ) -> TournamentResult<Tournament> {
        self.update(guild_id, tournament_id, |t| {
            t.status = status;
            Ok(())
        })
        .await
    }

    /// Card of a stored player, shown before deleting them
    pub async fn player_info(&self, discord_id: &str) -> TournamentResult<EmbedPayload> {
        self.players
            .find(discord_id)
            .await?
            .map(|record| record.info_embed())
            .ok_or_else(|| TournamentError::PlayerNotFound(discord_id.to_string()))
    }

    /// Delete a player and unregister them everywhere
    pub async fn delete_player(&self, discord_id: &str) -> TournamentResult<PlayerDeletion> {
        if self.players.find(discord_id).await?.is_none() {
            return Err(TournamentError::PlayerNotFound(discord_id.to_string()));
        }

        let removed_from_tournaments = self.tournaments.remove_player_everywhere(discord_id).await?;
        self.players.delete(discord_id).await?;

        info!(
            "Deleted player {}; removed from {} tournament(s)",
            discord_id, removed_from_tournaments
        );
        Ok(PlayerDeletion {
            removed_from_tournaments,
        })
    }

    /// Check that the store is reachable
    pub async fn health_check(&self) -> TournamentResult<()> {
        Ok(self.tournaments.ping().await?)
    }

    async fn update<F>(
        &self,
        guild_id: &str,
        tournament_id: TournamentId,
        change: F,
    ) -> TournamentResult<Tournament>
    where
        F: Fn(&mut Tournament) -> TournamentResult<()> + Send + Sync,
    {
        for attempt in 1..=self.max_attempts {
            let mut tournament = self.get_tournament(guild_id, tournament_id).await?;
            if !tournament.is_editable() {
                return Err(TournamentError::NotEditable(tournament_id));
            }

            change(&mut tournament)?;

            match self.tournaments.save(&tournament).await? {
                WriteOutcome::Applied => {
                    tournament.version += 1;
                    info!("Updated tournament {}", tournament_id);
                    return Ok(tournament);
                }
                WriteOutcome::Conflict => warn!(
                    "Tournament {} changed during update (attempt {}/{})",
                    tournament_id, attempt, self.max_attempts
                ),
            }
        }

        Err(TournamentError::ConcurrentModification(tournament_id))
    }
}

fn validate_tr_cap(tr_cap: Option<u32>) -> TournamentResult<()> {
    match tr_cap {
        Some(cap) if cap == 0 || cap > MAX_TR_CAP => Err(TournamentError::InvalidInput(format!(
            "TR cap must be between 1 and {MAX_TR_CAP}"
        ))),
        _ => Ok(()),
    }
}

/// Country locks are two-letter ISO codes.
fn validate_country_lock(country_lock: Option<&str>) -> TournamentResult<()> {
    match country_lock.map(str::trim) {
        Some(code) if code.len() != 2 || !code.chars().all(|c| c.is_ascii_alphabetic()) => Err(
            TournamentError::InvalidInput(format!("country lock must be a two-letter code, got {code:?}")),
        ),
        _ => Ok(()),
    }
}
