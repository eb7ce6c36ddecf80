//! Repository traits and their PostgreSQL implementations.
//!
//! Writes that change a tournament's roster are conditional: they apply only
//! when the row still looks the way the caller last read it, and report
//! [`WriteOutcome::Conflict`] otherwise. Every applied write bumps `version`.

use async_trait::async_trait;
use sqlx::postgres::PgRow;
use sqlx::types::Json;
use sqlx::{PgPool, Row};

use super::{StoreError, StoreResult};
use crate::rank::Tier;
use crate::tetrio::TetrioUserData;
use crate::tournament::{
    NewTournament, PlayerRecord, Tournament, TournamentChoice, TournamentId, TournamentStatus,
};

/// Outcome of a conditional write
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum WriteOutcome {
    Applied,
    /// The row changed since it was read, or the precondition no longer holds
    Conflict,
}

impl WriteOutcome {
    fn from_rows(rows: u64) -> Self {
        if rows > 0 {
            WriteOutcome::Applied
        } else {
            WriteOutcome::Conflict
        }
    }
}

/// Trait for tournament repository operations
#[async_trait]
pub trait TournamentRepository: Send + Sync {
    /// Create an open tournament
    async fn create(&self, new: NewTournament) -> StoreResult<Tournament>;

    /// Find a tournament by id within a guild
    async fn find_in_guild(
        &self,
        guild_id: &str,
        id: TournamentId,
    ) -> StoreResult<Option<Tournament>>;

    /// Case-insensitive name search within a guild
    async fn search_by_name(
        &self,
        guild_id: &str,
        query: &str,
        limit: usize,
    ) -> StoreResult<Vec<TournamentChoice>>;

    /// Overwrite the organizer-editable fields and status if `version` still matches
    async fn save(&self, tournament: &Tournament) -> StoreResult<WriteOutcome>;

    /// Append a registration if the row is still at `expected_version`
    async fn append_player(
        &self,
        guild_id: &str,
        id: TournamentId,
        player_id: &str,
        expected_version: i64,
    ) -> StoreResult<WriteOutcome>;

    /// Remove a registration (and its check-in); `false` if it was not there
    async fn remove_player(
        &self,
        guild_id: &str,
        id: TournamentId,
        player_id: &str,
    ) -> StoreResult<bool>;

    /// Mark a registered player as checked in; `false` if not registered or already checked in
    async fn check_in(&self, guild_id: &str, id: TournamentId, player_id: &str)
    -> StoreResult<bool>;

    /// Remove a player from every tournament; returns the number of tournaments affected
    async fn remove_player_everywhere(&self, player_id: &str) -> StoreResult<u64>;

    /// Check that the store is reachable
    async fn ping(&self) -> StoreResult<()>;
}

/// Trait for player repository operations
#[async_trait]
pub trait PlayerRepository: Send + Sync {
    /// Find player by Discord id
    async fn find(&self, discord_id: &str) -> StoreResult<Option<PlayerRecord>>;

    /// Find player by TETR.IO user id
    async fn find_by_tetrio_id(&self, tetrio_id: &str) -> StoreResult<Option<PlayerRecord>>;

    /// Find players by Discord id, in the order of `discord_ids`; unknown ids are skipped
    async fn find_many(&self, discord_ids: &[String]) -> StoreResult<Vec<PlayerRecord>>;

    /// Insert or refresh a player record
    async fn upsert(&self, record: &PlayerRecord) -> StoreResult<()>;

    /// Delete player; `false` if absent
    async fn delete(&self, discord_id: &str) -> StoreResult<bool>;
}

const TOURNAMENT_COLUMNS: &str = "id, guild_id, organized_by, name, description, game, \
    max_players, status, players, checked_in, is_rank_capped, rank_cap, is_tr_capped, \
    tr_cap, is_country_locked, country_lock, add_roles, version, created_at";

fn tournament_from_row(row: &PgRow) -> StoreResult<Tournament> {
    let status: String = row.try_get("status")?;
    let status = TournamentStatus::from_db(&status)
        .ok_or_else(|| StoreError::Corrupt(format!("unknown tournament status {status:?}")))?;

    let rank_cap = row
        .try_get::<Option<String>, _>("rank_cap")?
        .map(|cap| cap.parse::<Tier>())
        .transpose()?;

    let max_players = row
        .try_get::<Option<i32>, _>("max_players")?
        .and_then(|max| u32::try_from(max).ok())
        .filter(|&max| max > 0);

    let tr_cap = row
        .try_get::<Option<i32>, _>("tr_cap")?
        .and_then(|cap| u32::try_from(cap).ok());

    Ok(Tournament {
        id: row.try_get("id")?,
        guild_id: row.try_get("guild_id")?,
        organized_by: row.try_get("organized_by")?,
        name: row.try_get("name")?,
        description: row.try_get("description")?,
        game: row.try_get("game")?,
        max_players,
        status,
        players: row.try_get::<Json<Vec<String>>, _>("players")?.0,
        checked_in: row.try_get::<Json<Vec<String>>, _>("checked_in")?.0,
        is_rank_capped: row.try_get("is_rank_capped")?,
        rank_cap,
        is_tr_capped: row.try_get("is_tr_capped")?,
        tr_cap,
        is_country_locked: row.try_get("is_country_locked")?,
        country_lock: row.try_get("country_lock")?,
        add_roles: row.try_get::<Json<Vec<String>>, _>("add_roles")?.0,
        version: row.try_get("version")?,
        created_at: row.try_get("created_at")?,
    })
}

fn player_from_row(row: &PgRow) -> StoreResult<PlayerRecord> {
    Ok(PlayerRecord {
        discord_id: row.try_get("discord_id")?,
        tetrio_id: row.try_get("tetrio_id")?,
        data: row.try_get::<Json<TetrioUserData>, _>("data")?.0,
    })
}

/// PostgreSQL implementation of `TournamentRepository`
#[derive(Clone)]
pub struct PgTournamentRepository {
    pool: PgPool,
}

impl PgTournamentRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl TournamentRepository for PgTournamentRepository {
    async fn create(&self, new: NewTournament) -> StoreResult<Tournament> {
        let draft = new.into_tournament(0, chrono::Utc::now());

        let row = sqlx::query(&format!(
            "INSERT INTO tournaments (guild_id, organized_by, name, description, game, max_players,
                                      status, is_rank_capped, rank_cap, is_tr_capped, tr_cap,
                                      is_country_locked, country_lock, add_roles)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14)
             RETURNING {TOURNAMENT_COLUMNS}"
        ))
        .bind(&draft.guild_id)
        .bind(&draft.organized_by)
        .bind(&draft.name)
        .bind(&draft.description)
        .bind(&draft.game)
        .bind(draft.max_players.map(|m| m as i32))
        .bind(draft.status.as_str())
        .bind(draft.is_rank_capped)
        .bind(draft.rank_cap.map(|t| t.label()))
        .bind(draft.is_tr_capped)
        .bind(draft.tr_cap.map(|c| c as i32))
        .bind(draft.is_country_locked)
        .bind(&draft.country_lock)
        .bind(Json(&draft.add_roles))
        .fetch_one(&self.pool)
        .await?;

        tournament_from_row(&row)
    }

    async fn find_in_guild(
        &self,
        guild_id: &str,
        id: TournamentId,
    ) -> StoreResult<Option<Tournament>> {
        let row = sqlx::query(&format!(
            "SELECT {TOURNAMENT_COLUMNS} FROM tournaments WHERE id = $1 AND guild_id = $2"
        ))
        .bind(id)
        .bind(guild_id)
        .fetch_optional(&self.pool)
        .await?;

        row.as_ref().map(tournament_from_row).transpose()
    }

    async fn search_by_name(
        &self,
        guild_id: &str,
        query: &str,
        limit: usize,
    ) -> StoreResult<Vec<TournamentChoice>> {
        let rows = sqlx::query(
            "SELECT id, name FROM tournaments
             WHERE guild_id = $1 AND strpos(lower(name), lower($2)) > 0
             ORDER BY created_at DESC
             LIMIT $3",
        )
        .bind(guild_id)
        .bind(query)
        .bind(limit as i64)
        .fetch_all(&self.pool)
        .await?;

        rows.iter()
            .map(|row| {
                Ok(TournamentChoice {
                    id: row.try_get("id")?,
                    name: row.try_get("name")?,
                })
            })
            .collect()
    }

    async fn save(&self, tournament: &Tournament) -> StoreResult<WriteOutcome> {
        let result = sqlx::query(
            "UPDATE tournaments
             SET name = $1, description = $2, max_players = $3, status = $4,
                 is_rank_capped = $5, rank_cap = $6, is_tr_capped = $7, tr_cap = $8,
                 is_country_locked = $9, country_lock = $10, add_roles = $11,
                 version = version + 1
             WHERE id = $12 AND guild_id = $13 AND version = $14",
        )
        .bind(&tournament.name)
        .bind(&tournament.description)
        .bind(tournament.max_players.map(|m| m as i32))
        .bind(tournament.status.as_str())
        .bind(tournament.is_rank_capped)
        .bind(tournament.rank_cap.map(|t| t.label()))
        .bind(tournament.is_tr_capped)
        .bind(tournament.tr_cap.map(|c| c as i32))
        .bind(tournament.is_country_locked)
        .bind(&tournament.country_lock)
        .bind(Json(&tournament.add_roles))
        .bind(tournament.id)
        .bind(&tournament.guild_id)
        .bind(tournament.version)
        .execute(&self.pool)
        .await?;

        Ok(WriteOutcome::from_rows(result.rows_affected()))
    }

    async fn append_player(
        &self,
        guild_id: &str,
        id: TournamentId,
        player_id: &str,
        expected_version: i64,
    ) -> StoreResult<WriteOutcome> {
        let result = sqlx::query(
            "UPDATE tournaments
             SET players = players || jsonb_build_array($1::text), version = version + 1
             WHERE id = $2 AND guild_id = $3 AND version = $4
               AND NOT players @> jsonb_build_array($1::text)",
        )
        .bind(player_id)
        .bind(id)
        .bind(guild_id)
        .bind(expected_version)
        .execute(&self.pool)
        .await?;

        Ok(WriteOutcome::from_rows(result.rows_affected()))
    }

    async fn remove_player(
        &self,
        guild_id: &str,
        id: TournamentId,
        player_id: &str,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE tournaments
             SET players = players - $1::text, checked_in = checked_in - $1::text,
                 version = version + 1
             WHERE id = $2 AND guild_id = $3 AND players @> jsonb_build_array($1::text)",
        )
        .bind(player_id)
        .bind(id)
        .bind(guild_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn check_in(
        &self,
        guild_id: &str,
        id: TournamentId,
        player_id: &str,
    ) -> StoreResult<bool> {
        let result = sqlx::query(
            "UPDATE tournaments
             SET checked_in = checked_in || jsonb_build_array($1::text), version = version + 1
             WHERE id = $2 AND guild_id = $3
               AND players @> jsonb_build_array($1::text)
               AND NOT checked_in @> jsonb_build_array($1::text)",
        )
        .bind(player_id)
        .bind(id)
        .bind(guild_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn remove_player_everywhere(&self, player_id: &str) -> StoreResult<u64> {
        let result = sqlx::query(
            "UPDATE tournaments
             SET players = players - $1::text, checked_in = checked_in - $1::text,
                 version = version + 1
             WHERE players @> jsonb_build_array($1::text)",
        )
        .bind(player_id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }
}

/// PostgreSQL implementation of `PlayerRepository`
#[derive(Clone)]
pub struct PgPlayerRepository {
    pool: PgPool,
}

impl PgPlayerRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl PlayerRepository for PgPlayerRepository {
    async fn find(&self, discord_id: &str) -> StoreResult<Option<PlayerRecord>> {
        let row = sqlx::query("SELECT discord_id, tetrio_id, data FROM players WHERE discord_id = $1")
            .bind(discord_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn find_by_tetrio_id(&self, tetrio_id: &str) -> StoreResult<Option<PlayerRecord>> {
        let row = sqlx::query("SELECT discord_id, tetrio_id, data FROM players WHERE tetrio_id = $1")
            .bind(tetrio_id)
            .fetch_optional(&self.pool)
            .await?;

        row.as_ref().map(player_from_row).transpose()
    }

    async fn find_many(&self, discord_ids: &[String]) -> StoreResult<Vec<PlayerRecord>> {
        if discord_ids.is_empty() {
            return Ok(Vec::new());
        }

        let rows = sqlx::query(
            "SELECT discord_id, tetrio_id, data FROM players WHERE discord_id = ANY($1)",
        )
        .bind(discord_ids)
        .fetch_all(&self.pool)
        .await?;

        let mut found = rows
            .iter()
            .map(|row| player_from_row(row).map(|p| (p.discord_id.clone(), p)))
            .collect::<StoreResult<std::collections::HashMap<_, _>>>()?;

        Ok(discord_ids.iter().filter_map(|id| found.remove(id)).collect())
    }

    async fn upsert(&self, record: &PlayerRecord) -> StoreResult<()> {
        sqlx::query(
            "INSERT INTO players (discord_id, tetrio_id, data)
             VALUES ($1, $2, $3)
             ON CONFLICT (discord_id)
             DO UPDATE SET tetrio_id = EXCLUDED.tetrio_id, data = EXCLUDED.data, updated_at = NOW()",
        )
        .bind(&record.discord_id)
        .bind(&record.tetrio_id)
        .bind(Json(&record.data))
        .execute(&self.pool)
        .await
        .map_err(|e| {
            if let sqlx::Error::Database(db) = &e {
                if db.is_unique_violation() {
                    return StoreError::AccountLinked(record.tetrio_id.clone());
                }
            }
            StoreError::Database(e)
        })?;

        Ok(())
    }

    async fn delete(&self, discord_id: &str) -> StoreResult<bool> {
        let result = sqlx::query("DELETE FROM players WHERE discord_id = $1")
            .bind(discord_id)
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_write_outcome_from_rows() {
        assert_eq!(WriteOutcome::from_rows(1), WriteOutcome::Applied);
        assert_eq!(WriteOutcome::from_rows(0), WriteOutcome::Conflict);
    }

    #[test]
    fn test_column_list_covers_record() {
        for column in ["players", "checked_in", "version", "add_roles", "rank_cap"] {
            assert!(TOURNAMENT_COLUMNS.contains(column));
        }
    }
}
