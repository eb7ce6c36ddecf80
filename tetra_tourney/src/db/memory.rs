//! In-process store with the same conditional-write semantics as PostgreSQL.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::{PlayerRepository, StoreError, StoreResult, TournamentRepository, WriteOutcome};
use crate::tournament::{NewTournament, PlayerRecord, Tournament, TournamentChoice, TournamentId};

#[derive(Default)]
struct Tables {
    tournaments: BTreeMap<TournamentId, Tournament>,
    players: HashMap<String, PlayerRecord>,
    next_id: TournamentId,
}

/// Tournaments and players kept in memory.
#[derive(Default)]
pub struct InMemoryStore {
    tables: Mutex<Tables>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn guild_tournament<'a>(
        tables: &'a mut Tables,
        guild_id: &str,
        id: TournamentId,
    ) -> Option<&'a mut Tournament> {
        tables
            .tournaments
            .get_mut(&id)
            .filter(|t| t.guild_id == guild_id)
    }
}

#[async_trait]
impl TournamentRepository for InMemoryStore {
    async fn create(&self, new: NewTournament) -> StoreResult<Tournament> {
        let mut tables = self.lock();
        tables.next_id += 1;
        let tournament = new.into_tournament(tables.next_id, Utc::now());
        tables
            .tournaments
            .insert(tournament.id, tournament.clone());
        Ok(tournament)
    }

    async fn find_in_guild(
        &self,
        guild_id: &str,
        id: TournamentId,
    ) -> StoreResult<Option<Tournament>> {
        Ok(self
            .lock()
            .tournaments
            .get(&id)
            .filter(|t| t.guild_id == guild_id)
            .cloned())
    }

    async fn search_by_name(
        &self,
        guild_id: &str,
        query: &str,
        limit: usize,
    ) -> StoreResult<Vec<TournamentChoice>> {
        let needle = query.to_lowercase();
        Ok(self
            .lock()
            .tournaments
            .values()
            .rev()
            .filter(|t| t.guild_id == guild_id && t.name.to_lowercase().contains(&needle))
            .take(limit)
            .map(|t| TournamentChoice {
                name: t.name.clone(),
                id: t.id,
            })
            .collect())
    }

    async fn save(&self, tournament: &Tournament) -> StoreResult<WriteOutcome> {
        let mut tables = self.lock();
        let Some(stored) = Self::guild_tournament(&mut tables, &tournament.guild_id, tournament.id)
        else {
            return Ok(WriteOutcome::Conflict);
        };
        if stored.version != tournament.version {
            return Ok(WriteOutcome::Conflict);
        }

        stored.name = tournament.name.clone();
        stored.description = tournament.description.clone();
        stored.max_players = tournament.max_players;
        stored.status = tournament.status;
        stored.is_rank_capped = tournament.is_rank_capped;
        stored.rank_cap = tournament.rank_cap;
        stored.is_tr_capped = tournament.is_tr_capped;
        stored.tr_cap = tournament.tr_cap;
        stored.is_country_locked = tournament.is_country_locked;
        stored.country_lock = tournament.country_lock.clone();
        stored.add_roles = tournament.add_roles.clone();
        stored.version += 1;
        Ok(WriteOutcome::Applied)
    }

    async fn append_player(
        &self,
        guild_id: &str,
        id: TournamentId,
        player_id: &str,
        expected_version: i64,
    ) -> StoreResult<WriteOutcome> {
        let mut tables = self.lock();
        match Self::guild_tournament(&mut tables, guild_id, id) {
            Some(t) if t.version == expected_version && !t.is_registered(player_id) => {
                t.players.push(player_id.to_string());
                t.version += 1;
                Ok(WriteOutcome::Applied)
            }
            _ => Ok(WriteOutcome::Conflict),
        }
    }

    async fn remove_player(
        &self,
        guild_id: &str,
        id: TournamentId,
        player_id: &str,
    ) -> StoreResult<bool> {
        let mut tables = self.lock();
        match Self::guild_tournament(&mut tables, guild_id, id) {
            Some(t) if t.is_registered(player_id) => {
                t.players.retain(|p| p != player_id);
                t.checked_in.retain(|p| p != player_id);
                t.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn check_in(
        &self,
        guild_id: &str,
        id: TournamentId,
        player_id: &str,
    ) -> StoreResult<bool> {
        let mut tables = self.lock();
        match Self::guild_tournament(&mut tables, guild_id, id) {
            Some(t) if t.is_registered(player_id) && !t.checked_in.iter().any(|p| p == player_id) => {
                t.checked_in.push(player_id.to_string());
                t.version += 1;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn remove_player_everywhere(&self, player_id: &str) -> StoreResult<u64> {
        let mut tables = self.lock();
        let mut affected = 0;
        for t in tables.tournaments.values_mut() {
            if t.is_registered(player_id) {
                t.players.retain(|p| p != player_id);
                t.checked_in.retain(|p| p != player_id);
                t.version += 1;
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }
}

#[async_trait]
impl PlayerRepository for InMemoryStore {
    async fn find(&self, discord_id: &str) -> StoreResult<Option<PlayerRecord>> {
        Ok(self.lock().players.get(discord_id).cloned())
    }

    async fn find_by_tetrio_id(&self, tetrio_id: &str) -> StoreResult<Option<PlayerRecord>> {
        Ok(self
            .lock()
            .players
            .values()
            .find(|p| p.tetrio_id == tetrio_id)
            .cloned())
    }

    async fn find_many(&self, discord_ids: &[String]) -> StoreResult<Vec<PlayerRecord>> {
        let tables = self.lock();
        Ok(discord_ids
            .iter()
            .filter_map(|id| tables.players.get(id).cloned())
            .collect())
    }

    async fn upsert(&self, record: &PlayerRecord) -> StoreResult<()> {
        let mut tables = self.lock();
        let linked_elsewhere = tables
            .players
            .values()
            .any(|p| p.tetrio_id == record.tetrio_id && p.discord_id != record.discord_id);
        if linked_elsewhere {
            return Err(StoreError::AccountLinked(record.tetrio_id.clone()));
        }

        tables
            .players
            .insert(record.discord_id.clone(), record.clone());
        Ok(())
    }

    async fn delete(&self, discord_id: &str) -> StoreResult<bool> {
        Ok(self.lock().players.remove(discord_id).is_some())
    }
}
