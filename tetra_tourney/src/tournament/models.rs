//! Tournament data models.

use crate::eligibility::TournamentConstraints;
use crate::rank::Tier;
use crate::roster::EmbedPayload;
use crate::tetrio::{self, TetrioUserData};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Tournament ID type
pub type TournamentId = i64;

/// Game name of tournaments tied to TETR.IO Tetra League.
pub const TETRIO_GAME: &str = "TETRIO";

/// Highest TR cap an organizer may set
pub const MAX_TR_CAP: u32 = 25_000;

/// Embed colour of tournament details (white)
pub const DETAILS_COLOR: u32 = 0xFF_FF_FF;

/// Accent of the player card shown before deleting a player
pub const PLAYER_CARD_COLOR: u32 = 0xED_42_45;

/// Tournament state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TournamentStatus {
    /// Not accepting registrations
    Closed,
    /// Accepting registrations
    Open,
    /// Over; no further edits
    Finished,
}

impl TournamentStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            TournamentStatus::Closed => "closed",
            TournamentStatus::Open => "open",
            TournamentStatus::Finished => "finished",
        }
    }

    pub fn from_db(value: &str) -> Option<Self> {
        match value {
            "closed" => Some(TournamentStatus::Closed),
            "open" => Some(TournamentStatus::Open),
            "finished" => Some(TournamentStatus::Finished),
            _ => None,
        }
    }
}

impl std::fmt::Display for TournamentStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A tournament record as kept by the store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tournament {
    pub id: TournamentId,
    /// Guild the tournament belongs to
    pub guild_id: String,
    /// Discord id of the organizer
    pub organized_by: String,
    pub name: String,
    pub description: Option<String>,
    pub game: String,
    pub max_players: Option<u32>,
    pub status: TournamentStatus,
    /// Discord ids in registration order
    pub players: Vec<String>,
    /// Discord ids of players that checked in
    pub checked_in: Vec<String>,
    pub is_rank_capped: bool,
    pub rank_cap: Option<Tier>,
    pub is_tr_capped: bool,
    pub tr_cap: Option<u32>,
    pub is_country_locked: bool,
    /// ISO 3166 alpha-2 code
    pub country_lock: Option<String>,
    /// Role ids granted to players on registration
    pub add_roles: Vec<String>,
    /// Row version for optimistic concurrency
    pub version: i64,
    pub created_at: DateTime<Utc>,
}

impl Tournament {
    /// Eligibility constraints as of this record.
    pub fn constraints(&self) -> TournamentConstraints {
        TournamentConstraints {
            is_open: self.status == TournamentStatus::Open,
            is_country_locked: self.is_country_locked,
            country_lock: self.country_lock.clone(),
            is_rank_capped: self.is_rank_capped,
            rank_cap: self.rank_cap,
            is_tr_capped: self.is_tr_capped,
            tr_cap: self.tr_cap.map(f64::from),
            max_players: self.max_players,
            current_player_ids: self.players.iter().cloned().collect(),
            current_player_count: self.players.len(),
        }
    }

    pub fn is_editable(&self) -> bool {
        self.status != TournamentStatus::Finished
    }

    pub fn is_tetrio(&self) -> bool {
        self.game.eq_ignore_ascii_case(TETRIO_GAME)
    }

    pub fn is_registered(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p == player_id)
    }

    /// Summary embed shown when a tournament is looked up.
    pub fn details_embed(&self) -> EmbedPayload {
        let status = match self.status {
            TournamentStatus::Closed => "CLOSED",
            TournamentStatus::Open => "OPEN",
            TournamentStatus::Finished => "FINISHED",
        };

        let mut lines = vec![
            format!("**Tournament ID**: {}", self.id),
            format!("**Organized by**: <@{}>", self.organized_by),
            format!("**Game**: {}", self.game),
        ];
        if let Some(description) = &self.description {
            lines.push(format!("**Description**: {description}"));
        }
        if self.is_tr_capped {
            lines.push(format!("**TR CAP**: {}", display_or_unset(self.tr_cap)));
        }
        if self.is_rank_capped {
            let cap = self.rank_cap.map(|t| t.label().to_uppercase());
            lines.push(format!("**RANK CAP**: {}", display_or_unset(cap)));
        }
        if self.is_country_locked {
            lines.push(format!(
                "**COUNTRY LOCK**: {}",
                display_or_unset(self.country_lock.as_deref())
            ));
        }
        match self.max_players {
            Some(max) => lines.push(format!(
                "**Registered players**: {}/{}",
                self.players.len(),
                max
            )),
            None => lines.push(format!("**Registered players**: {}", self.players.len())),
        }

        EmbedPayload::new(format!("{} ({status})", self.name))
            .description(lines.join("\n"))
            .color(DETAILS_COLOR)
            .timestamp(Utc::now())
    }
}

fn display_or_unset<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map_or_else(|| "not set".to_string(), |v| v.to_string())
}

/// Data needed to create a tournament.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewTournament {
    pub guild_id: String,
    pub organized_by: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default = "default_game")]
    pub game: String,
    #[serde(default)]
    pub max_players: Option<u32>,
    #[serde(default)]
    pub rank_cap: Option<Tier>,
    #[serde(default)]
    pub tr_cap: Option<u32>,
    #[serde(default)]
    pub country_lock: Option<String>,
    #[serde(default)]
    pub add_roles: Vec<String>,
}

fn default_game() -> String {
    TETRIO_GAME.to_string()
}

impl NewTournament {
    pub fn tetrio(guild_id: impl Into<String>, organized_by: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            guild_id: guild_id.into(),
            organized_by: organized_by.into(),
            name: name.into(),
            description: None,
            game: default_game(),
            max_players: None,
            rank_cap: None,
            tr_cap: None,
            country_lock: None,
            add_roles: Vec::new(),
        }
    }

    /// Materialize an open tournament with no registrations.
    pub fn into_tournament(self, id: TournamentId, created_at: DateTime<Utc>) -> Tournament {
        let country_lock = self
            .country_lock
            .map(|c| c.trim().to_uppercase())
            .filter(|c| !c.is_empty());

        Tournament {
            id,
            guild_id: self.guild_id,
            organized_by: self.organized_by,
            name: self.name,
            description: self.description,
            game: self.game,
            max_players: self.max_players.filter(|&max| max > 0),
            status: TournamentStatus::Open,
            players: Vec::new(),
            checked_in: Vec::new(),
            is_rank_capped: self.rank_cap.is_some(),
            rank_cap: self.rank_cap,
            is_tr_capped: self.tr_cap.is_some(),
            tr_cap: self.tr_cap,
            is_country_locked: country_lock.is_some(),
            country_lock,
            add_roles: self.add_roles,
            version: 0,
            created_at,
        }
    }
}

/// Organizer edits; `None` leaves a field unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TournamentEdit {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub rank_cap: Option<Tier>,
    #[serde(default)]
    pub tr_cap: Option<u32>,
    #[serde(default)]
    pub max_players: Option<u32>,
    /// Replaces the current roles when non-empty
    #[serde(default)]
    pub add_roles: Vec<String>,
}

impl TournamentEdit {
    /// Apply the edit. Setting a cap also switches that cap on.
    pub fn apply(self, tournament: &mut Tournament) {
        if let Some(name) = self.name.filter(|n| !n.trim().is_empty()) {
            tournament.name = name;
        }
        if let Some(description) = self.description.filter(|d| !d.trim().is_empty()) {
            tournament.description = Some(description);
        }
        if let Some(rank_cap) = self.rank_cap {
            tournament.rank_cap = Some(rank_cap);
            tournament.is_rank_capped = true;
        }
        if let Some(tr_cap) = self.tr_cap {
            tournament.tr_cap = Some(tr_cap);
            tournament.is_tr_capped = true;
        }
        if let Some(max_players) = self.max_players.filter(|&max| max > 0) {
            tournament.max_players = Some(max_players);
        }
        if !self.add_roles.is_empty() {
            tournament.add_roles = self.add_roles;
        }
    }
}

/// A registered player and their last known TETR.IO data.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerRecord {
    pub discord_id: String,
    pub tetrio_id: String,
    pub data: TetrioUserData,
}

impl PlayerRecord {
    /// Card with the linked TETR.IO account, avatar included when there is one.
    pub fn info_embed(&self) -> EmbedPayload {
        let user = &self.data.user;
        let embed = EmbedPayload::new(user.username.clone())
            .color(PLAYER_CARD_COLOR)
            .field("Username", user.username.clone(), true)
            .field("Rank", user.league.rank.to_uppercase(), true)
            .field("Profile", tetrio::profile_url(&user.username), false);

        match self.data.avatar_url() {
            Some(avatar) => embed.thumbnail(avatar),
            None => embed,
        }
    }
}

/// Result of a registration attempt that reached a decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistrationOutcome {
    pub decision: crate::eligibility::Decision,
    /// Roles to grant; empty when denied
    pub roles_to_add: Vec<String>,
    pub registered_count: usize,
}

/// Result of removing a player from the system.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerDeletion {
    pub removed_from_tournaments: u64,
}

/// Autocomplete choice
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TournamentChoice {
    pub name: String,
    pub id: TournamentId,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> Tournament {
        NewTournament::tetrio("guild", "organizer", "Weekly Cup").into_tournament(7, Utc::now())
    }

    #[test]
    fn test_new_tournament_defaults() {
        let t = sample();
        assert_eq!(t.status, TournamentStatus::Open);
        assert!(t.players.is_empty());
        assert!(!t.is_rank_capped && !t.is_tr_capped && !t.is_country_locked);
        assert!(t.is_tetrio());
        assert!(t.is_editable());
        assert_eq!(t.version, 0);
    }

    #[test]
    fn test_new_tournament_caps_set_flags() {
        let mut new = NewTournament::tetrio("g", "o", "Capped");
        new.rank_cap = Some(Tier::A);
        new.tr_cap = Some(15_000);
        new.country_lock = Some(" cl ".to_string());
        new.max_players = Some(0);
        let t = new.into_tournament(1, Utc::now());
        assert!(t.is_rank_capped && t.is_tr_capped && t.is_country_locked);
        assert_eq!(t.country_lock.as_deref(), Some("CL"));
        assert_eq!(t.max_players, None);
    }

    #[test]
    fn test_constraints_reflect_record() {
        let mut t = sample();
        t.players = vec!["a".to_string(), "b".to_string()];
        t.tr_cap = Some(12_000);
        t.is_tr_capped = true;
        t.status = TournamentStatus::Closed;

        let c = t.constraints();
        assert!(!c.is_open);
        assert_eq!(c.current_player_count, 2);
        assert!(c.current_player_ids.contains("b"));
        assert_eq!(c.tr_cap, Some(12_000.0));
    }

    #[test]
    fn test_edit_sets_cap_flags() {
        let mut t = sample();
        TournamentEdit {
            name: Some("Renamed".to_string()),
            rank_cap: Some(Tier::SPlus),
            tr_cap: Some(20_000),
            max_players: Some(16),
            add_roles: vec!["role-1".to_string()],
            ..Default::default()
        }
        .apply(&mut t);

        assert_eq!(t.name, "Renamed");
        assert!(t.is_rank_capped);
        assert_eq!(t.rank_cap, Some(Tier::SPlus));
        assert!(t.is_tr_capped);
        assert_eq!(t.tr_cap, Some(20_000));
        assert_eq!(t.max_players, Some(16));
        assert_eq!(t.add_roles, vec!["role-1".to_string()]);
    }

    #[test]
    fn test_empty_edit_keeps_roles() {
        let mut t = sample();
        t.add_roles = vec!["keep".to_string()];
        TournamentEdit::default().apply(&mut t);
        assert_eq!(t.add_roles, vec!["keep".to_string()]);
        assert_eq!(t.name, "Weekly Cup");
    }

    #[test]
    fn test_finished_is_not_editable() {
        let mut t = sample();
        t.status = TournamentStatus::Finished;
        assert!(!t.is_editable());
    }

    #[test]
    fn test_details_embed() {
        let mut t = sample();
        t.is_rank_capped = true;
        t.rank_cap = Some(Tier::APlus);
        t.players = vec!["a".to_string()];
        t.max_players = Some(8);

        let embed = t.details_embed();
        assert_eq!(embed.title, "Weekly Cup (OPEN)");
        assert!(embed.description.contains("**RANK CAP**: A+"));
        assert!(embed.description.contains("**Registered players**: 1/8"));
        assert!(!embed.description.contains("TR CAP"));
        assert_eq!(embed.color, Some(DETAILS_COLOR));
    }

    #[test]
    fn test_player_info_embed() {
        let data: TetrioUserData = serde_json::from_value(serde_json::json!({
            "user": {
                "_id": "5e32fc85ab319c2ab1beb07c",
                "username": "osk",
                "country": "JP",
                "avatar_revision": 1700000000000i64,
                "league": {"rating": 24500.0, "rank": "x"}
            }
        }))
        .unwrap();
        let mut record = PlayerRecord {
            discord_id: "d-osk".to_string(),
            tetrio_id: data.user.id.clone(),
            data,
        };

        let embed = record.info_embed();
        assert_eq!(embed.title, "osk");
        assert_eq!(embed.color, Some(PLAYER_CARD_COLOR));
        assert_eq!(embed.fields[1].name, "Rank");
        assert_eq!(embed.fields[1].value, "X");
        assert_eq!(embed.fields[2].value, "https://ch.tetr.io/u/osk");
        assert_eq!(
            embed.thumbnail_url.as_deref(),
            Some("https://tetr.io/user-content/avatars/5e32fc85ab319c2ab1beb07c.jpg?rv=1700000000000")
        );

        record.data.user.avatar_revision = None;
        assert_eq!(record.info_embed().thumbnail_url, None);
    }

    #[test]
    fn test_status_round_trip_db() {
        for status in [
            TournamentStatus::Closed,
            TournamentStatus::Open,
            TournamentStatus::Finished,
        ] {
            assert_eq!(TournamentStatus::from_db(status.as_str()), Some(status));
        }
        assert_eq!(TournamentStatus::from_db("running"), None);
    }
}
