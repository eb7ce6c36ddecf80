//! TETR.IO user API payloads.
//!
//! Only the fields the tournament tooling reads are modelled; unknown fields
//! are ignored on deserialization.

use crate::eligibility::PlayerSnapshot;
use crate::rank::{RankError, Tier};
use crate::roster::RosterEntry;
use serde::{Deserialize, Serialize};

/// Response envelope of `GET /users/{username}`
#[derive(Debug, Clone, Deserialize)]
pub struct ApiUserResponse {
    pub success: bool,
    #[serde(default)]
    pub error: Option<String>,
    #[serde(default)]
    pub data: Option<TetrioUserData>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TetrioUserData {
    pub user: TetrioUser,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TetrioUser {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub country: Option<String>,
    #[serde(default)]
    pub avatar_revision: Option<i64>,
    pub league: LeagueStats,
}

/// Tetra League standing
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LeagueStats {
    #[serde(default)]
    pub gamesplayed: i64,
    #[serde(default)]
    pub gameswon: i64,
    pub rating: f64,
    pub rank: String,
    #[serde(default)]
    pub bestrank: Option<String>,
    #[serde(default)]
    pub glicko: Option<f64>,
    #[serde(default)]
    pub rd: Option<f64>,
    #[serde(default)]
    pub apm: Option<f64>,
    #[serde(default)]
    pub pps: Option<f64>,
    #[serde(default)]
    pub vs: Option<f64>,
    #[serde(default)]
    pub decaying: bool,
}

impl TetrioUserData {
    /// Current league tier.
    pub fn tier(&self) -> Result<Tier, RankError> {
        self.user.league.rank.parse()
    }

    /// Eligibility view of this user.
    pub fn snapshot(&self) -> Result<PlayerSnapshot, RankError> {
        Ok(PlayerSnapshot::new(
            self.user.country.clone(),
            self.tier()?,
            self.user.league.rating,
        ))
    }

    /// Listing view of this user, keyed by the caller's player id.
    pub fn roster_entry(&self, player_id: &str) -> Result<RosterEntry, RankError> {
        Ok(RosterEntry {
            player_id: player_id.to_string(),
            username: self.user.username.clone(),
            tier: self.tier()?,
            rating: self.user.league.rating,
            apm: self.user.league.apm,
            pps: self.user.league.pps,
        })
    }

    pub fn avatar_url(&self) -> Option<String> {
        super::avatar_url(&self.user.id, self.user.avatar_revision)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "success": true,
        "cache": {"status": "hit", "cached_at": 1, "cached_until": 2},
        "data": {
            "user": {
                "_id": "5e32fc85ab319c2ab1beb07c",
                "username": "osk",
                "role": "sysop",
                "country": "NL",
                "xp": 1.0,
                "avatar_revision": 1612225812012,
                "league": {
                    "gamesplayed": 10,
                    "gameswon": 7,
                    "rating": 21000.5,
                    "rank": "ss",
                    "apm": 60.2,
                    "pps": 2.1,
                    "decaying": false
                }
            }
        }
    }"#;

    #[test]
    fn test_parse_user_response() {
        let response: ApiUserResponse = serde_json::from_str(SAMPLE).unwrap();
        assert!(response.success);
        let data = response.data.unwrap();
        assert_eq!(data.user.username, "osk");
        assert_eq!(data.tier().unwrap(), Tier::SS);

        let snapshot = data.snapshot().unwrap();
        assert_eq!(snapshot.country_code.as_deref(), Some("NL"));
        assert_eq!(snapshot.rating, 21000.5);

        let entry = data.roster_entry("42").unwrap();
        assert_eq!(entry.player_id, "42");
        assert_eq!(entry.apm, Some(60.2));
    }

    #[test]
    fn test_failed_response() {
        let response: ApiUserResponse =
            serde_json::from_str(r#"{"success": false, "error": "No such user!"}"#).unwrap();
        assert!(!response.success);
        assert!(response.data.is_none());
        assert_eq!(response.error.as_deref(), Some("No such user!"));
    }

    #[test]
    fn test_unknown_rank_surfaces() {
        let mut data = serde_json::from_str::<ApiUserResponse>(SAMPLE)
            .unwrap()
            .data
            .unwrap();
        data.user.league.rank = "legendary".to_string();
        assert!(matches!(data.snapshot(), Err(RankError::UnknownTier(_))));
    }
}
