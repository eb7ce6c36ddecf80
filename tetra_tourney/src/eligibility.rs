//! Registration eligibility rules.
//!
//! [`evaluate`] runs an ordered table of checks over a player snapshot and a
//! tournament's constraints. The first failing check decides the outcome, so
//! the order of [`CHECKS`] is the priority among denial reasons.

use crate::rank::{RankError, Tier};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;

/// Player skill data as reported by the rank provider for one decision.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlayerSnapshot {
    /// ISO 3166 alpha-2 country code, if the player set one
    pub country_code: Option<String>,
    /// Current Tetra League tier
    pub tier: Tier,
    /// Current Tetra League rating (TR)
    pub rating: f64,
}

impl PlayerSnapshot {
    pub fn new(country_code: Option<String>, tier: Tier, rating: f64) -> Self {
        Self {
            country_code,
            tier,
            rating,
        }
    }

    /// Build a snapshot from a raw tier label.
    pub fn from_label(
        country_code: Option<String>,
        tier: &str,
        rating: f64,
    ) -> Result<Self, RankError> {
        Ok(Self::new(country_code, tier.parse()?, rating))
    }
}

/// Registration constraints of a single tournament, read once per decision.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct TournamentConstraints {
    pub is_open: bool,
    pub is_country_locked: bool,
    pub country_lock: Option<String>,
    pub is_rank_capped: bool,
    pub rank_cap: Option<Tier>,
    pub is_tr_capped: bool,
    pub tr_cap: Option<f64>,
    pub max_players: Option<u32>,
    pub current_player_ids: HashSet<String>,
    pub current_player_count: usize,
}

/// Why a registration was refused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DenialReason {
    RegistrationClosed,
    AlreadyRegistered,
    CountryMismatch,
    UnrankedCannotVerifyRating,
    RatingAboveCap,
    Unranked,
    TierAboveCap,
    TournamentFull,
}

impl DenialReason {
    pub const fn message(self) -> &'static str {
        match self {
            DenialReason::RegistrationClosed => "registration closed",
            DenialReason::AlreadyRegistered => "already registered",
            DenialReason::CountryMismatch => "country mismatch",
            DenialReason::UnrankedCannotVerifyRating => "unranked, cannot verify rating",
            DenialReason::RatingAboveCap => "rating above cap",
            DenialReason::Unranked => "unranked",
            DenialReason::TierAboveCap => "tier above cap",
            DenialReason::TournamentFull => "tournament full",
        }
    }
}

impl fmt::Display for DenialReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.message())
    }
}

/// Outcome of an eligibility evaluation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "outcome", content = "reason", rename_all = "snake_case")]
pub enum Decision {
    Allowed,
    Denied(DenialReason),
}

impl Decision {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Decision::Allowed)
    }

    pub fn reason(&self) -> Option<DenialReason> {
        match self {
            Decision::Allowed => None,
            Decision::Denied(reason) => Some(*reason),
        }
    }
}

/// Everything a single check may look at.
#[derive(Debug, Clone, Copy)]
pub struct Candidate<'a> {
    pub player_id: &'a str,
    pub snapshot: &'a PlayerSnapshot,
    pub constraints: &'a TournamentConstraints,
}

/// A check returns `Some(reason)` when the candidate fails it.
pub type Check = fn(&Candidate<'_>) -> Option<DenialReason>;

/// Registration checks in priority order.
pub const CHECKS: [(&str, Check); 6] = [
    ("status", check_open),
    ("duplicate", check_not_registered),
    ("country_lock", check_country),
    ("tr_cap", check_tr_cap),
    ("rank_cap", check_rank_cap),
    ("capacity", check_capacity),
];

/// Decide whether `player_id` may join a tournament with `constraints`.
pub fn evaluate(
    player_id: &str,
    snapshot: &PlayerSnapshot,
    constraints: &TournamentConstraints,
) -> Decision {
    let candidate = Candidate {
        player_id,
        snapshot,
        constraints,
    };

    CHECKS
        .iter()
        .find_map(|(_, check)| check(&candidate))
        .map_or(Decision::Allowed, Decision::Denied)
}

fn check_open(c: &Candidate<'_>) -> Option<DenialReason> {
    (!c.constraints.is_open).then_some(DenialReason::RegistrationClosed)
}

fn check_not_registered(c: &Candidate<'_>) -> Option<DenialReason> {
    c.constraints
        .current_player_ids
        .contains(c.player_id)
        .then_some(DenialReason::AlreadyRegistered)
}

fn check_country(c: &Candidate<'_>) -> Option<DenialReason> {
    if !c.constraints.is_country_locked {
        return None;
    }

    let matches = match (&c.constraints.country_lock, &c.snapshot.country_code) {
        (Some(lock), Some(country)) => lock.trim().eq_ignore_ascii_case(country.trim()),
        _ => false,
    };

    (!matches).then_some(DenialReason::CountryMismatch)
}

fn check_tr_cap(c: &Candidate<'_>) -> Option<DenialReason> {
    if !c.constraints.is_tr_capped {
        return None;
    }

    if c.snapshot.tier.is_unranked() {
        return Some(DenialReason::UnrankedCannotVerifyRating);
    }

    match c.constraints.tr_cap {
        Some(cap) if c.snapshot.rating <= cap => None,
        _ => Some(DenialReason::RatingAboveCap),
    }
}

fn check_rank_cap(c: &Candidate<'_>) -> Option<DenialReason> {
    if !c.constraints.is_rank_capped {
        return None;
    }

    if c.snapshot.tier.is_unranked() {
        return Some(DenialReason::Unranked);
    }

    match c.constraints.rank_cap {
        Some(cap) if cap >= c.snapshot.tier => None,
        _ => Some(DenialReason::TierAboveCap),
    }
}

fn check_capacity(c: &Candidate<'_>) -> Option<DenialReason> {
    let max = c.constraints.max_players?;
    (c.constraints.current_player_count >= max as usize).then_some(DenialReason::TournamentFull)
}
