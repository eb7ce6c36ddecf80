//! Roster ordering.
//!
//! Rosters are kept in registration order by the store. [`order`] produces
//! the display order for a [`SortKey`]; every sort is stable so equal keys
//! keep their registration order and ordering twice changes nothing.

pub mod render;

use crate::rank::Tier;
use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

pub use render::{EmbedField, EmbedPayload, ListFormat, RenderError, Rendered, render};

/// One roster member as shown in player listings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RosterEntry {
    pub player_id: String,
    pub username: String,
    pub tier: Tier,
    pub rating: f64,
    pub apm: Option<f64>,
    pub pps: Option<f64>,
}

/// Listing sort keys
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    /// Registration order
    #[default]
    Default,
    /// Tier, then rating
    Rank,
    /// Tetra rating
    Tr,
    /// Attack per minute
    Apm,
    /// Pieces per second
    Pps,
}

impl SortKey {
    pub const ALL: [SortKey; 5] = [
        SortKey::Default,
        SortKey::Rank,
        SortKey::Tr,
        SortKey::Apm,
        SortKey::Pps,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            SortKey::Default => "default",
            SortKey::Rank => "rank",
            SortKey::Tr => "tr",
            SortKey::Apm => "apm",
            SortKey::Pps => "pps",
        }
    }
}

impl fmt::Display for SortKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        SortKey::ALL
            .iter()
            .copied()
            .find(|key| key.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown sort key: {s}"))
    }
}

/// Which part of the roster to list.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum SubsetFilter {
    #[default]
    All,
    /// Only players whose id is in the set
    CheckedIn(HashSet<String>),
}

impl SubsetFilter {
    pub fn admits(&self, entry: &RosterEntry) -> bool {
        match self {
            SubsetFilter::All => true,
            SubsetFilter::CheckedIn(ids) => ids.contains(&entry.player_id),
        }
    }
}

/// Order `entries` for display.
///
/// The subset filter is applied first; the remaining entries are sorted
/// stably by `key`.
pub fn order(entries: &[RosterEntry], key: SortKey, subset: &SubsetFilter) -> Vec<RosterEntry> {
    let mut ordered: Vec<RosterEntry> = entries
        .iter()
        .filter(|entry| subset.admits(entry))
        .cloned()
        .collect();

    match key {
        SortKey::Default => {}
        SortKey::Rank => ordered.sort_by(by_rank),
        SortKey::Tr => ordered.sort_by(|a, b| b.rating.total_cmp(&a.rating)),
        SortKey::Apm => ordered.sort_by(|a, b| missing_last(a.apm, b.apm)),
        SortKey::Pps => ordered.sort_by(|a, b| missing_last(a.pps, b.pps)),
    }

    ordered
}

fn by_rank(a: &RosterEntry, b: &RosterEntry) -> Ordering {
    b.tier
        .cmp(&a.tier)
        .then_with(|| b.rating.total_cmp(&a.rating))
}

// Descending; `None` after every value.
fn missing_last(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(a), Some(b)) => b.total_cmp(&a),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}
