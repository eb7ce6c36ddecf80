//! Tetra League rank scale.
//!
//! The scale is a fixed, total order over the tier labels handed out by
//! TETR.IO, from `z` (unranked) up to `x`. It is declared exactly once as
//! [`Tier::ALL`]; every component that compares ranks goes through it.

use serde::{Deserialize, Serialize};
use std::cmp::Ordering;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Rank scale errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RankError {
    #[error("Unknown tier: {0}")]
    UnknownTier(String),
}

/// A Tetra League tier.
///
/// Variants are declared lowest to highest, so the derived `Ord` is the
/// scale order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum Tier {
    Z,
    D,
    DPlus,
    CMinus,
    C,
    CPlus,
    BMinus,
    B,
    BPlus,
    AMinus,
    A,
    APlus,
    SMinus,
    S,
    SPlus,
    SS,
    U,
    X,
}

impl Tier {
    /// The rank scale, index 0 = lowest.
    pub const ALL: [Tier; 18] = [
        Tier::Z,
        Tier::D,
        Tier::DPlus,
        Tier::CMinus,
        Tier::C,
        Tier::CPlus,
        Tier::BMinus,
        Tier::B,
        Tier::BPlus,
        Tier::AMinus,
        Tier::A,
        Tier::APlus,
        Tier::SMinus,
        Tier::S,
        Tier::SPlus,
        Tier::SS,
        Tier::U,
        Tier::X,
    ];

    /// Players without a current Tetra League rank.
    pub const UNRANKED: Tier = Tier::Z;

    /// Label as reported by the TETR.IO API.
    pub const fn label(self) -> &'static str {
        match self {
            Tier::Z => "z",
            Tier::D => "d",
            Tier::DPlus => "d+",
            Tier::CMinus => "c-",
            Tier::C => "c",
            Tier::CPlus => "c+",
            Tier::BMinus => "b-",
            Tier::B => "b",
            Tier::BPlus => "b+",
            Tier::AMinus => "a-",
            Tier::A => "a",
            Tier::APlus => "a+",
            Tier::SMinus => "s-",
            Tier::S => "s",
            Tier::SPlus => "s+",
            Tier::SS => "ss",
            Tier::U => "u",
            Tier::X => "x",
        }
    }

    /// Position on the scale.
    pub const fn index(self) -> usize {
        self as usize
    }

    pub fn is_unranked(self) -> bool {
        self == Tier::UNRANKED
    }
}

impl fmt::Display for Tier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Tier {
    type Err = RankError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim();
        Tier::ALL
            .iter()
            .copied()
            .find(|tier| tier.label().eq_ignore_ascii_case(wanted))
            .ok_or_else(|| RankError::UnknownTier(s.to_string()))
    }
}

impl TryFrom<String> for Tier {
    type Error = RankError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<Tier> for String {
    fn from(tier: Tier) -> Self {
        tier.label().to_string()
    }
}

/// String-keyed view over [`Tier::ALL`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RankScale;

impl RankScale {
    /// Index of `tier` on the scale.
    pub fn index_of(&self, tier: &str) -> Result<usize, RankError> {
        tier.parse::<Tier>().map(Tier::index)
    }

    /// Compare two tier labels by scale position.
    pub fn compare(&self, a: &str, b: &str) -> Result<Ordering, RankError> {
        Ok(self.index_of(a)?.cmp(&self.index_of(b)?))
    }

    pub fn lowest(&self) -> Tier {
        Tier::ALL[0]
    }

    pub fn highest(&self) -> Tier {
        Tier::ALL[Tier::ALL.len() - 1]
    }
}
