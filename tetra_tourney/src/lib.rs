//! # Tetra Tourney
//!
//! Registration and roster engine for TETR.IO tournaments run from chat
//! servers.
//!
//! The engine itself is pure: [`rank`] defines the ordered tier scale,
//! [`eligibility`] decides whether a player may register and [`roster`] orders
//! and renders player lists. Around it sit the [`tetrio`] client that fetches
//! player data, the [`db`] repositories and the [`tournament`] manager that
//! ties them together.
//!
//! ## Example
//!
//! ```
//! use std::collections::HashSet;
//! use tetra_tourney::eligibility::{self, PlayerSnapshot, TournamentConstraints};
//! use tetra_tourney::rank::Tier;
//!
//! let constraints = TournamentConstraints {
//!     is_open: true,
//!     is_rank_capped: true,
//!     rank_cap: Some(Tier::S),
//!     current_player_ids: HashSet::new(),
//!     ..Default::default()
//! };
//! let snapshot = PlayerSnapshot::new(Some("US".to_string()), Tier::A, 18_000.0);
//!
//! assert!(eligibility::evaluate("1234", &snapshot, &constraints).is_allowed());
//! ```

/// Ordered tier scale.
pub mod rank;
pub use rank::{RankError, RankScale, Tier};

/// Registration eligibility rules.
pub mod eligibility;
pub use eligibility::{Decision, DenialReason, PlayerSnapshot, TournamentConstraints};

/// Roster ordering and rendering.
pub mod roster;
pub use roster::{ListFormat, RenderError, Rendered, RosterEntry, SortKey, SubsetFilter};

/// TETR.IO API client.
pub mod tetrio;

/// Persistence.
pub mod db;

/// Tournament management.
pub mod tournament;
pub use tournament::{TournamentError, TournamentManager};
