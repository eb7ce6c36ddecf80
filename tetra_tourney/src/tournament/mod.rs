//! Tournament records and the operations organizers and players run on them.
//!
//! ## Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use tetra_tourney::db::InMemoryStore;
//! use tetra_tourney::tetrio::{TetrioClient, TetrioConfig};
//! use tetra_tourney::tournament::{NewTournament, TournamentManager};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let store = Arc::new(InMemoryStore::new());
//!     let client = Arc::new(TetrioClient::new(&TetrioConfig::default())?);
//!     let manager = TournamentManager::new(store.clone(), store, client);
//!
//!     let tournament = manager
//!         .create_tournament(NewTournament::tetrio("guild", "organizer", "Weekly Cup"))
//!         .await?;
//!     let outcome = manager
//!         .register_player("guild", tournament.id, "discord-id", "osk")
//!         .await?;
//!     println!("{:?}", outcome.decision);
//!     Ok(())
//! }
//! ```

pub mod manager;
pub mod models;

pub use manager::{
    AUTOCOMPLETE_LIMIT, DEFAULT_MAX_ATTEMPTS, TournamentError, TournamentManager,
    TournamentResult,
};
pub use models::{
    DETAILS_COLOR, MAX_TR_CAP, NewTournament, PLAYER_CARD_COLOR, PlayerDeletion, PlayerRecord,
    RegistrationOutcome, TETRIO_GAME, Tournament, TournamentChoice, TournamentEdit, TournamentId, TournamentStatus,
};
