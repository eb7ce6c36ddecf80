//! TETR.IO rank data provider.
//!
//! [`RankProvider`] is the seam between registration and the external
//! ranking service. [`TetrioClient`] talks to the public TETR.IO API; tests
//! substitute their own implementations.

pub mod client;
pub mod models;

use async_trait::async_trait;
use thiserror::Error;

pub use client::{TetrioClient, TetrioConfig};
pub use models::{ApiUserResponse, LeagueStats, TetrioUser, TetrioUserData};

/// Rank provider errors
#[derive(Debug, Error)]
pub enum ProviderError {
    /// The service answered but has no such user
    #[error("TETR.IO user not found: {0}")]
    NotFound(String),

    /// Network failure or unusable response; may succeed on a later attempt
    #[error("TETR.IO request failed: {0}")]
    Transient(String),

    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Invalid TETR.IO API URL: {0}")]
    InvalidUrl(String),
}

impl ProviderError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, ProviderError::NotFound(_))
    }
}

pub type ProviderResult<T> = Result<T, ProviderError>;

/// Source of current player skill data.
#[async_trait]
pub trait RankProvider: Send + Sync {
    /// Fetch a user by TETR.IO username or id.
    async fn fetch_user(&self, username: &str) -> ProviderResult<TetrioUserData>;
}

/// Avatar image of a user; `None` when the user never uploaded one.
pub fn avatar_url(user_id: &str, avatar_revision: Option<i64>) -> Option<String> {
    match avatar_revision {
        Some(rev) if rev != 0 => Some(format!(
            "https://tetr.io/user-content/avatars/{user_id}.jpg?rv={rev}"
        )),
        _ => None,
    }
}

pub fn profile_url(username: &str) -> String {
    format!("https://ch.tetr.io/u/{username}")
}
