// Copyright 2025 Cowboy AI, LLC.

//! The match repository boundary
//!
//! The engine never touches storage. Applications persist the [`Match`]
//! aggregate through a [`MatchRepository`], look it up by its short
//! [`MatchCode`] and follow live changes through a subscription stream.

use crate::cricket_match::Match;
use crate::entity::MatchId;
use async_trait::async_trait;
use futures::stream::BoxStream;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// Characters in a match code
pub const MATCH_CODE_LEN: usize = 6;

const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Short shareable code for joining a match, e.g. `K7Q2ZD`
///
/// # Examples
///
/// ```rust
/// use cim_domain_cricket::persistence::MatchCode;
///
/// let code: MatchCode = "k7q2zd".parse().unwrap();
/// assert_eq!(code.as_str(), "K7Q2ZD");
/// assert!("K7Q2".parse::<MatchCode>().is_err());
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct MatchCode(String);

impl MatchCode {
    /// Draw a random code
    pub fn generate() -> Self {
        let bytes = *Uuid::new_v4().as_bytes();
        Self(
            bytes[..MATCH_CODE_LEN]
                .iter()
                .map(|b| char::from(CODE_ALPHABET[usize::from(*b) % CODE_ALPHABET.len()]))
                .collect(),
        )
    }

    /// The code as text
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for MatchCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for MatchCode {
    type Err = RepositoryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let code = s.trim().to_ascii_uppercase();
        if code.len() == MATCH_CODE_LEN && code.bytes().all(|b| b.is_ascii_alphanumeric()) {
            Ok(Self(code))
        } else {
            Err(RepositoryError::InvalidCode(s.to_string()))
        }
    }
}

impl TryFrom<String> for MatchCode {
    type Error = RepositoryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<MatchCode> for String {
    fn from(code: MatchCode) -> Self {
        code.0
    }
}

/// Repository errors
///
/// Kept apart from [`crate::ScoringError`]: a storage failure never makes a
/// scoring operation fail.
#[derive(Debug, thiserror::Error)]
pub enum RepositoryError {
    /// No match stored under this id
    #[error("Match not found: {0}")]
    NotFound(MatchId),

    /// Code does not have the expected shape
    #[error("Invalid match code: {0}")]
    InvalidCode(String),

    /// A newer snapshot is already stored
    #[error("Version conflict: stored {stored}, incoming {incoming}")]
    VersionConflict {
        /// Version already stored
        stored: u64,
        /// Version that was offered
        incoming: u64,
    },

    /// Backend failure
    #[error("Storage error: {0}")]
    Storage(String),

    /// Persisted representation could not be written or read
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Live snapshots of one match, newest last
pub type MatchSubscription = BoxStream<'static, Match>;

/// Storage for match documents
#[async_trait]
pub trait MatchRepository: Send + Sync {
    /// Store a new match and issue its code
    async fn create(&self, game: &Match) -> Result<MatchCode, RepositoryError>;

    /// Replace the stored snapshot of a match
    async fn update(&self, id: MatchId, game: &Match) -> Result<(), RepositoryError>;

    /// Look a match up by code
    async fn get_by_code(&self, code: &MatchCode) -> Result<Option<Match>, RepositoryError>;

    /// Follow every later update of a match
    async fn subscribe(&self, id: MatchId) -> Result<MatchSubscription, RepositoryError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_codes_are_well_formed() {
        for _ in 0..100 {
            let code = MatchCode::generate();
            assert_eq!(code.as_str().len(), MATCH_CODE_LEN);
            assert_eq!(code.as_str().parse::<MatchCode>().unwrap(), code);
        }
    }

    #[test]
    fn test_code_parsing() {
        assert_eq!(" ab12cd ".parse::<MatchCode>().unwrap().as_str(), "AB12CD");
        assert!(matches!(
            "AB-2CD".parse::<MatchCode>(),
            Err(RepositoryError::InvalidCode(_))
        ));

        let json = serde_json::to_string(&MatchCode::generate()).unwrap();
        assert_eq!(json.len(), MATCH_CODE_LEN + 2);
        assert!(serde_json::from_str::<MatchCode>("\"TOOLONG1\"").is_err());
    }
}
