// Copyright 2025 Cowboy AI, LLC.

//! In-process match repository
//!
//! Stores each match as its JSON document, the same representation a remote
//! store would hold, and rehydrates on every read. Subscribers get a fresh
//! snapshot after each accepted update.

use super::repository::{MatchCode, MatchRepository, MatchSubscription, RepositoryError};
use crate::cricket_match::Match;
use crate::entity::{AggregateRoot, MatchId};
use async_trait::async_trait;
use futures::StreamExt;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::{broadcast, RwLock};
use tokio_stream::wrappers::BroadcastStream;
use tracing::{debug, info, warn};

const SUBSCRIPTION_CAPACITY: usize = 64;

struct StoredMatch {
    document: String,
    version: u64,
    changes: broadcast::Sender<Match>,
}

#[derive(Default)]
struct Store {
    matches: HashMap<MatchId, StoredMatch>,
    codes: HashMap<MatchCode, MatchId>,
}

/// Repository backed by a shared in-memory map
#[derive(Clone, Default)]
pub struct InMemoryMatchRepository {
    store: Arc<RwLock<Store>>,
}

impl InMemoryMatchRepository {
    /// Empty repository
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored matches
    pub async fn len(&self) -> usize {
        self.store.read().await.matches.len()
    }

    /// Whether nothing is stored
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    /// Raw stored document for a match
    pub async fn document(&self, id: MatchId) -> Option<String> {
        self.store
            .read()
            .await
            .matches
            .get(&id)
            .map(|stored| stored.document.clone())
    }
}

#[async_trait]
impl MatchRepository for InMemoryMatchRepository {
    async fn create(&self, game: &Match) -> Result<MatchCode, RepositoryError> {
        let mut store = self.store.write().await;

        let mut code = MatchCode::generate();
        while store.codes.contains_key(&code) {
            code = MatchCode::generate();
        }

        let mut stored = game.clone();
        stored.assign_code(code.clone());
        let document = serde_json::to_string(&stored)?;

        let (changes, _) = broadcast::channel(SUBSCRIPTION_CAPACITY);
        store.matches.insert(
            game.id(),
            StoredMatch {
                document,
                version: game.version(),
                changes,
            },
        );
        store.codes.insert(code.clone(), game.id());

        info!(match_id = %game.id(), %code, "match stored");
        Ok(code)
    }

    async fn update(&self, id: MatchId, game: &Match) -> Result<(), RepositoryError> {
        let document = serde_json::to_string(game)?;
        let snapshot = Match::from_json(&document)?;

        let mut store = self.store.write().await;
        let stored = store
            .matches
            .get_mut(&id)
            .ok_or(RepositoryError::NotFound(id))?;
        if game.version() < stored.version {
            warn!(match_id = %id, stored = stored.version, incoming = game.version(), "stale update rejected");
            return Err(RepositoryError::VersionConflict {
                stored: stored.version,
                incoming: game.version(),
            });
        }

        stored.document = document;
        stored.version = game.version();
        // No subscribers is fine.
        let _ = stored.changes.send(snapshot);

        debug!(match_id = %id, version = game.version(), "match updated");
        Ok(())
    }

    async fn get_by_code(&self, code: &MatchCode) -> Result<Option<Match>, RepositoryError> {
        let store = self.store.read().await;
        let Some(stored) = store.codes.get(code).and_then(|id| store.matches.get(id)) else {
            return Ok(None);
        };
        Ok(Some(Match::from_json(&stored.document)?))
    }

    async fn subscribe(&self, id: MatchId) -> Result<MatchSubscription, RepositoryError> {
        let store = self.store.read().await;
        let stored = store.matches.get(&id).ok_or(RepositoryError::NotFound(id))?;
        let receiver = stored.changes.subscribe();

        // Lagged subscribers skip to the newest snapshots.
        Ok(BroadcastStream::new(receiver)
            .filter_map(|change| futures::future::ready(change.ok()))
            .boxed())
    }
}
