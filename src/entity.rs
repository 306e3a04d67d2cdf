// Copyright 2025 Cowboy AI, LLC.

//! Typed identifiers and the aggregate root contract

use serde::{Deserialize, Serialize};
use std::fmt;
use std::marker::PhantomData;
use std::str::FromStr;
use uuid::Uuid;

/// A typed entity ID using phantom types for type safety
///
/// The phantom parameter keeps match, team and player ids from being mixed up
/// at compile time while all of them serialize as a bare UUID.
///
/// # Examples
///
/// ```rust
/// use cim_domain_cricket::{MatchId, PlayerId};
///
/// let player = PlayerId::new();
/// let same: PlayerId = player.to_string().parse().unwrap();
/// assert_eq!(player, same);
///
/// // Won't compile: let _: MatchId = player;
/// let _match_id = MatchId::new();
/// ```
#[derive(Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId<T> {
    id: Uuid,
    #[serde(skip)]
    _phantom: PhantomData<T>,
}

impl<T> EntityId<T> {
    /// Create a new random entity ID
    pub fn new() -> Self {
        Self::from_uuid(Uuid::new_v4())
    }

    /// Create an entity ID from a UUID
    pub fn from_uuid(id: Uuid) -> Self {
        Self {
            id,
            _phantom: PhantomData,
        }
    }

    /// Get the underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.id
    }
}

// Manual impls so the marker type needs no bounds of its own.
impl<T> Clone for EntityId<T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T> Copy for EntityId<T> {}

impl<T> PartialEq for EntityId<T> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl<T> Eq for EntityId<T> {}

impl<T> std::hash::Hash for EntityId<T> {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl<T> PartialOrd for EntityId<T> {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl<T> Ord for EntityId<T> {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl<T> fmt::Debug for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntityId({})", self.id)
    }
}

impl<T> fmt::Display for EntityId<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

impl<T> Default for EntityId<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> FromStr for EntityId<T> {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self::from_uuid)
    }
}

impl<T> From<EntityId<T>> for Uuid {
    fn from(id: EntityId<T>) -> Self {
        id.id
    }
}

/// Marker for cricket matches
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MatchMarker;

/// Marker for teams
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TeamMarker;

/// Marker for rostered players
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PlayerMarker;

/// Identifier of a [`crate::Match`]
pub type MatchId = EntityId<MatchMarker>;
/// Identifier of a [`crate::Team`]
pub type TeamId = EntityId<TeamMarker>;
/// Identifier of a rostered [`crate::Player`]
pub type PlayerId = EntityId<PlayerMarker>;

/// Marker trait for aggregate roots
///
/// Aggregate roots are the entry points for modifying aggregates. All changes
/// to innings, overs and stats go through the match root, which bumps its
/// version on every accepted mutation.
pub trait AggregateRoot: Sized {
    /// The type of ID for this aggregate
    type Id: Copy + Eq + Send + Sync;

    /// Get the aggregate's ID
    fn id(&self) -> Self::Id;

    /// Get the aggregate's version for optimistic concurrency
    fn version(&self) -> u64;

    /// Increment the version
    fn increment_version(&mut self);
}
