// Copyright 2025 Cowboy AI, LLC.

//! # Persistence Layer
//!
//! Everything on the far side of the repository boundary. The engine itself
//! never calls into this module; applications use it to store snapshots of
//! the [`crate::Match`] aggregate and follow changes to them.
//!
//! ## Components
//!
//! - **Repository**: the [`MatchRepository`] contract and [`MatchCode`]
//! - **In-memory store**: JSON documents plus broadcast subscriptions
//! - **Cache**: TTL-bounded LRU in front of `get_by_code`
//! - **Writer**: debounced, retrying background writes

pub mod cache;
pub mod in_memory;
pub mod repository;
pub mod writer;

pub use cache::{CacheConfig, CachedMatchRepository};
pub use in_memory::InMemoryMatchRepository;
pub use repository::{
    MatchCode, MatchRepository, MatchSubscription, RepositoryError, MATCH_CODE_LEN,
};
pub use writer::{MatchWriter, PersistenceWarning, RetryPolicy, WriterConfig};
