// Copyright 2025 Cowboy AI, LLC.

//! Who created a match
//!
//! Supplied once at match creation and stored as `created_by`. The engine
//! never consults it again.

use serde::{Deserialize, Serialize};

/// The user behind a scoring session
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Identity {
    /// Authenticated user id, if signed in
    pub user_id: Option<String>,
    /// Whether the user is scoring as a guest
    pub is_guest: bool,
}

impl Identity {
    /// A signed-in user
    pub fn user(user_id: impl Into<String>) -> Self {
        Self {
            user_id: Some(user_id.into()),
            is_guest: false,
        }
    }

    /// An anonymous guest
    pub fn guest() -> Self {
        Self {
            user_id: None,
            is_guest: true,
        }
    }
}
