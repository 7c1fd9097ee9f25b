//! Common types and fixtures for tests.
//!
//! This module contains:
//! - `User` and `UserNotFoundError`: the domain used by every scenario
//! - `UserRepository`: an in-memory repository passed by reference
//! - `Calls`: a shared call counter for short-circuit checks

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use crate::{Error, Outcome, ReasonLike};

// ============================================================================
// Domain
// ============================================================================

#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub id: u32,
    pub email: String,
}

impl User {
    pub fn new(id: u32, email: &str) -> Self {
        Self {
            id,
            email: email.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct UserNotFoundError {
    pub id: u32,
}

impl From<UserNotFoundError> for Error {
    fn from(err: UserNotFoundError) -> Self {
        Error::not_found(format!("user {} not found", err.id)).with_tag("user_id", err.id)
    }
}

// ============================================================================
// Call Counter
// ============================================================================

/// Counts invocations; clones share the count.
#[derive(Debug, Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
    pub fn hit(&self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }

    pub fn count(&self) -> usize {
        self.0.load(Ordering::SeqCst)
    }
}

// ============================================================================
// Repository
// ============================================================================

/// In-memory user store. Every method records its calls.
#[derive(Debug, Default)]
pub struct UserRepository {
    users: HashMap<u32, User>,
    pub get_calls: Calls,
    pub save_calls: Calls,
}

impl UserRepository {
    pub fn with_users(users: impl IntoIterator<Item = User>) -> Self {
        Self {
            users: users.into_iter().map(|u| (u.id, u)).collect(),
            ..Self::default()
        }
    }

    pub fn get(&self, id: u32) -> Outcome<User> {
        self.get_calls.hit();
        match self.users.get(&id) {
            Some(user) => Outcome::ok(user.clone()),
            None => Outcome::fail_with(UserNotFoundError { id }),
        }
    }

    pub async fn get_async(&self, id: u32) -> Outcome<User> {
        tokio::task::yield_now().await;
        self.get(id)
    }

    pub async fn save_async(&self, user: User) -> Outcome<u32> {
        self.save_calls.hit();
        tokio::task::yield_now().await;
        Outcome::ok(user.id).with_success(format!("saved user {}", user.id))
    }
}

/// Message of the first error, for terse assertions.
pub fn first_message<T>(outcome: &Outcome<T>) -> Option<&str> {
    outcome.first_error().map(|e| e.message())
}
