//! Scenario and law tests for outcomes and unions.
//!
//! ## Test Organization
//!
//! - `common`: Shared domain types, repository and call counters
//! - `scenarios`: End-to-end pipelines over the user domain
//! - `laws`: Property tests for the combinator algebra
//! - `async_chain`: Async pipelines, ordering and cancellation
//! - `one_of`: Union exclusivity and dispatch
//!
//! ## Test Domain
//!
//! All scenarios use a small "users" domain:
//! - `User`: id and email
//! - `UserNotFoundError`: converts into a `NotFound` error tagged with the id
//! - `UserRepository`: in-memory store counting `get` and `save` calls

mod common;
