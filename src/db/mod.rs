//! Database layer
//!
//! SQLite access for the inkpress API: pool creation, embedded migrations
//! and the per-entity repositories.

pub mod migrations;
pub mod pool;
pub mod repositories;

pub use pool::{create_pool, create_test_pool};
