//! Shared data model for slide decks.

mod types;

pub use types::*;
