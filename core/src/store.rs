use std::collections::HashMap;
use std::sync::Arc;

use slide_common::Deck;
use tokio::sync::RwLock;

use crate::error::NotFoundError;

/// Volatile deck cache shared by every request in the process.
///
/// Cloning yields another handle to the same map. Nothing is persisted or
/// evicted; a second `put` under the same id replaces the first.
#[derive(Debug, Clone, Default)]
pub struct DeckStore {
    decks: Arc<RwLock<HashMap<String, Deck>>>,
}

impl DeckStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn put(&self, deck: Deck) {
        let mut guard = self.decks.write().await;
        guard.insert(deck.id.clone(), deck);
    }

    pub async fn get(&self, id: &str) -> Result<Deck, NotFoundError> {
        let guard = self.decks.read().await;
        guard.get(id).cloned().ok_or_else(|| NotFoundError {
            id: id.to_string(),
        })
    }

    pub async fn len(&self) -> usize {
        self.decks.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.decks.read().await.is_empty()
    }
}
