//! Authoritative in-memory game collection with a write-through slot mirror.

use std::collections::HashSet;

use tracing::{debug, info, warn};

use crate::{
    error::StoreError,
    ids::{IdGenerator, UuidGenerator},
    models::{Game, GameDraft},
    storage::{SlotStorage, COLLECTION_SLOT},
};

/// Owns the game collection and persists every mutation in full.
///
/// Built once at startup and passed by reference to whatever reads or
/// mutates the collection. Mutations build the next snapshot, write it to
/// the collection slot and only then replace the in-memory copy, so a failed
/// write leaves the last persisted state in place.
pub struct GameStore<S, G = UuidGenerator> {
    storage: S,
    ids: G,
    games: Vec<Game>,
    load_warning: Option<String>,
}

impl<S: SlotStorage> GameStore<S> {
    /// Load the collection from `storage` using random UUID identifiers.
    pub fn load(storage: S) -> Result<Self, StoreError> {
        Self::load_with(storage, UuidGenerator)
    }
}

impl<S: SlotStorage, G: IdGenerator> GameStore<S, G> {
    /// Load the collection from `storage` with a custom id source.
    ///
    /// An empty or missing slot yields an empty collection. Corrupt contents
    /// also yield an empty collection; the parse failure is kept as a
    /// non-fatal [`load_warning`](Self::load_warning).
    pub fn load_with(storage: S, ids: G) -> Result<Self, StoreError> {
        let raw = storage.get(COLLECTION_SLOT).map_err(StoreError::Storage)?;
        let (games, load_warning) = match raw {
            None => (Vec::new(), None),
            Some(content) if content.trim().is_empty() => (Vec::new(), None),
            Some(content) => match serde_json::from_str::<Vec<Game>>(&content) {
                Ok(games) => (dedupe_ids(games, &ids), None),
                Err(err) => {
                    warn!("stored collection is unreadable, starting empty: {err}");
                    (
                        Vec::new(),
                        Some(format!("Saved collection could not be read ({err}); starting empty.")),
                    )
                }
            },
        };

        info!("loaded {} games", games.len());
        Ok(Self {
            storage,
            ids,
            games,
            load_warning,
        })
    }

    /// Warning produced while recovering from corrupt persisted data.
    pub fn load_warning(&self) -> Option<&str> {
        self.load_warning.as_deref()
    }

    /// Current collection snapshot in insertion order.
    pub fn get_all(&self) -> &[Game] {
        &self.games
    }

    /// Look up a record by id.
    pub fn get(&self, id: &str) -> Option<&Game> {
        self.games.iter().find(|game| game.id == id)
    }

    /// Number of stored records.
    pub fn len(&self) -> usize {
        self.games.len()
    }

    /// True when the collection holds no records.
    pub fn is_empty(&self) -> bool {
        self.games.is_empty()
    }

    /// Borrow the underlying slot storage.
    pub fn storage(&self) -> &S {
        &self.storage
    }

    /// Append a new record with a freshly generated id and persist.
    pub fn add(&mut self, draft: GameDraft) -> Result<Game, StoreError> {
        let mut added = self.add_many(vec![draft])?;
        Ok(added.remove(0))
    }

    /// Append several records in order, persisting once for the batch.
    ///
    /// Every draft is validated before anything is written; one invalid draft
    /// rejects the whole batch.
    pub fn add_many(&mut self, drafts: Vec<GameDraft>) -> Result<Vec<Game>, StoreError> {
        if drafts.is_empty() {
            return Ok(Vec::new());
        }
        for draft in &drafts {
            draft.validate()?;
        }

        let mut taken: HashSet<String> = self.games.iter().map(|game| game.id.clone()).collect();
        let mut next = self.games.clone();
        let mut added = Vec::with_capacity(drafts.len());
        for draft in drafts {
            let id = fresh_id(&self.ids, &taken);
            taken.insert(id.clone());
            let game = Game::from_draft(id, draft);
            debug!("adding game {} ({})", game.name, game.id);
            next.push(game.clone());
            added.push(game);
        }

        self.commit(next)?;
        Ok(added)
    }

    /// Replace the record whose id matches `game.id`.
    ///
    /// Returns `Ok(false)` without touching storage when no record matches.
    /// Unknown ids are not validated.
    pub fn update(&mut self, game: Game) -> Result<bool, StoreError> {
        let Some(index) = self.games.iter().position(|existing| existing.id == game.id) else {
            debug!("update ignored, unknown id {}", game.id);
            return Ok(false);
        };
        game.draft().validate()?;

        debug!("updating game {}", game.id);
        let mut next = self.games.clone();
        next[index] = game;
        self.commit(next)?;
        Ok(true)
    }

    /// Remove the record with `id`, returning whether one was removed.
    pub fn delete(&mut self, id: &str) -> Result<bool, StoreError> {
        if !self.games.iter().any(|game| game.id == id) {
            debug!("delete ignored, unknown id {id}");
            return Ok(false);
        }

        debug!("deleting game {id}");
        let next: Vec<Game> = self
            .games
            .iter()
            .filter(|game| game.id != id)
            .cloned()
            .collect();
        self.commit(next)?;
        Ok(true)
    }

    fn commit(&mut self, next: Vec<Game>) -> Result<(), StoreError> {
        let serialized = serde_json::to_string(&next)?;
        self.storage
            .set(COLLECTION_SLOT, &serialized)
            .map_err(StoreError::Storage)?;
        self.games = next;
        Ok(())
    }
}

fn fresh_id<G: IdGenerator>(ids: &G, taken: &HashSet<String>) -> String {
    loop {
        let candidate = ids.generate();
        if !candidate.is_empty() && !taken.contains(&candidate) {
            return candidate;
        }
    }
}

// Hand-edited slots can repeat ids; later duplicates get fresh ones so lookups stay unambiguous.
fn dedupe_ids<G: IdGenerator>(mut games: Vec<Game>, ids: &G) -> Vec<Game> {
    let mut taken: HashSet<String> = games.iter().map(|game| game.id.clone()).collect();
    let mut seen: HashSet<String> = HashSet::with_capacity(games.len());
    let mut reassigned = 0usize;
    for game in &mut games {
        if game.id.is_empty() || seen.contains(&game.id) {
            game.id = fresh_id(ids, &taken);
            taken.insert(game.id.clone());
            reassigned += 1;
        }
        seen.insert(game.id.clone());
    }
    if reassigned > 0 {
        warn!("reassigned {reassigned} duplicate game ids");
    }
    games
}
