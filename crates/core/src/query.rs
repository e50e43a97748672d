//! Derived views over the collection: filtering, search and option sets.

use std::collections::HashSet;

use crate::models::Game;

/// Filter inputs for the collection list.
///
/// Empty values pass everything through. The three predicates are combined
/// with AND and the result keeps the collection's insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct GameFilter {
    /// Exact category to keep.
    pub category: Option<String>,
    /// Exact producer to keep.
    pub producer: Option<String>,
    /// Case-insensitive substring matched against the game name.
    pub search: String,
}

impl GameFilter {
    /// Filter matching only `category`.
    pub fn by_category(category: impl Into<String>) -> Self {
        Self {
            category: Some(category.into()),
            ..Self::default()
        }
    }

    /// Filter matching only names containing `search`.
    pub fn by_search(search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..Self::default()
        }
    }

    /// True when any predicate narrows the result.
    pub fn is_active(&self) -> bool {
        active(&self.category).is_some()
            || active(&self.producer).is_some()
            || !self.search.is_empty()
    }

    /// Reset every predicate.
    pub fn clear(&mut self) {
        *self = Self::default();
    }

    /// Whether a single record passes all predicates.
    pub fn matches(&self, game: &Game) -> bool {
        let category = active(&self.category).map_or(true, |value| game.category == value);
        let producer = active(&self.producer).map_or(true, |value| game.producer == value);
        let search = self.search.is_empty()
            || game
                .name
                .to_lowercase()
                .contains(&self.search.to_lowercase());
        category && producer && search
    }

    /// Records from `games` that pass the filter, in source order.
    pub fn apply<'a>(&self, games: &'a [Game]) -> Vec<&'a Game> {
        games.iter().filter(|game| self.matches(game)).collect()
    }
}

fn active(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|value| !value.is_empty())
}

/// Distinct categories present in `games`, in first-seen order.
pub fn categories(games: &[Game]) -> Vec<String> {
    distinct(games.iter().map(|game| game.category.as_str()))
}

/// Distinct producers present in `games`, in first-seen order.
pub fn producers(games: &[Game]) -> Vec<String> {
    distinct(games.iter().map(|game| game.producer.as_str()))
}

fn distinct<'a>(values: impl Iterator<Item = &'a str>) -> Vec<String> {
    let mut seen = HashSet::new();
    values
        .filter(|value| seen.insert(*value))
        .map(str::to_string)
        .collect()
}
