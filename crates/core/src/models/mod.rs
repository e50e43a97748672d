//! Shared domain models.

mod validation;

use serde::{Deserialize, Serialize};

pub use validation::{Field, ValidationErrors};

/// A single entry in the game collection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Game {
    /// Opaque identifier assigned by the store on creation.
    pub id: String,
    /// Game title.
    pub name: String,
    /// Free-form genre label (e.g. `Action`).
    pub category: String,
    /// Four digit release year, kept as text.
    pub year: String,
    /// Studio or publisher credit.
    pub producer: String,
    /// Cover art, either a `data:` URI or an external reference.
    pub image: String,
}

impl Game {
    /// Attach an identifier to the provided draft.
    pub fn from_draft(id: impl Into<String>, draft: GameDraft) -> Self {
        Self {
            id: id.into(),
            name: draft.name,
            category: draft.category,
            year: draft.year,
            producer: draft.producer,
            image: draft.image,
        }
    }

    /// Copy of the editable fields, without the identifier.
    pub fn draft(&self) -> GameDraft {
        GameDraft {
            name: self.name.clone(),
            category: self.category.clone(),
            year: self.year.clone(),
            producer: self.producer.clone(),
            image: self.image.clone(),
        }
    }

    /// Returns a user-facing label combining name and year.
    pub fn label(&self) -> String {
        if self.year.is_empty() {
            self.name.clone()
        } else {
            format!("{} ({})", self.name, self.year)
        }
    }

    /// Whether the cover art is embedded rather than referenced.
    pub fn has_embedded_image(&self) -> bool {
        self.image.starts_with("data:")
    }
}

/// Game fields as entered by the user, before an id is assigned.
///
/// Unknown keys are ignored when deserializing, so an `id` carried by an
/// imported document never reaches the store.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameDraft {
    /// Game title.
    pub name: String,
    /// Free-form genre label.
    pub category: String,
    /// Four digit release year.
    pub year: String,
    /// Studio or publisher credit.
    pub producer: String,
    /// Cover art reference or `data:` URI.
    pub image: String,
}

impl GameDraft {
    /// Check the draft against the record constraints.
    pub fn validate(&self) -> Result<(), ValidationErrors> {
        validation::validate(self)
    }

    /// Mutable access to a field by name, used by form editors.
    pub fn field_mut(&mut self, field: Field) -> &mut String {
        match field {
            Field::Name => &mut self.name,
            Field::Category => &mut self.category,
            Field::Year => &mut self.year,
            Field::Producer => &mut self.producer,
            Field::Image => &mut self.image,
        }
    }

    /// Read a field by name.
    pub fn field(&self, field: Field) -> &str {
        match field {
            Field::Name => &self.name,
            Field::Category => &self.category,
            Field::Year => &self.year,
            Field::Producer => &self.producer,
            Field::Image => &self.image,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn draft_ignores_identifier_key() -> anyhow::Result<()> {
        let draft: GameDraft = serde_json::from_value(json!({
            "id": "abc",
            "name": "Zelda",
            "category": "Action",
            "year": "1986",
            "producer": "Nintendo",
            "image": "zelda.png"
        }))?;
        assert_eq!(draft.name, "Zelda");
        assert_eq!(draft.producer, "Nintendo");
        Ok(())
    }

    #[test]
    fn game_serializes_expected_keys() -> anyhow::Result<()> {
        let game = Game::from_draft(
            "id-1",
            GameDraft {
                name: "Tetris".into(),
                category: "Puzzle".into(),
                year: "1984".into(),
                producer: "Alexey".into(),
                image: "data:image/png;base64,AAAA".into(),
            },
        );
        let value = serde_json::to_value(&game)?;
        let object = value.as_object().expect("object");
        let mut keys: Vec<_> = object.keys().map(String::as_str).collect();
        keys.sort_unstable();
        assert_eq!(
            keys,
            vec!["category", "id", "image", "name", "producer", "year"]
        );
        assert!(game.has_embedded_image());
        assert_eq!(game.label(), "Tetris (1984)");
        assert_eq!(game.draft().name, "Tetris");
        Ok(())
    }
}
