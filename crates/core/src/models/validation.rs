use std::fmt;

use once_cell::sync::Lazy;
use regex::Regex;

use super::GameDraft;

static YEAR_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[0-9]{4}$").expect("valid year regex"));

/// Editable fields of a game record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Field {
    /// Game title.
    Name,
    /// Genre label.
    Category,
    /// Release year.
    Year,
    /// Studio credit.
    Producer,
    /// Cover art.
    Image,
}

impl Field {
    /// All fields in form order.
    pub const ALL: [Field; 5] = [
        Field::Name,
        Field::Category,
        Field::Year,
        Field::Producer,
        Field::Image,
    ];

    /// Lowercase key matching the serialized record.
    pub fn key(self) -> &'static str {
        match self {
            Field::Name => "name",
            Field::Category => "category",
            Field::Year => "year",
            Field::Producer => "producer",
            Field::Image => "image",
        }
    }

    /// Human-readable label for forms.
    pub fn label(self) -> &'static str {
        match self {
            Field::Name => "Name",
            Field::Category => "Category",
            Field::Year => "Year",
            Field::Producer => "Producer",
            Field::Image => "Image",
        }
    }
}

impl fmt::Display for Field {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key())
    }
}

/// Per-field validation failures, in form order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    errors: Vec<(Field, &'static str)>,
}

impl ValidationErrors {
    fn push(&mut self, field: Field, message: &'static str) {
        self.errors.push((field, message));
    }

    /// Message attached to `field`, if it failed.
    pub fn message(&self, field: Field) -> Option<&'static str> {
        self.errors
            .iter()
            .find(|(candidate, _)| *candidate == field)
            .map(|(_, message)| *message)
    }

    /// Fields that failed validation.
    pub fn fields(&self) -> impl Iterator<Item = Field> + '_ {
        self.errors.iter().map(|(field, _)| *field)
    }

    /// True when no field failed.
    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }
}

impl fmt::Display for ValidationErrors {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let parts: Vec<String> = self
            .errors
            .iter()
            .map(|(field, message)| format!("{field}: {message}"))
            .collect();
        f.write_str(&parts.join("; "))
    }
}

impl std::error::Error for ValidationErrors {}

pub(super) fn validate(draft: &GameDraft) -> Result<(), ValidationErrors> {
    let mut errors = ValidationErrors::default();
    if draft.name.trim().is_empty() {
        errors.push(Field::Name, "name is required");
    }
    if draft.category.trim().is_empty() {
        errors.push(Field::Category, "category is required");
    }
    if !YEAR_PATTERN.is_match(&draft.year) {
        errors.push(Field::Year, "year must be four digits");
    }
    if draft.producer.trim().is_empty() {
        errors.push(Field::Producer, "producer is required");
    }
    if draft.image.trim().is_empty() {
        errors.push(Field::Image, "image is required");
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
