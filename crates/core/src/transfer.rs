//! JSON import and export of the whole collection.

use std::{
    fmt,
    fs::{self, OpenOptions},
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{Context, Result};
use chrono::Utc;
use serde_json::Value;
use tracing::{info, warn};

use crate::{
    error::TransferError,
    files,
    ids::IdGenerator,
    models::{Game, GameDraft},
    storage::SlotStorage,
    store::GameStore,
};

/// File name prefix for exported collections.
pub const EXPORT_FILE_PREFIX: &str = "gameshelf-collection";

/// Serialize the collection as a pretty-printed JSON array.
pub fn export_json(games: &[Game]) -> Result<String> {
    serde_json::to_string_pretty(games).context("failed to serialize collection")
}

/// Write the collection into `dir` under a timestamped name and return the path.
///
/// Existing files are never overwritten; a name already taken gets a numeric suffix.
pub fn export_to_file(games: &[Game], dir: impl AsRef<Path>) -> Result<PathBuf> {
    let dir = dir.as_ref();
    fs::create_dir_all(dir)
        .with_context(|| format!("failed to create export directory {}", dir.display()))?;

    let serialized = export_json(games)?;
    let stamp = Utc::now().format("%Y%m%d%H%M%S%3f").to_string();
    let mut attempt = 0usize;
    let path = loop {
        let file_name = if attempt == 0 {
            format!("{EXPORT_FILE_PREFIX}-{stamp}.json")
        } else {
            format!("{EXPORT_FILE_PREFIX}-{stamp}-{attempt}.json")
        };
        let path = dir.join(file_name);
        match OpenOptions::new().write(true).create_new(true).open(&path) {
            Ok(mut file) => {
                file.write_all(serialized.as_bytes())
                    .with_context(|| format!("failed to write {}", path.display()))?;
                break path;
            }
            Err(err) if err.kind() == io::ErrorKind::AlreadyExists => attempt += 1,
            Err(err) => {
                return Err(err).with_context(|| format!("failed to create {}", path.display()))
            }
        }
    };

    info!("exported {} games to {}", games.len(), path.display());
    Ok(path)
}

/// An import element that could not be turned into a record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RejectedRecord {
    /// Position of the element in the imported array.
    pub index: usize,
    /// Why the element was skipped.
    pub reason: String,
}

/// Parsed import document split into usable drafts and rejects.
#[derive(Debug, Clone, Default)]
pub struct ImportBatch {
    /// Drafts ready to append, in document order.
    pub accepted: Vec<GameDraft>,
    /// Elements that failed to decode or validate.
    pub rejected: Vec<RejectedRecord>,
}

/// Outcome of a completed import.
#[derive(Debug, Clone, Default)]
pub struct ImportReport {
    /// Records appended to the collection, with their new ids.
    pub imported: Vec<Game>,
    /// Elements that were skipped.
    pub rejected: Vec<RejectedRecord>,
}

impl ImportReport {
    /// One-line message for the user.
    pub fn summary(&self) -> String {
        let imported = plural(self.imported.len(), "game", "games");
        if self.rejected.is_empty() {
            format!("Imported {imported}.")
        } else {
            let skipped = plural(self.rejected.len(), "invalid entry", "invalid entries");
            format!("Imported {imported}, skipped {skipped}.")
        }
    }
}

fn plural(count: usize, one: &str, many: &str) -> String {
    format!("{count} {}", if count == 1 { one } else { many })
}

impl fmt::Display for ImportReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.summary())
    }
}

/// Parse an import document without touching the store.
///
/// The root must be an array. Any `id` carried by an element is dropped.
pub fn parse_import(text: &str) -> Result<ImportBatch, TransferError> {
    let root: Value = serde_json::from_str(text).map_err(TransferError::InvalidJson)?;
    let elements = match root {
        Value::Array(elements) => elements,
        other => {
            return Err(TransferError::NotASequence {
                found: json_type(&other),
            })
        }
    };

    let mut batch = ImportBatch::default();
    for (index, element) in elements.into_iter().enumerate() {
        let draft = match serde_json::from_value::<GameDraft>(element) {
            Ok(draft) => draft,
            Err(err) => {
                batch.rejected.push(RejectedRecord {
                    index,
                    reason: err.to_string(),
                });
                continue;
            }
        };
        match draft.validate() {
            Ok(()) => batch.accepted.push(draft),
            Err(errors) => batch.rejected.push(RejectedRecord {
                index,
                reason: errors.to_string(),
            }),
        }
    }
    Ok(batch)
}

/// Parse `text` and append every valid element with a fresh id.
///
/// Invalid JSON or a non-array root leaves the collection untouched.
pub fn import_json<S, G>(
    store: &mut GameStore<S, G>,
    text: &str,
) -> Result<ImportReport, TransferError>
where
    S: SlotStorage,
    G: IdGenerator,
{
    let batch = parse_import(text)?;
    for rejected in &batch.rejected {
        warn!("skipping import entry {}: {}", rejected.index, rejected.reason);
    }

    let imported = store.add_many(batch.accepted)?;
    info!(
        "imported {} games ({} rejected)",
        imported.len(),
        batch.rejected.len()
    );
    Ok(ImportReport {
        imported,
        rejected: batch.rejected,
    })
}

/// Read an import file from disk and apply it to `store`.
pub async fn import_file<S, G>(
    store: &mut GameStore<S, G>,
    path: impl AsRef<Path>,
) -> Result<ImportReport, TransferError>
where
    S: SlotStorage,
    G: IdGenerator,
{
    let text = files::read_text(path).await.map_err(TransferError::Read)?;
    import_json(store, &text)
}

fn json_type(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{MemorySlots, COLLECTION_SLOT};
    use serde_json::json;
    use tempfile::tempdir;

    fn draft(name: &str) -> GameDraft {
        GameDraft {
            name: name.into(),
            category: "Action".into(),
            year: "1991".into(),
            producer: "Studio".into(),
            image: "data:image/png;base64,AAAA".into(),
        }
    }

    #[test]
    fn export_then_import_preserves_fields() -> Result<()> {
        let mut source = GameStore::load(MemorySlots::new())?;
        source.add(draft("Zelda"))?;
        source.add(draft("Tetris"))?;
        let exported = export_json(source.get_all())?;

        let mut target = GameStore::load(MemorySlots::new())?;
        let report = import_json(&mut target, &exported)?;

        assert_eq!(report.imported.len(), 2);
        assert!(report.rejected.is_empty());
        let drafts = |games: &[Game]| games.iter().map(Game::draft).collect::<Vec<_>>();
        assert_eq!(drafts(target.get_all()), drafts(source.get_all()));
        Ok(())
    }

    #[test]
    fn imported_ids_are_regenerated() -> Result<()> {
        let document = json!([{
            "id": "keep-me",
            "name": "Zelda",
            "category": "Action",
            "year": "1986",
            "producer": "Nintendo",
            "image": "zelda.png"
        }]);
        let mut store = GameStore::load(MemorySlots::new())?;
        import_json(&mut store, &document.to_string())?;

        assert_eq!(store.len(), 1);
        assert_ne!(store.get_all()[0].id, "keep-me");
        assert!(!store.get_all()[0].id.is_empty());
        Ok(())
    }

    #[test]
    fn object_root_is_rejected() -> Result<()> {
        let mut store = GameStore::load(MemorySlots::new())?;
        store.add(draft("Zelda"))?;
        let before = store.get_all().to_vec();

        let result = import_json(&mut store, r#"{"name": "Zelda"}"#);
        assert!(matches!(
            result,
            Err(TransferError::NotASequence { found: "an object" })
        ));
        assert_eq!(store.get_all(), before.as_slice());
        Ok(())
    }

    #[test]
    fn invalid_json_is_rejected() -> Result<()> {
        let mut store = GameStore::load(MemorySlots::new())?;
        let result = import_json(&mut store, "[{");
        assert!(matches!(result, Err(TransferError::InvalidJson(_))));
        assert!(store.is_empty());
        assert_eq!(store.storage().get(COLLECTION_SLOT)?, None);
        Ok(())
    }

    #[test]
    fn invalid_entries_are_reported_not_imported() -> Result<()> {
        let document = json!([
            {"name": "Zelda", "category": "Action", "year": "1986", "producer": "Nintendo", "image": "z.png"},
            {"name": "No year", "category": "Action", "producer": "Nintendo", "image": "n.png"},
            {"name": "Bad year", "category": "Action", "year": "86", "producer": "Nintendo", "image": "b.png"},
            "not an object"
        ]);
        let mut store = GameStore::load(MemorySlots::new())?;
        let report = import_json(&mut store, &document.to_string())?;

        assert_eq!(report.imported.len(), 1);
        assert_eq!(
            report.rejected.iter().map(|entry| entry.index).collect::<Vec<_>>(),
            vec![1, 2, 3]
        );
        assert_eq!(report.summary(), "Imported 1 game, skipped 3 invalid entries.");
        assert_eq!(store.len(), 1);
        Ok(())
    }

    #[test]
    fn empty_array_imports_nothing() -> Result<()> {
        let mut store = GameStore::load(MemorySlots::new())?;
        let report = import_json(&mut store, "[]")?;
        assert!(report.imported.is_empty());
        assert_eq!(report.summary(), "Imported 0 games.");
        Ok(())
    }

    #[test]
    fn summary_matches_counts() {
        let game = Game::from_draft("a", draft("Zelda"));
        let skipped = RejectedRecord {
            index: 1,
            reason: "name is required".into(),
        };
        let report = ImportReport {
            imported: vec![game.clone()],
            rejected: Vec::new(),
        };
        assert_eq!(report.summary(), "Imported 1 game.");

        let report = ImportReport {
            imported: vec![game.clone(), game],
            rejected: vec![skipped],
        };
        assert_eq!(report.summary(), "Imported 2 games, skipped 1 invalid entry.");
    }

    #[test]
    fn export_writes_timestamped_file() -> Result<()> {
        let dir = tempdir()?;
        let games = vec![Game::from_draft("a", draft("Zelda"))];
        let path = export_to_file(&games, dir.path())?;

        let name = path
            .file_name()
            .and_then(|name| name.to_str())
            .unwrap_or_default();
        assert!(name.starts_with(EXPORT_FILE_PREFIX));
        assert!(name.ends_with(".json"));
        let written: Vec<Game> = serde_json::from_str(&fs::read_to_string(&path)?)?;
        assert_eq!(written, games);
        Ok(())
    }

    #[test]
    fn repeated_exports_never_overwrite() -> Result<()> {
        let dir = tempdir()?;
        let first = export_to_file(&[Game::from_draft("a", draft("Zelda"))], dir.path())?;
        let second = export_to_file(&[Game::from_draft("b", draft("Tetris"))], dir.path())?;
        let third = export_to_file(&[], dir.path())?;

        assert_ne!(first, second);
        assert_ne!(second, third);
        assert_ne!(first, third);
        let first_games: Vec<Game> = serde_json::from_str(&fs::read_to_string(&first)?)?;
        let second_games: Vec<Game> = serde_json::from_str(&fs::read_to_string(&second)?)?;
        assert_eq!(first_games[0].name, "Zelda");
        assert_eq!(second_games[0].name, "Tetris");
        assert_eq!(fs::read_dir(dir.path())?.count(), 3);
        Ok(())
    }

    #[tokio::test]
    async fn import_file_reads_from_disk() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("collection.json");
        fs::write(&path, export_json(&[Game::from_draft("x", draft("Doom"))])?)?;

        let mut store = GameStore::load(MemorySlots::new())?;
        let report = import_file(&mut store, &path).await?;
        assert_eq!(report.imported[0].name, "Doom");

        let missing = import_file(&mut store, dir.path().join("missing.json")).await;
        assert!(matches!(missing, Err(TransferError::Read(_))));
        Ok(())
    }
}
