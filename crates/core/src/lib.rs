#![warn(clippy::all, missing_docs)]

//! Core collection logic for GameShelf.
//!
//! Game records and their validation live here, together with the store
//! that mirrors the collection into named slots. Filtering, JSON transfer
//! files and settings sit on top of that store; `gameshelf-tui` is a thin
//! shell around these pieces.

pub mod config;
pub mod error;
pub mod files;
pub mod ids;
pub mod models;
pub mod preferences;
pub mod query;
pub mod storage;
pub mod store;
pub mod transfer;

pub use config::AppConfig;
pub use error::{StoreError, TransferError};
pub use ids::{IdGenerator, UuidGenerator};
pub use models::{Field, Game, GameDraft, ValidationErrors};
pub use preferences::Preferences;
pub use query::GameFilter;
pub use storage::{FileSlots, MemorySlots, SlotStorage};
pub use store::GameStore;
pub use transfer::{ImportReport, RejectedRecord};
