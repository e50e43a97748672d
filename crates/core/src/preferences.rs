//! Presentation preferences stored next to the collection.

use anyhow::Result;

use crate::storage::{SlotStorage, DARK_MODE_SLOT};

/// Dark mode flag persisted as `"true"`/`"false"` in its own slot.
pub struct Preferences<S> {
    storage: S,
    dark_mode: bool,
}

impl<S: SlotStorage> Preferences<S> {
    /// Read the stored flag; anything other than `"true"` means light mode.
    pub fn load(storage: S) -> Result<Self> {
        let dark_mode = storage.get(DARK_MODE_SLOT)?.as_deref() == Some("true");
        Ok(Self { storage, dark_mode })
    }

    /// Whether the dark palette is selected.
    pub fn dark_mode(&self) -> bool {
        self.dark_mode
    }

    /// Persist a new value for the flag.
    pub fn set_dark_mode(&mut self, enabled: bool) -> Result<()> {
        self.storage
            .set(DARK_MODE_SLOT, if enabled { "true" } else { "false" })?;
        self.dark_mode = enabled;
        Ok(())
    }

    /// Flip the flag and return the new value.
    pub fn toggle(&mut self) -> Result<bool> {
        self.set_dark_mode(!self.dark_mode)?;
        Ok(self.dark_mode)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::MemorySlots;

    #[test]
    fn defaults_to_light_mode() -> Result<()> {
        let prefs = Preferences::load(MemorySlots::new())?;
        assert!(!prefs.dark_mode());

        let prefs = Preferences::load(MemorySlots::new().with_value(DARK_MODE_SLOT, "yes"))?;
        assert!(!prefs.dark_mode());
        Ok(())
    }

    #[test]
    fn toggle_persists() -> Result<()> {
        let slots = MemorySlots::new();
        let mut prefs = Preferences::load(&slots)?;
        assert!(prefs.toggle()?);
        assert_eq!(slots.get(DARK_MODE_SLOT)?.as_deref(), Some("true"));

        let reloaded = Preferences::load(&slots)?;
        assert!(reloaded.dark_mode());
        Ok(())
    }
}
