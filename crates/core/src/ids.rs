//! Record identifier generation.

use uuid::Uuid;

/// Source of fresh record identifiers.
pub trait IdGenerator {
    /// Produce an identifier that is effectively unique for the process lifetime.
    fn generate(&self) -> String;
}

/// Random v4 UUIDs.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidGenerator;

impl IdGenerator for UuidGenerator {
    fn generate(&self) -> String {
        Uuid::new_v4().to_string()
    }
}
