//! Knowledge-recall source module
//!
//! Architecture follows the project pattern (trait + impl + mock):
//! - `NoteSource` trait: async interface producing canonical notes
//! - `HttpRecallClient`: the recall HTTP API, normalized via [`crate::notes`]
//! - `MockNoteSource`: in-memory notes for tests

pub mod client;
pub mod mock;
pub mod traits;

pub use client::HttpRecallClient;
pub use mock::MockNoteSource;
pub use traits::NoteSource;
