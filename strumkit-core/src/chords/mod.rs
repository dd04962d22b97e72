//! Chord data: reading chord files and the searchable library.

pub mod ingest;
pub mod library;

pub use ingest::{parse_chord_json, IngestError, IngestReport};
pub use library::{merge_groups, ChordLibrary};
