//! Corpus engine: the facade over the two store backends.
//!
//! Routes every operation to the file store or the relational store based
//! on the persisted mode flag, mirrors file-store writes into the relational
//! store best-effort, maintains the per-group listing cache, runs the bulk
//! importer, and publishes change events.

pub mod cache;
pub mod error;
pub mod facade;
pub mod import;
pub mod settings;
pub mod sync;

pub use cache::{ListingCache, RegenOutcome};
pub use error::EngineError;
pub use facade::ContentEngine;
pub use import::{Importer, ImportStats};
pub use settings::{JsonFileSettings, MemorySettings, Settings};
pub use sync::{MirrorContent, SyncOutcome, Synchronizer};
