//! # GameStats Migration Engine
//!
//! Idempotent migration of legacy tournament records into the GameStats
//! entity store:
//! - Fixture decoding and normalization (datetimes, booleans, field aliases)
//! - Legacy-key to UUID identifier registry with snapshot persistence
//! - Layered reference resolution (mapped, alias table, first available)
//! - Fifteen entity stages run in foreign-key dependency order
//!
//! Every stage is safe to re-run: entities are found by natural key before
//! anything is written, and a second run over the same fixtures creates
//! nothing new.

pub mod db;
pub mod fixtures;
pub mod pipeline;
pub mod registry;
pub mod report;
pub mod resolve;
pub mod stages;

pub use fixtures::{FixtureDir, LegacyKey, LegacyRecord};
pub use pipeline::{Migrator, Stage};
pub use registry::{EntityKind, IdRegistry};
pub use report::{RecordOutcome, RunReport, SkipReason, StageCounts, StageReport};
