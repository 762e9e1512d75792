//! Entity migration stages
//!
//! One module per legacy fixture family. Every stage walks its records
//! through the same create-or-skip sequence: find by natural key and
//! register the mapping, otherwise resolve the record's references, create
//! the row, and register the fresh mapping. Records that cannot satisfy a
//! required reference are skipped; rejected writes are counted and the stage
//! keeps going.

pub mod events;
pub mod games;
pub mod geography;
pub mod spirit;
pub mod teams;
pub mod users;

use std::future::Future;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{debug, warn};

use gamestats_common::Result;

use crate::fixtures::{FixtureDir, LegacyRecord};
use crate::registry::IdRegistry;
use crate::report::{RecordOutcome, SkipReason, StageCounts};
use crate::resolve::Resolver;

/// Shared state handed to every stage
pub struct StageContext<'a> {
    pub pool: &'a SqlitePool,
    pub registry: &'a IdRegistry,
    pub fixtures: &'a FixtureDir,
    pub cancel: &'a CancellationToken,
}

impl<'a> StageContext<'a> {
    pub fn resolver(&self) -> Resolver<'a> {
        Resolver::new(self.pool, self.registry)
    }
}

/// Drive one stage's records through its per-record handler.
///
/// Cancellation is checked between records and stops the stage without
/// touching what was already done. An `Err` from the handler is a store
/// fault and aborts the stage; every other outcome is tallied and the loop
/// continues.
pub(crate) async fn run_records<F, Fut>(
    cx: &StageContext<'_>,
    stage: &'static str,
    records: Vec<LegacyRecord>,
    mut handle: F,
) -> Result<StageCounts>
where
    F: FnMut(LegacyRecord) -> Fut,
    Fut: Future<Output = Result<RecordOutcome>>,
{
    let mut counts = StageCounts::default();

    for record in records {
        if cx.cancel.is_cancelled() {
            warn!(stage, "Cancellation requested, aborting remaining records");
            break;
        }

        let legacy_id = record.legacy_id();
        let outcome = handle(record).await?;
        if let RecordOutcome::Skipped(reason) = &outcome {
            // Placeholder records are routine in the legacy data, the rest
            // of the skips deserve attention
            match reason {
                SkipReason::PlaceholderName => {
                    debug!(stage, legacy_id, "Skipping placeholder record")
                }
                _ => warn!(stage, legacy_id, %reason, "Skipping record"),
            }
        }
        counts.record(&outcome);
    }

    Ok(counts)
}
