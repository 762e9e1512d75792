//! Migration run reporting
//!
//! Per-record outcomes roll up into per-stage counters, and per-stage
//! results roll up into the run report the pipeline hands back. The pipeline
//! itself never fails; callers read the report to decide what a failed stage
//! means for them.

use std::collections::BTreeMap;
use std::time::Duration;

use serde::Serialize;
use thiserror::Error;

use crate::registry::EntityKind;

/// Outcome of one source record passing through a stage
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordOutcome {
    /// A new entity row was written and its mapping registered
    Created,
    /// Entity already present under its natural key; mapping registered
    Existing,
    /// Record intentionally left behind
    Skipped(SkipReason),
    /// The store rejected the create; the stage carried on
    Failed,
}

/// Why a record was intentionally not migrated
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum SkipReason {
    /// Sentinel placeholder record from the legacy system
    #[error("placeholder name")]
    PlaceholderName,
    /// Record carries no usable natural key
    #[error("missing natural key")]
    MissingNaturalKey,
    /// Account is excluded from migration by policy
    #[error("excluded account")]
    ExcludedAccount,
    /// A required reference could not be resolved
    #[error("unresolved {0} reference")]
    UnresolvedReference(EntityKind),
}

/// Per-stage outcome counters
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct StageCounts {
    pub created: u64,
    pub existing: u64,
    pub skipped: u64,
    pub failed: u64,
}

impl StageCounts {
    /// Tally one record outcome
    pub fn record(&mut self, outcome: &RecordOutcome) {
        match outcome {
            RecordOutcome::Created => self.created += 1,
            RecordOutcome::Existing => self.existing += 1,
            RecordOutcome::Skipped(_) => self.skipped += 1,
            RecordOutcome::Failed => self.failed += 1,
        }
    }

    pub fn total(&self) -> u64 {
        self.created + self.existing + self.skipped + self.failed
    }
}

/// Result of one stage
#[derive(Debug, Clone, Serialize)]
pub struct StageReport {
    /// Stage name as logged
    pub stage: &'static str,
    /// False when the stage aborted on a store error
    pub ok: bool,
    pub counts: StageCounts,
    /// The aborting error, when `ok` is false
    pub error: Option<String>,
    pub elapsed: Duration,
}

/// Result of a whole pipeline run
#[derive(Debug, Serialize)]
pub struct RunReport {
    pub stages: Vec<StageReport>,
    pub elapsed: Duration,
    /// True when the run stopped early on a cancellation request
    pub cancelled: bool,
    /// Registry population at the end of the run
    pub mapping_counts: BTreeMap<EntityKind, usize>,
}

impl RunReport {
    /// Names of stages that aborted
    pub fn failed_stages(&self) -> Vec<&'static str> {
        self.stages
            .iter()
            .filter(|s| !s.ok)
            .map(|s| s.stage)
            .collect()
    }

    /// True when every executed stage completed
    pub fn all_ok(&self) -> bool {
        self.stages.iter().all(|s| s.ok)
    }

    /// Entities written across all stages
    pub fn total_created(&self) -> u64 {
        self.stages.iter().map(|s| s.counts.created).sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn counts_tally_each_outcome() {
        let mut counts = StageCounts::default();
        counts.record(&RecordOutcome::Created);
        counts.record(&RecordOutcome::Created);
        counts.record(&RecordOutcome::Existing);
        counts.record(&RecordOutcome::Skipped(SkipReason::MissingNaturalKey));
        counts.record(&RecordOutcome::Failed);

        assert_eq!(counts.created, 2);
        assert_eq!(counts.existing, 1);
        assert_eq!(counts.skipped, 1);
        assert_eq!(counts.failed, 1);
        assert_eq!(counts.total(), 5);
    }

    #[test]
    fn skip_reasons_render_for_logs() {
        let reason = SkipReason::UnresolvedReference(EntityKind::Team);
        assert_eq!(reason.to_string(), "unresolved team reference");
        assert_eq!(SkipReason::PlaceholderName.to_string(), "placeholder name");
    }

    #[test]
    fn run_report_collects_failed_stage_names() {
        let report = RunReport {
            stages: vec![
                StageReport {
                    stage: "users",
                    ok: true,
                    counts: StageCounts::default(),
                    error: None,
                    elapsed: Duration::from_millis(5),
                },
                StageReport {
                    stage: "teams",
                    ok: false,
                    counts: StageCounts::default(),
                    error: Some("database is locked".to_string()),
                    elapsed: Duration::from_millis(2),
                },
            ],
            elapsed: Duration::from_millis(7),
            cancelled: false,
            mapping_counts: BTreeMap::new(),
        };

        assert!(!report.all_ok());
        assert_eq!(report.failed_stages(), vec!["teams"]);
    }
}
