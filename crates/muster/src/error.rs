//! Error types for snapshot and ruleset construction.

use thiserror::Error;

use crate::unit::UnitId;

/// Errors raised while building [`RulesetToggles`](crate::ruleset::RulesetToggles).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RulesetError {
    /// Both WW2V2 and WW2V3 were enabled.
    #[error("rule editions WW2V2 and WW2V3 are mutually exclusive")]
    ConflictingEditions,
}

/// Errors raised by [`BattleSnapshot::validate`](crate::battle::BattleSnapshot::validate).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SnapshotError {
    /// A unit appears in more than one unit set of the snapshot.
    #[error("unit {unit} appears in more than one unit set")]
    DuplicateUnit {
        /// The offending unit.
        unit: UnitId,
    },
}
