//! Error types for sequence building and step execution.

use thiserror::Error;

use muster::{Player, SnapshotError};

use crate::resolver::ReturnFire;
use crate::step::StepName;

/// Internal invariant violations. Building the round is aborted.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SequenceError {
    /// The return fire pair is not one the rules can produce.
    #[error(
        "impossible return fire: {vs_attacking} against attacking subs, {vs_defending} against defending subs"
    )]
    ImpossibleReturnFire {
        /// Return fire against the attacker's subs.
        vs_attacking: ReturnFire,
        /// Return fire against the defender's subs.
        vs_defending: ReturnFire,
    },

    /// The same phase was requested twice in one round.
    #[error("step '{0}' requested twice")]
    DuplicateStep(StepName),

    /// The snapshot breaks its own invariants.
    #[error("invalid battle snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
}

/// Failures reported by the battle-actions collaborator.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ActionError {
    /// A remote player stopped responding.
    #[error("lost contact with {player}")]
    CommunicationLost {
        /// The unreachable player.
        player: Player,
    },

    /// The collaborator refused the action.
    #[error("action rejected: {0}")]
    Rejected(String),
}

/// Errors from running an [`ExecutionStack`](crate::execution::ExecutionStack).
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecutionError {
    /// A step failed; the stack resumes at that step on the next run.
    #[error("step '{step}' interrupted")]
    Interrupted {
        /// The step that did not complete.
        step: StepName,
        /// What went wrong.
        #[source]
        source: ActionError,
    },

    /// Re-validating a step required rebuilding the round, which failed.
    #[error(transparent)]
    Sequence(#[from] SequenceError),
}

/// Result type for sequence building.
pub type Result<T, E = SequenceError> = std::result::Result<T, E>;
