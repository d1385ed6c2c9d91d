//! # Battlestep Core
//!
//! Combat step resolution engine.
//!
//! Given a snapshot of one battle round and the rules in force, this crate
//! decides which phases the round consists of and in what order: who sneak
//! attacks with submarines, who gets return fire, and who may retreat.
//!
//! ## Architecture
//!
//! - **Resolvers**: [`ReturnFireResolver`] and [`RetreatResolver`] derive
//!   per-round facts from a [`BattleContext`]
//! - **Builder**: [`build_sequence`] and [`StepSequenceBuilder`] emit the
//!   ordered [`StepName`] list
//! - **Execution**: [`ExecutionStack`] runs the phases one [`AtomicStep`] at a
//!   time through a [`BattleActions`] collaborator, resuming after failures
//!
//! The engine is single-threaded and pure apart from [`BattleActions::perform`].
//!
//! ## Usage
//!
//! ```
//! use battlestep_core::{BattleContext, RetreatRoutes, StepName, StepSequenceBuilder};
//! use muster::{BattleSnapshot, Capabilities, Player, RulesetToggles, Terrain, Unit, UnitId};
//!
//! let sub = Unit::new(UnitId::new(1), "submarine").with_capabilities(
//!     Capabilities::SEA | Capabilities::CAN_EVADE | Capabilities::FIRST_STRIKE_OFFENSE,
//! );
//! let cruiser = Unit::new(UnitId::new(2), "cruiser").with_capabilities(Capabilities::SEA);
//! let snapshot = BattleSnapshot::new(Player::new("Germans"), Player::new("British"), Terrain::Water)
//!     .with_attacking(vec![sub])
//!     .with_defending(vec![cruiser]);
//! let rules = RulesetToggles::classic();
//!
//! let ctx = BattleContext::new(&snapshot, &rules).with_routes(RetreatRoutes::none());
//! let plan = StepSequenceBuilder::new().plan(&ctx)?;
//!
//! assert_eq!(plan.steps[2], StepName::RemoveSneakAttackCasualties);
//! assert_eq!(plan.steps.last(), Some(&StepName::RemoveCasualties));
//! # Ok::<(), battlestep_core::SequenceError>(())
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

// Re-export muster for battle inputs
pub use muster;

pub mod error;
pub mod execution;
pub mod resolver;
pub mod sequence;
pub mod step;

#[cfg(test)]
mod tests;

// Re-exports for convenience
pub use error::{ActionError, ExecutionError, SequenceError};
pub use execution::{wrap_as_atomic_steps, AtomicStep, BattleActions, ExecutionStack, StepOutcome, StepState};
pub use resolver::{
    BattleContext, Resolver, RetreatBlock, RetreatEligibility, RetreatResolver, RetreatRoutes, ReturnFire,
    ReturnFireOutcome, ReturnFireResolver, SneakAttack, SubRetreat, WithdrawKind,
};
pub use sequence::{build_sequence, BattlePlan, StepSequenceBuilder};
pub use step::StepName;
