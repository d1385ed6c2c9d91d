//! Resumable execution of a battle round.
//!
//! The built phase list is wrapped into [`AtomicStep`]s and driven by an
//! [`ExecutionStack`], which keeps a cursor on the next unexecuted step.
//!
//! # Step lifecycle
//!
//! ```text
//! NotYetValidated ──validate──► Valid ──perform──► Executed
//!        │                        │
//!        └──────validate──────────┴──► Invalid (skipped)
//! ```
//!
//! A step is validated when the round is announced and again right before it
//! runs, because earlier phases change the units on the board. Validation
//! rebuilds the round from the current snapshot and checks the step is still in
//! it, so it never has side effects.
//!
//! # Interruption
//!
//! Each step's action is a single call to [`BattleActions::perform`]. If that
//! call fails the cursor stays on the step, and the next [`ExecutionStack::run`]
//! starts from it. Completed steps are never repeated.

use serde::{Deserialize, Serialize};
use tracing::{debug, info};

use muster::{BattleSnapshot, Player, RulesetToggles};

use crate::error::{ActionError, ExecutionError, SequenceError};
use crate::resolver::{BattleContext, RetreatRoutes};
use crate::sequence::{BattlePlan, StepSequenceBuilder};
use crate::step::StepName;

/// The battle-actions collaborator.
///
/// It owns the live game state: it reports the current snapshot and carries
/// out each phase. The engine only decides whether and when a phase runs.
pub trait BattleActions {
    /// The battle as it stands now.
    fn snapshot(&self) -> &BattleSnapshot;

    /// The rules in force.
    fn toggles(&self) -> &RulesetToggles;

    /// Retreat routes as the territory graph reports them now.
    fn routes(&self) -> RetreatRoutes;

    /// Carries out one phase as a single transaction.
    ///
    /// # Errors
    ///
    /// Returns [`ActionError`] if the phase could not be applied. The phase
    /// must then have had no effect.
    fn perform(&mut self, step: &StepName) -> Result<(), ActionError>;
}

/// Validation and execution state of an [`AtomicStep`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum StepState {
    /// Not checked yet.
    #[default]
    NotYetValidated,
    /// Checked and still part of the round.
    Valid,
    /// Completed.
    Executed,
    /// No longer part of the round; skipped.
    Invalid,
}

/// One phase wrapped for resumable execution.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AtomicStep {
    name: StepName,
    state: StepState,
}

impl AtomicStep {
    /// Wraps a phase name.
    #[must_use]
    pub fn new(name: StepName) -> Self {
        Self {
            name,
            state: StepState::NotYetValidated,
        }
    }

    /// The phase name.
    #[must_use]
    pub fn name(&self) -> &StepName {
        &self.name
    }

    /// The current state.
    #[must_use]
    pub const fn state(&self) -> StepState {
        self.state
    }

    /// True if the step is still part of `plan`.
    #[must_use]
    pub fn is_valid_in(&self, plan: &BattlePlan) -> bool {
        plan.contains(&self.name)
    }

    /// Re-checks the step against `plan`. Executed steps stay executed.
    pub fn validate(&mut self, plan: &BattlePlan) -> bool {
        if self.state == StepState::Executed {
            return false;
        }
        let valid = self.is_valid_in(plan);
        self.state = if valid { StepState::Valid } else { StepState::Invalid };
        valid
    }
}

/// Wraps an ordered phase list.
#[must_use]
pub fn wrap_as_atomic_steps(names: impl IntoIterator<Item = StepName>) -> Vec<AtomicStep> {
    names.into_iter().map(AtomicStep::new).collect()
}

/// What [`ExecutionStack::step_once`] did.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StepOutcome {
    /// The step ran.
    Executed(StepName),
    /// The step was no longer valid and was skipped.
    Skipped(StepName),
}

/// Ordered steps plus a cursor on the next one to run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionStack {
    steps: Vec<AtomicStep>,
    cursor: usize,
}

impl ExecutionStack {
    /// Creates a stack positioned on the first step.
    #[must_use]
    pub fn new(steps: Vec<AtomicStep>) -> Self {
        Self { steps, cursor: 0 }
    }

    /// Creates a stack from phase names.
    #[must_use]
    pub fn from_names(names: impl IntoIterator<Item = StepName>) -> Self {
        Self::new(wrap_as_atomic_steps(names))
    }

    /// Builds the round for the current state of `actions`.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError`] if the round cannot be built.
    pub fn plan_round<A: BattleActions + ?Sized>(actions: &A) -> Result<Self, SequenceError> {
        let plan = current_plan(actions)?;
        Ok(Self::from_names(plan.steps))
    }

    /// All steps, executed ones included.
    #[must_use]
    pub fn steps(&self) -> &[AtomicStep] {
        &self.steps
    }

    /// Index of the next step to run.
    #[must_use]
    pub const fn cursor(&self) -> usize {
        self.cursor
    }

    /// Steps not yet run or skipped.
    #[must_use]
    pub fn remaining(&self) -> &[AtomicStep] {
        &self.steps[self.cursor.min(self.steps.len())..]
    }

    /// True once every step has run or been skipped.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.cursor >= self.steps.len()
    }

    /// First validation: marks remaining steps and returns the ones to show.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError`] if the round cannot be rebuilt.
    pub fn announce<A: BattleActions + ?Sized>(
        &mut self,
        actions: &A,
    ) -> Result<Vec<StepName>, SequenceError> {
        let plan = current_plan(actions)?;
        let start = self.cursor.min(self.steps.len());
        let announced = self.steps[start..]
            .iter_mut()
            .filter_map(|step| step.validate(&plan).then(|| step.name.clone()))
            .collect();
        Ok(announced)
    }

    /// Re-validates and runs the step under the cursor.
    ///
    /// Returns `Ok(None)` when the stack is finished.
    ///
    /// # Errors
    ///
    /// Returns [`ExecutionError::Interrupted`] if the collaborator fails; the
    /// cursor is left on the failed step.
    pub fn step_once<A: BattleActions + ?Sized>(
        &mut self,
        actions: &mut A,
    ) -> Result<Option<StepOutcome>, ExecutionError> {
        let Some(step) = self.steps.get(self.cursor) else {
            return Ok(None);
        };
        if step.state == StepState::Executed {
            self.cursor += 1;
            return Ok(Some(StepOutcome::Skipped(step.name.clone())));
        }

        let plan = current_plan(&*actions)?;
        let index = self.cursor;
        let step = &mut self.steps[index];
        if !step.validate(&plan) {
            debug!(step = %step.name, "skipping step no longer valid");
            self.cursor += 1;
            return Ok(Some(StepOutcome::Skipped(step.name.clone())));
        }

        if let Err(source) = actions.perform(&step.name) {
            info!(
                step = %step.name,
                player = step.name.player().map_or("", Player::name),
                error = %source,
                "battle round interrupted"
            );
            return Err(ExecutionError::Interrupted {
                step: step.name.clone(),
                source,
            });
        }
        step.state = StepState::Executed;
        debug!(step = %step.name, "executed step");
        self.cursor += 1;
        Ok(Some(StepOutcome::Executed(step.name.clone())))
    }

    /// Runs steps until the stack is finished, returning those executed.
    ///
    /// # Errors
    ///
    /// Stops at the first failure; calling `run` again resumes there.
    pub fn run<A: BattleActions + ?Sized>(
        &mut self,
        actions: &mut A,
    ) -> Result<Vec<StepName>, ExecutionError> {
        let mut executed = Vec::new();
        while let Some(outcome) = self.step_once(actions)? {
            if let StepOutcome::Executed(name) = outcome {
                executed.push(name);
            }
        }
        info!(executed = executed.len(), "battle round complete");
        Ok(executed)
    }
}

fn current_plan<A: BattleActions + ?Sized>(actions: &A) -> Result<BattlePlan, SequenceError> {
    let ctx = BattleContext::new(actions.snapshot(), actions.toggles()).with_routes(actions.routes());
    StepSequenceBuilder::new().plan(&ctx)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tests::helpers::{infantry, land_battle, RecordingActions};

    fn plain_round() -> RecordingActions {
        RecordingActions::new(land_battle(vec![infantry(1)], vec![infantry(2)]))
    }

    mod atomic_step_tests {
        use super::*;

        #[test]
        fn wrap_preserves_order_and_state() {
            let steps = wrap_as_atomic_steps([StepName::NavalBombardment, StepName::RemoveCasualties]);
            assert_eq!(steps.len(), 2);
            assert_eq!(steps[1].name(), &StepName::RemoveCasualties);
            assert!(steps.iter().all(|s| s.state() == StepState::NotYetValidated));
        }

        #[test]
        fn validate_marks_state() {
            let actions = plain_round();
            let plan = current_plan(&actions).unwrap();
            let mut present = AtomicStep::new(StepName::RemoveCasualties);
            let mut absent = AtomicStep::new(StepName::NavalBombardment);
            assert!(present.validate(&plan));
            assert_eq!(present.state(), StepState::Valid);
            assert!(!absent.validate(&plan));
            assert_eq!(absent.state(), StepState::Invalid);
        }
    }

    mod stack_tests {
        use super::*;

        #[test]
        fn runs_every_step_in_order() {
            let mut actions = plain_round();
            let mut stack = ExecutionStack::plan_round(&actions).unwrap();
            let expected: Vec<StepName> = stack.steps().iter().map(|s| s.name().clone()).collect();

            let executed = stack.run(&mut actions).unwrap();
            assert_eq!(executed, expected);
            assert_eq!(actions.performed, expected);
            assert!(stack.is_finished());
            assert!(stack.remaining().is_empty());
        }

        #[test]
        fn finished_stack_is_a_no_op() {
            let mut actions = plain_round();
            let mut stack = ExecutionStack::plan_round(&actions).unwrap();
            stack.run(&mut actions).unwrap();
            assert_eq!(stack.run(&mut actions).unwrap(), Vec::<StepName>::new());
            assert_eq!(stack.step_once(&mut actions).unwrap(), None);
        }

        #[test]
        fn announce_drops_stale_steps() {
            let actions = plain_round();
            let mut stack = ExecutionStack::from_names([
                StepName::NavalBombardment,
                StepName::RemoveCasualties,
            ]);
            let shown = stack.announce(&actions).unwrap();
            assert_eq!(shown, vec![StepName::RemoveCasualties]);
            assert_eq!(stack.steps()[0].state(), StepState::Invalid);
        }

        #[test]
        fn invalid_step_is_skipped_not_performed() {
            let mut actions = plain_round();
            let mut stack = ExecutionStack::from_names([
                StepName::NavalBombardment,
                StepName::RemoveCasualties,
            ]);
            let first = stack.step_once(&mut actions).unwrap();
            assert_eq!(first, Some(StepOutcome::Skipped(StepName::NavalBombardment)));
            assert!(actions.performed.is_empty());
        }

        #[test]
        fn interrupted_step_resumes_in_place() {
            let mut actions = plain_round();
            let mut stack = ExecutionStack::plan_round(&actions).unwrap();
            let total = stack.steps().len();
            actions.fail_on = Some(2);

            let err = stack.run(&mut actions).unwrap_err();
            let ExecutionError::Interrupted { step, .. } = err else {
                panic!("expected interruption, got {err:?}");
            };
            assert_eq!(stack.cursor(), 2);
            assert_eq!(&step, stack.remaining()[0].name());
            assert_eq!(actions.performed.len(), 2);

            actions.fail_on = None;
            let resumed = stack.run(&mut actions).unwrap();
            assert_eq!(resumed.len(), total - 2);
            assert_eq!(actions.performed.len(), total);
        }
    }
}
