//! Resolvers derive per-round facts the step sequence depends on.
//!
//! Each resolver is a pure function of a [`BattleContext`]: the snapshot, the
//! rules and the retreat routes reported by the territory graph. Nothing is
//! cached between calls, so results are recomputed fresh every round.
//!
//! # Invariants
//!
//! - Resolvers MUST NOT read ambient state; everything comes through the context
//! - Resolvers MUST be deterministic given the same context
//! - An impossible result is a [`SequenceError`], never a silent fallback
//!
//! # Available Resolvers
//!
//! - [`ReturnFireResolver`]: sneak-attack return fire per side
//! - [`RetreatResolver`]: retreat eligibility per side

mod retreat;
mod return_fire;

pub use retreat::{RetreatBlock, RetreatEligibility, RetreatResolver, RetreatRoutes, SubRetreat, WithdrawKind};
pub use return_fire::{ReturnFire, ReturnFireOutcome, ReturnFireResolver, SneakAttack};

use muster::{BattleSnapshot, RulesetToggles};

use crate::error::SequenceError;

/// Everything a resolver may look at.
#[derive(Debug, Clone, Copy)]
pub struct BattleContext<'a> {
    snapshot: &'a BattleSnapshot,
    rules: &'a RulesetToggles,
    routes: RetreatRoutes,
}

impl<'a> BattleContext<'a> {
    /// Creates a context with no retreat routes available.
    #[must_use]
    pub fn new(snapshot: &'a BattleSnapshot, rules: &'a RulesetToggles) -> Self {
        Self {
            snapshot,
            rules,
            routes: RetreatRoutes::default(),
        }
    }

    /// Sets the retreat routes reported by the territory graph.
    #[must_use]
    pub fn with_routes(mut self, routes: RetreatRoutes) -> Self {
        self.routes = routes;
        self
    }

    /// The battle snapshot.
    #[must_use]
    pub fn snapshot(&self) -> &'a BattleSnapshot {
        self.snapshot
    }

    /// The rules in force.
    #[must_use]
    pub fn rules(&self) -> &'a RulesetToggles {
        self.rules
    }

    /// The retreat routes.
    #[must_use]
    pub fn routes(&self) -> RetreatRoutes {
        self.routes
    }
}

/// A pure per-round computation over a [`BattleContext`].
///
/// # Example
///
/// ```
/// use battlestep_core::resolver::{BattleContext, Resolver};
/// use battlestep_core::SequenceError;
/// use muster::{BattleSnapshot, Player, RulesetToggles, Side, Terrain};
///
/// struct CountAttackers;
///
/// impl Resolver for CountAttackers {
///     type Outcome = usize;
///
///     fn resolve(&self, ctx: &BattleContext<'_>) -> Result<usize, SequenceError> {
///         Ok(ctx.snapshot().units(Side::Attacker).len())
///     }
/// }
///
/// let snapshot = BattleSnapshot::new(Player::new("a"), Player::new("b"), Terrain::Land);
/// let rules = RulesetToggles::classic();
/// let count = CountAttackers.resolve(&BattleContext::new(&snapshot, &rules))?;
/// assert_eq!(count, 0);
/// # Ok::<(), SequenceError>(())
/// ```
pub trait Resolver: Send + Sync {
    /// What the resolver produces.
    type Outcome;

    /// Computes the outcome for one round.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError`] when the inputs lead to an impossible result.
    fn resolve(&self, ctx: &BattleContext<'_>) -> Result<Self::Outcome, SequenceError>;
}
