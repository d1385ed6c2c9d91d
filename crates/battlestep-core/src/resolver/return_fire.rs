//! Return-fire resolver.
//!
//! Decides, for one round, how much return fire each side's submarine-like
//! units face when they strike first.
//!
//! # Rules
//!
//! A side may sneak attack only while the opponent has no destroyer. The
//! attacker always qualifies when the defender has none; the defender also needs
//! the "defending subs sneak attack" option (implied by WW2V2).
//!
//! - Opponent has a destroyer: the side faces `All` return fire
//! - Otherwise: `SubsOnly` if the opponent may sneak attack too or all subs fire
//!   simultaneously (WW2V2), else `None`
//!
//! Both values are computed in one pass so the two answers can never disagree.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::{error, trace};

use muster::{Capabilities, Side, UnitSliceExt};

use super::{BattleContext, Resolver};
use crate::error::SequenceError;

/// Return fire faced by a side's first-strike units.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ReturnFire {
    /// Every opposing unit fires back.
    All,
    /// Only opposing submarine-like units fire back.
    SubsOnly,
    /// Nothing fires back this exchange.
    None,
}

impl fmt::Display for ReturnFire {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::All => f.write_str("all"),
            Self::SubsOnly => f.write_str("subs only"),
            Self::None => f.write_str("none"),
        }
    }
}

/// Classification of a round's first-strike exchange.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SneakAttack {
    /// Both sides face full return fire.
    NoSneakAttack,
    /// The attacker strikes unanswered; the defender faces full return fire.
    AttackerUncontested,
    /// The defender strikes unanswered before anything else fires.
    DefenderUncontested,
    /// Both sides sneak attack, each answered by the other's subs.
    Contested,
}

/// Result of [`ReturnFireResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ReturnFireOutcome {
    vs_attacking_subs: ReturnFire,
    vs_defending_subs: ReturnFire,
    defender_subs_fire_first: bool,
}

impl ReturnFireOutcome {
    /// Builds an outcome from the return fire against each side.
    ///
    /// # Errors
    ///
    /// Returns [`SequenceError::ImpossibleReturnFire`] for combinations the
    /// rules can never produce: neither side answering the other, or one side
    /// answering only with subs while the other does not answer at all.
    pub fn from_pair(
        vs_attacking_subs: ReturnFire,
        vs_defending_subs: ReturnFire,
    ) -> Result<Self, SequenceError> {
        use ReturnFire::{All, SubsOnly};

        match (vs_attacking_subs, vs_defending_subs) {
            (All, _) | (_, All) | (SubsOnly, SubsOnly) => Ok(Self {
                vs_attacking_subs,
                vs_defending_subs,
                defender_subs_fire_first: vs_attacking_subs == All
                    && vs_defending_subs == ReturnFire::None,
            }),
            _ => {
                error!(
                    %vs_attacking_subs,
                    %vs_defending_subs,
                    "impossible return fire combination"
                );
                Err(SequenceError::ImpossibleReturnFire {
                    vs_attacking: vs_attacking_subs,
                    vs_defending: vs_defending_subs,
                })
            }
        }
    }

    /// Return fire faced by the attacker's submarine-like units.
    #[must_use]
    pub const fn vs_attacking_subs(&self) -> ReturnFire {
        self.vs_attacking_subs
    }

    /// Return fire faced by the defender's submarine-like units.
    #[must_use]
    pub const fn vs_defending_subs(&self) -> ReturnFire {
        self.vs_defending_subs
    }

    /// Return fire faced by `side`'s submarine-like units.
    #[must_use]
    pub const fn against(&self, side: Side) -> ReturnFire {
        match side {
            Side::Attacker => self.vs_attacking_subs,
            Side::Defender => self.vs_defending_subs,
        }
    }

    /// True when the defender's first strike precedes all other fire.
    #[must_use]
    pub const fn defender_subs_fire_first(&self) -> bool {
        self.defender_subs_fire_first
    }

    /// Classifies the exchange.
    #[must_use]
    pub fn sneak_attack(&self) -> SneakAttack {
        match (self.vs_attacking_subs, self.vs_defending_subs) {
            (ReturnFire::All, ReturnFire::All) => SneakAttack::NoSneakAttack,
            (ReturnFire::All, ReturnFire::None) => SneakAttack::DefenderUncontested,
            (ReturnFire::None, ReturnFire::All) => SneakAttack::AttackerUncontested,
            _ => SneakAttack::Contested,
        }
    }
}

/// Computes [`ReturnFireOutcome`] from live units and rules.
#[derive(Debug, Clone, Copy, Default)]
pub struct ReturnFireResolver;

impl ReturnFireResolver {
    /// Creates a new return-fire resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn versus(own_sneak: bool, other_sneak: bool, simultaneous: bool) -> ReturnFire {
        if !own_sneak {
            ReturnFire::All
        } else if other_sneak || simultaneous {
            ReturnFire::SubsOnly
        } else {
            ReturnFire::None
        }
    }
}

impl Resolver for ReturnFireResolver {
    type Outcome = ReturnFireOutcome;

    fn resolve(&self, ctx: &BattleContext<'_>) -> Result<Self::Outcome, SequenceError> {
        let snapshot = ctx.snapshot();
        let rules = ctx.rules();
        let attacker_has_destroyer = snapshot.units(Side::Attacker).any_with(Capabilities::DESTROYER);
        let defender_has_destroyer = snapshot.units(Side::Defender).any_with(Capabilities::DESTROYER);

        let attacker_sneak = !defender_has_destroyer;
        let defender_sneak = !attacker_has_destroyer && rules.defending_subs_sneak_attack();
        let simultaneous = rules.all_subs_fire_simultaneously();

        let outcome = ReturnFireOutcome::from_pair(
            Self::versus(attacker_sneak, defender_sneak, simultaneous),
            Self::versus(defender_sneak, attacker_sneak, simultaneous),
        )?;
        trace!(?outcome, "resolved return fire");
        Ok(outcome)
    }
}
