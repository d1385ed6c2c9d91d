//! Retreat eligibility resolver.
//!
//! Computes, per side, whether units may leave the battle after casualties
//! are removed this round.
//!
//! # Attacker general retreat
//!
//! Checked in order, the first match blocks the retreat:
//!
//! 1. The attack is amphibious ([`RetreatBlock::AmphibiousLock`])
//! 2. Transport casualties are restricted and only unarmed transports defend
//!    ([`RetreatBlock::DefenselessTransports`])
//! 3. No retreat territory is available ([`RetreatBlock::NoRetreatTerritory`])
//!
//! Aircraft at sea, non-amphibious land units (partial amphibious retreat) and
//! planes in an amphibious assault can still withdraw when the general retreat
//! is blocked; see [`RetreatEligibility::attacker_withdraw`].
//!
//! # Submarine retreat
//!
//! Submersible subs always submerge. Otherwise subs withdraw along the general
//! path, vetoed by any opposing destroyer, including one waiting to die.

use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::trace;

use muster::{BattleSnapshot, Capabilities, RulesetToggles, Side, Unit, UnitSliceExt};

use super::{BattleContext, Resolver};
use crate::error::SequenceError;

/// Retreat routes reported by the territory graph.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetreatRoutes {
    /// The attacker has at least one legal territory to retreat into.
    pub attacker_has_retreat_territory: bool,
    /// The defender has an empty or friendly adjacent sea zone.
    pub defender_has_sea_exit: bool,
}

impl RetreatRoutes {
    /// No routes on either side.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            attacker_has_retreat_territory: false,
            defender_has_sea_exit: false,
        }
    }

    /// Routes open on both sides.
    #[must_use]
    pub const fn open() -> Self {
        Self {
            attacker_has_retreat_territory: true,
            defender_has_sea_exit: true,
        }
    }
}

/// Why the attacker's general retreat is blocked.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RetreatBlock {
    /// Units that landed amphibiously are committed.
    AmphibiousLock,
    /// Only unarmed transports defend, so the attacker must press on.
    DefenselessTransports,
    /// No legal territory to retreat into.
    NoRetreatTerritory,
}

impl fmt::Display for RetreatBlock {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AmphibiousLock => f.write_str("amphibious assault cannot retreat"),
            Self::DefenselessTransports => f.write_str("only defenseless transports remain"),
            Self::NoRetreatTerritory => f.write_str("no retreat territory available"),
        }
    }
}

/// Which units an attacker withdrawal covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WithdrawKind {
    /// All attacking units, or stranded aircraft at sea.
    General,
    /// Land units that did not arrive amphibiously.
    PartialAmphibious,
    /// Aircraft in an amphibious assault.
    Planes,
}

/// How a side's submarine-like units may leave the battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SubRetreat {
    /// They must stay.
    Unavailable,
    /// They submerge in place.
    Submerge,
    /// They withdraw to another territory.
    Withdraw,
}

impl SubRetreat {
    /// True unless unavailable.
    #[must_use]
    pub const fn is_available(self) -> bool {
        !matches!(self, Self::Unavailable)
    }
}

/// Result of [`RetreatResolver`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RetreatEligibility {
    attacker_block: Option<RetreatBlock>,
    partial_amphibious: bool,
    stranded_air: bool,
    planes: bool,
    attacker_subs: SubRetreat,
    defender_subs: SubRetreat,
}

impl RetreatEligibility {
    /// Eligibility where nothing may retreat.
    #[must_use]
    pub const fn none() -> Self {
        Self {
            attacker_block: Some(RetreatBlock::NoRetreatTerritory),
            partial_amphibious: false,
            stranded_air: false,
            planes: false,
            attacker_subs: SubRetreat::Unavailable,
            defender_subs: SubRetreat::Unavailable,
        }
    }

    /// Whether `side` may withdraw anything this round.
    ///
    /// The attacker withdraws through the general path or one of the derived
    /// paths; the defender only ever withdraws submarines.
    #[must_use]
    pub fn can_retreat(&self, side: Side) -> bool {
        match side {
            Side::Attacker => self.attacker_withdraw().is_some(),
            Side::Defender => self.defender_subs.is_available(),
        }
    }

    /// Why the attacker's general retreat is blocked, if it is.
    #[must_use]
    pub const fn attacker_block(&self) -> Option<RetreatBlock> {
        self.attacker_block
    }

    /// True if the attacker's general retreat is open.
    #[must_use]
    pub const fn can_attacker_retreat(&self) -> bool {
        self.attacker_block.is_none()
    }

    /// Non-amphibious land units may retreat from an amphibious assault.
    #[must_use]
    pub const fn can_retreat_partial_amphibious(&self) -> bool {
        self.partial_amphibious
    }

    /// Attacking aircraft at sea may retreat.
    #[must_use]
    pub const fn can_retreat_stranded_air(&self) -> bool {
        self.stranded_air
    }

    /// Attacking aircraft may retreat from an amphibious assault.
    #[must_use]
    pub const fn can_retreat_planes(&self) -> bool {
        self.planes
    }

    /// How `side`'s submarines may leave.
    #[must_use]
    pub const fn subs(&self, side: Side) -> SubRetreat {
        match side {
            Side::Attacker => self.attacker_subs,
            Side::Defender => self.defender_subs,
        }
    }

    /// True if `side`'s submarines may submerge or withdraw.
    #[must_use]
    pub const fn can_retreat_subs(&self, side: Side) -> bool {
        self.subs(side).is_available()
    }

    /// The attacker withdrawal offered after casualties, if any.
    #[must_use]
    pub const fn attacker_withdraw(&self) -> Option<WithdrawKind> {
        if self.attacker_block.is_none() || self.stranded_air {
            Some(WithdrawKind::General)
        } else if self.partial_amphibious {
            Some(WithdrawKind::PartialAmphibious)
        } else if self.planes {
            Some(WithdrawKind::Planes)
        } else {
            None
        }
    }
}

/// Computes [`RetreatEligibility`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RetreatResolver;

impl RetreatResolver {
    /// Creates a new retreat resolver.
    #[must_use]
    pub const fn new() -> Self {
        Self
    }

    fn attacker_block(
        snapshot: &BattleSnapshot,
        rules: &RulesetToggles,
        routes: RetreatRoutes,
    ) -> Option<RetreatBlock> {
        let attacking = snapshot.units(Side::Attacker);
        let defending = snapshot.units(Side::Defender);

        if snapshot.is_amphibious() {
            return Some(RetreatBlock::AmphibiousLock);
        }

        let defenseless = rules.transport_casualties_restricted()
            && !defending.is_empty()
            && defending
                .iter()
                .all(|unit| unit.is_transport() && !unit.is_combat_transport());
        if defenseless {
            return Some(RetreatBlock::DefenselessTransports);
        }

        let territory = routes.attacker_has_retreat_territory
            || rules.retreating_units_remain_in_place()
            || attacking.all_with(Capabilities::AIR);
        if !territory {
            return Some(RetreatBlock::NoRetreatTerritory);
        }

        None
    }

    fn sub_retreat(
        snapshot: &BattleSnapshot,
        rules: &RulesetToggles,
        side: Side,
        route_open: bool,
    ) -> SubRetreat {
        if !snapshot.participants(side).any(Unit::can_evade) {
            SubRetreat::Unavailable
        } else if rules.submersible_subs() {
            SubRetreat::Submerge
        } else if !snapshot.has_destroyer(side.opponent()) && route_open {
            SubRetreat::Withdraw
        } else {
            SubRetreat::Unavailable
        }
    }
}

impl Resolver for RetreatResolver {
    type Outcome = RetreatEligibility;

    fn resolve(&self, ctx: &BattleContext<'_>) -> Result<Self::Outcome, SequenceError> {
        let snapshot = ctx.snapshot();
        let rules = ctx.rules();
        let routes = ctx.routes();
        let attacking = snapshot.units(Side::Attacker);
        let amphibious = snapshot.is_amphibious();

        let attacker_block = Self::attacker_block(snapshot, rules, routes);
        let partial_amphibious = amphibious
            && rules.partial_amphibious_retreat()
            && attacking
                .iter()
                .any(|unit| unit.is_land() && !unit.was_amphibious_landed());
        let stranded_air = snapshot.is_water() && attacking.any_with(Capabilities::AIR);
        let planes = amphibious
            && (rules.all_subs_fire_simultaneously()
                || rules.attacker_retreat_planes()
                || rules.partial_amphibious_retreat())
            && attacking.any_with(Capabilities::AIR);

        let eligibility = RetreatEligibility {
            attacker_block,
            partial_amphibious,
            stranded_air,
            planes,
            attacker_subs: Self::sub_retreat(snapshot, rules, Side::Attacker, attacker_block.is_none()),
            defender_subs: Self::sub_retreat(snapshot, rules, Side::Defender, routes.defender_has_sea_exit),
        };
        trace!(?eligibility, "resolved retreat eligibility");
        Ok(eligibility)
    }
}
