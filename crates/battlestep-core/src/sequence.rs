//! Step sequence builder.
//!
//! Turns a battle snapshot plus the resolver outcomes into the ordered list of
//! phases for one round. The blocks are always emitted in this order, each one
//! omitted entirely when it would be empty:
//!
//! 1. Anti-aircraft fire, attacker then defender, one triple per AA type
//! 2. First-round bombardment and paratrooper landing
//! 3. Submarine retreat before battle
//! 4. Removal of unescorted transports
//! 5. Submarines submerging in front of an all-air opponent
//! 6. First-strike (sneak attack) block
//! 7. General fire
//! 8. Casualty removal, always present exactly once
//! 9. Retreats: attacking subs, attacker withdrawal, defending subs
//!
//! # Determinism
//!
//! The builder keeps no state between calls. Given the same snapshot, rules
//! and resolver outcomes it returns the same list, which lets a host rebuild
//! the round at any point to re-validate or redisplay the remaining phases.

use std::collections::{BTreeMap, BTreeSet, HashSet};

use tracing::{debug, error};

use muster::{BattleSnapshot, Capabilities, Player, RulesetToggles, Side, Unit, UnitSliceExt};

use crate::error::{Result, SequenceError};
use crate::resolver::{
    BattleContext, Resolver, RetreatEligibility, RetreatResolver, ReturnFire, ReturnFireOutcome,
    ReturnFireResolver, SneakAttack, SubRetreat,
};
use crate::step::StepName;

// =============================================================================
// Public API
// =============================================================================

/// Builds the ordered phases of one battle round.
///
/// # Errors
///
/// Returns [`SequenceError`] when the snapshot has overlapping unit sets or a
/// phase would be emitted twice. No partial list is ever returned.
pub fn build_sequence(
    snapshot: &BattleSnapshot,
    rules: &RulesetToggles,
    return_fire: &ReturnFireOutcome,
    retreat: &RetreatEligibility,
) -> Result<Vec<StepName>> {
    snapshot.validate()?;
    let steps = RoundBuilder::new(snapshot, rules, return_fire, retreat).build()?;
    debug!(
        round = snapshot.round(),
        steps = steps.len(),
        "built battle step sequence"
    );
    Ok(steps)
}

/// A built round: the phases plus the resolver outcomes they came from.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BattlePlan {
    /// Ordered phases.
    pub steps: Vec<StepName>,
    /// Return fire used for the first-strike block.
    pub return_fire: ReturnFireOutcome,
    /// Retreat eligibility used for the retreat block.
    pub retreat: RetreatEligibility,
}

impl BattlePlan {
    /// True if `step` is part of this plan.
    #[must_use]
    pub fn contains(&self, step: &StepName) -> bool {
        self.steps.contains(step)
    }
}

/// Runs both resolvers and the builder in one call.
///
/// # Example
///
/// ```
/// use battlestep_core::{BattleContext, StepSequenceBuilder};
/// use muster::{BattleSnapshot, Capabilities, Player, RulesetToggles, Terrain, Unit, UnitId};
///
/// let infantry = |id| Unit::new(UnitId::new(id), "infantry").with_capabilities(Capabilities::LAND);
/// let snapshot = BattleSnapshot::new(Player::new("Germans"), Player::new("Russians"), Terrain::Land)
///     .with_attacking(vec![infantry(1)])
///     .with_defending(vec![infantry(2)]);
/// let rules = RulesetToggles::classic();
///
/// let plan = StepSequenceBuilder::new().plan(&BattleContext::new(&snapshot, &rules))?;
/// let labels: Vec<String> = plan.steps.iter().map(ToString::to_string).collect();
/// assert_eq!(
///     labels,
///     [
///         "Germans fire",
///         "Russians select casualties",
///         "Russians fire",
///         "Germans select casualties",
///         "Remove casualties",
///     ]
/// );
/// # Ok::<(), battlestep_core::SequenceError>(())
/// ```
#[derive(Debug, Clone, Copy, Default)]
pub struct StepSequenceBuilder {
    return_fire: ReturnFireResolver,
    retreat: RetreatResolver,
}

impl StepSequenceBuilder {
    /// Creates a builder with the standard resolvers.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            return_fire: ReturnFireResolver::new(),
            retreat: RetreatResolver::new(),
        }
    }

    /// Resolves return fire and retreats, then builds the round.
    ///
    /// # Errors
    ///
    /// Propagates any [`SequenceError`] from the resolvers or the builder.
    pub fn plan(&self, ctx: &BattleContext<'_>) -> Result<BattlePlan> {
        let return_fire = self.return_fire.resolve(ctx)?;
        let retreat = self.retreat.resolve(ctx)?;
        let steps = build_sequence(ctx.snapshot(), ctx.rules(), &return_fire, &retreat)?;
        Ok(BattlePlan {
            steps,
            return_fire,
            retreat,
        })
    }
}

// =============================================================================
// Forces
// =============================================================================

/// Units that still take part in fire once submarines facing an all-air
/// opponent have submerged.
struct Forces<'a> {
    attacking: Vec<&'a Unit>,
    defending: Vec<&'a Unit>,
    /// Defending units including those waiting to die.
    defending_all: Vec<&'a Unit>,
    /// Per side: its evaders submerge in front of an all-air opponent.
    submerged_vs_air: [bool; 2],
}

const fn index(side: Side) -> usize {
    match side {
        Side::Attacker => 0,
        Side::Defender => 1,
    }
}

impl<'a> Forces<'a> {
    fn assemble(snapshot: &'a BattleSnapshot) -> Self {
        let submerged_vs_air = Side::BOTH.map(|side| {
            let air_side = side.opponent();
            snapshot.units(air_side).all_with(Capabilities::AIR)
                && !snapshot.has_destroyer(air_side)
                && snapshot.units(side).any_with(Capabilities::CAN_EVADE)
        });
        let keep = |side: Side| {
            let hidden = submerged_vs_air[index(side)];
            move |unit: &&'a Unit| !(hidden && unit.can_evade())
        };

        Self {
            attacking: snapshot.units(Side::Attacker).iter().filter(keep(Side::Attacker)).collect(),
            defending: snapshot.units(Side::Defender).iter().filter(keep(Side::Defender)).collect(),
            defending_all: snapshot.participants(Side::Defender).filter(keep(Side::Defender)).collect(),
            submerged_vs_air,
        }
    }

    fn units(&self, side: Side) -> &[&'a Unit] {
        match side {
            Side::Attacker => &self.attacking,
            Side::Defender => &self.defending,
        }
    }

    fn any(&self, side: Side, predicate: impl Fn(&Unit) -> bool) -> bool {
        self.units(side).iter().any(|&unit| predicate(unit))
    }

    fn has_targets(&self, side: Side) -> bool {
        !self.units(side.opponent()).is_empty()
    }

    fn submerged_vs_air(&self, side: Side) -> bool {
        self.submerged_vs_air[index(side)]
    }
}

// =============================================================================
// Round builder
// =============================================================================

struct RoundBuilder<'a> {
    snapshot: &'a BattleSnapshot,
    rules: &'a RulesetToggles,
    return_fire: &'a ReturnFireOutcome,
    retreat: &'a RetreatEligibility,
    forces: Forces<'a>,
    steps: Vec<StepName>,
    seen: HashSet<StepName>,
}

impl<'a> RoundBuilder<'a> {
    fn new(
        snapshot: &'a BattleSnapshot,
        rules: &'a RulesetToggles,
        return_fire: &'a ReturnFireOutcome,
        retreat: &'a RetreatEligibility,
    ) -> Self {
        Self {
            snapshot,
            rules,
            return_fire,
            retreat,
            forces: Forces::assemble(snapshot),
            steps: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn build(mut self) -> Result<Vec<StepName>> {
        self.anti_air()?;
        self.first_round()?;
        self.subs_before_battle()?;
        self.unescorted_transports()?;
        self.air_versus_subs()?;
        let first_strike = self.first_strike()?;
        self.general_fire(first_strike)?;
        self.push(StepName::RemoveCasualties)?;
        self.retreats()?;
        Ok(self.steps)
    }

    fn push(&mut self, step: StepName) -> Result<()> {
        if !self.seen.insert(step.clone()) {
            error!(%step, "battle step requested twice");
            return Err(SequenceError::DuplicateStep(step));
        }
        self.steps.push(step);
        Ok(())
    }

    /// Several first-strike conditions may ask for sneak casualty removal;
    /// only the first request emits it.
    fn request_remove_sneak_casualties(&mut self) -> Result<()> {
        if self.seen.contains(&StepName::RemoveSneakAttackCasualties) {
            return Ok(());
        }
        self.push(StepName::RemoveSneakAttackCasualties)
    }

    fn player(&self, side: Side) -> Player {
        self.snapshot.player(side).clone()
    }

    // -------------------------------------------------------------------------
    // 1. Anti-aircraft
    // -------------------------------------------------------------------------

    fn anti_air(&mut self) -> Result<()> {
        let snapshot = self.snapshot;
        for side in Side::BOTH {
            let opponent = side.opponent();
            if !snapshot.units(opponent).any_with(Capabilities::AIR) {
                continue;
            }
            let round = snapshot.round();
            // Units of one type may disagree on display order; the lowest wins.
            let mut orders: BTreeMap<&str, u32> = BTreeMap::new();
            for aa in snapshot
                .units(side)
                .iter()
                .filter_map(|unit| unit.anti_air.as_ref())
                .filter(|aa| side == Side::Defender || aa.offensive)
                .filter(|aa| aa.fires_in_round(round))
            {
                orders
                    .entry(aa.type_name.as_str())
                    .and_modify(|order| *order = (*order).min(aa.display_order))
                    .or_insert(aa.display_order);
            }
            let types: BTreeSet<(u32, &str)> = orders.into_iter().map(|(name, order)| (order, name)).collect();
            for (_, aa_type) in types {
                self.push(StepName::AntiAirFire {
                    firing: self.player(side),
                    aa_type: aa_type.to_owned(),
                })?;
                self.push(StepName::SelectAntiAirCasualties {
                    selecting: self.player(opponent),
                    aa_type: aa_type.to_owned(),
                })?;
                self.push(StepName::RemoveAntiAirCasualties {
                    losing: self.player(opponent),
                    aa_type: aa_type.to_owned(),
                })?;
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // 2-5. Pre-fire phases
    // -------------------------------------------------------------------------

    fn first_round(&mut self) -> Result<()> {
        if !self.snapshot.is_first_round() || self.snapshot.is_water() {
            return Ok(());
        }
        if !self.snapshot.bombarding().is_empty() {
            self.push(StepName::NavalBombardment)?;
            self.push(StepName::SelectNavalBombardmentCasualties)?;
        }
        let paratroopers = self.snapshot.attacker_has_paratroopers()
            && self
                .snapshot
                .units(Side::Attacker)
                .iter()
                .any(|unit| unit.is_air_transport() && unit.dependents > 0);
        if paratroopers {
            self.push(StepName::LandParatroopers)?;
        }
        Ok(())
    }

    fn subs_before_battle(&mut self) -> Result<()> {
        if !self.rules.sub_retreat_before_battle() {
            return Ok(());
        }
        for side in Side::BOTH {
            if !self.snapshot.has_destroyer(side.opponent())
                && self.snapshot.units(side).any_with(Capabilities::CAN_EVADE)
            {
                self.push(StepName::SubsSubmerge {
                    player: self.player(side),
                })?;
            }
        }
        Ok(())
    }

    fn unescorted_transports(&mut self) -> Result<()> {
        let transports = Side::BOTH
            .iter()
            .any(|&side| self.snapshot.units(side).any_with(Capabilities::TRANSPORT));
        if self.snapshot.is_water() && self.rules.transport_casualties_restricted() && transports {
            self.push(StepName::RemoveUnescortedTransports)?;
        }
        Ok(())
    }

    fn air_versus_subs(&mut self) -> Result<()> {
        for side in [Side::Defender, Side::Attacker] {
            if self.forces.submerged_vs_air(side) {
                self.push(StepName::SubmergeSubsVsAirOnly {
                    player: self.player(side),
                })?;
            }
        }
        Ok(())
    }

    // -------------------------------------------------------------------------
    // 6. First strike
    // -------------------------------------------------------------------------

    /// Emits the sneak-attack block. Returns whether the defender's
    /// first-strike units still fire alongside ordinary defenders.
    fn first_strike(&mut self) -> Result<bool> {
        let sneak = self.return_fire.sneak_attack();
        let defender_first = sneak == SneakAttack::DefenderUncontested;
        let attacker_only = sneak == SneakAttack::AttackerUncontested;

        let attacker_fs = self.forces.has_targets(Side::Attacker)
            && self.forces.any(Side::Attacker, Unit::is_first_strike_on_offense);
        let defender_fs = self.forces.has_targets(Side::Defender)
            && self.forces.any(Side::Defender, Unit::is_first_strike_on_defense);

        if defender_first && defender_fs {
            self.first_strike_pair(Side::Defender)?;
            self.request_remove_sneak_casualties()?;
        }

        if attacker_fs {
            self.first_strike_pair(Side::Attacker)?;
            if attacker_only {
                self.request_remove_sneak_casualties()?;
            }
        }

        let fires_with_all_defenders = !defender_first
            && ((!self.rules.all_subs_fire_simultaneously()
                && self.return_fire.vs_defending_subs() == ReturnFire::All)
                || !self.rules.defending_subs_sneak_attack());

        let defender_sneaks = defender_fs && !defender_first && !fires_with_all_defenders;
        if defender_sneaks {
            self.first_strike_pair(Side::Defender)?;
        }

        if !defender_first && !attacker_only {
            let returned = (attacker_fs && self.return_fire.vs_attacking_subs() != ReturnFire::All)
                || (defender_sneaks && self.return_fire.vs_defending_subs() != ReturnFire::All);
            if returned {
                self.request_remove_sneak_casualties()?;
            }
        }

        Ok(fires_with_all_defenders)
    }

    fn first_strike_pair(&mut self, side: Side) -> Result<()> {
        self.push(StepName::FirstStrikeFire {
            player: self.player(side),
        })?;
        self.push(StepName::SelectFirstStrikeCasualties {
            player: self.player(side.opponent()),
        })
    }

    // -------------------------------------------------------------------------
    // 7. General fire
    // -------------------------------------------------------------------------

    fn general_fire(&mut self, fires_with_all_defenders: bool) -> Result<()> {
        let attacker_fires = self.forces.has_targets(Side::Attacker)
            && self
                .forces
                .any(Side::Attacker, |unit| !unit.is_first_strike_on_offense());
        if attacker_fires {
            if self.air_restricted(Side::Attacker) {
                self.push(StepName::AirAttackNonSubs)?;
            }
            self.fire_pair(Side::Attacker)?;
        }

        let defending_fs = self
            .forces
            .defending_all
            .iter()
            .any(|unit| unit.is_first_strike_on_defense());
        if fires_with_all_defenders && defending_fs && self.forces.has_targets(Side::Defender) {
            self.first_strike_pair(Side::Defender)?;
        }

        let defender_fires = self.forces.has_targets(Side::Defender)
            && self
                .forces
                .any(Side::Defender, |unit| !unit.is_first_strike_on_defense());
        if defender_fires {
            if self.air_restricted(Side::Defender) {
                self.push(StepName::AirDefendNonSubs)?;
            }
            self.fire_pair(Side::Defender)?;
        }
        Ok(())
    }

    fn fire_pair(&mut self, side: Side) -> Result<()> {
        self.push(StepName::Fire {
            player: self.player(side),
        })?;
        self.push(StepName::SelectCasualties {
            player: self.player(side.opponent()),
        })
    }

    /// `side`'s aircraft face submarines they cannot target: either the subs
    /// submerged against an all-air force, or the ruleset forbids aircraft
    /// hitting subs without a friendly destroyer.
    fn air_restricted(&self, side: Side) -> bool {
        let opponent = side.opponent();
        self.forces.any(side, Unit::is_air)
            && !self.snapshot.has_destroyer(side)
            && self.snapshot.units(opponent).any_with(Capabilities::CAN_EVADE)
            && (self.forces.submerged_vs_air(opponent) || self.rules.air_attack_sub_restricted())
            && self.forces.any(opponent, |unit| !unit.can_evade())
    }

    // -------------------------------------------------------------------------
    // 9. Retreats
    // -------------------------------------------------------------------------

    fn retreats(&mut self) -> Result<()> {
        self.sub_retreat(Side::Attacker)?;
        if let Some(kind) = self.retreat.attacker_withdraw() {
            self.push(StepName::AttackerWithdraw {
                player: self.player(Side::Attacker),
                kind,
            })?;
        }
        self.sub_retreat(Side::Defender)
    }

    fn sub_retreat(&mut self, side: Side) -> Result<()> {
        if !self.forces.any(side, Unit::can_evade) {
            return Ok(());
        }
        match self.retreat.subs(side) {
            SubRetreat::Submerge if !self.rules.sub_retreat_before_battle() => {
                self.push(StepName::SubsSubmerge {
                    player: self.player(side),
                })
            }
            SubRetreat::Withdraw => self.push(StepName::SubsWithdraw {
                player: self.player(side),
            }),
            SubRetreat::Submerge | SubRetreat::Unavailable => Ok(()),
        }
    }
}
