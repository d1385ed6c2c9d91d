//! Test helper functions for building units, snapshots and collaborators.
//!
//! Unit factories take an id so each test controls disjointness explicitly.

use muster::{
    AntiAir, BattleSnapshot, Capabilities, Player, RulesetToggles, Side, Terrain, Unit, UnitId,
};

use crate::error::{ActionError, SequenceError};
use crate::execution::BattleActions;
use crate::resolver::{BattleContext, RetreatRoutes};
use crate::sequence::StepSequenceBuilder;
use crate::step::StepName;

// =============================================================================
// Players
// =============================================================================

/// The attacking player used throughout the tests.
pub fn attacker() -> Player {
    Player::new("Germans")
}

/// The defending player used throughout the tests.
pub fn defender() -> Player {
    Player::new("British")
}

// =============================================================================
// Units
// =============================================================================

fn unit(id: u32, type_name: &str, capabilities: Capabilities) -> Unit {
    Unit::new(UnitId::new(id), type_name).with_capabilities(capabilities)
}

/// A plain land unit.
pub fn infantry(id: u32) -> Unit {
    unit(id, "infantry", Capabilities::LAND)
}

/// A land unit that came ashore from a transport.
pub fn marine(id: u32) -> Unit {
    unit(id, "marine", Capabilities::LAND | Capabilities::AMPHIBIOUS_LANDED)
}

/// A plain air unit.
pub fn fighter(id: u32) -> Unit {
    unit(id, "fighter", Capabilities::AIR)
}

/// An air transport carrying `dependents` paratroopers.
pub fn air_transport(id: u32, dependents: u32) -> Unit {
    unit(id, "air_transport", Capabilities::AIR | Capabilities::AIR_TRANSPORT).with_dependents(dependents)
}

/// A destroyer.
pub fn destroyer(id: u32) -> Unit {
    unit(id, "destroyer", Capabilities::SEA | Capabilities::DESTROYER)
}

/// A plain warship.
pub fn cruiser(id: u32) -> Unit {
    unit(id, "cruiser", Capabilities::SEA)
}

/// An evading unit with first strike on offense and defense.
pub fn submarine(id: u32) -> Unit {
    unit(
        id,
        "submarine",
        Capabilities::SEA
            | Capabilities::CAN_EVADE
            | Capabilities::FIRST_STRIKE_OFFENSE
            | Capabilities::FIRST_STRIKE_DEFENSE,
    )
}

/// An evading unit without first strike.
pub fn evader(id: u32) -> Unit {
    unit(id, "midget_sub", Capabilities::SEA | Capabilities::CAN_EVADE)
}

/// A first-strike unit that cannot evade.
pub fn first_striker(id: u32) -> Unit {
    unit(
        id,
        "torpedo_boat",
        Capabilities::SEA | Capabilities::FIRST_STRIKE_OFFENSE | Capabilities::FIRST_STRIKE_DEFENSE,
    )
}

/// An unarmed transport.
pub fn transport(id: u32) -> Unit {
    unit(id, "transport", Capabilities::SEA | Capabilities::TRANSPORT)
}

/// A transport with its own combat value.
pub fn combat_transport(id: u32) -> Unit {
    unit(
        id,
        "armed_transport",
        Capabilities::SEA | Capabilities::TRANSPORT | Capabilities::COMBAT_TRANSPORT,
    )
}

/// A land unit carrying anti-aircraft of `aa_type`.
pub fn aa_gun(id: u32, aa_type: &str, display_order: u32) -> Unit {
    unit(id, aa_type, Capabilities::LAND).with_anti_air(AntiAir::new(aa_type, display_order))
}

// =============================================================================
// Snapshots
// =============================================================================

/// A first-round land battle between the test players.
pub fn land_battle(attacking: Vec<Unit>, defending: Vec<Unit>) -> BattleSnapshot {
    BattleSnapshot::new(attacker(), defender(), Terrain::Land)
        .with_attacking(attacking)
        .with_defending(defending)
}

/// A first-round sea battle between the test players.
pub fn sea_battle(attacking: Vec<Unit>, defending: Vec<Unit>) -> BattleSnapshot {
    BattleSnapshot::new(attacker(), defender(), Terrain::Water)
        .with_attacking(attacking)
        .with_defending(defending)
}

/// Builds the round with both resolvers.
pub fn steps_for(
    snapshot: &BattleSnapshot,
    rules: &RulesetToggles,
    routes: RetreatRoutes,
) -> Result<Vec<StepName>, SequenceError> {
    let ctx = BattleContext::new(snapshot, rules).with_routes(routes);
    StepSequenceBuilder::new().plan(&ctx).map(|plan| plan.steps)
}

// =============================================================================
// Step shorthands
// =============================================================================

/// `player fire`, `opponent select casualties`.
pub fn fire(side: Side) -> Vec<StepName> {
    let (firing, selecting) = players(side);
    vec![
        StepName::Fire { player: firing },
        StepName::SelectCasualties { player: selecting },
    ]
}

/// `player first strike units fire`, `opponent select first strike casualties`.
pub fn first_strike(side: Side) -> Vec<StepName> {
    let (firing, selecting) = players(side);
    vec![
        StepName::FirstStrikeFire { player: firing },
        StepName::SelectFirstStrikeCasualties { player: selecting },
    ]
}

/// Attacker fire, defender fire, remove casualties.
pub fn basic_fight() -> Vec<StepName> {
    concat([fire(Side::Attacker), fire(Side::Defender), vec![StepName::RemoveCasualties]])
}

/// Flattens step blocks into one list.
pub fn concat<const N: usize>(blocks: [Vec<StepName>; N]) -> Vec<StepName> {
    blocks.into_iter().flatten().collect()
}

fn players(side: Side) -> (Player, Player) {
    match side {
        Side::Attacker => (attacker(), defender()),
        Side::Defender => (defender(), attacker()),
    }
}

// =============================================================================
// Battle actions
// =============================================================================

/// In-memory [`BattleActions`] that records performed steps.
#[derive(Debug, Clone)]
pub struct RecordingActions {
    /// Current battle state.
    pub snapshot: BattleSnapshot,
    /// Rules in force.
    pub rules: RulesetToggles,
    /// Reported retreat routes.
    pub routes: RetreatRoutes,
    /// Steps performed so far, in order.
    pub performed: Vec<StepName>,
    /// Fail the perform call made when this many steps have been performed.
    pub fail_on: Option<usize>,
    /// Snapshot replacements applied after the named step is performed.
    pub transitions: Vec<(StepName, BattleSnapshot)>,
}

impl RecordingActions {
    /// Classic rules, no routes, never failing.
    pub fn new(snapshot: BattleSnapshot) -> Self {
        Self {
            snapshot,
            rules: RulesetToggles::classic(),
            routes: RetreatRoutes::none(),
            performed: Vec::new(),
            fail_on: None,
            transitions: Vec::new(),
        }
    }

    /// Replaces the snapshot with `next` once `step` has been performed.
    pub fn after(mut self, step: StepName, next: BattleSnapshot) -> Self {
        self.transitions.push((step, next));
        self
    }
}

impl BattleActions for RecordingActions {
    fn snapshot(&self) -> &BattleSnapshot {
        &self.snapshot
    }

    fn toggles(&self) -> &RulesetToggles {
        &self.rules
    }

    fn routes(&self) -> RetreatRoutes {
        self.routes
    }

    fn perform(&mut self, step: &StepName) -> Result<(), ActionError> {
        if self.fail_on == Some(self.performed.len()) {
            return Err(ActionError::CommunicationLost {
                player: defender(),
            });
        }
        self.performed.push(step.clone());
        if let Some(index) = self.transitions.iter().position(|(name, _)| name == step) {
            let (_, next) = self.transitions.remove(index);
            self.snapshot = next;
        }
        Ok(())
    }
}
