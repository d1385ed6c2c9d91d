//! Battle snapshots.
//!
//! A [`BattleSnapshot`] is the immutable view of one battle round that the host
//! battle orchestrator hands to the engine. The engine only reads it.
//!
//! # Invariants
//!
//! - A unit appears in at most one of the unit sets (see [`BattleSnapshot::validate`])
//! - Units waiting to die no longer fire but still count when asking whether a
//!   side has first-strike units or destroyers left this round
//!
//! # Example
//!
//! ```
//! use muster::battle::{BattleSnapshot, Player, Side, Terrain};
//! use muster::unit::{Capabilities, Unit, UnitId};
//!
//! let snapshot = BattleSnapshot::new(Player::new("Germans"), Player::new("British"), Terrain::Water)
//!     .with_attacking(vec![Unit::new(UnitId::new(1), "submarine")
//!         .with_capabilities(Capabilities::SEA | Capabilities::CAN_EVADE)]);
//!
//! assert!(snapshot.is_water());
//! assert!(snapshot.is_first_round());
//! assert_eq!(snapshot.player(Side::Attacker).name(), "Germans");
//! assert!(snapshot.units(Side::Defender).is_empty());
//! ```

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SnapshotError;
use crate::unit::{Capabilities, Unit, UnitSliceExt};

/// Which side of a battle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// The side that started the battle.
    Attacker,
    /// The side holding the battle site.
    Defender,
}

impl Side {
    /// Both sides, attacker first.
    pub const BOTH: [Side; 2] = [Side::Attacker, Side::Defender];

    /// The other side.
    #[must_use]
    pub const fn opponent(self) -> Self {
        match self {
            Self::Attacker => Self::Defender,
            Self::Defender => Self::Attacker,
        }
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Attacker => f.write_str("attacker"),
            Self::Defender => f.write_str("defender"),
        }
    }
}

/// A player name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Player(String);

impl Player {
    /// Creates a player from its display name.
    #[must_use]
    pub fn new(name: impl Into<String>) -> Self {
        Self(name.into())
    }

    /// The display name.
    #[must_use]
    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Player {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Player {
    fn from(name: &str) -> Self {
        Self::new(name)
    }
}

/// Terrain of the battle site.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Terrain {
    /// A land territory.
    Land,
    /// A sea zone.
    Water,
}

/// Immutable view of one battle round.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BattleSnapshot {
    attacker: Player,
    defender: Player,
    site: Terrain,
    round: u32,
    #[serde(default)]
    attacking: Vec<Unit>,
    #[serde(default)]
    defending: Vec<Unit>,
    #[serde(default)]
    attacking_waiting_to_die: Vec<Unit>,
    #[serde(default)]
    defending_waiting_to_die: Vec<Unit>,
    #[serde(default)]
    bombarding: Vec<Unit>,
    #[serde(default)]
    amphibious: bool,
    #[serde(default)]
    attacker_has_paratroopers: bool,
}

impl BattleSnapshot {
    /// Creates an empty first-round snapshot.
    #[must_use]
    pub fn new(attacker: Player, defender: Player, site: Terrain) -> Self {
        Self {
            attacker,
            defender,
            site,
            round: 1,
            attacking: Vec::new(),
            defending: Vec::new(),
            attacking_waiting_to_die: Vec::new(),
            defending_waiting_to_die: Vec::new(),
            bombarding: Vec::new(),
            amphibious: false,
            attacker_has_paratroopers: false,
        }
    }

    /// Sets the round number (1-based).
    #[must_use]
    pub fn with_round(mut self, round: u32) -> Self {
        self.round = round;
        self
    }

    /// Sets the attacking units.
    #[must_use]
    pub fn with_attacking(mut self, units: Vec<Unit>) -> Self {
        self.attacking = units;
        self
    }

    /// Sets the defending units.
    #[must_use]
    pub fn with_defending(mut self, units: Vec<Unit>) -> Self {
        self.defending = units;
        self
    }

    /// Sets the units of `side` that are destroyed but still resolving.
    #[must_use]
    pub fn with_waiting_to_die(mut self, side: Side, units: Vec<Unit>) -> Self {
        match side {
            Side::Attacker => self.attacking_waiting_to_die = units,
            Side::Defender => self.defending_waiting_to_die = units,
        }
        self
    }

    /// Sets the bombarding units.
    #[must_use]
    pub fn with_bombarding(mut self, units: Vec<Unit>) -> Self {
        self.bombarding = units;
        self
    }

    /// Flags the battle as an amphibious assault.
    #[must_use]
    pub fn with_amphibious(mut self, amphibious: bool) -> Self {
        self.amphibious = amphibious;
        self
    }

    /// Records whether the attacker owns the paratrooper technology.
    #[must_use]
    pub fn with_paratroopers(mut self, has_tech: bool) -> Self {
        self.attacker_has_paratroopers = has_tech;
        self
    }

    /// The player on `side`.
    #[must_use]
    pub fn player(&self, side: Side) -> &Player {
        match side {
            Side::Attacker => &self.attacker,
            Side::Defender => &self.defender,
        }
    }

    /// Live units on `side`.
    #[must_use]
    pub fn units(&self, side: Side) -> &[Unit] {
        match side {
            Side::Attacker => &self.attacking,
            Side::Defender => &self.defending,
        }
    }

    /// Units on `side` destroyed this round but not yet removed.
    #[must_use]
    pub fn waiting_to_die(&self, side: Side) -> &[Unit] {
        match side {
            Side::Attacker => &self.attacking_waiting_to_die,
            Side::Defender => &self.defending_waiting_to_die,
        }
    }

    /// Live and waiting-to-die units on `side`.
    pub fn participants(&self, side: Side) -> impl Iterator<Item = &Unit> {
        self.units(side).iter().chain(self.waiting_to_die(side))
    }

    /// Units bombarding the site from the sea.
    #[must_use]
    pub fn bombarding(&self) -> &[Unit] {
        &self.bombarding
    }

    /// Terrain of the battle site.
    #[must_use]
    pub const fn site(&self) -> Terrain {
        self.site
    }

    /// True for sea battles.
    #[must_use]
    pub fn is_water(&self) -> bool {
        self.site == Terrain::Water
    }

    /// Current round, starting at 1.
    #[must_use]
    pub const fn round(&self) -> u32 {
        self.round
    }

    /// True during the first round.
    #[must_use]
    pub const fn is_first_round(&self) -> bool {
        self.round <= 1
    }

    /// True if the attack is amphibious, either flagged by the host or
    /// implied by an amphibious-landed attacking unit.
    #[must_use]
    pub fn is_amphibious(&self) -> bool {
        self.amphibious || self.attacking.any_with(Capabilities::AMPHIBIOUS_LANDED)
    }

    /// True if the attacker owns the paratrooper technology.
    #[must_use]
    pub const fn attacker_has_paratroopers(&self) -> bool {
        self.attacker_has_paratroopers
    }

    /// True if `side`, counting units waiting to die, still has a destroyer.
    #[must_use]
    pub fn has_destroyer(&self, side: Side) -> bool {
        self.participants(side).any(Unit::is_destroyer)
    }

    /// Checks that no unit appears in two unit sets.
    ///
    /// # Errors
    ///
    /// Returns [`SnapshotError::DuplicateUnit`] naming the first repeated unit.
    pub fn validate(&self) -> Result<(), SnapshotError> {
        let mut seen = HashSet::new();
        let all = self
            .attacking
            .iter()
            .chain(&self.defending)
            .chain(&self.attacking_waiting_to_die)
            .chain(&self.defending_waiting_to_die)
            .chain(&self.bombarding);
        for unit in all {
            if !seen.insert(unit.id) {
                return Err(SnapshotError::DuplicateUnit { unit: unit.id });
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::unit::UnitId;

    fn unit(id: u32, capabilities: Capabilities) -> Unit {
        Unit::new(UnitId::new(id), "test").with_capabilities(capabilities)
    }

    fn snapshot(site: Terrain) -> BattleSnapshot {
        BattleSnapshot::new(Player::new("Germans"), Player::new("Russians"), site)
    }

    mod side_tests {
        use super::*;

        #[test]
        fn opponent_is_involution() {
            for side in Side::BOTH {
                assert_eq!(side.opponent().opponent(), side);
                assert_ne!(side.opponent(), side);
            }
        }
    }

    mod snapshot_tests {
        use super::*;

        #[test]
        fn accessors_by_side() {
            let snap = snapshot(Terrain::Land)
                .with_attacking(vec![unit(1, Capabilities::LAND)])
                .with_defending(vec![unit(2, Capabilities::LAND), unit(3, Capabilities::AIR)])
                .with_waiting_to_die(Side::Defender, vec![unit(4, Capabilities::DESTROYER)]);

            assert_eq!(snap.units(Side::Attacker).len(), 1);
            assert_eq!(snap.units(Side::Defender).len(), 2);
            assert_eq!(snap.participants(Side::Defender).count(), 3);
            assert!(snap.has_destroyer(Side::Defender));
            assert!(!snap.has_destroyer(Side::Attacker));
            assert_eq!(snap.player(Side::Defender).to_string(), "Russians");
        }

        #[test]
        fn amphibious_from_flag_or_units() {
            let flagged = snapshot(Terrain::Land).with_amphibious(true);
            assert!(flagged.is_amphibious());

            let landed = snapshot(Terrain::Land)
                .with_attacking(vec![unit(1, Capabilities::LAND | Capabilities::AMPHIBIOUS_LANDED)]);
            assert!(landed.is_amphibious());

            assert!(!snapshot(Terrain::Land).is_amphibious());
        }

        #[test]
        fn round_tracking() {
            let snap = snapshot(Terrain::Water);
            assert!(snap.is_first_round());
            assert!(!snap.with_round(2).is_first_round());
        }

        #[test]
        fn validate_rejects_shared_units() {
            let snap = snapshot(Terrain::Water)
                .with_attacking(vec![unit(1, Capabilities::SEA)])
                .with_waiting_to_die(Side::Attacker, vec![unit(1, Capabilities::SEA)]);
            assert_eq!(
                snap.validate(),
                Err(SnapshotError::DuplicateUnit { unit: UnitId::new(1) })
            );
        }

        #[test]
        fn validate_accepts_disjoint_sets() {
            let snap = snapshot(Terrain::Water)
                .with_attacking(vec![unit(1, Capabilities::SEA)])
                .with_defending(vec![unit(2, Capabilities::SEA)])
                .with_bombarding(vec![unit(3, Capabilities::SEA)]);
            assert!(snap.validate().is_ok());
        }

        #[test]
        fn loads_from_json() {
            let json = r#"{
                "attacker": "Japanese",
                "defender": "Americans",
                "site": "Water",
                "round": 2,
                "attacking": [
                    { "id": 1, "type_name": "submarine", "capabilities": "SEA | CAN_EVADE" }
                ]
            }"#;
            let snap: BattleSnapshot = serde_json::from_str(json).unwrap();
            assert_eq!(snap.round(), 2);
            assert!(snap.units(Side::Attacker)[0].can_evade());
            assert!(snap.units(Side::Defender).is_empty());
            assert!(!snap.is_amphibious());
        }
    }
}
