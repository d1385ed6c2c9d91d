//! Unit capability queries.
//!
//! The battle engine never inspects unit types directly. Each [`Unit`] carries
//! the capability facts the host game data attached to it, and the engine asks
//! read-only questions about them.
//!
//! # Missing data
//!
//! A capability that the host did not supply is simply absent from
//! [`Capabilities`], so the matching predicate answers `false`. Absence is the
//! common case (most units are not destroyers), so it is never an error.
//!
//! # Example
//!
//! ```
//! use muster::unit::{Capabilities, Unit, UnitId, UnitSliceExt};
//!
//! let sub = Unit::new(UnitId::new(1), "submarine")
//!     .with_capabilities(Capabilities::SEA | Capabilities::CAN_EVADE);
//! let fighter = Unit::new(UnitId::new(2), "fighter").with_capabilities(Capabilities::AIR);
//!
//! assert!(sub.can_evade());
//! assert!(!fighter.is_destroyer());
//!
//! let fleet = vec![sub, fighter];
//! assert!(fleet.any_with(Capabilities::AIR));
//! assert!(!fleet.all_with(Capabilities::AIR));
//! ```

use std::fmt;

use bitflags::bitflags;
use serde::{Deserialize, Serialize};

/// Unique identifier for a unit within one game.
///
/// Snapshots use unit ids to check that no unit appears in two unit sets.
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct UnitId(u32);

impl UnitId {
    /// Creates a new `UnitId` from a raw value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Returns the raw value of this identifier.
    #[must_use]
    pub const fn as_u32(self) -> u32 {
        self.0
    }
}

impl fmt::Debug for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "UnitId({})", self.0)
    }
}

impl fmt::Display for UnitId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "#{}", self.0)
    }
}

impl From<u32> for UnitId {
    fn from(id: u32) -> Self {
        Self::new(id)
    }
}

impl From<UnitId> for u32 {
    fn from(id: UnitId) -> Self {
        id.0
    }
}

bitflags! {
    /// Boolean capability facts about a unit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct Capabilities: u16 {
        /// Negates opposing submarine sneak attacks.
        const DESTROYER = 1 << 0;
        /// Air unit.
        const AIR = 1 << 1;
        /// Sea unit.
        const SEA = 1 << 2;
        /// Land unit.
        const LAND = 1 << 3;
        /// Carries land units across sea zones.
        const TRANSPORT = 1 << 4;
        /// Transport that can also defend itself.
        const COMBAT_TRANSPORT = 1 << 5;
        /// Submarine-like: may submerge and cannot be hit by lone aircraft.
        const CAN_EVADE = 1 << 6;
        /// Fires in the first-strike block when attacking.
        const FIRST_STRIKE_OFFENSE = 1 << 7;
        /// Fires in the first-strike block when defending.
        const FIRST_STRIKE_DEFENSE = 1 << 8;
        /// Landed in this battle from a transport.
        const AMPHIBIOUS_LANDED = 1 << 9;
        /// Air unit able to drop paratroopers.
        const AIR_TRANSPORT = 1 << 10;
    }
}

/// Anti-aircraft capability of a unit type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AntiAir {
    /// AA type name; one fire/select/remove triple is emitted per distinct type.
    pub type_name: String,
    /// Stable ordering key used when several AA types fight in one battle.
    pub display_order: u32,
    /// Whether this AA also fires when its owner is attacking.
    #[serde(default)]
    pub offensive: bool,
    /// Number of rounds the AA fires in, `None` for every round.
    #[serde(default)]
    pub max_rounds: Option<u32>,
}

impl AntiAir {
    /// Creates a defensive-only AA type that fires every round.
    #[must_use]
    pub fn new(type_name: impl Into<String>, display_order: u32) -> Self {
        Self {
            type_name: type_name.into(),
            display_order,
            offensive: false,
            max_rounds: None,
        }
    }

    /// Allows the AA to fire while attacking.
    #[must_use]
    pub fn offensive(mut self) -> Self {
        self.offensive = true;
        self
    }

    /// Limits AA fire to the first `rounds` rounds.
    #[must_use]
    pub fn with_max_rounds(mut self, rounds: u32) -> Self {
        self.max_rounds = Some(rounds);
        self
    }

    /// Returns true if the AA may fire in `round` (1-based).
    #[must_use]
    pub fn fires_in_round(&self, round: u32) -> bool {
        self.max_rounds.map_or(true, |max| round <= max)
    }
}

/// A unit as seen by the battle engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Unit {
    /// Identifier, unique within the game.
    pub id: UnitId,
    /// Unit type name, used for logging only.
    pub type_name: String,
    /// Capability facts.
    pub capabilities: Capabilities,
    /// Anti-aircraft capability, if any.
    #[serde(default)]
    pub anti_air: Option<AntiAir>,
    /// Number of units carried (paratroopers for air transports).
    #[serde(default)]
    pub dependents: u32,
}

impl Unit {
    /// Creates a unit with no capabilities.
    #[must_use]
    pub fn new(id: UnitId, type_name: impl Into<String>) -> Self {
        Self {
            id,
            type_name: type_name.into(),
            capabilities: Capabilities::empty(),
            anti_air: None,
            dependents: 0,
        }
    }

    /// Adds capability flags.
    #[must_use]
    pub fn with_capabilities(mut self, capabilities: Capabilities) -> Self {
        self.capabilities |= capabilities;
        self
    }

    /// Attaches an anti-aircraft capability.
    #[must_use]
    pub fn with_anti_air(mut self, anti_air: AntiAir) -> Self {
        self.anti_air = Some(anti_air);
        self
    }

    /// Sets the number of carried dependents.
    #[must_use]
    pub fn with_dependents(mut self, dependents: u32) -> Self {
        self.dependents = dependents;
        self
    }

    /// Returns true if the unit has every flag in `capabilities`.
    #[must_use]
    pub fn has(&self, capabilities: Capabilities) -> bool {
        self.capabilities.contains(capabilities)
    }

    /// Destroyer.
    #[must_use]
    pub fn is_destroyer(&self) -> bool {
        self.has(Capabilities::DESTROYER)
    }

    /// Air unit.
    #[must_use]
    pub fn is_air(&self) -> bool {
        self.has(Capabilities::AIR)
    }

    /// Sea unit.
    #[must_use]
    pub fn is_sea(&self) -> bool {
        self.has(Capabilities::SEA)
    }

    /// Land unit.
    #[must_use]
    pub fn is_land(&self) -> bool {
        self.has(Capabilities::LAND)
    }

    /// Transport.
    #[must_use]
    pub fn is_transport(&self) -> bool {
        self.has(Capabilities::TRANSPORT)
    }

    /// Transport with its own combat value.
    #[must_use]
    pub fn is_combat_transport(&self) -> bool {
        self.has(Capabilities::COMBAT_TRANSPORT)
    }

    /// Submarine-like unit.
    #[must_use]
    pub fn can_evade(&self) -> bool {
        self.has(Capabilities::CAN_EVADE)
    }

    /// First strike while attacking.
    #[must_use]
    pub fn is_first_strike_on_offense(&self) -> bool {
        self.has(Capabilities::FIRST_STRIKE_OFFENSE)
    }

    /// First strike while defending.
    #[must_use]
    pub fn is_first_strike_on_defense(&self) -> bool {
        self.has(Capabilities::FIRST_STRIKE_DEFENSE)
    }

    /// Landed amphibiously this battle.
    #[must_use]
    pub fn was_amphibious_landed(&self) -> bool {
        self.has(Capabilities::AMPHIBIOUS_LANDED)
    }

    /// Air transport.
    #[must_use]
    pub fn is_air_transport(&self) -> bool {
        self.has(Capabilities::AIR_TRANSPORT)
    }

    /// Carries an anti-aircraft capability.
    #[must_use]
    pub fn is_anti_air(&self) -> bool {
        self.anti_air.is_some()
    }
}

/// Set-wide capability queries over a slice of units.
pub trait UnitSliceExt {
    /// True if at least one unit has every flag in `capabilities`.
    fn any_with(&self, capabilities: Capabilities) -> bool;

    /// True if the slice is non-empty and every unit has every flag.
    fn all_with(&self, capabilities: Capabilities) -> bool;

    /// True if no unit has every flag in `capabilities`.
    fn none_with(&self, capabilities: Capabilities) -> bool {
        !self.any_with(capabilities)
    }
}

impl UnitSliceExt for [Unit] {
    fn any_with(&self, capabilities: Capabilities) -> bool {
        self.iter().any(|unit| unit.has(capabilities))
    }

    fn all_with(&self, capabilities: Capabilities) -> bool {
        !self.is_empty() && self.iter().all(|unit| unit.has(capabilities))
    }
}
