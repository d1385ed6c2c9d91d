//! Ruleset toggles.
//!
//! A game runs under one rule edition plus a set of independent boolean
//! options. [`RulesetToggles`] is the read-only view the battle engine consults;
//! it is built once per game and passed explicitly to every resolver.
//!
//! # Loading from game properties
//!
//! Hosts usually hold options as named properties. [`RulesetToggles::from_properties`]
//! maps the property names in [`property`] onto toggles. Missing properties are
//! `false`; unknown names are logged and ignored.
//!
//! ```
//! use muster::ruleset::{property, Edition, RulesetToggles};
//!
//! let rules = RulesetToggles::from_properties([
//!     (property::WW2V2, true),
//!     (property::TRANSPORT_CASUALTIES_RESTRICTED, true),
//! ])?;
//!
//! assert_eq!(rules.edition(), Edition::Ww2V2);
//! assert!(rules.all_subs_fire_simultaneously());
//! assert!(rules.defending_subs_sneak_attack());
//! assert!(rules.transport_casualties_restricted());
//! # Ok::<(), muster::RulesetError>(())
//! ```

use bitflags::bitflags;
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::RulesetError;

/// Game property names understood by [`RulesetToggles::from_properties`].
pub mod property {
    /// Selects the WW2V2 edition.
    pub const WW2V2: &str = "WW2V2";
    /// Selects the WW2V3 edition.
    pub const WW2V3: &str = "WW2V3";
    /// Defending submarines may sneak attack.
    pub const DEFENDING_SUBS_SNEAK_ATTACK: &str = "Defending Subs Sneak Attack";
    /// Submarines submerge instead of withdrawing.
    pub const SUBMERSIBLE_SUBS: &str = "Submersible Subs";
    /// Submarines retreat before any fire is exchanged.
    pub const SUB_RETREAT_BEFORE_BATTLE: &str = "Sub Retreat Before Battle";
    /// Transports are chosen as casualties last and die unescorted.
    pub const TRANSPORT_CASUALTIES_RESTRICTED: &str = "Transport Casualties Restricted";
    /// Non-amphibious land units may retreat from an amphibious assault.
    pub const PARTIAL_AMPHIBIOUS_RETREAT: &str = "Partial Amphibious Retreat";
    /// Air units may retreat from an amphibious assault.
    pub const ATTACKER_RETREAT_PLANES: &str = "Attacker Retreat Planes";
    /// Aircraft cannot hit submarines without a friendly destroyer.
    pub const AIR_ATTACK_SUB_RESTRICTED: &str = "Air Attack Sub Restricted";
    /// Retreating units stay in the battle territory.
    pub const RETREATING_UNITS_REMAIN_IN_PLACE: &str = "Retreating Units Remain In Place";
}

/// Rule edition in force for the whole game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Edition {
    /// Original rules.
    #[default]
    Classic,
    /// Second edition: all submarines fire simultaneously.
    Ww2V2,
    /// Third edition.
    Ww2V3,
}

bitflags! {
    /// Independent boolean rule options.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
    #[serde(transparent)]
    pub struct RuleFlags: u16 {
        /// See [`property::DEFENDING_SUBS_SNEAK_ATTACK`].
        const DEFENDING_SUBS_SNEAK_ATTACK = 1 << 0;
        /// See [`property::SUBMERSIBLE_SUBS`].
        const SUBMERSIBLE_SUBS = 1 << 1;
        /// See [`property::SUB_RETREAT_BEFORE_BATTLE`].
        const SUB_RETREAT_BEFORE_BATTLE = 1 << 2;
        /// See [`property::TRANSPORT_CASUALTIES_RESTRICTED`].
        const TRANSPORT_CASUALTIES_RESTRICTED = 1 << 3;
        /// See [`property::PARTIAL_AMPHIBIOUS_RETREAT`].
        const PARTIAL_AMPHIBIOUS_RETREAT = 1 << 4;
        /// See [`property::ATTACKER_RETREAT_PLANES`].
        const ATTACKER_RETREAT_PLANES = 1 << 5;
        /// See [`property::AIR_ATTACK_SUB_RESTRICTED`].
        const AIR_ATTACK_SUB_RESTRICTED = 1 << 6;
        /// See [`property::RETREATING_UNITS_REMAIN_IN_PLACE`].
        const RETREATING_UNITS_REMAIN_IN_PLACE = 1 << 7;
    }
}

impl RuleFlags {
    /// Looks up the flag for a game property name.
    #[must_use]
    pub fn from_property(name: &str) -> Option<Self> {
        let flag = match name {
            property::DEFENDING_SUBS_SNEAK_ATTACK => Self::DEFENDING_SUBS_SNEAK_ATTACK,
            property::SUBMERSIBLE_SUBS => Self::SUBMERSIBLE_SUBS,
            property::SUB_RETREAT_BEFORE_BATTLE => Self::SUB_RETREAT_BEFORE_BATTLE,
            property::TRANSPORT_CASUALTIES_RESTRICTED => Self::TRANSPORT_CASUALTIES_RESTRICTED,
            property::PARTIAL_AMPHIBIOUS_RETREAT => Self::PARTIAL_AMPHIBIOUS_RETREAT,
            property::ATTACKER_RETREAT_PLANES => Self::ATTACKER_RETREAT_PLANES,
            property::AIR_ATTACK_SUB_RESTRICTED => Self::AIR_ATTACK_SUB_RESTRICTED,
            property::RETREATING_UNITS_REMAIN_IN_PLACE => Self::RETREATING_UNITS_REMAIN_IN_PLACE,
            _ => return None,
        };
        Some(flag)
    }
}

/// Read-only rule configuration for one game.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RulesetToggles {
    edition: Edition,
    flags: RuleFlags,
}

impl Default for RulesetToggles {
    fn default() -> Self {
        Self::classic()
    }
}

impl RulesetToggles {
    /// Classic edition with every option off.
    #[must_use]
    pub const fn classic() -> Self {
        Self {
            edition: Edition::Classic,
            flags: RuleFlags::empty(),
        }
    }

    /// Replaces the edition.
    #[must_use]
    pub const fn with_edition(mut self, edition: Edition) -> Self {
        self.edition = edition;
        self
    }

    /// Enables the given options.
    #[must_use]
    pub fn with_flag(mut self, flags: RuleFlags) -> Self {
        self.flags |= flags;
        self
    }

    /// Builds toggles from `(property name, value)` pairs.
    ///
    /// Later pairs override earlier ones for the same name.
    ///
    /// # Errors
    ///
    /// Returns [`RulesetError::ConflictingEditions`] if both edition
    /// properties end up enabled.
    pub fn from_properties<'a, I>(properties: I) -> Result<Self, RulesetError>
    where
        I: IntoIterator<Item = (&'a str, bool)>,
    {
        let mut ww2v2 = false;
        let mut ww2v3 = false;
        let mut flags = RuleFlags::empty();

        for (name, value) in properties {
            match name {
                property::WW2V2 => ww2v2 = value,
                property::WW2V3 => ww2v3 = value,
                _ => match RuleFlags::from_property(name) {
                    Some(flag) => flags.set(flag, value),
                    None => warn!(property = name, "ignoring unknown rule property"),
                },
            }
        }

        let edition = match (ww2v2, ww2v3) {
            (true, true) => return Err(RulesetError::ConflictingEditions),
            (true, false) => Edition::Ww2V2,
            (false, true) => Edition::Ww2V3,
            (false, false) => Edition::Classic,
        };

        Ok(Self { edition, flags })
    }

    /// The rule edition.
    #[must_use]
    pub const fn edition(&self) -> Edition {
        self.edition
    }

    /// The raw option flags.
    #[must_use]
    pub const fn flags(&self) -> RuleFlags {
        self.flags
    }

    /// Returns true if `flag` is enabled.
    #[must_use]
    pub const fn is_enabled(&self, flag: RuleFlags) -> bool {
        self.flags.contains(flag)
    }

    /// All submarines fire simultaneously regardless of destroyers (WW2V2).
    #[must_use]
    pub fn all_subs_fire_simultaneously(&self) -> bool {
        self.edition == Edition::Ww2V2
    }

    /// Defending submarines may sneak attack. Always on under WW2V2.
    #[must_use]
    pub fn defending_subs_sneak_attack(&self) -> bool {
        self.all_subs_fire_simultaneously() || self.is_enabled(RuleFlags::DEFENDING_SUBS_SNEAK_ATTACK)
    }

    /// Submarines submerge rather than withdraw.
    #[must_use]
    pub const fn submersible_subs(&self) -> bool {
        self.is_enabled(RuleFlags::SUBMERSIBLE_SUBS)
    }

    /// Submarine retreat happens before any fire.
    #[must_use]
    pub const fn sub_retreat_before_battle(&self) -> bool {
        self.is_enabled(RuleFlags::SUB_RETREAT_BEFORE_BATTLE)
    }

    /// Transport casualties are restricted.
    #[must_use]
    pub const fn transport_casualties_restricted(&self) -> bool {
        self.is_enabled(RuleFlags::TRANSPORT_CASUALTIES_RESTRICTED)
    }

    /// Partial amphibious retreat is allowed.
    #[must_use]
    pub const fn partial_amphibious_retreat(&self) -> bool {
        self.is_enabled(RuleFlags::PARTIAL_AMPHIBIOUS_RETREAT)
    }

    /// Attacking planes may retreat from amphibious assaults.
    #[must_use]
    pub const fn attacker_retreat_planes(&self) -> bool {
        self.is_enabled(RuleFlags::ATTACKER_RETREAT_PLANES)
    }

    /// Aircraft cannot target submarines without a friendly destroyer.
    #[must_use]
    pub const fn air_attack_sub_restricted(&self) -> bool {
        self.is_enabled(RuleFlags::AIR_ATTACK_SUB_RESTRICTED)
    }

    /// Retreating units remain in the battle territory.
    #[must_use]
    pub const fn retreating_units_remain_in_place(&self) -> bool {
        self.is_enabled(RuleFlags::RETREATING_UNITS_REMAIN_IN_PLACE)
    }
}
