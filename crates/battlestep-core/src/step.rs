//! Named combat phases.
//!
//! A [`StepName`] identifies one phase of a battle round. Player-specific
//! phases carry the player, and anti-aircraft phases also carry the AA type,
//! so every phase in one round has a distinct name.
//!
//! The `Display` form is the label shown to players, for example
//! `"Germans first strike units fire"` or `"Remove casualties"`.

use std::fmt;

use serde::{Deserialize, Serialize};

use muster::Player;

use crate::resolver::WithdrawKind;

/// One phase of a battle round.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "step", rename_all = "snake_case")]
pub enum StepName {
    /// `firing` shoots at aircraft with one AA type.
    AntiAirFire {
        /// Side owning the AA units.
        firing: Player,
        /// AA type name.
        aa_type: String,
    },
    /// `selecting` picks aircraft lost to one AA type.
    SelectAntiAirCasualties {
        /// Side losing aircraft.
        selecting: Player,
        /// AA type name.
        aa_type: String,
    },
    /// Aircraft lost to one AA type are removed.
    RemoveAntiAirCasualties {
        /// Side losing aircraft.
        losing: Player,
        /// AA type name.
        aa_type: String,
    },
    /// Ships bombard a land battle before the first round.
    NavalBombardment,
    /// Defender picks bombardment casualties.
    SelectNavalBombardmentCasualties,
    /// Air transports drop their paratroopers.
    LandParatroopers,
    /// `player`'s submarines submerge.
    SubsSubmerge {
        /// Owner of the submarines.
        player: Player,
    },
    /// Transports without escorts are destroyed.
    RemoveUnescortedTransports,
    /// `player`'s submarines submerge because only aircraft oppose them.
    SubmergeSubsVsAirOnly {
        /// Owner of the submarines.
        player: Player,
    },
    /// Attacking aircraft may only target non-submarines.
    AirAttackNonSubs,
    /// Defending aircraft may only target non-submarines.
    AirDefendNonSubs,
    /// `player`'s first-strike units fire.
    FirstStrikeFire {
        /// Firing side.
        player: Player,
    },
    /// `player` picks losses from first-strike fire.
    SelectFirstStrikeCasualties {
        /// Side taking losses.
        player: Player,
    },
    /// Losses from sneak attacks are removed before they can fire back.
    RemoveSneakAttackCasualties,
    /// `player`'s ordinary units fire.
    Fire {
        /// Firing side.
        player: Player,
    },
    /// `player` picks losses from ordinary fire.
    SelectCasualties {
        /// Side taking losses.
        player: Player,
    },
    /// All remaining casualties are removed.
    RemoveCasualties,
    /// `player`'s submarines withdraw.
    SubsWithdraw {
        /// Owner of the submarines.
        player: Player,
    },
    /// The attacker is offered a withdrawal.
    AttackerWithdraw {
        /// The attacking player.
        player: Player,
        /// Which units the withdrawal covers.
        kind: WithdrawKind,
    },
}

impl StepName {
    /// The player this phase is about, if any.
    #[must_use]
    pub fn player(&self) -> Option<&Player> {
        match self {
            Self::AntiAirFire { firing: player, .. }
            | Self::SelectAntiAirCasualties { selecting: player, .. }
            | Self::RemoveAntiAirCasualties { losing: player, .. }
            | Self::SubsSubmerge { player }
            | Self::SubmergeSubsVsAirOnly { player }
            | Self::FirstStrikeFire { player }
            | Self::SelectFirstStrikeCasualties { player }
            | Self::Fire { player }
            | Self::SelectCasualties { player }
            | Self::SubsWithdraw { player }
            | Self::AttackerWithdraw { player, .. } => Some(player),
            Self::NavalBombardment
            | Self::SelectNavalBombardmentCasualties
            | Self::LandParatroopers
            | Self::RemoveUnescortedTransports
            | Self::AirAttackNonSubs
            | Self::AirDefendNonSubs
            | Self::RemoveSneakAttackCasualties
            | Self::RemoveCasualties => None,
        }
    }

    /// True for phases in which units shoot.
    #[must_use]
    pub fn is_fire(&self) -> bool {
        matches!(
            self,
            Self::AntiAirFire { .. }
                | Self::NavalBombardment
                | Self::FirstStrikeFire { .. }
                | Self::Fire { .. }
        )
    }

    /// True for phases in which units leave the battle.
    #[must_use]
    pub fn is_retreat(&self) -> bool {
        matches!(
            self,
            Self::SubsSubmerge { .. } | Self::SubsWithdraw { .. } | Self::AttackerWithdraw { .. }
        )
    }
}

impl fmt::Display for StepName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AntiAirFire { firing, aa_type } => write!(f, "{firing} {aa_type} fire"),
            Self::SelectAntiAirCasualties { selecting, aa_type } => {
                write!(f, "{selecting} select {aa_type} casualties")
            }
            Self::RemoveAntiAirCasualties { losing, aa_type } => {
                write!(f, "{losing} remove {aa_type} casualties")
            }
            Self::NavalBombardment => f.write_str("Naval bombardment"),
            Self::SelectNavalBombardmentCasualties => {
                f.write_str("Select naval bombardment casualties")
            }
            Self::LandParatroopers => f.write_str("Land paratroops"),
            Self::SubsSubmerge { player } => write!(f, "{player} subs submerge"),
            Self::RemoveUnescortedTransports => f.write_str("Remove unescorted transports"),
            Self::SubmergeSubsVsAirOnly { player } => {
                write!(f, "{player} submerge subs vs air only")
            }
            Self::AirAttackNonSubs => f.write_str("Air attack non subs"),
            Self::AirDefendNonSubs => f.write_str("Air defend non subs"),
            Self::FirstStrikeFire { player } => write!(f, "{player} first strike units fire"),
            Self::SelectFirstStrikeCasualties { player } => {
                write!(f, "{player} select first strike casualties")
            }
            Self::RemoveSneakAttackCasualties => f.write_str("Remove sneak attack casualties"),
            Self::Fire { player } => write!(f, "{player} fire"),
            Self::SelectCasualties { player } => write!(f, "{player} select casualties"),
            Self::RemoveCasualties => f.write_str("Remove casualties"),
            Self::SubsWithdraw { player } => write!(f, "{player} subs withdraw"),
            Self::AttackerWithdraw { player, kind } => match kind {
                WithdrawKind::General => write!(f, "{player} withdraw?"),
                WithdrawKind::PartialAmphibious => {
                    write!(f, "{player} withdraw non-amphibious units?")
                }
                WithdrawKind::Planes => write!(f, "{player} withdraw planes?"),
            },
        }
    }
}
