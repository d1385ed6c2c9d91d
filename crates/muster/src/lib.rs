//! # Muster
//!
//! Read-only battle inputs for the combat step resolution engine.
//!
//! Muster holds the facts the engine reasons about but never changes:
//!
//! - **Units**: per-unit capability facts ([`Unit`], [`Capabilities`])
//! - **Rules**: the rule edition and options in force ([`RulesetToggles`])
//! - **Snapshots**: one battle round as seen by the engine ([`BattleSnapshot`])
//!
//! Everything here is plain data. Hosts build it from their own game model,
//! either in code or by deserializing JSON.
//!
//! ## Usage
//!
//! ```
//! use muster::{BattleSnapshot, Capabilities, Player, RulesetToggles, Side, Terrain, Unit, UnitId};
//!
//! let rules = RulesetToggles::classic();
//! let snapshot = BattleSnapshot::new(Player::new("Italians"), Player::new("British"), Terrain::Water)
//!     .with_attacking(vec![Unit::new(UnitId::new(1), "destroyer")
//!         .with_capabilities(Capabilities::SEA | Capabilities::DESTROYER)]);
//!
//! assert!(snapshot.has_destroyer(Side::Attacker));
//! assert!(!rules.submersible_subs());
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod battle;
pub mod error;
pub mod ruleset;
pub mod unit;

// Re-exports for convenience
pub use battle::{BattleSnapshot, Player, Side, Terrain};
pub use error::{RulesetError, SnapshotError};
pub use ruleset::{Edition, RuleFlags, RulesetToggles};
pub use unit::{AntiAir, Capabilities, Unit, UnitId, UnitSliceExt};
