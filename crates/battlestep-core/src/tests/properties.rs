//! Property tests over generated battles.

use proptest::prelude::*;

use muster::{BattleSnapshot, Capabilities, Edition, RuleFlags, RulesetToggles, Side, Terrain, Unit, UnitSliceExt};

use crate::resolver::{BattleContext, RetreatRoutes, ReturnFire, SubRetreat};
use crate::sequence::{BattlePlan, StepSequenceBuilder};
use crate::step::StepName;

use super::helpers::{
    aa_gun, air_transport, attacker, combat_transport, cruiser, defender, destroyer, evader, fighter,
    first_striker, infantry, marine, submarine, transport,
};

const KINDS: u8 = 13;

fn make_unit(kind: u8, id: u32) -> Unit {
    match kind {
        0 => infantry(id),
        1 => marine(id),
        2 => fighter(id),
        3 => destroyer(id),
        4 => cruiser(id),
        5 => submarine(id),
        6 => evader(id),
        7 => first_striker(id),
        8 => transport(id),
        9 => combat_transport(id),
        10 => aa_gun(id, "Flak", 1),
        11 => aa_gun(id, "AntiAirGun", 0),
        _ => air_transport(id, 1),
    }
}

#[derive(Debug, Clone)]
struct Battle {
    snapshot: BattleSnapshot,
    rules: RulesetToggles,
    routes: RetreatRoutes,
}

impl Battle {
    fn plan(&self) -> BattlePlan {
        StepSequenceBuilder::new()
            .plan(&BattleContext::new(&self.snapshot, &self.rules).with_routes(self.routes))
            .unwrap()
    }
}

fn edition() -> impl Strategy<Value = Edition> {
    prop_oneof![Just(Edition::Classic), Just(Edition::Ww2V2), Just(Edition::Ww2V3)]
}

prop_compose! {
    fn battle()(
        attacking in prop::collection::vec(0..KINDS, 0..5),
        defending in prop::collection::vec(0..KINDS, 0..5),
        dying in prop::collection::vec(0..KINDS, 0..2),
        attacker_dying in prop::collection::vec(0..KINDS, 0..2),
        water in any::<bool>(),
        round in 1u32..4,
        amphibious in any::<bool>(),
        paratroopers in any::<bool>(),
        edition in edition(),
        flags in any::<u16>(),
        attacker_route in any::<bool>(),
        defender_exit in any::<bool>(),
    ) -> Battle {
        let mut next_id = 0u32;
        let mut build = |kinds: &[u8]| -> Vec<Unit> {
            kinds
                .iter()
                .map(|&kind| {
                    next_id += 1;
                    make_unit(kind, next_id)
                })
                .collect()
        };
        let site = if water { Terrain::Water } else { Terrain::Land };
        let snapshot = BattleSnapshot::new(attacker(), defender(), site)
            .with_round(round)
            .with_attacking(build(&attacking))
            .with_defending(build(&defending))
            .with_waiting_to_die(Side::Defender, build(&dying))
            .with_waiting_to_die(Side::Attacker, build(&attacker_dying))
            .with_amphibious(amphibious)
            .with_paratroopers(paratroopers);
        let rules = RulesetToggles::classic()
            .with_edition(edition)
            .with_flag(RuleFlags::from_bits_truncate(flags));
        let routes = RetreatRoutes {
            attacker_has_retreat_territory: attacker_route,
            defender_has_sea_exit: defender_exit,
        };
        Battle { snapshot, rules, routes }
    }
}

fn count(steps: &[StepName], step: &StepName) -> usize {
    steps.iter().filter(|s| *s == step).count()
}

proptest! {
    #[test]
    fn building_is_idempotent(battle in battle()) {
        prop_assert_eq!(battle.plan(), battle.plan());
    }

    #[test]
    fn no_step_is_emitted_twice(battle in battle()) {
        let steps = battle.plan().steps;
        for step in &steps {
            prop_assert_eq!(count(&steps, step), 1, "{} repeated", step);
        }
    }

    #[test]
    fn casualty_removal_splits_fire_from_retreat(battle in battle()) {
        let steps = battle.plan().steps;
        prop_assert_eq!(count(&steps, &StepName::RemoveCasualties), 1);
        let split = steps.iter().position(|s| *s == StepName::RemoveCasualties).unwrap();
        prop_assert!(steps[split + 1..].iter().all(StepName::is_retreat));
        prop_assert!(!steps[split + 1..].iter().any(StepName::is_fire));
        prop_assert!(count(&steps, &StepName::RemoveSneakAttackCasualties) <= 1);
    }

    #[test]
    fn anti_air_needs_anti_air_units(battle in battle()) {
        let has_aa = Side::BOTH
            .iter()
            .any(|&side| battle.snapshot.units(side).iter().any(|unit| unit.anti_air.is_some()));
        let aa_steps = battle
            .plan()
            .steps
            .iter()
            .filter(|s| matches!(s, StepName::AntiAirFire { .. }))
            .count();
        if !has_aa {
            prop_assert_eq!(aa_steps, 0);
        }
    }

    #[test]
    fn defending_destroyer_always_answers_attacking_subs(battle in battle()) {
        let plan = battle.plan();
        if battle.snapshot.units(Side::Defender).any_with(Capabilities::DESTROYER) {
            prop_assert_eq!(plan.return_fire.vs_attacking_subs(), ReturnFire::All);
        }
    }

    #[test]
    fn opposing_destroyer_blocks_sub_withdrawal(battle in battle()) {
        let plan = battle.plan();
        for side in Side::BOTH {
            if battle.snapshot.has_destroyer(side.opponent()) {
                prop_assert_ne!(plan.retreat.subs(side), SubRetreat::Withdraw);
            }
        }
    }

    #[test]
    fn ww2v2_without_destroyers_is_subs_only_both_ways(battle in battle()) {
        let no_destroyers = Side::BOTH
            .iter()
            .all(|&side| battle.snapshot.units(side).none_with(Capabilities::DESTROYER));
        let rules = battle.rules.with_edition(Edition::Ww2V2);
        let plan = StepSequenceBuilder::new()
            .plan(&BattleContext::new(&battle.snapshot, &rules).with_routes(battle.routes))
            .unwrap();
        if no_destroyers {
            prop_assert_eq!(plan.return_fire.vs_attacking_subs(), ReturnFire::SubsOnly);
            prop_assert_eq!(plan.return_fire.vs_defending_subs(), ReturnFire::SubsOnly);
        }
    }
}
