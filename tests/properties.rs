// ../tests/properties.rs
//! Invariants that must hold for any input:
//! - hero and squad stamina never climb past their maximum
//! - minion deaths follow the cumulative stamina thresholds and never reverse
//! - essence can't be overspent
//! - the minion death bonus pays once per round
//! - exported heroes import unchanged

use mettle_ratatui::essence::EssenceEconomy;
use mettle_ratatui::save::{export_character, import_character_from_json, sanitize_filename};
use mettle_ratatui::squads::{self, create_squad};
use mettle_ratatui::summoner::{Formation, find_template};
use mettle_ratatui::*;
use proptest::prelude::*;

fn summoner(level: u8) -> Hero {
    let mut hero = Hero::new("Vex", HeroClass::new(ClassKind::Summoner));
    hero.set_level(level);
    hero.stamina.current = hero.stamina.max;
    hero
}

proptest! {
    #[test]
    fn healing_never_exceeds_max(
        level in 1u8..=10,
        hits in prop::collection::vec((any::<bool>(), 0i32..40), 0..30),
    ) {
        let mut hero = summoner(level);
        for (is_damage, amount) in hits {
            if is_damage {
                hero.deal_damage(amount);
            } else {
                hero.heal(amount);
            }
            prop_assert!(hero.stamina.current <= hero.stamina.max);
        }
    }

    #[test]
    fn squad_healing_never_exceeds_max(
        damage in 0i32..30,
        heals in prop::collection::vec(0i32..20, 1..10),
    ) {
        let mut hero = summoner(5);
        let template = find_template("demon_hulking_chimor").unwrap();
        let squad = create_squad(template, Formation::Platoon, 5);
        let id = squad.id.clone();
        squads::add_squad(&mut hero, squad);
        squads::damage_squad(&mut hero, &id, damage);
        for amount in heals {
            squads::heal_squad(&mut hero, &id, amount);
            if let Some(squad) = hero.summoner().unwrap().squad(&id) {
                prop_assert!(squad.current_stamina <= squad.max_stamina);
            }
        }
    }

    #[test]
    fn minion_deaths_follow_thresholds(
        level in 1u8..=10,
        hits in prop::collection::vec(0i32..12, 1..12),
    ) {
        let mut hero = summoner(level);
        let template = find_template("demon_gushing_spewler").unwrap();
        let squad = create_squad(template, Formation::Platoon, level);
        let id = squad.id.clone();
        let thresholds: Vec<i32> = squad
            .members
            .iter()
            .scan(0, |sum, m| {
                *sum += m.max_stamina;
                Some(*sum)
            })
            .collect();
        squads::add_squad(&mut hero, squad);

        let mut dealt = 0;
        let mut dead_before = 0;
        for amount in hits {
            squads::damage_squad(&mut hero, &id, amount);
            dealt += amount;
            let Some(squad) = hero.summoner().unwrap().squad(&id) else {
                // Wiped out: every threshold was crossed.
                prop_assert!(dealt >= *thresholds.last().unwrap());
                break;
            };
            let dead = squad.members.len() - squad.alive_count();
            let expected = thresholds.iter().filter(|t| dealt >= **t).count();
            prop_assert_eq!(dead, expected);
            prop_assert!(dead >= dead_before);
            prop_assert!(squad.current_stamina >= 0);
            dead_before = dead;
        }
    }

    #[test]
    fn essence_is_never_overspent(
        start in 0i32..10,
        spends in prop::collection::vec(-2i32..8, 0..20),
    ) {
        let mut hero = summoner(1);
        hero.heroic_resource.current = start;
        let mut economy = EssenceEconomy::new();
        for amount in spends {
            let before = hero.heroic_resource.current;
            let spent = economy.spend_essence(&mut hero, amount);
            prop_assert!(hero.heroic_resource.current >= 0);
            if spent {
                prop_assert_eq!(hero.heroic_resource.current, before - amount);
            } else {
                prop_assert_eq!(hero.heroic_resource.current, before);
            }
        }
    }

    #[test]
    fn death_bonus_pays_once_per_round(deaths in 1usize..6, rounds in 1usize..4) {
        let mut hero = summoner(1);
        let mut economy = EssenceEconomy::new();
        economy.start_combat(&mut hero);
        let mut paid = 0;
        for round in 0..rounds {
            if round > 0 {
                economy.start_new_turn(&mut hero);
            }
            for _ in 0..deaths {
                if economy.on_minion_death(&mut hero) {
                    paid += 1;
                }
            }
        }
        prop_assert_eq!(paid, rounds);
    }

    #[test]
    fn exported_heroes_import_unchanged(
        name in "[A-Za-z][A-Za-z '-]{0,30}",
        level in 1u8..=10,
        victories in 0i32..20,
    ) {
        let mut hero = summoner(level);
        hero.name = name;
        hero.victories = victories;
        hero.add_condition(
            ConditionId::Frightened,
            Some("goblin-1".into()),
            Some("Goblin".into()),
            None,
        );

        let json = export_character(&hero).unwrap();
        let validation = import_character_from_json(&json);
        prop_assert!(validation.valid, "{:?}", validation.errors);
        prop_assert!(validation.warnings.is_empty());
        prop_assert_eq!(validation.hero, Some(hero));
    }

    #[test]
    fn filenames_are_safe(name in ".{0,80}") {
        let file = sanitize_filename(&name);
        prop_assert!(!file.is_empty());
        prop_assert!(file.chars().count() <= 50);
        prop_assert!(
            file.chars()
                .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '-')
        );
        prop_assert!(!file.starts_with('-') && !file.ends_with('-'));
    }
}
