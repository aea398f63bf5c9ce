// Summoner data: formations, circles, portfolios and the numbers derived from them.
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::squads::Squad;

pub const MAX_SQUADS: usize = 2;
pub const MAX_SQUAD_SIZE: usize = 8;
pub const BASE_MAX_MINIONS: usize = 8;
pub const FIXTURE_UNLOCK_LEVEL: u8 = 2;
pub const FIXTURE_BASE_STAMINA: i32 = 20;
pub const CHAMPION_UNLOCK_LEVEL: u8 = 8;
pub const SIGNATURE_COST: u32 = 1;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Formation {
    Horde,
    #[default]
    Platoon,
    Elite,
    Leader,
}

impl Formation {
    pub fn description(self) -> &'static str {
        match self {
            Formation::Horde => "Up to 12 minions and one more free minion each turn.",
            Formation::Platoon => "Squad damage abilities deal +Reason damage to one target.",
            Formation::Elite => "Minions gain +3 Stamina and +1 to every characteristic.",
            Formation::Leader => "No overflow damage when a squad is wiped out.",
        }
    }
}

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize, EnumIter, Display,
)]
#[serde(rename_all = "lowercase")]
pub enum Circle {
    #[default]
    Blight,
    Graves,
    Spring,
    Storms,
}

impl Circle {
    pub fn portfolio_type(self) -> PortfolioType {
        match self {
            Circle::Blight => PortfolioType::Demon,
            Circle::Graves => PortfolioType::Undead,
            Circle::Spring => PortfolioType::Fey,
            Circle::Storms => PortfolioType::Elemental,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
#[serde(rename_all = "lowercase")]
pub enum PortfolioType {
    Demon,
    Elemental,
    Fey,
    Undead,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum MinionRole {
    Artillery,
    Ambusher,
    Brute,
    Controller,
    Defender,
    Harrier,
    Hexer,
    Support,
}

#[derive(Debug, PartialEq, Eq)]
pub struct MinionTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub essence_cost: u32, // 1, 3, 5 or 7
    pub minions_per_summon: usize,
    pub size: &'static str,
    pub speed: i32,
    pub stamina: &'static [i32], // One entry, or one per member.
    pub stability: i32,
    pub free_strike: i32,
    pub role: MinionRole,
}

impl MinionTemplate {
    pub fn is_signature(&self) -> bool {
        self.essence_cost == SIGNATURE_COST
    }

    /// Stamina of the member at `index`, falling back to the first entry.
    pub fn base_stamina(&self, index: usize) -> i32 {
        self.stamina
            .get(index)
            .or_else(|| self.stamina.first())
            .copied()
            .unwrap_or(0)
    }
}

#[derive(Debug, PartialEq, Eq)]
pub struct FixtureTemplate {
    pub id: &'static str,
    pub name: &'static str,
    pub role: &'static str,
    pub base_stamina: i32,
}

#[derive(Debug)]
pub struct Portfolio {
    pub kind: PortfolioType,
    pub signature: &'static [MinionTemplate],
    pub unlocked: &'static [MinionTemplate],
    pub fixture: FixtureTemplate,
}

impl Portfolio {
    pub fn templates(&self) -> impl Iterator<Item = &'static MinionTemplate> {
        self.signature.iter().chain(self.unlocked.iter())
    }

    pub fn find(&self, template_id: &str) -> Option<&'static MinionTemplate> {
        self.templates().find(|t| t.id == template_id)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FixtureState {
    pub template_id: String,
    pub current_stamina: i32,
    pub is_active: bool,
}

// Summoner-only hero state.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SummonerState {
    pub formation: Formation,
    pub circle: Circle,
    pub active_squads: Vec<Squad>,
    pub fixture: Option<FixtureState>,
}

impl SummonerState {
    pub fn portfolio(&self) -> &'static Portfolio {
        portfolio(self.circle.portfolio_type())
    }

    pub fn squad(&self, squad_id: &str) -> Option<&Squad> {
        self.active_squads.iter().find(|s| s.id == squad_id)
    }

    pub fn squad_mut(&mut self, squad_id: &str) -> Option<&mut Squad> {
        self.active_squads.iter_mut().find(|s| s.id == squad_id)
    }

    pub fn fixture_active(&self) -> bool {
        self.fixture.as_ref().is_some_and(|f| f.is_active)
    }
}

macro_rules! minion {
    ($id:literal, $name:literal, $cost:literal, $per:literal, $size:literal, $speed:literal, [$($stamina:literal),+], $stability:literal, $strike:literal, $role:ident) => {
        MinionTemplate {
            id: $id,
            name: $name,
            essence_cost: $cost,
            minions_per_summon: $per,
            size: $size,
            speed: $speed,
            stamina: &[$($stamina),+],
            stability: $stability,
            free_strike: $strike,
            role: MinionRole::$role,
        }
    };
}

#[rustfmt::skip]
static DEMON: Portfolio = Portfolio {
    kind: PortfolioType::Demon,
    signature: &[
        minion!("demon_ensnarer", "Ensnarer", 1, 1, "1M", 5, [2], 0, 2, Brute),
        minion!("demon_rasquine", "Rasquine", 1, 1, "1S", 4, [2], 0, 2, Ambusher),
        minion!("demon_razor", "Razor", 1, 1, "1M", 6, [2], 0, 1, Harrier),
    ],
    unlocked: &[
        minion!("demon_archer_spittlich", "Archer Spittlich", 3, 2, "1S", 5, [5], 2, 5, Artillery),
        minion!("demon_fanged_musilex", "Fanged Musilex", 3, 2, "1L", 6, [6], 1, 5, Brute),
        minion!("demon_twisted_bengrul", "Twisted Bengrul", 3, 2, "1L", 5, [5], 1, 4, Hexer),
        minion!("demon_gushing_spewler", "Gushing Spewler", 5, 3, "1M", 5, [4, 4, 4], 0, 3, Controller),
        minion!("demon_hulking_chimor", "Hulking Chimor", 5, 3, "2", 5, [7, 7, 7], 3, 3, Defender),
        minion!("demon_violent", "Violent", 5, 3, "1M", 7, [5, 5, 5], 1, 4, Ambusher),
        minion!("demon_faded_blightling", "Faded Blightling", 7, 2, "1L", 5, [17, 17], 0, 7, Support),
        minion!("demon_gorrre", "Gorrre", 7, 2, "2", 5, [17, 17], 2, 8, Brute),
        minion!("demon_vicisittante", "Vicisittante", 7, 2, "2", 10, [17, 17], 0, 7, Harrier),
    ],
    fixture: FixtureTemplate {
        id: "fixture_the_boil",
        name: "The Boil",
        role: "Hazard Support",
        base_stamina: FIXTURE_BASE_STAMINA,
    },
};

#[rustfmt::skip]
static ELEMENTAL: Portfolio = Portfolio {
    kind: PortfolioType::Elemental,
    signature: &[
        minion!("elemental_fire_plume", "Fire Plume", 1, 1, "1T", 5, [1], 0, 2, Artillery),
        minion!("elemental_walking_boulder", "Walking Boulder", 1, 1, "2", 4, [3], 0, 1, Defender),
    ],
    unlocked: &[
        minion!("elemental_crux_of_ash", "Crux of Ash", 3, 2, "1M", 5, [6], 0, 5, Ambusher),
        minion!("elemental_flow_of_magma", "Flow of Magma", 3, 2, "1L", 5, [6], 2, 4, Harrier),
        minion!("elemental_desolation_of_sand", "Desolation of Sand", 3, 2, "1M", 5, [5], 1, 4, Hexer),
        minion!("elemental_dancing_silk", "Dancing Silk", 5, 3, "1T", 5, [4], 0, 3, Controller),
        minion!("elemental_principle_of_the_swamp", "Principle of the Swamp", 5, 3, "2", 4, [5], 0, 4, Brute),
        minion!("elemental_quiet_of_snow", "Quiet of Snow", 5, 3, "1S", 5, [4], 1, 4, Artillery),
        minion!("elemental_iron_reaver", "Iron Reaver", 7, 3, "1L", 6, [10], 0, 6, Harrier),
        minion!("elemental_knight_of_blood", "Knight of Blood", 7, 2, "1L", 6, [16], 0, 7, Controller),
        minion!("elemental_light_of_the_sun", "Light of the Sun", 7, 2, "2", 6, [17], 0, 7, Support),
    ],
    fixture: FixtureTemplate {
        id: "fixture_primordial_crystal",
        name: "Primordial Crystal",
        role: "Relic Artillery",
        base_stamina: FIXTURE_BASE_STAMINA,
    },
};

#[rustfmt::skip]
static FEY: Portfolio = Portfolio {
    kind: PortfolioType::Fey,
    signature: &[
        minion!("fey_nixie_soakreed", "Nixie Soakreed", 1, 1, "1T", 5, [1], 0, 1, Controller),
        minion!("fey_pixie_bellringer", "Pixie Bellringer", 1, 1, "1T", 5, [2], 0, 1, Support),
        minion!("fey_sprite_dandeknight", "Sprite Dandeknight", 1, 1, "1T", 6, [2], 0, 1, Harrier),
    ],
    unlocked: &[
        minion!("fey_pixie_hydrain", "Pixie Hydrain", 3, 2, "1T", 5, [5], 0, 5, Artillery),
        minion!("fey_sprite_orchiguard", "Sprite Orchiguard", 3, 2, "1S", 6, [8], 2, 4, Defender),
        minion!("fey_pixie_loftlilly", "Pixie Loftlilly", 3, 2, "1T", 5, [5], 0, 4, Controller),
        minion!("fey_nixie_hemloche", "Nixie Hemloche", 5, 3, "1T", 6, [4, 4, 4], 0, 3, Hexer),
        minion!("fey_pixie_rosenthall", "Pixie Rosenthall", 5, 3, "2", 6, [5, 5, 5], 1, 3, Harrier),
        minion!("fey_sprite_foxglow", "Sprite Foxglow", 5, 3, "1T", 8, [5, 5, 5], 0, 4, Ambusher),
        minion!("fey_nixie_corallia", "Nixie Corallia", 7, 2, "1T", 6, [17, 17], 0, 7, Support),
        minion!("fey_pixie_belladonix", "Pixie Belladonix", 7, 2, "1T", 6, [16, 16], 0, 8, Artillery),
        minion!("fey_sprite_olyender", "Sprite Olyender", 7, 2, "1T", 6, [17, 17], 0, 8, Brute),
    ],
    fixture: FixtureTemplate {
        id: "fixture_glade_pond",
        name: "Glade Pond",
        role: "Hazard Ambusher",
        base_stamina: FIXTURE_BASE_STAMINA,
    },
};

#[rustfmt::skip]
static UNDEAD: Portfolio = Portfolio {
    kind: PortfolioType::Undead,
    signature: &[
        minion!("undead_husk", "Husk", 1, 1, "1M", 5, [2], 0, 2, Defender),
        minion!("undead_skeleton", "Skeleton", 1, 1, "1M", 6, [2], 0, 2, Harrier),
        minion!("undead_shrieker", "Shrieker", 1, 1, "1M", 4, [1], 0, 2, Artillery),
    ],
    unlocked: &[
        minion!("undead_grave_knight", "Grave Knight", 3, 2, "1M", 5, [6], 1, 4, Brute),
        minion!("undead_stalker_shade", "Stalker Shade", 3, 2, "1M", 6, [5], 0, 3, Ambusher),
        minion!("undead_zombie_lumberer", "Zombie Lumberer", 3, 2, "2", 4, [8], 2, 4, Defender),
        minion!("undead_accursed_mummy", "Accursed Mummy", 5, 3, "1M", 5, [6, 6, 6], 1, 4, Hexer),
        minion!("undead_phase_ghoul", "Phase Ghoul", 5, 3, "1M", 7, [5, 5, 5], 0, 4, Harrier),
        minion!("undead_ceaseless_mournling", "Ceaseless Mournling", 5, 3, "2", 5, [5, 5, 5], 1, 3, Controller),
        minion!("undead_false_vampire", "False Vampire", 7, 2, "1L", 6, [17, 17], 1, 7, Brute),
        minion!("undead_zombie_titan", "Zombie Titan", 7, 1, "4", 4, [40], 4, 8, Defender),
        minion!("undead_phantom_ripper", "Phantom of the Ripper", 7, 2, "1M", 8, [17, 17], 0, 6, Ambusher),
    ],
    fixture: FixtureTemplate {
        id: "fixture_barrow_gates",
        name: "Barrow Gates",
        role: "Fortification Defender",
        base_stamina: FIXTURE_BASE_STAMINA,
    },
};

pub fn portfolio(kind: PortfolioType) -> &'static Portfolio {
    match kind {
        PortfolioType::Demon => &DEMON,
        PortfolioType::Elemental => &ELEMENTAL,
        PortfolioType::Fey => &FEY,
        PortfolioType::Undead => &UNDEAD,
    }
}

/// Looks a template up across every portfolio.
pub fn find_template(template_id: &str) -> Option<&'static MinionTemplate> {
    [&DEMON, &ELEMENTAL, &FEY, &UNDEAD]
        .into_iter()
        .find_map(|p| p.find(template_id))
}

// Formulas

pub fn essence_per_turn(_level: u8) -> i32 {
    2
}

pub fn minion_death_essence(_level: u8) -> i32 {
    1
}

/// Elite trims one essence off summons that cost 5 or more.
pub fn essence_cost(base_cost: u32, formation: Formation) -> u32 {
    if formation == Formation::Elite && base_cost >= 5 {
        (base_cost - 1).max(1)
    } else {
        base_cost
    }
}

pub fn max_minions(formation: Formation, level: u8) -> usize {
    let level_steps = [4, 7, 10].iter().filter(|l| level >= **l).count();
    let horde = usize::from(formation == Formation::Horde);
    BASE_MAX_MINIONS + 4 * (level_steps + horde)
}

pub fn signature_minions_per_turn(formation: Formation, level: u8) -> usize {
    3 + usize::from(level >= 7) + usize::from(formation == Formation::Horde)
}

pub fn combat_start_minions(level: u8, victories: i32) -> usize {
    if level >= 10 {
        2 + 2 * (victories.max(0) as usize / 2)
    } else {
        2
    }
}

/// Extra stamina each minion gets from the summoner's level.
pub fn minion_level_bonus(essence_cost: u32, level: u8) -> i32 {
    let (per_step, steps): (i32, &[u8]) = match essence_cost {
        1 => (1, &[4, 7, 10]),
        3 => (3, &[4, 7, 10]),
        5 => (2, &[4, 7, 10]),
        7 => (5, &[7, 10]),
        _ => (0, &[]),
    };
    per_step * steps.iter().filter(|l| level >= **l).count() as i32
}

pub fn minion_bonus_stamina(formation: Formation) -> i32 {
    if formation == Formation::Elite { 3 } else { 0 }
}

pub fn minion_characteristic_bonus(formation: Formation) -> i32 {
    if formation == Formation::Elite { 1 } else { 0 }
}

pub fn minion_free_strike_bonus(formation: Formation) -> i32 {
    if formation == Formation::Platoon { 1 } else { 0 }
}

pub fn summoner_range(reason: i32) -> i32 {
    5 + reason
}

pub fn fixture_unlocked(level: u8) -> bool {
    level >= FIXTURE_UNLOCK_LEVEL
}

pub fn fixture_stamina(level: u8) -> i32 {
    FIXTURE_BASE_STAMINA + i32::from(level)
}

pub fn fixture_size(level: u8) -> u8 {
    if level >= 9 { 3 } else { 2 }
}

pub fn champion_unlocked(level: u8) -> bool {
    level >= CHAMPION_UNLOCK_LEVEL
}

pub fn champion_action_unlocked(level: u8) -> bool {
    level >= 10
}

/// Before level 10 each sacrificed minion is worth one essence; from level 10
/// it is worth its own essence cost.
pub fn sacrifice_cost_reduction(essence_values: &[u32], level: u8) -> u32 {
    if level >= 10 {
        essence_values.iter().sum()
    } else {
        essence_values.len() as u32
    }
}

/// Out of combat a summon is paid for with victories.
pub fn can_summon_out_of_combat(template: &MinionTemplate, victories: i32) -> bool {
    template.is_signature() || victories >= template.essence_cost as i32
}

#[cfg(test)]
mod tests {
    use super::*;
    use strum::IntoEnumIterator;

    #[test]
    fn circles_pick_portfolios() {
        assert_eq!(Circle::Blight.portfolio_type(), PortfolioType::Demon);
        assert_eq!(Circle::Graves.portfolio_type(), PortfolioType::Undead);
        assert_eq!(Circle::Spring.portfolio_type(), PortfolioType::Fey);
        assert_eq!(Circle::Storms.portfolio_type(), PortfolioType::Elemental);
    }

    #[test]
    fn every_portfolio_is_well_formed() {
        for kind in PortfolioType::iter() {
            let portfolio = portfolio(kind);
            assert_eq!(portfolio.kind, kind);
            assert!(portfolio.signature.iter().all(|t| t.is_signature()));
            assert_eq!(portfolio.unlocked.len(), 9);
            assert!(portfolio.unlocked.iter().all(|t| !t.is_signature()));
            assert_eq!(portfolio.fixture.base_stamina, 20);
            for template in portfolio.templates() {
                assert!(!template.stamina.is_empty(), "{}", template.id);
                assert_eq!(find_template(template.id), Some(template));
            }
        }
        assert!(find_template("nope").is_none());
    }

    #[test]
    fn member_stamina_falls_back_to_first_entry() {
        let titan = find_template("undead_zombie_titan").unwrap();
        assert_eq!(titan.base_stamina(0), 40);
        let reaver = find_template("elemental_iron_reaver").unwrap();
        assert_eq!(reaver.minions_per_summon, 3);
        assert_eq!(reaver.base_stamina(2), 10);
    }

    #[test]
    fn elite_discounts_expensive_summons() {
        assert_eq!(essence_cost(1, Formation::Elite), 1);
        assert_eq!(essence_cost(3, Formation::Elite), 3);
        assert_eq!(essence_cost(5, Formation::Elite), 4);
        assert_eq!(essence_cost(7, Formation::Elite), 6);
        assert_eq!(essence_cost(7, Formation::Horde), 7);
    }

    #[test]
    fn minion_caps_grow_with_level_and_horde() {
        assert_eq!(max_minions(Formation::Platoon, 1), 8);
        assert_eq!(max_minions(Formation::Horde, 1), 12);
        assert_eq!(max_minions(Formation::Platoon, 4), 12);
        assert_eq!(max_minions(Formation::Platoon, 7), 16);
        assert_eq!(max_minions(Formation::Horde, 10), 24);
    }

    #[test]
    fn free_minion_counts() {
        assert_eq!(signature_minions_per_turn(Formation::Platoon, 1), 3);
        assert_eq!(signature_minions_per_turn(Formation::Platoon, 7), 4);
        assert_eq!(signature_minions_per_turn(Formation::Horde, 7), 5);
        assert_eq!(combat_start_minions(3, 9), 2);
        assert_eq!(combat_start_minions(10, 5), 6);
        assert_eq!(combat_start_minions(10, 1), 2);
    }

    #[test]
    fn level_bonus_by_cost() {
        assert_eq!(minion_level_bonus(1, 3), 0);
        assert_eq!(minion_level_bonus(1, 4), 1);
        assert_eq!(minion_level_bonus(1, 10), 3);
        assert_eq!(minion_level_bonus(3, 7), 6);
        assert_eq!(minion_level_bonus(5, 10), 6);
        assert_eq!(minion_level_bonus(7, 6), 0);
        assert_eq!(minion_level_bonus(7, 7), 5);
        assert_eq!(minion_level_bonus(7, 10), 10);
    }

    #[test]
    fn fixture_and_champion_unlocks() {
        assert!(!fixture_unlocked(1));
        assert!(fixture_unlocked(2));
        assert_eq!(fixture_stamina(4), 24);
        assert_eq!(fixture_size(8), 2);
        assert_eq!(fixture_size(9), 3);
        assert!(!champion_unlocked(7));
        assert!(champion_unlocked(8));
        assert!(champion_action_unlocked(10));
    }

    #[test]
    fn sacrifice_value_changes_at_level_ten() {
        assert_eq!(sacrifice_cost_reduction(&[1, 3, 5], 9), 3);
        assert_eq!(sacrifice_cost_reduction(&[1, 3, 5], 10), 9);
    }

    #[test]
    fn out_of_combat_summons_use_victories() {
        let husk = find_template("undead_husk").unwrap();
        let knight = find_template("undead_grave_knight").unwrap();
        assert!(can_summon_out_of_combat(husk, 0));
        assert!(!can_summon_out_of_combat(knight, 2));
        assert!(can_summon_out_of_combat(knight, 3));
        assert_eq!(summoner_range(2), 7);
        assert_eq!(minion_free_strike_bonus(Formation::Platoon), 1);
        assert_eq!(minion_characteristic_bonus(Formation::Elite), 1);
    }
}
