// The hero aggregate: identity, core resources and the class payload.
use serde::{Deserialize, Serialize};
use std::fmt;
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::conditions::ActiveCondition;
use crate::items::{BonusStat, EquippedItem, InventoryItem};
use crate::progression;
use crate::summoner::{Circle, SummonerState};

pub const MIN_LEVEL: u8 = 1;
pub const MAX_LEVEL: u8 = 10;
pub const BASE_SPEED: i32 = 5;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, EnumString, AsRefStr,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum ClassKind {
    Censor,
    Conduit,
    Elementalist,
    Fury,
    Null,
    Shadow,
    Summoner,
    Tactician,
    Talent,
    Troubadour,
}

impl fmt::Display for ClassKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassKind::Censor => write!(f, "Censor"),
            ClassKind::Conduit => write!(f, "Conduit"),
            ClassKind::Elementalist => write!(f, "Elementalist"),
            ClassKind::Fury => write!(f, "Fury"),
            ClassKind::Null => write!(f, "Null"),
            ClassKind::Shadow => write!(f, "Shadow"),
            ClassKind::Summoner => write!(f, "Summoner"),
            ClassKind::Tactician => write!(f, "Tactician"),
            ClassKind::Talent => write!(f, "Talent"),
            ClassKind::Troubadour => write!(f, "Troubadour"),
        }
    }
}

impl ClassKind {
    pub fn starting_stamina(self) -> i32 {
        match self {
            ClassKind::Censor | ClassKind::Fury | ClassKind::Null | ClassKind::Tactician => 21,
            ClassKind::Summoner => 15,
            _ => 18,
        }
    }

    pub fn stamina_per_level(self) -> i32 {
        match self {
            ClassKind::Censor | ClassKind::Fury | ClassKind::Null | ClassKind::Tactician => 9,
            _ => 6,
        }
    }

    pub fn starting_recoveries(self) -> i32 {
        match self {
            ClassKind::Censor => 12,
            ClassKind::Fury | ClassKind::Tactician => 10,
            _ => 8,
        }
    }

    pub fn resource_kind(self) -> HeroicResourceKind {
        match self {
            ClassKind::Censor => HeroicResourceKind::Wrath,
            ClassKind::Conduit => HeroicResourceKind::Piety,
            ClassKind::Elementalist | ClassKind::Summoner => HeroicResourceKind::Essence,
            ClassKind::Fury => HeroicResourceKind::Ferocity,
            ClassKind::Null => HeroicResourceKind::Discipline,
            ClassKind::Shadow => HeroicResourceKind::Insight,
            ClassKind::Tactician => HeroicResourceKind::Focus,
            ClassKind::Talent => HeroicResourceKind::Clarity,
            ClassKind::Troubadour => HeroicResourceKind::Drama,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
pub enum HeroicResourceKind {
    Wrath,
    Piety,
    Essence,
    Ferocity,
    Discipline,
    Insight,
    Focus,
    Clarity,
    Drama,
}

// Per-class state. The tag is written next to the hero's own fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "hero_class", rename_all = "lowercase")]
pub enum HeroClass {
    Censor(CensorState),
    Conduit(ConduitState),
    Elementalist(ElementalistState),
    Fury(FuryState),
    Null(NullState),
    Shadow,
    Summoner(SummonerState),
    Tactician(TacticianState),
    Talent(TalentState),
    Troubadour(TroubadourState),
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CensorState {
    pub judged_target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConduitState {
    pub domains: Vec<String>,
    pub prayed_this_turn: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ElementalistState {
    pub persistent_essence: i32, // Essence locked by persistent abilities.
    pub mantle_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct FuryState {
    pub took_damage_this_round: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct NullState {
    pub field_active: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TacticianState {
    pub marked_target: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TalentState {
    pub strained: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct TroubadourState {
    pub scene_partners: Vec<String>,
}

impl HeroClass {
    pub fn new(kind: ClassKind) -> Self {
        match kind {
            ClassKind::Censor => HeroClass::Censor(CensorState::default()),
            ClassKind::Conduit => HeroClass::Conduit(ConduitState::default()),
            ClassKind::Elementalist => HeroClass::Elementalist(ElementalistState::default()),
            ClassKind::Fury => HeroClass::Fury(FuryState::default()),
            ClassKind::Null => HeroClass::Null(NullState::default()),
            ClassKind::Shadow => HeroClass::Shadow,
            ClassKind::Summoner => HeroClass::Summoner(SummonerState::default()),
            ClassKind::Tactician => HeroClass::Tactician(TacticianState::default()),
            ClassKind::Talent => HeroClass::Talent(TalentState::default()),
            ClassKind::Troubadour => HeroClass::Troubadour(TroubadourState::default()),
        }
    }

    pub fn kind(&self) -> ClassKind {
        match self {
            HeroClass::Censor(_) => ClassKind::Censor,
            HeroClass::Conduit(_) => ClassKind::Conduit,
            HeroClass::Elementalist(_) => ClassKind::Elementalist,
            HeroClass::Fury(_) => ClassKind::Fury,
            HeroClass::Null(_) => ClassKind::Null,
            HeroClass::Shadow => ClassKind::Shadow,
            HeroClass::Summoner(_) => ClassKind::Summoner,
            HeroClass::Tactician(_) => ClassKind::Tactician,
            HeroClass::Talent(_) => ClassKind::Talent,
            HeroClass::Troubadour(_) => ClassKind::Troubadour,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, EnumIter, Display)]
pub enum Characteristic {
    Might,
    Agility,
    Reason,
    Intuition,
    Presence,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Characteristics {
    pub might: i32,
    pub agility: i32,
    pub reason: i32,
    pub intuition: i32,
    pub presence: i32,
}

impl Characteristics {
    pub fn get(&self, characteristic: Characteristic) -> i32 {
        match characteristic {
            Characteristic::Might => self.might,
            Characteristic::Agility => self.agility,
            Characteristic::Reason => self.reason,
            Characteristic::Intuition => self.intuition,
            Characteristic::Presence => self.presence,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Stamina {
    pub current: i32, // Goes below zero while dying.
    pub max: i32,
    pub winded: i32, // max / 2
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Recoveries {
    pub current: i32,
    pub max: i32,
    pub value: i32, // Stamina regained per recovery: max stamina / 3.
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HeroicResource {
    pub current: i32,
    pub max_per_turn: Option<i32>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Kit {
    pub name: String,
    pub stamina_bonus: i32,
    pub speed_bonus: i32,
    pub stability_bonus: i32,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum StaminaState {
    Healthy,
    Winded,
    Dying,
    Dead,
}

// The player character. Every view reads and writes this one struct.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hero {
    // Identity
    pub id: String,
    pub name: String,
    pub level: u8, // 1 to 10
    #[serde(flatten)]
    pub class: HeroClass,
    #[serde(default)]
    pub subclass: Option<String>,
    #[serde(default)]
    pub ancestry: String,
    #[serde(default)]
    pub culture: String,
    #[serde(default)]
    pub career: String,

    // Core statistics
    pub characteristics: Characteristics,
    pub stamina: Stamina,
    pub recoveries: Recoveries,
    pub heroic_resource: HeroicResource,
    #[serde(default)]
    pub kit: Option<Kit>,
    #[serde(default = "default_speed")]
    pub speed: i32,
    #[serde(default)]
    pub stability: i32,

    // Counters
    #[serde(default)]
    pub surges: i32,
    #[serde(default)]
    pub hero_tokens: i32,
    #[serde(default)]
    pub victories: i32,
    #[serde(default)]
    pub xp: i32,
    #[serde(default)]
    pub wealth: i32,
    #[serde(default)]
    pub gold: i32,
    #[serde(default)]
    pub renown: i32,

    // Effects and gear
    #[serde(default)]
    pub active_conditions: Vec<ActiveCondition>,
    #[serde(default)]
    pub inventory: Vec<InventoryItem>,
    #[serde(default)]
    pub equipped_items: Vec<EquippedItem>,
    #[serde(default)]
    pub notes: String,
}

fn default_speed() -> i32 {
    BASE_SPEED
}

impl Hero {
    // Constructor for a fresh level 1 hero with full resources.
    pub fn new(name: impl Into<String>, class: HeroClass) -> Self {
        let mut hero = Hero {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            level: MIN_LEVEL,
            class,
            subclass: None,
            ancestry: String::new(),
            culture: String::new(),
            career: String::new(),
            characteristics: Characteristics::default(),
            stamina: Stamina::default(),
            recoveries: Recoveries::default(),
            heroic_resource: HeroicResource::default(),
            kit: None,
            speed: BASE_SPEED,
            stability: 0,
            surges: 0,
            hero_tokens: 0,
            victories: 0,
            xp: 0,
            wealth: 1,
            gold: 0,
            renown: 0,
            active_conditions: Vec::new(),
            inventory: Vec::new(),
            equipped_items: Vec::new(),
            notes: String::new(),
        };
        hero.recalculate();
        hero.stamina.current = hero.stamina.max;
        hero.recoveries.current = hero.recoveries.max;
        hero
    }

    pub fn class_kind(&self) -> ClassKind {
        self.class.kind()
    }

    pub fn heroic_resource_kind(&self) -> HeroicResourceKind {
        self.class_kind().resource_kind()
    }

    /// Lowest value the heroic resource may reach. Talents can strain into
    /// negative clarity down to -(1 + reason).
    pub fn resource_floor(&self) -> i32 {
        match self.class {
            HeroClass::Talent(_) => -(1 + self.characteristics.reason),
            _ => 0,
        }
    }

    pub fn summoner(&self) -> Option<&SummonerState> {
        match &self.class {
            HeroClass::Summoner(state) => Some(state),
            _ => None,
        }
    }

    pub fn summoner_mut(&mut self) -> Option<&mut SummonerState> {
        match &mut self.class {
            HeroClass::Summoner(state) => Some(state),
            _ => None,
        }
    }

    pub fn max_stamina(&self) -> i32 {
        let kind = self.class_kind();
        let kit_bonus = self.kit.as_ref().map_or(0, |kit| kit.stamina_bonus);
        let level = i32::from(self.level);
        let level_bonus = if level >= 2 {
            level * kind.stamina_per_level()
        } else {
            0
        };
        kind.starting_stamina() + kit_bonus + level_bonus + self.equipment_bonus(BonusStat::Stamina)
    }

    pub fn max_recoveries(&self) -> i32 {
        match &self.class {
            HeroClass::Summoner(state) if state.circle == Circle::Spring => {
                ClassKind::Summoner.starting_recoveries() + 2
            }
            class => class.kind().starting_recoveries(),
        }
    }

    // Recompute every derived value from level, class and kit.
    pub fn recalculate(&mut self) {
        self.level = self.level.clamp(MIN_LEVEL, MAX_LEVEL);
        self.stamina.max = self.max_stamina();
        self.stamina.winded = self.stamina.max / 2;
        self.stamina.current = self.stamina.current.min(self.stamina.max);
        self.recoveries.max = self.max_recoveries();
        self.recoveries.value = self.stamina.max / 3;
        self.recoveries.current = self.recoveries.current.clamp(0, self.recoveries.max);
        self.speed = BASE_SPEED
            + self.kit.as_ref().map_or(0, |kit| kit.speed_bonus)
            + self.equipment_bonus(BonusStat::Speed);
        self.stability = self.kit.as_ref().map_or(0, |kit| kit.stability_bonus)
            + self.equipment_bonus(BonusStat::Stability);
    }

    /// Stamina may drop below zero; that is the dying range.
    pub fn deal_damage(&mut self, amount: i32) {
        if amount <= 0 {
            return;
        }
        self.stamina.current -= amount;
        if let HeroClass::Fury(state) = &mut self.class {
            state.took_damage_this_round = true;
        }
    }

    pub fn heal(&mut self, amount: i32) {
        if amount <= 0 {
            return;
        }
        self.stamina.current = (self.stamina.current + amount).min(self.stamina.max);
    }

    /// Spends one recovery and regains its value. False when none are left.
    pub fn use_recovery(&mut self) -> bool {
        if self.recoveries.current <= 0 {
            return false;
        }
        self.recoveries.current -= 1;
        self.heal(self.recoveries.value);
        true
    }

    pub fn restore_recoveries(&mut self) {
        self.recoveries.current = self.recoveries.max;
    }

    pub fn set_level(&mut self, level: u8) {
        self.level = level.clamp(MIN_LEVEL, MAX_LEVEL);
        self.recalculate();
    }

    /// Raises the level by one if the hero has the XP for it.
    pub fn level_up(&mut self) -> bool {
        if !progression::can_level_up(self.level, self.xp) {
            return false;
        }
        let old_max = self.stamina.max;
        self.set_level(self.level + 1);
        // Gained max stamina is gained current stamina too.
        self.stamina.current += self.stamina.max - old_max;
        true
    }

    pub fn stamina_state(&self) -> StaminaState {
        let Stamina {
            current, winded, ..
        } = self.stamina;
        if current <= -winded {
            StaminaState::Dead
        } else if current <= 0 {
            StaminaState::Dying
        } else if current <= winded {
            StaminaState::Winded
        } else {
            StaminaState::Healthy
        }
    }

    /// Converts victories to XP and restores the hero. Summoned squads and the
    /// fixture do not survive a respite.
    pub fn respite(&mut self) {
        self.xp += self.victories;
        self.victories = 0;
        self.stamina.current = self.stamina.max;
        self.recoveries.current = self.recoveries.max;
        self.surges = 0;
        if let Some(summoner) = self.summoner_mut() {
            summoner.active_squads.clear();
            summoner.fixture = None;
        }
        log::info!("{} took a respite (xp now {})", self.name, self.xp);
    }

    // Clears the per-turn and per-round class flags.
    pub fn reset_class_turn_state(&mut self) {
        match &mut self.class {
            HeroClass::Conduit(state) => state.prayed_this_turn = false,
            HeroClass::Fury(state) => state.took_damage_this_round = false,
            _ => {}
        }
    }

    pub fn adjust_heroic_resource(&mut self, delta: i32) {
        self.heroic_resource.current =
            (self.heroic_resource.current + delta).max(self.resource_floor());
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::summoner::Formation;

    fn summoner(level: u8) -> Hero {
        let mut hero = Hero::new("Vex", HeroClass::new(ClassKind::Summoner));
        hero.set_level(level);
        hero.stamina.current = hero.stamina.max;
        hero
    }

    #[test]
    fn summoner_stamina_follows_level_and_kit() {
        assert_eq!(summoner(1).stamina.max, 15);
        assert_eq!(summoner(2).stamina.max, 27);

        let mut hero = summoner(5);
        hero.kit = Some(Kit {
            name: "Wand".into(),
            stamina_bonus: 6,
            speed_bonus: 2,
            stability_bonus: 1,
        });
        hero.recalculate();
        assert_eq!(hero.stamina.max, 15 + 6 + 30);
        assert_eq!(hero.stamina.winded, 25);
        assert_eq!(hero.recoveries.value, 17);
        assert_eq!(hero.speed, 7);
        assert_eq!(hero.stability, 1);
    }

    #[test]
    fn class_table_drives_fresh_heroes() {
        let censor = Hero::new("Ardent", HeroClass::new(ClassKind::Censor));
        assert_eq!(censor.stamina.max, 21);
        assert_eq!(censor.stamina.current, 21);
        assert_eq!(censor.recoveries.max, 12);
        assert_eq!(censor.heroic_resource_kind(), HeroicResourceKind::Wrath);

        let talent = Hero::new("Mira", HeroClass::new(ClassKind::Talent));
        assert_eq!(talent.heroic_resource_kind(), HeroicResourceKind::Clarity);
        assert_eq!(talent.resource_floor(), -1);
    }

    #[test]
    fn spring_circle_adds_recoveries() {
        let mut hero = summoner(1);
        if let Some(state) = hero.summoner_mut() {
            state.circle = Circle::Spring;
            state.formation = Formation::Horde;
        }
        hero.recalculate();
        assert_eq!(hero.recoveries.max, 10);
    }

    #[test]
    fn damage_may_go_negative_but_heal_is_clamped() {
        let mut hero = summoner(1);
        hero.deal_damage(20);
        assert_eq!(hero.stamina.current, -5);
        assert_eq!(hero.stamina_state(), StaminaState::Dying);
        hero.heal(100);
        assert_eq!(hero.stamina.current, hero.stamina.max);
        assert_eq!(hero.stamina_state(), StaminaState::Healthy);
    }

    #[test]
    fn stamina_states_cover_the_whole_range() {
        let mut hero = summoner(1); // max 15, winded 7
        hero.stamina.current = 8;
        assert_eq!(hero.stamina_state(), StaminaState::Healthy);
        hero.stamina.current = 7;
        assert_eq!(hero.stamina_state(), StaminaState::Winded);
        hero.stamina.current = 0;
        assert_eq!(hero.stamina_state(), StaminaState::Dying);
        hero.stamina.current = -6;
        assert_eq!(hero.stamina_state(), StaminaState::Dying);
        hero.stamina.current = -7;
        assert_eq!(hero.stamina_state(), StaminaState::Dead);
    }

    #[test]
    fn recoveries_heal_by_their_value() {
        let mut hero = summoner(2); // max 27, value 9
        hero.deal_damage(20);
        assert!(hero.use_recovery());
        assert_eq!(hero.stamina.current, 16);
        assert_eq!(hero.recoveries.current, hero.recoveries.max - 1);

        hero.recoveries.current = 0;
        assert!(!hero.use_recovery());
        hero.restore_recoveries();
        assert_eq!(hero.recoveries.current, 8);
    }

    #[test]
    fn respite_converts_victories() {
        let mut hero = summoner(1);
        hero.victories = 3;
        hero.xp = 2;
        hero.surges = 2;
        hero.deal_damage(10);
        hero.recoveries.current = 1;
        hero.respite();
        assert_eq!(hero.xp, 5);
        assert_eq!(hero.victories, 0);
        assert_eq!(hero.surges, 0);
        assert_eq!(hero.stamina.current, hero.stamina.max);
        assert_eq!(hero.recoveries.current, hero.recoveries.max);
    }

    #[test]
    fn level_up_requires_xp() {
        let mut hero = summoner(1);
        assert!(!hero.level_up());
        hero.xp = 3;
        assert!(hero.level_up());
        assert_eq!(hero.level, 2);
        assert_eq!(hero.stamina.max, 27);
        assert_eq!(hero.stamina.current, 27);
    }

    #[test]
    fn talent_clarity_can_strain_below_zero() {
        let mut hero = Hero::new("Mira", HeroClass::new(ClassKind::Talent));
        hero.characteristics.reason = 2;
        hero.adjust_heroic_resource(-10);
        assert_eq!(hero.heroic_resource.current, -3);

        let mut shadow = Hero::new("Nyx", HeroClass::Shadow);
        shadow.adjust_heroic_resource(-4);
        assert_eq!(shadow.heroic_resource.current, 0);
    }

    #[test]
    fn class_tag_is_written_next_to_hero_fields() {
        let hero = summoner(3);
        let value = serde_json::to_value(&hero).unwrap();
        assert_eq!(value["hero_class"], "summoner");
        assert_eq!(value["formation"], "platoon");
        let back: Hero = serde_json::from_value(value).unwrap();
        assert_eq!(back, hero);

        let shadow = Hero::new("Nyx", HeroClass::Shadow);
        let back: Hero = serde_json::from_str(&serde_json::to_string(&shadow).unwrap()).unwrap();
        assert_eq!(back.class, HeroClass::Shadow);
    }
}
