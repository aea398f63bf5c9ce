// Magic items: the built-in catalog, user-made items and the hero's gear.
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use strum_macros::{Display, EnumIter};
use uuid::Uuid;

use crate::error::StorageError;
use crate::save::StorageQuota;
use crate::hero::Hero;

pub const CUSTOM_ITEMS_FILE: &str = "custom_items.json";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
#[serde(rename_all = "lowercase")]
pub enum ItemCategory {
    Consumable,
    Trinket,
    Leveled,
    Artifact,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumIter, Display)]
#[serde(rename_all = "lowercase")]
pub enum EquipmentSlot {
    Head,
    Neck,
    Armor,
    Arms,
    Hands,
    Waist,
    Feet,
    Ring,
    Weapon,
    Implement,
    Held,
    Mount,
}

impl EquipmentSlot {
    // Rings come in pairs, everything else is one per slot.
    pub fn capacity(self) -> usize {
        match self {
            EquipmentSlot::Ring => 2,
            _ => 1,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "camelCase")]
pub enum BonusStat {
    Stamina,
    Stability,
    Speed,
    Damage,
    #[strum(serialize = "Saving Throw")]
    SavingThrow,
    #[strum(serialize = "Distance")]
    RangeDistance,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemBonus {
    pub stat: BonusStat,
    pub value: i32,
}

/// One enhancement tier of a leveled treasure.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Enhancement {
    pub level: u8,
    pub effect: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MagicItem {
    pub id: &'static str,
    pub name: &'static str,
    pub category: ItemCategory,
    pub echelon: u8,
    pub slot: Option<EquipmentSlot>,
    pub project_goal: Option<u32>,
    pub effect: &'static str,
    pub enhancements: &'static [Enhancement],
}

macro_rules! item {
    ($id:literal, $name:literal, $category:ident, $echelon:literal, $slot:expr, $goal:expr, $effect:literal) => {
        item!($id, $name, $category, $echelon, $slot, $goal, $effect, &[])
    };
    ($id:literal, $name:literal, $category:ident, $echelon:literal, $slot:expr, $goal:expr, $effect:literal, $enh:expr) => {
        MagicItem {
            id: $id,
            name: $name,
            category: ItemCategory::$category,
            echelon: $echelon,
            slot: $slot,
            project_goal: $goal,
            effect: $effect,
            enhancements: $enh,
        }
    };
}

const fn tier(level: u8, effect: &'static str) -> Enhancement {
    Enhancement { level, effect }
}

use EquipmentSlot as S;

#[rustfmt::skip]
pub static CATALOG: &[MagicItem] = &[
    // Consumables
    item!("healing-potion", "Healing Potion", Consumable, 1, None, Some(45),
        "Maneuver, regain Stamina (Recovery Value) without spending a Recovery."),
    item!("buzz-balm", "Buzz Balm", Consumable, 1, None, Some(45),
        "Maneuver, regain Stamina equal to Recovery Value and end one condition."),
    item!("black-ash-dart", "Black Ash Dart", Consumable, 1, None, Some(45),
        "Thrown. 2d6 fire damage and teleport the target up to 3 squares."),
    item!("growth-potion", "Growth Potion", Consumable, 1, None, Some(45),
        "Maneuver, size +1 and +1 Stability until end of encounter."),
    item!("breath-of-dawn", "Breath of Dawn", Consumable, 2, None, Some(90),
        "Maneuver, regain Stamina equal to twice Recovery Value."),
    item!("blood-essence-vial", "Blood Essence Vial", Consumable, 2, None, Some(90),
        "Store a creature's blood. Gain an edge on tests against it."),
    item!("elixir-of-saint-elspeth", "Elixir of Saint Elspeth", Consumable, 3, None, Some(180),
        "Regain all Stamina and Recoveries. +1 bonus to saving throws until end of encounter."),
    item!("page-from-the-infinite-library", "Page from the Infinite Library", Consumable, 4, None, Some(360),
        "Learn one ability of your choice until your next respite."),
    // Trinkets
    item!("hellcharger-helm", "Hellcharger Helm", Trinket, 1, Some(S::Head), None,
        "Charge deals +2 damage and pushes the target 1 square."),
    item!("color-cloak", "Color Cloak", Trinket, 1, Some(S::Neck), None,
        "Triggered action: gain damage immunity 5 to one element."),
    item!("gecko-gloves", "Gecko Gloves", Trinket, 1, Some(S::Hands), None,
        "Climb speed equal to speed. Hang from ceilings."),
    item!("unbinder-boots", "Unbinder Boots", Trinket, 1, Some(S::Feet), None,
        "+1 speed. End grabbed or restrained as a free maneuver once per round."),
    item!("bastion-belt", "Bastion Belt", Trinket, 2, Some(S::Waist), None,
        "+3 Stamina, +1 Stability."),
    item!("lightning-treads", "Lightning Treads", Trinket, 2, Some(S::Feet), None,
        "+2 speed. Unarmed strikes deal +1 lightning damage."),
    item!("shifting-ring", "Shifting Ring", Trinket, 3, Some(S::Ring), None,
        "Maneuver, teleport up to 3 squares once per round."),
    item!("mask-of-the-many", "Mask of the Many", Trinket, 3, Some(S::Head), None,
        "Take on the appearance of any humanoid you have seen."),
    item!("warbanner-wrath", "Warbanner of Wrath", Trinket, 4, Some(S::Held), None,
        "Regain 1 Recovery EoE. Strike damage boost based on Recoveries remaining."),
    // Leveled treasures
    item!("adaptive-second-skin", "Adaptive Second Skin of Toxins", Leveled, 1, Some(S::Armor), None,
        "Stamina bonus (+6/+12/+21). Acid/Poison Immunity (Level).",
        &[
            tier(1, "+6 Stamina. Acid/Poison Immunity equal to level."),
            tier(5, "+12 Stamina. Creatures adjacent to you take acid damage."),
            tier(9, "+21 Stamina. Create poison gas cloud as action."),
        ]),
    item!("chain-sea-sky", "Chain of the Sea and Sky", Leveled, 1, Some(S::Armor), None,
        "Stamina bonus. Swim/Water Breathing. Glide and Cold Immunity.",
        &[
            tier(1, "+6 Stamina. Swim speed, water breathing."),
            tier(5, "+12 Stamina. Glide movement, Cold Immunity."),
            tier(9, "+21 Stamina. Cold Immunity 10, flying strike gains edge/bane."),
        ]),
    item!("grand-scarab", "Grand Scarab", Leveled, 1, Some(S::Armor), None,
        "Stamina bonus. Flight capabilities.",
        &[
            tier(1, "+6 Stamina. Fly (fall at end of turn)."),
            tier(5, "+12 Stamina. Fly (no falling)."),
            tier(9, "+21 Stamina. Flying strikes gain edge."),
        ]),
    item!("blade-quintessence", "Blade of Quintessence", Leveled, 1, Some(S::Weapon), None,
        "Damage bonus. Elemental damage types.",
        &[
            tier(1, "+1 damage. Choose fire, cold or lightning damage."),
            tier(5, "+2 damage. Strikes leave a lingering elemental aura."),
            tier(9, "+3 damage. Transform into living elemental energy."),
        ]),
    item!("ether-fueled-vessel", "Ether-Fueled Vessel", Leveled, 1, Some(S::Implement), None,
        "Magic damage and distance bonus.",
        &[
            tier(1, "+1 damage. +5 Ranged Magic Distance."),
            tier(5, "+2 damage. +5 Ranged Magic Distance. Ignore cover."),
            tier(9, "+3 damage. +10 Ranged Magic Distance."),
        ]),
];

pub fn catalog_item(id: &str) -> Option<&'static MagicItem> {
    CATALOG.iter().find(|item| item.id == id)
}

/// Enhancement tier a leveled item has reached at the given hero level.
pub fn enhancement_tier(level: u8) -> u8 {
    match level {
        9.. => 9,
        5..=8 => 5,
        _ => 1,
    }
}

// Effect text in force for this item at the given hero level.
pub fn effect_at_level(item: &MagicItem, level: u8) -> &'static str {
    let reached = enhancement_tier(level);
    item.enhancements
        .iter()
        .rev()
        .find(|enh| enh.level <= reached)
        .map_or(item.effect, |enh| enh.effect)
}

/// Pulls "+N stat" bonuses out of effect text. At most one bonus per stat.
pub fn parse_bonuses(effect: &str) -> Vec<ItemBonus> {
    let lower = effect.to_lowercase();
    let words: Vec<&str> = lower
        .split(|c: char| c.is_whitespace() || c == ',' || c == '.' || c == '(' || c == ')')
        .filter(|word| !word.is_empty())
        .collect();

    let mut bonuses: Vec<ItemBonus> = Vec::new();
    for (index, word) in words.iter().enumerate() {
        let Some(value) = word.strip_prefix('+').and_then(|n| n.parse::<i32>().ok()) else {
            continue;
        };
        let rest = &words[index + 1..];
        let stat = match rest {
            ["stamina", ..] => BonusStat::Stamina,
            ["stability", ..] => BonusStat::Stability,
            ["speed", ..] => BonusStat::Speed,
            ["damage", ..] | [_, "damage", ..] => BonusStat::Damage,
            ["bonus", "to", "saving", ..] | ["saving", ..] | ["save", ..] => BonusStat::SavingThrow,
            ["ranged", "magic", "distance", ..] | ["ranged", "distance", ..] | ["distance", ..] => {
                BonusStat::RangeDistance
            }
            _ => continue,
        };
        if !bonuses.iter().any(|bonus| bonus.stat == stat) {
            bonuses.push(ItemBonus { stat, value });
        }
    }
    bonuses
}

// A user-made item. Stored alongside, never inside, the static catalog.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomItem {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    pub echelon: u8,
    #[serde(default)]
    pub slot: Option<EquipmentSlot>,
    #[serde(default)]
    pub project_goal: Option<u32>,
    pub effect: String,
    #[serde(default)]
    pub image_url: Option<String>,
    pub created_at: i64, // Milliseconds since the epoch.
    pub updated_at: i64,
}

/// Fields a caller supplies when creating or editing a custom item.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct CustomItemDraft {
    pub name: String,
    pub category: Option<ItemCategory>,
    pub echelon: u8,
    pub slot: Option<EquipmentSlot>,
    pub project_goal: Option<u32>,
    pub effect: String,
    pub image_url: Option<String>,
}

// Catalog and custom items seen through one lens.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ItemView {
    pub id: String,
    pub name: String,
    pub category: ItemCategory,
    pub echelon: u8,
    pub slot: Option<EquipmentSlot>,
    pub effect: String,
    pub is_custom: bool,
}

impl From<&MagicItem> for ItemView {
    fn from(item: &MagicItem) -> Self {
        ItemView {
            id: item.id.to_string(),
            name: item.name.to_string(),
            category: item.category,
            echelon: item.echelon,
            slot: item.slot,
            effect: item.effect.to_string(),
            is_custom: false,
        }
    }
}

impl From<&CustomItem> for ItemView {
    fn from(item: &CustomItem) -> Self {
        ItemView {
            id: item.id.clone(),
            name: item.name.clone(),
            category: item.category,
            echelon: item.echelon,
            slot: item.slot,
            effect: item.effect.clone(),
            is_custom: true,
        }
    }
}

#[derive(Debug)]
pub struct CustomItemStore {
    path: PathBuf,
    quota: StorageQuota,
    items: Vec<CustomItem>,
}

impl CustomItemStore {
    /// Opens the store in the quota's data directory. A missing or unreadable
    /// file starts empty.
    pub fn open(quota: StorageQuota) -> Self {
        let path = quota.root().join(CUSTOM_ITEMS_FILE);
        let items = fs::read_to_string(&path)
            .ok()
            .and_then(|data| match serde_json::from_str(&data) {
                Ok(items) => Some(items),
                Err(e) => {
                    log::error!("Failed to load custom items: {}", e);
                    None
                }
            })
            .unwrap_or_default();
        CustomItemStore { path, quota, items }
    }

    // A refused write rolls the in-memory list back to `previous`.
    fn persist(&mut self, previous: Vec<CustomItem>) -> Result<(), StorageError> {
        let written = serde_json::to_string_pretty(&self.items)
            .map_err(StorageError::from)
            .and_then(|data| self.quota.write(&self.path, &data));
        if written.is_err() {
            self.items = previous;
        }
        written
    }

    pub fn add(&mut self, draft: CustomItemDraft) -> Result<CustomItem, StorageError> {
        let now = Utc::now().timestamp_millis();
        let item = CustomItem {
            id: format!("custom-{}", Uuid::new_v4()),
            name: draft.name,
            category: draft.category.unwrap_or(ItemCategory::Trinket),
            echelon: draft.echelon.clamp(1, 4),
            slot: draft.slot,
            project_goal: draft.project_goal,
            effect: draft.effect,
            image_url: draft.image_url,
            created_at: now,
            updated_at: now,
        };
        let previous = self.items.clone();
        self.items.push(item.clone());
        self.persist(previous)?;
        Ok(item)
    }

    /// Replaces the editable fields and bumps `updated_at`. The id and creation
    /// time never change.
    pub fn update(&mut self, id: &str, draft: CustomItemDraft) -> Result<bool, StorageError> {
        let previous = self.items.clone();
        let Some(item) = self.items.iter_mut().find(|item| item.id == id) else {
            return Ok(false);
        };
        item.name = draft.name;
        if let Some(category) = draft.category {
            item.category = category;
        }
        item.echelon = draft.echelon.clamp(1, 4);
        item.slot = draft.slot;
        item.project_goal = draft.project_goal;
        item.effect = draft.effect;
        item.image_url = draft.image_url;
        item.updated_at = Utc::now().timestamp_millis().max(item.updated_at + 1);
        self.persist(previous)?;
        Ok(true)
    }

    pub fn delete(&mut self, id: &str) -> Result<bool, StorageError> {
        let previous = self.items.clone();
        self.items.retain(|item| item.id != id);
        if self.items.len() == previous.len() {
            return Ok(false);
        }
        self.persist(previous)?;
        Ok(true)
    }

    pub fn get(&self, id: &str) -> Option<&CustomItem> {
        self.items.iter().find(|item| item.id == id)
    }

    pub fn custom_items(&self) -> &[CustomItem] {
        &self.items
    }

    // Catalog first, then custom items in creation order.
    pub fn all_items(&self) -> Vec<ItemView> {
        CATALOG
            .iter()
            .map(ItemView::from)
            .chain(self.items.iter().map(ItemView::from))
            .collect()
    }

    pub fn find(&self, id: &str) -> Option<ItemView> {
        catalog_item(id)
            .map(ItemView::from)
            .or_else(|| self.get(id).map(ItemView::from))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InventoryItem {
    pub item_id: String,
    pub name: String,
    pub category: ItemCategory,
    pub quantity: u32,
    #[serde(default)]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EquippedItem {
    pub item_id: String,
    pub name: String,
    pub slot: EquipmentSlot,
    pub category: ItemCategory,
    pub effect: String,
    #[serde(default)]
    pub bonuses: Vec<ItemBonus>,
    pub equipped_at: i64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EquipError {
    NotInInventory,
    NoSlot,
    SlotFull(EquipmentSlot),
    AlreadyEquipped,
}

impl Hero {
    /// Adds to an existing stack when the item is already carried.
    pub fn add_to_inventory(&mut self, item: &ItemView, quantity: u32) {
        if quantity == 0 {
            return;
        }
        match self.inventory.iter_mut().find(|entry| entry.item_id == item.id) {
            Some(entry) => entry.quantity += quantity,
            None => self.inventory.push(InventoryItem {
                item_id: item.id.clone(),
                name: item.name.clone(),
                category: item.category,
                quantity,
                notes: None,
            }),
        }
    }

    /// Removes up to `quantity`. An emptied stack is dropped and unequipped.
    pub fn remove_from_inventory(&mut self, item_id: &str, quantity: u32) -> bool {
        let Some(index) = self.inventory.iter().position(|entry| entry.item_id == item_id) else {
            return false;
        };
        let entry = &mut self.inventory[index];
        entry.quantity = entry.quantity.saturating_sub(quantity);
        if entry.quantity == 0 {
            self.inventory.remove(index);
            self.unequip(item_id);
        }
        true
    }

    pub fn equip(&mut self, item: &ItemView) -> Result<(), EquipError> {
        if !self.inventory.iter().any(|entry| entry.item_id == item.id) {
            return Err(EquipError::NotInInventory);
        }
        let slot = item.slot.ok_or(EquipError::NoSlot)?;
        if self.equipped_items.iter().any(|eq| eq.item_id == item.id) {
            return Err(EquipError::AlreadyEquipped);
        }
        let used = self.equipped_items.iter().filter(|eq| eq.slot == slot).count();
        if used >= slot.capacity() {
            return Err(EquipError::SlotFull(slot));
        }

        let effect = catalog_item(&item.id)
            .filter(|magic| magic.category == ItemCategory::Leveled)
            .map_or(item.effect.as_str(), |magic| effect_at_level(magic, self.level));
        self.equipped_items.push(EquippedItem {
            item_id: item.id.clone(),
            name: item.name.clone(),
            slot,
            category: item.category,
            effect: effect.to_string(),
            bonuses: parse_bonuses(effect),
            equipped_at: Utc::now().timestamp_millis(),
        });
        self.recalculate();
        Ok(())
    }

    pub fn unequip(&mut self, item_id: &str) -> bool {
        let before = self.equipped_items.len();
        self.equipped_items.retain(|eq| eq.item_id != item_id);
        let removed = self.equipped_items.len() != before;
        if removed {
            self.recalculate();
        }
        removed
    }

    /// Sum of one stat's bonuses across everything equipped.
    pub fn equipment_bonus(&self, stat: BonusStat) -> i32 {
        self.equipped_items
            .iter()
            .flat_map(|eq| eq.bonuses.iter())
            .filter(|bonus| bonus.stat == stat)
            .map(|bonus| bonus.value)
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hero::{ClassKind, HeroClass};
    use tempfile::tempdir;

    fn view(id: &str) -> ItemView {
        catalog_item(id).map(ItemView::from).unwrap()
    }

    #[test]
    fn catalog_ids_are_unique() {
        for (index, item) in CATALOG.iter().enumerate() {
            assert!(CATALOG[index + 1..].iter().all(|other| other.id != item.id), "{}", item.id);
            assert!((1..=4).contains(&item.echelon));
        }
        assert_eq!(catalog_item("bastion-belt").unwrap().slot, Some(EquipmentSlot::Waist));
        assert!(catalog_item("nope").is_none());
    }

    #[test]
    fn bonuses_come_from_effect_text() {
        assert_eq!(
            parse_bonuses("+3 Stamina, +1 Stability."),
            vec![
                ItemBonus { stat: BonusStat::Stamina, value: 3 },
                ItemBonus { stat: BonusStat::Stability, value: 1 },
            ]
        );
        assert_eq!(
            parse_bonuses("+2 Psychic damage on strikes"),
            vec![ItemBonus { stat: BonusStat::Damage, value: 2 }]
        );
        assert_eq!(
            parse_bonuses("+1 bonus to saving throws until end of encounter."),
            vec![ItemBonus { stat: BonusStat::SavingThrow, value: 1 }]
        );
        assert_eq!(
            parse_bonuses("+5 Ranged Magic Distance."),
            vec![ItemBonus { stat: BonusStat::RangeDistance, value: 5 }]
        );
        assert!(parse_bonuses("Climb speed equal to speed.").is_empty());
    }

    #[test]
    fn leveled_items_follow_hero_level() {
        let skin = catalog_item("adaptive-second-skin").unwrap();
        assert_eq!(enhancement_tier(4), 1);
        assert_eq!(enhancement_tier(5), 5);
        assert_eq!(enhancement_tier(10), 9);
        assert!(effect_at_level(skin, 1).starts_with("+6"));
        assert!(effect_at_level(skin, 7).starts_with("+12"));
        assert!(effect_at_level(skin, 9).starts_with("+21"));
        let potion = catalog_item("healing-potion").unwrap();
        assert_eq!(effect_at_level(potion, 9), potion.effect);
    }

    fn open_store(dir: &std::path::Path) -> CustomItemStore {
        CustomItemStore::open(StorageQuota::new(dir, 1 << 20))
    }

    #[test]
    fn custom_items_respect_the_quota() {
        let dir = tempdir().unwrap();
        let mut store = CustomItemStore::open(StorageQuota::new(dir.path(), 64));
        let result = store.add(CustomItemDraft {
            name: "Lucky Coin".into(),
            effect: "+1 bonus to saving throws.".into(),
            ..Default::default()
        });
        assert!(matches!(result, Err(StorageError::QuotaExceeded { limit: 64, .. })));
        assert!(store.custom_items().is_empty());
        assert!(!dir.path().join(CUSTOM_ITEMS_FILE).exists());
    }

    #[test]
    fn custom_items_persist_and_merge() {
        let dir = tempdir().unwrap();
        let mut store = open_store(dir.path());
        assert!(store.custom_items().is_empty());

        let item = store
            .add(CustomItemDraft {
                name: "Lucky Coin".into(),
                category: Some(ItemCategory::Trinket),
                echelon: 9,
                slot: Some(EquipmentSlot::Held),
                effect: "+1 bonus to saving throws.".into(),
                ..Default::default()
            })
            .unwrap();
        assert!(item.id.starts_with("custom-"));
        assert_eq!(item.echelon, 4);
        assert_eq!(item.created_at, item.updated_at);

        let reopened = open_store(dir.path());
        assert_eq!(reopened.get(&item.id), Some(&item));
        let all = reopened.all_items();
        assert_eq!(all.len(), CATALOG.len() + 1);
        assert!(all.last().unwrap().is_custom);
        assert_eq!(reopened.find("healing-potion").unwrap().name, "Healing Potion");
    }

    #[test]
    fn updating_keeps_identity() {
        let dir = tempdir().unwrap();
        let mut store = open_store(dir.path());
        let item = store
            .add(CustomItemDraft { name: "Rope".into(), echelon: 1, ..Default::default() })
            .unwrap();

        let draft = CustomItemDraft {
            name: "Rope of Climbing".into(),
            echelon: 2,
            ..Default::default()
        };
        assert!(store.update(&item.id, draft.clone()).unwrap());
        assert!(!store.update("custom-missing", draft).unwrap());

        let updated = store.get(&item.id).unwrap();
        assert_eq!(updated.name, "Rope of Climbing");
        assert_eq!(updated.created_at, item.created_at);
        assert!(updated.updated_at > item.updated_at);

        assert!(store.delete(&item.id).unwrap());
        assert!(!store.delete(&item.id).unwrap());
        assert!(open_store(dir.path()).custom_items().is_empty());
    }

    #[test]
    fn inventory_stacks_and_drops() {
        let mut hero = Hero::new("Kell", HeroClass::new(ClassKind::Fury));
        let potion = view("healing-potion");
        hero.add_to_inventory(&potion, 2);
        hero.add_to_inventory(&potion, 1);
        assert_eq!(hero.inventory.len(), 1);
        assert_eq!(hero.inventory[0].quantity, 3);

        assert!(hero.remove_from_inventory("healing-potion", 2));
        assert_eq!(hero.inventory[0].quantity, 1);
        assert!(hero.remove_from_inventory("healing-potion", 5));
        assert!(hero.inventory.is_empty());
        assert!(!hero.remove_from_inventory("healing-potion", 1));
    }

    #[test]
    fn equipping_applies_bonuses() {
        let mut hero = Hero::new("Kell", HeroClass::new(ClassKind::Fury));
        let base_max = hero.stamina.max;
        let belt = view("bastion-belt");

        assert_eq!(hero.equip(&belt), Err(EquipError::NotInInventory));
        hero.add_to_inventory(&belt, 1);
        assert_eq!(hero.equip(&belt), Ok(()));
        assert_eq!(hero.equip(&belt), Err(EquipError::AlreadyEquipped));
        assert_eq!(hero.equipment_bonus(BonusStat::Stamina), 3);
        assert_eq!(hero.stamina.max, base_max + 3);
        assert_eq!(hero.stability, 1);

        let potion = view("healing-potion");
        hero.add_to_inventory(&potion, 1);
        assert_eq!(hero.equip(&potion), Err(EquipError::NoSlot));

        assert!(hero.unequip("bastion-belt"));
        assert_eq!(hero.stamina.max, base_max);
        assert_eq!(hero.stability, 0);
    }

    #[test]
    fn slots_have_capacity() {
        let mut hero = Hero::new("Kell", HeroClass::new(ClassKind::Fury));
        let helm = view("hellcharger-helm");
        let mask = view("mask-of-the-many");
        hero.add_to_inventory(&helm, 1);
        hero.add_to_inventory(&mask, 1);
        hero.equip(&helm).unwrap();
        assert_eq!(hero.equip(&mask), Err(EquipError::SlotFull(EquipmentSlot::Head)));

        // Dropping the last copy takes it off too.
        hero.remove_from_inventory("hellcharger-helm", 1);
        assert!(hero.equipped_items.is_empty());
        assert_eq!(hero.equip(&mask), Ok(()));
    }

    #[test]
    fn leveled_gear_uses_the_reached_tier() {
        let mut hero = Hero::new("Kell", HeroClass::new(ClassKind::Fury));
        hero.set_level(5);
        let skin = view("adaptive-second-skin");
        hero.add_to_inventory(&skin, 1);
        hero.equip(&skin).unwrap();
        assert_eq!(hero.equipment_bonus(BonusStat::Stamina), 12);
    }
}
