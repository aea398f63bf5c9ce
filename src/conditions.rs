// Conditions, saving throws and the banes they impose.
use chrono::{DateTime, Utc};
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::dice::roll_die;
use crate::hero::Hero;

pub const SAVE_DIE_SIDES: u32 = 10;
pub const SAVE_SUCCESS_MIN: u32 = 6;
pub const BLEEDING_DIE_SIDES: u32 = 6;

// Declaration order matches the CONDITIONS table below.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, EnumIter,
    Display,
)]
#[serde(rename_all = "lowercase")]
pub enum ConditionId {
    Bleeding,
    Burning,
    Charmed,
    Dazed,
    Frightened,
    Grabbed,
    Invisible,
    Petrified,
    Prone,
    Restrained,
    Slowed,
    Taunted,
    Weakened,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum EndType {
    #[default]
    Roll, // Ends on a successful saving throw.
    #[strum(serialize = "End of turn")]
    EndOfTurn,
    Manual,
}

impl EndType {
    pub fn cycle(self) -> Self {
        match self {
            EndType::Roll => EndType::EndOfTurn,
            EndType::EndOfTurn => EndType::Manual,
            EndType::Manual => EndType::Roll,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum BleedingTrigger {
    #[strum(serialize = "main action")]
    MainAction,
    #[strum(serialize = "triggered action")]
    TriggeredAction,
    #[strum(serialize = "Might roll")]
    MightRoll,
    #[strum(serialize = "Agility roll")]
    AgilityRoll,
}

#[derive(Debug, PartialEq, Eq)]
pub struct ConditionDefinition {
    pub id: ConditionId,
    pub name: &'static str,
    pub description: &'static str,
    pub primary_effect: &'static str,
    pub save_ends: bool,
    pub how_to_end: &'static str,
    pub action_triggers: &'static [BleedingTrigger],
}

impl ConditionDefinition {
    pub fn affects_actions(&self) -> bool {
        !self.action_triggers.is_empty()
    }
}

const SAVE_AT_END_OF_TURN: &str = "d10 roll of 6+ at end of turn";

static CONDITIONS: [ConditionDefinition; 13] = [
    ConditionDefinition {
        id: ConditionId::Bleeding,
        name: "Bleeding",
        description: "You are losing blood or vital essence rapidly.",
        primary_effect: "Take 1d6 + level damage when using a main action, triggered action, or making a power roll using Might or Agility.",
        save_ends: true,
        how_to_end: SAVE_AT_END_OF_TURN,
        action_triggers: &[
            BleedingTrigger::MainAction,
            BleedingTrigger::TriggeredAction,
            BleedingTrigger::MightRoll,
            BleedingTrigger::AgilityRoll,
        ],
    },
    ConditionDefinition {
        id: ConditionId::Burning,
        name: "Burning",
        description: "You are on fire and taking ongoing damage.",
        primary_effect: "Take fire damage at the start of each of your turns. The source sets the amount.",
        save_ends: true,
        how_to_end: SAVE_AT_END_OF_TURN,
        action_triggers: &[],
    },
    ConditionDefinition {
        id: ConditionId::Charmed,
        name: "Charmed",
        description: "You are magically influenced to view another creature favorably.",
        primary_effect: "Cannot attack or harmfully target the charmer. The charmer has an edge on social interactions with you.",
        save_ends: true,
        how_to_end: SAVE_AT_END_OF_TURN,
        action_triggers: &[],
    },
    ConditionDefinition {
        id: ConditionId::Dazed,
        name: "Dazed",
        description: "Your senses are scrambled and you struggle to act.",
        primary_effect: "Limited to one of a move action, maneuver or main action. No triggered actions or free maneuvers.",
        save_ends: true,
        how_to_end: SAVE_AT_END_OF_TURN,
        action_triggers: &[],
    },
    ConditionDefinition {
        id: ConditionId::Frightened,
        name: "Frightened",
        description: "You are overcome with fear of a specific source.",
        primary_effect: "Bane on ability rolls against the fear source. Cannot willingly move closer to it.",
        save_ends: true,
        how_to_end: SAVE_AT_END_OF_TURN,
        action_triggers: &[],
    },
    ConditionDefinition {
        id: ConditionId::Grabbed,
        name: "Grabbed",
        description: "A creature or effect is holding you in place.",
        primary_effect: "Speed 0. Bane on abilities that don't target the grab source.",
        save_ends: false,
        how_to_end: "Escape Grab maneuver or break adjacency",
        action_triggers: &[],
    },
    ConditionDefinition {
        id: ConditionId::Invisible,
        name: "Invisible",
        description: "You cannot be seen by normal means.",
        primary_effect: "Concealment against all creatures. Attacks against you take a bane.",
        save_ends: false,
        how_to_end: "Ends with the ability duration or when you attack",
        action_triggers: &[],
    },
    ConditionDefinition {
        id: ConditionId::Petrified,
        name: "Petrified",
        description: "You have been turned to stone.",
        primary_effect: "Incapacitated, cannot move, speak or act. Immune to all damage.",
        save_ends: true,
        how_to_end: "Specific magic or effect to reverse",
        action_triggers: &[],
    },
    ConditionDefinition {
        id: ConditionId::Prone,
        name: "Prone",
        description: "You are flat on the ground.",
        primary_effect: "Your strikes take a bane. Melee abilities against you gain an edge.",
        save_ends: false,
        how_to_end: "Stand Up maneuver",
        action_triggers: &[],
    },
    ConditionDefinition {
        id: ConditionId::Restrained,
        name: "Restrained",
        description: "You are bound or entangled and cannot move freely.",
        primary_effect: "Speed 0. Cannot stand up or be force moved. Bane on ability rolls and Might or Agility tests.",
        save_ends: true,
        how_to_end: SAVE_AT_END_OF_TURN,
        action_triggers: &[],
    },
    ConditionDefinition {
        id: ConditionId::Slowed,
        name: "Slowed",
        description: "Your movement is impaired.",
        primary_effect: "Speed reduced to 2. Cannot shift.",
        save_ends: true,
        how_to_end: SAVE_AT_END_OF_TURN,
        action_triggers: &[],
    },
    ConditionDefinition {
        id: ConditionId::Taunted,
        name: "Taunted",
        description: "A creature has drawn your ire and demands your attention.",
        primary_effect: "Double bane on ability rolls that do not target the taunt source.",
        save_ends: true,
        how_to_end: SAVE_AT_END_OF_TURN,
        action_triggers: &[],
    },
    ConditionDefinition {
        id: ConditionId::Weakened,
        name: "Weakened",
        description: "Your strength is sapped.",
        primary_effect: "Bane on all power rolls.",
        save_ends: true,
        how_to_end: SAVE_AT_END_OF_TURN,
        action_triggers: &[],
    },
];

pub fn condition_definition(id: ConditionId) -> &'static ConditionDefinition {
    &CONDITIONS[id as usize]
}

pub fn all_conditions() -> &'static [ConditionDefinition] {
    &CONDITIONS
}

pub fn saveable_conditions() -> impl Iterator<Item = &'static ConditionDefinition> {
    CONDITIONS.iter().filter(|c| c.save_ends)
}

/// Save-ends conditions default to a roll; the rest end only when removed.
pub fn default_end_type(id: ConditionId) -> EndType {
    if condition_definition(id).save_ends {
        EndType::Roll
    } else {
        EndType::Manual
    }
}

// A condition currently on a hero. At most one per ConditionId.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveCondition {
    pub condition: ConditionId,
    #[serde(default)]
    pub source_id: Option<String>,
    #[serde(default)]
    pub source_name: Option<String>,
    #[serde(default)]
    pub duration: Option<String>,
    pub applied_at: DateTime<Utc>,
    #[serde(default)]
    pub end_type: EndType,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SavingThrow {
    pub roll: u32,
    pub success: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveResult {
    pub condition: ConditionId,
    pub name: &'static str,
    pub roll: u32,
    pub success: bool,
    pub removed: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BleedingDamage {
    pub roll: u32,
    pub total: i32,
    pub trigger: BleedingTrigger,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BaneKind {
    Bane,
    DoubleBane,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConditionBane {
    pub condition: ConditionId,
    pub kind: BaneKind,
    pub reason: String,
}

pub fn perform_saving_throw<R: Rng + ?Sized>(rng: &mut R) -> SavingThrow {
    let roll = roll_die(rng, SAVE_DIE_SIDES);
    SavingThrow {
        roll,
        success: roll >= SAVE_SUCCESS_MIN,
    }
}

/// Returns the d6 face and the total (face + level).
pub fn roll_bleeding_damage<R: Rng + ?Sized>(rng: &mut R, level: u8) -> (u32, i32) {
    let roll = roll_die(rng, BLEEDING_DIE_SIDES);
    (roll, roll as i32 + i32::from(level))
}

impl Hero {
    /// Adds the condition, or refreshes its source and duration if present.
    pub fn add_condition(
        &mut self,
        id: ConditionId,
        source_id: Option<String>,
        source_name: Option<String>,
        duration: Option<String>,
    ) {
        let applied_at = Utc::now();
        match self.active_conditions.iter_mut().find(|c| c.condition == id) {
            Some(existing) => {
                existing.source_id = source_id;
                existing.source_name = source_name;
                existing.duration = duration;
                existing.applied_at = applied_at;
            }
            None => self.active_conditions.push(ActiveCondition {
                condition: id,
                source_id,
                source_name,
                duration,
                applied_at,
                end_type: default_end_type(id),
            }),
        }
    }

    pub fn remove_condition(&mut self, id: ConditionId) {
        self.active_conditions.retain(|c| c.condition != id);
    }

    pub fn has_condition(&self, id: ConditionId) -> bool {
        self.active_conditions.iter().any(|c| c.condition == id)
    }

    pub fn condition(&self, id: ConditionId) -> Option<&ActiveCondition> {
        self.active_conditions.iter().find(|c| c.condition == id)
    }

    pub fn update_condition_end_type(&mut self, id: ConditionId, end_type: EndType) {
        if let Some(active) = self.active_conditions.iter_mut().find(|c| c.condition == id) {
            active.end_type = end_type;
        }
    }

    pub fn clear_conditions(&mut self) {
        self.active_conditions.clear();
    }

    /// Rolls a save against `id`. The condition is removed only when the throw
    /// succeeds and the condition is save-ends. The throw is reported either way.
    pub fn attempt_save<R: Rng + ?Sized>(&mut self, rng: &mut R, id: ConditionId) -> SaveResult {
        let definition = condition_definition(id);
        let SavingThrow { roll, success } = perform_saving_throw(rng);
        let removed = success && definition.save_ends && self.has_condition(id);
        if removed {
            self.remove_condition(id);
        }
        SaveResult {
            condition: id,
            name: definition.name,
            roll,
            success,
            removed,
        }
    }

    /// Saves against every condition set to end on a roll.
    pub fn process_saves<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Vec<SaveResult> {
        let pending: Vec<ConditionId> = self
            .active_conditions
            .iter()
            .filter(|c| c.end_type == EndType::Roll && condition_definition(c.condition).save_ends)
            .map(|c| c.condition)
            .collect();
        pending
            .into_iter()
            .map(|id| self.attempt_save(rng, id))
            .collect()
    }

    /// Drops conditions that last until the end of the turn.
    pub fn end_of_turn_conditions(&mut self) -> Vec<ConditionId> {
        let (ended, kept): (Vec<_>, Vec<_>) = self
            .active_conditions
            .drain(..)
            .partition(|c| c.end_type == EndType::EndOfTurn);
        self.active_conditions = kept;
        ended.into_iter().map(|c| c.condition).collect()
    }

    pub fn bleeding_triggers(&self) -> &'static [BleedingTrigger] {
        if self.has_condition(ConditionId::Bleeding) {
            condition_definition(ConditionId::Bleeding).action_triggers
        } else {
            &[]
        }
    }

    pub fn should_trigger_bleeding(&self, trigger: BleedingTrigger) -> bool {
        self.bleeding_triggers().contains(&trigger)
    }

    /// Rolls and applies bleeding damage when bleeding reacts to `trigger`.
    pub fn apply_bleeding_damage<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        trigger: BleedingTrigger,
    ) -> Option<BleedingDamage> {
        if !self.should_trigger_bleeding(trigger) {
            return None;
        }
        let (roll, total) = roll_bleeding_damage(rng, self.level);
        self.deal_damage(total);
        log::debug!("{} bled for {} on {}", self.name, total, trigger);
        Some(BleedingDamage {
            roll,
            total,
            trigger,
        })
    }

    pub fn power_roll_banes(&self) -> Vec<ConditionBane> {
        self.active_conditions
            .iter()
            .filter_map(|active| {
                let source = active.source_name.as_deref();
                let (kind, reason) = match active.condition {
                    ConditionId::Weakened => {
                        (BaneKind::Bane, "Bane on all power rolls".to_string())
                    }
                    ConditionId::Frightened => (
                        BaneKind::Bane,
                        format!("Bane vs {}", source.unwrap_or("fear source")),
                    ),
                    ConditionId::Taunted => (
                        BaneKind::DoubleBane,
                        format!(
                            "Double bane on abilities not targeting {}",
                            source.unwrap_or("taunt source")
                        ),
                    ),
                    ConditionId::Grabbed => (
                        BaneKind::Bane,
                        format!(
                            "Bane on abilities not targeting {}",
                            source.unwrap_or("grabber")
                        ),
                    ),
                    ConditionId::Restrained => (
                        BaneKind::Bane,
                        "Bane on ability rolls and Might/Agility tests".to_string(),
                    ),
                    ConditionId::Prone => (BaneKind::Bane, "Bane on strikes".to_string()),
                    _ => return None,
                };
                Some(ConditionBane {
                    condition: active.condition,
                    kind,
                    reason,
                })
            })
            .collect()
    }
}
