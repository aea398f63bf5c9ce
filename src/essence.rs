// Essence income and spending, plus the rules for calling minions forth.
//
// The essence pool is the hero's heroic resource. The economy here only keeps
// the per-turn and per-round gates that decide when essence may be gained.

use strum_macros::Display;

use crate::hero::Hero;
use crate::squads::{self, Squad, count_active_minions, create_minions, create_squad};
use crate::summoner::{
    self, FixtureState, MAX_SQUAD_SIZE, MAX_SQUADS, MinionTemplate, combat_start_minions,
    essence_cost, essence_per_turn, fixture_stamina, max_minions, minion_death_essence,
    sacrifice_cost_reduction, signature_minions_per_turn,
};

pub const SACRIFICE_ESSENCE: i32 = 1;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EssenceEconomy {
    pub gained_this_turn: i32,
    pub turn_number: u32,
    pub signature_minions_spawned_this_turn: bool,
    pub minion_death_essence_gained_this_round: bool,
    pub sacrificed_this_turn: bool,
}

impl EssenceEconomy {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn current_essence(hero: &Hero) -> i32 {
        hero.heroic_resource.current
    }

    fn reset_gates(&mut self) {
        self.gained_this_turn = 0;
        self.minion_death_essence_gained_this_round = false;
        self.sacrificed_this_turn = false;
        self.signature_minions_spawned_this_turn = false;
    }

    /// Opens combat: the pool becomes the hero's victories and summoners get
    /// their free opening minions. Returns how many minions were spawned.
    pub fn start_combat(&mut self, hero: &mut Hero) -> usize {
        self.reset_gates();
        self.turn_number = 1;
        hero.heroic_resource.current = hero.victories;
        hero.reset_class_turn_state();

        if let Some(summoner) = hero.summoner_mut() {
            summoner.active_squads.clear();
        }
        let spawned =
            spawn_signature_minions(hero, combat_start_minions(hero.level, hero.victories));
        self.signature_minions_spawned_this_turn = true;
        log::info!(
            "combat started for {} with {} essence, {} free minions",
            hero.name,
            hero.heroic_resource.current,
            spawned
        );
        spawned
    }

    /// Start of a new turn: income, fresh gates, cleared action flags and the
    /// free signature minions. Returns how many minions were spawned.
    pub fn start_new_turn(&mut self, hero: &mut Hero) -> usize {
        self.reset_gates();
        self.turn_number += 1;
        hero.reset_class_turn_state();

        let level = hero.level;
        let Some(summoner) = hero.summoner_mut() else {
            return 0;
        };
        for squad in summoner.active_squads.iter_mut() {
            squad.reset_turn_flags();
        }
        let free = signature_minions_per_turn(summoner.formation, level);

        let income = essence_per_turn(level);
        hero.heroic_resource.current += income;
        self.gained_this_turn = income;

        let spawned = spawn_signature_minions(hero, free);
        self.signature_minions_spawned_this_turn = true;
        log::debug!("turn {} begins, +{} essence", self.turn_number, income);
        spawned
    }

    /// False, and nothing changes, when the pool can't cover `amount`.
    pub fn spend_essence(&mut self, hero: &mut Hero, amount: i32) -> bool {
        if amount < 0 || hero.heroic_resource.current < amount {
            return false;
        }
        hero.heroic_resource.current -= amount;
        true
    }

    pub fn gain_essence(&mut self, hero: &mut Hero, amount: i32) {
        hero.heroic_resource.current += amount;
        self.gained_this_turn += amount;
    }

    /// Grants the minion death bonus once per round.
    pub fn on_minion_death(&mut self, hero: &mut Hero) -> bool {
        if self.minion_death_essence_gained_this_round {
            return false;
        }
        self.minion_death_essence_gained_this_round = true;
        self.gain_essence(hero, minion_death_essence(hero.level));
        true
    }

    /// +1 essence for a sacrifice, once per turn.
    pub fn sacrifice_minion(&mut self, hero: &mut Hero) -> bool {
        if self.sacrificed_this_turn {
            return false;
        }
        self.sacrificed_this_turn = true;
        self.gain_essence(hero, SACRIFICE_ESSENCE);
        true
    }

    pub fn end_combat(&mut self, hero: &mut Hero) {
        if let Some(summoner) = hero.summoner_mut() {
            summoner.active_squads.clear();
            summoner.fixture = None;
        }
        self.reset_gates();
        log::info!("combat ended for {}", hero.name);
    }
}

/// Spawns up to `count` signature minions, cycling through the portfolio's
/// signature templates. Each joins a same-template squad with room, or starts
/// a new one. Stops early at the minion cap.
fn spawn_signature_minions(hero: &mut Hero, count: usize) -> usize {
    let level = hero.level;
    let Some(summoner) = hero.summoner_mut() else {
        return 0;
    };
    let signature = summoner.portfolio().signature;
    if signature.is_empty() {
        return 0;
    }
    let cap = max_minions(summoner.formation, level);

    let mut spawned = 0;
    for template in signature.iter().cycle().take(count) {
        if count_active_minions(&summoner.active_squads) >= cap {
            break;
        }
        let minions = create_minions(template, summoner.formation, level, 1);
        match summoner
            .active_squads
            .iter_mut()
            .find(|s| s.template_id == template.id && s.has_room_for(1))
        {
            Some(squad) => squad.add_members(minions),
            None => {
                let mut squad = Squad::new(template);
                squad.add_members(minions);
                summoner.active_squads.push(squad);
            }
        }
        spawned += 1;
    }
    spawned
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
pub enum SummonConstraint {
    Essence,
    #[strum(serialize = "Max minions")]
    MaxMinions,
    #[strum(serialize = "Max squads")]
    MaxSquads,
    #[strum(serialize = "Squad composition")]
    SquadComposition,
    #[strum(serialize = "Squad size")]
    SquadSize,
    #[strum(serialize = "Fixture level")]
    FixtureLevel,
    #[strum(serialize = "Fixture active")]
    FixtureActive,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummonOptions {
    pub target_squad_id: Option<String>,
    pub is_free_summon: bool,
    pub sacrifice_count: u32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SummonDetails {
    pub current_essence: i32,
    pub required_essence: i32,
    pub current_minions: usize,
    pub max_minions: usize,
    pub current_squads: usize,
    pub max_squads: usize,
    pub minions_to_summon: usize,
    pub is_free_summon: bool,
    pub target_squad_size: Option<usize>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SummonValidation {
    pub can_summon: bool,
    pub failed_constraint: Option<SummonConstraint>,
    pub message: String,
    pub details: SummonDetails,
}

impl SummonValidation {
    fn allowed(message: &str, details: SummonDetails) -> Self {
        Self {
            can_summon: true,
            failed_constraint: None,
            message: message.to_string(),
            details,
        }
    }

    fn refused(constraint: SummonConstraint, message: String, details: SummonDetails) -> Self {
        Self {
            can_summon: false,
            failed_constraint: Some(constraint),
            message,
            details,
        }
    }

    /// Compact reason for narrow UI columns.
    pub fn short_reason(&self) -> String {
        let d = &self.details;
        match self.failed_constraint {
            None => String::new(),
            Some(SummonConstraint::Essence) => format!("Need {} essence", d.required_essence),
            Some(SummonConstraint::MaxMinions) => {
                format!("{}/{} minions", d.current_minions, d.max_minions)
            }
            Some(SummonConstraint::MaxSquads) => {
                format!("{}/{} squads", d.current_squads, d.max_squads)
            }
            Some(SummonConstraint::SquadComposition) => "Wrong type".to_string(),
            Some(SummonConstraint::SquadSize) => "Squad full".to_string(),
            Some(SummonConstraint::FixtureLevel) => "Locked".to_string(),
            Some(SummonConstraint::FixtureActive) => "Already out".to_string(),
        }
    }
}

/// Essence actually charged once formation and sacrifices are applied.
pub fn adjusted_cost(template: &MinionTemplate, hero: &Hero, options: &SummonOptions) -> i32 {
    if options.is_free_summon {
        return 0;
    }
    let formation = hero.summoner().map(|s| s.formation).unwrap_or_default();
    let cost = essence_cost(template.essence_cost, formation);
    cost.saturating_sub(options.sacrifice_count) as i32
}

/// Checks essence, the minion cap, the squad cap, squad composition and squad
/// size, in that order, stopping at the first failure.
pub fn validate_summon(
    hero: &Hero,
    template: &MinionTemplate,
    options: &SummonOptions,
) -> SummonValidation {
    let empty: &[Squad] = &[];
    let (squads, formation) = match hero.summoner() {
        Some(s) => (s.active_squads.as_slice(), s.formation),
        None => (empty, Default::default()),
    };
    let current_essence = hero.heroic_resource.current;
    let required_essence = adjusted_cost(template, hero, options);
    let minions_to_summon = template.minions_per_summon;
    let current_minions = count_active_minions(squads);
    let max_minions = max_minions(formation, hero.level);

    let mut details = SummonDetails {
        current_essence,
        required_essence,
        current_minions,
        max_minions,
        current_squads: squads.len(),
        max_squads: MAX_SQUADS,
        minions_to_summon,
        is_free_summon: options.is_free_summon,
        target_squad_size: None,
    };

    if !options.is_free_summon && current_essence < required_essence {
        return SummonValidation::refused(
            SummonConstraint::Essence,
            format!("Insufficient essence: need {required_essence}, have {current_essence}"),
            details,
        );
    }

    if current_minions + minions_to_summon > max_minions {
        return SummonValidation::refused(
            SummonConstraint::MaxMinions,
            format!(
                "Would exceed max minions: {} > {}",
                current_minions + minions_to_summon,
                max_minions
            ),
            details,
        );
    }

    let target = options
        .target_squad_id
        .as_deref()
        .and_then(|id| squads.iter().find(|s| s.id == id));

    if target.is_none()
        && squads.len() >= MAX_SQUADS
        && squads::find_compatible_squad(squads, template.id, minions_to_summon).is_none()
    {
        return SummonValidation::refused(
            SummonConstraint::MaxSquads,
            format!(
                "Maximum squads reached ({}/{}) and no compatible squad available",
                squads.len(),
                MAX_SQUADS
            ),
            details,
        );
    }

    if let Some(target) = target {
        if target.template_id != template.id {
            return SummonValidation::refused(
                SummonConstraint::SquadComposition,
                "All minions in a squad must have the same name".to_string(),
                details,
            );
        }
        let size = target.members.len();
        details.target_squad_size = Some(size);
        if size + minions_to_summon > MAX_SQUAD_SIZE {
            return SummonValidation::refused(
                SummonConstraint::SquadSize,
                format!(
                    "Would exceed squad size: {} > {}",
                    size + minions_to_summon,
                    MAX_SQUAD_SIZE
                ),
                details,
            );
        }
    }

    SummonValidation::allowed("Summon allowed", details)
}

/// Validates, pays and places a summon. Returns the id of the squad the new
/// minions joined.
pub fn summon(
    economy: &mut EssenceEconomy,
    hero: &mut Hero,
    template: &MinionTemplate,
    options: &SummonOptions,
) -> Result<String, SummonValidation> {
    let validation = validate_summon(hero, template, options);
    if !validation.can_summon {
        return Err(validation);
    }
    if !economy.spend_essence(hero, validation.details.required_essence) {
        return Err(validation);
    }

    let level = hero.level;
    let Some(summoner) = hero.summoner_mut() else {
        return Err(validation);
    };
    let formation = summoner.formation;
    let count = template.minions_per_summon;

    let joined = options
        .target_squad_id
        .as_deref()
        .filter(|id| summoner.squad(id).is_some())
        .map(str::to_string)
        .or_else(|| {
            squads::find_compatible_squad(&summoner.active_squads, template.id, count)
                .map(|s| s.id.clone())
        });

    let squad_id = match joined.and_then(|id| summoner.squad_mut(&id)) {
        Some(squad) => {
            squad.add_members(create_minions(template, formation, level, count));
            squad.id.clone()
        }
        None => {
            let squad = create_squad(template, formation, level);
            let id = squad.id.clone();
            summoner.active_squads.push(squad);
            id
        }
    };
    log::info!("summoned {} x{} into squad {}", template.name, count, squad_id);
    Ok(squad_id)
}

pub fn validate_fixture_summon(hero: &Hero) -> SummonValidation {
    let details = SummonDetails::default();
    if !summoner::fixture_unlocked(hero.level) {
        return SummonValidation::refused(
            SummonConstraint::FixtureLevel,
            format!(
                "Fixture unlocks at Level {} (Summoner's Dominion)",
                summoner::FIXTURE_UNLOCK_LEVEL
            ),
            details,
        );
    }
    if hero.summoner().is_some_and(|s| s.fixture_active()) {
        return SummonValidation::refused(
            SummonConstraint::FixtureActive,
            "Fixture is already active".to_string(),
            details,
        );
    }
    SummonValidation::allowed("Fixture can be summoned", details)
}

pub fn summon_fixture(hero: &mut Hero) -> Result<(), SummonValidation> {
    let validation = validate_fixture_summon(hero);
    if !validation.can_summon {
        return Err(validation);
    }
    let stamina = fixture_stamina(hero.level);
    match hero.summoner_mut() {
        Some(summoner) => {
            summoner.fixture = Some(FixtureState {
                template_id: summoner.portfolio().fixture.id.to_string(),
                current_stamina: stamina,
                is_active: true,
            });
            Ok(())
        }
        None => Err(validation),
    }
}

pub fn dismiss_fixture(hero: &mut Hero) {
    if let Some(summoner) = hero.summoner_mut() {
        summoner.fixture = None;
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SacrificableMinion {
    pub minion_id: String,
    pub squad_id: String,
    pub template_id: String,
    pub can_sacrifice: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SacrificeResult {
    pub success: bool,
    pub cost_reduction: u32,
    pub sacrificed_minion_ids: Vec<String>,
    pub error: Option<String>,
}

/// Every living minion. Those that acted or moved this turn can't be given up.
pub fn sacrificable_minions(hero: &Hero) -> Vec<SacrificableMinion> {
    let Some(summoner) = hero.summoner() else {
        return Vec::new();
    };
    summoner
        .active_squads
        .iter()
        .flat_map(|squad| {
            squad
                .members
                .iter()
                .filter(|m| m.is_alive)
                .map(move |m| SacrificableMinion {
                    minion_id: m.id.clone(),
                    squad_id: squad.id.clone(),
                    template_id: m.template_id.clone(),
                    can_sacrifice: !m.has_acted_this_turn && !m.has_moved_this_turn,
                })
        })
        .collect()
}

/// Removes the chosen minions and reports the essence they are worth toward a
/// summon. Nothing is removed if any of them is ineligible.
pub fn execute_sacrifice(hero: &mut Hero, minion_ids: &[String]) -> SacrificeResult {
    let selected: Vec<SacrificableMinion> = sacrificable_minions(hero)
        .into_iter()
        .filter(|m| minion_ids.contains(&m.minion_id))
        .collect();

    if selected.iter().any(|m| !m.can_sacrifice) {
        return SacrificeResult {
            error: Some("Minion has already acted or moved this turn".to_string()),
            ..SacrificeResult::default()
        };
    }

    let values: Vec<u32> = selected
        .iter()
        .map(|m| summoner::find_template(&m.template_id).map_or(1, |t| t.essence_cost))
        .collect();
    let cost_reduction = sacrifice_cost_reduction(&values, hero.level);

    let mut sacrificed_minion_ids = Vec::with_capacity(selected.len());
    for minion in &selected {
        if squads::remove_minion_from_squad(hero, &minion.squad_id, &minion.minion_id).is_some() {
            sacrificed_minion_ids.push(minion.minion_id.clone());
        }
    }

    SacrificeResult {
        success: true,
        cost_reduction,
        sacrificed_minion_ids,
        error: None,
    }
}
