// Minion squads sharing one stamina pool.
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::SquadError;
use crate::hero::Hero;
use crate::summoner::{
    Formation, MAX_SQUAD_SIZE, MinionTemplate, minion_bonus_stamina, minion_level_bonus,
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Minion {
    pub id: String,
    pub template_id: String,
    pub is_alive: bool,
    pub max_stamina: i32, // This minion's share of the pool, and its death threshold.
    #[serde(default)]
    pub has_acted_this_turn: bool,
    #[serde(default)]
    pub has_moved_this_turn: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Squad {
    pub id: String,
    pub template_id: String,
    pub members: Vec<Minion>,
    pub current_stamina: i32, // 0..=max_stamina
    pub max_stamina: i32,
    #[serde(default)]
    pub has_moved: bool,
    #[serde(default)]
    pub has_acted: bool,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DamageOutcome {
    pub overflow_damage: i32,
    pub minions_killed: usize,
    pub squad_removed: bool,
}

/// Builds `count` fresh members. Member `i` takes the template's `i`th stamina entry.
pub fn create_minions(
    template: &MinionTemplate,
    formation: Formation,
    level: u8,
    count: usize,
) -> Vec<Minion> {
    let bonus = minion_bonus_stamina(formation) + minion_level_bonus(template.essence_cost, level);
    (0..count)
        .map(|i| Minion {
            id: Uuid::new_v4().to_string(),
            template_id: template.id.to_string(),
            is_alive: true,
            max_stamina: template.base_stamina(i) + bonus,
            has_acted_this_turn: false,
            has_moved_this_turn: false,
        })
        .collect()
}

pub fn create_squad(template: &MinionTemplate, formation: Formation, level: u8) -> Squad {
    let mut squad = Squad::new(template);
    squad.add_members(create_minions(
        template,
        formation,
        level,
        template.minions_per_summon,
    ));
    squad
}

impl Squad {
    /// An empty squad for `template`; members are added with [`Squad::add_members`].
    pub fn new(template: &MinionTemplate) -> Self {
        Squad {
            id: Uuid::new_v4().to_string(),
            template_id: template.id.to_string(),
            members: Vec::new(),
            current_stamina: 0,
            max_stamina: 0,
            has_moved: false,
            has_acted: false,
        }
    }

    pub fn alive_count(&self) -> usize {
        self.members.iter().filter(|m| m.is_alive).count()
    }

    pub fn all_dead(&self) -> bool {
        self.members.iter().all(|m| !m.is_alive)
    }

    pub fn has_room_for(&self, count: usize) -> bool {
        self.members.len() + count <= MAX_SQUAD_SIZE
    }

    /// New members arrive at full stamina and grow the pool.
    pub fn add_members(&mut self, minions: Vec<Minion>) {
        let added: i32 = minions.iter().map(|m| m.max_stamina).sum();
        self.max_stamina += added;
        self.current_stamina += added;
        self.members.extend(minions);
    }

    /// Takes the member out with its share of the pool. A living member takes
    /// its remaining share with it; a dead one only lowers the maximum.
    pub fn remove_member(&mut self, minion_id: &str) -> Option<Minion> {
        let index = self.members.iter().position(|m| m.id == minion_id)?;
        let minion = self.members.remove(index);
        self.max_stamina = (self.max_stamina - minion.max_stamina).max(0);
        if minion.is_alive {
            self.current_stamina -= minion.max_stamina;
        }
        self.current_stamina = self.current_stamina.clamp(0, self.max_stamina);
        Some(minion)
    }

    /// Pool damage minus the pool itself. Returns members killed and whether
    /// the pool was driven below zero.
    fn absorb(&mut self, amount: i32) -> (usize, bool) {
        let remaining = self.current_stamina - amount.max(0);
        let accumulated = self.max_stamina - remaining;

        let mut threshold = 0;
        let mut killed = 0;
        for minion in self.members.iter_mut() {
            // Dead members still count toward later thresholds.
            threshold += minion.max_stamina;
            if minion.is_alive && accumulated >= threshold {
                minion.is_alive = false;
                killed += 1;
            }
        }

        self.current_stamina = remaining.max(0);
        (killed, remaining < 0)
    }

    pub fn heal(&mut self, amount: i32) {
        self.current_stamina = (self.current_stamina + amount.max(0)).min(self.max_stamina);
    }

    pub fn reset_turn_flags(&mut self) {
        self.has_moved = false;
        self.has_acted = false;
        for minion in self.members.iter_mut() {
            minion.has_acted_this_turn = false;
            minion.has_moved_this_turn = false;
        }
    }
}

pub fn overflow_damage(level: u8) -> i32 {
    2 + i32::from(level)
}

pub fn count_active_minions(squads: &[Squad]) -> usize {
    squads.iter().map(|s| s.members.len()).sum()
}

pub fn count_alive_minions(squads: &[Squad]) -> usize {
    squads.iter().map(Squad::alive_count).sum()
}

/// A squad of the same template with room for `count` more members.
pub fn find_compatible_squad<'a>(
    squads: &'a [Squad],
    template_id: &str,
    count: usize,
) -> Option<&'a Squad> {
    squads
        .iter()
        .find(|s| s.template_id == template_id && s.has_room_for(count))
}

pub fn add_squad(hero: &mut Hero, squad: Squad) {
    if let Some(summoner) = hero.summoner_mut() {
        summoner.active_squads.push(squad);
    }
}

pub fn remove_squad(hero: &mut Hero, squad_id: &str) {
    if let Some(summoner) = hero.summoner_mut() {
        summoner.active_squads.retain(|s| s.id != squad_id);
    }
}

pub fn update_squad_flags(hero: &mut Hero, squad_id: &str, has_moved: bool, has_acted: bool) {
    if let Some(squad) = hero.summoner_mut().and_then(|s| s.squad_mut(squad_id)) {
        squad.has_moved = has_moved;
        squad.has_acted = has_acted;
    }
}

pub fn move_squad(hero: &mut Hero, squad_id: &str) {
    if let Some(squad) = hero.summoner_mut().and_then(|s| s.squad_mut(squad_id)) {
        squad.has_moved = true;
    }
}

pub fn squad_free_strike(hero: &mut Hero, squad_id: &str) {
    if let Some(squad) = hero.summoner_mut().and_then(|s| s.squad_mut(squad_id)) {
        squad.has_acted = true;
    }
}

/// Removes one member; an emptied squad is dropped.
pub fn remove_minion_from_squad(
    hero: &mut Hero,
    squad_id: &str,
    minion_id: &str,
) -> Option<Minion> {
    let summoner = hero.summoner_mut()?;
    let squad = summoner.squad_mut(squad_id)?;
    let removed = squad.remove_member(minion_id);
    if squad.members.is_empty() {
        summoner.active_squads.retain(|s| s.id != squad_id);
        log::debug!("squad {squad_id} emptied and removed");
    }
    removed
}

pub fn update_minion(
    hero: &mut Hero,
    squad_id: &str,
    minion_id: &str,
    update: impl FnOnce(&mut Minion),
) {
    if let Some(minion) = hero
        .summoner_mut()
        .and_then(|s| s.squad_mut(squad_id))
        .and_then(|squad| squad.members.iter_mut().find(|m| m.id == minion_id))
    {
        update(minion);
    }
}

pub fn alive_count(hero: &Hero, squad_id: &str) -> usize {
    hero.summoner()
        .and_then(|s| s.squad(squad_id))
        .map_or(0, Squad::alive_count)
}

/// Folds `source` into `target`. Both must share a template.
pub fn merge_squads(hero: &mut Hero, source_id: &str, target_id: &str) -> Result<(), SquadError> {
    let summoner = hero.summoner_mut().ok_or(SquadError::NotASummoner)?;
    let source_template = summoner
        .squad(source_id)
        .map(|s| s.template_id.clone())
        .ok_or_else(|| SquadError::NotFound(source_id.to_string()))?;
    let target = summoner
        .squad(target_id)
        .ok_or_else(|| SquadError::NotFound(target_id.to_string()))?;
    if target.template_id != source_template || source_id == target_id {
        return Err(SquadError::TemplateMismatch);
    }

    let index = summoner
        .active_squads
        .iter()
        .position(|s| s.id == source_id)
        .ok_or_else(|| SquadError::NotFound(source_id.to_string()))?;
    let source = summoner.active_squads.remove(index);
    if let Some(target) = summoner.squad_mut(target_id) {
        target.members.extend(source.members);
        target.current_stamina += source.current_stamina;
        target.max_stamina += source.max_stamina;
    }
    Ok(())
}

/// Applies `amount` to the squad's pool. A pool driven below zero sends
/// 2 + level overflow to the summoner unless they fight in Leader formation.
pub fn damage_squad(hero: &mut Hero, squad_id: &str, amount: i32) -> DamageOutcome {
    let level = hero.level;
    let Some(summoner) = hero.summoner_mut() else {
        return DamageOutcome::default();
    };
    let formation = summoner.formation;
    let Some(squad) = summoner.squad_mut(squad_id) else {
        return DamageOutcome::default();
    };

    let (minions_killed, overflowed) = squad.absorb(amount);
    let squad_removed = squad.all_dead();
    if squad_removed {
        summoner.active_squads.retain(|s| s.id != squad_id);
        log::info!("squad {squad_id} wiped out");
    }

    let overflow_damage = if overflowed && formation != Formation::Leader {
        overflow_damage(level)
    } else {
        0
    };
    if overflow_damage > 0 {
        hero.deal_damage(overflow_damage);
    }

    DamageOutcome {
        overflow_damage,
        minions_killed,
        squad_removed,
    }
}

/// Restores pool stamina up to the maximum. The dead stay dead.
pub fn heal_squad(hero: &mut Hero, squad_id: &str, amount: i32) {
    if let Some(squad) = hero.summoner_mut().and_then(|s| s.squad_mut(squad_id)) {
        squad.heal(amount);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hero::{ClassKind, HeroClass};
    use crate::summoner::find_template;

    fn summoner(level: u8, formation: Formation) -> Hero {
        let mut hero = Hero::new("Vex", HeroClass::new(ClassKind::Summoner));
        hero.set_level(level);
        hero.stamina.current = hero.stamina.max;
        if let Some(state) = hero.summoner_mut() {
            state.formation = formation;
        }
        hero
    }

    fn squad_of(hero: &mut Hero, template_id: &str, extra: usize) -> String {
        let template = find_template(template_id).unwrap();
        let formation = hero.summoner().unwrap().formation;
        let mut squad = create_squad(template, formation, hero.level);
        squad.add_members(create_minions(template, formation, hero.level, extra));
        let id = squad.id.clone();
        add_squad(hero, squad);
        id
    }

    #[test]
    fn member_stamina_stacks_formation_and_level() {
        let mummy = find_template("undead_accursed_mummy").unwrap();
        let squad = create_squad(mummy, Formation::Elite, 7);
        assert_eq!(squad.members.len(), 3);
        // 6 base + 3 elite + 2 + 2 for levels 4 and 7
        assert!(squad.members.iter().all(|m| m.max_stamina == 13));
        assert_eq!(squad.max_stamina, 39);
        assert_eq!(squad.current_stamina, 39);
    }

    #[test]
    fn cumulative_damage_kills_in_order() {
        let mut hero = summoner(1, Formation::Platoon);
        let id = squad_of(&mut hero, "undead_skeleton", 3); // four members of 2

        let outcome = damage_squad(&mut hero, &id, 3);
        assert_eq!(outcome.minions_killed, 1);
        assert_eq!(alive_count(&hero, &id), 3);

        let outcome = damage_squad(&mut hero, &id, 1);
        assert_eq!(outcome.minions_killed, 1);
        let squad = hero.summoner().unwrap().squad(&id).unwrap();
        assert_eq!(squad.current_stamina, 4);
        assert!(!squad.members[0].is_alive && !squad.members[1].is_alive);
        assert!(squad.members[2].is_alive && squad.members[3].is_alive);
    }

    #[test]
    fn wiping_a_squad_overflows_to_the_summoner() {
        let mut hero = summoner(3, Formation::Platoon);
        let id = squad_of(&mut hero, "undead_skeleton", 1);
        let before = hero.stamina.current;

        let outcome = damage_squad(&mut hero, &id, 9);
        assert_eq!(outcome.overflow_damage, 5);
        assert_eq!(outcome.minions_killed, 2);
        assert!(outcome.squad_removed);
        assert_eq!(hero.stamina.current, before - 5);
        assert!(hero.summoner().unwrap().active_squads.is_empty());
    }

    #[test]
    fn leaders_ignore_overflow() {
        let mut hero = summoner(3, Formation::Leader);
        let id = squad_of(&mut hero, "undead_skeleton", 0);
        let before = hero.stamina.current;
        let outcome = damage_squad(&mut hero, &id, 50);
        assert_eq!(outcome.overflow_damage, 0);
        assert!(outcome.squad_removed);
        assert_eq!(hero.stamina.current, before);
    }

    #[test]
    fn exact_wipe_has_no_overflow() {
        let mut hero = summoner(3, Formation::Platoon);
        let id = squad_of(&mut hero, "undead_skeleton", 1);
        let outcome = damage_squad(&mut hero, &id, 4);
        assert!(outcome.squad_removed);
        assert_eq!(outcome.overflow_damage, 0);
    }

    #[test]
    fn heal_is_clamped_and_never_revives() {
        let mut hero = summoner(1, Formation::Platoon);
        let id = squad_of(&mut hero, "undead_skeleton", 2);
        damage_squad(&mut hero, &id, 2);
        heal_squad(&mut hero, &id, 100);
        let squad = hero.summoner().unwrap().squad(&id).unwrap();
        assert_eq!(squad.current_stamina, squad.max_stamina);
        assert_eq!(squad.alive_count(), 2);
    }

    #[test]
    fn unknown_squad_is_a_no_op() {
        let mut hero = summoner(1, Formation::Platoon);
        assert_eq!(damage_squad(&mut hero, "missing", 5), DamageOutcome::default());
        heal_squad(&mut hero, "missing", 5);
        assert_eq!(alive_count(&hero, "missing"), 0);
    }

    #[test]
    fn merge_requires_matching_templates() {
        let mut hero = summoner(1, Formation::Platoon);
        let a = squad_of(&mut hero, "undead_skeleton", 0);
        let b = squad_of(&mut hero, "undead_skeleton", 1);
        let c = squad_of(&mut hero, "undead_husk", 0);

        assert_eq!(
            merge_squads(&mut hero, &a, &c),
            Err(SquadError::TemplateMismatch)
        );
        assert_eq!(hero.summoner().unwrap().active_squads.len(), 3);

        merge_squads(&mut hero, &a, &b).unwrap();
        let squads = &hero.summoner().unwrap().active_squads;
        assert_eq!(squads.len(), 2);
        let merged = hero.summoner().unwrap().squad(&b).unwrap();
        assert_eq!(merged.members.len(), 3);
        assert_eq!(merged.max_stamina, 6);
    }

    #[test]
    fn removing_the_last_member_drops_the_squad() {
        let mut hero = summoner(1, Formation::Platoon);
        let id = squad_of(&mut hero, "undead_skeleton", 1);
        let first = hero.summoner().unwrap().squad(&id).unwrap().members[0].id.clone();
        let second = hero.summoner().unwrap().squad(&id).unwrap().members[1].id.clone();

        assert!(remove_minion_from_squad(&mut hero, &id, &first).is_some());
        let squad = hero.summoner().unwrap().squad(&id).unwrap();
        assert_eq!((squad.current_stamina, squad.max_stamina), (2, 2));

        remove_minion_from_squad(&mut hero, &id, &second);
        assert!(hero.summoner().unwrap().squad(&id).is_none());
    }

    #[test]
    fn flags_and_counts() {
        let mut hero = summoner(1, Formation::Platoon);
        let id = squad_of(&mut hero, "undead_skeleton", 2);
        move_squad(&mut hero, &id);
        squad_free_strike(&mut hero, &id);
        let minion_id = hero.summoner().unwrap().squad(&id).unwrap().members[0].id.clone();
        update_minion(&mut hero, &id, &minion_id, |m| m.has_acted_this_turn = true);

        let squad = hero.summoner().unwrap().squad(&id).unwrap();
        assert!(squad.has_moved && squad.has_acted);
        assert!(squad.members[0].has_acted_this_turn);

        update_squad_flags(&mut hero, &id, false, false);
        let squads = &hero.summoner().unwrap().active_squads;
        assert!(!squads[0].has_moved);
        assert_eq!(count_active_minions(squads), 3);
        assert_eq!(count_alive_minions(squads), 3);
        assert!(find_compatible_squad(squads, "undead_skeleton", 5).is_some());
        assert!(find_compatible_squad(squads, "undead_skeleton", 6).is_none());
        assert!(find_compatible_squad(squads, "undead_husk", 1).is_none());

        remove_squad(&mut hero, &id);
        assert!(hero.summoner().unwrap().active_squads.is_empty());
    }
}
