// The combat session: one owner for everything that lives only while fighting.
use rand::Rng;

use crate::conditions::SaveResult;
use crate::essence::{self, EssenceEconomy, SummonOptions, SummonValidation};
use crate::hero::Hero;
use crate::squads::{self, DamageOutcome};
use crate::summoner::MinionTemplate;
use crate::turn::{HeroTurn, TurnState};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CombatSession {
    pub in_combat: bool,
    pub economy: EssenceEconomy,
    pub summoner_turn: TurnState,
    pub hero_turn: HeroTurn,
    pub combat_turn_number: u32,
}

impl CombatSession {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn start_combat(&mut self, hero: &mut Hero) -> usize {
        self.in_combat = true;
        self.combat_turn_number = 1;
        self.summoner_turn = TurnState::new();
        self.hero_turn.reset();
        self.economy.start_combat(hero)
    }

    pub fn end_combat(&mut self, hero: &mut Hero) {
        self.in_combat = false;
        self.economy.end_combat(hero);
        self.hero_turn.reset();
    }

    /// Starts the next summoner round. Returns the number of free minions.
    pub fn start_new_turn(&mut self, hero: &mut Hero) -> usize {
        self.summoner_turn.start_round();
        self.economy.start_new_turn(hero)
    }

    pub fn advance_phase(&mut self) -> bool {
        self.summoner_turn.advance_phase()
    }

    pub fn end_hero_turn<R: Rng + ?Sized>(
        &mut self,
        hero: &mut Hero,
        rng: &mut R,
    ) -> Vec<SaveResult> {
        self.combat_turn_number += 1;
        self.hero_turn.end_turn(hero, rng)
    }

    /// Damages a squad and feeds any deaths into the essence economy.
    pub fn damage_squad(&mut self, hero: &mut Hero, squad_id: &str, amount: i32) -> DamageOutcome {
        let outcome = squads::damage_squad(hero, squad_id, amount);
        if outcome.minions_killed > 0 {
            self.economy.on_minion_death(hero);
        }
        outcome
    }

    pub fn heal_squad(&mut self, hero: &mut Hero, squad_id: &str, amount: i32) {
        squads::heal_squad(hero, squad_id, amount);
    }

    pub fn spend_essence(&mut self, hero: &mut Hero, amount: i32) -> bool {
        self.economy.spend_essence(hero, amount)
    }

    pub fn gain_essence(&mut self, hero: &mut Hero, amount: i32) {
        self.economy.gain_essence(hero, amount);
    }

    pub fn sacrifice_minion(&mut self, hero: &mut Hero) -> bool {
        self.economy.sacrifice_minion(hero)
    }

    pub fn summon(
        &mut self,
        hero: &mut Hero,
        template: &MinionTemplate,
        options: &SummonOptions,
    ) -> Result<String, SummonValidation> {
        essence::summon(&mut self.economy, hero, template, options)
    }
}
