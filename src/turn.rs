// Turn trackers: the summoner's four-phase turn and the generic hero checklist.
use rand::Rng;
use std::collections::BTreeSet;
use strum_macros::{Display, EnumIter};

use crate::conditions::SaveResult;
use crate::hero::Hero;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display)]
pub enum TurnPhase {
    #[strum(serialize = "Collect Resources")]
    CollectResources,
    #[strum(serialize = "Summon Minions")]
    SummonMinions,
    #[strum(serialize = "Position Units")]
    PositionUnits,
    #[strum(serialize = "Execute Plan")]
    ExecutePlan,
}

impl TurnPhase {
    pub fn next(self) -> Option<Self> {
        match self {
            TurnPhase::CollectResources => Some(TurnPhase::SummonMinions),
            TurnPhase::SummonMinions => Some(TurnPhase::PositionUnits),
            TurnPhase::PositionUnits => Some(TurnPhase::ExecutePlan),
            TurnPhase::ExecutePlan => None,
        }
    }
}

/// Summoner turn state. Phases only move forward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TurnState {
    pub current_phase: TurnPhase,
    pub round_number: u32,
    pub phases_completed: Vec<TurnPhase>,
}

impl Default for TurnState {
    fn default() -> Self {
        TurnState {
            current_phase: TurnPhase::CollectResources,
            round_number: 1,
            phases_completed: Vec::new(),
        }
    }
}

impl TurnState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Moves to the next phase. Does nothing once the plan is being executed.
    pub fn advance_phase(&mut self) -> bool {
        match self.current_phase.next() {
            Some(next) => {
                self.phases_completed.push(self.current_phase);
                self.current_phase = next;
                true
            }
            None => false,
        }
    }

    pub fn start_round(&mut self) {
        self.current_phase = TurnPhase::CollectResources;
        self.round_number += 1;
        self.phases_completed.clear();
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, EnumIter, Display)]
pub enum HeroPhase {
    Claim,
    Move,
    Maneuver,
    #[strum(serialize = "Main Action")]
    MainAction,
    Triggered,
    #[strum(serialize = "End Turn")]
    EndTurn,
}

// Checklist for any hero's turn. Phases can be ticked in any order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HeroTurn {
    pub turn_number: u32,
    pub completed: BTreeSet<HeroPhase>,
}

impl Default for HeroTurn {
    fn default() -> Self {
        HeroTurn {
            turn_number: 1,
            completed: BTreeSet::new(),
        }
    }
}

impl HeroTurn {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn toggle_phase(&mut self, phase: HeroPhase) {
        if !self.completed.remove(&phase) {
            self.completed.insert(phase);
        }
    }

    pub fn is_complete(&self, phase: HeroPhase) -> bool {
        self.completed.contains(&phase)
    }

    /// Saves against roll-ended conditions, drops end-of-turn conditions and
    /// moves to the next turn.
    pub fn end_turn<R: Rng + ?Sized>(&mut self, hero: &mut Hero, rng: &mut R) -> Vec<SaveResult> {
        let saves = hero.process_saves(rng);
        let ended = hero.end_of_turn_conditions();
        if !ended.is_empty() {
            log::debug!("{} conditions ended with the turn", ended.len());
        }
        self.turn_number += 1;
        self.completed.clear();
        saves
    }

    pub fn reset_turn(&mut self) {
        self.completed.clear();
    }

    pub fn reset(&mut self) {
        *self = Self::default();
    }
}
