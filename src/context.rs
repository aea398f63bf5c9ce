use crate::{
    combat::CombatSession, hero::Hero, portrait::PortraitSettings, roll_history::RollHistory,
    save::StoredCharacter, settings::Settings,
};

// Read-only view of the app handed to components for rendering and key handling.
#[derive(Debug)]
pub struct Context<'a> {
    pub settings: &'a Settings,
    pub characters: &'a [StoredCharacter],
    pub hero: Option<&'a Hero>,
    pub portrait: &'a PortraitSettings,
    pub session: &'a CombatSession,
    pub roll_history: &'a RollHistory,
    pub show_roll: bool, // Cleared by the auto-clear timer.
    pub status: Option<&'a str>,
}
