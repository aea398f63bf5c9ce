// ui/mod.rs

pub mod combat;
mod constants;
pub mod draw;
pub mod import_menu;
pub mod new_hero;
pub mod roster;
pub mod sheet;
pub mod widgets;

use crossterm::event::KeyEvent;
use derive_more::From;
use ratatui::{buffer::Buffer, layout::Rect};
use std::fmt::Debug;

use crate::{app::Action, context::Context};

pub use combat::CombatView;
pub use draw::{MIN_HEIGHT, MIN_WIDTH};
pub use import_menu::ImportMenu;
pub use new_hero::NewHero;
pub use roster::Roster;
pub use sheet::HeroSheet;

pub trait Component: Debug {
    fn on_key(&mut self, key: KeyEvent, context: &Context) -> Option<Action>;
    fn render(&self, area: Rect, buffer: &mut Buffer, context: &Context);
}

// Every screen the app can show. Switching screens swaps the whole value.
#[derive(Debug, From)]
pub enum ComponentEnum {
    Roster(Roster),
    NewHero(NewHero),
    ImportMenu(ImportMenu),
    HeroSheet(HeroSheet),
    CombatView(CombatView),
}

impl Component for ComponentEnum {
    fn on_key(&mut self, key: KeyEvent, context: &Context) -> Option<Action> {
        match self {
            ComponentEnum::Roster(c) => c.on_key(key, context),
            ComponentEnum::NewHero(c) => c.on_key(key, context),
            ComponentEnum::ImportMenu(c) => c.on_key(key, context),
            ComponentEnum::HeroSheet(c) => c.on_key(key, context),
            ComponentEnum::CombatView(c) => c.on_key(key, context),
        }
    }

    fn render(&self, area: Rect, buffer: &mut Buffer, context: &Context) {
        match self {
            ComponentEnum::Roster(c) => c.render(area, buffer, context),
            ComponentEnum::NewHero(c) => c.render(area, buffer, context),
            ComponentEnum::ImportMenu(c) => c.render(area, buffer, context),
            ComponentEnum::HeroSheet(c) => c.render(area, buffer, context),
            ComponentEnum::CombatView(c) => c.render(area, buffer, context),
        }
    }
}
