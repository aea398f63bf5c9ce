pub mod app;
pub mod combat;
pub mod conditions;
pub mod context;
pub mod dice;
pub mod error;
pub mod essence;
pub mod hero;
pub mod items;
pub mod logging;
pub mod portrait;
pub mod progression;
pub mod roll_history;
pub mod save;
pub mod settings;
pub mod squads;
pub mod summoner;
pub mod timer;
pub mod tui;
pub mod turn;
pub mod ui;

// Re-export commonly used items for easier access
pub use combat::CombatSession;
pub use conditions::{ConditionId, EndType};
pub use dice::{PowerRoll, PowerRollModifier, Tier, perform_power_roll};
pub use error::{AppError, StorageError};
pub use hero::{ClassKind, Hero, HeroClass};
pub use save::CharacterStore;
