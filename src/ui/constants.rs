// ui/constants.rs

pub const TITLE: &str = r#"
 __  __      _   _   _
|  \/  | ___| |_| |_| | ___
| |\/| |/ _ \ __| __| |/ _ \
| |  | |  __/ |_| |_| |  __/
|_|  |_|\___|\__|\__|_|\___|
"#;

pub const ROSTER_KEYS: &str =
    "Enter load · n new · c duplicate · x export · i import · Backspace twice delete · q quit";
pub const NEW_HERO_KEYS: &str = "Type a name · ←→ class · Enter create · Esc back";
pub const IMPORT_KEYS: &str = "↑↓ select · Enter import · Esc back";
pub const SHEET_KEYS: &str = "+/- amount · d damage · h heal · r recovery · R respite · v victory · L level up · ↑↓ condition · Space toggle · e end type · s save · u/f portrait · c combat · Esc roster";
pub const COMBAT_KEYS: &str = "Tab stat · m modifier · Space roll · b begin/end · n round · p phase · 1-6 checklist · E end turn · ↑↓ squad · [ ] minion · S summon · A add · +/- amount · d/h squad · x sacrifice · F fixture · Esc sheet";
