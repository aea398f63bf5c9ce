// /app.rs
use std::{
    fs,
    path::{Path, PathBuf},
    time::Duration,
};

use anyhow::Context as _;
use crossterm::event::{KeyEvent, KeyEventKind};
use rand::{SeedableRng, rngs::StdRng};
use tokio::sync::mpsc;

use crate::{
    combat::CombatSession,
    conditions::ConditionId,
    context::Context,
    dice::{PowerRollModifier, perform_power_roll},
    error::{AppError, Result, StorageError},
    essence::{self, SummonOptions},
    hero::{Characteristic, ClassKind, Hero, HeroClass},
    portrait::{self, PortraitSettings, PortraitStore},
    progression,
    roll_history::{RollHistory, RollSource},
    save::{self, CharacterStore, StorageQuota, StoredCharacter},
    settings::Settings,
    summoner,
    timer::AutoClear,
    tui::{Tui, TuiEvent},
    turn::HeroPhase,
    ui::{Component, ComponentEnum, HeroSheet, ImportMenu, Roster},
};

pub const EXPORTS_DIR: &str = "exports";

#[derive(Debug)]
pub enum Action {
    Quit,
    Status(String),
    SwitchComponent(ComponentEnum),

    NewHero { name: String, class: ClassKind },
    LoadHero(String),
    DeleteHero(String),
    DuplicateHero(String),
    ExportHero(String),
    OpenImport,
    ImportFile(PathBuf),

    Hero(HeroCommand),
    Combat(CombatCommand),
    ClearRoll, // Sent by the auto-clear timer.

    SetPortraitUrl(String),
    UploadPortrait(PathBuf),
    RemovePortrait,
    PortraitChecked {
        hero_id: String,
        url: String,
        result: std::result::Result<(), String>,
    },
}

// Edits to the loaded hero outside the combat tracker.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeroCommand {
    Damage(i32),
    Heal(i32),
    UseRecovery,
    Respite,
    LevelUp,
    AddVictory,
    AdjustResource(i32),
    ToggleCondition(ConditionId),
    CycleEndType(ConditionId),
    AttemptSave(ConditionId),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CombatCommand {
    Start,
    End,
    NewRound,
    AdvancePhase,
    TogglePhase(HeroPhase),
    EndHeroTurn,
    PowerRoll {
        characteristic: Characteristic,
        modifier: PowerRollModifier,
    },
    DamageSquad {
        squad_id: String,
        amount: i32,
    },
    HealSquad {
        squad_id: String,
        amount: i32,
    },
    Summon {
        template_id: String,
        target_squad_id: Option<String>,
    },
    Sacrifice {
        minion_id: String,
    },
    ToggleFixture,
}

enum Incoming {
    Tui(TuiEvent),
    Action(Action),
}

// Builds the read-only view from disjoint fields so a component can be
// borrowed mutably at the same time.
macro_rules! context {
    ($app:expr) => {
        Context {
            settings: &$app.settings,
            characters: &$app.characters,
            hero: $app.hero.as_ref(),
            portrait: &$app.portrait,
            session: &$app.session,
            roll_history: &$app.roll_history,
            show_roll: $app.show_roll,
            status: $app.status.as_deref(),
        }
    };
}

pub struct App {
    // Application state and control flow
    running: bool,
    component: ComponentEnum,

    // --- Global information
    settings: Settings,
    data_dir: PathBuf,
    store: CharacterStore,
    portraits: PortraitStore,
    characters: Vec<StoredCharacter>,

    // --- Loaded hero
    hero: Option<Hero>,
    portrait: PortraitSettings,
    session: CombatSession,
    roll_history: RollHistory,
    show_roll: bool,
    roll_clear: AutoClear,

    status: Option<String>,

    action_sender: mpsc::UnboundedSender<Action>,
    action_receiver: mpsc::UnboundedReceiver<Action>,
    rng: StdRng,
}

impl App {
    pub fn new(settings: Settings) -> Result<Self> {
        let data_dir = settings.data_dir()?;
        Ok(Self::with_data_dir(settings, data_dir))
    }

    pub fn with_data_dir(settings: Settings, data_dir: impl AsRef<Path>) -> Self {
        let data_dir = data_dir.as_ref().to_path_buf();
        let (action_sender, action_receiver) = mpsc::unbounded_channel();
        let quota = StorageQuota::new(&data_dir, settings.storage_quota_bytes);
        let store = CharacterStore::new(&data_dir, settings.storage_quota_bytes);
        let portraits = PortraitStore::new(quota);
        let characters = store.list_characters();

        let mut app = Self {
            running: true,
            component: ComponentEnum::from(Roster::new()),

            portraits,
            settings,
            data_dir,
            store,
            characters,

            hero: None,
            portrait: PortraitSettings::default(),
            session: CombatSession::new(),
            roll_history: RollHistory::new(),
            show_roll: false,
            roll_clear: AutoClear::new(),

            status: None,

            action_sender,
            action_receiver,
            rng: StdRng::from_os_rng(),
        };

        // Reopen whoever was active last time.
        if let Some(id) = app.store.active_id() {
            if let Err(e) = app.load_hero(&id) {
                log::warn!("Could not restore active hero {id}: {e}");
            }
        }
        app
    }

    pub async fn run(&mut self) -> color_eyre::Result<()> {
        let mut tui = Tui::new()?
            .tick_rate(4.0) // 4 ticks per second
            .frame_rate(30.0); // 30 frames per second

        tui.enter()?; // Starts event handler, enters raw mode, enters alternate screen

        while self.running {
            tui.draw(|frame| {
                let context = context!(self);
                self.component
                    .render(frame.area(), frame.buffer_mut(), &context)
            })?;

            let incoming = tokio::select! {
                event = tui.next() => event.map(Incoming::Tui),
                action = self.action_receiver.recv() => action.map(Incoming::Action),
            };
            match incoming {
                Some(Incoming::Tui(event)) => self.handle_tui_event(event),
                Some(Incoming::Action(action)) => self.dispatch(action),
                None => break,
            }
        }

        tui.exit()?; // stops event handler, exits raw mode, exits alternate screen
        Ok(())
    }

    fn handle_tui_event(&mut self, event: TuiEvent) {
        match event {
            TuiEvent::Key(key_event) if key_event.kind == KeyEventKind::Press => {
                self.on_key(key_event)
            }
            TuiEvent::Error => log::warn!("Terminal event stream reported an error"),
            _ => {}
        }
    }

    pub fn on_key(&mut self, key_event: KeyEvent) {
        let context = context!(self);
        if let Some(action) = self.component.on_key(key_event, &context) {
            self.dispatch(action);
        }
    }

    // Runs an action. Failures end up on the status line, not in a crash.
    fn dispatch(&mut self, action: Action) {
        if let Err(e) = self.handle_action(action) {
            log::error!("{e}");
            self.set_status(e.to_string());
        }
    }

    pub fn handle_action(&mut self, action: Action) -> Result<()> {
        match action {
            Action::Quit => self.quit(),
            Action::Status(message) => self.set_status(message),
            Action::SwitchComponent(component) => {
                self.status = None;
                self.refresh_characters();
                self.component = component;
            }

            Action::NewHero { name, class } => {
                let hero = Hero::new(name, HeroClass::new(class));
                self.store.save_character(&hero)?;
                log::info!("Created {} the {}", hero.name, class);
                self.load_hero(&hero.id)?;
            }
            Action::LoadHero(id) => self.load_hero(&id)?,
            Action::DeleteHero(id) => self.delete_hero(&id)?,
            Action::DuplicateHero(id) => {
                let copy = save::duplicate_character(&self.store.load_character(&id)?);
                self.store.save_character(&copy)?;
                self.refresh_characters();
                self.set_status(format!("Created {}", copy.name));
            }
            Action::ExportHero(id) => match self.export_hero(&id) {
                Ok(path) => self.set_status(format!("Exported to {}", path.display())),
                Err(e) => {
                    log::error!("Export failed: {e:#}");
                    self.set_status(format!("Export failed: {e}"));
                }
            },
            Action::OpenImport => {
                let folder = self.exports_dir();
                let files = list_json_files(&folder);
                self.status = None;
                self.component = ComponentEnum::from(ImportMenu::new(folder, files));
            }
            Action::ImportFile(path) => self.import_file(&path)?,

            Action::Hero(command) => {
                self.apply_hero_command(command)?;
                self.persist()?;
            }
            Action::Combat(command) => {
                self.apply_combat_command(command)?;
                self.persist()?;
            }
            Action::ClearRoll => self.show_roll = false,

            Action::SetPortraitUrl(url) => self.check_portrait_url(url)?,
            Action::PortraitChecked {
                hero_id,
                url,
                result,
            } => self.finish_portrait_url(&hero_id, url, result)?,
            Action::UploadPortrait(path) => self.upload_portrait(&path)?,
            Action::RemovePortrait => {
                let hero_id = self.hero()?.id.clone();
                if self.save_portrait(&hero_id, self.portrait.without_image())? {
                    self.set_status("Portrait removed".to_string());
                }
            }
        }
        Ok(())
    }

    fn quit(&mut self) {
        self.running = false;
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn current_hero(&self) -> Option<&Hero> {
        self.hero.as_ref()
    }

    pub fn characters(&self) -> &[StoredCharacter] {
        &self.characters
    }

    pub fn portrait(&self) -> &PortraitSettings {
        &self.portrait
    }

    pub fn session(&self) -> &CombatSession {
        &self.session
    }

    pub fn roll_history(&self) -> &RollHistory {
        &self.roll_history
    }

    pub fn roll_visible(&self) -> bool {
        self.show_roll
    }

    pub fn component(&self) -> &ComponentEnum {
        &self.component
    }

    pub fn exports_dir(&self) -> PathBuf {
        self.data_dir.join(EXPORTS_DIR)
    }

    fn set_status(&mut self, message: String) {
        log::debug!("status: {message}");
        self.status = Some(message);
    }

    fn refresh_characters(&mut self) {
        self.characters = self.store.list_characters();
    }

    fn hero(&self) -> Result<&Hero> {
        self.hero.as_ref().ok_or(AppError::NoHeroLoaded)
    }

    fn load_hero(&mut self, id: &str) -> Result<()> {
        let hero = self.store.load_character(id)?;
        self.store.set_active(Some(id))?;
        self.portrait = self.portraits.load(id);
        self.session = CombatSession::new();
        self.roll_history.clear();
        self.show_roll = false;
        self.roll_clear.cancel();
        log::info!("Loaded {} ({})", hero.name, hero.id);
        self.hero = Some(hero);
        self.refresh_characters();
        self.status = None;
        self.component = ComponentEnum::from(HeroSheet::new());
        Ok(())
    }

    fn delete_hero(&mut self, id: &str) -> Result<()> {
        self.store.delete_character(id)?;
        self.portraits.delete(id)?;
        if self.hero.as_ref().is_some_and(|hero| hero.id == id) {
            self.hero = None;
            self.session = CombatSession::new();
            self.portrait = PortraitSettings::default();
        }
        self.refresh_characters();
        self.set_status("Hero deleted".to_string());
        Ok(())
    }

    // Writes the loaded hero back. A refused write leaves the file as it was.
    fn persist(&mut self) -> Result<()> {
        let Some(hero) = &self.hero else {
            return Ok(());
        };
        match self.store.save_character(hero) {
            Ok(_) => {
                self.refresh_characters();
                Ok(())
            }
            Err(StorageError::QuotaExceeded { needed, limit }) => {
                self.set_status(storage_full(needed, limit));
                Ok(())
            }
            Err(e) => Err(e.into()),
        }
    }

    // Stores and shows the new portrait. Over quota, the old one stays.
    fn save_portrait(&mut self, hero_id: &str, settings: PortraitSettings) -> Result<bool> {
        match self.portraits.save(hero_id, &settings) {
            Ok(()) => {
                self.portrait = settings;
                Ok(true)
            }
            Err(StorageError::QuotaExceeded { needed, limit }) => {
                self.set_status(storage_full(needed, limit));
                Ok(false)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn export_hero(&self, id: &str) -> anyhow::Result<PathBuf> {
        let hero = self
            .store
            .load_character(id)
            .with_context(|| format!("loading character {id}"))?;
        let json = save::export_character(&hero)?;
        let folder = self.exports_dir();
        fs::create_dir_all(&folder)
            .with_context(|| format!("creating {}", folder.display()))?;
        let path = folder.join(save::export_filename(&hero));
        fs::write(&path, json).with_context(|| format!("writing {}", path.display()))?;
        log::info!("Exported {} to {}", hero.name, path.display());
        Ok(path)
    }

    fn import_file(&mut self, path: &Path) -> Result<()> {
        let json = fs::read_to_string(path)?;
        let validation = save::import_character_from_json(&json);
        for warning in &validation.warnings {
            log::warn!("Import {}: {warning}", path.display());
        }
        let hero = match validation.hero {
            Some(hero) if validation.valid => hero,
            _ => return Err(AppError::ImportRejected(validation.errors)),
        };

        let outcome = self.store.import_character(hero)?;
        self.refresh_characters();
        self.component = ComponentEnum::from(Roster::new());
        let mut message = format!("Imported {}", outcome.hero.name);
        if !validation.warnings.is_empty() {
            message.push_str(&format!(" with {} warning(s)", validation.warnings.len()));
        }
        self.set_status(message);
        Ok(())
    }

    fn apply_hero_command(&mut self, command: HeroCommand) -> Result<()> {
        let hero = self.hero.as_mut().ok_or(AppError::NoHeroLoaded)?;
        let is_respite = command == HeroCommand::Respite;
        let message = match command {
            HeroCommand::Damage(amount) => {
                hero.deal_damage(amount);
                Some(format!("{} took {amount} damage ({})", hero.name, hero.stamina_state()))
            }
            HeroCommand::Heal(amount) => {
                hero.heal(amount);
                None
            }
            HeroCommand::UseRecovery => {
                (!hero.use_recovery()).then(|| "No recoveries left".to_string())
            }
            HeroCommand::Respite => {
                hero.respite();
                Some(format!("Respite taken. XP is now {}", hero.xp))
            }
            HeroCommand::LevelUp => Some(if hero.level_up() {
                format!("{} reached level {}", hero.name, hero.level)
            } else {
                match progression::xp_to_next_level(hero.level, hero.xp) {
                    Some(needed) => format!("{needed} more XP needed"),
                    None => "Already at max level".to_string(),
                }
            }),
            HeroCommand::AddVictory => {
                hero.victories += 1;
                None
            }
            HeroCommand::AdjustResource(delta) => {
                if hero.summoner().is_none() {
                    hero.adjust_heroic_resource(delta);
                    None
                } else if delta >= 0 {
                    self.session.gain_essence(hero, delta);
                    None
                } else {
                    (!self.session.spend_essence(hero, -delta))
                        .then(|| "Not enough essence".to_string())
                }
            }
            HeroCommand::ToggleCondition(id) => {
                if hero.has_condition(id) {
                    hero.remove_condition(id);
                } else {
                    hero.add_condition(id, None, None, None);
                }
                None
            }
            HeroCommand::CycleEndType(id) => {
                if let Some(end_type) = hero.condition(id).map(|active| active.end_type.cycle()) {
                    hero.update_condition_end_type(id, end_type);
                }
                None
            }
            HeroCommand::AttemptSave(id) => {
                let save = hero.attempt_save(&mut self.rng, id);
                Some(format!(
                    "Save against {}: rolled {} ({})",
                    save.name,
                    save.roll,
                    if save.removed {
                        "condition ends"
                    } else if save.success {
                        "success"
                    } else {
                        "failed"
                    }
                ))
            }
        };
        // Squads are gone after a respite, so is the fight.
        if is_respite {
            self.session = CombatSession::new();
        }
        if let Some(message) = message {
            self.set_status(message);
        }
        Ok(())
    }

    fn apply_combat_command(&mut self, command: CombatCommand) -> Result<()> {
        let hero = self.hero.as_mut().ok_or(AppError::NoHeroLoaded)?;
        let session = &mut self.session;
        let message = match command {
            CombatCommand::Start => {
                let free = session.start_combat(hero);
                Some(format!("Combat started. {free} minion(s) join the fight"))
            }
            CombatCommand::End => {
                session.end_combat(hero);
                Some("Combat ended".to_string())
            }
            CombatCommand::NewRound => {
                let free = session.start_new_turn(hero);
                Some(format!(
                    "Round {}. {} essence now, {free} free minion(s)",
                    session.summoner_turn.round_number, hero.heroic_resource.current
                ))
            }
            CombatCommand::AdvancePhase => (!session.advance_phase())
                .then(|| "Already executing the plan".to_string()),
            CombatCommand::TogglePhase(phase) => {
                session.hero_turn.toggle_phase(phase);
                None
            }
            CombatCommand::EndHeroTurn => {
                let saves = session.end_hero_turn(hero, &mut self.rng);
                let summary: Vec<String> = saves
                    .iter()
                    .map(|save| {
                        format!(
                            "{} {} ({})",
                            save.name,
                            if save.removed { "ended" } else { "holds" },
                            save.roll
                        )
                    })
                    .collect();
                Some(if summary.is_empty() {
                    format!("Turn {} begins", session.hero_turn.turn_number)
                } else {
                    format!("Saves: {}", summary.join(", "))
                })
            }
            CombatCommand::PowerRoll {
                characteristic,
                modifier,
            } => {
                let roll = perform_power_roll(
                    &mut self.rng,
                    hero.characteristics.get(characteristic),
                    modifier,
                );
                let entry = self
                    .roll_history
                    .add(roll, format!("{characteristic} test"), RollSource::Hero);
                log::debug!("{} rolled {} ({})", hero.name, entry.result.total, entry.result.tier);
                self.show_roll = true;
                self.roll_clear.schedule(
                    Duration::from_secs(self.settings.roll_clear_seconds),
                    self.action_sender.clone(),
                    Action::ClearRoll,
                );
                None
            }
            CombatCommand::DamageSquad { squad_id, amount } => {
                let outcome = session.damage_squad(hero, &squad_id, amount);
                let mut message = format!("{} minion(s) fell", outcome.minions_killed);
                if outcome.overflow_damage > 0 {
                    message.push_str(&format!(
                        ", {} overflow damage to {}",
                        outcome.overflow_damage, hero.name
                    ));
                }
                Some(message)
            }
            CombatCommand::HealSquad { squad_id, amount } => {
                session.heal_squad(hero, &squad_id, amount);
                None
            }
            CombatCommand::Summon {
                template_id,
                target_squad_id,
            } => {
                let template = summoner::find_template(&template_id)
                    .ok_or_else(|| AppError::UnknownTemplate(template_id.clone()))?;
                let options = SummonOptions {
                    target_squad_id,
                    ..SummonOptions::default()
                };
                Some(match session.summon(hero, template, &options) {
                    Ok(_) => format!("Summoned {} x{}", template.name, template.minions_per_summon),
                    Err(validation) => validation.message,
                })
            }
            CombatCommand::Sacrifice { minion_id } => {
                let result = essence::execute_sacrifice(hero, &[minion_id]);
                Some(match result.error {
                    Some(error) => error,
                    None if result.sacrificed_minion_ids.is_empty() => {
                        "No minion to sacrifice".to_string()
                    }
                    None => {
                        if session.sacrifice_minion(hero) {
                            "Minion sacrificed. +1 essence".to_string()
                        } else {
                            "Minion sacrificed".to_string()
                        }
                    }
                })
            }
            CombatCommand::ToggleFixture => {
                if hero.summoner().is_some_and(|state| state.fixture_active()) {
                    essence::dismiss_fixture(hero);
                    Some("Fixture dismissed".to_string())
                } else {
                    Some(match essence::summon_fixture(hero) {
                        Ok(()) => "Fixture summoned".to_string(),
                        Err(validation) => validation.message,
                    })
                }
            }
        };
        if let Some(message) = message {
            self.set_status(message);
        }
        Ok(())
    }

    // Validation happens off the event loop. The answer comes back as an action.
    fn check_portrait_url(&mut self, url: String) -> Result<()> {
        let hero_id = self.hero()?.id.clone();
        let sender = self.action_sender.clone();
        let limit = Duration::from_secs(self.settings.portrait_timeout_seconds);
        tokio::spawn(async move {
            let result = portrait::validate_url(&url, limit)
                .await
                .map_err(|e| e.to_string());
            let _ = sender.send(Action::PortraitChecked {
                hero_id,
                url,
                result,
            });
        });
        self.set_status("Checking portrait URL...".to_string());
        Ok(())
    }

    fn finish_portrait_url(
        &mut self,
        hero_id: &str,
        url: String,
        result: std::result::Result<(), String>,
    ) -> Result<()> {
        // The user may have switched heroes while the request was out.
        if self.hero.as_ref().is_none_or(|hero| hero.id != hero_id) {
            return Ok(());
        }
        match result {
            Ok(()) => {
                if self.save_portrait(hero_id, self.portrait.clone().with_url(url))? {
                    self.set_status("Portrait set".to_string());
                }
            }
            Err(e) => {
                log::warn!("Portrait URL {url} rejected: {e}");
                self.set_status(portrait::URL_FAILED.to_string());
            }
        }
        Ok(())
    }

    fn upload_portrait(&mut self, path: &Path) -> Result<()> {
        let hero_id = self.hero()?.id.clone();
        let processed = fs::read(path)
            .map_err(AppError::from)
            .and_then(|bytes| portrait::process_upload(&bytes).map_err(AppError::from));
        match processed {
            Ok(data_url) => {
                if self.save_portrait(&hero_id, self.portrait.clone().with_upload(data_url))? {
                    self.set_status("Portrait set".to_string());
                }
            }
            Err(e) => {
                log::warn!("Portrait upload from {} failed: {e}", path.display());
                self.set_status(portrait::UPLOAD_FAILED.to_string());
            }
        }
        Ok(())
    }
}

fn storage_full(needed: u64, limit: u64) -> String {
    format!("Not saved: storage is full ({needed} of {limit} bytes)")
}

/// JSON files directly inside `folder`, sorted by name.
pub fn list_json_files(folder: &Path) -> Vec<PathBuf> {
    let Ok(entries) = fs::read_dir(folder) else {
        return Vec::new();
    };
    let mut files: Vec<PathBuf> = entries
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext == "json"))
        .collect();
    files.sort();
    files
}
