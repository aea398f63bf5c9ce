// Character persistence: one JSON file per hero, an active-hero pointer,
// and the export/import format shared with other installs.
use chrono::Utc;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs::{self, create_dir_all, read_dir, remove_file};
use std::path::{Path, PathBuf};
use uuid::Uuid;

use crate::error::StorageError;
use crate::hero::{ClassKind, Hero, MAX_LEVEL, MIN_LEVEL};
use crate::logging::LOG_FILE;

pub const CHARACTERS_DIR: &str = "characters";
pub const ACTIVE_FILE: &str = "active.json";
pub const SCHEMA_VERSION: &str = "1.0.0";
pub const APP_VERSION: &str = env!("CARGO_PKG_VERSION");

const MAX_FILENAME_LEN: usize = 50;

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct StoredCharacter {
    pub id: String,
    pub name: String,
    pub level: u8,
    pub hero_class: ClassKind, // Lets the roster filter without reading `data`.
    pub last_modified: i64,    // Milliseconds since the epoch.
    pub data: Hero,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
struct ActivePointer {
    id: String,
}

// Wrapper written by export. Field names match the files other installs produce.
#[derive(Serialize, Deserialize, Clone, Debug)]
#[serde(rename_all = "camelCase")]
pub struct ExportedCharacter {
    pub schema_version: String,
    pub exported_at: String,
    pub app_version: String,
    pub character: Hero,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportValidation {
    pub valid: bool,
    pub errors: Vec<String>,
    pub warnings: Vec<String>,
    pub hero: Option<Hero>,
}

impl ImportValidation {
    fn rejected(errors: Vec<String>, warnings: Vec<String>) -> Self {
        ImportValidation {
            valid: false,
            errors,
            warnings,
            hero: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ImportOutcome {
    pub hero: Hero,
    pub renamed: bool,
    pub id_regenerated: bool,
}

/// Byte budget shared by every file the app keeps under the data directory.
/// The log file is not counted.
#[derive(Debug, Clone)]
pub struct StorageQuota {
    root: PathBuf,
    limit: u64,
}

impl StorageQuota {
    pub fn new(data_dir: impl AsRef<Path>, limit: u64) -> Self {
        StorageQuota {
            root: data_dir.as_ref().to_path_buf(),
            limit,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn used_bytes(&self) -> u64 {
        dir_size(&self.root, &self.root.join(LOG_FILE))
    }

    /// Replaces `path` with `data` through a temp file, or refuses with
    /// `QuotaExceeded` and leaves the old file untouched.
    pub fn write(&self, path: &Path, data: &str) -> Result<(), StorageError> {
        let needed = self.used_bytes().saturating_sub(file_len(path)) + data.len() as u64;
        if needed > self.limit {
            log::warn!(
                "Dropping write to {}: {} bytes needed, quota is {}",
                path.display(),
                needed,
                self.limit
            );
            return Err(StorageError::QuotaExceeded {
                needed,
                limit: self.limit,
            });
        }
        if let Some(parent) = path.parent() {
            create_dir_all(parent)?;
        }
        let tmp = path.with_extension("json.tmp");
        fs::write(&tmp, data)?;
        fs::rename(&tmp, path)?;
        Ok(())
    }
}

fn file_len(path: &Path) -> u64 {
    fs::metadata(path).map(|meta| meta.len()).unwrap_or(0)
}

fn dir_size(dir: &Path, skip: &Path) -> u64 {
    let Ok(entries) = read_dir(dir) else {
        return 0;
    };
    entries
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| path != skip)
        .map(|path| {
            if path.is_dir() {
                dir_size(&path, skip)
            } else {
                file_len(&path)
            }
        })
        .sum()
}

#[derive(Debug, Clone)]
pub struct CharacterStore {
    root: PathBuf,
    quota: StorageQuota,
}

impl CharacterStore {
    pub fn new(data_dir: impl AsRef<Path>, quota_bytes: u64) -> Self {
        CharacterStore {
            root: data_dir.as_ref().to_path_buf(),
            quota: StorageQuota::new(data_dir, quota_bytes),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }


    fn characters_dir(&self) -> PathBuf {
        self.root.join(CHARACTERS_DIR)
    }

    fn character_path(&self, id: &str) -> PathBuf {
        self.characters_dir().join(format!("{id}.json"))
    }

    pub fn used_bytes(&self) -> u64 {
        self.quota.used_bytes()
    }

    /// Inserts or replaces the hero's file and stamps it with the current time.
    pub fn save_character(&self, hero: &Hero) -> Result<StoredCharacter, StorageError> {
        let stored = StoredCharacter {
            id: hero.id.clone(),
            name: hero.name.clone(),
            level: hero.level,
            hero_class: hero.class_kind(),
            last_modified: Utc::now().timestamp_millis(),
            data: hero.clone(),
        };
        let data = serde_json::to_string(&stored)?;
        self.quota.write(&self.character_path(&hero.id), &data)?;
        log::debug!("Saved {} ({})", hero.name, hero.id);
        Ok(stored)
    }

    pub fn load_character(&self, id: &str) -> Result<Hero, StorageError> {
        let path = self.character_path(id);
        if !path.exists() {
            return Err(StorageError::NotFound(id.to_string()));
        }
        let data = fs::read_to_string(path)?;
        let stored: StoredCharacter = serde_json::from_str(&data)?;
        Ok(stored.data)
    }

    /// Every readable character, most recently modified first. Files that fail
    /// to parse are logged and skipped.
    pub fn list_characters(&self) -> Vec<StoredCharacter> {
        let Ok(entries) = read_dir(self.characters_dir()) else {
            return Vec::new();
        };

        let mut characters: Vec<StoredCharacter> = entries
            .filter_map(|entry| {
                let path = entry.ok()?.path();
                if !path.is_file() || path.extension()? != "json" {
                    return None;
                }
                let data = fs::read_to_string(&path).ok()?;
                match serde_json::from_str(&data) {
                    Ok(stored) => Some(stored),
                    Err(e) => {
                        log::error!("Skipping unreadable character {}: {}", path.display(), e);
                        None
                    }
                }
            })
            .collect();
        characters.sort_by(|a, b| b.last_modified.cmp(&a.last_modified));
        characters
    }

    pub fn characters_by_class(&self, class: ClassKind) -> Vec<StoredCharacter> {
        self.list_characters()
            .into_iter()
            .filter(|stored| stored.hero_class == class)
            .collect()
    }

    /// Removes the hero. Clears the active pointer when it pointed here.
    pub fn delete_character(&self, id: &str) -> Result<(), StorageError> {
        match remove_file(self.character_path(id)) {
            Ok(()) => {}
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(StorageError::NotFound(id.to_string()));
            }
            Err(e) => return Err(e.into()),
        }
        if self.active_id().as_deref() == Some(id) {
            self.set_active(None)?;
        }
        log::info!("Deleted character {}", id);
        Ok(())
    }

    pub fn active_id(&self) -> Option<String> {
        let data = fs::read_to_string(self.root.join(ACTIVE_FILE)).ok()?;
        serde_json::from_str::<ActivePointer>(&data)
            .ok()
            .map(|pointer| pointer.id)
    }

    pub fn set_active(&self, id: Option<&str>) -> Result<(), StorageError> {
        let path = self.root.join(ACTIVE_FILE);
        match id {
            Some(id) => {
                let data = serde_json::to_string(&ActivePointer { id: id.to_string() })?;
                self.quota.write(&path, &data)
            }
            None => match remove_file(path) {
                Err(e) if e.kind() != std::io::ErrorKind::NotFound => Err(e.into()),
                _ => Ok(()),
            },
        }
    }

    /// Stores an imported hero without clobbering anything already here.
    /// A clashing name gets an "(Imported)" suffix and a fresh id; a clashing
    /// id alone just gets a fresh id.
    pub fn import_character(&self, mut hero: Hero) -> Result<ImportOutcome, StorageError> {
        let existing = self.list_characters();
        let name_taken = |name: &str| existing.iter().any(|stored| stored.name == name);
        let id_taken = existing.iter().any(|stored| stored.id == hero.id);

        let mut renamed = false;
        if name_taken(&hero.name) {
            let base = hero.name.clone();
            let mut candidate = format!("{base} (Imported)");
            let mut n = 2;
            while name_taken(&candidate) {
                candidate = format!("{base} (Imported {n})");
                n += 1;
            }
            hero.name = candidate;
            renamed = true;
        }

        let id_regenerated = renamed || id_taken;
        if id_regenerated {
            hero.id = Uuid::new_v4().to_string();
        }

        self.save_character(&hero)?;
        log::info!("Imported {} as {}", hero.name, hero.id);
        Ok(ImportOutcome {
            hero,
            renamed,
            id_regenerated,
        })
    }
}

pub fn export_character(hero: &Hero) -> Result<String, StorageError> {
    let export = ExportedCharacter {
        schema_version: SCHEMA_VERSION.to_string(),
        exported_at: Utc::now().to_rfc3339(),
        app_version: APP_VERSION.to_string(),
        character: hero.clone(),
    };
    Ok(serde_json::to_string_pretty(&export)?)
}

/// Lowercase, dash separated, at most 50 characters. Never empty.
pub fn sanitize_filename(name: &str) -> String {
    let kept: String = name
        .trim()
        .to_lowercase()
        .chars()
        .filter(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c.is_whitespace() || *c == '-')
        .map(|c| if c.is_whitespace() { '-' } else { c })
        .collect();

    let mut collapsed = String::with_capacity(kept.len());
    for c in kept.chars() {
        if c == '-' && collapsed.ends_with('-') {
            continue;
        }
        collapsed.push(c);
    }

    let trimmed: String = collapsed
        .trim_matches('-')
        .chars()
        .take(MAX_FILENAME_LEN)
        .collect();
    let trimmed = trimmed.trim_end_matches('-');
    if trimmed.is_empty() {
        "character".to_string()
    } else {
        trimmed.to_string()
    }
}

pub fn export_filename(hero: &Hero) -> String {
    format!("{}.json", sanitize_filename(&hero.name))
}

/// Checks an import file and turns it into a hero. Problems come back as
/// messages in the result, never as an error.
pub fn import_character_from_json(json: &str) -> ImportValidation {
    let mut errors = Vec::new();
    let mut warnings = Vec::new();

    let data: Value = match serde_json::from_str(json) {
        Ok(data) => data,
        Err(e) => {
            errors.push(format!("Failed to parse JSON: {e}"));
            return ImportValidation::rejected(errors, warnings);
        }
    };

    let Value::Object(root) = data else {
        errors.push("Invalid file format: expected JSON object".to_string());
        return ImportValidation::rejected(errors, warnings);
    };

    let mut character = if let Some(Value::Object(character)) = root.get("character") {
        if let Some(version) = root.get("schemaVersion").and_then(Value::as_str) {
            if version != SCHEMA_VERSION {
                warnings.push(format!("Character was exported with schema version {version}"));
            }
        }
        character.clone()
    } else if root.contains_key("name") && root.contains_key("hero_class") {
        warnings.push("Character file is in legacy format (unwrapped)".to_string());
        root
    } else if root.contains_key("name") && root.contains_key("level") {
        warnings.push("Character file is in very old format, some data may be missing".to_string());
        root
    } else {
        errors.push("Invalid character format: missing required fields".to_string());
        return ImportValidation::rejected(errors, warnings);
    };

    let name_ok = character
        .get("name")
        .and_then(Value::as_str)
        .is_some_and(|name| !name.trim().is_empty());
    if !name_ok {
        errors.push("Character name must be a non-empty string".to_string());
    }

    let level_ok = character
        .get("level")
        .and_then(Value::as_u64)
        .is_some_and(|level| (u64::from(MIN_LEVEL)..=u64::from(MAX_LEVEL)).contains(&level));
    if !level_ok {
        errors.push(format!(
            "Character level must be a number between {MIN_LEVEL} and {MAX_LEVEL}"
        ));
    }

    match character.get("hero_class") {
        Some(Value::String(class)) if class.parse::<ClassKind>().is_err() => {
            errors.push(format!("Invalid heroClass: {class}"));
        }
        Some(Value::String(_)) => {}
        Some(other) => errors.push(format!("Invalid heroClass: {other}")),
        // Files from before other classes existed were always summoners.
        None => {
            character.insert(
                "hero_class".to_string(),
                Value::String(ClassKind::Summoner.as_ref().to_string()),
            );
        }
    }

    if !errors.is_empty() {
        return ImportValidation::rejected(errors, warnings);
    }

    match serde_json::from_value::<Hero>(Value::Object(character)) {
        Ok(hero) => {
            for warning in &warnings {
                log::warn!("Import of {}: {}", hero.name, warning);
            }
            ImportValidation {
                valid: true,
                errors,
                warnings,
                hero: Some(hero),
            }
        }
        Err(e) => {
            errors.push(format!("Failed to parse JSON: {e}"));
            ImportValidation::rejected(errors, warnings)
        }
    }
}

/// A fresh copy ready for a new encounter. Progression is kept.
pub fn duplicate_character(hero: &Hero) -> Hero {
    let mut copy = hero.clone();
    copy.id = Uuid::new_v4().to_string();
    copy.name = format!("{} (Copy)", hero.name);
    copy.stamina.current = copy.stamina.max;
    copy.recoveries.current = copy.recoveries.max;
    copy.surges = 0;
    copy.active_conditions.clear();
    copy
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::conditions::ConditionId;
    use crate::hero::HeroClass;
    use std::thread::sleep;
    use std::time::Duration;
    use tempfile::tempdir;

    const QUOTA: u64 = 5 * 1024 * 1024;

    fn hero(name: &str, kind: ClassKind) -> Hero {
        Hero::new(name, HeroClass::new(kind))
    }

    #[test]
    fn save_load_and_list() {
        let dir = tempdir().unwrap();
        let store = CharacterStore::new(dir.path(), QUOTA);
        assert!(store.list_characters().is_empty());

        let first = hero("Ash", ClassKind::Censor);
        let second = hero("Birch", ClassKind::Summoner);
        store.save_character(&first).unwrap();
        sleep(Duration::from_millis(5));
        store.save_character(&second).unwrap();

        assert_eq!(store.load_character(&first.id).unwrap(), first);
        let names: Vec<String> = store.list_characters().into_iter().map(|s| s.name).collect();
        assert_eq!(names, vec!["Birch", "Ash"]);

        // Saving again is an update, not a second entry, and bumps it to the top.
        sleep(Duration::from_millis(5));
        let mut renamed = first.clone();
        renamed.level = 3;
        store.save_character(&renamed).unwrap();
        let listed = store.list_characters();
        assert_eq!(listed.len(), 2);
        assert_eq!(listed[0].id, first.id);
        assert_eq!(listed[0].level, 3);

        assert_eq!(store.characters_by_class(ClassKind::Summoner).len(), 1);
        assert!(matches!(
            store.load_character("missing"),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn deleting_the_active_hero_clears_the_pointer() {
        let dir = tempdir().unwrap();
        let store = CharacterStore::new(dir.path(), QUOTA);
        let a = hero("Ash", ClassKind::Fury);
        let b = hero("Birch", ClassKind::Fury);
        store.save_character(&a).unwrap();
        store.save_character(&b).unwrap();

        store.set_active(Some(&a.id)).unwrap();
        store.delete_character(&b.id).unwrap();
        assert_eq!(store.active_id(), Some(a.id.clone()));

        store.delete_character(&a.id).unwrap();
        assert_eq!(store.active_id(), None);
        assert!(matches!(
            store.delete_character(&a.id),
            Err(StorageError::NotFound(_))
        ));
    }

    #[test]
    fn writes_over_quota_are_dropped() {
        let dir = tempdir().unwrap();
        let store = CharacterStore::new(dir.path(), 256);
        let big = hero("Ash", ClassKind::Summoner);
        let result = store.save_character(&big);
        assert!(matches!(result, Err(StorageError::QuotaExceeded { limit: 256, .. })));
        assert!(store.list_characters().is_empty());
        assert_eq!(store.used_bytes(), 0);
    }

    #[test]
    fn quota_counts_every_file_but_the_log() {
        let dir = tempdir().unwrap();
        fs::create_dir_all(dir.path().join("portraits")).unwrap();
        fs::write(dir.path().join("portraits").join("a.json"), "x".repeat(300)).unwrap();
        fs::write(dir.path().join("custom_items.json"), "x".repeat(100)).unwrap();
        fs::write(dir.path().join(LOG_FILE), "x".repeat(5000)).unwrap();

        let quota = StorageQuota::new(dir.path(), 450);
        assert_eq!(quota.used_bytes(), 400);
        let path = dir.path().join("custom_items.json");
        assert!(quota.write(&path, &"y".repeat(150)).is_ok());
        assert!(matches!(
            quota.write(&path, &"y".repeat(151)),
            Err(StorageError::QuotaExceeded { needed: 451, limit: 450 })
        ));
        assert_eq!(fs::read_to_string(&path).unwrap(), "y".repeat(150));

        let store = CharacterStore::new(dir.path(), 450);
        assert!(matches!(
            store.save_character(&hero("Ash", ClassKind::Summoner)),
            Err(StorageError::QuotaExceeded { limit: 450, .. })
        ));
    }

    #[test]
    fn filenames_are_sanitized() {
        assert_eq!(sanitize_filename("  Vex the Bold!  "), "vex-the-bold");
        assert_eq!(sanitize_filename("A -- B"), "a-b");
        assert_eq!(sanitize_filename("!!!"), "character");
        assert_eq!(sanitize_filename(&"x".repeat(80)).len(), 50);
        assert_eq!(export_filename(&hero("Ash Grey", ClassKind::Null)), "ash-grey.json");
    }

    #[test]
    fn export_wraps_the_hero() {
        let original = hero("Ash", ClassKind::Talent);
        let json = export_character(&original).unwrap();
        let value: Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["schemaVersion"], SCHEMA_VERSION);
        assert_eq!(value["appVersion"], APP_VERSION);
        assert!(value["exportedAt"].is_string());

        let validation = import_character_from_json(&json);
        assert!(validation.valid);
        assert!(validation.warnings.is_empty());
        assert_eq!(validation.hero, Some(original));
    }

    #[test]
    fn import_reports_problems() {
        let invalid = import_character_from_json("[1, 2]");
        assert_eq!(invalid.errors, vec!["Invalid file format: expected JSON object"]);

        let broken = import_character_from_json("{ nope");
        assert!(broken.errors[0].starts_with("Failed to parse JSON"));

        let missing = import_character_from_json(r#"{"foo": 1}"#);
        assert_eq!(missing.errors, vec!["Invalid character format: missing required fields"]);

        let mut value = serde_json::to_value(hero("Ash", ClassKind::Shadow)).unwrap();
        value["name"] = Value::from("  ");
        value["level"] = Value::from(11);
        value["hero_class"] = Value::from("wizard");
        let result = import_character_from_json(&value.to_string());
        assert!(!result.valid);
        assert_eq!(
            result.errors,
            vec![
                "Character name must be a non-empty string",
                "Character level must be a number between 1 and 10",
                "Invalid heroClass: wizard",
            ]
        );
        assert!(result.hero.is_none());
    }

    #[test]
    fn import_warns_about_old_formats() {
        let original = hero("Ash", ClassKind::Elementalist);
        let raw = serde_json::to_string(&original).unwrap();
        let result = import_character_from_json(&raw);
        assert!(result.valid);
        assert_eq!(result.warnings, vec!["Character file is in legacy format (unwrapped)"]);

        let exported = export_character(&original).unwrap();
        let mut wrapped: Value = serde_json::from_str(&exported).unwrap();
        wrapped["schemaVersion"] = Value::from("0.9.0");
        let result = import_character_from_json(&wrapped.to_string());
        assert_eq!(result.warnings, vec!["Character was exported with schema version 0.9.0"]);

        // No class at all: treated as a summoner.
        let mut summoner = serde_json::to_value(hero("Old", ClassKind::Summoner)).unwrap();
        summoner.as_object_mut().unwrap().remove("hero_class");
        let result = import_character_from_json(&summoner.to_string());
        assert!(result.valid, "{:?}", result.errors);
        assert_eq!(result.hero.unwrap().class_kind(), ClassKind::Summoner);
    }

    #[test]
    fn imports_never_clobber() {
        let dir = tempdir().unwrap();
        let store = CharacterStore::new(dir.path(), QUOTA);
        let original = hero("Ash", ClassKind::Tactician);
        store.save_character(&original).unwrap();

        let first = store.import_character(original.clone()).unwrap();
        assert!(first.renamed && first.id_regenerated);
        assert_eq!(first.hero.name, "Ash (Imported)");
        assert_ne!(first.hero.id, original.id);

        let second = store.import_character(original.clone()).unwrap();
        assert_eq!(second.hero.name, "Ash (Imported 2)");

        let mut same_id = hero("Birch", ClassKind::Tactician);
        same_id.id = original.id.clone();
        let third = store.import_character(same_id).unwrap();
        assert!(!third.renamed && third.id_regenerated);

        let fresh = hero("Cedar", ClassKind::Tactician);
        let fourth = store.import_character(fresh.clone()).unwrap();
        assert_eq!(fourth.hero, fresh);
        assert_eq!(store.list_characters().len(), 5);
    }

    #[test]
    fn duplicates_start_fresh() {
        let mut original = hero("Ash", ClassKind::Conduit);
        original.stamina.current = 3;
        original.recoveries.current = 0;
        original.surges = 2;
        original.victories = 4;
        original.add_condition(ConditionId::Bleeding, None, None, None);

        let copy = duplicate_character(&original);
        assert_ne!(copy.id, original.id);
        assert_eq!(copy.name, "Ash (Copy)");
        assert_eq!(copy.stamina.current, copy.stamina.max);
        assert_eq!(copy.recoveries.current, copy.recoveries.max);
        assert_eq!(copy.surges, 0);
        assert!(copy.active_conditions.is_empty());
        assert_eq!(copy.victories, 4);
    }
}
