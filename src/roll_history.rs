use std::collections::VecDeque;

use chrono::{DateTime, Utc};
use derive_more::Deref;
use serde::{Deserialize, Serialize};
use strum_macros::Display;
use uuid::Uuid;

use crate::dice::PowerRoll;

pub const MAX_HISTORY_SIZE: usize = 50;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
pub enum RollSource {
    Ability,
    Minion,
    Hero,
    Other,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RollEntry {
    pub id: Uuid,
    pub result: PowerRoll,
    pub source: String, // e.g. "Summoner Strike", "Skeleton Free Strike"
    pub source_type: RollSource,
    pub rolled_at: DateTime<Utc>,
}

/// Newest-first log of power rolls, capped at [`MAX_HISTORY_SIZE`].
#[derive(Debug, Clone, Default, Deref)]
pub struct RollHistory {
    entries: VecDeque<RollEntry>,
}

impl RollHistory {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(
        &mut self,
        result: PowerRoll,
        source: impl Into<String>,
        source_type: RollSource,
    ) -> &RollEntry {
        self.entries.push_front(RollEntry {
            id: Uuid::new_v4(),
            result,
            source: source.into(),
            source_type,
            rolled_at: Utc::now(),
        });
        self.entries.truncate(MAX_HISTORY_SIZE);
        &self.entries[0]
    }

    pub fn latest(&self) -> Option<&RollEntry> {
        self.entries.front()
    }

    pub fn clear(&mut self) {
        self.entries.clear();
    }
}
