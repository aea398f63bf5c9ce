// Power roll engine: 2d10 plus a characteristic, sorted into three tiers.
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

pub const POWER_DIE_SIDES: u32 = 10;
pub const TIER_TWO_MIN: i32 = 12;
pub const TIER_THREE_MIN: i32 = 17;
pub const CRITICAL_NATURAL_MIN: i32 = 19;

// How many pairs are drawn and which one is kept.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Default, Hash, Serialize, Deserialize, EnumIter, Display,
)]
#[serde(rename_all = "snake_case")]
pub enum PowerRollModifier {
    #[default]
    Normal,
    Edge,
    Bane,
    #[strum(serialize = "Double Edge")]
    DoubleEdge,
    #[strum(serialize = "Double Bane")]
    DoubleBane,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Keep {
    Only,
    Highest,
    Lowest,
}

impl PowerRollModifier {
    pub fn pairs_drawn(self) -> usize {
        match self {
            PowerRollModifier::Normal => 1,
            PowerRollModifier::Edge | PowerRollModifier::Bane => 2,
            PowerRollModifier::DoubleEdge | PowerRollModifier::DoubleBane => 3,
        }
    }

    fn keep(self) -> Keep {
        match self {
            PowerRollModifier::Normal => Keep::Only,
            PowerRollModifier::Edge | PowerRollModifier::DoubleEdge => Keep::Highest,
            PowerRollModifier::Bane | PowerRollModifier::DoubleBane => Keep::Lowest,
        }
    }

    /// Cycles Normal -> Edge -> Double Edge -> Bane -> Double Bane -> Normal.
    pub fn cycle(self) -> Self {
        match self {
            PowerRollModifier::Normal => PowerRollModifier::Edge,
            PowerRollModifier::Edge => PowerRollModifier::DoubleEdge,
            PowerRollModifier::DoubleEdge => PowerRollModifier::Bane,
            PowerRollModifier::Bane => PowerRollModifier::DoubleBane,
            PowerRollModifier::DoubleBane => PowerRollModifier::Normal,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, Display)]
pub enum Tier {
    #[strum(serialize = "Tier 1")]
    One,
    #[strum(serialize = "Tier 2")]
    Two,
    #[strum(serialize = "Tier 3")]
    Three,
}

impl Tier {
    pub fn number(self) -> u8 {
        match self {
            Tier::One => 1,
            Tier::Two => 2,
            Tier::Three => 3,
        }
    }
}

pub fn tier_for_total(total: i32) -> Tier {
    if total >= TIER_THREE_MIN {
        Tier::Three
    } else if total >= TIER_TWO_MIN {
        Tier::Two
    } else {
        Tier::One
    }
}

// One 2d10 draw.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DicePair {
    pub dice: [u8; 2],
}

impl DicePair {
    pub fn roll<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let first = roll_die(rng, POWER_DIE_SIDES) as u8;
        let second = roll_die(rng, POWER_DIE_SIDES) as u8;
        Self {
            dice: [first, second],
        }
    }

    pub fn sum(&self) -> i32 {
        self.dice.iter().map(|d| i32::from(*d)).sum()
    }
}

// Outcome of a power roll, with every pair that was set aside.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PowerRoll {
    pub modifier: PowerRollModifier,
    pub characteristic: i32,
    pub kept: DicePair,
    pub discarded: Vec<DicePair>, // In draw order, kept pair removed.
    pub total: i32,
    pub tier: Tier,
}

impl PowerRoll {
    pub fn natural(&self) -> i32 {
        self.kept.sum()
    }

    /// A natural 19 or 20. Only used for labelling.
    pub fn is_critical(&self) -> bool {
        self.natural() >= CRITICAL_NATURAL_MIN
    }
}

/// Rolls 2d10 once per pair the modifier asks for and keeps the best or worst
/// pair. Ties keep the pair drawn first.
pub fn perform_power_roll<R: Rng + ?Sized>(
    rng: &mut R,
    characteristic: i32,
    modifier: PowerRollModifier,
) -> PowerRoll {
    let mut pairs: Vec<DicePair> = (0..modifier.pairs_drawn())
        .map(|_| DicePair::roll(rng))
        .collect();

    let kept_index = match modifier.keep() {
        Keep::Only => 0,
        Keep::Highest => (1..pairs.len()).fold(0, |best, i| {
            if pairs[i].sum() > pairs[best].sum() { i } else { best }
        }),
        Keep::Lowest => (1..pairs.len()).fold(0, |best, i| {
            if pairs[i].sum() < pairs[best].sum() { i } else { best }
        }),
    };
    let kept = pairs.remove(kept_index);
    let total = kept.sum() + characteristic;

    PowerRoll {
        modifier,
        characteristic,
        kept,
        discarded: pairs,
        total,
        tier: tier_for_total(total),
    }
}

/// Net edges against banes. One of each cancels out.
pub fn resolve_edge_bane(edges: u32, banes: u32) -> PowerRollModifier {
    let net = i64::from(edges) - i64::from(banes);
    match net {
        0 => PowerRollModifier::Normal,
        1 => PowerRollModifier::Edge,
        -1 => PowerRollModifier::Bane,
        n if n >= 2 => PowerRollModifier::DoubleEdge,
        _ => PowerRollModifier::DoubleBane,
    }
}

pub fn roll_die<R: Rng + ?Sized>(rng: &mut R, sides: u32) -> u32 {
    rng.random_range(1..=sides.max(1))
}

pub fn roll_dice<R: Rng + ?Sized>(rng: &mut R, count: u32, sides: u32) -> u32 {
    (0..count).map(|_| roll_die(rng, sides)).sum()
}

// Parsed "NdM" notation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DiceNotation {
    pub count: u32,
    pub sides: u32,
}

pub fn parse_dice_notation(notation: &str) -> Option<DiceNotation> {
    let lower = notation.to_ascii_lowercase();
    let (count, sides) = lower.split_once('d')?;
    if count.is_empty()
        || sides.is_empty()
        || !count.chars().all(|c| c.is_ascii_digit())
        || !sides.chars().all(|c| c.is_ascii_digit())
    {
        return None;
    }
    let count: u32 = count.parse().ok()?;
    let sides: u32 = sides.parse().ok()?;
    if count == 0 || sides == 0 {
        return None;
    }
    Some(DiceNotation { count, sides })
}

pub fn roll_dice_notation<R: Rng + ?Sized>(rng: &mut R, notation: &str) -> Option<u32> {
    parse_dice_notation(notation).map(|n| roll_dice(rng, n.count, n.sides))
}

pub fn format_roll_result(roll: i32, modifier: i32) -> String {
    let total = roll + modifier;
    match modifier {
        0 => total.to_string(),
        m if m > 0 => format!("{total} ({roll} + {m})"),
        m => format!("{total} ({roll} - {})", m.abs()),
    }
}
