// Experience thresholds. Index 0 is level 1.
use crate::hero::{MAX_LEVEL, MIN_LEVEL};

pub const XP_THRESHOLDS: [i32; 10] = [0, 3, 9, 18, 30, 45, 63, 84, 108, 135];

/// XP needed to reach `level`. Levels outside 1..=10 are clamped.
pub fn xp_for_level(level: u8) -> i32 {
    let level = level.clamp(MIN_LEVEL, MAX_LEVEL);
    XP_THRESHOLDS[usize::from(level - 1)]
}

pub fn level_for_xp(xp: i32) -> u8 {
    let reached = XP_THRESHOLDS.iter().filter(|t| xp >= **t).count();
    (reached as u8).max(MIN_LEVEL)
}

/// XP still missing for the next level, or None at the cap.
pub fn xp_to_next_level(level: u8, xp: i32) -> Option<i32> {
    if level >= MAX_LEVEL {
        return None;
    }
    Some((xp_for_level(level + 1) - xp).max(0))
}

/// Percent of the way from this level's threshold to the next one.
pub fn level_progress(level: u8, xp: i32) -> u8 {
    if level >= MAX_LEVEL {
        return 100;
    }
    let floor = xp_for_level(level);
    let ceiling = xp_for_level(level + 1);
    let progress = (xp - floor).clamp(0, ceiling - floor) * 100 / (ceiling - floor);
    progress as u8
}

pub fn can_level_up(level: u8, xp: i32) -> bool {
    level < MAX_LEVEL && xp >= xp_for_level(level + 1)
}

pub fn xp_range_display(level: u8) -> String {
    if level >= MAX_LEVEL {
        format!("{}+", xp_for_level(MAX_LEVEL))
    } else {
        format!("{}-{}", xp_for_level(level), xp_for_level(level + 1) - 1)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn thresholds_map_both_ways() {
        assert_eq!(xp_for_level(1), 0);
        assert_eq!(xp_for_level(4), 18);
        assert_eq!(xp_for_level(10), 135);
        assert_eq!(xp_for_level(0), 0);
        assert_eq!(level_for_xp(0), 1);
        assert_eq!(level_for_xp(8), 2);
        assert_eq!(level_for_xp(9), 3);
        assert_eq!(level_for_xp(500), 10);
        assert_eq!(level_for_xp(-4), 1);
    }

    #[test]
    fn next_level_and_progress() {
        assert_eq!(xp_to_next_level(1, 1), Some(2));
        assert_eq!(xp_to_next_level(2, 20), Some(0));
        assert_eq!(xp_to_next_level(10, 200), None);
        assert_eq!(level_progress(3, 9), 0);
        assert_eq!(level_progress(3, 13), 44);
        assert_eq!(level_progress(10, 140), 100);
        assert!(can_level_up(1, 3));
        assert!(!can_level_up(1, 2));
        assert!(!can_level_up(10, 999));
    }

    #[test]
    fn ranges_read_naturally() {
        assert_eq!(xp_range_display(1), "0-2");
        assert_eq!(xp_range_display(9), "108-134");
        assert_eq!(xp_range_display(10), "135+");
    }
}
