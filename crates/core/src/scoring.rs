//! Scoring module - stats, leveling and the guideline fall-speed curve
//!
//! Leveling uses a variable goal: the first lock at level 1 already meets
//! the initial goal of 0, and every level up raises the goal by
//! `new_level * 5` lines.

use crate::types::{BASE_FALL_MS, GOAL_STEP, HARD_DROP_POINTS, LINE_SCORES, SOFT_DROP_POINTS};

/// Score, lines, level and the next-level goal
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Stats {
    pub score: u32,
    pub lines: u32,
    pub level: u32,
    /// Lines needed to reach the next level
    pub goal: u32,
}

impl Stats {
    pub const fn new() -> Self {
        Self {
            score: 0,
            lines: 0,
            level: 1,
            goal: 0,
        }
    }

    /// Level up once if the goal has been reached.
    ///
    /// Returns true if the level changed.
    pub fn try_level_up(&mut self) -> bool {
        if self.lines < self.goal {
            return false;
        }
        self.level = self.level.saturating_add(1);
        self.goal = self.goal.saturating_add(self.level.saturating_mul(GOAL_STEP));
        true
    }
}

impl Default for Stats {
    fn default() -> Self {
        Self::new()
    }
}

/// Milliseconds per row for a level: `round((0.8 - (level - 1) * 0.007) ^ (level - 1) * 1000)`
pub fn fall_speed_ms(level: u32) -> u32 {
    let n = level.saturating_sub(1);
    let base = 0.8 - f64::from(n) * 0.007;
    let seconds = base.max(0.0).powi(n as i32);
    (seconds * f64::from(BASE_FALL_MS)).round() as u32
}

/// Points for clearing `lines` rows at `level`
pub fn line_clear_points(lines: usize, level: u32) -> u32 {
    let base = LINE_SCORES
        .get(lines)
        .copied()
        .unwrap_or(LINE_SCORES[LINE_SCORES.len() - 1]);
    base.saturating_mul(level)
}

/// Points for dropping `rows` rows
pub fn drop_points(rows: u32, hard: bool) -> u32 {
    let per_row = if hard {
        HARD_DROP_POINTS
    } else {
        SOFT_DROP_POINTS
    };
    rows.saturating_mul(per_row)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fall_speed_curve() {
        assert_eq!(fall_speed_ms(1), 1000);
        assert_eq!(fall_speed_ms(2), 793);
        assert_eq!(fall_speed_ms(3), 618);
        assert_eq!(fall_speed_ms(4), 473);
        assert!(fall_speed_ms(15) < fall_speed_ms(14));
    }

    #[test]
    fn test_fall_speed_level_zero_treated_as_one() {
        assert_eq!(fall_speed_ms(0), 1000);
    }

    #[test]
    fn test_first_level_up_from_goal_zero() {
        let mut stats = Stats::new();
        assert!(stats.try_level_up());
        assert_eq!(stats.level, 2);
        assert_eq!(stats.goal, 10);

        // 10 lines needed before level 3
        stats.lines = 9;
        assert!(!stats.try_level_up());
        stats.lines = 10;
        assert!(stats.try_level_up());
        assert_eq!(stats.level, 3);
        assert_eq!(stats.goal, 25);
    }

    #[test]
    fn test_level_up_saturates_at_the_top() {
        let mut stats = Stats {
            score: u32::MAX,
            lines: u32::MAX,
            level: u32::MAX - 1,
            goal: u32::MAX - 3,
        };
        assert!(stats.try_level_up());
        assert_eq!(stats.level, u32::MAX);
        assert_eq!(stats.goal, u32::MAX);
        assert!(stats.try_level_up());
        assert_eq!(stats.level, u32::MAX);
    }

    #[test]
    fn test_line_clear_points() {
        assert_eq!(line_clear_points(0, 5), 0);
        assert_eq!(line_clear_points(1, 1), 100);
        assert_eq!(line_clear_points(2, 2), 600);
        assert_eq!(line_clear_points(3, 1), 500);
        assert_eq!(line_clear_points(4, 3), 2400);
        // Crafted grids can clear more than four rows at once.
        assert_eq!(line_clear_points(6, 1), 800);
    }

    #[test]
    fn test_drop_points() {
        assert_eq!(drop_points(5, false), 5);
        assert_eq!(drop_points(5, true), 10);
        assert_eq!(drop_points(0, true), 0);
    }
}
