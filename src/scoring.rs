//! Classic NES scoring and leveling.

pub const LINES_PER_LEVEL: u32 = 10;

pub const SCORE_SINGLE: u32 = 40;
pub const SCORE_DOUBLE: u32 = 100;
pub const SCORE_TRIPLE: u32 = 300;
pub const SCORE_TETRIS: u32 = 1200;

// Timing (in milliseconds)
pub const BASE_GRAVITY_MS: u64 = 1000;
pub const MIN_GRAVITY_MS: u64 = 100;
const GRAVITY_STEP_PER_LEVEL_MS: u64 = 100;

/// Points for clearing `lines` rows at `level`, the level in effect before
/// this clear is counted.
pub fn line_clear_points(lines: u32, level: u32) -> u32 {
    let base = match lines {
        1 => SCORE_SINGLE,
        2 => SCORE_DOUBLE,
        3 => SCORE_TRIPLE,
        4 => SCORE_TETRIS,
        _ => 0,
    };
    base * (level + 1)
}

pub fn level_for_lines(total_lines: u32) -> u32 {
    total_lines / LINES_PER_LEVEL
}

pub fn gravity_interval_ms(level: u32) -> u64 {
    BASE_GRAVITY_MS
        .saturating_sub(u64::from(level) * GRAVITY_STEP_PER_LEVEL_MS)
        .max(MIN_GRAVITY_MS)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn gravity_bottoms_out_at_level_nine() {
        assert_eq!(gravity_interval_ms(0), 1000);
        assert_eq!(gravity_interval_ms(5), 500);
        assert_eq!(gravity_interval_ms(9), 100);
        assert_eq!(gravity_interval_ms(40), 100);
    }

    #[test]
    fn no_points_outside_one_to_four() {
        assert_eq!(line_clear_points(0, 3), 0);
        assert_eq!(line_clear_points(5, 3), 0);
    }
}
