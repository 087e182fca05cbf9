use crate::scoring;

pub const DEFAULT_LOCK_DELAY_MS: u64 = 500;

/// How often gravity pulls the falling piece down one row.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub enum Gravity {
    /// Speeds up with the level, see [`scoring::gravity_interval_ms`].
    Leveled,
    Fixed(u64),
}

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct EngineConfig {
    pub gravity: Gravity,
    /// Grace period before a resting piece locks. Zero locks on the first
    /// failed descent.
    pub lock_delay_ms: u64,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            gravity: Gravity::Leveled,
            lock_delay_ms: DEFAULT_LOCK_DELAY_MS,
        }
    }
}

impl EngineConfig {
    /// One row per second, no lock delay.
    pub fn simple() -> Self {
        Self {
            gravity: Gravity::Fixed(scoring::BASE_GRAVITY_MS),
            lock_delay_ms: 0,
        }
    }

    pub fn gravity_interval_ms(&self, level: u32) -> u64 {
        match self.gravity {
            Gravity::Leveled => scoring::gravity_interval_ms(level),
            Gravity::Fixed(ms) => ms,
        }
    }
}
