//! Lock-delay timer.
//!
//! The timer is a deadline owned by the session. The driver's clock fires it
//! through [`LockPhase::poll`]; at most one is pending at a time.

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct LockTimer {
    pub armed_at_ms: u64,
    pub fires_at_ms: u64,
}

#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub enum LockPhase {
    #[default]
    Falling,
    Resting(LockTimer),
}

impl LockPhase {
    /// Arms the timer unless one is already pending. Returns whether a new
    /// timer was armed.
    pub fn arm(&mut self, now_ms: u64, delay_ms: u64) -> bool {
        match self {
            LockPhase::Resting(_) => false,
            LockPhase::Falling => {
                *self = LockPhase::Resting(LockTimer {
                    armed_at_ms: now_ms,
                    fires_at_ms: now_ms.saturating_add(delay_ms),
                });
                true
            }
        }
    }

    /// Returns whether a pending timer was cancelled.
    pub fn cancel(&mut self) -> bool {
        std::mem::take(self) != LockPhase::Falling
    }

    pub fn is_pending(&self) -> bool {
        matches!(self, LockPhase::Resting(_))
    }

    pub fn timer(&self) -> Option<LockTimer> {
        match self {
            LockPhase::Resting(timer) => Some(*timer),
            LockPhase::Falling => None,
        }
    }

    /// Fires at most once: a due timer is consumed and the phase returns to
    /// `Falling`.
    pub fn poll(&mut self, now_ms: u64) -> bool {
        match *self {
            LockPhase::Resting(timer) if now_ms >= timer.fires_at_ms => {
                *self = LockPhase::Falling;
                true
            }
            _ => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn second_arm_keeps_first_deadline() {
        let mut phase = LockPhase::default();
        assert!(phase.arm(100, 500));
        assert!(!phase.arm(300, 500));
        assert_eq!(phase.timer().map(|t| t.fires_at_ms), Some(600));
    }

    #[test]
    fn poll_fires_once() {
        let mut phase = LockPhase::default();
        phase.arm(0, 500);
        assert!(!phase.poll(499));
        assert!(phase.poll(500));
        assert!(!phase.poll(1000));
    }

    #[test]
    fn cancelled_timer_never_fires() {
        let mut phase = LockPhase::default();
        phase.arm(0, 500);
        assert!(phase.cancel());
        assert!(!phase.cancel());
        assert!(!phase.poll(10_000));
    }
}
