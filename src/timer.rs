pub const TIMER_HZ: u32 = 60;

/// Delay and sound countdowns. They only move down on `tick`, which the
/// scheduler calls at a fixed 60 Hz no matter how fast instructions run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Timers {
    pub delay: u8,
    pub sound: u8,
}

impl Timers {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decrement both timers, floored at zero. Returns whether the sound timer
    /// was running at this tick, which is the beep level for the tick.
    pub fn tick(&mut self) -> bool {
        self.delay = self.delay.saturating_sub(1);
        if self.sound > 0 {
            self.sound -= 1;
            true
        } else {
            false
        }
    }

    pub fn is_beeping(&self) -> bool {
        self.sound > 0
    }
}
