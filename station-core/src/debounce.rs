//! Push-button debouncer.
//!
//! A press counts once the input has stayed asserted for the settle window,
//! and the input has to stay released for the same window before the next
//! press can count.

/// One debounced press: flip the display mode.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ModeToggle;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebounceState {
    Released,
    Settling { seen: u8 },
    Held,
    Releasing { seen: u8 },
}

/// Edge-trigger-with-settle debouncer.
#[derive(Debug, Clone)]
pub struct Debouncer {
    settle_samples: u8,
    state: DebounceState,
}

impl Debouncer {
    /// Create a debouncer that needs `settle_samples` further asserted
    /// samples after the first one before it reports a press.
    pub fn new(settle_samples: u8) -> Self {
        Self {
            settle_samples,
            state: DebounceState::Released,
        }
    }

    /// Feed one raw sample.
    ///
    /// # Arguments
    /// * `asserted` - Whether the input is currently pressed.
    ///
    /// # Returns
    /// * `Option<ModeToggle>` - `Some` exactly once per debounced press.
    pub fn sample(&mut self, asserted: bool) -> Option<ModeToggle> {
        match (self.state, asserted) {
            (DebounceState::Released, false) => None,
            (DebounceState::Released, true) => self.settle(0),
            (DebounceState::Settling { seen }, true) => self.settle(seen + 1),
            (DebounceState::Settling { .. }, false) => {
                self.state = DebounceState::Released;
                None
            }
            (DebounceState::Held, true) | (DebounceState::Releasing { .. }, true) => {
                self.state = DebounceState::Held;
                None
            }
            (DebounceState::Held, false) => {
                self.release(0);
                None
            }
            (DebounceState::Releasing { seen }, false) => {
                self.release(seen + 1);
                None
            }
        }
    }

    fn release(&mut self, seen: u8) {
        self.state = if seen >= self.settle_samples {
            DebounceState::Released
        } else {
            DebounceState::Releasing { seen }
        };
    }

    fn settle(&mut self, seen: u8) -> Option<ModeToggle> {
        if seen >= self.settle_samples {
            self.state = DebounceState::Held;
            Some(ModeToggle)
        } else {
            self.state = DebounceState::Settling { seen };
            None
        }
    }
}
