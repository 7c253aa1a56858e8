//! Wrapping header labels for label requests.
//!
//! Every header request carries a one-byte label the FlightCtrl echoes back,
//! which lets it tell fresh requests from repeats. Debug and high-speed
//! requests keep independent counters with different periods.

/// Debug header labels cycle through `0..32`.
pub const DEBUG_LABEL_PERIOD: u8 = 32;

/// High-speed header labels cycle through `0..9`.
pub const HIGH_SPEED_LABEL_PERIOD: u8 = 9;

/// Next label for each header request type.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct HeaderLabels {
    debug: u8,
    high_speed: u8,
}

impl HeaderLabels {
    /// Both counters at 0.
    #[inline]
    pub const fn new() -> Self {
        Self {
            debug: 0,
            high_speed: 0,
        }
    }

    /// Label the next request of this type will carry.
    #[inline]
    pub fn current(&self, high_speed: bool) -> u8 {
        if high_speed {
            self.high_speed
        } else {
            self.debug
        }
    }

    /// Move the counter for this type to its next label, wrapping.
    #[inline]
    pub fn advance(&mut self, high_speed: bool) {
        if high_speed {
            self.high_speed = (self.high_speed + 1) % HIGH_SPEED_LABEL_PERIOD;
        } else {
            self.debug = (self.debug + 1) % DEBUG_LABEL_PERIOD;
        }
    }

    /// Reset both counters to 0.
    #[inline]
    pub fn reset(&mut self) {
        *self = Self::new();
    }
}
