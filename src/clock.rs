//! A chess clock counting down whole seconds for each side.
//
//  This Source Code Form is subject to the terms of the Mozilla Public
//  License, v. 2.0. If a copy of the MPL was not distributed with this
//  file, You can obtain one at http://mozilla.org/MPL/2.0/.
//
////////////////////////////////////////////////////////////////////////////////////////////////////
use shakmaty::Color;

////////////////////////////////////////////////////////////////////////////////////////////////////
/// Remaining time for both sides. The clock is driven by calling `tick` once a second.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Clock {
    minutes: u32,
    white: u32,
    black: u32,
    running: bool,
}

impl Clock {
    /// Creates a stopped clock giving each side `minutes`. Zero minutes means the game is untimed.
    pub fn new(minutes: u32) -> Self {
        Clock {
            minutes,
            white: minutes.saturating_mul(60),
            black: minutes.saturating_mul(60),
            running: false,
        }
    }

    /// Returns true unless the game is untimed.
    pub fn is_timed(&self) -> bool {
        self.minutes > 0
    }

    /// Returns true if the clock is counting down.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// Starts the clock, if the game is timed.
    pub fn start(&mut self) {
        self.running = self.is_timed();
    }

    /// Stops the clock.
    pub fn stop(&mut self) {
        self.running = false;
    }

    /// Seconds left for `color`.
    pub fn remaining(&self, color: Color) -> u32 {
        match color {
            Color::White => self.white,
            Color::Black => self.black,
        }
    }

    /// Counts down one second for the side to move. Returns `turn` if it has just run out of time,
    /// in which case the clock stops.
    pub fn tick(&mut self, turn: Color) -> Option<Color> {
        if !self.running {
            return None;
        }

        let remaining = match turn {
            Color::White => &mut self.white,
            Color::Black => &mut self.black,
        };
        *remaining = remaining.saturating_sub(1);

        if *remaining == 0 {
            self.running = false;
            Some(turn)
        } else {
            None
        }
    }
}

/// Formats a number of seconds as `m:ss`.
pub fn format_time(seconds: u32) -> String {
    format!("{}:{:02}", seconds / 60, seconds % 60)
}
