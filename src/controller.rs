//! Controller implementation
//!
//! The NES has two controller ports, each supporting the standard NES
//! gamepad. Button states are latched by a strobe write to $4016 and then
//! shifted out one bit per read, in the order A, B, Select, Start, Up,
//! Down, Left, Right.

use bitflags::bitflags;

bitflags! {
    /// Controller button bits, in shift-out order from the high bit down
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct Buttons: u8 {
        const A      = 0x80;
        const B      = 0x40;
        const SELECT = 0x20;
        const START  = 0x10;
        const UP     = 0x08;
        const DOWN   = 0x04;
        const LEFT   = 0x02;
        const RIGHT  = 0x01;
    }
}

/// NES controller
pub struct Controller {
    /// Current button state (held by the host between frames)
    buttons: Buttons,

    /// Strobe mode; while set, reads always report the A button
    strobe: bool,

    /// Index of the next button to shift out (0-7)
    index: u8,
}

impl Controller {
    /// Create a new controller
    pub fn new() -> Self {
        Controller {
            buttons: Buttons::empty(),
            strobe: false,
            index: 0,
        }
    }

    /// Reset the controller port state; button states persist
    pub fn reset(&mut self) {
        self.strobe = false;
        self.index = 0;
    }

    /// Replace the full button state
    pub fn set_buttons(&mut self, buttons: Buttons) {
        self.buttons = buttons;
    }

    /// Set or clear a single button
    pub fn set_button(&mut self, button: Buttons, pressed: bool) {
        self.buttons.set(button, pressed);
    }

    /// Current button state
    pub fn buttons(&self) -> Buttons {
        self.buttons
    }

    /// Handle a write to the controller register
    ///
    /// Writing 1 then 0 latches the button states for serial reading.
    pub fn write(&mut self, value: u8) {
        let was_strobe = self.strobe;
        self.strobe = (value & 0x01) != 0;

        // Falling edge of strobe restarts the shift sequence
        if was_strobe && !self.strobe {
            self.index = 0;
        }
    }

    /// Shift out the next button state
    ///
    /// Returns 0 or 1 for each of the 8 buttons; every read past the eighth
    /// returns 1 (the open-bus pull-up a real controller presents).
    pub fn read(&mut self) -> u8 {
        if self.strobe {
            return (self.buttons.bits() >> 7) & 0x01;
        }

        let value = if self.index < 8 {
            (self.buttons.bits() >> (7 - self.index)) & 0x01
        } else {
            0x01
        };

        // Clamp so unbounded polling cannot wrap the counter back around
        self.index = self.index.saturating_add(1).min(8);

        value
    }
}

impl Default for Controller {
    fn default() -> Self {
        Controller::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn latch(controller: &mut Controller) {
        controller.write(1);
        controller.write(0);
    }

    #[test]
    fn shifts_buttons_in_documented_order() {
        let mut controller = Controller::new();
        controller.set_buttons(Buttons::A | Buttons::START);
        latch(&mut controller);

        let reads: Vec<u8> = (0..8).map(|_| controller.read()).collect();
        assert_eq!(reads, vec![1, 0, 0, 1, 0, 0, 0, 0]);
    }

    #[test]
    fn reads_past_the_eighth_return_one() {
        let mut controller = Controller::new();
        controller.set_buttons(Buttons::empty());
        latch(&mut controller);

        for _ in 0..8 {
            controller.read();
        }
        for _ in 0..16 {
            assert_eq!(controller.read(), 1);
        }
    }

    #[test]
    fn strobe_high_pins_the_a_button() {
        let mut controller = Controller::new();
        controller.set_buttons(Buttons::A);
        controller.write(1);

        assert_eq!(controller.read(), 1);
        assert_eq!(controller.read(), 1);

        controller.set_button(Buttons::A, false);
        assert_eq!(controller.read(), 0);
    }

    #[test]
    fn falling_edge_restarts_the_sequence() {
        let mut controller = Controller::new();
        controller.set_buttons(Buttons::B);
        latch(&mut controller);

        assert_eq!(controller.read(), 0); // A
        assert_eq!(controller.read(), 1); // B

        latch(&mut controller);
        assert_eq!(controller.read(), 0); // A again
    }
}
