/*
 *  bus.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  4-bit parallel character bus: two-nibble send with enable strobe
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 *
 *  This program is distributed in the hope that it will be useful,
 *  but WITHOUT ANY WARRANTY; without even the implied warranty of
 *  MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
 *  GNU General Public License for more details.
 *
 *  See <http://www.gnu.org/licenses/> to get a copy of the GNU General
 *  Public License.
 *
 */

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{OutputPin, PinState};
use log::debug;

use crate::commands::{
    InitMode, Line, CLEAR_DISPLAY, CLEAR_EXECUTION_US, RETURN_HOME, SET_CGRAM_ADDR,
};
use crate::error::{pin_error, BusError};

/// Physical wiring, fixed once the bus is built.
///
/// `data[0]..data[3]` are the controller's D4..D7, R/W is tied to ground.
#[derive(Debug)]
pub struct PinSet<P> {
    pub rs: P,
    pub enable: P,
    pub data: [P; 4],
}

/// Enable strobe timing in microseconds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusTiming {
    /// E held high
    pub pulse_us: u32,
    /// setup before and hold after the pulse
    pub settle_us: u32,
}

impl Default for BusTiming {
    fn default() -> Self {
        Self {
            pulse_us: 500,
            settle_us: 500,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum BusState {
    Unconfigured,
    Ready { dirty: bool },
}

/// Character bus controller for an HD44780 wired in 4-bit mode
pub struct CharBus<P, D> {
    pins: PinSet<P>,
    delay: D,
    timing: BusTiming,
    state: BusState,
}

impl<P, D> CharBus<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    pub fn new(pins: PinSet<P>, delay: D, timing: BusTiming) -> Self {
        Self {
            pins,
            delay,
            timing,
            state: BusState::Unconfigured,
        }
    }

    /// True once initialize() has completed
    pub fn is_ready(&self) -> bool {
        matches!(self.state, BusState::Ready { .. })
    }

    /// Run the power-on sequence, moving the controller from unconfigured to ready.
    ///
    /// A ready controller may only be initialised again straight after a clear.
    pub fn initialize(&mut self, mode: InitMode) -> Result<(), BusError> {
        if self.state == (BusState::Ready { dirty: true }) {
            return Err(BusError::ReinitWithoutClear);
        }
        debug!("LCD init sequence {:?}", mode);
        for &cmd in mode.sequence() {
            self.send(cmd, false)?;
        }
        self.delay.delay_us(CLEAR_EXECUTION_US);
        self.state = BusState::Ready { dirty: false };
        Ok(())
    }

    /// Transmit one byte as two nibbles, high nibble first.
    ///
    /// `is_data` drives register select: true for DDRAM/CGRAM data, false for an instruction.
    pub fn send(&mut self, value: u8, is_data: bool) -> Result<(), BusError> {
        self.pins.rs.set_state(PinState::from(is_data)).map_err(pin_error)?;

        self.present(value >> 4)?;
        self.strobe()?;

        self.present(value & 0x0F)?;
        self.strobe()?;

        if let BusState::Ready { dirty } = &mut self.state {
            *dirty = is_data || value != CLEAR_DISPLAY;
        }
        Ok(())
    }

    /// Latch whatever sits on the data lines: settle, E high, pulse, E low, settle.
    pub fn strobe(&mut self) -> Result<(), BusError> {
        self.delay.delay_us(self.timing.settle_us);
        self.pins.enable.set_high().map_err(pin_error)?;
        self.delay.delay_us(self.timing.pulse_us);
        if let Err(err) = self.pins.enable.set_low() {
            // never leave E latched high
            let _ = self.pins.enable.set_low();
            return Err(pin_error(err));
        }
        self.delay.delay_us(self.timing.settle_us);
        Ok(())
    }

    pub fn command(&mut self, cmd: u8) -> Result<(), BusError> {
        self.send(cmd, false)?;
        if cmd == CLEAR_DISPLAY || cmd == RETURN_HOME {
            self.delay.delay_us(CLEAR_EXECUTION_US);
        }
        Ok(())
    }

    pub fn write(&mut self, byte: u8) -> Result<(), BusError> {
        self.send(byte, true)
    }

    pub fn clear(&mut self) -> Result<(), BusError> {
        self.command(CLEAR_DISPLAY)
    }

    pub fn home(&mut self) -> Result<(), BusError> {
        self.command(RETURN_HOME)
    }

    /// Write `text` from the start of `line`.
    ///
    /// With `pad_to` the text is cut or space-filled to exactly that many cells.
    pub fn write_line(&mut self, text: &[u8], line: Line, pad_to: Option<usize>) -> Result<(), BusError> {
        let text = match pad_to {
            Some(width) => &text[..text.len().min(width)],
            None => text,
        };
        self.command(line.address())?;
        for &byte in text {
            self.write(byte)?;
        }
        if let Some(width) = pad_to {
            for _ in text.len()..width {
                self.write(b' ')?;
            }
        }
        Ok(())
    }

    /// Program CGRAM slots from 0 upwards, 5x8 rows per glyph, then clear.
    pub fn load_glyphs(&mut self, glyphs: &[[u8; 8]]) -> Result<(), BusError> {
        self.command(SET_CGRAM_ADDR)?;
        for glyph in glyphs.iter().take(8) {
            for &row in glyph {
                self.write(row & 0x1F)?;
            }
        }
        self.clear()
    }

    /// Hand the pins back, dropping them releases the lines
    pub fn into_pins(self) -> PinSet<P> {
        self.pins
    }

    fn present(&mut self, nibble: u8) -> Result<(), BusError> {
        for (bit, pin) in self.pins.data.iter_mut().enumerate() {
            let high = (nibble >> bit) & 1 == 1;
            pin.set_state(PinState::from(high)).map_err(pin_error)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::{FUNCTION_SET_4BIT_2LINE, DISPLAY_ON};
    use crate::probe::{BusEvent, BusProbe, Signal, Strobe};

    fn bus(probe: &BusProbe) -> CharBus<crate::probe::ProbePin, crate::probe::ProbeDelay> {
        CharBus::new(probe.pins(), probe.delay(), BusTiming::default())
    }

    #[test]
    fn test_send_function_set_two_strobes_high_nibble_first() {
        let probe = BusProbe::new();
        let mut bus = bus(&probe);

        bus.send(FUNCTION_SET_4BIT_2LINE, false).unwrap();

        assert_eq!(
            probe.strobes(),
            vec![
                Strobe { rs: false, nibble: 0x2 },
                Strobe { rs: false, nibble: 0x8 },
            ]
        );
        // register select never went high
        assert!(!probe
            .events()
            .iter()
            .any(|e| *e == BusEvent::Level(Signal::RegisterSelect, true)));
    }

    #[test]
    fn test_send_data_holds_register_select_high() {
        let probe = BusProbe::new();
        let mut bus = bus(&probe);

        bus.send(b'A', true).unwrap();

        assert_eq!(
            probe.strobes(),
            vec![Strobe { rs: true, nibble: 0x4 }, Strobe { rs: true, nibble: 0x1 }]
        );
    }

    #[test]
    fn test_strobe_holds_enable_for_pulse_width() {
        let probe = BusProbe::new();
        let timing = BusTiming { pulse_us: 450, settle_us: 40 };
        let mut bus = CharBus::new(probe.pins(), probe.delay(), timing);

        bus.strobe().unwrap();

        let events = probe.events();
        let high = events.iter().position(|e| *e == BusEvent::Level(Signal::Enable, true)).unwrap();
        let low = events.iter().position(|e| *e == BusEvent::Level(Signal::Enable, false)).unwrap();
        assert!(high < low);
        let held: u64 = events[high..low]
            .iter()
            .map(|e| match e {
                BusEvent::Delay(ns) => *ns as u64,
                _ => 0,
            })
            .sum();
        assert!(held >= 450_000);
        // settle both sides
        assert!(matches!(events[high - 1], BusEvent::Delay(40_000)));
        assert!(matches!(events.last(), Some(BusEvent::Delay(40_000))));
        assert!(!probe.enable_level());
    }

    #[test]
    fn test_pin_failure_propagates() {
        let probe = BusProbe::new();
        let mut bus = bus(&probe);
        // #0 is rs, #3 lands on D6 before any strobe
        probe.fail_at(3);
        assert!(matches!(bus.send(0x41, true), Err(BusError::Pin(_))));
        assert!(probe.strobes().is_empty());
    }

    #[test]
    fn test_failed_enable_release_is_retried() {
        let probe = BusProbe::new();
        let mut bus = bus(&probe);
        // #6 is the first enable low
        probe.fail_at(6);

        assert!(matches!(bus.send(0x41, true), Err(BusError::Pin(_))));
        assert!(!probe.enable_level());
    }

    #[test]
    fn test_initialize_twice_after_clear_matches_single() {
        let single = BusProbe::new();
        bus(&single).initialize(InitMode::Resync).unwrap();

        let twice = BusProbe::new();
        let mut b = bus(&twice);
        b.initialize(InitMode::Resync).unwrap();
        b.clear().unwrap();
        b.initialize(InitMode::Resync).unwrap();

        assert_eq!(single.state(), twice.state());
        assert!(!twice.state().eight_bit);
        assert!(twice.state().two_line);
    }

    #[test]
    fn test_reinit_requires_clear() {
        let probe = BusProbe::new();
        let mut b = bus(&probe);
        b.initialize(InitMode::Resync).unwrap();
        b.write(b'x').unwrap();

        assert_eq!(b.initialize(InitMode::Resync), Err(BusError::ReinitWithoutClear));

        b.clear().unwrap();
        assert!(b.initialize(InitMode::Resync).is_ok());
    }

    #[test]
    fn test_direct_init_on_four_bit_controller() {
        let probe = BusProbe::new();
        let mut b = bus(&probe);
        b.initialize(InitMode::Resync).unwrap();
        b.initialize(InitMode::Direct).unwrap();
        b.write_line(b"Hi", Line::One, None).unwrap();

        assert!(b.is_ready());
        assert!(!probe.state().eight_bit);
        assert_eq!(probe.visible_line(Line::One, 4), "Hi  ");
    }

    #[test]
    fn test_home_resets_address_and_shift() {
        let probe = BusProbe::new();
        let mut b = bus(&probe);
        b.initialize(InitMode::Resync).unwrap();
        b.write_line(b"abc", Line::Two, None).unwrap();
        b.command(crate::commands::SHIFT_DISPLAY_LEFT).unwrap();
        assert_eq!(probe.state().shift, 1);

        b.home().unwrap();

        let state = probe.state();
        assert_eq!(state.address, 0);
        assert_eq!(state.shift, 0);
        assert_eq!(&state.ddram[1][..3], b"abc");
        assert!(matches!(probe.events().last(), Some(BusEvent::Delay(ns)) if *ns == CLEAR_EXECUTION_US * 1000));
    }

    #[test]
    fn test_write_line_pads_and_truncates() {
        let probe = BusProbe::new();
        let mut b = bus(&probe);
        b.initialize(InitMode::Resync).unwrap();
        b.command(DISPLAY_ON).unwrap();

        b.write_line(b"Goodbye!", Line::Two, Some(4)).unwrap();
        assert_eq!(probe.visible_line(Line::Two, 6), "Good  ");

        b.write_line(b"ab", Line::One, Some(5)).unwrap();
        let writes = probe.ddram_writes();
        assert_eq!(writes.len(), 4 + 5);
        assert_eq!(writes.last().unwrap().address, 0x04);
    }

    #[test]
    fn test_load_glyphs_programs_cgram() {
        let probe = BusProbe::new();
        let mut b = bus(&probe);
        b.initialize(InitMode::Resync).unwrap();
        let up = [0b00000, 0b00100, 0b01110, 0b11111, 0, 0, 0, 0];
        let down = [0, 0, 0, 0b11111, 0b01110, 0b00100, 0, 0];

        b.load_glyphs(&[up, down]).unwrap();

        let state = probe.state();
        assert_eq!(state.cgram[..8], up);
        assert_eq!(state.cgram[8..16], down);
        assert!(!state.cgram_target);
        assert_eq!(state.address, 0);
    }
}
