/*
 *  probe.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  In-memory HD44780 for tests and the emulated run mode
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

//! A probe sits where the GPIO lines would be. Every level change is recorded, and
//! each falling edge on E latches the data lines into a model controller, so tests can
//! assert on either the raw bus traffic or the resulting DDRAM/CGRAM contents.

use std::sync::{Arc, Mutex, MutexGuard};

use embedded_hal::delay::DelayNs;
use embedded_hal::digital::{ErrorKind, ErrorType, OutputPin};
use log::info;

use crate::bus::PinSet;
use crate::commands::{Line, DDRAM_LINE_WIDTH};

/// Logical signal behind a probe pin
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Signal {
    RegisterSelect,
    Enable,
    Data(u8),
}

/// Raw bus activity in call order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BusEvent {
    Level(Signal, bool),
    Delay(u32),
}

/// One latched nibble
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Strobe {
    pub rs: bool,
    pub nibble: u8,
}

/// A character stored to display RAM
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DdramWrite {
    pub address: u8,
    pub byte: u8,
}

/// Observable controller state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeviceState {
    pub eight_bit: bool,
    pub two_line: bool,
    pub large_font: bool,
    pub display_on: bool,
    pub cursor_on: bool,
    pub blink: bool,
    pub increment: bool,
    pub entry_shift: bool,
    /// address counter, DDRAM or CGRAM depending on `cgram_target`
    pub address: u8,
    pub cgram_target: bool,
    /// display shift, cells scrolled left
    pub shift: usize,
    pub ddram: [[u8; DDRAM_LINE_WIDTH]; 2],
    pub cgram: [u8; 64],
}

impl Default for DeviceState {
    // internal reset circuit state
    fn default() -> Self {
        Self {
            eight_bit: true,
            two_line: false,
            large_font: false,
            display_on: false,
            cursor_on: false,
            blink: false,
            increment: true,
            entry_shift: false,
            address: 0,
            cgram_target: false,
            shift: 0,
            ddram: [[b' '; DDRAM_LINE_WIDTH]; 2],
            cgram: [0; 64],
        }
    }
}

/// Model controller fed one nibble at a time
#[derive(Debug, Default)]
struct VirtualLcd {
    state: DeviceState,
    pending: Option<u8>,
    strobes: Vec<Strobe>,
    commands: Vec<u8>,
    writes: Vec<DdramWrite>,
}

impl VirtualLcd {
    /// Returns true when the display has just been switched on
    fn latch(&mut self, rs: bool, nibble: u8, recording: bool) -> bool {
        if recording {
            self.strobes.push(Strobe { rs, nibble });
        }
        let byte = if self.state.eight_bit {
            // D0..D3 are not wired, they read low
            nibble << 4
        } else {
            match self.pending.take() {
                None => {
                    self.pending = Some(nibble);
                    return false;
                }
                Some(high) => (high << 4) | nibble,
            }
        };
        if rs {
            self.data(byte, recording);
            false
        } else {
            if recording {
                self.commands.push(byte);
            }
            self.instruction(byte)
        }
    }

    fn instruction(&mut self, cmd: u8) -> bool {
        let s = &mut self.state;
        match cmd {
            0x80..=0xFF => {
                s.address = cmd & 0x7F;
                s.cgram_target = false;
            }
            0x40..=0x7F => {
                s.address = cmd & 0x3F;
                s.cgram_target = true;
            }
            0x20..=0x3F => {
                s.eight_bit = cmd & 0x10 != 0;
                s.two_line = cmd & 0x08 != 0;
                s.large_font = cmd & 0x04 != 0;
                self.pending = None;
            }
            0x10..=0x1F => {
                let right = cmd & 0x04 != 0;
                if cmd & 0x08 != 0 {
                    s.shift = if right {
                        (s.shift + DDRAM_LINE_WIDTH - 1) % DDRAM_LINE_WIDTH
                    } else {
                        (s.shift + 1) % DDRAM_LINE_WIDTH
                    };
                } else {
                    s.address = step(s.address, right);
                }
            }
            0x08..=0x0F => {
                let was_on = s.display_on;
                s.display_on = cmd & 0x04 != 0;
                s.cursor_on = cmd & 0x02 != 0;
                s.blink = cmd & 0x01 != 0;
                return !was_on && s.display_on;
            }
            0x04..=0x07 => {
                s.increment = cmd & 0x02 != 0;
                s.entry_shift = cmd & 0x01 != 0;
            }
            0x02 | 0x03 => {
                s.address = 0;
                s.cgram_target = false;
                s.shift = 0;
            }
            0x01 => {
                s.ddram = [[b' '; DDRAM_LINE_WIDTH]; 2];
                s.address = 0;
                s.cgram_target = false;
                s.shift = 0;
                s.increment = true;
            }
            _ => {}
        }
        false
    }

    fn data(&mut self, byte: u8, recording: bool) {
        let s = &mut self.state;
        if s.cgram_target {
            s.cgram[(s.address & 0x3F) as usize] = byte & 0x1F;
            s.address = (s.address + 1) & 0x3F;
            return;
        }
        let (line, column) = locate(s.address);
        s.ddram[line][column] = byte;
        if recording {
            self.writes.push(DdramWrite { address: s.address, byte });
        }
        s.address = step(s.address, s.increment);
        if s.entry_shift {
            s.shift = if s.increment {
                (s.shift + 1) % DDRAM_LINE_WIDTH
            } else {
                (s.shift + DDRAM_LINE_WIDTH - 1) % DDRAM_LINE_WIDTH
            };
        }
    }

    fn visible(&self, line: Line, width: usize) -> String {
        let row = &self.state.ddram[line_index(line)];
        (0..width.min(DDRAM_LINE_WIDTH))
            .map(|i| cell_char(row[(self.state.shift + i) % DDRAM_LINE_WIDTH]))
            .collect()
    }
}

fn line_index(line: Line) -> usize {
    match line {
        Line::One => 0,
        Line::Two => 1,
    }
}

/// DDRAM address to (line, column), two-line addressing
fn locate(address: u8) -> (usize, usize) {
    let line = usize::from(address >= 0x40);
    let column = (address & 0x3F) as usize % DDRAM_LINE_WIDTH;
    (line, column)
}

/// Advance the address counter, wrapping from the end of one line into the other
fn step(address: u8, forward: bool) -> u8 {
    let (line, column) = locate(address);
    let base = |l: usize| -> u8 { if l == 0 { 0x00 } else { 0x40 } };
    let column = column as u8;
    if forward {
        if (column as usize) + 1 < DDRAM_LINE_WIDTH {
            base(line) + column + 1
        } else {
            base(1 - line)
        }
    } else if column > 0 {
        base(line) + column - 1
    } else {
        base(1 - line) + (DDRAM_LINE_WIDTH as u8 - 1)
    }
}

/// Render a character ROM (A00) code for logs and assertions
pub fn cell_char(code: u8) -> char {
    match code {
        0x00..=0x07 => char::from_u32(0x2460 + code as u32).unwrap_or('?'),
        0x5C => '¥',
        0xDF => '°',
        0x20..=0x7D => code as char,
        _ => '?',
    }
}

#[derive(Debug, Default)]
struct ProbeInner {
    rs: bool,
    enable: bool,
    data: [bool; 4],
    lcd: VirtualLcd,
    events: Vec<BusEvent>,
    transitions: usize,
    fail_at: Option<usize>,
    paused: bool,
    trace_width: Option<usize>,
}

impl ProbeInner {
    fn recording(&self) -> bool {
        !self.paused
    }

    fn drive(&mut self, signal: Signal, level: bool) -> Result<(), ProbeError> {
        let attempt = self.transitions;
        self.transitions += 1;
        if self.fail_at == Some(attempt) {
            return Err(ProbeError);
        }
        if self.recording() {
            self.events.push(BusEvent::Level(signal, level));
        }
        match signal {
            Signal::RegisterSelect => self.rs = level,
            Signal::Data(bit) => self.data[bit as usize & 0x03] = level,
            Signal::Enable => {
                let falling = self.enable && !level;
                self.enable = level;
                if falling {
                    let nibble = self
                        .data
                        .iter()
                        .enumerate()
                        .fold(0u8, |acc, (bit, &high)| acc | (u8::from(high) << bit));
                    let recording = self.recording();
                    let switched_on = self.lcd.latch(self.rs, nibble, recording);
                    if switched_on {
                        if let Some(width) = self.trace_width {
                            info!("[{}]", self.lcd.visible(Line::One, width));
                            info!("[{}]", self.lcd.visible(Line::Two, width));
                        }
                    }
                }
            }
        }
        Ok(())
    }
}

/// Shared handle onto the probed bus
#[derive(Debug, Clone, Default)]
pub struct BusProbe {
    inner: Arc<Mutex<ProbeInner>>,
}

impl BusProbe {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, ProbeInner> {
        self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    /// Pin set wired to this probe
    pub fn pins(&self) -> PinSet<ProbePin> {
        let pin = |signal| ProbePin {
            signal,
            inner: Arc::clone(&self.inner),
        };
        PinSet {
            rs: pin(Signal::RegisterSelect),
            enable: pin(Signal::Enable),
            data: [
                pin(Signal::Data(0)),
                pin(Signal::Data(1)),
                pin(Signal::Data(2)),
                pin(Signal::Data(3)),
            ],
        }
    }

    /// Delay that records instead of sleeping
    pub fn delay(&self) -> ProbeDelay {
        ProbeDelay {
            inner: Arc::clone(&self.inner),
        }
    }

    /// Stop keeping history, the model keeps running. For long emulated sessions.
    pub fn pause_recording(&self) {
        self.lock().paused = true;
    }

    /// Log both visible lines each time the display is switched back on
    pub fn trace_visible(&self, width: usize) {
        self.lock().trace_width = Some(width);
    }

    /// Make the n-th pin transition (0-based, counted from creation) fail once
    pub fn fail_at(&self, transition: usize) {
        self.lock().fail_at = Some(transition);
    }

    /// Forget recorded history, device state is kept
    pub fn reset_log(&self) {
        let mut inner = self.lock();
        inner.events.clear();
        inner.lcd.strobes.clear();
        inner.lcd.commands.clear();
        inner.lcd.writes.clear();
    }

    pub fn events(&self) -> Vec<BusEvent> {
        self.lock().events.clone()
    }

    pub fn strobes(&self) -> Vec<Strobe> {
        self.lock().lcd.strobes.clone()
    }

    /// Decoded instruction bytes
    pub fn commands(&self) -> Vec<u8> {
        self.lock().lcd.commands.clone()
    }

    pub fn ddram_writes(&self) -> Vec<DdramWrite> {
        self.lock().lcd.writes.clone()
    }

    pub fn state(&self) -> DeviceState {
        self.lock().lcd.state.clone()
    }

    pub fn enable_level(&self) -> bool {
        self.lock().enable
    }

    /// What a viewer sees on `line`, honouring the display shift
    pub fn visible_line(&self, line: Line, width: usize) -> String {
        self.lock().lcd.visible(line, width)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ProbeError;

impl embedded_hal::digital::Error for ProbeError {
    fn kind(&self) -> ErrorKind {
        ErrorKind::Other
    }
}

/// One GPIO line of the probe
#[derive(Debug)]
pub struct ProbePin {
    signal: Signal,
    inner: Arc<Mutex<ProbeInner>>,
}

impl ProbePin {
    fn drive(&mut self, level: bool) -> Result<(), ProbeError> {
        self.inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .drive(self.signal, level)
    }
}

impl ErrorType for ProbePin {
    type Error = ProbeError;
}

impl OutputPin for ProbePin {
    fn set_low(&mut self) -> Result<(), Self::Error> {
        self.drive(false)
    }

    fn set_high(&mut self) -> Result<(), Self::Error> {
        self.drive(true)
    }
}

#[derive(Debug)]
pub struct ProbeDelay {
    inner: Arc<Mutex<ProbeInner>>,
}

impl DelayNs for ProbeDelay {
    fn delay_ns(&mut self, ns: u32) {
        let mut inner = self.inner.lock().unwrap_or_else(|poisoned| poisoned.into_inner());
        if inner.recording() {
            inner.events.push(BusEvent::Delay(ns));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_address_wraps_between_lines() {
        assert_eq!(step(0x26, true), 0x27);
        assert_eq!(step(0x27, true), 0x40);
        assert_eq!(step(0x67, true), 0x00);
        assert_eq!(step(0x00, false), 0x67);
        assert_eq!(locate(0xC5 & 0x7F), (1, 5));
    }

    #[test]
    fn test_display_shift_moves_window() {
        let mut lcd = VirtualLcd::default();
        lcd.state.ddram[0][..3].copy_from_slice(b"abc");
        assert_eq!(lcd.visible(Line::One, 3), "abc");

        lcd.instruction(0x18);
        assert_eq!(lcd.visible(Line::One, 3), "bc ");

        lcd.instruction(0x1C);
        assert_eq!(lcd.visible(Line::One, 3), "abc");

        lcd.instruction(0x1C);
        assert_eq!(lcd.state.shift, DDRAM_LINE_WIDTH - 1);
        assert_eq!(lcd.visible(Line::One, 2), " a");
    }

    #[test]
    fn test_four_bit_pairs_nibbles() {
        let mut lcd = VirtualLcd::default();
        lcd.latch(false, 0x2, true); // 8-bit: 0x20 → 4-bit
        assert!(!lcd.state.eight_bit);

        lcd.latch(false, 0x2, true);
        lcd.latch(false, 0x8, true);
        assert!(lcd.state.two_line);

        lcd.latch(true, 0x4, true);
        lcd.latch(true, 0x1, true);
        assert_eq!(lcd.state.ddram[0][0], b'A');
        assert_eq!(lcd.commands, vec![0x20, 0x28]);
    }

    #[test]
    fn test_cell_char_rendering() {
        assert_eq!(cell_char(b'A'), 'A');
        assert_eq!(cell_char(0x5C), '¥');
        assert_eq!(cell_char(0x00), '①');
        assert_eq!(cell_char(0xFE), '?');
    }

    #[test]
    fn test_paused_probe_still_models() {
        let probe = BusProbe::new();
        probe.pause_recording();
        let mut pins = probe.pins();
        pins.enable.set_high().unwrap();
        pins.enable.set_low().unwrap();

        assert!(probe.events().is_empty());
        assert!(probe.strobes().is_empty());
        assert!(!probe.enable_level());
    }
}
