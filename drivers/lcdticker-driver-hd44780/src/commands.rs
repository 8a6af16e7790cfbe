/*
 *  commands.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  HD44780 instruction set as used by the ticker
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

// Hex  Binary   Instruction
// 01   00000001 Clear display screen
// 02   00000010 Return home
// 06   00000110 Increment cursor (shift cursor to right)
// 08   00001000 Display off, cursor off
// 0C   00001100 Display on, cursor off
// 0F   00001111 Display on, cursor blinking
// 18   00011000 Shift the entire display to the left
// 22   00100010 Initialize 4-bit mode
// 28   00101000 4-bit, 2 lines, 5x8 font
// 40   01000000 CGRAM address 0
// 80   10000000 DDRAM, 1st line
// C0   11000000 DDRAM, 2nd line

pub const CLEAR_DISPLAY: u8 = 0x01;
pub const RETURN_HOME: u8 = 0x02;
pub const ENTRY_MODE_INCREMENT: u8 = 0x06;
pub const DISPLAY_OFF: u8 = 0x08;
pub const DISPLAY_ON: u8 = 0x0C;
pub const DISPLAY_ON_CURSOR_BLINK: u8 = 0x0F;
pub const SHIFT_DISPLAY_LEFT: u8 = 0x18;
pub const WAKE_8BIT: u8 = 0x33;
pub const WAKE_4BIT: u8 = 0x32;
pub const INIT_4BIT: u8 = 0x22;
pub const FUNCTION_SET_4BIT_2LINE: u8 = 0x28;
pub const SET_CGRAM_ADDR: u8 = 0x40;

/// DDRAM cells per line, whatever the visible width.
pub const DDRAM_LINE_WIDTH: usize = 40;

/// Clear and home need ~1.52ms to execute, well beyond a strobe.
pub const CLEAR_EXECUTION_US: u32 = 1_600;

/// Power-on command sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InitMode {
    /// 0x33, 0x32 wake pair first, recovers from either bus width
    #[default]
    Resync,
    /// Single 0x22, assumes the controller already listens on 4 bits
    Direct,
}

impl InitMode {
    pub fn sequence(self) -> &'static [u8] {
        match self {
            InitMode::Resync => &[
                WAKE_8BIT,
                WAKE_4BIT,
                ENTRY_MODE_INCREMENT,
                DISPLAY_ON_CURSOR_BLINK,
                FUNCTION_SET_4BIT_2LINE,
                CLEAR_DISPLAY,
            ],
            InitMode::Direct => &[
                INIT_4BIT,
                ENTRY_MODE_INCREMENT,
                DISPLAY_ON_CURSOR_BLINK,
                FUNCTION_SET_4BIT_2LINE,
                CLEAR_DISPLAY,
            ],
        }
    }
}

/// The two addressable rows of a 1602
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Line {
    One,
    Two,
}

impl Line {
    pub const fn address(self) -> u8 {
        match self {
            Line::One => 0x80,
            Line::Two => 0xC0,
        }
    }

    /// Set-DDRAM-address command for `column` on this line.
    pub const fn at(self, column: u8) -> u8 {
        self.address() | column
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_line_addresses() {
        assert_eq!(Line::One.at(0), 0x80);
        assert_eq!(Line::Two.at(0), 0xC0);
        assert_eq!(Line::One.at(0x27), 0xA7);
        assert_eq!(Line::Two.at(16), 0xD0);
    }

    #[test]
    fn test_init_sequences_end_ready() {
        for mode in [InitMode::Resync, InitMode::Direct] {
            let seq = mode.sequence();
            assert_eq!(seq.last(), Some(&CLEAR_DISPLAY));
            assert!(seq.contains(&FUNCTION_SET_4BIT_2LINE));
            assert!(seq.contains(&ENTRY_MODE_INCREMENT));
        }
        assert_eq!(InitMode::Resync.sequence()[..2], [0x33, 0x32]);
        assert_eq!(InitMode::Direct.sequence()[0], 0x22);
    }
}
