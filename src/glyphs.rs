/*
 *  glyphs.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  5x8 custom characters loaded into CGRAM at start up
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

/// CGRAM slot assignments. Codes 0x00..=0x07 print the slot, nothing else may use them.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum Glyph {
    Up = 0,
    Down = 1,
    Bitcoin = 2,
    Ether = 3,
    Doge = 4,
    Monero = 5,
    Euro = 6,
    Pound = 7,
}

impl Glyph {
    /// Character code that prints this glyph
    pub const fn code(self) -> u8 {
        self as u8
    }

    pub fn from_code(code: u8) -> Option<Self> {
        GLYPHS.get(code as usize).copied()
    }

    /// Closest Unicode character, for logs
    pub fn symbol(self) -> char {
        match self {
            Glyph::Up => '↑',
            Glyph::Down => '↓',
            Glyph::Bitcoin => '₿',
            Glyph::Ether => 'Ξ',
            Glyph::Doge => 'Ð',
            Glyph::Monero => 'ɱ',
            Glyph::Euro => '€',
            Glyph::Pound => '£',
        }
    }
}

const GLYPHS: [Glyph; 8] = [
    Glyph::Up,
    Glyph::Down,
    Glyph::Bitcoin,
    Glyph::Ether,
    Glyph::Doge,
    Glyph::Monero,
    Glyph::Euro,
    Glyph::Pound,
];

pub const GLYPH_UP: [u8; 8] = [0b00000, 0b00100, 0b01110, 0b11111, 0b00000, 0b00000, 0b00000, 0b00000];
pub const GLYPH_DOWN: [u8; 8] = [0b00000, 0b00000, 0b00000, 0b11111, 0b01110, 0b00100, 0b00000, 0b00000];
pub const GLYPH_BITCOIN: [u8; 8] = [0b01100, 0b11110, 0b01001, 0b01110, 0b01001, 0b01001, 0b11110, 0b01100];
pub const GLYPH_ETHER: [u8; 8] = [0b00000, 0b11111, 0b00000, 0b01110, 0b00000, 0b11111, 0b00000, 0b00000];
pub const GLYPH_DOGE: [u8; 8] = [0b01100, 0b01010, 0b01001, 0b11101, 0b01001, 0b01010, 0b01100, 0b00000];
pub const GLYPH_MONERO: [u8; 8] = [0b10001, 0b11011, 0b11111, 0b10101, 0b10001, 0b10001, 0b11011, 0b00000];
pub const GLYPH_EURO: [u8; 8] = [0b00110, 0b01001, 0b11100, 0b01000, 0b11100, 0b01001, 0b00110, 0b00000];
pub const GLYPH_POUND: [u8; 8] = [0b00110, 0b01001, 0b01000, 0b11100, 0b01000, 0b01001, 0b11111, 0b00000];

/// CGRAM image in slot order
pub const GLYPH_TABLE: [[u8; 8]; 8] = [
    GLYPH_UP,
    GLYPH_DOWN,
    GLYPH_BITCOIN,
    GLYPH_ETHER,
    GLYPH_DOGE,
    GLYPH_MONERO,
    GLYPH_EURO,
    GLYPH_POUND,
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_matches_slots() {
        assert_eq!(GLYPH_TABLE[Glyph::Up.code() as usize], GLYPH_UP);
        assert_eq!(GLYPH_TABLE[Glyph::Down.code() as usize], GLYPH_DOWN);
        assert_eq!(GLYPH_TABLE[Glyph::Pound.code() as usize], GLYPH_POUND);
    }

    #[test]
    fn test_from_code() {
        assert_eq!(Glyph::from_code(1), Some(Glyph::Down));
        assert_eq!(Glyph::from_code(6).map(Glyph::symbol), Some('€'));
        assert_eq!(Glyph::from_code(8), None);
    }

    #[test]
    fn test_rows_fit_five_columns() {
        assert!(GLYPH_TABLE.iter().flatten().all(|row| *row <= 0b11111));
    }
}
