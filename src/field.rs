/*
 *  field.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  Label/value pairs ready for the character display
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

use log::debug;

use crate::glyphs::Glyph;

/// Printed in place of anything the character ROM cannot show
pub const PLACEHOLDER: u8 = b'?';

/// Cells appended after the longer of label and value
pub const FIELD_GAP: usize = 2;

/// Map text onto A00 character ROM codes.
pub fn encode(text: &str) -> Vec<u8> {
    text.chars().map(encode_char).collect()
}

pub fn encode_char(c: char) -> u8 {
    match c {
        // 0x5C is ¥ in this ROM
        '\\' => PLACEHOLDER,
        ' '..='}' => c as u8,
        '¥' => 0x5C,
        '°' => 0xDF,
        _ => {
            debug!("no LCD code for {:?}, using placeholder", c);
            PLACEHOLDER
        }
    }
}

/// Display codes back to text, for logs
pub fn render(cells: &[u8]) -> String {
    cells
        .iter()
        .map(|&code| match code {
            0x00..=0x07 => Glyph::from_code(code).map_or('?', Glyph::symbol),
            0x5C => '¥',
            0xDF => '°',
            0x20..=0x7D => code as char,
            _ => '?',
        })
        .collect()
}

/// One scrolling column pair: label on line 1, value on line 2
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Field {
    pub label: Vec<u8>,
    pub value: Vec<u8>,
}

impl Field {
    /// Build from already encoded cells
    pub fn new(label: Vec<u8>, value: Vec<u8>) -> Self {
        Self { label, value }
    }

    pub fn from_text(label: &str, value: &str) -> Self {
        Self::new(encode(label), encode(value))
    }

    /// Cells this field occupies on each line
    pub fn width(&self) -> usize {
        self.label.len().max(self.value.len()) + FIELD_GAP
    }

    /// Label and value left-justified with trailing spaces to the shared width
    pub fn padded(&self) -> (Vec<u8>, Vec<u8>) {
        let width = self.width();
        let pad = |cells: &[u8]| {
            let mut out = cells.to_vec();
            out.resize(width, b' ');
            out
        };
        (pad(&self.label), pad(&self.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_padding_width() {
        let field = Field::from_text("BTC-USD", "61234.50");
        assert_eq!(field.width(), 10);

        let (label, value) = field.padded();
        assert_eq!(label, b"BTC-USD   ".to_vec());
        assert_eq!(value, b"61234.50  ".to_vec());
    }

    #[test]
    fn test_label_longer_than_value() {
        let field = Field::from_text("DOGE-BTC", "1");
        let (label, value) = field.padded();
        assert_eq!(label.len(), 10);
        assert_eq!(value, b"1         ".to_vec());
    }

    #[test]
    fn test_encode_substitutes() {
        assert_eq!(encode("a~b"), b"a?b".to_vec());
        assert_eq!(encode("¥5"), vec![0x5C, b'5']);
        assert_eq!(encode("20°"), vec![b'2', b'0', 0xDF]);
        assert_eq!(encode("€"), vec![PLACEHOLDER]);
        assert_eq!(encode("a\\b"), b"a?b".to_vec());
    }

    #[test]
    fn test_render_for_logs() {
        assert_eq!(render(&[0x00, b'B', b'T', b'C']), "↑BTC");
        assert_eq!(render(&[0x06, b'1', b'.', b'5']), "€1.5");
        assert_eq!(render(&[0x5C, b'9']), "¥9");
    }
}
