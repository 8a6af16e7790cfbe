/*
 *  ticker.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  Per-pair price state and trend
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

use std::cmp::Ordering;

use crate::currency::{denomination, Denomination};
use crate::field::{encode, Field};
use crate::glyphs::Glyph;

/// Shown until the first successful fetch
pub const NO_VALUE: &str = "--";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trend {
    Up,
    Down,
    Flat,
}

impl Trend {
    pub fn glyph(self) -> Option<Glyph> {
        match self {
            Trend::Up => Some(Glyph::Up),
            Trend::Down => Some(Glyph::Down),
            Trend::Flat => None,
        }
    }
}

/// A BASE-TARGET trade pair and its last two known prices
#[derive(Debug, Clone)]
pub struct Price {
    base: String,
    target: String,
    denomination: Denomination,
    value: Option<f64>,
    previous: Option<f64>,
}

impl Price {
    pub fn new(base: &str, target: &str) -> Self {
        Self {
            base: base.to_ascii_uppercase(),
            target: target.to_ascii_uppercase(),
            denomination: denomination(target),
            value: None,
            previous: None,
        }
    }

    /// Parse "BTC-USD"
    pub fn parse(pair: &str) -> Option<Self> {
        let (base, target) = pair.split_once('-')?;
        if base.is_empty() || target.is_empty() {
            return None;
        }
        Some(Self::new(base, target))
    }

    /// Name of the trade pair, "base-target"
    pub fn pair(&self) -> String {
        format!("{}-{}", self.base, self.target)
    }

    pub fn value(&self) -> Option<f64> {
        self.value
    }

    /// Record a freshly fetched price, the current one becomes the comparison point
    pub fn update(&mut self, value: f64) {
        self.previous = self.value;
        self.value = Some(value);
    }

    pub fn trend(&self) -> Trend {
        match (self.previous, self.value) {
            (Some(old), Some(new)) => match new.partial_cmp(&old) {
                Some(Ordering::Greater) => Trend::Up,
                Some(Ordering::Less) => Trend::Down,
                _ => Trend::Flat,
            },
            _ => Trend::Flat,
        }
    }

    /// Formatted value cells, symbol included
    pub fn show(&self) -> Vec<u8> {
        match self.value {
            Some(value) => self.denomination.format(value),
            None => encode(NO_VALUE),
        }
    }

    /// Trend glyph (if any) and pair on top, price below
    pub fn field(&self) -> Field {
        let mut label: Vec<u8> = self.trend().glyph().map(Glyph::code).into_iter().collect();
        label.extend(encode(&self.pair()));
        Field::new(label, self.show())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_pair() {
        let price = Price::parse("btc-usd").unwrap();
        assert_eq!(price.pair(), "BTC-USD");
        assert!(Price::parse("BTCUSD").is_none());
        assert!(Price::parse("-USD").is_none());
    }

    #[test]
    fn test_trend_glyphs() {
        let mut price = Price::new("BTC", "USD");
        price.update(100.0);
        assert_eq!(price.trend(), Trend::Flat);
        assert_eq!(price.field().label, b"BTC-USD".to_vec());

        price.update(90.0);
        assert_eq!(price.trend(), Trend::Down);
        assert_eq!(price.field().label[0], Glyph::Down.code());

        price.update(110.0);
        assert_eq!(price.trend(), Trend::Up);
        assert_eq!(price.field().label[0], Glyph::Up.code());

        price.update(110.0);
        assert_eq!(price.trend(), Trend::Flat);
        assert_eq!(price.field().label, b"BTC-USD".to_vec());
    }

    #[test]
    fn test_glyph_counts_as_one_cell() {
        let mut price = Price::new("BTC", "USD");
        price.update(61234.5);
        price.update(61000.0);
        let field = price.field();
        assert_eq!(field.label.len(), 8);
        assert_eq!(field.width(), 11);
    }

    #[test]
    fn test_show_before_first_fetch() {
        let price = Price::new("ETH", "BTC");
        assert_eq!(price.show(), b"--".to_vec());
        assert_eq!(price.value(), None);
    }
}
