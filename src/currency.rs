/*
 *  currency.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  Display precision and symbol per currency code
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

use crate::glyphs::Glyph;

/// How a currency is marked in front of its amount
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Symbol {
    None,
    /// character ROM code
    Rom(u8),
    Custom(Glyph),
}

impl Symbol {
    pub fn code(self) -> Option<u8> {
        match self {
            Symbol::None => None,
            Symbol::Rom(code) => Some(code),
            Symbol::Custom(glyph) => Some(glyph.code()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Denomination {
    /// digits after the point
    pub precision: usize,
    pub symbol: Symbol,
}

// ISO 4217 minor units plus the smallest unit of each coin
const DOLLARS: &[&str] = &[
    "AUD", "BBD", "MD", "BND", "BSD", "BZD", "CAD", "FJD", "GYD", "HKD", "JMD", "KYD", "LRD",
    "NZD", "SBD", "SGD", "TTD", "TVD", "TWD", "USD", "XCD",
];
const POUNDS: &[&str] = &["EGP", "FKP", "GIP", "GBP", "SHP", "SSP", "SYP"];
const MINOR_2: &[&str] = &[
    "AED", "AFN", "ALL", "AMD", "AOA", "ARS", "AWG", "AZN", "BAM", "BDT", "BGN", "BOB", "BRL",
    "BTN", "BWP", "BYN", "CDF", "CHF", "COP", "CRC", "CUP", "CVE", "CZK", "DKK", "DOP", "DZD",
    "ERN", "ETB", "GEL", "GHS", "GMD", "GTQ", "HNL", "HRK", "HTG", "HUF", "IDR", "ILS", "INR",
    "IRR", "KES", "KGS", "KHR", "KPW", "KZT", "LAK", "LBP", "LKR", "LSL", "MAD", "MDL", "MGA",
    "MKD", "MMK", "MNT", "MOP", "MRU", "MUR", "MVR", "MWK", "MXN", "MYR", "MZN", "NAD", "NGN",
    "NIO", "NOK", "NPR", "PAB", "PEN", "PGK", "PHP", "PKR", "PLN", "QAR", "RON", "RSD", "RUB",
    "SAR", "SCR", "SDG", "SEK", "SLL", "SOS", "SRD", "STN", "SZL", "THB", "TJS", "TMT", "TOP",
    "TRY", "TZS", "UAH", "UYU", "UZS", "VEF", "WST", "YER", "ZAR", "ZMW", "ZWL",
];
const MINOR_0: &[&str] = &[
    "BIF", "CLP", "DJF", "GNF", "ISK", "KMF", "KRW", "PYG", "RWF", "UGX", "VND", "VUV", "XAF",
    "XPF",
];
const MINOR_3: &[&str] = &["BHD", "IQD", "JOD", "KWD", "LYD", "OMR", "TND"];
const BITCOINS: &[&str] = &["BTC", "BCH", "BSV", "BTG"];

const fn denom(precision: usize, symbol: Symbol) -> Denomination {
    Denomination { precision, symbol }
}

/// Look up a currency code, unknown codes get 8 digits and no symbol.
pub fn denomination(code: &str) -> Denomination {
    let code = code.to_ascii_uppercase();
    let code = code.as_str();
    match code {
        _ if DOLLARS.contains(&code) => denom(2, Symbol::Rom(b'$')),
        "EUR" => denom(2, Symbol::Custom(Glyph::Euro)),
        _ if POUNDS.contains(&code) => denom(2, Symbol::Custom(Glyph::Pound)),
        "JPY" => denom(0, Symbol::Rom(0x5C)),
        "CNY" => denom(2, Symbol::Rom(0x5C)),
        _ if MINOR_2.contains(&code) => denom(2, Symbol::None),
        _ if MINOR_0.contains(&code) => denom(0, Symbol::None),
        _ if MINOR_3.contains(&code) => denom(3, Symbol::None),
        _ if BITCOINS.contains(&code) => denom(8, Symbol::Custom(Glyph::Bitcoin)),
        "XMR" => denom(12, Symbol::Custom(Glyph::Monero)),
        "ETH" | "ETC" => denom(18, Symbol::Custom(Glyph::Ether)),
        "DOGE" => denom(8, Symbol::Custom(Glyph::Doge)),
        _ => denom(8, Symbol::None),
    }
}

impl Denomination {
    /// Amount in display codes: symbol (if any) then the number at this precision.
    /// Precision 0 truncates.
    pub fn format(&self, amount: f64) -> Vec<u8> {
        let number = if self.precision == 0 {
            format!("{}", amount.trunc() as i64)
        } else {
            format!("{:.*}", self.precision, amount)
        };
        let mut out = Vec::with_capacity(number.len() + 1);
        out.extend(self.symbol.code());
        out.extend_from_slice(number.as_bytes());
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lookup_groups() {
        assert_eq!(denomination("USD"), denom(2, Symbol::Rom(b'$')));
        assert_eq!(denomination("cad").symbol, Symbol::Rom(b'$'));
        assert_eq!(denomination("EUR").symbol, Symbol::Custom(Glyph::Euro));
        assert_eq!(denomination("GBP").symbol, Symbol::Custom(Glyph::Pound));
        assert_eq!(denomination("JPY"), denom(0, Symbol::Rom(0x5C)));
        assert_eq!(denomination("KRW"), denom(0, Symbol::None));
        assert_eq!(denomination("KWD"), denom(3, Symbol::None));
        assert_eq!(denomination("XMR").precision, 12);
        assert_eq!(denomination("ETH").precision, 18);
        assert_eq!(denomination("LTC"), denom(8, Symbol::None));
    }

    #[test]
    fn test_format_amounts() {
        assert_eq!(denomination("USD").format(61234.5), b"$61234.50".to_vec());
        assert_eq!(denomination("JPY").format(9876543.99), b"\x5C9876543".to_vec());
        assert_eq!(denomination("CHF").format(0.5), b"0.50".to_vec());

        let btc = denomination("BTC").format(0.0123);
        assert_eq!(btc[0], Glyph::Bitcoin.code());
        assert_eq!(&btc[1..], b"0.01230000");
    }
}
