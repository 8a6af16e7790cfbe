/*
 *  LcdTicker HD44780 driver
 *
 *  Bit-banged 4-bit parallel driver for HD44780 compatible character
 *  LCDs, generic over embedded-hal output pins and delays.
 *
 *  This program is free software: you can redistribute it and/or modify
 *  it under the terms of the GNU General Public License as published by
 *  the Free Software Foundation, either version 3 of the License, or
 *  (at your option) any later version.
 */

//! # LcdTicker HD44780 Driver
//!
//! Drives a 16x2 (or any HD44780 compatible) character LCD over six GPIO lines:
//! register select, enable, and the upper four data lines. R/W is grounded, so the
//! busy flag is never read and every instruction is paced by fixed delays instead.
//!
//! ## Wiring (BCM numbering, Raspberry Pi)
//!
//! | LCD pin | Signal | Default GPIO |
//! |---------|--------|--------------|
//! | 4       | RS     | 7            |
//! | 6       | E      | 8            |
//! | 11      | D4     | 25           |
//! | 12      | D5     | 24           |
//! | 13      | D6     | 23           |
//! | 14      | D7     | 18           |
//!
//! ## Usage
//!
//! ```ignore
//! let mut bus = CharBus::new(pins, delay, BusTiming::default());
//! bus.initialize(InitMode::Resync)?;
//! bus.write_line(b"BTC-USD", Line::One, Some(16))?;
//! ```
//!
//! The [`probe`] module provides an in-memory controller for tests and for running
//! without hardware.

mod bus;
mod error;
pub mod commands;
pub mod probe;

pub use bus::{BusTiming, CharBus, PinSet};
pub use commands::{InitMode, Line};
pub use error::BusError;
