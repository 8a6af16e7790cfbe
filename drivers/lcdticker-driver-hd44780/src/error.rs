/*
 *  error.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  Bus level error type
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

use std::error::Error;
use std::fmt;

/// Errors raised while driving the parallel bus
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BusError {
    /// A pin refused a level change
    Pin(String),

    /// initialize() called on a ready controller that has been written since its last clear
    ReinitWithoutClear,
}

impl fmt::Display for BusError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BusError::Pin(msg) =>
                write!(f, "GPIO pin error: {}", msg),
            BusError::ReinitWithoutClear =>
                write!(f, "Controller is active, clear before re-initialising"),
        }
    }
}

impl Error for BusError {}

/// Wrap any embedded-hal pin error
pub(crate) fn pin_error<E: embedded_hal::digital::Error>(err: E) -> BusError {
    BusError::Pin(format!("{:?} ({:?})", err, err.kind()))
}
