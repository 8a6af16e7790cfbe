/*
 *  display/error.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  Error type for the display subsystem
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

use lcdticker_driver_hd44780::BusError;

/// Unified error type for all display operations
#[derive(Debug)]
pub enum DisplayError {
    /// Hardware initialization failed
    InitializationFailed(String),

    /// GPIO line could not be opened or requested
    GpioError(String),

    /// Invalid configuration
    InvalidConfiguration(String),

    /// Bus transfer failed
    Bus(BusError),
}

impl fmt::Display for DisplayError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            DisplayError::InitializationFailed(msg) =>
                write!(f, "Display initialization failed: {}", msg),
            DisplayError::GpioError(msg) =>
                write!(f, "GPIO error: {}", msg),
            DisplayError::InvalidConfiguration(msg) =>
                write!(f, "Invalid configuration: {}", msg),
            DisplayError::Bus(err) =>
                write!(f, "LCD bus error: {}", err),
        }
    }
}

impl Error for DisplayError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            DisplayError::Bus(err) => Some(err),
            _ => None,
        }
    }
}

impl From<BusError> for DisplayError {
    fn from(err: BusError) -> Self {
        DisplayError::Bus(err)
    }
}

// Conversion from GPIO character device errors
impl From<linux_embedded_hal::gpio_cdev::errors::Error> for DisplayError {
    fn from(err: linux_embedded_hal::gpio_cdev::errors::Error) -> Self {
        DisplayError::GpioError(err.to_string())
    }
}
