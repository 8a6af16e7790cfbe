/*
 *  display/drivers/gpio.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  GPIO character device lines for the LCD bus
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

use lcdticker_driver_hd44780::PinSet;
use linux_embedded_hal::CdevPin;
use linux_embedded_hal::gpio_cdev::{Chip, LineRequestFlags};
use log::info;

use crate::config::PinConfig;
use crate::display::error::DisplayError;

const CONSUMER: &str = "lcdticker";

/// Request the six bus lines as outputs, driven low.
///
/// The lines are held for as long as the returned pins live.
pub fn open_pins(chip_path: &str, pins: &PinConfig) -> Result<PinSet<CdevPin>, DisplayError> {
    let mut chip = Chip::new(chip_path)
        .map_err(|e| DisplayError::GpioError(format!("{}: {}", chip_path, e)))?;

    let mut output = |offset: u32| -> Result<CdevPin, DisplayError> {
        let handle = chip
            .get_line(offset)?
            .request(LineRequestFlags::OUTPUT, 0, CONSUMER)?;
        Ok(CdevPin::new(handle)?)
    };

    let [d4, d5, d6, d7] = pins.data();
    let set = PinSet {
        rs: output(pins.rs)?,
        enable: output(pins.enable)?,
        data: [output(d4)?, output(d5)?, output(d6)?, output(d7)?],
    };
    info!(
        "LCD on {} RS={} E={} D4..D7={:?}",
        chip_path, pins.rs, pins.enable, pins.data()
    );
    Ok(set)
}
