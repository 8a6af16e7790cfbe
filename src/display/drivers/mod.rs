/*
 *  display/drivers/mod.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  Pin backends for the LCD bus
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

pub mod gpio;

use lcdticker_driver_hd44780::probe::BusProbe;

/// In-memory LCD for running without hardware.
///
/// History is not kept, the visible window is logged each time a scroll column lands.
pub fn emulated(width: usize) -> BusProbe {
    let probe = BusProbe::new();
    probe.pause_recording();
    probe.trace_visible(width);
    probe
}
