/*
 *  display/manager.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  Refresh/scroll state machine for the two line ticker
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

use std::future::Future;
use std::time::{Duration, Instant};

use clap::ValueEnum;
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use lcdticker_driver_hd44780::commands::{
    DDRAM_LINE_WIDTH, DISPLAY_OFF, DISPLAY_ON, DISPLAY_ON_CURSOR_BLINK, SHIFT_DISPLAY_LEFT,
};
use lcdticker_driver_hd44780::{BusError, CharBus, InitMode, Line};
use log::{debug, error, info, warn};
use serde::{Deserialize, Serialize};
use tokio::time::sleep;

use crate::display::error::DisplayError;
use crate::field::{encode, render, Field};
use crate::glyphs::GLYPH_TABLE;
use crate::pricefeed::PriceSource;
use crate::ticker::Price;

/// How fields are presented between refreshes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum DisplayMode {
    /// continuous horizontal scroll across the line buffer
    #[default]
    Scroll,
    /// one field at a time, label over value
    Page,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DisplayState {
    /// nothing loaded yet
    Idle,
    /// fetching, loading screen up
    Refreshing,
    Scrolling,
}

/// Geometry and pacing for the ticker
#[derive(Debug, Clone)]
pub struct ScrollerConfig {
    /// visible cells per line
    pub width: usize,
    /// cells per line the scroll wraps over
    pub buffer_width: usize,
    pub scroll_delay: Duration,
    pub page_delay: Duration,
    pub refresh_interval: Duration,
    pub mode: DisplayMode,
    /// shown on line 1 while fetching
    pub loading_text: String,
}

impl Default for ScrollerConfig {
    fn default() -> Self {
        Self {
            width: 16,
            buffer_width: DDRAM_LINE_WIDTH,
            scroll_delay: Duration::from_millis(800),
            page_delay: Duration::from_secs(3),
            refresh_interval: Duration::from_secs(300),
            mode: DisplayMode::Scroll,
            loading_text: "Getting".to_string(),
        }
    }
}

/// Owns the bus and the cursor column, alternates refreshes with scroll steps.
pub struct TickerDisplay<P, D> {
    bus: CharBus<P, D>,
    config: ScrollerConfig,
    state: DisplayState,
    column: usize,
    last_refresh: Option<Instant>,
}

impl<P, D> TickerDisplay<P, D>
where
    P: OutputPin,
    D: DelayNs,
{
    /// Fails when the geometry cannot be addressed: the scroll buffer must fit one DDRAM
    /// line and the visible window must fit the buffer.
    pub fn new(bus: CharBus<P, D>, config: ScrollerConfig) -> Result<Self, DisplayError> {
        if !(1..=DDRAM_LINE_WIDTH).contains(&config.buffer_width) {
            return Err(DisplayError::InvalidConfiguration(format!(
                "buffer width {} outside 1..={}",
                config.buffer_width, DDRAM_LINE_WIDTH
            )));
        }
        if config.width == 0 || config.width > config.buffer_width {
            return Err(DisplayError::InvalidConfiguration(format!(
                "visible width {} outside 1..={}",
                config.width, config.buffer_width
            )));
        }
        let column = config.width % config.buffer_width;
        Ok(Self {
            bus,
            config,
            state: DisplayState::Idle,
            column,
            last_refresh: None,
        })
    }

    pub fn state(&self) -> DisplayState {
        self.state
    }

    /// Where the next scroll step starts
    pub fn column(&self) -> usize {
        self.column
    }

    pub fn config(&self) -> &ScrollerConfig {
        &self.config
    }

    /// Power-on sequence, then the custom glyphs.
    pub fn start(&mut self, mode: InitMode) -> Result<(), DisplayError> {
        self.bus.initialize(mode).map_err(|e| match e {
            BusError::ReinitWithoutClear => DisplayError::InitializationFailed(e.to_string()),
            pin => DisplayError::Bus(pin),
        })?;
        self.bus.load_glyphs(&GLYPH_TABLE)?;
        info!(
            "LCD ready, {} of {} cells visible, {:?} mode",
            self.config.width, self.config.buffer_width, self.config.mode
        );
        Ok(())
    }

    pub fn refresh_due(&self, now: Instant) -> bool {
        match self.last_refresh {
            None => true,
            Some(last) => now >= last + self.config.refresh_interval,
        }
    }

    /// Fetch every pair behind a loading screen.
    ///
    /// A failed fetch keeps the pair's previous value; the refresh timer restarts either way.
    pub async fn refresh<S: PriceSource>(
        &mut self,
        prices: &mut [Price],
        source: &mut S,
    ) -> Result<(), DisplayError> {
        self.state = DisplayState::Refreshing;
        let width = Some(self.config.width);

        self.bus.clear()?;
        self.bus.command(DISPLAY_ON_CURSOR_BLINK)?;
        self.bus.write_line(&encode(&self.config.loading_text), Line::One, width)?;

        for price in prices.iter_mut() {
            let pair = price.pair();
            self.bus.write_line(&[], Line::Two, width)?;
            self.bus.write_line(&encode(&pair), Line::Two, None)?;

            match source.fetch(&pair).await {
                Ok(value) => {
                    price.update(value);
                    info!("Got {}: {}", pair, render(&price.show()));
                }
                Err(e) => {
                    warn!("Fetching {} failed, keeping {}: {}", pair, render(&price.show()), e);
                }
            }
        }

        self.bus.command(DISPLAY_ON)?;
        self.last_refresh = Some(Instant::now());
        self.column = self.config.width % self.config.buffer_width;
        self.state = DisplayState::Scrolling;
        Ok(())
    }

    /// Scroll every field once across both lines, starting at `start_column`.
    ///
    /// Each column writes the label cell to line 1 and the value cell to line 2 at the same
    /// address, then shifts the display left by one. Returns the column the next call
    /// should start from.
    pub async fn scroll_step(&mut self, fields: &[Field], start_column: usize) -> Result<usize, DisplayError> {
        let buffer_width = self.config.buffer_width;
        let mut column = start_column % buffer_width;

        debug!("COL | ADR1 | CH1 | ADR2 | CH2");
        for field in fields {
            let (top, bottom) = field.padded();
            for (&ch_one, &ch_two) in top.iter().zip(bottom.iter()) {
                let line_one = Line::One.at(column as u8);
                let line_two = Line::Two.at(column as u8);

                self.bus.command(DISPLAY_OFF)?;
                self.bus.command(line_one)?;
                self.bus.write(ch_one)?;
                self.bus.command(line_two)?;
                self.bus.write(ch_two)?;
                self.bus.command(SHIFT_DISPLAY_LEFT)?;
                self.bus.command(DISPLAY_ON)?;

                debug!(
                    " {:2} | 0x{:02X} | '{}' | 0x{:02X} | '{}'",
                    column,
                    line_one,
                    render(&[ch_one]),
                    line_two,
                    render(&[ch_two])
                );

                column = (column + 1) % buffer_width;
                sleep(self.config.scroll_delay).await;
            }
        }
        Ok(column)
    }

    /// Show each field in turn, label on line 1 and value on line 2.
    pub async fn show_pages(&mut self, fields: &[Field]) -> Result<(), DisplayError> {
        let width = Some(self.config.width);
        for field in fields {
            self.bus.write_line(&field.label, Line::One, width)?;
            self.bus.write_line(&field.value, Line::Two, width)?;
            debug!("page {} / {}", render(&field.label), render(&field.value));
            sleep(self.config.page_delay).await;
        }
        Ok(())
    }

    /// One pass of the control loop: refresh if due, then one round of the fields.
    pub async fn tick<S: PriceSource>(
        &mut self,
        prices: &mut [Price],
        source: &mut S,
    ) -> Result<(), DisplayError> {
        if self.refresh_due(Instant::now()) {
            self.refresh(prices, source).await?;
        }

        let fields: Vec<Field> = prices.iter().map(Price::field).collect();
        match self.config.mode {
            DisplayMode::Scroll => {
                self.column = self.scroll_step(&fields, self.column).await?;
            }
            DisplayMode::Page => self.show_pages(&fields).await?,
        }
        Ok(())
    }

    /// Loop until a bus error. Fetch errors never end it.
    pub async fn run<S: PriceSource>(
        &mut self,
        prices: &mut [Price],
        source: &mut S,
    ) -> Result<(), DisplayError> {
        loop {
            self.tick(prices, source).await?;
        }
    }

    /// Start the display and run the ticker until `stop` resolves or the bus fails.
    ///
    /// The display is cleared on every way out, a failed start included.
    pub async fn run_until<S, F>(
        &mut self,
        mode: InitMode,
        prices: &mut [Price],
        source: &mut S,
        stop: F,
    ) -> Result<(), DisplayError>
    where
        S: PriceSource,
        F: Future<Output = ()>,
    {
        let outcome = match self.start(mode) {
            Ok(()) => {
                tokio::select! {
                    _ = stop => Ok(()),
                    res = self.run(prices, source) => {
                        error!("Ticker loop stopped: {:?}", res);
                        res
                    }
                }
            }
            Err(e) => {
                error!("LCD initialisation failed: {}", e);
                Err(e)
            }
        };

        if let Err(e) = self.shutdown() {
            warn!("Could not clear display on exit: {}", e);
        }
        outcome
    }

    /// Blank the display ahead of releasing the pins
    pub fn shutdown(&mut self) -> Result<(), DisplayError> {
        self.bus.clear()?;
        self.state = DisplayState::Idle;
        Ok(())
    }

    pub fn into_bus(self) -> CharBus<P, D> {
        self.bus
    }
}
