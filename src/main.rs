/*
 *  main.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  Crypto price ticker for HD44780 character LCDs
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

use anyhow::{anyhow, Context};
use embedded_hal::delay::DelayNs;
use embedded_hal::digital::OutputPin;
use env_logger::Env;
use log::{info, warn};
use tokio::signal::unix::{signal, SignalKind};

use lcdticker::config::{self, Config};
use lcdticker::display::drivers::{self, gpio};
use lcdticker::display::TickerDisplay;
use lcdticker::pricefeed::TickerClient;
use lcdticker::ticker::Price;
use lcdticker_driver_hd44780::CharBus;

include!(concat!(env!("OUT_DIR"), "/build_info.rs"));

/// Asynchronously waits for a SIGINT, SIGTERM, or SIGHUP signal.
async fn signal_handler() -> Result<(), Box<dyn std::error::Error>> {
    let mut sigint = signal(SignalKind::interrupt())?;
    let mut sigterm = signal(SignalKind::terminate())?;
    let mut sighup = signal(SignalKind::hangup())?;

    tokio::select! {
        _ = sigint.recv() => {
            info!("SIGINT received. Initiating graceful shutdown.");
        }
        _ = sigterm.recv() => {
            info!("SIGTERM received. Initiating graceful shutdown.");
        }
        _ = sighup.recv() => {
            info!("SIGHUP received. Initiating graceful shutdown.");
        }
    }
    Ok(())
}

/// Resolves on a termination signal. Without signal handlers it never resolves.
async fn shutdown_requested() {
    if let Err(e) = signal_handler().await {
        warn!("Signal handling unavailable, stop the process to exit: {}", e);
        std::future::pending::<()>().await;
    }
}

/// Drive the ticker on any bus until a signal or a bus failure, then blank the display.
async fn run<P, D>(bus: CharBus<P, D>, config: &Config) -> anyhow::Result<()>
where
    P: OutputPin,
    D: DelayNs,
{
    let mut prices = config
        .pairs()
        .iter()
        .map(|pair| Price::parse(pair).ok_or_else(|| anyhow!("invalid trade pair '{}'", pair)))
        .collect::<anyhow::Result<Vec<_>>>()?;
    let mut source = TickerClient::new(config.feed()).context("building price feed client")?;

    let mut display = TickerDisplay::new(bus, config.scroller())?;
    info!(
        "Tracking {} in {:?} mode",
        prices.iter().map(Price::pair).collect::<Vec<_>>().join(", "),
        display.config().mode
    );

    let outcome = display
        .run_until(config.init_mode(), &mut prices, &mut source, shutdown_requested())
        .await;

    info!("Releasing GPIO lines.");
    drop(display.into_bus().into_pins());

    outcome.context("LCD ticker")
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> anyhow::Result<()> {
    let config = config::load()?;

    env_logger::Builder::from_env(Env::default().default_filter_or(config.log_level()))
        .format_timestamp_secs()
        .init();

    info!("{} - prices on a 1602", env!("CARGO_PKG_NAME"));
    info!("v.{} built {}", env!("CARGO_PKG_VERSION"), BUILD_DATE);

    let timing = config.bus_timing();
    if config.is_emulated() {
        info!("Emulation mode enabled - LCD modelled in memory");
        let probe = drivers::emulated(config.scroller().width);
        run(CharBus::new(probe.pins(), probe.delay(), timing), &config).await
    } else {
        let pins = gpio::open_pins(&config.gpio_chip(), &config.pins())?;
        run(CharBus::new(pins, linux_embedded_hal::Delay, timing), &config).await
    }
}
