/*
 *  config.rs
 *
 *  LcdTicker - prices on a 1602
 *  (c) 2020-26 Stuart Hunter
 *
 *  Layered configuration: defaults, YAML file, command line
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

use clap::{ArgAction, Parser, ValueEnum, ValueHint};
use dirs_next::home_dir;
use lcdticker_driver_hd44780::{BusTiming, InitMode};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use std::{fs, path::{Path, PathBuf}};
use thiserror::Error;

use crate::display::{DisplayMode, ScrollerConfig};
use crate::pricefeed::FeedConfig;

pub const DEFAULT_GPIO_CHIP: &str = "/dev/gpiochip0";
pub const DEFAULT_API_URL: &str = "https://api.cryptonator.com/api/ticker/{pair}";
pub const DEFAULT_PRICE_POINTER: &str = "/ticker/price";
pub const DEFAULT_PAIRS: [&str; 3] = ["BTC-USD", "BTC-EUR", "BTC-ETH"];

/// Error type for config loading/validation.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("YAML parse error: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Validation error: {0}")]
    Validation(String),
}

/// Top-level app configuration.
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    pub log_level: Option<String>,     // e.g., "info" | "debug"
    /// drive the in-memory LCD instead of GPIO
    pub emulated: Option<bool>,
    pub lcd: Option<LcdConfig>,
    pub ticker: Option<TickerConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct LcdConfig {
    pub gpio_chip: Option<String>,  // e.g. "/dev/gpiochip0"
    pub pins: Option<PinConfig>,
    pub width: Option<usize>,       // visible cells per line
    pub buffer_width: Option<usize>,// DDRAM cells the scroll wraps over
    pub pulse_us: Option<u32>,
    pub settle_us: Option<u32>,
    pub init: Option<InitKind>,
}

/// BCM line offsets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PinConfig {
    pub rs: u32,
    pub enable: u32,
    pub d4: u32,
    pub d5: u32,
    pub d6: u32,
    pub d7: u32,
}

impl Default for PinConfig {
    fn default() -> Self {
        Self { rs: 7, enable: 8, d4: 25, d5: 24, d6: 23, d7: 18 }
    }
}

impl PinConfig {
    pub fn data(&self) -> [u32; 4] {
        [self.d4, self.d5, self.d6, self.d7]
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct TickerConfig {
    pub pairs: Option<Vec<String>>,
    pub refresh_secs: Option<u64>,
    pub scroll_delay_ms: Option<u64>,
    pub page_delay_ms: Option<u64>,
    pub mode: Option<DisplayMode>,
    pub loading_text: Option<String>,
    pub api_url: Option<String>,
    pub price_pointer: Option<String>,
    pub user_agent: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum InitKind {
    Resync,
    Direct,
}

impl From<InitKind> for InitMode {
    fn from(kind: InitKind) -> Self {
        match kind {
            InitKind::Resync => InitMode::Resync,
            InitKind::Direct => InitMode::Direct,
        }
    }
}

/// CLI overrides. All fields are Options so we can layer them over YAML.
#[derive(Debug, Parser, Clone, Default)]
#[command(name = "lcdticker", version, about = "Scrolling price ticker for HD44780 LCDs")]
pub struct Cli {
    /// Path to a YAML config file (overrides search)
    #[arg(long, short = 'c', value_hint = ValueHint::FilePath)]
    pub config: Option<PathBuf>,
    #[arg(long)]
    pub log_level: Option<String>,
    /// Enable debug log level
    #[arg(long, short = 'v', alias = "verbose", action = ArgAction::SetTrue)]
    pub debug: bool,
    /// Run against the in-memory LCD, no GPIO needed
    #[arg(long, action = ArgAction::SetTrue)]
    pub emulated: bool,
    #[arg(long, value_hint = ValueHint::FilePath)]
    pub gpio_chip: Option<String>,
    /// Trade pair to show, BASE-TARGET, repeatable
    #[arg(long = "pair", short = 'p')]
    pub pairs: Vec<String>,
    #[arg(long)]
    pub refresh_secs: Option<u64>,
    #[arg(long)]
    pub scroll_delay_ms: Option<u64>,
    #[arg(long, value_enum)]
    pub mode: Option<DisplayMode>,
    #[arg(long, value_enum)]
    pub init: Option<InitKind>,
    /// dump fully merged config (after overrides) and exit
    #[arg(long, action = ArgAction::SetTrue)]
    pub dump_config: bool,
}

/// Public entry point: parse CLI, read YAML, merge, validate.
pub fn load() -> Result<Config, ConfigError> {
    let cli = Cli::parse();
    let cfg = load_with(&cli)?;

    if cli.dump_config {
        // Pretty YAML of effective config (nice for debugging)
        let s = serde_yaml::to_string(&cfg)?;
        println!("{s}");
        std::process::exit(0);
    }

    Ok(cfg)
}

/// Merge and validate against an already parsed command line.
pub fn load_with(cli: &Cli) -> Result<Config, ConfigError> {
    // 1) defaults (from `Default` impl)
    let mut cfg = Config::default();

    // 2) YAML file (explicit path or search)
    if let Some(p) = cli.config.as_ref() {
        if p.exists() {
            let y = read_yaml(p)?;
            merge(&mut cfg, y);
        } else {
            return Err(ConfigError::Validation(format!(
                "Config file not found: {}",
                p.display()
            )));
        }
    } else if let Some(p) = find_config_file() {
        let y = read_yaml(&p)?;
        merge(&mut cfg, y);
    }

    // 3) CLI overrides (highest precedence)
    apply_cli_overrides(&mut cfg, cli);

    // 4) Validate
    validate(&cfg)?;
    Ok(cfg)
}

/// Try common locations in order (first hit wins).
fn find_config_file() -> Option<PathBuf> {
    // XDG-style: ~/.config/lcdticker/config.yaml
    if let Some(home) = home_dir() {
        let p = home.join(".config/lcdticker/config.yaml");
        if p.exists() { return Some(p) }
        let p = home.join(".config/lcdticker.yaml");
        if p.exists() { return Some(p) }
    }
    // project local
    for candidate in &["lcdticker.yaml", "config.yaml", "config/lcdticker.yaml"] {
        let p = PathBuf::from(candidate);
        if p.exists() { return Some(p) }
    }
    None
}

fn read_yaml(path: &Path) -> Result<Config, ConfigError> {
    let s = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&s)?;
    Ok(cfg)
}

/// Shallow merge `src` into `dst`, Option-by-Option.
fn merge(dst: &mut Config, src: Config) {
    if src.log_level.is_some() { dst.log_level = src.log_level; }
    if src.emulated.is_some()  { dst.emulated = src.emulated; }
    match (&mut dst.lcd, src.lcd) {
        (None, Some(c)) => dst.lcd = Some(c),
        (Some(d), Some(s)) => merge_lcd(d, s),
        _ => {}
    }
    match (&mut dst.ticker, src.ticker) {
        (None, Some(c)) => dst.ticker = Some(c),
        (Some(d), Some(s)) => merge_ticker(d, s),
        _ => {}
    }
}

fn merge_lcd(dst: &mut LcdConfig, src: LcdConfig) {
    if src.gpio_chip.is_some()    { dst.gpio_chip = src.gpio_chip; }
    if src.pins.is_some()         { dst.pins = src.pins; }
    if src.width.is_some()        { dst.width = src.width; }
    if src.buffer_width.is_some() { dst.buffer_width = src.buffer_width; }
    if src.pulse_us.is_some()     { dst.pulse_us = src.pulse_us; }
    if src.settle_us.is_some()    { dst.settle_us = src.settle_us; }
    if src.init.is_some()         { dst.init = src.init; }
}

fn merge_ticker(dst: &mut TickerConfig, src: TickerConfig) {
    if src.pairs.is_some()           { dst.pairs = src.pairs; }
    if src.refresh_secs.is_some()    { dst.refresh_secs = src.refresh_secs; }
    if src.scroll_delay_ms.is_some() { dst.scroll_delay_ms = src.scroll_delay_ms; }
    if src.page_delay_ms.is_some()   { dst.page_delay_ms = src.page_delay_ms; }
    if src.mode.is_some()            { dst.mode = src.mode; }
    if src.loading_text.is_some()    { dst.loading_text = src.loading_text; }
    if src.api_url.is_some()         { dst.api_url = src.api_url; }
    if src.price_pointer.is_some()   { dst.price_pointer = src.price_pointer; }
    if src.user_agent.is_some()      { dst.user_agent = src.user_agent; }
}

fn apply_cli_overrides(cfg: &mut Config, cli: &Cli) {
    if cli.log_level.is_some() { cfg.log_level = cli.log_level.clone(); }
    if cli.debug               { cfg.log_level = Some("debug".into()); }
    if cli.emulated            { cfg.emulated = Some(true); }

    if cli.gpio_chip.is_some() || cli.init.is_some() {
        let lcd = cfg.lcd.get_or_insert_with(LcdConfig::default);
        if cli.gpio_chip.is_some() { lcd.gpio_chip = cli.gpio_chip.clone(); }
        if cli.init.is_some()      { lcd.init = cli.init; }
    }

    let any_ticker = !cli.pairs.is_empty()
        || cli.refresh_secs.is_some()
        || cli.scroll_delay_ms.is_some()
        || cli.mode.is_some();
    if any_ticker {
        let ticker = cfg.ticker.get_or_insert_with(TickerConfig::default);
        if !cli.pairs.is_empty()         { ticker.pairs = Some(cli.pairs.clone()); }
        if cli.refresh_secs.is_some()    { ticker.refresh_secs = cli.refresh_secs; }
        if cli.scroll_delay_ms.is_some() { ticker.scroll_delay_ms = cli.scroll_delay_ms; }
        if cli.mode.is_some()            { ticker.mode = cli.mode; }
    }
}

/// Range and consistency checks on the merged config
fn validate(cfg: &Config) -> Result<(), ConfigError> {
    let lcd = cfg.lcd_or_default();
    let width = lcd.width.unwrap_or(16);
    let buffer_width = lcd.buffer_width.unwrap_or(40);
    if buffer_width == 0 || buffer_width > 40 {
        return Err(ConfigError::Validation("lcd buffer_width must be 1..=40".into()));
    }
    if width == 0 || width > buffer_width {
        return Err(ConfigError::Validation("lcd width must be 1..=buffer_width".into()));
    }
    if lcd.pulse_us == Some(0) {
        return Err(ConfigError::Validation("lcd pulse_us must be > 0".into()));
    }
    let pins = lcd.pins.unwrap_or_default();
    let mut seen = HashSet::new();
    for pin in [pins.rs, pins.enable, pins.d4, pins.d5, pins.d6, pins.d7] {
        if !seen.insert(pin) {
            return Err(ConfigError::Validation(format!("lcd pin {pin} assigned twice")));
        }
    }

    let ticker = cfg.ticker.clone().unwrap_or_default();
    if ticker.refresh_secs == Some(0) {
        return Err(ConfigError::Validation("ticker refresh_secs must be > 0".into()));
    }
    let pairs = cfg.pairs();
    if pairs.is_empty() {
        return Err(ConfigError::Validation("ticker needs at least one pair".into()));
    }
    for pair in &pairs {
        match pair.split_once('-') {
            Some((base, target)) if !base.is_empty() && !target.is_empty() => {}
            _ => return Err(ConfigError::Validation(format!("pair '{pair}' is not BASE-TARGET"))),
        }
    }
    Ok(())
}

impl Config {
    fn lcd_or_default(&self) -> LcdConfig {
        self.lcd.clone().unwrap_or_default()
    }

    pub fn log_level(&self) -> &str {
        self.log_level.as_deref().unwrap_or("info")
    }

    pub fn is_emulated(&self) -> bool {
        self.emulated.unwrap_or(false)
    }

    pub fn gpio_chip(&self) -> String {
        self.lcd_or_default().gpio_chip.unwrap_or_else(|| DEFAULT_GPIO_CHIP.to_string())
    }

    pub fn pins(&self) -> PinConfig {
        self.lcd_or_default().pins.unwrap_or_default()
    }

    pub fn init_mode(&self) -> InitMode {
        self.lcd_or_default().init.unwrap_or(InitKind::Resync).into()
    }

    pub fn bus_timing(&self) -> BusTiming {
        let lcd = self.lcd_or_default();
        let defaults = BusTiming::default();
        BusTiming {
            pulse_us: lcd.pulse_us.unwrap_or(defaults.pulse_us),
            settle_us: lcd.settle_us.unwrap_or(defaults.settle_us),
        }
    }

    pub fn pairs(&self) -> Vec<String> {
        self.ticker
            .as_ref()
            .and_then(|t| t.pairs.clone())
            .unwrap_or_else(|| DEFAULT_PAIRS.iter().map(|p| p.to_string()).collect())
    }

    pub fn scroller(&self) -> ScrollerConfig {
        let lcd = self.lcd_or_default();
        let ticker = self.ticker.clone().unwrap_or_default();
        let defaults = ScrollerConfig::default();
        ScrollerConfig {
            width: lcd.width.unwrap_or(defaults.width),
            buffer_width: lcd.buffer_width.unwrap_or(defaults.buffer_width),
            scroll_delay: ticker.scroll_delay_ms.map(Duration::from_millis).unwrap_or(defaults.scroll_delay),
            page_delay: ticker.page_delay_ms.map(Duration::from_millis).unwrap_or(defaults.page_delay),
            refresh_interval: ticker.refresh_secs.map(Duration::from_secs).unwrap_or(defaults.refresh_interval),
            mode: ticker.mode.unwrap_or(defaults.mode),
            loading_text: ticker.loading_text.unwrap_or(defaults.loading_text),
        }
    }

    pub fn feed(&self) -> FeedConfig {
        let ticker = self.ticker.clone().unwrap_or_default();
        FeedConfig {
            api_url: ticker.api_url.unwrap_or_else(|| DEFAULT_API_URL.to_string()),
            price_pointer: ticker.price_pointer.unwrap_or_else(|| DEFAULT_PRICE_POINTER.to_string()),
            user_agent: ticker.user_agent,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(yaml: &str) -> Config {
        serde_yaml::from_str(yaml).unwrap()
    }

    #[test]
    fn test_defaults_validate() {
        let cfg = Config::default();
        assert!(validate(&cfg).is_ok());
        assert_eq!(cfg.pairs(), vec!["BTC-USD", "BTC-EUR", "BTC-ETH"]);
        assert_eq!(cfg.pins(), PinConfig { rs: 7, enable: 8, d4: 25, d5: 24, d6: 23, d7: 18 });
        let scroller = cfg.scroller();
        assert_eq!(scroller.width, 16);
        assert_eq!(scroller.buffer_width, 40);
        assert_eq!(scroller.refresh_interval, Duration::from_secs(300));
        assert_eq!(scroller.scroll_delay, Duration::from_millis(800));
        assert_eq!(cfg.init_mode(), InitMode::Resync);
    }

    #[test]
    fn test_yaml_merge_keeps_unset_fields() {
        let mut cfg = parse("lcd:\n  width: 20\n  gpio_chip: /dev/gpiochip4\n");
        merge(&mut cfg, parse("lcd:\n  width: 16\nticker:\n  refresh_secs: 60\n  mode: page\n"));

        let lcd = cfg.lcd.as_ref().unwrap();
        assert_eq!(lcd.width, Some(16));
        assert_eq!(lcd.gpio_chip.as_deref(), Some("/dev/gpiochip4"));
        assert_eq!(cfg.scroller().mode, DisplayMode::Page);
        assert_eq!(cfg.scroller().refresh_interval, Duration::from_secs(60));
    }

    #[test]
    fn test_cli_overrides_win() {
        let mut cfg = parse("log_level: warn\nticker:\n  pairs: [ETH-USD]\n  scroll_delay_ms: 500\n");
        let cli = Cli {
            debug: true,
            pairs: vec!["XMR-BTC".into(), "DOGE-USD".into()],
            init: Some(InitKind::Direct),
            ..Cli::default()
        };
        apply_cli_overrides(&mut cfg, &cli);

        assert_eq!(cfg.log_level(), "debug");
        assert_eq!(cfg.pairs(), vec!["XMR-BTC", "DOGE-USD"]);
        assert_eq!(cfg.scroller().scroll_delay, Duration::from_millis(500));
        assert_eq!(cfg.init_mode(), InitMode::Direct);
    }

    #[test]
    fn test_validation_rejects_bad_geometry() {
        assert!(validate(&parse("lcd:\n  buffer_width: 41\n")).is_err());
        assert!(validate(&parse("lcd:\n  width: 24\n  buffer_width: 20\n")).is_err());
        assert!(validate(&parse("lcd:\n  width: 0\n")).is_err());
        assert!(validate(&parse("lcd:\n  pulse_us: 0\n")).is_err());
    }

    #[test]
    fn test_validation_rejects_duplicate_pins() {
        let cfg = parse("lcd:\n  pins: { rs: 7, enable: 7, d4: 25, d5: 24, d6: 23, d7: 18 }\n");
        assert!(matches!(validate(&cfg), Err(ConfigError::Validation(_))));
    }

    #[test]
    fn test_validation_rejects_bad_pairs() {
        assert!(validate(&parse("ticker:\n  pairs: []\n")).is_err());
        assert!(validate(&parse("ticker:\n  pairs: [BTCUSD]\n")).is_err());
        assert!(validate(&parse("ticker:\n  pairs: [BTC-]\n")).is_err());
        assert!(validate(&parse("ticker:\n  refresh_secs: 0\n")).is_err());
        assert!(validate(&parse("ticker:\n  pairs: [LTC-BTC]\n")).is_ok());
    }

    #[test]
    fn test_missing_explicit_config_file() {
        let cli = Cli {
            config: Some(PathBuf::from("/nonexistent/lcdticker.yaml")),
            ..Cli::default()
        };
        assert!(matches!(load_with(&cli), Err(ConfigError::Validation(_))));
    }
}
