//! Config module.
//! Turns the command line into `Settings` (gateway address, calibration file,
//! board geometry offsets, run mode).
//! Every flag is optional; launching without arguments gives the stock
//! behaviour: gateway on 127.0.0.1:8765 plus the local menu.

use anyhow::{Context, Result};
use clap::{Arg, ArgAction, ArgMatches, Command, value_parser};
use std::net::SocketAddr;
use std::path::PathBuf;

/// Number of columns on the board. Fixed; the calibration file always holds this many.
pub const COLUMN_COUNT: usize = 7;

/// Distance from the first calibration click up to the board's top edge.
/// Tuned for one board's pixel geometry.
pub const DEFAULT_TOP_OFFSET: i32 = 300;

/// Clicks land this far above the recorded bottom row instead of on its edge.
pub const DEFAULT_CLICK_OFFSET: i32 = 30;

pub const DEFAULT_HOST: &str = "127.0.0.1";
pub const DEFAULT_PORT: u16 = 8765;
pub const DEFAULT_CALIBRATION_FILE: &str = "connect4_calibration.json";

/// Pixel offsets used to derive board geometry from calibration clicks.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Offsets {
    pub top: i32,
    pub click: i32,
}

impl Default for Offsets {
    fn default() -> Self {
        Self {
            top: DEFAULT_TOP_OFFSET,
            click: DEFAULT_CLICK_OFFSET,
        }
    }
}

/// Which front ends to run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum RunMode {
    /// HTTP gateway plus the local menu
    #[default]
    Both,
    /// HTTP gateway only, stopped with Ctrl+C
    Headless,
    /// Local menu only
    MenuOnly,
}

#[derive(Clone, Debug)]
pub struct Settings {
    pub host: String,
    pub port: u16,
    pub calibration_file: PathBuf,
    pub offsets: Offsets,
    pub load_on_start: bool,
    pub mode: RunMode,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            calibration_file: PathBuf::from(DEFAULT_CALIBRATION_FILE),
            offsets: Offsets::default(),
            load_on_start: false,
            mode: RunMode::default(),
        }
    }
}

impl Settings {
    pub fn bind_addr(&self) -> Result<SocketAddr> {
        format!("{}:{}", self.host, self.port)
            .parse()
            .with_context(|| format!("Invalid bind address {}:{}", self.host, self.port))
    }

    pub fn from_matches(matches: &ArgMatches) -> Self {
        let defaults = Settings::default();

        let mode = if matches.get_flag("headless") {
            RunMode::Headless
        } else if matches.get_flag("no-server") {
            RunMode::MenuOnly
        } else {
            RunMode::Both
        };

        Self {
            host: matches
                .get_one::<String>("host")
                .cloned()
                .unwrap_or(defaults.host),
            port: matches.get_one::<u16>("port").copied().unwrap_or(defaults.port),
            calibration_file: matches
                .get_one::<PathBuf>("calibration-file")
                .cloned()
                .unwrap_or(defaults.calibration_file),
            offsets: Offsets {
                top: matches
                    .get_one::<i32>("top-offset")
                    .copied()
                    .unwrap_or(DEFAULT_TOP_OFFSET),
                click: matches
                    .get_one::<i32>("click-offset")
                    .copied()
                    .unwrap_or(DEFAULT_CLICK_OFFSET),
            },
            load_on_start: matches.get_flag("load"),
            mode,
        }
    }
}

pub fn command() -> Command {
    Command::new("column-clicker")
        .version(env!("CARGO_PKG_VERSION"))
        .about("Calibrated column clicker for browser board games")
        .arg(
            Arg::new("host")
                .long("host")
                .value_name("HOST")
                .help("IP address the extension bridge listens on")
                .default_value(DEFAULT_HOST),
        )
        .arg(
            Arg::new("port")
                .long("port")
                .value_name("PORT")
                .help("Port the extension bridge listens on")
                .default_value("8765")
                .value_parser(value_parser!(u16)),
        )
        .arg(
            Arg::new("calibration-file")
                .long("calibration-file")
                .value_name("PATH")
                .help("Where calibration is saved and loaded")
                .default_value(DEFAULT_CALIBRATION_FILE)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("top-offset")
                .long("top-offset")
                .value_name("PIXELS")
                .help("Board top = first calibration click y minus this")
                .default_value("300")
                .value_parser(value_parser!(i32)),
        )
        .arg(
            Arg::new("click-offset")
                .long("click-offset")
                .value_name("PIXELS")
                .help("Clicks land this many pixels above the bottom row")
                .default_value("30")
                .value_parser(value_parser!(i32)),
        )
        .arg(
            Arg::new("load")
                .long("load")
                .help("Load the saved calibration at startup")
                .action(ArgAction::SetTrue),
        )
        .arg(
            Arg::new("headless")
                .long("headless")
                .help("Run only the extension bridge (no local menu)")
                .action(ArgAction::SetTrue)
                .conflicts_with("no-server"),
        )
        .arg(
            Arg::new("no-server")
                .long("no-server")
                .help("Run only the local menu (no extension bridge)")
                .action(ArgAction::SetTrue),
        )
}
