//! Command line options of the daemon.

use clap::{Parser, ValueEnum};
use std::collections::{BTreeSet, HashMap};
use std::env;
use std::num::NonZeroUsize;
use std::path::PathBuf;

use crate::rotation::{DEFAULT_DELAY, DEFAULT_MAX_HISTORY};

#[derive(Parser)]
#[command(
    version,
    about = "A daemon that rotates the desktop wallpaper and takes commands over TCP"
)]
struct Cli {
    #[arg(value_name = "DIR", help = "Directories to look for images in.")]
    dirs: Vec<PathBuf>,

    #[arg(
        short = 'd',
        long = "delay",
        value_name = "DURATION",
        value_parser = parse_delay,
        help = "Time between wallpaper changes, in seconds or as a duration like `3m`. [default: 180]"
    )]
    delay: Option<u64>,

    #[arg(
        short = 'p',
        long = "port",
        value_name = "PORT",
        default_value_t = 0,
        help = "Port to listen on, 0 lets the system pick one."
    )]
    port: u16,

    #[arg(
        long = "port-file",
        value_name = "FILE",
        help = "Where to record the listening port."
    )]
    port_file: Option<PathBuf>,

    #[arg(
        long = "max-history",
        value_name = "N",
        help = "Number of wallpapers remembered in the history. [default: 500]"
    )]
    max_history: Option<NonZeroUsize>,

    #[arg(
        short = 'b',
        long = "backend",
        value_enum,
        default_value_t = BackendKind::Feh,
        help = "Program used to set the wallpaper."
    )]
    backend: BackendKind,

    #[arg(
        long = "binary",
        value_name = "PATH",
        help = "Path to the backend binary, searched in $PATH if not given."
    )]
    binary: Option<String>,

    #[arg(
        long = "bg-type",
        value_name = "TYPE",
        default_value = "scale",
        help = "feh placement mode, passed as `--bg-<TYPE>`."
    )]
    bg_type: String,

    #[arg(
        short = 's',
        long = "set",
        value_name = "KEY=VALUE",
        value_parser = parse_property,
        help = "Extra backend option, `on` or `off` toggle a flag. Can be repeated."
    )]
    properties: Vec<(String, String)>,

    #[arg(long = "paused", help = "Start paused, no change until `play`.")]
    paused: bool,

    #[arg(short = 'v', long = "verbose", help = "Log debug messages.")]
    verbose: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum BackendKind {
    /// `feh --bg-*`, for X11.
    Feh,
    /// `swww img`, for Wayland.
    Swww,
}

pub struct Config {
    pub dirs: BTreeSet<PathBuf>,
    pub delay: u64,
    pub port: u16,
    pub port_file: PathBuf,
    pub max_history: NonZeroUsize,
    pub backend: BackendKind,
    pub binary: Option<String>,
    pub bg_type: String,
    pub properties: HashMap<String, String>,
    pub paused: bool,
    pub verbose: bool,
}

impl From<Cli> for Config {
    fn from(parsed: Cli) -> Self {
        Self {
            dirs: parsed.dirs.into_iter().collect(),
            delay: parsed.delay.unwrap_or(DEFAULT_DELAY),
            port: parsed.port,
            port_file: parsed.port_file.unwrap_or_else(sys_port_file),
            max_history: parsed.max_history.unwrap_or(DEFAULT_MAX_HISTORY),
            backend: parsed.backend,
            binary: parsed.binary,
            bg_type: parsed.bg_type,
            properties: parsed.properties.into_iter().collect(),
            paused: parsed.paused,
            verbose: parsed.verbose,
        }
    }
}

/// Parses the process arguments, exits on invalid ones.
pub fn parse() -> Config {
    Cli::parse().into()
}

fn parse_delay(value: &str) -> Result<u64, String> {
    let delay = duration_str::parse(value).map_err(|err| err.to_string())?;
    match delay.as_secs() {
        0 => Err(String::from("delay must be at least one second")),
        secs => Ok(secs),
    }
}

fn parse_property(value: &str) -> Result<(String, String), String> {
    match value.split_once('=') {
        Some((key, value)) if !key.is_empty() => Ok((key.to_string(), value.to_string())),
        _ => Err(format!("expected KEY=VALUE, got `{value}`")),
    }
}

/// Default location of the port file.
pub fn sys_port_file() -> PathBuf {
    if let Ok(value) = env::var("XDG_RUNTIME_DIR") {
        return PathBuf::from(value + "/wallchd.port");
    }
    if let Ok(value) = env::var("HOME") {
        return PathBuf::from(value + "/.wallch_port");
    }
    PathBuf::from("/tmp/wallchd.port")
}
