//! cli parameters

use clap::Parser;
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    version,
    about = "CLI tool for controlling wallchd.",
    long_about = None
)]
pub struct Cli {
    #[arg(
        short = 'p',
        long = "port",
        value_name = "PORT",
        help = "Port of the daemon, read from the port file if not given."
    )]
    pub port: Option<u16>,

    #[arg(
        long = "port-file",
        value_name = "FILE",
        help = "Port file written by the daemon."
    )]
    pub port_file: Option<PathBuf>,

    #[arg(
        value_name = "COMMAND",
        trailing_var_arg = true,
        allow_hyphen_values = true,
        help = "Command and its arguments, `next` if omitted. Try `help`."
    )]
    pub command: Vec<String>,
}

impl Cli {
    /// The request line to send.
    pub fn request_line(&self) -> String {
        self.command.join(" ")
    }
}
