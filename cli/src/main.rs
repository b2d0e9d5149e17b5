//! `wallchctl` entry
//!
//! The cli program to communicate with wallchd

mod cli;

use std::io::{Read, Write};
use std::net::{Ipv4Addr, Shutdown, TcpStream};

use clap::Parser;
use thiserror::Error;
use wallchd::cli::sys_port_file;
use wallchd::utils::portfile::{self, PortFileError};

#[derive(Debug, Error)]
enum ClientError {
    #[error("cannot find the daemon: {0}")]
    PortFile(#[from] PortFileError),
    #[error("cannot talk to the daemon on port {0}: {1}")]
    Connection(u16, std::io::Error),
}

fn send(port: u16, line: &str) -> Result<String, ClientError> {
    let error = |err| ClientError::Connection(port, err);
    let mut conn = TcpStream::connect((Ipv4Addr::LOCALHOST, port)).map_err(error)?;
    conn.write_all(format!("{line}\n").as_bytes())
        .map_err(error)?;
    conn.shutdown(Shutdown::Write).map_err(error)?;
    let mut reply = String::new();
    conn.read_to_string(&mut reply).map_err(error)?;
    Ok(reply)
}

fn main() -> Result<(), ClientError> {
    let cli = cli::Cli::parse();
    let port = match cli.port {
        Some(port) => port,
        None => {
            let path = cli.port_file.clone().unwrap_or_else(sys_port_file);
            portfile::read_port(&path).inspect_err(|err| eprintln!("{err}"))?
        }
    };
    let reply = send(port, &cli.request_line()).inspect_err(|err| eprintln!("{err}"))?;
    print!("{reply}");
    Ok(())
}
