//! Bookkeeping of the listening port.
//!
//! A running daemon records its port in a well-known file so clients can find it, and so a newly
//! started daemon can ask the old one to quit.

use smol::io::AsyncWriteExt;
use smol::net::TcpStream;
use std::net::{Ipv4Addr, SocketAddr};
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

const QUIT_TIMEOUT: Duration = Duration::from_secs(1);

#[derive(Debug, Error)]
pub enum PortFileError {
    #[error("cannot read port file `{0}`: {1}")]
    Read(String, std::io::Error),
    #[error("port file `{0}` does not contain a port")]
    Malformed(String),
}

/// Reads the port stored in `path`.
///
/// # Errors
/// If the file cannot be read or its first line is not a port number.
pub fn read_port(path: &Path) -> Result<u16, PortFileError> {
    let content = std::fs::read_to_string(path)
        .map_err(|err| PortFileError::Read(path.display().to_string(), err))?;
    content
        .lines()
        .next()
        .and_then(|line| line.trim().parse().ok())
        .ok_or_else(|| PortFileError::Malformed(path.display().to_string()))
}

/// Records `port` in `path`, replacing whatever was there.
///
/// # Errors
/// See [`std::fs::write`].
pub fn write_port(path: &Path, port: u16) -> std::io::Result<()> {
    std::fs::write(path, format!("{port}\n"))
}

/// Removes the port file, but only if it still belongs to the daemon listening on `port`.
pub fn remove_port(path: &Path, port: u16) {
    if read_port(path).is_ok_and(|stored| stored == port)
        && let Err(err) = std::fs::remove_file(path)
    {
        log::warn!("cannot remove port file {}: {err}", path.display());
    }
}

/// Asks a previously started daemon to quit.
///
/// The old daemon may well be dead already, so every failure here is only logged.
pub async fn quit_previous(path: &Path) {
    let port = match read_port(path) {
        Ok(port) => port,
        Err(err) => {
            log::debug!("no previous instance: {err}");
            return;
        }
    };
    let attempt = async {
        let mut conn = TcpStream::connect(SocketAddr::from((Ipv4Addr::LOCALHOST, port))).await?;
        conn.write_all(b"quit\n").await?;
        conn.flush().await
    };
    let timeout = async {
        smol::Timer::after(QUIT_TIMEOUT).await;
        Err::<(), _>(std::io::Error::from(std::io::ErrorKind::TimedOut))
    };
    match smol::future::or(attempt, timeout).await {
        Ok(()) => log::info!("asked previous instance on port {port} to quit"),
        Err(err) => log::debug!("previous instance on port {port} unreachable: {err}"),
    }
}
