//! `wallchd` entry
//!
//! Asks any previous instance to quit, binds the control socket, records the port, and then
//! runs the server until it receives `quit`.

use std::net::{Ipv4Addr, SocketAddr};
use std::time::Instant;
use thiserror::Error;

use crate::backends::{Backend, Feh, Swww};
use crate::cli::{self, BackendKind, Config};
use crate::handler::Handler;
use crate::rotation::RotationState;
use crate::server::Server;
use crate::utils::portfile;

/// Fatal errors, all of them happen before the server starts.
#[derive(Debug, Error)]
pub enum DaemonError {
    #[error("failed to set up logging: {0}")]
    Logger(#[from] fern::InitError),
    #[error("cannot listen on {0}: {1}")]
    Bind(SocketAddr, std::io::Error),
    #[error("cannot write port file `{0}`: {1}")]
    PortFile(String, std::io::Error),
}

fn setup_logger(verbose: bool) -> Result<(), fern::InitError> {
    let level = if verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };
    fern::Dispatch::new()
        .format(|out, message, record| {
            out.finish(format_args!(
                "[{} {}] {}",
                chrono::Local::now().format("%H:%M:%S"),
                record.level(),
                message
            ));
        })
        .level(level)
        .chain(std::io::stdout())
        .apply()?;
    Ok(())
}

/// The real start.
///
/// # Errors
/// Fatal errors that will cause the program to exit will be returned here.
pub fn start() -> Result<(), DaemonError> {
    let config = cli::parse();
    setup_logger(config.verbose)?;

    smol::block_on(async {
        match config.backend {
            BackendKind::Feh => {
                let backend = Feh::new(config.binary.clone(), &config.bg_type, &config.properties);
                serve(backend, &config).await
            }
            BackendKind::Swww => {
                let backend = Swww::new(config.binary.clone(), config.properties.clone());
                serve(backend, &config).await
            }
        }
    })
}

async fn serve<B: Backend>(backend: B, config: &Config) -> Result<(), DaemonError> {
    portfile::quit_previous(&config.port_file).await;

    let mut state = RotationState::new(config.delay, config.max_history);
    if config.paused {
        state.pause(Instant::now());
    }
    let handler = Handler::new(backend, config.dirs.clone(), state);

    let addr = SocketAddr::from((Ipv4Addr::LOCALHOST, config.port));
    let mut server = Server::bind(addr, handler)
        .await
        .map_err(|err| DaemonError::Bind(addr, err))?;
    let port = server
        .local_addr()
        .map_err(|err| DaemonError::Bind(addr, err))?
        .port();
    portfile::write_port(&config.port_file, port)
        .map_err(|err| DaemonError::PortFile(config.port_file.display().to_string(), err))?;
    log::info!(
        "listening on port {port}, recorded in {}",
        config.port_file.display()
    );

    server.run().await;

    portfile::remove_port(&config.port_file, port);
    Ok(())
}
