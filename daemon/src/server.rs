//! Serves client requests and fires rotations, on a single task.
//!
//! Working cycle of the server:
//! 1. Compute the time left until the next rotation.
//! 2. If it is overdue, rotate now and wait a full delay afterwards.
//! 3. Wait for a connection, for at most that long.
//! 4. On a connection, read one line, run it, write the reply and hang up.
//!
//! Rotations and requests never overlap, and whatever a request changes is seen by the next
//! deadline computation. `quit` is only noticed at the top of the cycle.

use smol::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use smol::net::{TcpListener, TcpStream};
use std::net::SocketAddr;
use std::time::{Duration, Instant};

use crate::backends::Backend;
use crate::handler::Handler;
use crate::rotation::Deadline;
use crate::utils::ipc;

/// Pause after a failed `accept`, so a persistent error does not spin the loop.
const ACCEPT_RETRY: Duration = Duration::from_millis(100);

/// How long to back off after a failed `accept`, never past the next rotation.
fn accept_backoff(timeout: Duration) -> Duration {
    timeout.min(ACCEPT_RETRY)
}

pub struct Server<B: Backend> {
    listener: TcpListener,
    handler: Handler<B>,
}

impl<B: Backend> Server<B> {
    /// Binds the listening socket.
    ///
    /// # Errors
    /// See [`TcpListener::bind`].
    pub async fn bind(addr: SocketAddr, handler: Handler<B>) -> std::io::Result<Self> {
        Ok(Self {
            listener: TcpListener::bind(addr).await?,
            handler,
        })
    }

    /// # Errors
    /// See [`TcpListener::local_addr`].
    pub fn local_addr(&self) -> std::io::Result<SocketAddr> {
        self.listener.local_addr()
    }

    pub fn handler(&self) -> &Handler<B> {
        &self.handler
    }

    /// Runs until a `quit` request is served.
    pub async fn run(&mut self) {
        while self.handler.state().is_running() {
            let timeout = self.next_timeout().await;
            log::debug!("waiting up to {}s", timeout.as_secs_f64());

            let listener = &self.listener;
            let incoming = smol::future::or(async { Some(listener.accept().await) }, async {
                smol::Timer::after(timeout).await;
                None
            })
            .await;

            match incoming {
                // Timed out, the next cycle rotates if it is due.
                None => (),
                Some(Ok((stream, peer))) => {
                    if let Err(err) = self.serve(stream).await {
                        log::warn!("request from {peer} failed: {err}");
                    }
                }
                Some(Err(err)) => {
                    log::warn!("cannot accept connection: {err}");
                    smol::Timer::after(accept_backoff(timeout)).await;
                }
            }
        }
        log::info!("server stopped");
    }

    /// How long to wait for a request, rotating first if it is due.
    async fn next_timeout(&mut self) -> Duration {
        match self.handler.state().deadline(Instant::now()) {
            Deadline::Overdue => {
                if !self.handler.rotate().await {
                    log::info!(
                        "next attempt in {}s",
                        self.handler.state().delay_secs()
                    );
                }
                self.handler.state().delay()
            }
            Deadline::In(remaining) => remaining,
        }
    }

    /// Handles exactly one request on `stream`.
    async fn serve(&mut self, stream: TcpStream) -> std::io::Result<()> {
        let mut line = String::new();
        BufReader::new(stream.clone()).read_line(&mut line).await?;
        let request = ipc::parse(&line);
        log::debug!("request: {request:?}");

        let mut reply = self.handler.respond(&request).await;
        if !reply.is_empty() {
            reply.push('\n');
        }
        let mut stream = stream;
        stream.write_all(reply.as_bytes()).await?;
        stream.flush().await
    }
}
