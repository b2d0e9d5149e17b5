//! Do some preparations for integration tests

#![allow(dead_code)]

use smol::io::{AsyncReadExt, AsyncWriteExt};
use smol::net::TcpStream;
use std::cell::RefCell;
use std::collections::BTreeSet;
use std::net::SocketAddr;
use std::num::NonZeroUsize;
use std::path::{Path, PathBuf};
use std::rc::Rc;
use std::time::Duration;

use wallchd::backends::{Backend, BackendError};
use wallchd::{Handler, RotationState, Server};

/// A backend that only remembers what it was asked to apply.
#[derive(Clone, Default)]
pub struct Recorder {
    pub applied: Rc<RefCell<Vec<PathBuf>>>,
    pub failing: BTreeSet<PathBuf>,
}

impl Backend for Recorder {
    async fn apply(&self, image: &Path) -> Result<(), BackendError> {
        self.applied.borrow_mut().push(image.to_path_buf());
        if self.failing.contains(image) {
            return Err(BackendError::Spawn {
                program: String::from("recorder"),
                source: std::io::Error::other("refused"),
            });
        }
        Ok(())
    }
}

impl Recorder {
    pub fn count(&self) -> usize {
        self.applied.borrow().len()
    }
}

pub fn setup() {
    let _ = env_logger::builder()
        .is_test(true)
        .filter_level(log::LevelFilter::Debug)
        .try_init();
}

/// A server on a free local port.
pub fn server(dirs: &[&Path], delay: u64, backend: Recorder) -> Server<Recorder> {
    let state = RotationState::new(delay, NonZeroUsize::new(10).unwrap());
    let dirs = dirs.iter().map(|dir| dir.to_path_buf()).collect();
    let handler = Handler::new(backend, dirs, state);
    let addr: SocketAddr = "127.0.0.1:0".parse().unwrap();
    smol::block_on(Server::bind(addr, handler)).expect("cannot bind test server")
}

/// Sends one line and reads the whole reply.
pub async fn request(addr: SocketAddr, line: &str) -> String {
    let mut conn = TcpStream::connect(addr).await.expect("cannot connect");
    conn.write_all(format!("{line}\n").as_bytes())
        .await
        .expect("cannot send request");
    let mut reply = String::new();
    conn.read_to_string(&mut reply)
        .await
        .expect("cannot read reply");
    reply
}

/// Runs the server next to `client` until both are done.
///
/// The client is expected to end with `quit`, the test fails after `limit`.
pub fn drive<B, F>(server: &mut Server<B>, client: F, limit: Duration) -> F::Output
where
    B: Backend,
    F: Future,
{
    smol::block_on(async {
        let both = async { Some(smol::future::zip(server.run(), client).await) };
        let timeout = async {
            smol::Timer::after(limit).await;
            None
        };
        match smol::future::or(both, timeout).await {
            Some(((), output)) => output,
            None => panic!("server did not quit within {limit:?}"),
        }
    })
}
