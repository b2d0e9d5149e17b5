//! Carries out commands against the rotation state, the catalog and the backend.

use rand::seq::SliceRandom;
use std::collections::BTreeSet;
use std::path::{Path, PathBuf};
use std::time::Instant;

use crate::backends::{Backend, BackendError};
use crate::commands::{CommandKind, help_text, lookup};
use crate::rotation::RotationState;
use crate::utils::CommandError;
use crate::utils::catalog::Catalog;
use crate::utils::ipc::Request;

pub struct Handler<B: Backend> {
    state: RotationState,
    dirs: BTreeSet<PathBuf>,
    catalog: Catalog,
    backend: B,
}

fn parse_int(value: &str) -> Result<i64, CommandError> {
    value
        .parse()
        .map_err(|_| CommandError::InvalidInteger(value.to_string()))
}

/// Delays are stored unsigned, negative numbers are still told apart from garbage.
fn parse_delay(value: &str) -> Result<u64, CommandError> {
    match value.parse() {
        Ok(seconds) => Ok(seconds),
        Err(_) => Err(CommandError::NonPositiveDelay(parse_int(value)?)),
    }
}

fn join_paths<'a, I>(paths: I) -> String
where
    I: IntoIterator<Item = &'a PathBuf>,
{
    paths
        .into_iter()
        .map(|path| path.display().to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

impl<B: Backend> Handler<B> {
    /// Creates a handler and loads the first catalog from `dirs`.
    pub fn new(backend: B, dirs: BTreeSet<PathBuf>, state: RotationState) -> Self {
        let catalog = Catalog::scan(&dirs);
        log::info!(
            "found {} images in {} directories",
            catalog.len(),
            dirs.len()
        );
        Self {
            state,
            dirs,
            catalog,
            backend,
        }
    }

    pub fn state(&self) -> &RotationState {
        &self.state
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    /// Runs a request and renders the reply, failures included.
    ///
    /// A failure is reported together with the help of the command that caused it.
    pub async fn respond(&mut self, request: &Request) -> String {
        match self.execute(request).await {
            Ok(reply) => reply,
            Err(err) => {
                log::warn!("`{}` failed: {err}", request.name);
                format!("error: {err}\n{}", help_text(Some(request.name.as_str())))
            }
        }
    }

    /// Runs a request.
    ///
    /// # Errors
    /// Unknown commands, wrong argument counts, and invalid arguments.
    pub async fn execute(&mut self, request: &Request) -> Result<String, CommandError> {
        let spec = lookup(&request.name)
            .ok_or_else(|| CommandError::UnknownCommand(request.name.clone()))?;
        spec.check_arity(request.args.len())?;
        log::debug!("running `{}` with {:?}", spec.name, request.args);

        // Arity is checked, required arguments are present.
        let arg = request.args.first().map(String::as_str);
        match spec.kind {
            CommandKind::AddDir => Ok(self.add_dir(arg.unwrap_or_default())),
            CommandKind::Delay => self.delay(arg),
            CommandKind::Errors => Ok(join_paths(self.state.errors())),
            CommandKind::Get => self.get(arg),
            CommandKind::Help => Ok(help_text(arg)),
            CommandKind::History => self.history(arg),
            CommandKind::ListDirs => Ok(join_paths(&self.dirs)),
            CommandKind::ListImages => Ok(join_paths(self.catalog.images())),
            CommandKind::Next => {
                self.state.force_next();
                Ok(String::new())
            }
            CommandKind::Pause => Ok(self.pause()),
            CommandKind::Play => Ok(self.play()),
            CommandKind::Quit => {
                log::info!("quit requested");
                self.state.stop();
                Ok(String::new())
            }
            CommandKind::Reload => Ok(self.reload()),
            CommandKind::Set => self.set(arg.unwrap_or_default()).await,
        }
    }

    fn get(&self, index: Option<&str>) -> Result<String, CommandError> {
        let index = index.map_or(Ok(-1), parse_int)?;
        Ok(self.state.history_entry(index)?.display().to_string())
    }

    /// An integer is a history index, anything else is a path.
    async fn set(&mut self, image: &str) -> Result<String, CommandError> {
        let image = match image.parse::<i64>() {
            Ok(index) => self.state.history_entry(index)?.to_path_buf(),
            Err(_) => PathBuf::from(image),
        };
        match self.apply(image).await {
            Ok(()) => Ok(String::new()),
            Err(err) => Ok(format!("error: {err}")),
        }
    }

    fn reload(&mut self) -> String {
        self.catalog = Catalog::scan(&self.dirs);
        log::info!("reloaded {} images", self.catalog.len());
        format!("Reloaded {} images.", self.catalog.len())
    }

    fn add_dir(&mut self, dir: &str) -> String {
        self.dirs.insert(PathBuf::from(dir));
        String::from("Added.")
    }

    /// Numbered history, only the last `max` entries if given.
    fn history(&self, max: Option<&str>) -> Result<String, CommandError> {
        let history = self.state.history();
        let skip = match max {
            Some(max) => {
                let max = parse_int(max)?;
                let max = usize::try_from(max).map_err(|_| CommandError::NegativeCount(max))?;
                history.len().saturating_sub(max)
            }
            None => 0,
        };
        let width = history.len().saturating_sub(1).to_string().len();
        Ok(history
            .iter()
            .enumerate()
            .skip(skip)
            .map(|(i, image)| format!("{i:0width$}:{}", image.display()))
            .collect::<Vec<_>>()
            .join("\n"))
    }

    fn pause(&mut self) -> String {
        if self.state.pause(Instant::now()) {
            log::info!("paused");
            String::from("Paused.")
        } else {
            String::from("Already paused.")
        }
    }

    fn play(&mut self) -> String {
        if self.state.play(Instant::now()) {
            log::info!("unpaused");
            String::from("Unpaused.")
        } else {
            String::from("Already playing.")
        }
    }

    fn delay(&mut self, seconds: Option<&str>) -> Result<String, CommandError> {
        let Some(seconds) = seconds else {
            return Ok(self.state.delay_secs().to_string());
        };
        let seconds = parse_delay(seconds)?;
        self.state.set_delay(seconds)?;
        log::info!("delay set to {seconds}s");
        Ok(format!("Delay set to {seconds}."))
    }

    /// Hands `image` to the backend and records the outcome.
    async fn apply(&mut self, image: PathBuf) -> Result<(), BackendError> {
        match self.backend.apply(&image).await {
            Ok(()) => {
                log::info!("wallpaper set to {}", image.display());
                self.state.record_success(image, Instant::now());
                Ok(())
            }
            Err(err) => {
                log::warn!("cannot set {}: {err}", image.display());
                self.state.record_failure(image);
                Err(err)
            }
        }
    }

    /// Applies a random image from the catalog.
    ///
    /// Each image is tried at most once, in random order, until one works. Returns `false` if
    /// none did, the rotation is skipped then and the next one is a full delay away.
    pub async fn rotate(&mut self) -> bool {
        if self.catalog.is_empty() {
            log::error!("no images to choose from, skipping rotation");
            self.state.record_skip(Instant::now());
            return false;
        }
        let mut order: Vec<usize> = (0..self.catalog.len()).collect();
        order.shuffle(&mut rand::rng());
        for index in order {
            let Some(image) = self.catalog.get(index).map(Path::to_path_buf) else {
                continue;
            };
            if self.apply(image).await.is_ok() {
                return true;
            }
        }
        log::error!(
            "all {} images failed, skipping rotation",
            self.catalog.len()
        );
        self.state.record_skip(Instant::now());
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rotation::Deadline;
    use std::cell::RefCell;
    use std::num::NonZeroUsize;

    /// Records every image and refuses the ones listed in `failing`.
    #[derive(Default)]
    struct Recorder {
        applied: RefCell<Vec<PathBuf>>,
        failing: BTreeSet<PathBuf>,
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

    fn handler(backend: Recorder, capacity: usize) -> Handler<Recorder> {
        let state = RotationState::new(100, NonZeroUsize::new(capacity).unwrap());
        Handler::new(backend, BTreeSet::new(), state)
    }

    fn run(handler: &mut Handler<Recorder>, line: &str) -> Result<String, CommandError> {
        smol::block_on(handler.execute(&crate::utils::ipc::parse(line)))
    }

    #[test]
    fn set_then_get() {
        let mut handler = handler(Recorder::default(), 10);
        assert_eq!(run(&mut handler, "set a.png"), Ok(String::new()));
        assert_eq!(run(&mut handler, "get"), Ok(String::from("a.png")));
        assert_eq!(run(&mut handler, "get -1"), Ok(String::from("a.png")));
        assert_eq!(run(&mut handler, "get 0"), Ok(String::from("a.png")));
        assert_eq!(
            run(&mut handler, "get 1"),
            Err(CommandError::IndexOutOfRange { index: 1, len: 1 })
        );
        assert_eq!(
            run(&mut handler, "get last"),
            Err(CommandError::InvalidInteger(String::from("last")))
        );
    }

    #[test]
    fn get_on_empty_history() {
        let mut handler = handler(Recorder::default(), 10);
        assert_eq!(
            run(&mut handler, "get"),
            Err(CommandError::IndexOutOfRange { index: -1, len: 0 })
        );
    }

    #[test]
    fn set_resolves_indices_first() {
        let mut handler = handler(Recorder::default(), 10);
        run(&mut handler, "set a.png").unwrap();
        run(&mut handler, "set b.png").unwrap();

        run(&mut handler, "set 0").unwrap();
        assert_eq!(run(&mut handler, "get -1"), Ok(String::from("a.png")));
        run(&mut handler, "set -2").unwrap();
        assert_eq!(run(&mut handler, "get -1"), Ok(String::from("b.png")));
        assert_eq!(
            run(&mut handler, "set 9"),
            Err(CommandError::IndexOutOfRange { index: 9, len: 4 })
        );

        let applied: Vec<String> = handler
            .backend
            .applied
            .borrow()
            .iter()
            .map(|path| path.display().to_string())
            .collect();
        assert_eq!(applied, vec!["a.png", "b.png", "a.png", "b.png"]);
    }

    #[test]
    fn failed_set_reports_once() {
        let mut backend = Recorder::default();
        backend.failing.insert(PathBuf::from("broken.png"));
        let mut handler = handler(backend, 10);

        assert_eq!(
            run(&mut handler, "set broken.png"),
            Ok(String::from("error: cannot spawn `recorder`: refused"))
        );
        assert!(handler.state().history().is_empty());
        assert_eq!(run(&mut handler, "errors"), Ok(String::from("broken.png")));
        assert_eq!(handler.backend.applied.borrow().len(), 1);
    }

    #[test]
    fn history_rendering() {
        let mut handler = handler(Recorder::default(), 3);
        assert_eq!(run(&mut handler, "history"), Ok(String::new()));
        for i in 0..13 {
            run(&mut handler, &format!("set img{i}.png")).unwrap();
        }
        assert_eq!(
            run(&mut handler, "history"),
            Ok(String::from("0:img10.png\n1:img11.png\n2:img12.png"))
        );
        assert_eq!(
            run(&mut handler, "history 2"),
            Ok(String::from("1:img11.png\n2:img12.png"))
        );
        assert_eq!(run(&mut handler, "history 0"), Ok(String::new()));
        assert_eq!(
            run(&mut handler, "history 50"),
            run(&mut handler, "history")
        );
        assert_eq!(
            run(&mut handler, "history -1"),
            Err(CommandError::NegativeCount(-1))
        );
    }

    #[test]
    fn history_indices_are_padded() {
        let mut handler = handler(Recorder::default(), 20);
        for i in 0..12 {
            run(&mut handler, &format!("set {i}.png")).unwrap();
        }
        let history = run(&mut handler, "history 3").unwrap();
        assert_eq!(history, "09:9.png\n10:10.png\n11:11.png");
        let full = run(&mut handler, "history").unwrap();
        assert!(full.starts_with("00:0.png\n01:1.png\n"));
    }

    #[test]
    fn delay_roundtrip() {
        let mut handler = handler(Recorder::default(), 10);
        assert_eq!(run(&mut handler, "delay"), Ok(String::from("100")));
        assert_eq!(
            run(&mut handler, "delay 42"),
            Ok(String::from("Delay set to 42."))
        );
        assert_eq!(run(&mut handler, "delay"), Ok(String::from("42")));
        assert_eq!(
            run(&mut handler, "delay 0"),
            Err(CommandError::NonPositiveDelay(0))
        );
        assert_eq!(
            run(&mut handler, "delay -3"),
            Err(CommandError::NonPositiveDelay(-3))
        );
        assert_eq!(
            run(&mut handler, "delay soon"),
            Err(CommandError::InvalidInteger(String::from("soon")))
        );
        assert_eq!(run(&mut handler, "delay"), Ok(String::from("42")));
    }

    #[test]
    fn delay_takes_whole_unsigned_range() {
        let mut handler = handler(Recorder::default(), 10);
        assert_eq!(
            run(&mut handler, "delay 18446744073709551615"),
            Ok(String::from("Delay set to 18446744073709551615."))
        );
        assert_eq!(
            run(&mut handler, "delay"),
            Ok(String::from("18446744073709551615"))
        );
        assert_eq!(
            run(&mut handler, "delay 18446744073709551616"),
            Err(CommandError::InvalidInteger(String::from(
                "18446744073709551616"
            )))
        );
    }

    #[test]
    fn pause_and_play() {
        let mut handler = handler(Recorder::default(), 10);
        assert_eq!(run(&mut handler, "play"), Ok(String::from("Already playing.")));
        assert_eq!(run(&mut handler, "pause"), Ok(String::from("Paused.")));
        assert_eq!(run(&mut handler, "pause"), Ok(String::from("Already paused.")));
        assert!(handler.state().is_paused());
        assert_eq!(run(&mut handler, "play"), Ok(String::from("Unpaused.")));
        assert!(!handler.state().is_paused());
    }

    #[test]
    fn directories_and_reload() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("x.jpg"), b"").unwrap();
        let mut handler = handler(Recorder::default(), 10);
        assert!(handler.catalog().is_empty());

        let dir_name = dir.path().display().to_string();
        assert_eq!(
            run(&mut handler, &format!("add_dir {dir_name}")),
            Ok(String::from("Added."))
        );
        assert_eq!(run(&mut handler, "list_dirs"), Ok(dir_name));
        // Adding does not rescan.
        assert_eq!(run(&mut handler, "list_images"), Ok(String::new()));

        assert_eq!(
            run(&mut handler, "reload"),
            Ok(String::from("Reloaded 1 images."))
        );
        assert_eq!(
            run(&mut handler, "list_images"),
            Ok(dir.path().join("x.jpg").display().to_string())
        );
    }

    #[test]
    fn next_and_quit() {
        let mut handler = handler(Recorder::default(), 10);
        run(&mut handler, "set a.png").unwrap();
        assert_ne!(
            handler.state().deadline(Instant::now()),
            Deadline::Overdue
        );
        assert_eq!(run(&mut handler, ""), Ok(String::new()));
        assert_eq!(
            handler.state().deadline(Instant::now()),
            Deadline::Overdue
        );

        assert!(handler.state().is_running());
        assert_eq!(run(&mut handler, "quit"), Ok(String::new()));
        assert!(!handler.state().is_running());
    }

    #[test]
    fn unknown_and_arity() {
        let mut handler = handler(Recorder::default(), 10);
        assert_eq!(
            run(&mut handler, "dance"),
            Err(CommandError::UnknownCommand(String::from("dance")))
        );
        assert!(matches!(
            run(&mut handler, "set"),
            Err(CommandError::WrongArity { name: "set", .. })
        ));
        assert!(matches!(
            run(&mut handler, "pause now"),
            Err(CommandError::WrongArity { name: "pause", .. })
        ));
    }

    #[test]
    fn failures_come_with_help() {
        let mut handler = handler(Recorder::default(), 10);
        let reply = smol::block_on(handler.respond(&Request::new("delay", &["-5"])));
        assert_eq!(
            reply,
            format!(
                "error: delay must be positive, got -5\n{}",
                help_text(Some("delay"))
            )
        );

        let reply = smol::block_on(handler.respond(&Request::new("dance", &[])));
        assert!(reply.starts_with("error: unrecognised command `dance`\nUsage: wallch [<command>"));
    }

    #[test]
    fn rotation_is_bounded() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = Recorder::default();
        for name in ["a.png", "b.png", "c.png"] {
            let path = dir.path().join(name);
            std::fs::write(&path, b"").unwrap();
            backend.failing.insert(path);
        }
        let state = RotationState::new(100, NonZeroUsize::new(10).unwrap());
        let dirs = BTreeSet::from([dir.path().to_path_buf()]);
        let mut handler = Handler::new(backend, dirs, state);

        assert!(!smol::block_on(handler.rotate()));
        let mut applied = handler.backend.applied.borrow().clone();
        applied.sort();
        assert_eq!(applied, handler.catalog().images());
        assert_eq!(handler.state().errors().len(), 3);
    }

    #[test]
    fn rotation_skips_failures() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = Recorder::default();
        for name in ["a.png", "b.png", "c.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
        }
        backend.failing.insert(dir.path().join("a.png"));
        backend.failing.insert(dir.path().join("b.png"));
        let state = RotationState::new(100, NonZeroUsize::new(10).unwrap());
        let dirs = BTreeSet::from([dir.path().to_path_buf()]);
        let mut handler = Handler::new(backend, dirs, state);

        assert!(smol::block_on(handler.rotate()));
        assert_eq!(
            handler.state().history_entry(-1).unwrap(),
            dir.path().join("c.png")
        );
    }

    #[test]
    fn rotation_without_images() {
        let mut handler = handler(Recorder::default(), 10);
        assert!(!smol::block_on(handler.rotate()));
        assert!(handler.backend.applied.borrow().is_empty());
        assert!(matches!(
            handler.state().deadline(Instant::now()),
            Deadline::In(_)
        ));
    }

    #[test]
    fn failed_rotation_waits_full_delay() {
        let dir = tempfile::tempdir().unwrap();
        let mut backend = Recorder::default();
        for name in ["a.png", "b.png"] {
            std::fs::write(dir.path().join(name), b"").unwrap();
            backend.failing.insert(dir.path().join(name));
        }
        let state = RotationState::new(100, NonZeroUsize::new(10).unwrap());
        let dirs = BTreeSet::from([dir.path().to_path_buf()]);
        let mut handler = Handler::new(backend, dirs, state);

        assert!(!smol::block_on(handler.rotate()));
        assert_eq!(handler.backend.applied.borrow().len(), 2);
        assert!(handler.state().history().is_empty());
        assert_eq!(handler.state().errors().len(), 2);
        assert!(matches!(
            handler.state().deadline(Instant::now()),
            Deadline::In(_)
        ));
    }
}
