//! Defines commands the daemon can identify.
//!
//! The registry is a static table, each entry carries what dispatch and `help` need.

use crate::utils::CommandError;

#[derive(Debug, PartialEq, Eq, Clone, Copy)]
pub enum CommandKind {
    AddDir,
    Delay,
    Errors,
    Get,
    Help,
    History,
    ListDirs,
    ListImages,
    Next,
    Pause,
    Play,
    Quit,
    Reload,
    Set,
}

#[derive(Debug)]
pub struct CommandSpec {
    pub name: &'static str,
    pub kind: CommandKind,
    pub usage: &'static str,
    pub description: &'static str,
    pub min_args: usize,
    pub max_args: usize,
}

const fn spec(
    name: &'static str,
    kind: CommandKind,
    usage: &'static str,
    description: &'static str,
    min_args: usize,
    max_args: usize,
) -> CommandSpec {
    CommandSpec {
        name,
        kind,
        usage,
        description,
        min_args,
        max_args,
    }
}

/// Every command, in alphabetical order.
pub const COMMANDS: &[CommandSpec] = &[
    spec(
        "add_dir",
        CommandKind::AddDir,
        "add_dir <directory>",
        "Add a new directory for loading images.",
        1,
        1,
    ),
    spec(
        "delay",
        CommandKind::Delay,
        "delay [<seconds>]",
        "Get or set the delay between changing wallpapers. Must be > 0.",
        0,
        1,
    ),
    spec(
        "errors",
        CommandKind::Errors,
        "errors",
        "A list of any files which errored.",
        0,
        0,
    ),
    spec(
        "get",
        CommandKind::Get,
        "get [<n>]",
        "Get the file for the current image, or nth in history.",
        0,
        1,
    ),
    spec(
        "help",
        CommandKind::Help,
        "help [<command>]",
        "Print this help message, or help on a specific command.",
        0,
        1,
    ),
    spec(
        "history",
        CommandKind::History,
        "history [<max>]",
        "Get a history of background file locations.",
        0,
        1,
    ),
    spec(
        "list_dirs",
        CommandKind::ListDirs,
        "list_dirs",
        "List all directories for loading images.",
        0,
        0,
    ),
    spec(
        "list_images",
        CommandKind::ListImages,
        "list_images",
        "List all known images.",
        0,
        0,
    ),
    spec(
        "next",
        CommandKind::Next,
        "next",
        "Switch to a new random wall. [DEFAULT]",
        0,
        0,
    ),
    spec(
        "pause",
        CommandKind::Pause,
        "pause",
        "Pause, don't switch wall until play is called.",
        0,
        0,
    ),
    spec("play", CommandKind::Play, "play", "Unpause.", 0, 0),
    spec("quit", CommandKind::Quit, "quit", "Shut down the server.", 0, 0),
    spec(
        "reload",
        CommandKind::Reload,
        "reload",
        "Reload images from the specified directories.",
        0,
        0,
    ),
    spec(
        "set",
        CommandKind::Set,
        "set <n/image>",
        "Set image file to current wall, or index in history.",
        1,
        1,
    ),
];

/// Finds the command registered as `name`.
pub fn lookup(name: &str) -> Option<&'static CommandSpec> {
    COMMANDS.iter().find(|spec| spec.name == name)
}

impl CommandSpec {
    /// Checks the number of arguments against what this command takes.
    ///
    /// # Errors
    /// [`CommandError::WrongArity`] when it does not fit.
    pub fn check_arity(&self, got: usize) -> Result<(), CommandError> {
        if (self.min_args..=self.max_args).contains(&got) {
            return Ok(());
        }
        let expected = if self.min_args == self.max_args {
            self.min_args.to_string()
        } else {
            format!("{} to {}", self.min_args, self.max_args)
        };
        Err(CommandError::WrongArity {
            name: self.name,
            expected,
            got,
        })
    }

    /// Two-line usage of this command.
    pub fn usage_text(&self) -> String {
        format!("Usage: wallch {}\n\t{}", self.usage, self.description)
    }
}

/// Help for `name`, or the listing of all commands if `name` is [`None`], `help`, or unknown.
pub fn help_text(name: Option<&str>) -> String {
    if let Some(spec) = name.filter(|name| *name != "help").and_then(lookup) {
        return spec.usage_text();
    }

    let width = COMMANDS
        .iter()
        .map(|spec| spec.usage.len())
        .max()
        .unwrap_or_default();
    let mut lines = vec![String::from("Usage: wallch [<command> [args...]]")];
    lines.extend(
        COMMANDS
            .iter()
            .map(|spec| format!("{:width$}  {}", spec.usage, spec.description)),
    );
    lines.join("\n\t")
}
