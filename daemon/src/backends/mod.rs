//! Programs that can actually put an image on the desktop.

mod feh;
mod swww;

pub use feh::Feh;
pub use swww::Swww;

use smol::process::{Command, Stdio};
use std::collections::HashMap;
use std::path::Path;
use std::process::ExitStatus;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum BackendError {
    #[error("cannot spawn `{program}`: {source}")]
    Spawn {
        program: String,
        source: std::io::Error,
    },
    #[error("`{program}` failed ({status}){detail}")]
    Failed {
        program: String,
        status: ExitStatus,
        detail: String,
    },
}

/// General trait of a backend.
#[allow(async_fn_in_trait)]
pub trait Backend {
    /// Sets `image` as the wallpaper, returning once the program is done.
    async fn apply(&self, image: &Path) -> Result<(), BackendError>;
}

/// Combine 2 [`HashMap`]s, values in `overrides` win.
fn combine(
    base: &HashMap<String, String>,
    overrides: &HashMap<String, String>,
) -> HashMap<String, String> {
    let mut result = base.to_owned();
    for (key, value) in overrides {
        result.insert(key.to_string(), value.to_string());
    }
    result
}

/// Turns properties into command line options, sorted by key.
///
/// `on`/`true` gives a bare `--key`, `off`/`false` drops the option, and anything else is passed
/// as `--key value`.
fn map_properties(properties: &HashMap<String, String>) -> Vec<String> {
    let mut keys: Vec<&String> = properties.keys().collect();
    keys.sort();

    let mut args = Vec::new();
    for key in keys {
        let value = &properties[key];
        match value.as_str() {
            "on" | "true" => args.push(format!("--{key}")),
            "off" | "false" => (),
            _ => {
                args.push(format!("--{key}"));
                args.push(value.to_string());
            }
        }
    }
    args
}

/// Runs the prepared command to completion.
async fn run(program: &str, args: &[String], image: &Path) -> Result<(), BackendError> {
    let output = Command::new(program)
        .args(args)
        .arg(image)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .output()
        .await
        .map_err(|source| BackendError::Spawn {
            program: program.to_string(),
            source,
        })?;

    if output.status.success() {
        return Ok(());
    }
    let stderr = String::from_utf8_lossy(&output.stderr);
    let stderr = stderr.trim();
    Err(BackendError::Failed {
        program: program.to_string(),
        status: output.status,
        detail: if stderr.is_empty() {
            String::new()
        } else {
            format!(": {stderr}")
        },
    })
}
