//! Sets wallpapers with `feh --bg-*`.

use std::collections::HashMap;
use std::path::Path;

use crate::backends::{Backend, BackendError, combine, map_properties, run};

pub struct Feh {
    program: String,
    bg_type: String,
    properties: HashMap<String, String>,
}

impl Backend for Feh {
    async fn apply(&self, image: &Path) -> Result<(), BackendError> {
        run(&self.program, &self.args(), image).await
    }
}

impl Feh {
    /// `bg_type` picks the `--bg-<type>` placement mode, `overrides` are merged over the
    /// defaults of a black border and no menu.
    pub fn new(
        program: Option<String>,
        bg_type: &str,
        overrides: &HashMap<String, String>,
    ) -> Self {
        let mut defaults = HashMap::new();
        defaults.insert(String::from("image-bg"), String::from("black"));
        defaults.insert(String::from("no-menu"), String::from("on"));

        Self {
            program: program.unwrap_or_else(|| String::from("feh")),
            bg_type: bg_type.to_string(),
            properties: combine(&defaults, overrides),
        }
    }

    /// Everything passed to `feh` before the image path.
    fn args(&self) -> Vec<String> {
        let mut args = vec![format!("--bg-{}", self.bg_type)];
        args.extend(map_properties(&self.properties));
        args
    }
}
