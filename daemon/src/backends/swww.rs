//! Sets wallpapers with `swww img`, for Wayland sessions.

use std::collections::HashMap;
use std::path::Path;

use crate::backends::{Backend, BackendError, map_properties, run};

pub struct Swww {
    program: String,
    properties: HashMap<String, String>,
}

impl Backend for Swww {
    async fn apply(&self, image: &Path) -> Result<(), BackendError> {
        run(&self.program, &self.args(), image).await
    }
}

impl Swww {
    pub fn new(program: Option<String>, properties: HashMap<String, String>) -> Self {
        Self {
            program: program.unwrap_or_else(|| String::from("swww")),
            properties,
        }
    }

    fn args(&self) -> Vec<String> {
        let mut args = vec![String::from("img")];
        args.extend(map_properties(&self.properties));
        args
    }
}
