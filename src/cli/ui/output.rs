use console::style;
use serde::Serialize;

use crate::types::{Result, SrsError};

pub struct Output;

impl Output {
    pub fn new() -> Self {
        Self
    }

    pub fn success(&self, message: &str) {
        eprintln!("{} {}", style("✓").green(), message);
    }

    pub fn error(&self, message: &str) {
        eprintln!("{} {}", style("✗").red(), message);
    }

    pub fn warning(&self, message: &str) {
        eprintln!("{} {}", style("⚠").yellow(), message);
    }

    pub fn info(&self, message: &str) {
        eprintln!("{} {}", style("ℹ").blue(), message);
    }

    /// Pretty JSON on stdout, decorations stay on stderr
    pub fn json<T: Serialize>(&self, value: &T) -> Result<()> {
        println!("{}", serde_json::to_string_pretty(value)?);
        Ok(())
    }

    /// Report a terminal error with its category
    pub fn failure(&self, err: &SrsError) {
        if err.is_busy() {
            self.warning(&err.user_message());
        } else {
            self.error(&format!("[{}] {}", err.category(), err.user_message()));
        }
    }
}

impl Default for Output {
    fn default() -> Self {
        Self::new()
    }
}
