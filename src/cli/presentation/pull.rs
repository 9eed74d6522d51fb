//! Pull progress rendering.
//!
//! The engine reports progress per layer. Consecutive records for the same layer replace
//! the previously printed line instead of stacking up.

use crate::engine::PullProgress;
use std::io::{self, Write};

const CURSOR_UP_ONE: &str = "\x1b[1A";
const ERASE_LINE: &str = "\x1b[2K";

#[derive(Debug, Default)]
pub struct PullRenderer {
    previous_layer: Option<String>,
    errors: Vec<String>,
}

impl PullRenderer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn render(
        &mut self,
        out: &mut dyn Write,
        err: &mut dyn Write,
        record: &PullProgress,
    ) -> io::Result<()> {
        let layer = record.id.as_deref().unwrap_or("");
        if !layer.is_empty() && self.previous_layer.as_deref() == Some(layer) {
            writeln!(out, "{}{}{}", CURSOR_UP_ONE, ERASE_LINE, CURSOR_UP_ONE)?;
        }

        if let Some(status) = &record.status {
            let line = [Some(status.as_str()), Some(layer), record.progress.as_deref()]
                .into_iter()
                .flatten()
                .filter(|part| !part.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            writeln!(out, "{}", line)?;
            self.previous_layer = Some(layer.to_string());
        } else if let Some(error) = &record.error {
            writeln!(err, "Error while pulling: {}", error)?;
            self.errors.push(error.clone());
            self.previous_layer = None;
        } else {
            let raw = serde_json::to_string(record).map_err(io::Error::other)?;
            writeln!(out, "{}", raw)?;
            self.previous_layer = None;
        }
        out.flush()
    }

    /// Errors the engine reported in the stream so far.
    pub fn errors(&self) -> &[String] {
        &self.errors
    }
}
