//! Job log processing.
//!
//! Raw job output is full of terminal control sequences: colours, carriage
//! return progress bars, cursor movement and Buildkite timestamp markers.
//! Processing renders it through a virtual terminal into HTML, then strips
//! timestamps and markup line by line so only the text a human would have
//! seen remains.
//!
//! ```ignore
//! use buildkite_output::joblogs::LogProcessor;
//!
//! let text = LogProcessor::new().process("50%\r100%\n")?;
//! assert_eq!(text, "100%\n");
//! ```

mod extract;
mod screen;

use std::sync::LazyLock;

use buildkite_core::JobLog;
use regex::Regex;
use thiserror::Error;
use tracing::debug;

pub use extract::{html_to_text, ExtractError};
pub use screen::{
    Screen, ScreenConfig, ScreenRenderer, DEFAULT_MAX_CELLS, DEFAULT_MAX_COLUMNS, DEFAULT_MAX_LINES,
};

static TIME_TAG: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"<time[^>]*>.*?</time>").expect("invalid time tag regex"));

/// Errors from [`LogProcessor::process`].
#[derive(Error, Debug)]
pub enum ProcessError {
    #[error("failed to create terminal screen: {0}")]
    TerminalInit(String),

    #[error("failed to write to terminal screen: {0}")]
    TerminalWrite(String),

    #[error("failed to extract plain text from line {line}: {source}")]
    Extract {
        line: usize,
        #[source]
        source: ExtractError,
    },
}

/// Turns raw terminal output into newline-separated HTML, one element per
/// rendered line.
pub trait TerminalRenderer {
    fn render(&self, raw: &[u8]) -> Result<String, ProcessError>;
}

/// Converts raw job logs into plain text.
#[derive(Debug, Clone, Default)]
pub struct LogProcessor<R: TerminalRenderer = ScreenRenderer> {
    renderer: R,
}

impl LogProcessor {
    pub fn new() -> Self {
        Self::default()
    }
}

impl<R: TerminalRenderer> LogProcessor<R> {
    pub fn with_renderer(renderer: R) -> Self {
        Self { renderer }
    }

    /// Render `raw` and reduce every line to plain text.
    ///
    /// Each output line ends with `\n`; empty input produces an empty string.
    pub fn process(&self, raw: &str) -> Result<String, ProcessError> {
        let html = self.renderer.render(raw.as_bytes())?;

        let mut text = String::with_capacity(html.len());
        for (index, line) in html.lines().enumerate() {
            let line = TIME_TAG.replace_all(line, "");
            let plain = html_to_text(&line).map_err(|source| ProcessError::Extract {
                line: index + 1,
                source,
            })?;
            text.push_str(&plain);
            text.push('\n');
        }

        debug!(raw_bytes = raw.len(), text_bytes = text.len(), "Processed job log");
        Ok(text)
    }
}

/// Process a fetched job log with the default renderer.
pub fn process(log: &JobLog) -> Result<String, ProcessError> {
    LogProcessor::new().process(&log.content)
}
