use dbscript_core::{Error, Result};

use parking_lot::Mutex;
use std::{fmt, io::Write, ops::Range, sync::Arc};
use tracing::warn;

/// Destination for script output.
pub trait OutputSink: Send + Sync {
    fn write_str(&self, text: &str) -> Result<()>;
}

/// Text shared between the console's foreground and the evaluation running
/// in the background.
///
/// Every read-modify-write happens under the one lock owned by the buffer;
/// the foreground uses [`with_lock`](Self::with_lock), the background only
/// appends. Cloning yields another handle onto the same buffer.
#[derive(Clone, Default)]
pub struct ConsoleBuffer {
    shared: Arc<Mutex<ConsoleState>>,
}

#[derive(Default)]
struct ConsoleState {
    text: String,

    /// Byte ranges of completed evaluations' output, oldest first
    regions: Vec<Range<usize>>,

    /// Mirror of every append, e.g. the terminal a CLI runs in
    echo: Option<Box<dyn Write + Send>>,
}

impl ConsoleBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    /// A buffer that also writes every append to `writer`.
    pub fn with_echo(writer: impl Write + Send + 'static) -> Self {
        let buffer = Self::new();
        buffer.shared.lock().echo = Some(Box::new(writer));
        buffer
    }

    /// Appends `text`. A failing echo writer is dropped and reported once;
    /// the buffered text is always updated.
    pub fn append(&self, text: &str) {
        self.shared.lock().push(text);
    }

    /// Appends a newline unless the text is empty or already ends with one.
    pub fn finish_line(&self) {
        self.shared.lock().finish_line();
    }

    /// Writes `line` on a line of its own, in a single locked step.
    pub fn append_line(&self, line: &str) {
        let mut state = self.shared.lock();
        state.finish_line();
        state.push(line);
        state.push("\n");
    }

    pub fn text(&self) -> String {
        self.shared.lock().text.clone()
    }

    pub fn len(&self) -> usize {
        self.shared.lock().text.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Runs a foreground edit of the text under the buffer's lock.
    ///
    /// Output regions reaching past the edited text's end are dropped.
    pub fn with_lock<R>(&self, f: impl FnOnce(&mut String) -> R) -> R {
        let mut state = self.shared.lock();
        let ret = f(&mut state.text);
        let len = state.text.len();
        state.regions.retain(|region| region.end <= len);
        ret
    }

    pub fn clear(&self) {
        self.with_lock(String::clear);
    }

    /// Starts delimiting one evaluation's output. Returns the start offset
    /// to hand back to [`end_output`](Self::end_output).
    pub fn begin_output(&self) -> usize {
        self.shared.lock().text.len()
    }

    /// Closes the output region opened at `start`.
    pub fn end_output(&self, start: usize) {
        let mut state = self.shared.lock();
        let end = state.text.len();
        if start <= end {
            state.regions.push(start..end);
        }
    }

    pub fn output_regions(&self) -> Vec<Range<usize>> {
        self.shared.lock().regions.clone()
    }

    /// Text of the most recent completed evaluation's output.
    pub fn last_output(&self) -> Option<String> {
        let state = self.shared.lock();
        let region = state.regions.last()?;
        state.text.get(region.clone()).map(str::to_string)
    }
}

impl ConsoleState {
    fn finish_line(&mut self) {
        if !self.text.is_empty() && !self.text.ends_with('\n') {
            self.push("\n");
        }
    }

    fn push(&mut self, text: &str) {
        self.text.push_str(text);

        if let Some(echo) = self.echo.as_mut() {
            let res = echo.write_all(text.as_bytes()).and_then(|_| echo.flush());
            if let Err(err) = res {
                warn!(error = %Error::console_io(err), "console echo disabled");
                self.echo = None;
            }
        }
    }
}

impl OutputSink for ConsoleBuffer {
    fn write_str(&self, text: &str) -> Result<()> {
        self.append(text);
        Ok(())
    }
}

/// Unbuffered writers, such as a terminal, surface failures to the script.
impl<W: Write + Send> OutputSink for Mutex<W> {
    fn write_str(&self, text: &str) -> Result<()> {
        let mut writer = self.lock();
        writer
            .write_all(text.as_bytes())
            .and_then(|_| writer.flush())
            .map_err(Error::console_io)
    }
}

impl fmt::Debug for ConsoleBuffer {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.shared.lock();
        f.debug_struct("ConsoleBuffer")
            .field("len", &state.text.len())
            .field("regions", &state.regions)
            .field("echo", &state.echo.is_some())
            .finish()
    }
}
