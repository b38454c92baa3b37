//! Line input shared by the prompt and the human intervention tool
//!
//! Every reader of the terminal goes through one `InputLines`. A read that
//! is cancelled (the tool timed out, the session moved on) leaves whatever
//! was typed buffered for the next reader instead of losing it.

use std::io;
use std::sync::Arc;

use tokio::io::{AsyncBufRead, AsyncBufReadExt, BufReader, Lines, Stdin};
use tokio::sync::Mutex;

/// Async line source behind a lock
pub struct InputLines<R> {
    lines: Mutex<Lines<R>>,
}

/// The process's standard input, shared between its readers
pub type SharedStdin = Arc<InputLines<BufReader<Stdin>>>;

impl InputLines<BufReader<Stdin>> {
    pub fn stdin() -> SharedStdin {
        Arc::new(Self::new(BufReader::new(tokio::io::stdin())))
    }
}

impl<R: AsyncBufRead + Unpin + Send> InputLines<R> {
    pub fn new(reader: R) -> Self {
        Self {
            lines: Mutex::new(reader.lines()),
        }
    }

    /// Next line without its terminator, `None` at end of input
    ///
    /// Cancel safe: dropping the future never consumes a line.
    pub async fn next_line(&self) -> io::Result<Option<String>> {
        let mut lines = self.lines.lock().await;
        let line = lines.next_line().await?;
        Ok(line.map(|l| l.trim_end_matches('\r').to_string()))
    }
}
