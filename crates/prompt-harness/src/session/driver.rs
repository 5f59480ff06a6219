//! The background loop that satisfies queued expectations.

use std::time::Duration;

use tokio::io::{AsyncReadExt, AsyncWriteExt};

use super::Session;
use crate::console::Console;
use crate::error::{HarnessError, Result};
use crate::expectation::Action;

/// Size of a single console read.
const READ_CHUNK: usize = 4096;

/// Drives one console on behalf of a [`Session`].
///
/// The driver owns the console end, buffers everything it reads and answers
/// prompts as the front expectation of the queue dictates.
#[derive(Debug)]
pub struct Driver<C> {
    session: Session,
    console: C,
    /// Decoded output not yet consumed by a match.
    buffer: String,
    /// Trailing bytes of an incomplete UTF-8 sequence.
    undecoded: Vec<u8>,
    /// Whether `buffer` starts at the beginning of a line.
    at_line_start: bool,
    eof: bool,
    poll_interval: Duration,
}

impl<C: Console> Driver<C> {
    pub(super) const fn new(session: Session, console: C, poll_interval: Duration) -> Self {
        Self {
            session,
            console,
            buffer: String::new(),
            undecoded: Vec::new(),
            at_line_start: true,
            eof: false,
            poll_interval,
        }
    }

    /// Satisfy expectations until the session gate closes.
    ///
    /// Returns `Ok(())` once the gate is closed, whatever is left in the
    /// queue. Any failure other than "nothing to do" ends the loop.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::UnexpectedPrompt`] when the live prompt cannot
    /// be the expected one, or an I/O error from the console.
    pub async fn run(mut self) -> Result<()> {
        let scenario = self.session.scenario().name().to_string();
        tracing::debug!(%scenario, "session driver started");

        loop {
            if self.session.is_closed() {
                tracing::debug!(%scenario, "session driver stopped");
                return Ok(());
            }

            let step = match self.expect_once().await {
                Err(err) if err.is_nothing_to_do() => self.wait().await,
                other => other,
            };

            if let Err(err) = step {
                tracing::error!(%scenario, error = %err, "session driver aborted");
                return Err(err);
            }
        }
    }

    /// Make one step of progress on the front expectation.
    ///
    /// # Errors
    ///
    /// Returns [`HarnessError::NothingToDo`] when the queue is empty or the
    /// buffered output does not allow progress yet. An empty queue also
    /// drops every terminated line from the buffer.
    pub async fn expect_once(&mut self) -> Result<()> {
        let next = {
            let queue = self.session.lock_queue();
            queue.front().map(|front| {
                match front.next_action(&self.buffer, self.at_line_start) {
                    (Action::Unexpected(actual), _) => {
                        Err(HarnessError::unexpected_prompt(front.summary(), actual))
                    }
                    next => Ok(next),
                }
            })
        };

        let Some(next) = next else {
            self.discard_history();
            return Err(HarnessError::NothingToDo);
        };
        let (action, consumed) = next?;

        match action {
            Action::Wait | Action::Unexpected(_) => Err(HarnessError::NothingToDo),
            Action::Send { input, next } => {
                self.consume(consumed);
                self.write(&input).await?;
                self.session.advance_front(next);
                Ok(())
            }
            Action::Advance(next) => {
                self.consume(consumed);
                self.session.advance_front(next);
                Ok(())
            }
            Action::Complete(input) => {
                self.consume(consumed);
                if let Some(input) = input {
                    self.write(&input).await?;
                }
                self.session.satisfy_front();
                Ok(())
            }
        }
    }

    /// Block until output arrives, an expectation is queued, the gate closes
    /// or the poll interval elapses.
    async fn wait(&mut self) -> Result<()> {
        let mut chunk = [0u8; READ_CHUNK];

        let read = tokio::select! {
            () = self.session.gate().closed() => None,
            () = self.session.queued() => None,
            () = tokio::time::sleep(self.poll_interval) => None,
            result = self.console.read(&mut chunk), if !self.eof => Some(result),
        };

        match read {
            None => Ok(()),
            Some(Ok(0)) => {
                tracing::debug!(
                    scenario = %self.session.scenario().name(),
                    "console reached end of file"
                );
                self.eof = true;
                Ok(())
            }
            Some(Ok(n)) => {
                self.append(&chunk[..n]);
                Ok(())
            }
            Some(Err(e)) => Err(HarnessError::io_context("reading from console", e)),
        }
    }

    fn append(&mut self, data: &[u8]) {
        self.undecoded.extend_from_slice(data);

        loop {
            match std::str::from_utf8(&self.undecoded) {
                Ok(text) => {
                    self.buffer.push_str(text);
                    self.undecoded.clear();
                    return;
                }
                Err(err) => {
                    let valid = err.valid_up_to();
                    self.buffer
                        .push_str(&String::from_utf8_lossy(&self.undecoded[..valid]));

                    match err.error_len() {
                        Some(invalid) => {
                            self.buffer.push(char::REPLACEMENT_CHARACTER);
                            self.undecoded.drain(..valid + invalid);
                        }
                        None => {
                            self.undecoded.drain(..valid);
                            return;
                        }
                    }
                }
            }
        }
    }

    fn consume(&mut self, n: usize) {
        if n == 0 {
            return;
        }
        self.at_line_start = self.buffer[..n].ends_with(['\n', '\r']);
        self.buffer.drain(..n);
    }

    fn discard_history(&mut self) {
        if let Some(at) = self.buffer.rfind(['\n', '\r']) {
            self.consume(at + 1);
        }
    }

    async fn write(&mut self, input: &[u8]) -> Result<()> {
        HarnessError::with_io_context(self.console.write_all(input).await, "writing to console")?;
        HarnessError::with_io_context(self.console.flush().await, "flushing console")
    }
}
