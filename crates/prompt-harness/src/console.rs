//! Duplex console channels.
//!
//! A console has two ends: the driver end, read and written by the session
//! driver, and the [`Tty`] end, handed to whatever issues prompts. The
//! in-memory pair built by [`console_pair`] stands in for a pseudo-terminal.

use std::io;
use std::sync::Arc;

use tokio::io::{
    AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, DuplexStream, ReadHalf,
    WriteHalf,
};
use tokio::sync::Mutex;

use crate::protocol;

/// The driver end of a duplex console.
///
/// Any async byte stream qualifies; the driver is its only reader and writer.
pub trait Console: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

impl<T> Console for T where T: AsyncRead + AsyncWrite + Unpin + Send + 'static {}

/// Create a connected in-memory console.
///
/// Returns the driver end and the prompt-side [`Tty`].
#[must_use]
pub fn console_pair(capacity: usize) -> (DuplexStream, Tty) {
    let (driver, tty) = tokio::io::duplex(capacity);
    (driver, Tty::new(tty))
}

/// A unit of input read by the prompt side.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Input {
    /// A line of text without its terminator.
    Line(String),
    /// Ctrl+C was typed.
    Interrupt,
    /// The other end closed.
    Eof,
}

/// The prompt-side end of a console.
///
/// Cheap to clone; clones share the same stream. Reads and writes are
/// serialized independently.
#[derive(Debug, Clone)]
pub struct Tty {
    reader: Arc<Mutex<BufReader<ReadHalf<DuplexStream>>>>,
    writer: Arc<Mutex<WriteHalf<DuplexStream>>>,
}

impl Tty {
    fn new(stream: DuplexStream) -> Self {
        let (reader, writer) = tokio::io::split(stream);
        Self {
            reader: Arc::new(Mutex::new(BufReader::new(reader))),
            writer: Arc::new(Mutex::new(writer)),
        }
    }

    /// Write raw bytes.
    pub async fn write(&self, data: &[u8]) -> io::Result<()> {
        let mut writer = self.writer.lock().await;
        writer.write_all(data).await?;
        writer.flush().await
    }

    /// Write a string.
    pub async fn write_str(&self, s: &str) -> io::Result<()> {
        self.write(s.as_bytes()).await
    }

    /// Read the next line or interrupt.
    ///
    /// Carriage returns are stripped. An interrupt byte ends the read
    /// immediately and discards the partial line.
    pub async fn read_input(&self) -> io::Result<Input> {
        let mut reader = self.reader.lock().await;
        let mut line = Vec::new();

        loop {
            let available = reader.fill_buf().await?;
            if available.is_empty() {
                return Ok(if line.is_empty() {
                    Input::Eof
                } else {
                    Input::Line(decode_line(&line))
                });
            }

            let stop = available
                .iter()
                .position(|b| *b == b'\n' || *b == protocol::INTERRUPT);

            match stop {
                Some(at) => {
                    let interrupted = available[at] == protocol::INTERRUPT;
                    line.extend_from_slice(&available[..at]);
                    reader.consume(at + 1);
                    if interrupted {
                        return Ok(Input::Interrupt);
                    }
                    return Ok(Input::Line(decode_line(&line)));
                }
                None => {
                    let len = available.len();
                    line.extend_from_slice(available);
                    reader.consume(len);
                }
            }
        }
    }

    /// Shut down the write side, signalling EOF to the driver.
    pub async fn close(&self) -> io::Result<()> {
        self.writer.lock().await.shutdown().await
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes).trim_end_matches('\r').to_string()
}
