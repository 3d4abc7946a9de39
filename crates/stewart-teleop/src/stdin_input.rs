//! Line input from stdin
//!
//! A reader thread forwards stdin lines over a channel so the control
//! thread never blocks on the terminal. In teleop mode each line is one
//! [`InputSnapshot`], e.g.
//! `{"buttons": [false, false, false, false, false, false, false, true], "axes": [0, -0.8]}`.
//!
//! While stdin is live the newest line describes the device until the next
//! one arrives. Once stdin closes (a piped file), lines still buffered are
//! replayed one per poll, then input goes neutral.

use std::collections::VecDeque;
use std::io::{self, BufRead};
use std::thread;

use crossbeam_channel::{self as cc, TryRecvError};
use stewart_core::{InputSnapshot, InputSource, Result};

/// Start a thread that forwards stdin lines
pub fn spawn_line_reader() -> io::Result<cc::Receiver<String>> {
    let (tx, rx) = cc::unbounded();
    thread::Builder::new()
        .name("stdin-reader".into())
        .spawn(move || forward_lines(io::stdin().lock(), &tx))?;
    Ok(rx)
}

/// Send each non-empty line until the reader ends or the receiver is gone
fn forward_lines(reader: impl BufRead, tx: &cc::Sender<String>) {
    for line in reader.lines() {
        let line = match line {
            Ok(line) => line,
            Err(e) => {
                tracing::warn!("stdin read failed: {}", e);
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }
        if tx.send(line).is_err() {
            break;
        }
    }
}

/// Input snapshots parsed from JSON lines
pub struct StdinInput {
    rx: cc::Receiver<String>,
    backlog: VecDeque<InputSnapshot>,
    current: InputSnapshot,
    closed: bool,
    line_number: usize,
}

impl StdinInput {
    /// Read snapshots from the process's stdin
    pub fn spawn() -> io::Result<Self> {
        spawn_line_reader().map(Self::from_lines)
    }

    fn from_lines(rx: cc::Receiver<String>) -> Self {
        Self {
            rx,
            backlog: VecDeque::new(),
            current: InputSnapshot::neutral(),
            closed: false,
            line_number: 0,
        }
    }

    fn parse(&mut self, line: &str) -> Option<InputSnapshot> {
        self.line_number += 1;
        match serde_json::from_str(line) {
            Ok(snapshot) => Some(snapshot),
            Err(e) => {
                tracing::warn!("Ignoring malformed input line {}: {}", self.line_number, e);
                None
            }
        }
    }

    fn receive(&mut self) {
        loop {
            match self.rx.try_recv() {
                Ok(line) => {
                    if let Some(snapshot) = self.parse(&line) {
                        self.backlog.push_back(snapshot);
                    }
                }
                Err(TryRecvError::Empty) => return,
                Err(TryRecvError::Disconnected) => {
                    tracing::info!(
                        "stdin closed, replaying {} buffered snapshots",
                        self.backlog.len()
                    );
                    self.closed = true;
                    return;
                }
            }
        }
    }
}

impl InputSource for StdinInput {
    fn name(&self) -> &str {
        "stdin"
    }

    fn poll(&mut self) -> Result<InputSnapshot> {
        if !self.closed {
            self.receive();
        }

        if self.closed {
            self.current = self.backlog.pop_front().unwrap_or_default();
        } else if let Some(latest) = self.backlog.pop_back() {
            self.current = latest;
            self.backlog.clear();
        }
        Ok(self.current.clone())
    }
}
