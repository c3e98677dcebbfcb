//! Driving `pdb` in a child interpreter.
//!
//! pdb prints its `(Pdb) ` prompt without a trailing newline, so output is
//! read in raw chunks rather than lines: complete lines are forwarded as
//! they appear and a dangling prompt becomes a [`DebugOutput::Prompt`].

use std::io::{Read, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, Stdio};
use std::sync::mpsc::{self, Receiver, RecvTimeoutError, Sender};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::error::{PyportError, Result};
use crate::shell::{CommandOptions, ProcessCommand};

const PROMPT: &[u8] = b"(Pdb) ";

/// Something the debugger printed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DebugOutput {
    Stdout(String),
    Stderr(String),
    /// pdb is waiting for a command.
    Prompt,
    /// The debugged program's output stream closed.
    Exited,
}

/// Output collected by [`DebugSession::read_until_prompt`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Transcript {
    pub output: Vec<DebugOutput>,
    /// pdb is waiting for input.
    pub prompted: bool,
    /// The process closed its output; no more prompts will come.
    pub finished: bool,
}

/// Splits a byte stream into lines and prompts.
#[derive(Debug, Default)]
pub struct OutputSplitter {
    pending: Vec<u8>,
}

impl OutputSplitter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed a chunk; returns the lines and prompts it completed.
    pub fn push(&mut self, chunk: &[u8]) -> Vec<DebugOutput> {
        self.pending.extend_from_slice(chunk);
        let mut out = Vec::new();

        while let Some(pos) = self.pending.iter().position(|&b| b == b'\n') {
            let line: Vec<u8> = self.pending.drain(..=pos).collect();
            out.push(DebugOutput::Stdout(decode_line(&line)));
        }

        if self.pending.ends_with(PROMPT) {
            let text_len = self.pending.len() - PROMPT.len();
            if text_len > 0 {
                out.push(DebugOutput::Stdout(decode_line(&self.pending[..text_len])));
            }
            self.pending.clear();
            out.push(DebugOutput::Prompt);
        }
        out
    }

    /// Whatever is left when the stream ends.
    pub fn finish(&mut self) -> Option<DebugOutput> {
        if self.pending.is_empty() {
            return None;
        }
        let rest = std::mem::take(&mut self.pending);
        Some(DebugOutput::Stdout(decode_line(&rest)))
    }
}

fn decode_line(bytes: &[u8]) -> String {
    String::from_utf8_lossy(bytes)
        .trim_end_matches(['\n', '\r'])
        .to_string()
}

/// A running `python -m pdb <script>`.
pub struct DebugSession {
    child: Child,
    stdin: Option<ChildStdin>,
    rx: Receiver<DebugOutput>,
    readers: Vec<JoinHandle<()>>,
    finished: bool,
}

impl DebugSession {
    /// `<interpreter> -m pdb <script>`.
    pub fn command(interpreter: &Path, script: &Path) -> ProcessCommand {
        ProcessCommand::new(interpreter)
            .args(["-m", "pdb"])
            .arg(script.as_os_str())
    }

    /// Start pdb on `script`, from the script's folder.
    pub fn start(interpreter: &Path, script: &Path) -> Result<Self> {
        let cmd = Self::command(interpreter, script);
        let mut options = CommandOptions {
            cwd: script
                .parent()
                .filter(|p| !p.as_os_str().is_empty())
                .map(PathBuf::from),
            ..Default::default()
        };
        options
            .env
            .insert("PYTHONUNBUFFERED".to_string(), "1".to_string());

        let mut child = cmd
            .to_command(&options)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|e| {
                tracing::debug!("Failed to start {}: {}", cmd.display(), e);
                PyportError::CommandFailed {
                    command: cmd.display(),
                    code: None,
                }
            })?;
        tracing::info!("Debugging {}", script.display());

        let stdin = child.stdin.take();
        let (tx, rx) = mpsc::channel();
        let mut readers = Vec::new();

        if let Some(stdout) = child.stdout.take() {
            let tx = tx.clone();
            readers.push(thread::spawn(move || read_stdout(stdout, tx)));
        }
        if let Some(stderr) = child.stderr.take() {
            let tx = tx.clone();
            readers.push(thread::spawn(move || read_stderr(stderr, tx)));
        }

        Ok(Self {
            child,
            stdin,
            rx,
            readers,
            finished: false,
        })
    }

    /// Send one command line to pdb.
    pub fn send(&mut self, command: &str) -> Result<()> {
        let stdin = self.stdin.as_mut().ok_or_else(|| {
            PyportError::Other(anyhow::anyhow!("debugger input is closed"))
        })?;
        tracing::debug!("pdb <- {}", command);
        stdin.write_all(command.as_bytes())?;
        stdin.write_all(b"\n")?;
        stdin.flush()?;
        Ok(())
    }

    /// Collect output until pdb prompts, the program ends, or `timeout`
    /// passes.
    pub fn read_until_prompt(&mut self, timeout: Duration) -> Transcript {
        let deadline = Instant::now() + timeout;
        let mut transcript = Transcript {
            finished: self.finished,
            ..Transcript::default()
        };
        if self.finished {
            return transcript;
        }

        loop {
            let remaining = deadline.saturating_duration_since(Instant::now());
            match self.rx.recv_timeout(remaining) {
                Ok(DebugOutput::Prompt) => {
                    transcript.prompted = true;
                    break;
                }
                Ok(DebugOutput::Exited) | Err(RecvTimeoutError::Disconnected) => {
                    self.finished = true;
                    transcript.finished = true;
                    // Drain stderr that raced the close.
                    transcript.output.extend(
                        self.rx
                            .try_iter()
                            .filter(|o| matches!(o, DebugOutput::Stderr(_))),
                    );
                    break;
                }
                Ok(output) => transcript.output.push(output),
                Err(RecvTimeoutError::Timeout) => break,
            }
        }
        transcript
    }

    /// Kill pdb and the program under it.
    pub fn terminate(mut self) -> Result<Option<i32>> {
        self.stdin.take();
        // Fails only if the process already exited.
        let _ = self.child.kill();
        self.reap()
    }

    /// Close pdb's input and wait for it to exit.
    pub fn wait(mut self) -> Result<Option<i32>> {
        self.stdin.take();
        self.reap()
    }

    fn reap(&mut self) -> Result<Option<i32>> {
        let status = self.child.wait()?;
        for reader in self.readers.drain(..) {
            let _ = reader.join();
        }
        tracing::debug!("pdb exited with {:?}", status.code());
        Ok(status.code())
    }
}

fn read_stdout(mut stdout: impl Read, tx: Sender<DebugOutput>) {
    let mut splitter = OutputSplitter::new();
    let mut buf = [0u8; 4096];
    loop {
        match stdout.read(&mut buf) {
            Ok(0) | Err(_) => break,
            Ok(n) => {
                for output in splitter.push(&buf[..n]) {
                    if tx.send(output).is_err() {
                        return;
                    }
                }
            }
        }
    }
    if let Some(rest) = splitter.finish() {
        let _ = tx.send(rest);
    }
    let _ = tx.send(DebugOutput::Exited);
}

fn read_stderr(stderr: impl Read, tx: Sender<DebugOutput>) {
    use std::io::BufRead;
    for line in std::io::BufReader::new(stderr)
        .lines()
        .map_while(std::result::Result::ok)
    {
        if tx.send(DebugOutput::Stderr(line)).is_err() {
            return;
        }
    }
}
