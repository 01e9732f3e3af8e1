use std::io::{Read, Write};
use std::path::PathBuf;

use portable_pty::{native_pty_system, ChildKiller, CommandBuilder, MasterPty, PtySize};

use super::protocol::Dimensions;
use super::TerminalError;

const READ_BUFFER: usize = 4096;

/// Everything a shell process reports back, in order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProcessEvent {
    Output(String),
    /// Always the last event for a process
    Exited { code: u32 },
}

#[derive(Debug, Clone)]
pub struct SpawnRequest {
    pub shell: String,
    pub cwd: PathBuf,
    pub dims: Dimensions,
}

/// A running shell owned by exactly one session
pub trait ShellProcess: Send {
    fn write(&mut self, data: &[u8]) -> Result<(), TerminalError>;
    fn resize(&self, dims: Dimensions) -> Result<(), TerminalError>;
    /// Terminate immediately. Safe to call more than once.
    fn kill(&mut self);
}

/// Starts shells. Blocking; call it off the async runtime.
pub trait ShellSpawner: Send + Sync + 'static {
    fn spawn(
        &self,
        request: SpawnRequest,
        events: flume::Sender<ProcessEvent>,
    ) -> Result<Box<dyn ShellProcess>, TerminalError>;
}

/// Shell used when none is configured
pub fn default_shell() -> String {
    if cfg!(windows) {
        "powershell.exe".to_string()
    } else {
        std::env::var("SHELL").unwrap_or_else(|_| "bash".to_string())
    }
}

/// Spawns shells on the host's native pseudo terminal
#[derive(Debug, Default, Clone, Copy)]
pub struct PtySpawner;

impl ShellSpawner for PtySpawner {
    fn spawn(
        &self,
        request: SpawnRequest,
        events: flume::Sender<ProcessEvent>,
    ) -> Result<Box<dyn ShellProcess>, TerminalError> {
        let pair = native_pty_system()
            .openpty(pty_size(request.dims))
            .map_err(|e| TerminalError::Spawn(e.to_string()))?;

        let mut cmd = CommandBuilder::new(&request.shell);
        cmd.cwd(&request.cwd);
        cmd.env("TERM", "xterm-256color");

        let mut child = pair
            .slave
            .spawn_command(cmd)
            .map_err(|e| TerminalError::Spawn(e.to_string()))?;
        // Only the child may hold the slave end, otherwise the reader never
        // sees EOF.
        drop(pair.slave);

        let reader = pair
            .master
            .try_clone_reader()
            .map_err(|e| TerminalError::Spawn(e.to_string()))?;
        let writer = pair
            .master
            .take_writer()
            .map_err(|e| TerminalError::Spawn(e.to_string()))?;
        let killer = child.clone_killer();
        let pid = child.process_id();

        std::thread::Builder::new()
            .name("pty-reader".into())
            .spawn(move || {
                pump_output(reader, &events);
                let code = match child.wait() {
                    Ok(status) => status.exit_code(),
                    Err(e) => {
                        tracing::warn!(error = %e, "failed to reap shell");
                        1
                    }
                };
                let _ = events.send(ProcessEvent::Exited { code });
            })
            .map_err(TerminalError::Io)?;

        tracing::info!(?pid, shell = %request.shell, cwd = %request.cwd.display(), "spawned shell");

        Ok(Box::new(PtyProcess {
            master: pair.master,
            writer,
            killer,
            killed: false,
        }))
    }
}

fn pty_size(dims: Dimensions) -> PtySize {
    PtySize {
        rows: dims.rows,
        cols: dims.cols,
        pixel_width: 0,
        pixel_height: 0,
    }
}

fn pump_output(mut reader: Box<dyn Read + Send>, events: &flume::Sender<ProcessEvent>) {
    let mut buf = [0u8; READ_BUFFER];
    let mut pending = Vec::new();
    loop {
        match reader.read(&mut buf) {
            Ok(0) => break,
            Ok(n) => {
                pending.extend_from_slice(&buf[..n]);
                let text = drain_utf8(&mut pending);
                if !text.is_empty() && events.send(ProcessEvent::Output(text)).is_err() {
                    return;
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::Interrupted => continue,
            // EIO is how Linux reports a closed pty
            Err(_) => break,
        }
    }
    if !pending.is_empty() {
        let tail = String::from_utf8_lossy(&pending).into_owned();
        let _ = events.send(ProcessEvent::Output(tail));
    }
}

/// Take the decodable prefix of `pending`, leaving a split multi-byte
/// sequence at the end for the next read. Invalid bytes become U+FFFD.
fn drain_utf8(pending: &mut Vec<u8>) -> String {
    let mut out = String::new();
    loop {
        match std::str::from_utf8(pending) {
            Ok(text) => {
                out.push_str(text);
                pending.clear();
                return out;
            }
            Err(e) => {
                let valid = e.valid_up_to();
                out.push_str(&String::from_utf8_lossy(&pending[..valid]));
                match e.error_len() {
                    Some(len) => {
                        out.push(char::REPLACEMENT_CHARACTER);
                        pending.drain(..valid + len);
                    }
                    None => {
                        pending.drain(..valid);
                        return out;
                    }
                }
            }
        }
    }
}

struct PtyProcess {
    master: Box<dyn MasterPty + Send>,
    writer: Box<dyn Write + Send>,
    killer: Box<dyn ChildKiller + Send + Sync>,
    killed: bool,
}

impl ShellProcess for PtyProcess {
    fn write(&mut self, data: &[u8]) -> Result<(), TerminalError> {
        self.writer.write_all(data)?;
        self.writer.flush()?;
        Ok(())
    }

    fn resize(&self, dims: Dimensions) -> Result<(), TerminalError> {
        self.master
            .resize(pty_size(dims))
            .map_err(|e| TerminalError::Resize(e.to_string()))
    }

    fn kill(&mut self) {
        if self.killed {
            return;
        }
        self.killed = true;
        if let Err(e) = self.killer.kill() {
            tracing::debug!(error = %e, "shell already gone");
        }
    }
}

impl Drop for PtyProcess {
    fn drop(&mut self) {
        self.kill();
    }
}
