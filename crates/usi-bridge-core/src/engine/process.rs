use std::io;
use std::process::{ExitStatus, Stdio};
use std::sync::OnceLock;
use std::time::Duration;

use tokio::io::AsyncWriteExt;
use tokio::process::{Child, ChildStdin, Command};
use tokio::sync::{Mutex, MutexGuard};
use tracing::{debug, info, warn};

use super::router::{LineRouter, LineSubscription};
use super::{EngineInfo, EngineState, EngineStatus};
use crate::config::EngineConfig;
use crate::error::{UsiError, UsiResult};
use crate::option::OptionSet;
use crate::protocol;

/// A USI engine subprocess with piped stdin and stdout.
///
/// Stdout is owned by a [`LineRouter`] task from [`start`](Self::start)
/// until the engine exits. Stdin writes are serialized. Session data sits
/// behind [`lock`](Self::lock), which the handshake holds for its whole
/// duration.
pub struct EngineProcess {
    name: String,
    config: EngineConfig,
    quit_timeout: Duration,
    status: Mutex<EngineStatus>,
    child: Mutex<Option<Child>>,
    stdin: Mutex<Option<ChildStdin>>,
    router: OnceLock<LineRouter>,
}

impl EngineProcess {
    pub fn new(name: impl Into<String>, config: EngineConfig, quit_timeout: Duration) -> Self {
        Self {
            name: name.into(),
            config,
            quit_timeout,
            status: Mutex::new(EngineStatus::default()),
            child: Mutex::new(None),
            stdin: Mutex::new(None),
            router: OnceLock::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Launch the engine and start routing its output.
    pub async fn start(&self) -> UsiResult<()> {
        let mut child_slot = self.child.lock().await;
        if child_slot.is_some() || self.router.get().is_some() {
            return Err(UsiError::EngineIsAlreadyRunning);
        }

        let mut command = Command::new(&self.config.path);
        command
            .args(&self.config.args)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit()) // protocol stays on stdout
            .kill_on_drop(true);
        if let Some(dir) = &self.config.working_dir {
            command.current_dir(dir);
        }

        let mut child = command.spawn().map_err(|source| UsiError::Spawn {
            path: self.config.path.clone(),
            source,
        })?;
        let stdin = child.stdin.take().ok_or_else(|| UsiError::Internal {
            message: "engine stdin was not captured".to_string(),
        })?;
        let stdout = child.stdout.take().ok_or_else(|| UsiError::Internal {
            message: "engine stdout was not captured".to_string(),
        })?;

        let (router, _reader) = LineRouter::spawn(&self.name, stdout);
        self.router.set(router).map_err(|_| UsiError::Internal {
            message: "engine output router installed twice".to_string(),
        })?;
        *self.stdin.lock().await = Some(stdin);

        info!(
            engine = %self.name,
            pid = ?child.id(),
            path = %self.config.path.display(),
            "engine process started"
        );
        *child_slot = Some(child);
        Ok(())
    }

    /// Write one command line to the engine.
    pub async fn exec(&self, command: &str) -> UsiResult<()> {
        if command.contains(|c| c == '\n' || c == '\r') {
            return Err(UsiError::InvalidCommand {
                detail: format!("engine command must be a single line, got {:?}", command),
            });
        }
        let mut stdin = self.stdin.lock().await;
        let pipe = stdin.as_mut().ok_or_else(|| UsiError::Write {
            command: command.to_string(),
            source: io::Error::new(io::ErrorKind::BrokenPipe, "engine stdin is closed"),
        })?;

        info!(engine = %self.name, command, "send");
        let mut line = Vec::with_capacity(command.len() + 1);
        line.extend_from_slice(command.as_bytes());
        line.push(b'\n');

        let result = match pipe.write_all(&line).await {
            Ok(()) => pipe.flush().await,
            Err(e) => Err(e),
        };
        result.map_err(|source| UsiError::Write {
            command: command.to_string(),
            source,
        })
    }

    /// Become the consumer of engine output.
    pub fn subscribe(&self) -> UsiResult<LineSubscription> {
        self.router
            .get()
            .ok_or(UsiError::EngineIsNotRunning)?
            .subscribe()
    }

    /// Status lock. Held across the whole handshake.
    pub async fn lock(&self) -> MutexGuard<'_, EngineStatus> {
        self.status.lock().await
    }

    pub async fn state(&self) -> EngineState {
        self.status.lock().await.state
    }

    pub async fn info(&self) -> EngineInfo {
        self.status.lock().await.info(&self.name)
    }

    pub async fn options(&self) -> OptionSet {
        self.status.lock().await.options.clone()
    }

    /// Ask the engine to quit, killing it if it has not exited within the
    /// quit timeout. Returns `None` when the engine was never started.
    pub async fn close(&self) -> UsiResult<Option<ExitStatus>> {
        let Some(mut child) = self.child.lock().await.take() else {
            return Ok(None);
        };

        if let Err(e) = self.exec(protocol::QUIT).await {
            warn!(engine = %self.name, error = %e, "failed to send quit");
        }
        // Closing stdin gives engines that ignore `quit` an EOF.
        self.stdin.lock().await.take();

        let exit = match tokio::time::timeout(self.quit_timeout, child.wait()).await {
            Ok(result) => result,
            Err(_) => {
                warn!(
                    engine = %self.name,
                    timeout = ?self.quit_timeout,
                    "engine ignored quit, killing"
                );
                match child.kill().await {
                    Ok(()) => child.wait().await,
                    Err(e) => Err(e),
                }
            }
        };

        self.status.lock().await.state = EngineState::NotConnected;
        let status = exit.map_err(|source| UsiError::Wait { source })?;
        debug!(engine = %self.name, %status, "engine process exited");
        Ok(Some(status))
    }
}

impl std::fmt::Debug for EngineProcess {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EngineProcess")
            .field("name", &self.name)
            .field("path", &self.config.path)
            .field("started", &self.router.get().is_some())
            .finish()
    }
}
