//! Session orchestration: the USI handshake and the
//! `NotConnected → Connected → Thinking` state machine.

use std::sync::Arc;

use tracing::{debug, error, info};

use crate::config::BridgeConfig;
use crate::engine::{EngineInfo, EngineProcess, EngineState, EngineStatus, LineSubscription};
use crate::error::{UsiError, UsiResult};
use crate::option::{EngineOption, OptionSet, OptionUpdate};
use crate::parser::{parse_identity, parse_option};
use crate::protocol;
use crate::shogi::Position;
use crate::store::SessionStore;

/// Drives engine sessions stored in a [`SessionStore`].
#[derive(Debug, Clone)]
pub struct Connector {
    config: Arc<BridgeConfig>,
    store: SessionStore,
}

impl Connector {
    pub fn new(config: impl Into<Arc<BridgeConfig>>, store: SessionStore) -> Self {
        Self {
            config: config.into(),
            store,
        }
    }

    pub fn config(&self) -> &BridgeConfig {
        &self.config
    }

    pub fn store(&self) -> &SessionStore {
        &self.store
    }

    /// A session that exists and has left `NotConnected`.
    async fn live(&self, name: &str) -> Option<Arc<EngineProcess>> {
        let process = self.store.get(name).await?;
        if process.state().await == EngineState::NotConnected {
            return None;
        }
        Some(process)
    }

    async fn require_live(&self, name: &str) -> UsiResult<Arc<EngineProcess>> {
        self.live(name).await.ok_or(UsiError::EngineIsNotRunning)
    }

    /// Start the engine and run the `usi`/`isready` handshake.
    ///
    /// Connecting a session that is already past `NotConnected` does
    /// nothing. A timed out handshake leaves the session in the store; close
    /// it before connecting again.
    pub async fn connect(&self, name: &str) -> UsiResult<()> {
        let engine = self.config.engine(name)?.clone();
        let process = Arc::new(EngineProcess::new(name, engine, self.config.quit_timeout()));
        // Taken before the session is visible so concurrent callers wait for
        // the handshake instead of seeing a half-built session.
        let mut status = process.lock().await;

        while let Some(existing) = self.store.insert_if_absent(name, process.clone()).await {
            let state = existing.state().await;
            if state != EngineState::NotConnected {
                debug!(
                    engine = name,
                    ?state,
                    "{}; ignoring connect",
                    UsiError::EngineIsAlreadyRunning
                );
                return Ok(());
            }
            // Left behind by a connect whose spawn failed.
            self.store.remove_if_same(name, &existing).await;
        }

        if let Err(e) = process.start().await {
            self.store.remove_if_same(name, &process).await;
            error!(engine = name, error = %e, "failed to start engine");
            return Err(e);
        }
        status.state = EngineState::Connected;
        debug!(engine = name, state = ?status.state, "state changed");

        match self.handshake(&process, &mut status).await {
            Ok(()) => {
                info!(
                    engine = name,
                    id_name = %status.name,
                    id_author = %status.author,
                    options = status.options.len(),
                    "engine ready"
                );
                Ok(())
            }
            Err(e) => {
                error!(engine = name, error = %e, "handshake failed");
                Err(e)
            }
        }
    }

    async fn handshake(&self, process: &EngineProcess, status: &mut EngineStatus) -> UsiResult<()> {
        let mut lines = process.subscribe()?;

        process.exec(protocol::USI).await?;
        self.wait_for(&mut lines, protocol::USIOK, Some(&mut *status)).await?;

        process.exec(protocol::ISREADY).await?;
        self.wait_for(&mut lines, protocol::READYOK, None).await
    }

    /// Wait for `expected`, bounded by the handshake timeout.
    async fn wait_for(
        &self,
        lines: &mut LineSubscription,
        expected: &str,
        routing: Option<&mut EngineStatus>,
    ) -> UsiResult<()> {
        let timeout = self.config.handshake_timeout();
        match tokio::time::timeout(timeout, read_until(lines, expected, routing)).await {
            Ok(result) => result,
            Err(_) => Err(UsiError::ConnectionTimeout {
                expected: expected.to_string(),
                timeout,
            }),
        }
    }

    /// Forward a raw command line to a live engine.
    pub async fn exec(&self, name: &str, command: &str) -> UsiResult<()> {
        self.require_live(name).await?.exec(command).await
    }

    /// Begin an infinite search. Output from here on is only logged.
    pub async fn start(&self, name: &str) -> UsiResult<()> {
        let process = self.require_live(name).await?;
        let lines = {
            let mut status = process.lock().await;
            match status.state {
                EngineState::Thinking => {
                    debug!(engine = name, "already thinking; ignoring start");
                    return Ok(());
                }
                EngineState::NotConnected => return Err(UsiError::EngineIsNotRunning),
                EngineState::Connected => {}
            }
            let lines = process.subscribe()?;
            status.state = EngineState::Thinking;
            debug!(engine = name, state = ?status.state, "state changed");
            lines
        };

        tokio::spawn(drain_search_output(name.to_string(), lines));
        process.exec(protocol::GO_INFINITE).await
    }

    /// Update an option locally and send the matching `setoption`.
    pub async fn set_option(&self, name: &str, update: &OptionUpdate) -> UsiResult<EngineOption> {
        let process = self.require_live(name).await?;
        let option = process.lock().await.options.apply(update)?;
        process.exec(&option.to_usi()).await?;
        Ok(option)
    }

    /// Options the engine declared; empty without a live session.
    pub async fn options(&self, name: &str) -> OptionSet {
        match self.live(name).await {
            Some(process) => process.options().await,
            None => OptionSet::new(),
        }
    }

    pub async fn info(&self, name: &str) -> Option<EngineInfo> {
        Some(self.live(name).await?.info().await)
    }

    /// `NotConnected` when no session exists.
    pub async fn state(&self, name: &str) -> EngineState {
        match self.store.get(name).await {
            Some(process) => process.state().await,
            None => EngineState::NotConnected,
        }
    }

    /// Send `position sfen ...` for `position`.
    pub async fn set_position(&self, name: &str, position: &Position) -> UsiResult<()> {
        let process = self.require_live(name).await?;
        process.exec(&position.to_usi()?).await
    }

    /// Quit the engine and drop the session, even if quitting fails.
    pub async fn close(&self, name: &str) -> UsiResult<()> {
        let Some(process) = self.store.remove(name).await else {
            debug!(engine = name, "no session to close");
            return Ok(());
        };
        match process.close().await? {
            Some(status) => info!(engine = name, %status, "engine closed"),
            None => debug!(engine = name, "engine was never started"),
        }
        Ok(())
    }

    /// Close every session in the store.
    pub async fn close_all(&self) -> UsiResult<()> {
        let mut first_error = None;
        for name in self.store.names().await {
            if let Err(e) = self.close(&name).await {
                error!(engine = %name, error = %e, "failed to close engine");
                first_error.get_or_insert(e);
            }
        }
        first_error.map_or(Ok(()), Err)
    }
}

/// Consume lines until `expected`, routing id and option lines into
/// `routing` when given. Anything else is ignored.
async fn read_until(
    lines: &mut LineSubscription,
    expected: &str,
    mut routing: Option<&mut EngineStatus>,
) -> UsiResult<()> {
    while let Some(line) = lines.recv().await {
        let text = line.text.trim();
        if text.is_empty() {
            continue;
        }
        if text == expected {
            return Ok(());
        }
        let Some(status) = routing.as_deref_mut() else {
            continue;
        };
        if text.starts_with(protocol::ID_PREFIX) {
            status.set_identity(parse_identity(text)?);
        } else if text.starts_with(protocol::OPTION_PREFIX) {
            status.set_option(parse_option(text)?);
        } else {
            debug!(seq = line.seq, line = text, "ignoring handshake chatter");
        }
    }
    Err(UsiError::OutputClosed {
        expected: expected.to_string(),
    })
}

async fn drain_search_output(engine: String, mut lines: LineSubscription) {
    while let Some(line) = lines.recv().await {
        info!(engine = %engine, seq = line.seq, line = %line.text, "receive");
    }
    debug!(engine = %engine, "search output ended");
}
