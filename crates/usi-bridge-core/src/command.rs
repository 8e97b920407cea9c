//! JSON client commands and their replies.
//!
//! ```json
//! {"command": "connect", "engine": "gikou"}
//! {"command": "set_option", "name": "USI_Hash", "value": "256"}
//! {"command": "position", "data": {"pos": [[...]], "cap0": [...], "cap1": [...], "turn": 0, "moveCount": 1}}
//! ```

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::connector::Connector;
use crate::engine::{EngineInfo, EngineState};
use crate::error::{ErrorCategory, UsiError, UsiResult};
use crate::option::{EngineOption, OptionSet, OptionUpdate};
use crate::shogi::Position;

/// One client command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "command", rename_all = "snake_case")]
pub enum ClientCommand {
    Connect,
    Close,
    Start,
    Options,
    Info,
    State,
    Position { data: Position },
    SetOption(OptionUpdate),
    /// Raw USI line, forwarded as is.
    Exec { line: String },
}

/// A command addressed to an engine. Without `engine` the caller's default
/// applies.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClientRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(flatten)]
    pub command: ClientCommand,
}

impl ClientRequest {
    pub fn from_json(text: &str) -> UsiResult<Self> {
        serde_json::from_str(text).map_err(|e| UsiError::InvalidCommand {
            detail: e.to_string(),
        })
    }
}

/// Result payload of a command.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum CommandOutput {
    Done,
    State(EngineState),
    Options(OptionSet),
    Info(Option<EngineInfo>),
    Option(EngineOption),
}

/// Run `command` against `engine`.
pub async fn execute(
    connector: &Connector,
    engine: &str,
    command: &ClientCommand,
) -> UsiResult<CommandOutput> {
    debug!(engine, ?command, "client command");
    let output = match command {
        ClientCommand::Connect => {
            connector.connect(engine).await?;
            CommandOutput::Done
        }
        ClientCommand::Close => {
            connector.close(engine).await?;
            CommandOutput::Done
        }
        ClientCommand::Start => {
            connector.start(engine).await?;
            CommandOutput::Done
        }
        ClientCommand::Options => CommandOutput::Options(connector.options(engine).await),
        ClientCommand::Info => CommandOutput::Info(connector.info(engine).await),
        ClientCommand::State => CommandOutput::State(connector.state(engine).await),
        ClientCommand::Position { data } => {
            connector.set_position(engine, data).await?;
            CommandOutput::Done
        }
        ClientCommand::SetOption(update) => {
            CommandOutput::Option(connector.set_option(engine, update).await?)
        }
        ClientCommand::Exec { line } => {
            connector.exec(engine, line).await?;
            CommandOutput::Done
        }
    };
    Ok(output)
}

/// One JSON reply line.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandReply {
    pub ok: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub engine: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<CommandOutput>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub category: Option<ErrorCategory>,
}

impl CommandReply {
    pub fn success(engine: impl Into<String>, output: CommandOutput) -> Self {
        let result = match output {
            CommandOutput::Done => None,
            other => Some(other),
        };
        Self {
            ok: true,
            engine: Some(engine.into()),
            result,
            error: None,
            category: None,
        }
    }

    pub fn failure(engine: Option<String>, error: &UsiError) -> Self {
        Self {
            ok: false,
            engine,
            result: None,
            error: Some(error.to_string()),
            category: Some(error.category()),
        }
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_else(|e| {
            format!(r#"{{"ok":false,"error":"failed to encode reply: {}"}}"#, e)
        })
    }
}
