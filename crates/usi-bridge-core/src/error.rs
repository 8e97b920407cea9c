//! Error types for the engine session core.

use std::path::PathBuf;
use std::time::Duration;

/// Coarse grouping of [`UsiError`] variants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, serde::Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    /// Malformed `id` / `option` lines.
    Syntax,
    /// Well-formed but unsupported protocol extensions.
    Unsupported,
    /// Operation attempted in the wrong session state.
    State,
    /// A handshake phase exceeded its bound.
    Timeout,
    /// Spawn, write, or wait failures of the engine process.
    Process,
    /// Bad caller input (positions, moves, option values, commands).
    Input,
    /// Configuration could not be loaded or is invalid.
    Config,
    /// An internal invariant was violated.
    Internal,
}

/// Engine session errors.
#[derive(Debug, thiserror::Error)]
pub enum UsiError {
    /// `id` line did not match `id <field> <value...>`.
    #[error("invalid id syntax: {detail}")]
    InvalidIdentitySyntax { detail: String },

    /// `id` line named a field other than `name` or `author`.
    #[error("unknown id field: {field}")]
    UnknownIdentityField { field: String },

    /// `option` line did not match the grammar of its kind.
    #[error("invalid option syntax: {detail}")]
    InvalidOptionSyntax { detail: String },

    /// `option` line declared a kind this core does not know.
    #[error("unknown option type: {kind}")]
    UnknownOptionType { kind: String },

    /// No live session for the engine.
    #[error("engine is not running")]
    EngineIsNotRunning,

    /// The engine already has a live session.
    #[error("engine is already running")]
    EngineIsAlreadyRunning,

    /// The engine did not answer within the handshake bound.
    #[error("connection timeout: no `{expected}` within {timeout:?}")]
    ConnectionTimeout { expected: String, timeout: Duration },

    /// Engine stdout reached end of stream while a response was awaited.
    #[error("engine output closed while waiting for `{expected}`")]
    OutputClosed { expected: String },

    /// A second consumer tried to read engine output.
    #[error("engine output already has an active consumer")]
    OutputBusy,

    /// The engine process could not be launched.
    #[error("failed to spawn engine {path}: {source}")]
    Spawn {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Writing a command to the engine's stdin failed.
    #[error("failed to write `{command}` to engine: {source}")]
    Write {
        command: String,
        #[source]
        source: std::io::Error,
    },

    /// Waiting for the engine process to exit failed.
    #[error("failed waiting for engine exit: {source}")]
    Wait {
        #[source]
        source: std::io::Error,
    },

    /// No engine with that name is configured.
    #[error("unknown engine: {name}")]
    UnknownEngine { name: String },

    /// An option update named an option the engine never declared.
    #[error("unknown option: {name}")]
    UnknownOption { name: String },

    /// An option update carried a value the option does not accept.
    #[error("invalid value for option {name}: {detail}")]
    InvalidOptionValue { name: String, detail: String },

    /// A position could not be converted to SFEN.
    #[error("invalid position: {detail}")]
    InvalidPosition { detail: String },

    /// A move token could not be parsed.
    #[error("invalid move `{token}`: {detail}")]
    InvalidMove { token: String, detail: String },

    /// A client command could not be decoded.
    #[error("invalid command: {detail}")]
    InvalidCommand { detail: String },

    /// Configuration error.
    #[error("configuration error: {message}")]
    Config { message: String },

    /// Internal invariant violation.
    #[error("internal error: {message}")]
    Internal { message: String },
}

impl UsiError {
    pub(crate) fn invalid_option(detail: impl Into<String>) -> Self {
        Self::InvalidOptionSyntax {
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_move(token: &str, detail: impl Into<String>) -> Self {
        Self::InvalidMove {
            token: token.to_string(),
            detail: detail.into(),
        }
    }

    pub(crate) fn invalid_position(detail: impl Into<String>) -> Self {
        Self::InvalidPosition {
            detail: detail.into(),
        }
    }

    pub(crate) fn config(message: impl Into<String>) -> Self {
        Self::Config {
            message: message.into(),
        }
    }

    /// Which part of the taxonomy this error belongs to.
    pub fn category(&self) -> ErrorCategory {
        match self {
            Self::InvalidIdentitySyntax { .. } | Self::InvalidOptionSyntax { .. } => {
                ErrorCategory::Syntax
            }
            Self::UnknownIdentityField { .. } | Self::UnknownOptionType { .. } => {
                ErrorCategory::Unsupported
            }
            Self::EngineIsNotRunning | Self::EngineIsAlreadyRunning | Self::OutputBusy => {
                ErrorCategory::State
            }
            Self::ConnectionTimeout { .. } => ErrorCategory::Timeout,
            Self::OutputClosed { .. }
            | Self::Spawn { .. }
            | Self::Write { .. }
            | Self::Wait { .. } => ErrorCategory::Process,
            Self::UnknownOption { .. }
            | Self::InvalidOptionValue { .. }
            | Self::InvalidPosition { .. }
            | Self::InvalidMove { .. }
            | Self::InvalidCommand { .. } => ErrorCategory::Input,
            Self::UnknownEngine { .. } | Self::Config { .. } => ErrorCategory::Config,
            Self::Internal { .. } => ErrorCategory::Internal,
        }
    }

    /// Exit code for CLI.
    pub fn exit_code(&self) -> i32 {
        match self.category() {
            ErrorCategory::Config => 2,
            _ => 1,
        }
    }
}

/// Result type for session core operations.
pub type UsiResult<T> = Result<T, UsiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn unknown_extensions_are_not_syntax_errors() {
        let err = UsiError::UnknownIdentityField {
            field: "version".into(),
        };
        assert_eq!(err.category(), ErrorCategory::Unsupported);

        let err = UsiError::invalid_option("bad");
        assert_eq!(err.category(), ErrorCategory::Syntax);
    }

    #[test]
    fn config_errors_map_to_usage_exit_code() {
        assert_eq!(UsiError::config("missing").exit_code(), 2);
        assert_eq!(UsiError::EngineIsNotRunning.exit_code(), 1);
    }

    #[test]
    fn timeout_message_names_expected_token() {
        let err = UsiError::ConnectionTimeout {
            expected: "usiok".into(),
            timeout: Duration::from_secs(10),
        };
        assert!(err.to_string().contains("usiok"));
    }
}
