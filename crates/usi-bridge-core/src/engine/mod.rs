//! One engine subprocess and the state the session keeps about it.

mod process;
pub mod router;

pub use process::EngineProcess;
pub use router::{EngineLine, LineRouter, LineSubscription};

use serde::Serialize;

use crate::option::{EngineOption, OptionSet};
use crate::parser::{Identity, IdentityField};

/// Lifecycle of an engine session.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    #[default]
    NotConnected,
    /// Handshake done, engine idle.
    Connected,
    /// `go infinite` sent.
    Thinking,
}

/// Mutable session data, guarded by the process's status lock.
#[derive(Debug, Clone, Default)]
pub struct EngineStatus {
    pub state: EngineState,
    pub name: String,
    pub author: String,
    pub options: OptionSet,
}

impl EngineStatus {
    pub fn set_identity(&mut self, identity: Identity) {
        match identity.field {
            IdentityField::Name => self.name = identity.value,
            IdentityField::Author => self.author = identity.value,
        }
    }

    pub fn set_option(&mut self, option: EngineOption) {
        self.options.insert(option);
    }

    pub fn info(&self, engine: &str) -> EngineInfo {
        EngineInfo {
            engine: engine.to_string(),
            state: self.state,
            name: self.name.clone(),
            author: self.author.clone(),
            options: self.options.len(),
        }
    }
}

/// Snapshot of a session for callers.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EngineInfo {
    /// Configured engine name (the session key).
    pub engine: String,
    pub state: EngineState,
    /// Name reported by `id name`.
    pub name: String,
    pub author: String,
    pub options: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::{parse_identity, parse_option};

    #[test]
    fn status_applies_identity_and_options() {
        let mut status = EngineStatus::default();
        status.set_identity(parse_identity("id name Lesserkai 1.4").unwrap());
        status.set_identity(parse_identity("id author Program Writer").unwrap());
        status.set_option(parse_option("option name Ponder type check default false").unwrap());
        status.set_option(parse_option("option name Ponder type check default true").unwrap());

        let info = status.info("lesserkai");
        assert_eq!(info.name, "Lesserkai 1.4");
        assert_eq!(info.author, "Program Writer");
        assert_eq!(info.options, 1);
        assert_eq!(info.state, EngineState::NotConnected);
        assert!(status.options.checks()["Ponder"].value);
    }
}
