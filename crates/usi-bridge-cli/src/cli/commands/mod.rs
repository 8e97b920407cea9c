pub mod dispatch;
pub mod options;
pub mod parse_move;
pub mod serve;
pub mod sfen;
pub mod think;

pub use dispatch::dispatch;

use anyhow::Context;
use std::path::Path;
use tracing::warn;
use usi_bridge_core::{BridgeConfig, Position, UsiError, UsiResult};

/// The engine a command addresses: the requested one, or the only one
/// configured.
pub(crate) fn resolve_engine(config: &BridgeConfig, requested: Option<&str>) -> UsiResult<String> {
    if let Some(name) = requested {
        config.engine(name)?;
        return Ok(name.to_string());
    }
    let names: Vec<&str> = config.engine_names().collect();
    match names.as_slice() {
        [only] => Ok(only.to_string()),
        _ => Err(UsiError::Config {
            message: format!(
                "pass --engine to pick one of the configured engines ({})",
                names.join(", ")
            ),
        }),
    }
}

/// Read a position in the client JSON format.
pub(crate) fn load_position(path: &Path) -> anyhow::Result<Position> {
    let text = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("invalid position JSON in {}", path.display()))
}

/// Merge a command's result with the close that follows it. The command's
/// own error wins; a close failure is only returned after a success.
pub(crate) fn finish(
    engine: &str,
    result: anyhow::Result<i32>,
    closed: UsiResult<()>,
) -> anyhow::Result<i32> {
    let Err(e) = closed else {
        return result;
    };
    warn!(engine, error = %e, "failed to close engine");
    match result {
        Ok(_) => Err(anyhow::Error::new(e).context("failed to close engine")),
        Err(first) => Err(first),
    }
}
