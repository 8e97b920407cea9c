//! Process exit codes. Part of the CLI contract.

use usi_bridge_core::UsiError;

pub const SUCCESS: i32 = 0;
pub const FAILURE: i32 = 1; // engine or command failure
pub const CONFIG_ERROR: i32 = 2; // bad config or usage

/// Exit code for an error surfaced by a command.
pub fn for_error(err: &anyhow::Error) -> i32 {
    err.chain()
        .find_map(|cause| cause.downcast_ref::<UsiError>())
        .map_or(FAILURE, UsiError::exit_code)
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::Context;

    #[test]
    fn maps_core_errors_through_context() {
        let err = Err::<(), _>(UsiError::UnknownEngine {
            name: "gikou".into(),
        })
        .context("connecting")
        .unwrap_err();
        assert_eq!(for_error(&err), CONFIG_ERROR);

        let err = anyhow::Error::new(UsiError::EngineIsNotRunning);
        assert_eq!(for_error(&err), FAILURE);

        assert_eq!(for_error(&anyhow::anyhow!("plain")), FAILURE);
    }
}
