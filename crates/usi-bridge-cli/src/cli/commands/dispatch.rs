use super::super::args::*;
use crate::exit_codes::SUCCESS;
use usi_bridge_core::{BridgeConfig, UsiError};

pub async fn dispatch(cli: Cli, config: Option<BridgeConfig>) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Serve(args) => super::serve::run(args, require(config)?).await,
        Command::Options(args) => super::options::run(args, require(config)?).await,
        Command::Think(args) => super::think::run(args, require(config)?).await,
        Command::Sfen(args) => super::sfen::run(args),
        Command::ParseMove(args) => super::parse_move::run(args),
        Command::Version => {
            println!("{}", env!("CARGO_PKG_VERSION"));
            Ok(SUCCESS)
        }
    }
}

fn require(config: Option<BridgeConfig>) -> Result<BridgeConfig, UsiError> {
    config.ok_or_else(|| UsiError::Config {
        message: "this command needs a config file".to_string(),
    })
}
