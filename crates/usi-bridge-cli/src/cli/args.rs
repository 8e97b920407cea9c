use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use usi_bridge_core::{BridgeConfig, OptionUpdate, UsiError, UsiResult, CONFIG_ENV};

#[derive(Parser, Debug)]
#[command(
    name = "usi-bridge",
    version,
    about = "Drive USI shogi engines: handshake, options, search, and SFEN conversion"
)]
pub struct Cli {
    /// YAML config listing the engines
    #[arg(long, short, global = true, env = CONFIG_ENV)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub cmd: Command,
}

impl Cli {
    /// Load the config when the command talks to an engine.
    pub fn load_config(&self) -> UsiResult<Option<BridgeConfig>> {
        if !self.cmd.needs_engines() {
            return Ok(None);
        }
        let path = self.config.as_ref().ok_or_else(|| UsiError::Config {
            message: format!("no config file; pass --config or set {}", CONFIG_ENV),
        })?;
        BridgeConfig::load(path).map(Some)
    }
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Read JSON commands from stdin, one per line, and answer on stdout
    Serve(EngineArgs),
    /// Connect to an engine and print its identity and options
    Options(EngineArgs),
    /// Connect, apply options and a position, then search for a while
    Think(ThinkArgs),
    /// Print the `position sfen` line for a JSON position file
    Sfen(SfenArgs),
    /// Parse a USI move token and print it as JSON
    ParseMove(ParseMoveArgs),
    Version,
}

impl Command {
    fn needs_engines(&self) -> bool {
        matches!(self, Self::Serve(_) | Self::Options(_) | Self::Think(_))
    }
}

#[derive(Args, Debug, Clone)]
pub struct EngineArgs {
    /// Engine name from the config; optional when only one is configured
    #[arg(long, short)]
    pub engine: Option<String>,
}

#[derive(Args, Debug, Clone)]
pub struct ThinkArgs {
    #[command(flatten)]
    pub engine: EngineArgs,

    /// Position JSON file (client format); defaults to the initial position
    #[arg(long)]
    pub position: Option<PathBuf>,

    /// Option update as NAME=VALUE, or NAME for a button (repeatable)
    #[arg(long = "set", value_name = "NAME=VALUE")]
    pub set: Vec<OptionUpdate>,

    /// How long to let the engine think
    #[arg(long, default_value_t = 5)]
    pub seconds: u64,
}

#[derive(Args, Debug, Clone)]
pub struct SfenArgs {
    /// Position JSON file (client format)
    pub file: PathBuf,
}

#[derive(Args, Debug, Clone)]
pub struct ParseMoveArgs {
    /// Move token, e.g. 7g7f, 8h2b+, G*5b
    pub token: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_think_flags() {
        let cli = Cli::try_parse_from([
            "usi-bridge",
            "--config",
            "bridge.yaml",
            "think",
            "--engine",
            "gikou",
            "--set",
            "USI_Hash=256",
            "--set",
            "ClearHash",
            "--seconds",
            "2",
        ])
        .unwrap();
        let Command::Think(args) = cli.cmd else {
            panic!("expected think");
        };
        assert_eq!(args.engine.engine.as_deref(), Some("gikou"));
        assert_eq!(
            args.set,
            vec![
                OptionUpdate::new("USI_Hash", "256"),
                OptionUpdate::press("ClearHash")
            ]
        );
        assert_eq!(args.seconds, 2);
    }

    #[test]
    fn offline_commands_skip_config() {
        let cli = Cli::try_parse_from(["usi-bridge", "parse-move", "7g7f"]).unwrap();
        assert!(cli.load_config().unwrap().is_none());
    }

    #[test]
    fn engine_commands_need_config() {
        // Built directly so `USI_BRIDGE_CONFIG` in the environment cannot
        // supply a path.
        let cli = Cli {
            config: None,
            cmd: Command::Options(EngineArgs { engine: None }),
        };
        assert!(matches!(cli.load_config(), Err(UsiError::Config { .. })));
    }
}
