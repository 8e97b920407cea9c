//! Session core for USI shogi engines.
//!
//! This crate drives an external engine binary over the USI text protocol:
//!
//! - Handshake (`usi`/`usiok`, `isready`/`readyok`) with bounded waits
//! - Parsing of `id` and `option` declarations into a typed option model
//! - `setoption` generation from client option updates
//! - `position sfen ...` serialization and USI move token parsing
//! - A per-session state machine (`NotConnected → Connected → Thinking`)
//!
//! # Quick Start
//!
//! ```no_run
//! use usi_bridge_core::{BridgeConfig, Connector, EngineConfig, SessionStore};
//!
//! # async fn example() -> usi_bridge_core::UsiResult<()> {
//! let config = BridgeConfig::default()
//!     .with_engine("lesserkai", EngineConfig::new("/opt/engines/lesserkai"));
//! let connector = Connector::new(config, SessionStore::new());
//!
//! connector.connect("lesserkai").await?;
//! for option in connector.options("lesserkai").await.iter() {
//!     println!("{} ({})", option.name(), option.kind());
//! }
//! connector.start("lesserkai").await?;
//! connector.close("lesserkai").await?;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//!
//! | Environment Variable | Description |
//! |---------------------|-------------|
//! | `USI_BRIDGE_CONFIG` | Path of the YAML config file |
//! | `RUST_LOG` | Log filter, overrides `log.level` |

pub mod command;
pub mod config;
pub mod connector;
pub mod engine;
pub mod error;
pub mod option;
pub mod parser;
pub mod protocol;
pub mod shogi;
pub mod store;

pub use command::{execute, ClientCommand, ClientRequest, CommandOutput, CommandReply};
pub use config::{BridgeConfig, EngineConfig, LogConfig, LogFormat, CONFIG_ENV};
pub use connector::Connector;
pub use engine::{EngineInfo, EngineLine, EngineProcess, EngineState, EngineStatus};
pub use error::{ErrorCategory, UsiError, UsiResult};
pub use option::{
    ButtonOption, CheckOption, ComboOption, EngineOption, FilenameOption, OptionKind, OptionSet,
    OptionUpdate, SpinOption, StringOption,
};
pub use parser::{parse_identity, parse_option, Identity, IdentityField};
pub use shogi::{parse_move, Move, Point, Position};
pub use store::SessionStore;
