//! USI wire tokens this core sends and waits for.

pub const USI: &str = "usi";
pub const USIOK: &str = "usiok";
pub const ISREADY: &str = "isready";
pub const READYOK: &str = "readyok";
pub const GO_INFINITE: &str = "go infinite";
pub const QUIT: &str = "quit";

/// Prefix of identity lines during the `usiok` wait.
pub const ID_PREFIX: &str = "id";
/// Prefix of option declarations during the `usiok` wait.
pub const OPTION_PREFIX: &str = "option";
