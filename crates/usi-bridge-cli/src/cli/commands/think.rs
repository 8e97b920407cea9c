use std::time::Duration;

use anyhow::Context;
use tracing::info;
use usi_bridge_core::{BridgeConfig, Connector, Position, SessionStore};

use crate::cli::args::ThinkArgs;
use crate::exit_codes::SUCCESS;

pub async fn run(args: ThinkArgs, config: BridgeConfig) -> anyhow::Result<i32> {
    let engine = super::resolve_engine(&config, args.engine.engine.as_deref())?;
    let position = match &args.position {
        Some(path) => super::load_position(path)?,
        None => Position::initial(),
    };
    let connector = Connector::new(config, SessionStore::new());

    let result = think(&connector, &engine, &args, &position).await;
    super::finish(&engine, result, connector.close(&engine).await)
}

async fn think(
    connector: &Connector,
    engine: &str,
    args: &ThinkArgs,
    position: &Position,
) -> anyhow::Result<i32> {
    connector
        .connect(engine)
        .await
        .with_context(|| format!("failed to connect to {}", engine))?;

    for update in &args.set {
        connector
            .set_option(engine, update)
            .await
            .with_context(|| format!("failed to set option {}", update.name))?;
    }
    connector.set_position(engine, position).await?;
    connector.start(engine).await?;

    let budget = Duration::from_secs(args.seconds);
    info!(engine, seconds = args.seconds, "thinking");
    tokio::select! {
        _ = tokio::signal::ctrl_c() => info!(engine, "interrupted"),
        _ = tokio::time::sleep(budget) => {}
    }
    Ok(SUCCESS)
}
