use anyhow::Context;
use usi_bridge_core::{BridgeConfig, Connector, EngineOption, SessionStore};

use crate::cli::args::EngineArgs;
use crate::exit_codes::SUCCESS;

/// Connect, print identity and declared options as JSON, close.
pub async fn run(args: EngineArgs, config: BridgeConfig) -> anyhow::Result<i32> {
    let engine = super::resolve_engine(&config, args.engine.as_deref())?;
    let connector = Connector::new(config, SessionStore::new());

    // A failed handshake still leaves a process to reap.
    let result = report(&connector, &engine).await;
    super::finish(&engine, result, connector.close(&engine).await)
}

async fn report(connector: &Connector, engine: &str) -> anyhow::Result<i32> {
    connector
        .connect(engine)
        .await
        .with_context(|| format!("failed to connect to {}", engine))?;

    let options: Vec<EngineOption> = connector.options(engine).await.iter().collect();
    let doc = serde_json::json!({
        "info": connector.info(engine).await,
        "options": options,
    });
    println!("{}", serde_json::to_string_pretty(&doc)?);
    Ok(SUCCESS)
}
