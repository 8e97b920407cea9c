use anyhow::Context;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tracing::{info, warn};
use usi_bridge_core::{execute, BridgeConfig, ClientRequest, CommandReply, Connector, SessionStore};

use crate::cli::args::EngineArgs;
use crate::exit_codes::SUCCESS;

/// JSON-lines driver: one request per stdin line, one reply per stdout line.
pub async fn run(args: EngineArgs, config: BridgeConfig) -> anyhow::Result<i32> {
    let connector = Connector::new(config, SessionStore::new());
    let mut requests = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    info!(engines = ?connector.config().engine_names().collect::<Vec<_>>(), "serving client commands");

    loop {
        let line = tokio::select! {
            _ = tokio::signal::ctrl_c() => {
                info!("interrupted, closing engines");
                break;
            }
            line = requests.next_line() => line.context("failed to read stdin")?,
        };
        let Some(line) = line else {
            break;
        };
        if line.trim().is_empty() {
            continue;
        }

        let reply = handle(&connector, args.engine.as_deref(), &line).await;
        let mut out = reply.to_json();
        out.push('\n');
        stdout.write_all(out.as_bytes()).await?;
        stdout.flush().await?;
    }

    connector.close_all().await?;
    Ok(SUCCESS)
}

async fn handle(connector: &Connector, default_engine: Option<&str>, line: &str) -> CommandReply {
    let request = match ClientRequest::from_json(line) {
        Ok(request) => request,
        Err(e) => {
            warn!(error = %e, "rejected client command");
            return CommandReply::failure(None, &e);
        }
    };

    let requested = request.engine.as_deref().or(default_engine);
    let engine = match super::resolve_engine(connector.config(), requested) {
        Ok(engine) => engine,
        Err(e) => return CommandReply::failure(request.engine, &e),
    };

    match execute(connector, &engine, &request.command).await {
        Ok(output) => CommandReply::success(engine, output),
        Err(e) => {
            warn!(engine = %engine, error = %e, "client command failed");
            CommandReply::failure(Some(engine), &e)
        }
    }
}
