use anyhow::{bail, Context, Result};
use serde_json::Value;
use std::env;
use utility_mcp::{config::AppConfig, observability, ConnectionManager, ToolDispatcher};

/// Runs a single tool call against the configured database and prints the
/// tool's text result. Exits non-zero when the tool reports an error.
#[tokio::main]
async fn main() -> Result<()> {
    observability::init_tracing();

    let args: Vec<String> = env::args().collect();
    if args.len() < 2 {
        bail!("usage: call_tool <tool_name> [json_arguments]");
    }
    let name = &args[1];
    let arguments: Option<Value> = match args.get(2) {
        Some(raw) => Some(serde_json::from_str(raw).context("tool arguments must be JSON")?),
        None => None,
    };

    let cfg = AppConfig::load()?;
    let connection =
        ConnectionManager::connect(cfg.mongodb_uri()?, &cfg.mongodb, &cfg.server.name).await?;
    let dispatcher =
        ToolDispatcher::new(connection.store(), cfg.analytics.unrecognized_customer_types);

    let result = dispatcher.call(name, arguments.as_ref()).await;
    println!("{}", result.joined_text());

    connection.shutdown().await;
    if result.is_error {
        std::process::exit(1);
    }
    Ok(())
}
