//! Command-line front end for the graph engine.
//!
//! # Responsibility
//! - Load a workspace snapshot and print the `refresh` payload for one kind.
//! - Keep output deterministic for quick local sanity checks.
//!
//! Usage: `notegraph_cli <snapshot.json> [note|schema]`

use log::error;
use notegraph_core::{
    init_logging, DocumentKind, GraphBuilder, InMemoryDocumentStore, LoggingConfig,
    OutboundMessage,
};
use std::path::PathBuf;
use std::process::ExitCode;

fn main() -> ExitCode {
    let logging = LoggingConfig {
        level: "warn".to_string(),
        ..LoggingConfig::default()
    };
    if let Err(err) = init_logging(&logging) {
        eprintln!("notegraph_cli: {err}");
    }

    match run(std::env::args().skip(1).collect()) {
        Ok(payload) => {
            println!("{payload}");
            ExitCode::SUCCESS
        }
        Err(message) => {
            error!("event=cli_run module=cli status=error error={}", message);
            eprintln!("notegraph_cli: {message}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: Vec<String>) -> Result<String, String> {
    let (snapshot, kind) = parse_args(&args)?;
    let store = InMemoryDocumentStore::load(&snapshot).map_err(|err| err.to_string())?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .build()
        .map_err(|err| format!("failed to start runtime: {err}"))?;
    let graph = runtime
        .block_on(GraphBuilder::for_store(kind, &store).build_from_store(&store))
        .map_err(|err| err.to_string())?;

    serde_json::to_string_pretty(&OutboundMessage::Refresh(graph)).map_err(|err| err.to_string())
}

fn parse_args(args: &[String]) -> Result<(PathBuf, DocumentKind), String> {
    let usage = "usage: notegraph_cli <snapshot.json> [note|schema]";
    let snapshot = args.first().ok_or_else(|| usage.to_string())?;
    let kind = match args.get(1) {
        Some(raw) => DocumentKind::parse(raw)
            .ok_or_else(|| format!("unknown kind `{raw}`; {usage}"))?,
        None => DocumentKind::Note,
    };
    if args.len() > 2 {
        return Err(usage.to_string());
    }
    Ok((PathBuf::from(snapshot), kind))
}
