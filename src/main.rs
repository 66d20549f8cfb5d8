//! graphiti-memory: conversational memory CLI
//!
//! Main entry point for the CLI application.
//! Dispatches commands to the adapter and outputs JSON results.

use anyhow::{bail, Context};
use clap::Parser;
use serde::Serialize;
use serde_json::{Map, Value};
use std::io::Read;
use std::path::Path;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

use graphiti_memory::buffer::FileBuffer;
use graphiti_memory::logging::{clear_logs, get_log_path, read_logs, FileLogObserver};
use graphiti_memory::models::{
    ClearData, ClearLogsData, ErrorResponse, HealthData, LoadContextData, LogEntry, LogsData,
    SaveTurnData, SuccessResponse,
};
use graphiti_memory::observe::{FanoutObserver, TracingObserver};
use graphiti_memory::workflow::{item_session, process_item};
use graphiti_memory::{resolve_session, Cli, Command, ConversationMemory, GraphitiMemory, MemoryConfig};

const SESSIONS_DIR: &str = "sessions";

#[tokio::main]
async fn main() {
    init_tracing();

    let cli = Cli::parse();

    match run(cli).await {
        Ok(json) => print_json(&json),
        Err(e) => {
            print_json(&ErrorResponse::new(format!("{:#}", e)));
            std::process::exit(1);
        }
    }
}

/// Diagnostics go to stderr so stdout stays machine-readable
fn init_tracing() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

fn print_json<T: Serialize>(value: &T) {
    match serde_json::to_string_pretty(value) {
        Ok(json) => println!("{}", json),
        Err(e) => eprintln!("failed to serialize output: {}", e),
    }
}

fn success<T: Serialize>(data: T) -> anyhow::Result<Value> {
    Ok(serde_json::to_value(SuccessResponse::new(data))?)
}

/// Run the dispatched command
async fn run(cli: Cli) -> anyhow::Result<Value> {
    let data_dir = cli.global.data_dir();

    match cli.command {
        // Commands that don't need a server
        Command::Logs { n, operation } => {
            let path = get_log_path(&data_dir)?;
            let entries: Vec<LogEntry> = read_logs(&path, n, operation.as_deref())?
                .into_iter()
                .map(|e| LogEntry {
                    timestamp: e.timestamp.to_rfc3339(),
                    level: if e.success { "info".to_string() } else { "error".to_string() },
                    operation: e.operation.to_string(),
                    session: e.session,
                    details: e
                        .details
                        .map(|d| serde_json::json!({ "message": d }))
                        .unwrap_or_else(|| serde_json::json!({})),
                })
                .collect();
            let count = entries.len();
            success(LogsData { entries, count })
        }

        Command::ClearLogs => {
            let cleared = clear_logs(&get_log_path(&data_dir)?)?;
            success(ClearLogsData { cleared })
        }

        command => {
            let mut config = MemoryConfig::load(&data_dir)?;
            cli.global.apply(&mut config);
            let mut memory = build_memory(&config, &data_dir)?;

            let explicit = cli.global.session.as_deref();
            let configured = config.session_key.as_deref();

            dispatch(command, &mut memory, explicit, configured).await
        }
    }
}

/// Adapter with a file-backed window and file plus tracing observers
fn build_memory(config: &MemoryConfig, data_dir: &Path) -> anyhow::Result<GraphitiMemory> {
    let observer = FanoutObserver::new()
        .with(Arc::new(TracingObserver))
        .with(Arc::new(FileLogObserver::in_data_dir(data_dir)?));

    Ok(GraphitiMemory::from_config(config)?
        .with_buffer(Box::new(FileBuffer::new(data_dir.join(SESSIONS_DIR))))
        .with_observer(Arc::new(observer)))
}

/// Dispatch commands that talk to the adapter
async fn dispatch(
    command: Command,
    memory: &mut GraphitiMemory,
    explicit: Option<&str>,
    configured: Option<&str>,
) -> anyhow::Result<Value> {
    match command {
        Command::LoadContext { utterance } => {
            let session = resolve_session([explicit, configured]);
            let variables = memory.load_context(&utterance, &session).await;
            success(LoadContextData {
                session_id: session.to_string(),
                memory: variables,
            })
        }

        Command::SaveTurn { user, assistant } => {
            let session = resolve_session([explicit, configured]);
            // The process exits right after; wait for the appends to land.
            let remote = memory.save_turn(&user, &assistant, &session).await.settle().await;
            success(SaveTurnData {
                session_id: session.to_string(),
                memory_saved: true,
                remote,
            })
        }

        Command::Clear => {
            let session = resolve_session([explicit, configured]);
            memory.clear(&session).await;
            success(ClearData {
                session_id: session.to_string(),
                cleared: true,
            })
        }

        Command::Health => {
            let data = match memory.health().await {
                Ok(()) => HealthData {
                    healthy: true,
                    reason: None,
                },
                Err(e) => HealthData {
                    healthy: false,
                    reason: Some(e.to_string()),
                },
            };
            success(data)
        }

        Command::Run => {
            let item = read_item()?;
            let session = resolve_session([explicit, item_session(&item), configured]);
            let processed = process_item(memory, item, &session).await;
            if let Some(write_back) = processed.write_back {
                write_back.settle().await;
            }
            Ok(Value::Object(processed.item))
        }

        Command::Logs { .. } | Command::ClearLogs => bail!("log commands are handled before dispatch"),
    }
}

/// One workflow item from stdin
fn read_item() -> anyhow::Result<Map<String, Value>> {
    let mut input = String::new();
    std::io::stdin()
        .read_to_string(&mut input)
        .context("failed to read workflow item from stdin")?;

    match serde_json::from_str::<Value>(&input).context("workflow item is not valid JSON")? {
        Value::Object(item) => Ok(item),
        _ => bail!("workflow item must be a JSON object"),
    }
}
