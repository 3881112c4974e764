use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{debug, error};

use webpilot_cli::harness::{FixturePageReader, LoggingExecutor, ScriptedPlanner};
use webpilot_cli::runtime::{init_logging, load_config};
use webpilot_core_types::{Action, TabId, TabInfo, TaskStatus};
use webpilot_debugger::{SessionManager, StubBridge};
use webpilot_task_engine::{ErrorHook, NoopExtensionGate, TaskEngine};

#[derive(Parser)]
#[command(name = "webpilot", version, about = "Autonomous browser task pilot")]
struct Cli {
    /// Path to the configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Log level when RUST_LOG is not set
    #[arg(long, global = true, default_value = "info")]
    log_level: String,

    /// Shortcut for --log-level debug
    #[arg(long, global = true)]
    debug: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Drive a task through the dry-run harness (scripted planner, in-memory
    /// debugger bridge, logging executor)
    Run {
        /// Natural-language instructions for the task
        instructions: String,

        /// JSON file with the scripted planner decisions (array of actions)
        #[arg(long)]
        script: Option<PathBuf>,

        /// Url reported for the harness tab
        #[arg(long, default_value = "https://example.com/")]
        url: String,

        /// HTML file served as the simplified page state
        #[arg(long)]
        page: Option<PathBuf>,
    },
    /// Print the resolved configuration
    Info,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(&cli.log_level, cli.debug)?;
    let loaded = load_config(cli.config.as_ref()).await?;

    match cli.command {
        Command::Run {
            instructions,
            script,
            url,
            page,
        } => run(loaded.config, instructions, script, url, page).await,
        Command::Info => {
            println!("# {}", loaded.path.display());
            print!("{}", serde_yaml::to_string(&loaded.config)?);
            Ok(())
        }
    }
}

async fn run(
    config: webpilot_cli::PilotConfig,
    instructions: String,
    script: Option<PathBuf>,
    url: String,
    page: Option<PathBuf>,
) -> Result<()> {
    let actions: Vec<Action> = match script {
        Some(path) => {
            let raw = tokio::fs::read_to_string(&path)
                .await
                .with_context(|| format!("Failed to read script file {}", path.display()))?;
            serde_json::from_str(&raw)
                .with_context(|| format!("Failed to parse script file {}", path.display()))?
        }
        None => Vec::new(),
    };

    let html = match page {
        Some(path) => tokio::fs::read_to_string(&path)
            .await
            .with_context(|| format!("Failed to read page fixture {}", path.display()))?,
        None => "<html><body></body></html>".to_string(),
    };

    let bridge = Arc::new(StubBridge::new().with_tab(TabInfo::new(TabId(1), url)));
    let session = Arc::new(SessionManager::new(bridge, config.debugger.clone()));
    let engine = TaskEngine::new(
        session,
        Arc::new(FixturePageReader::new(html)),
        Arc::new(ScriptedPlanner::new(actions)),
        Arc::new(LoggingExecutor),
        Arc::new(NoopExtensionGate),
        config.engine.clone(),
    );

    let mut events = engine.subscribe();
    tokio::spawn(async move {
        while let Ok(event) = events.recv().await {
            debug!(target: "webpilot", change = ?event.change, "state change");
        }
    });

    let hook: ErrorHook = Arc::new(|message: String| {
        error!(target: "webpilot", %message, "task reported an error");
    });
    engine.run_task(&instructions, Some(hook)).await;

    for (index, entry) in engine.history().iter().enumerate() {
        let kind = entry
            .action
            .operation
            .as_ref()
            .map(|op| op.kind())
            .unwrap_or("thought");
        println!("{:>3}. [{kind}] {}", index + 1, entry.action.thought);
    }
    println!("status: {}", engine.status());

    if engine.status() == TaskStatus::Error {
        bail!("task ended in error");
    }
    Ok(())
}
