// SPDX-License-Identifier: MIT OR Apache-2.0
//! `statewire` - replay a signal script through a state graph.
//!
//! Loads a graph blueprint, enters its Start nodes, feeds every scripted
//! step to the dispatcher and prints the final node states.

mod config;
mod error;
mod script;
mod session;

use clap::Parser;
use config::RunnerConfig;
use error::RunnerError;
use script::SignalScript;
use session::Session;
use statewire_graph::{Dispatcher, GraphBlueprint};
use std::path::PathBuf;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Graph blueprint (RON)
    #[arg(short, long)]
    graph: PathBuf,

    /// Signal script (RON)
    #[arg(short, long)]
    signals: PathBuf,

    /// Runner config (RON)
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Print the snapshot as JSON instead of RON
    #[arg(long)]
    json: bool,
}

fn main() {
    let args = Args::parse();

    let config = match args.config.as_deref().map(RunnerConfig::load).transpose() {
        Ok(config) => config.unwrap_or_default(),
        Err(e) => {
            init_tracing(config::DEFAULT_LOG_FILTER);
            tracing::error!("{e}");
            std::process::exit(1);
        }
    };
    init_tracing(&config.log_filter);

    tracing::info!("Starting statewire v{}", env!("CARGO_PKG_VERSION"));

    if let Err(e) = run(&args, &config) {
        tracing::error!("{e}");
        std::process::exit(1);
    }
}

/// `RUST_LOG` wins over the configured filter
fn init_tracing(filter: &str) {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();
}

fn run(args: &Args, config: &RunnerConfig) -> Result<(), RunnerError> {
    let content = error::read_file(&args.graph)?;
    let blueprint: GraphBlueprint = error::parse_ron(&args.graph, &content)?;
    let graph = blueprint.build()?;
    tracing::info!(
        graph = %graph.name,
        nodes = graph.node_count(),
        connections = graph.connection_count(),
        "Loaded graph"
    );

    let script = SignalScript::load(&args.signals)?;

    let mut session = Session::new(graph, Dispatcher::new(config.dispatch.clone()));
    if config.start_on_load {
        session.start()?;
    }
    let steps = session.run(&script)?;
    tracing::info!(
        steps,
        commands = session.report().commands.len(),
        active = session.graph().nodes().filter(|n| n.status().active).count(),
        "Script finished"
    );

    if config.print_snapshot {
        let summary = session.summary(steps);
        let rendered = if args.json {
            summary.to_json()?
        } else {
            summary.to_ron()?
        };
        println!("{rendered}");
    }
    Ok(())
}
