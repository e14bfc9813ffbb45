// Copyright 2026 The Simlin Authors. All rights reserved.
// Use of this source code is governed by the Apache License,
// Version 2.0, that can be found in the LICENSE file.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use clap::{Args, Parser, Subcommand};
use tracing::info;

use storm_diagram::{DiagramEngine, DiagramSession, InMemoryGraph, LayoutConfig, render_svg};

mod script;

/// Lay out event-storming diagrams from a domain graph.
#[derive(Parser)]
#[command(name = "storm", version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay a designer session against a graph and write the diagram
    Layout(LayoutArgs),
}

#[derive(Args)]
struct LayoutArgs {
    /// Graph fixture: { "nodes": [...], "relationships": [...] }
    #[arg(long, value_name = "FILE")]
    graph: PathBuf,

    /// Session script: a JSON array of steps
    #[arg(long, value_name = "FILE")]
    script: PathBuf,

    /// Layout configuration overrides
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Also render the visible diagram as SVG
    #[arg(long, value_name = "FILE")]
    svg: Option<PathBuf>,

    /// Where to write the diagram snapshot (stdout if omitted)
    #[arg(long, value_name = "FILE")]
    output: Option<PathBuf>,
}

fn read(path: &Path) -> Result<String> {
    fs::read_to_string(path).with_context(|| format!("failed to read {}", path.display()))
}

async fn layout(args: LayoutArgs) -> Result<()> {
    let config = match &args.config {
        Some(path) => LayoutConfig::from_json(&read(path)?)
            .with_context(|| format!("invalid layout config {}", path.display()))?,
        None => LayoutConfig::default(),
    };
    let graph = InMemoryGraph::from_json(&read(&args.graph)?)
        .with_context(|| format!("invalid graph {}", args.graph.display()))?;
    let steps = script::parse_script(&read(&args.script)?)
        .with_context(|| format!("invalid script {}", args.script.display()))?;
    info!(
        nodes = graph.nodes.len(),
        relationships = graph.relationships.len(),
        steps = steps.len(),
        "loaded session"
    );

    let session = DiagramSession::new(DiagramEngine::new(config), Arc::new(graph));
    script::replay(&session, &steps).await;
    session.settle().await;

    let engine = session.engine();
    let engine = engine.lock().await;

    let snapshot = serde_json::to_string_pretty(&engine.snapshot())?;
    match &args.output {
        Some(path) => fs::write(path, snapshot + "\n")
            .with_context(|| format!("failed to write {}", path.display()))?,
        None => {
            let mut stdout = std::io::stdout().lock();
            writeln!(stdout, "{snapshot}")?;
        }
    }

    if let Some(path) = &args.svg {
        fs::write(path, render_svg(&engine))
            .with_context(|| format!("failed to write {}", path.display()))?;
    }
    Ok(())
}

fn init_logging() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .or_else(|_| tracing_subscriber::EnvFilter::try_new("warn"))
        .context("failed to create log filter")?;

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .compact()
        .init();
    Ok(())
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging()?;

    match cli.command {
        Commands::Layout(args) => layout(args).await,
    }
}
