//! Command-line entry point for unwind.

use std::io::{self, Write};
use std::path::PathBuf;

use anyhow::{bail, Context};
use clap::Parser;
use tracing::warn;
use tracing_subscriber::EnvFilter;

use unwind_core::{
    call_graph_report, collect_cpp_sources, throw_site_reports, write_ast, write_call_graph,
    write_throw_report, write_throw_trees, CppFrontend, ProgramIndex, SpelledTypeMatcher,
    TranslationUnit,
};

#[derive(Parser, Debug)]
#[command(
    name = "unwind",
    version,
    about = "Report on a C++ program's call graph and exception propagation"
)]
struct Cli {
    /// Source file or directory to analyze (repeatable)
    #[arg(short, long, required = true)]
    input: Vec<PathBuf>,

    /// Dump the call graph
    #[arg(short = 'c', long)]
    call_graph: bool,

    /// Dump throw sites with their resolved propagation leaves
    #[arg(short = 't', long)]
    throw_trees: bool,

    /// With --throw-trees, also print the full propagation paths
    #[arg(long)]
    paths: bool,

    /// Dump the lowered AST (frontend debugging)
    #[arg(short = 'a', long)]
    ast: bool,

    /// Output format (text, json)
    #[arg(short, long, default_value = "text")]
    format: String,
}

fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    if !(cli.call_graph || cli.throw_trees || cli.ast) {
        bail!("select at least one report: --call-graph, --throw-trees, or --ast");
    }

    let mut files = Vec::new();
    for input in &cli.input {
        if input.is_dir() {
            files.extend(collect_cpp_sources(input));
        } else {
            files.push(input.clone());
        }
    }
    if files.is_empty() {
        bail!("no C++ sources found under the given inputs");
    }

    let mut frontend = CppFrontend::new().context("initializing the C++ frontend")?;
    let mut units: Vec<TranslationUnit> = Vec::new();
    for file in &files {
        match frontend.parse_file(file) {
            Ok(unit) => units.push(unit),
            Err(e) => warn!("skipping {}: {}", file.display(), e),
        }
    }

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.ast {
        for unit in &units {
            write_ast(&mut out, &unit.root)?;
        }
    }

    let mut index = ProgramIndex::new();
    let stats = index.index_units(&units);
    for error in &stats.errors {
        warn!("{error}");
    }

    let trees = cli
        .throw_trees
        .then(|| index.build_throw_trees(&SpelledTypeMatcher));

    match cli.format.as_str() {
        "text" => {
            if cli.call_graph {
                write_call_graph(&mut out, index.graph(), index.exceptions())?;
            }
            if let Some(trees) = &trees {
                write_throw_report(&mut out, trees)?;
                if cli.paths {
                    write_throw_trees(&mut out, trees)?;
                }
            }
        }
        "json" => {
            let mut doc = serde_json::Map::new();
            if cli.call_graph {
                doc.insert(
                    "call_graph".to_string(),
                    serde_json::to_value(call_graph_report(index.graph(), index.exceptions()))?,
                );
            }
            if let Some(trees) = &trees {
                doc.insert(
                    "throws".to_string(),
                    serde_json::to_value(throw_site_reports(trees))?,
                );
            }
            serde_json::to_writer_pretty(&mut out, &serde_json::Value::Object(doc))?;
            writeln!(out)?;
        }
        other => bail!("unknown format: {other}"),
    }

    Ok(())
}
