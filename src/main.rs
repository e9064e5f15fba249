//! Command-line front end for the note recall engine.

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use notes_recall::memory::{
    IndexReport, RecallConfig, RecallEngine, SearchOptions, SearchResult, init_tracing,
};

/// Search an indexed note collection.
#[derive(Debug, Parser)]
#[command(name = "notes-recall", version, rename_all = "kebab")]
struct Args {
    /// JSON config file; falls back to `NOTES_RECALL_CONFIG`.
    #[arg(long, short = 'c', value_name = "FILE")]
    config: Option<PathBuf>,
    /// Print results as JSON.
    #[arg(long)]
    json: bool,
    /// Number of results.
    #[arg(long, short = 'k', value_name = "N", default_value_t = 0)]
    top_k: usize,
    /// Only notes in this domain.
    #[arg(long, value_name = "NAME")]
    domain: Option<String>,
    /// Only notes in this workstream.
    #[arg(long, value_name = "NAME")]
    workstream: Option<String>,
    /// Only notes carrying any of these tags.
    #[arg(long = "tag", value_name = "TAG")]
    tags: Vec<String>,
    /// Use the ranked full-text index instead of the hybrid flow.
    #[arg(long)]
    full_text: bool,
    /// Print index statistics and exit.
    #[arg(long, conflicts_with_all = ["refresh", "query"])]
    report: bool,
    /// Recompute stored confidence and exit.
    #[arg(long, conflicts_with = "query")]
    refresh: bool,
    /// Query words.
    #[arg(value_name = "QUERY", num_args = 0..)]
    query: Vec<String>,
}

fn main() -> ExitCode {
    init_tracing();
    match run(Args::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            tracing::error!("{err:#}");
            ExitCode::from(1)
        }
    }
}

fn run(args: Args) -> anyhow::Result<()> {
    let config = match &args.config {
        Some(path) => RecallConfig::from_file(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => RecallConfig::from_env().context("loading config from environment")?,
    };
    let engine = RecallEngine::from_config(config).context("opening note index")?;

    if args.report {
        return print_report(&engine.index_report()?, args.json);
    }

    if args.refresh {
        let stats = engine.refresh_confidence()?;
        println!("examined {} documents, updated {}", stats.examined, stats.updated);
        return Ok(());
    }

    let query = args.query.join(" ");
    let results = if args.full_text {
        engine.search_full_text(&query, args.top_k)?
    } else {
        let options = SearchOptions {
            top_k: args.top_k,
            domain: args.domain,
            workstream: args.workstream,
            tags: args.tags,
        };
        engine.search(&query, None, &options)?
    };

    print_results(&results, args.json)
}

fn print_results(results: &[SearchResult], json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(results)?);
        return Ok(());
    }

    if results.is_empty() {
        println!("no results");
        return Ok(());
    }

    for (rank, result) in results.iter().enumerate() {
        println!(
            "{:>2}. {:.3}  {}  [{}] {}",
            rank + 1,
            result.score,
            result.path,
            result.content_type,
            result.title
        );
        if !result.chunk_heading.is_empty() {
            println!("      § {}", result.chunk_heading);
        }
    }
    Ok(())
}

fn print_report(report: &IndexReport, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(report)?);
        return Ok(());
    }

    match report {
        IndexReport::NoData => println!("index is empty"),
        IndexReport::Report(stats) => {
            println!(
                "{} documents, {} chunks, {} vectors",
                stats.documents, stats.chunks, stats.vectors
            );
            for (kind, count) in &stats.by_content_type {
                println!("  {kind:<10} {count}");
            }
            println!(
                "modified range: {} .. {}",
                stats.oldest_modified, stats.newest_modified
            );
            println!("full-text index: {}", if stats.full_text { "yes" } else { "no" });
        }
    }
    Ok(())
}
