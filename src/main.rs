//! folders - build a directory tree in memory and consume it in parallel.
//!
//! Usage:
//!   folders count [PATH]            Count folders, documents and bytes
//!   folders search PATH NEEDLE      List documents containing NEEDLE
//!   folders print [PATH]            Print every entry in traversal order
//!   folders export [PATH]           Export the tree to JSON
//!   folders --help                  Show help

use std::path::{Path, PathBuf};
use std::time::Instant;

use clap::{Args, Parser, Subcommand, ValueEnum};
use color_eyre::eyre::{Context, Result};
use rayon::prelude::*;
use tracing_subscriber::EnvFilter;

use folders_build::{BuildConfig, LocalStorage, TreeBuilder};
use folders_core::{Entry, Folder, SplitStrategy, TraversalConfig, TreeStats};

#[derive(Parser)]
#[command(
    name = "folders",
    version,
    about = "Build a directory tree in memory and consume it in parallel",
    long_about = "folders reads a whole directory tree, every file included, into memory \
                  and then walks it sequentially or split across worker threads."
)]
struct Cli {
    /// Log progress and splitting decisions
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(flatten)]
    build: BuildArgs,

    #[command(subcommand)]
    command: Command,
}

#[derive(Args)]
struct BuildArgs {
    /// Skip hidden files and folders
    #[arg(long, global = true)]
    exclude_hidden: bool,

    /// Glob pattern of names to skip (repeatable)
    #[arg(long = "ignore", global = true)]
    ignore_patterns: Vec<String>,

    /// Follow symbolic links below the root (skipped by default)
    #[arg(long, global = true)]
    follow_symlinks: bool,

    /// Maximum number of files read at the same time
    #[arg(long, global = true, default_value = "64")]
    max_open_files: usize,
}

#[derive(Args)]
struct TraversalArgs {
    /// How the tree is divided between workers
    #[arg(short, long, default_value = "binary")]
    strategy: StrategyArg,

    /// Number of worker threads (0 = one per CPU)
    #[arg(short = 'j', long, default_value = "0")]
    threads: usize,
}

#[derive(Subcommand)]
enum Command {
    /// Count folders, documents and content bytes
    Count {
        /// Path to read
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Traverse on a single thread
        #[arg(long)]
        sequential: bool,

        #[command(flatten)]
        traversal: TraversalArgs,
    },

    /// List documents whose contents contain a string
    Search {
        /// Path to read
        path: PathBuf,

        /// Text to look for
        needle: String,

        #[command(flatten)]
        traversal: TraversalArgs,
    },

    /// Print every entry in traversal order
    Print {
        /// Path to read
        #[arg(default_value = ".")]
        path: PathBuf,
    },

    /// Export the tree to JSON
    Export {
        /// Path to read
        #[arg(default_value = ".")]
        path: PathBuf,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
}

#[derive(Debug, Clone, Copy, ValueEnum, Default)]
enum StrategyArg {
    #[default]
    Binary,
    Batch,
}

impl From<StrategyArg> for SplitStrategy {
    fn from(arg: StrategyArg) -> Self {
        match arg {
            StrategyArg::Binary => SplitStrategy::Binary,
            StrategyArg::Batch => SplitStrategy::Batch,
        }
    }
}

impl TraversalArgs {
    fn config(&self) -> Result<TraversalConfig> {
        if self.threads > 0 {
            rayon::ThreadPoolBuilder::new()
                .num_threads(self.threads)
                .build_global()
                .context("Failed to configure worker threads")?;
        }
        Ok(TraversalConfig {
            parallelism: self.threads,
            strategy: self.strategy.into(),
        })
    }
}

fn main() -> Result<()> {
    color_eyre::install()?;

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Count {
            path,
            sequential,
            traversal,
        } => {
            let config = traversal.config()?;
            let root = build(&path, &cli.build, cli.verbose)?;
            run_count(&root, &config, sequential);
        }
        Command::Search {
            path,
            needle,
            traversal,
        } => {
            let config = traversal.config()?;
            let root = build(&path, &cli.build, cli.verbose)?;
            run_search(&root, &config, &needle);
        }
        Command::Print { path } => {
            let root = build(&path, &cli.build, cli.verbose)?;
            run_print(&root);
        }
        Command::Export { path, output } => {
            let root = build(&path, &cli.build, cli.verbose)?;
            run_export(&root, output)?;
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose { "info" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Read the whole tree below `path` into memory.
///
/// With `verbose`, build progress is reported on stderr.
fn build(path: &Path, args: &BuildArgs, verbose: bool) -> Result<Folder> {
    let path = path.canonicalize().context("Invalid path")?;

    eprintln!("Reading {}...", path.display());

    let config = BuildConfig::builder()
        .root(&path)
        .include_hidden(!args.exclude_hidden)
        .follow_symlinks(args.follow_symlinks)
        .ignore_patterns(args.ignore_patterns.clone())
        .max_open_files(args.max_open_files)
        .build()
        .context("Invalid build configuration")?;

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start runtime")?;
    let builder = TreeBuilder::new(LocalStorage::new(), config)?;

    let progress_task = verbose.then(|| {
        let mut progress_rx = builder.subscribe();
        runtime.spawn(async move {
            while let Ok(progress) = progress_rx.recv().await {
                eprintln!(
                    "  {} items, {} read ({:.0} documents/s, {}/s)",
                    progress.total_items(),
                    format_size(progress.bytes_read),
                    progress.documents_per_second(),
                    format_size(progress.bytes_per_second() as u64),
                );
            }
        })
    });

    let result = runtime.block_on(builder.build());
    // Closing the channel lets the reporter drain and finish.
    drop(builder);
    if let Some(task) = progress_task {
        let _ = runtime.block_on(task);
    }
    let root = result.context("Build failed")?;
    Ok(root)
}

/// Count entries and summarize.
fn run_count(root: &Folder, config: &TraversalConfig, sequential: bool) {
    let start = Instant::now();
    let stats = if sequential {
        TreeStats::collect(root.entries(config))
    } else {
        TreeStats::par_collect(root.par_entries(config))
    };
    let elapsed = start.elapsed();

    println!();
    println!("{}", "─".repeat(60));
    println!("{}", summary(root, &stats));
    println!(" Traversed in {:.3}s", elapsed.as_secs_f64());
    println!("{}", "─".repeat(60));
}

/// Summary lines for `count`.
fn summary(root: &Folder, stats: &TreeStats) -> String {
    let mut lines = vec![
        format!(
            " {} - {} (size {})",
            root.path().display(),
            format_size(stats.content_bytes),
            root.size()
        ),
        format!(" {} documents, {} folders", stats.documents, stats.folders),
    ];
    if let Some((path, bytes)) = &stats.largest_document {
        lines.push(format!(" Largest: {} ({})", path.display(), format_size(*bytes)));
    }
    lines.join("\n")
}

/// Print documents containing `needle`.
fn run_search(root: &Folder, config: &TraversalConfig, needle: &str) {
    let mut matches: Vec<&Path> = root
        .par_entries(config)
        .filter_map(|entry| entry.as_document())
        .filter(|doc| doc.text().contains(needle))
        .map(|doc| doc.path())
        .collect();
    matches.sort();

    for path in &matches {
        println!("{}", path.display());
    }
    eprintln!("{} matching document(s)", matches.len());
}

/// Print every entry, folders marked with a trailing slash.
fn run_print(root: &Folder) {
    for entry in root {
        match entry {
            Entry::Folder(folder) => println!("{}/", folder.path().display()),
            Entry::Document(doc) => println!("{}", doc.path().display()),
        }
    }
}

/// Export the tree to JSON.
fn run_export(root: &Folder, output: Option<PathBuf>) -> Result<()> {
    let json = serde_json::to_string_pretty(root)?;

    match output {
        Some(output_path) => {
            std::fs::write(&output_path, json)?;
            eprintln!("Exported to {}", output_path.display());
        }
        None => {
            println!("{}", json);
        }
    }

    Ok(())
}

/// Format size in human-readable form.
fn format_size(bytes: u64) -> String {
    humansize::format_size(bytes, humansize::BINARY)
}
