use anisort_cli::config::ConfigManager;
use anisort_cli::orchestrators::hash_orchestrator::hash_files;
use anisort_cli::orchestrators::sort_orchestrator::{SortOptions, SortOrchestrator};
use anisort_cli::terminal;
use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "anisort")]
#[command(author, version, about = "Identify anime video files on AniDB and sort them into a library", long_about = None)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    debug: bool,

    /// Configuration file to use instead of the default location
    #[arg(short, long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Disable progress bars
    #[arg(long, global = true)]
    no_progress: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify files via AniDB and move them into the library
    Sort {
        /// Files or directories to sort
        #[arg(required = true)]
        paths: Vec<PathBuf>,

        /// Descend into subdirectories
        #[arg(short, long)]
        recursive: bool,

        /// Copy files instead of moving them
        #[arg(long)]
        copy: bool,

        /// Go through every step without touching files or the database
        #[arg(long)]
        dry_run: bool,

        /// Library root, overrides pipeline.destination_root
        #[arg(short = 'o', long, value_name = "DIR")]
        destination: Option<PathBuf>,

        /// Glob patterns to skip, can be given multiple times
        #[arg(short = 'e', long = "exclude", value_name = "PATTERN")]
        exclude_patterns: Vec<String>,
    },

    /// Print the ed2k hash and size of files
    Hash {
        #[arg(required = true)]
        files: Vec<PathBuf>,

        /// Print ed2k links instead of plain hashes
        #[arg(long)]
        link: bool,
    },
}

fn init_logging(debug: bool) {
    if debug {
        env_logger::Builder::from_env(env_logger::Env::default())
            .filter_level(log::LevelFilter::Info)
            .filter_module("anisort_core", log::LevelFilter::Debug)
            .filter_module("anisort_cli", log::LevelFilter::Debug)
            .filter_module("anisort", log::LevelFilter::Debug)
            .format_timestamp_millis()
            .init();
        eprintln!("Debug logging enabled");
    } else {
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.debug);

    let show_progress = !cli.no_progress && terminal::should_show_progress();

    match cli.command {
        Commands::Sort {
            paths,
            recursive,
            copy,
            dry_run,
            destination,
            exclude_patterns,
        } => {
            let manager = match cli.config {
                Some(path) => ConfigManager::with_path(path),
                None => ConfigManager::new(),
            };
            log::debug!("Loading configuration from {}", manager.config_path().display());
            let config = manager.load().context("Failed to load configuration")?;

            let options = SortOptions {
                paths,
                recursive,
                copy,
                dry_run,
                destination,
                exclude_patterns,
                show_progress,
            };
            SortOrchestrator::new(config, options).run().await?;
        }
        Commands::Hash { files, link } => {
            hash_files(&files, link, show_progress).await?;
        }
    }

    Ok(())
}
