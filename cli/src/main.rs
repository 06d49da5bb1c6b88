use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use hoopla_core::corpus::{load_movies, titles_by_id};
use hoopla_core::query::{search_corpus, search_index};
use hoopla_core::{DocId, InvertedIndex, Normalizer, SnapshotPaths, StopWords};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use tracing_subscriber::{fmt, EnvFilter};

#[derive(Parser)]
#[command(name = "hoopla")]
#[command(about = "Keyword search over a movie corpus", long_about = None)]
struct Cli {
    /// Movie corpus, a JSON object with a "movies" array
    #[arg(long, global = true, default_value = "data/movies.json")]
    movies: PathBuf,
    /// Stop-word list, one word per line
    #[arg(long, global = true, default_value = "data/stopwords.txt")]
    stopwords: PathBuf,
    /// Directory holding the index snapshot
    #[arg(long, global = true, default_value = "cache")]
    cache: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Build the inverted index and save the snapshot
    Build,
    /// Search movies by keyword
    Search {
        query: String,
        /// Match against the saved index or scan movie titles directly
        #[arg(long, value_enum, default_value_t = Mode::Index)]
        mode: Mode,
        /// Maximum number of results to print
        #[arg(long, default_value_t = 5)]
        limit: usize,
    },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
enum Mode {
    Index,
    Corpus,
}

fn main() -> Result<()> {
    fmt().with_env_filter(EnvFilter::from_default_env()).init();
    let cli = Cli::parse();

    let stop_words = StopWords::load(&cli.stopwords)?;
    let normalizer = Normalizer::english(stop_words);
    let paths = SnapshotPaths::new(&cli.cache);

    match cli.command {
        Commands::Build => build(&cli.movies, &normalizer, &paths),
        Commands::Search { query, mode, limit } => search(&cli.movies, &normalizer, &paths, &query, mode, limit),
    }
}

fn build(movies: &Path, normalizer: &Normalizer, paths: &SnapshotPaths) -> Result<()> {
    println!("Building index");
    let corpus = load_movies(movies)?;
    let mut index = InvertedIndex::new();
    index.build(normalizer, &corpus);
    index.save(paths).context("saving index snapshot")?;
    tracing::info!(snapshot = %paths.snapshot().display(), "index build complete");
    Ok(())
}

fn search(movies: &Path, normalizer: &Normalizer, paths: &SnapshotPaths, query: &str, mode: Mode, limit: usize) -> Result<()> {
    println!("Searching for: {query}");
    let corpus = load_movies(movies)?;
    let doc_ids: Vec<DocId> = match mode {
        Mode::Index => {
            let mut index = InvertedIndex::new();
            index.load(paths).context("loading index snapshot; run `hoopla build` first")?;
            search_index(normalizer, &index, query)
        }
        Mode::Corpus => search_corpus(normalizer, &corpus, query).into_iter().map(|d| d.id).collect(),
    };
    for line in render_hits(&doc_ids, &titles_by_id(&corpus), limit) {
        println!("{line}");
    }
    Ok(())
}

fn render_hits(doc_ids: &[DocId], titles: &HashMap<DocId, &str>, limit: usize) -> Vec<String> {
    doc_ids
        .iter()
        .take(limit)
        .map(|id| format!("{id}, title: {}", titles.get(id).copied().unwrap_or("<unknown>")))
        .collect()
}
