use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use clap::{Parser, ValueEnum};

use cardio_chat::core::config::{AppPaths, ConfigService, SplitMode};
use cardio_chat::core::logging::{self, LogTarget};
use cardio_chat::state::AppState;

#[derive(Parser)]
#[command(name = "cardio-ingest")]
#[command(about = "Embed the cardiology corpus and upsert it into the vector index")]
#[command(version)]
struct Cli {
    /// Corpus text file (defaults to `ingest.corpus_path` from the config)
    #[arg(long)]
    corpus: Option<PathBuf>,
    /// How the corpus is cut into records (defaults to `ingest.split`)
    #[arg(long, value_enum)]
    split: Option<SplitArg>,
}

#[derive(Clone, Copy, ValueEnum)]
enum SplitArg {
    /// The whole file becomes one record
    Whole,
    /// One record per blank-line separated paragraph
    Paragraph,
}

impl From<SplitArg> for SplitMode {
    fn from(arg: SplitArg) -> Self {
        match arg {
            SplitArg::Whole => SplitMode::Whole,
            SplitArg::Paragraph => SplitMode::Paragraph,
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    let _ = dotenvy::dotenv();

    let paths = Arc::new(AppPaths::new());
    logging::init(&paths, LogTarget::Ingest).context("Failed to install logging")?;

    let config_service = ConfigService::new(paths.clone());
    let state = AppState::initialize(&config_service).context("Failed to initialize ingestion")?;

    let missing = state.config.missing_ingest_keys();
    if !missing.is_empty() {
        for key in &missing {
            tracing::error!(key, "Required credential is not configured");
        }
        anyhow::bail!("missing credentials: {}", missing.join(", "));
    }

    let corpus = cli
        .corpus
        .unwrap_or_else(|| PathBuf::from(&state.config.ingest.corpus_path));
    let corpus = if corpus.is_relative() && !corpus.exists() {
        paths.project_root.join(corpus)
    } else {
        corpus
    };
    let split = cli.split.map(SplitMode::from).unwrap_or(state.config.ingest.split);

    let (index, report) = state
        .ingest_corpus_file(&corpus, split)
        .await
        .context("Corpus ingestion failed")?;

    if report.batches_failed > 0 {
        tracing::warn!(
            failed = report.batches_failed,
            of = report.batches_total,
            skipped = report.chunks_skipped,
            "Some batches were not ingested"
        );
    }
    if report.chunks_written == 0 {
        anyhow::bail!("no records were written to index '{}'", index.name);
    }

    tracing::info!(written = report.chunks_written, "Ingestion complete");
    Ok(())
}
