use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use ragloop::logging::init_logging;
use ragloop::{ChatSession, PgVectorStore, RagArgs, TextProcessor};

#[derive(Parser, Debug)]
#[command(
    name = "rag-query",
    about = "Answer one question from the pgvector chunk store"
)]
struct QueryCli {
    #[command(flatten)]
    rag: RagArgs,

    /// Question to answer
    #[arg(long)]
    query: String,

    /// Ingest this document before answering
    #[arg(long)]
    ingest: Option<PathBuf>,

    /// Drop and re-create the vector table before ingesting or querying
    #[arg(long, default_value_t = false)]
    reset_store: bool,

    /// Only print the retrieved context (skip the completion call)
    #[arg(long, default_value_t = false)]
    dry_run: bool,
}

fn main() -> Result<()> {
    let cli = QueryCli::parse();
    init_logging(&cli.rag.log_filter);

    if cli.query.trim().is_empty() {
        bail!("--query must not be empty");
    }
    let settings = cli.rag.build_settings()?;
    let embedder = cli.rag.embedder()?;
    let completion = cli.rag.completion_client()?;
    let store_config = cli.rag.store_config();
    let store = if cli.reset_store {
        PgVectorStore::connect_fresh(&store_config, settings.dimensions())
    } else {
        PgVectorStore::connect(&store_config, settings.dimensions())
    }
    .context("failed to open vector store")?;

    let processor = TextProcessor::new(embedder, store);
    let mut session = ChatSession::new(processor, completion, settings);

    if let Some(path) = &cli.ingest {
        let report = session
            .ingest_file(path)
            .with_context(|| format!("failed to ingest {}", path.display()))?;
        println!(
            "Stored {} chunks from {} in {} request(s)",
            report.stored,
            path.display(),
            report.requests
        );
    }

    if cli.dry_run {
        let context = session.retrieve(&cli.query).context("retrieval failed")?;
        println!("--- Retrieved Context ({} chunks) ---", context.len());
        for result in context.results() {
            println!("[{:.4}] {}", result.score, result.document.text.trim());
        }
        println!("dry-run enabled; skipping completion call.");
        return Ok(());
    }

    let answer = session.answer(&cli.query).context("failed to answer question")?;
    println!(
        "--- Retrieved Context ({} chunks) ---\n{}\n",
        answer.context.len(),
        answer.context.render()
    );
    println!("--- Answer ---\n{}", answer.message.content);
    Ok(())
}
