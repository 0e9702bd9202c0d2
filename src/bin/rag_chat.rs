use std::io;
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use ragloop::logging::init_logging;
use ragloop::{ChatSession, PgVectorStore, RagArgs, TextProcessor};

#[derive(Parser, Debug)]
#[command(
    name = "rag-chat",
    about = "Interactive question answering over a document indexed in pgvector"
)]
struct ChatCli {
    #[command(flatten)]
    rag: RagArgs,

    /// Text document offered for ingestion at start-up
    #[arg(long, env = "RAG_DOCUMENT", default_value = "microwave_manual.txt")]
    document: PathBuf,

    /// Drop and re-create the vector table before starting
    #[arg(long, default_value_t = false)]
    reset_store: bool,
}

fn main() -> Result<()> {
    let cli = ChatCli::parse();
    init_logging(&cli.rag.log_filter);

    let settings = cli.rag.build_settings()?;
    let embedder = cli.rag.embedder()?;
    let completion = cli.rag.completion_client()?;
    let store_config = cli.rag.store_config();
    let store = if cli.reset_store {
        PgVectorStore::connect_fresh(&store_config, settings.dimensions())
    } else {
        PgVectorStore::connect(&store_config, settings.dimensions())
    }
    .with_context(|| {
        format!(
            "failed to open vector store {}:{}/{}",
            store_config.host, store_config.port, store_config.database
        )
    })?;

    let processor = TextProcessor::new(embedder, store);
    let mut session = ChatSession::new(processor, completion, settings);
    let stdin = io::stdin();
    session
        .run(&cli.document, stdin.lock(), io::stdout())
        .context("chat loop aborted")?;
    Ok(())
}
