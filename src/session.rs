//! Retrieve, augment, generate: the chat loop split into callable steps.

use std::fmt;
use std::io::{BufRead, Write};
use std::path::Path;

use tracing::{info, warn};

use crate::completion::CompletionClient;
use crate::config::RagSettings;
use crate::conversation::{Conversation, Message};
use crate::embedder::EmbeddingGateway;
use crate::error::{RagError, Result};
use crate::processor::{IngestReport, RetrievalContext, TextProcessor};
use crate::prompt::{augment, SYSTEM_PROMPT};
use crate::vector_store::VectorStore;

const RULE: &str = "====================================================================================================";

/// Everything produced while answering one question.
#[derive(Debug, Clone, PartialEq)]
pub struct Answer {
    /// Chunks that passed retrieval.
    pub context: RetrievalContext,
    /// Augmented user prompt sent to the model.
    pub prompt: String,
    /// Model reply, also appended to the conversation.
    pub message: Message,
}

/// Conversation state plus the collaborators needed to answer questions.
pub struct ChatSession<G, S, C> {
    processor: TextProcessor<G, S>,
    completion: C,
    settings: RagSettings,
    conversation: Conversation,
}

impl<G, S, C> ChatSession<G, S, C>
where
    G: EmbeddingGateway,
    S: VectorStore,
    C: CompletionClient,
{
    /// Starts a conversation seeded with [`SYSTEM_PROMPT`].
    pub fn new(processor: TextProcessor<G, S>, completion: C, settings: RagSettings) -> Self {
        let mut conversation = Conversation::new();
        conversation.push(Message::system(SYSTEM_PROMPT));
        Self {
            processor,
            completion,
            settings,
            conversation,
        }
    }

    /// History so far, system prompt first.
    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Settings used for ingestion and retrieval.
    pub fn settings(&self) -> &RagSettings {
        &self.settings
    }

    /// Underlying processor.
    pub fn processor(&self) -> &TextProcessor<G, S> {
        &self.processor
    }

    /// Chunks, embeds and stores the document at `path`.
    pub fn ingest_file(&mut self, path: &Path) -> Result<IngestReport> {
        let params = self.settings.ingest_params();
        self.processor.process_text_file(path, &params)
    }

    /// Retrieves context for `query` without touching the conversation.
    pub fn retrieve(&self, query: &str) -> Result<RetrievalContext> {
        self.processor.search(query, &self.settings.search_params())
    }

    /// Retrieves context, asks the model and records both turns.
    ///
    /// When generation fails the user turn is withdrawn so the history
    /// keeps alternating between user and assistant.
    pub fn answer(&mut self, query: &str) -> Result<Answer> {
        let context = self.retrieve(query)?;
        let prompt = augment(&context.render(), query);
        self.conversation.push(Message::user(prompt.clone()));
        match self.completion.get_completion(self.conversation.messages()) {
            Ok(message) => {
                self.conversation.push(message.clone());
                info!(
                    chunks = context.len(),
                    turns = self.conversation.len(),
                    "answered question"
                );
                Ok(Answer {
                    context,
                    prompt,
                    message,
                })
            }
            Err(err) => {
                self.conversation.pop();
                Err(err)
            }
        }
    }

    /// Interactive driver: optional ingestion of `document`, then one answer per line.
    ///
    /// `quit`, `exit` or end of input stop the loop. Failed operations are
    /// reported on `output` and the loop carries on; only write failures on
    /// `output` end it early.
    pub fn run<R, W>(&mut self, document: &Path, mut input: R, mut output: W) -> Result<()>
    where
        R: BufRead,
        W: Write,
    {
        emit(&mut output, format_args!("RAG assistant: {}\n{RULE}\n", document.display()))?;
        emit(&mut output, format_args!("\nLoad context to VectorDB (y/n)? > "))?;
        let Some(reply) = read_line(&mut input)? else {
            return Ok(());
        };
        if matches!(reply.to_lowercase().as_str(), "y" | "yes") {
            match self.ingest_file(document) {
                Ok(report) => emit(
                    &mut output,
                    format_args!(
                        "Stored {} chunks in {} request(s)\n{RULE}\n",
                        report.stored, report.requests
                    ),
                )?,
                Err(err) => {
                    warn!(error = %err, "ingestion failed");
                    emit(&mut output, format_args!("Ingestion failed: {err}\n"))?;
                }
            }
        }

        loop {
            emit(&mut output, format_args!("\n> "))?;
            let Some(query) = read_line(&mut input)? else {
                break;
            };
            if matches!(query.to_lowercase().as_str(), "quit" | "exit") {
                emit(&mut output, format_args!("Goodbye\n"))?;
                break;
            }
            if query.is_empty() {
                continue;
            }
            match self.answer(&query) {
                Ok(answer) => {
                    emit(
                        &mut output,
                        format_args!(
                            "{RULE}\nSTEP 1: RETRIEVAL\n{} chunk(s) passed the {} threshold\n",
                            answer.context.len(),
                            self.settings.search_mode()
                        ),
                    )?;
                    emit(
                        &mut output,
                        format_args!("{RULE}\nSTEP 2: AUGMENTATION\nPrompt:\n{}\n", answer.prompt),
                    )?;
                    emit(
                        &mut output,
                        format_args!(
                            "{RULE}\nSTEP 3: GENERATION\nRESPONSE:\n{}\n{RULE}\n",
                            answer.message.content
                        ),
                    )?;
                }
                Err(err) => {
                    warn!(error = %err, "question failed");
                    emit(&mut output, format_args!("Error: {err}\n"))?;
                }
            }
        }
        Ok(())
    }
}

fn emit<W: Write>(output: &mut W, args: fmt::Arguments<'_>) -> Result<()> {
    output
        .write_fmt(args)
        .and_then(|()| output.flush())
        .map_err(RagError::io("failed to write to output"))
}

/// Next trimmed line, or `None` at end of input.
fn read_line<R: BufRead>(input: &mut R) -> Result<Option<String>> {
    let mut line = String::new();
    let read = input
        .read_line(&mut line)
        .map_err(RagError::io("failed to read input"))?;
    Ok((read > 0).then(|| line.trim().to_string()))
}
