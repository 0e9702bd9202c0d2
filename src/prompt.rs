//! Prompt templates for the answering model.

/// Instructions seeded as the first message of every conversation.
pub const SYSTEM_PROMPT: &str = "
You are a RAG powered assistant

## Structure of user message:
`RAG CONTEXT` - Retrieved documents relevant to the query.
`USER QUESTION` - The user's actual question.

## Instructions
- use information from the 'RAG CONTEXT' as a context when answering the `USER QUESTION`
- Cite particular sources whenever referencing information from the context.
- Answer ONLY based on RAG context or conversation history.
- If no relevant information exists in `RAG CONTEXT` or conversation history, state that you cannot answer the question.
";

/// Renders the user turn: retrieved chunks (blank-line separated) followed by the question.
pub fn augment(context: &str, query: &str) -> String {
    format!("\n##RAG CONTEXT:\n{context}\n\n##USER QUESTION: \n{query}\n")
}
