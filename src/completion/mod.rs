//! Chat-completion clients used for the generation step.

pub mod dial;

use crate::conversation::Message;
use crate::error::Result;

pub use dial::DialCompletionClient;

/// Model that turns a conversation into the next assistant message.
pub trait CompletionClient {
    /// Sends the full history and returns the reply.
    fn get_completion(&self, messages: &[Message]) -> Result<Message>;
}

impl<C: CompletionClient + ?Sized> CompletionClient for &C {
    fn get_completion(&self, messages: &[Message]) -> Result<Message> {
        (**self).get_completion(messages)
    }
}

impl<C: CompletionClient + ?Sized> CompletionClient for Box<C> {
    fn get_completion(&self, messages: &[Message]) -> Result<Message> {
        (**self).get_completion(messages)
    }
}
