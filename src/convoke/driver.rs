//! The LLM transport contract consumed by [`crate::convoke::bot::Bot`].
//!
//! `Driver` is an external collaborator: this crate only consumes the
//! `Chat`/`StreamChat` contract, it never constructs a concrete driver.
//! Callers supply an `Arc<dyn Driver>` backed by whatever transport they
//! already depend on.

use crate::convoke::message::Message;
use async_trait::async_trait;
use std::error::Error;

/// One chunk of a streamed reply, handed to the caller-supplied handler.
pub type StreamHandler = Box<dyn FnMut(String) + Send>;

/// The minimal LLM transport contract this crate consumes.
#[async_trait]
pub trait Driver: Send + Sync {
    /// Sends `messages` and returns the trimmed, concatenated content of the
    /// primary choice. Empty content must surface as an error (the agent
    /// treats it as "empty reply"), not as `Ok("")`.
    async fn chat(&self, messages: &[Message]) -> Result<String, Box<dyn Error + Send + Sync>>;

    /// Streams a reply, invoking `handler` with each chunk as it arrives.
    async fn stream_chat(
        &self,
        messages: &[Message],
        handler: StreamHandler,
    ) -> Result<(), Box<dyn Error + Send + Sync>>;
}
