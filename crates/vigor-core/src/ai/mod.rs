//! AI text-completion capability.
//!
//! The generator only needs one operation: send a prompt, get raw text back.
//! [`Completer`] captures that; concrete adapters wrap a hosted API
//! ([`GeminiCompleter`]) or a local CLI ([`CommandCompleter`]).
//!
//! ```text
//! ScheduleGenerator
//!     |
//!     v
//! Option<Arc<dyn Completer>> --complete(prompt)--> raw text
//!     |                                              |
//!     | None: no credential, use fallback            v
//!     |                                   strip fence -> parse -> validate
//! ```

pub mod command;
pub mod gemini;

use anyhow::Result;
use async_trait::async_trait;

pub use command::CommandCompleter;
pub use gemini::GeminiCompleter;

/// A text-completion backend.
///
/// Object safe, so generators hold it as `Arc<dyn Completer>` and tests can
/// substitute a deterministic fake.
#[async_trait]
pub trait Completer: Send + Sync {
    /// Short backend name for logs (e.g. "gemini").
    fn name(&self) -> &str;

    /// Send `prompt` and return the raw response text.
    ///
    /// Errors cover transport failures, non-success responses, and responses
    /// with no text.
    async fn complete(&self, prompt: &str) -> Result<String>;
}

// Compile-time assertion: Completer must be object-safe.
const _: () = {
    fn _assert_object_safe(_: &dyn Completer) {}
};

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    struct EchoCompleter;

    #[async_trait]
    impl Completer for EchoCompleter {
        fn name(&self) -> &str {
            "echo"
        }

        async fn complete(&self, prompt: &str) -> Result<String> {
            Ok(prompt.to_uppercase())
        }
    }

    #[tokio::test]
    async fn completer_usable_as_trait_object() {
        let completer: Arc<dyn Completer> = Arc::new(EchoCompleter);
        assert_eq!(completer.name(), "echo");
        assert_eq!(completer.complete("hi").await.unwrap(), "HI");
    }
}
