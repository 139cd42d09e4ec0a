//! Text generation. The engine treats generation as an opaque collaborator
//! behind [`TextGenerator`]; the one production implementation speaks the
//! OpenAI-compatible chat completions API.

mod compatible;

pub use compatible::OpenAiCompatibleGenerator;

use async_trait::async_trait;

#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Turn a prompt into response text. Suspends the calling cycle; no
    /// latency bound beyond the HTTP client's timeout.
    async fn generate(&self, prompt: &str) -> anyhow::Result<String>;
}
