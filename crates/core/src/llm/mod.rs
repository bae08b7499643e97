pub mod anthropic;
pub mod error;

#[derive(Debug, Clone)]
pub struct TextPrompt {
    pub system: String,
    pub user: String,
}

#[derive(Debug, Clone)]
pub enum Provider {
    Anthropic,
}

/// Free-text generation collaborator. The output is arbitrary prose; structure is recovered
/// downstream by the report extractor.
#[async_trait::async_trait]
pub trait TextGenerator: Send + Sync {
    fn provider(&self) -> Provider;

    async fn generate_text(&self, prompt: &TextPrompt) -> anyhow::Result<String>;
}
