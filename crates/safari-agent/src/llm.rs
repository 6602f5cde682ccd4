//! Completion-provider abstraction.

use anyhow::Result;
use async_trait::async_trait;

/// One-shot chat completion expected to come back as JSON.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn chat_json(&self, system_prompt: &str, user_prompt: &str) -> Result<String>;

    fn model_name(&self) -> &str;
}
