//! Article summaries: ordered AI providers with a local extractive fallback.

pub mod gemini;
pub mod local;
pub mod openai;

use async_trait::async_trait;
use metrics::counter;
use std::sync::Arc;

use crate::config::AiConfig;

pub use gemini::GeminiProvider;
pub use local::local_summary;
pub use openai::OpenAiProvider;

/// One remote summary strategy.
#[async_trait]
pub trait SummaryProvider: Send + Sync {
    async fn summarize(&self, prompt: &str) -> anyhow::Result<String>;
    /// Provider name for diagnostics/metrics.
    fn name(&self) -> &'static str;
}

pub type DynSummaryProvider = Arc<dyn SummaryProvider>;

/// Prompt sent to every provider.
pub fn build_prompt(title: &str, text: &str) -> String {
    format!(
        "Summarize the following news article into 3 concise bullet points. Make it easy to read. \n\nTitle: {title}\n\nContent: {text}"
    )
}

/// Tries each provider in order, first non-empty answer wins.
#[derive(Clone, Default)]
pub struct Summarizer {
    providers: Vec<DynSummaryProvider>,
}

impl Summarizer {
    pub fn new(providers: Vec<DynSummaryProvider>) -> Self {
        Self { providers }
    }

    /// Gemini first, then OpenAI; each only when its key is set.
    pub fn from_config(cfg: &AiConfig, http: reqwest::Client) -> Self {
        let mut providers: Vec<DynSummaryProvider> = Vec::new();
        if let Some(key) = &cfg.gemini_api_key {
            providers.push(Arc::new(GeminiProvider::new(
                http.clone(),
                key.clone(),
                &cfg.gemini_model,
            )));
        }
        if let Some(key) = &cfg.openai_api_key {
            providers.push(Arc::new(OpenAiProvider::new(
                http,
                key.clone(),
                &cfg.openai_model,
            )));
        }
        if providers.is_empty() {
            tracing::warn!("no AI provider configured (GEMINI_API_KEY / OPENAI_API_KEY); using local summaries");
        }
        Self { providers }
    }

    pub fn provider_names(&self) -> Vec<&'static str> {
        self.providers.iter().map(|p| p.name()).collect()
    }

    /// Never fails: falls back to [`local_summary`] when every provider does.
    pub async fn summarize(&self, title: &str, text: &str) -> String {
        let prompt = build_prompt(title, text);

        for provider in &self.providers {
            match provider.summarize(&prompt).await {
                Ok(out) if !out.trim().is_empty() => {
                    counter!("summary_provider_success_total", "provider" => provider.name())
                        .increment(1);
                    return out.trim().to_string();
                }
                Ok(_) => {
                    counter!("summary_provider_errors_total", "provider" => provider.name())
                        .increment(1);
                    tracing::warn!(provider = provider.name(), "AI provider returned an empty summary");
                }
                Err(e) => {
                    counter!("summary_provider_errors_total", "provider" => provider.name())
                        .increment(1);
                    tracing::warn!(provider = provider.name(), error = ?e, "AI provider failed, trying next");
                }
            }
        }

        counter!("summary_fallback_total").increment(1);
        local_summary(title, text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn prompt_embeds_title_and_content() {
        let p = build_prompt("Rates", "The Fed held.");
        assert!(p.starts_with("Summarize the following news article into 3 concise bullet points."));
        assert!(p.ends_with("Title: Rates\n\nContent: The Fed held."));
    }

    #[test]
    fn from_config_orders_gemini_before_openai() {
        let cfg = AiConfig {
            gemini_api_key: Some("g".into()),
            openai_api_key: Some("o".into()),
            ..AiConfig::default()
        };
        let s = Summarizer::from_config(&cfg, reqwest::Client::new());
        assert_eq!(s.provider_names(), vec!["gemini", "openai"]);

        let only_openai = AiConfig {
            openai_api_key: Some("o".into()),
            ..AiConfig::default()
        };
        let s = Summarizer::from_config(&only_openai, reqwest::Client::new());
        assert_eq!(s.provider_names(), vec!["openai"]);
    }
}
