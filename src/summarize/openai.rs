// src/summarize/openai.rs
use anyhow::{anyhow, Context};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use super::SummaryProvider;

const CHAT_COMPLETIONS_URL: &str = "https://api.openai.com/v1/chat/completions";

/// OpenAI provider (Chat Completions API).
pub struct OpenAiProvider {
    http: reqwest::Client,
    api_key: String,
    model: String,
    endpoint: String,
}

impl OpenAiProvider {
    pub fn new(http: reqwest::Client, api_key: String, model: &str) -> Self {
        Self {
            http,
            api_key,
            model: model.to_string(),
            endpoint: CHAT_COMPLETIONS_URL.to_string(),
        }
    }

    pub fn with_endpoint(mut self, endpoint: &str) -> Self {
        self.endpoint = endpoint.to_string();
        self
    }
}

#[derive(Serialize)]
struct Msg<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Serialize)]
struct Req<'a> {
    model: &'a str,
    messages: Vec<Msg<'a>>,
    max_tokens: u32,
}

#[derive(Deserialize)]
struct Resp {
    #[serde(default)]
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    #[serde(default)]
    message: Option<ChoiceMsg>,
    // Legacy completions shape.
    #[serde(default)]
    text: Option<String>,
}

#[derive(Deserialize)]
struct ChoiceMsg {
    #[serde(default)]
    content: Option<String>,
}

fn first_choice_text(body: Resp) -> String {
    body.choices
        .into_iter()
        .next()
        .and_then(|c| c.message.and_then(|m| m.content).or(c.text))
        .unwrap_or_default()
}

#[async_trait]
impl SummaryProvider for OpenAiProvider {
    async fn summarize(&self, prompt: &str) -> anyhow::Result<String> {
        let req = Req {
            model: &self.model,
            messages: vec![Msg {
                role: "user",
                content: prompt,
            }],
            max_tokens: 200,
        };

        let resp = self
            .http
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&req)
            .send()
            .await
            .context("openai request")?;

        let status = resp.status();
        if !status.is_success() {
            return Err(anyhow!("openai HTTP {status}"));
        }
        let body: Resp = resp.json().await.context("openai response body")?;
        Ok(first_choice_text(body))
    }

    fn name(&self) -> &'static str {
        "openai"
    }
}
