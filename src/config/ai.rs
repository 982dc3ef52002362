// src/config/ai.rs
use serde::{Deserialize, Serialize};

fn default_gemini_model() -> String {
    "gemini-1.5-flash".to_string()
}
fn default_openai_model() -> String {
    "gpt-3.5-turbo".to_string()
}

/// Credentials and model names for the summary providers.
///
/// A provider takes part in the summary chain only when its key is set.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AiConfig {
    #[serde(default)]
    pub gemini_api_key: Option<String>,
    #[serde(default = "default_gemini_model")]
    pub gemini_model: String,
    #[serde(default)]
    pub openai_api_key: Option<String>,
    #[serde(default = "default_openai_model")]
    pub openai_model: String,
}

impl Default for AiConfig {
    fn default() -> Self {
        Self {
            gemini_api_key: None,
            gemini_model: default_gemini_model(),
            openai_api_key: None,
            openai_model: default_openai_model(),
        }
    }
}

impl AiConfig {
    pub(crate) fn apply_env(&mut self) {
        if let Some(v) = super::env_string("GEMINI_API_KEY") {
            self.gemini_api_key = Some(v);
        }
        if let Some(v) = super::env_string("GEMINI_MODEL") {
            self.gemini_model = v;
        }
        if let Some(v) = super::env_string("OPENAI_API_KEY") {
            self.openai_api_key = Some(v);
        }
        if let Some(v) = super::env_string("OPENAI_MODEL") {
            self.openai_model = v;
        }

        // Blank keys from a config file count as "not configured".
        self.gemini_api_key = self.gemini_api_key.take().filter(|k| !k.trim().is_empty());
        self.openai_api_key = self.openai_api_key.take().filter(|k| !k.trim().is_empty());
    }
}
