//! Environment-driven application configuration.
//!
//! All settings come from environment variables (a `.env` file is honored
//! by the binary before this runs). `GROQ_API_KEY` is the only required
//! value; everything else has a default.

use anyhow::{anyhow, bail, Context, Result};
use url::Url;

/// Model used when `MODEL_NAME` is not set.
pub const DEFAULT_MODEL: &str = "meta-llama/llama-4-scout-17b-16e-instruct";

/// Chat-completions base URL used when `API_BASE_URL` is not set.
pub const DEFAULT_API_BASE_URL: &str = "https://api.groq.com/openai/v1";

const DEFAULT_TEMPERATURE: f32 = 0.3;
const DEFAULT_MAX_COMPLETION_TOKENS: u32 = 1024;
const DEFAULT_PORT: u16 = 8000;

/// Application configuration.
#[derive(Debug, Clone)]
pub struct AppConfig {
    /// API key for the hosted model endpoint.
    pub api_key: String,
    /// Base URL of the OpenAI-compatible API.
    pub api_base_url: Url,
    /// Model identifier sent with each request.
    pub model_name: String,
    /// Sampling temperature for the analysis call.
    pub model_temperature: f32,
    /// Completion token cap for the analysis call.
    pub max_completion_tokens: u32,
    /// TCP port the web server binds to.
    pub port: u16,
}

impl AppConfig {
    /// Load configuration from process environment variables.
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let api_key = lookup("GROQ_API_KEY")
            .filter(|k| !k.trim().is_empty())
            .ok_or_else(|| anyhow!("GROQ_API_KEY environment variable is required"))?;

        let api_base_url = lookup("API_BASE_URL")
            .unwrap_or_else(|| DEFAULT_API_BASE_URL.to_string());
        let api_base_url = Url::parse(api_base_url.trim_end_matches('/'))
            .with_context(|| format!("API_BASE_URL is not a valid URL: {}", api_base_url))?;
        if api_base_url.cannot_be_a_base() {
            bail!("API_BASE_URL is not a valid HTTP URL: {}", api_base_url);
        }

        let model_name = lookup("MODEL_NAME").unwrap_or_else(|| DEFAULT_MODEL.to_string());

        let model_temperature = match lookup("MODEL_TEMPERATURE") {
            Some(raw) => raw
                .parse::<f32>()
                .with_context(|| format!("MODEL_TEMPERATURE is not a number: {}", raw))?,
            None => DEFAULT_TEMPERATURE,
        };

        let max_completion_tokens = match lookup("MAX_COMPLETION_TOKENS") {
            Some(raw) => raw
                .parse::<u32>()
                .with_context(|| format!("MAX_COMPLETION_TOKENS is not a number: {}", raw))?,
            None => DEFAULT_MAX_COMPLETION_TOKENS,
        };

        let port = match lookup("LEAFSCAN_PORT") {
            Some(raw) => raw
                .parse::<u16>()
                .with_context(|| format!("LEAFSCAN_PORT is not a port number: {}", raw))?,
            None => DEFAULT_PORT,
        };

        Ok(Self {
            api_key,
            api_base_url,
            model_name,
            model_temperature,
            max_completion_tokens,
            port,
        })
    }
}
