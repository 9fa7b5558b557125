use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use quotebot_shared::{RoutingMode, YahooFinance};

use crate::client::ChatOptions;

pub const DEFAULT_QUESTION: &str = "Whats the price of AMZN?";

/// Every flag can also come from the environment or a `.env` file.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "quotebot",
    version,
    about = "Ask a local chat model a question and run the stock-price calls it requests"
)]
pub struct Config {
    /// Question to ask the model
    #[arg(default_value = DEFAULT_QUESTION)]
    pub question: String,

    /// Base URL of the OpenAI-compatible API
    #[arg(long, env = "QUOTEBOT_BASE_URL", default_value = "http://localhost:1234/v1")]
    pub base_url: String,

    #[arg(long, env = "QUOTEBOT_API_KEY", default_value = "not-needed", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, env = "QUOTEBOT_MODEL", default_value = "local-model")]
    pub model: String,

    #[arg(long, env = "QUOTEBOT_TEMPERATURE", default_value_t = 0.3)]
    pub temperature: f32,

    /// JSON array of function descriptions for the system prompt
    #[arg(long, env = "QUOTEBOT_FUNCTIONS")]
    pub functions: Option<PathBuf>,

    /// How to report calls to unregistered capabilities: strict or lenient
    #[arg(long, env = "QUOTEBOT_ROUTING", default_value_t = RoutingMode::Strict)]
    pub routing: RoutingMode,

    /// Request streamed completions; only the final answer is printed either way
    #[arg(long, env = "QUOTEBOT_STREAM")]
    pub stream: bool,

    /// Per-request timeout for the model and quote services
    #[arg(long, env = "QUOTEBOT_TIMEOUT_SECS")]
    pub timeout_secs: Option<u64>,

    #[arg(long, env = "QUOTEBOT_QUOTE_URL", default_value = YahooFinance::DEFAULT_BASE_URL)]
    pub quote_url: String,
}

impl Config {
    /// Loads `.env` if there is one, then parses the command line.
    pub fn load() -> Self {
        let _ = dotenvy::dotenv();
        Self::parse()
    }

    pub fn timeout(&self) -> Option<Duration> {
        self.timeout_secs.map(Duration::from_secs)
    }

    pub fn chat_options(&self) -> ChatOptions {
        ChatOptions {
            base_url: self.base_url.clone(),
            api_key: self.api_key.clone(),
            model: self.model.clone(),
            temperature: self.temperature,
            streaming: self.stream,
            timeout: self.timeout(),
        }
    }
}
