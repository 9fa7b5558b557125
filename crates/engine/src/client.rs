use std::time::Duration;

use anyhow::{Context, Result};
use async_trait::async_trait;
use futures_util::StreamExt;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::Message;

/// A chat model that answers a transcript with one assistant message.
#[async_trait]
pub trait ChatCompletion: Send + Sync {
    async fn complete(&self, messages: &[Message]) -> Result<String>;
}

#[derive(Serialize)]
pub struct ChatRequest<'a> {
    pub model: &'a str,
    pub messages: &'a [Message],
    pub temperature: f32,
    pub stream: bool,
}

#[derive(Deserialize, Debug)]
pub struct ChatResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
}

#[derive(Deserialize, Debug)]
pub struct Choice {
    pub message: ResponseMessage,
}

#[derive(Deserialize, Debug, Clone)]
pub struct ResponseMessage {
    #[serde(default)]
    pub role: Option<String>,
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Deserialize, Debug)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize, Debug)]
struct StreamChoice {
    #[serde(default)]
    delta: Delta,
}

#[derive(Deserialize, Debug, Default)]
struct Delta {
    #[serde(default)]
    content: Option<String>,
}

/// One line of a server-sent-event completion stream.
#[derive(Debug, PartialEq)]
pub enum StreamLine {
    Content(String),
    Done,
    Skip,
}

/// Connection settings for an OpenAI-compatible endpoint.
#[derive(Debug, Clone)]
pub struct ChatOptions {
    pub base_url: String,
    pub api_key: String,
    pub model: String,
    pub temperature: f32,
    pub streaming: bool,
    pub timeout: Option<Duration>,
}

impl Default for ChatOptions {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:1234/v1".to_string(),
            api_key: "not-needed".to_string(),
            model: "local-model".to_string(),
            temperature: 0.3,
            streaming: false,
            timeout: None,
        }
    }
}

pub struct ChatClient {
    client: Client,
    url: String,
    options: ChatOptions,
}

impl ChatClient {
    pub fn new(options: ChatOptions) -> Result<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = options.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build().context("failed to build chat client")?,
            url: format!("{}/chat/completions", options.base_url.trim_end_matches('/')),
            options,
        })
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn send(&self, messages: &[Message], stream: bool) -> Result<reqwest::Response> {
        let request = ChatRequest {
            model: &self.options.model,
            messages,
            temperature: self.options.temperature,
            stream,
        };

        debug!(url = %self.url, messages = messages.len(), stream, "sending chat completion");

        self.client
            .post(&self.url)
            .bearer_auth(&self.options.api_key)
            .json(&request)
            .send()
            .await
            .with_context(|| format!("chat completion request to {} failed", self.url))?
            .error_for_status()
            .context("chat completion returned an error status")
    }

    async fn execute_standard(&self, messages: &[Message]) -> Result<String> {
        let response = self
            .send(messages, false)
            .await?
            .json::<ChatResponse>()
            .await
            .context("chat completion decode failed")?;

        first_content(response)
    }

    async fn execute_streaming(&self, messages: &[Message]) -> Result<String> {
        let response = self.send(messages, true).await?;

        let mut stream = response.bytes_stream();
        let mut buffer = Vec::new();
        let mut full_content = String::new();

        'read: while let Some(chunk) = stream.next().await {
            let bytes = chunk.context("chat completion stream interrupted")?;
            buffer.extend_from_slice(&bytes);

            while let Some(newline_pos) = buffer.iter().position(|&b| b == b'\n') {
                let line: Vec<u8> = buffer.drain(..=newline_pos).collect();
                let line = String::from_utf8_lossy(&line);

                match parse_stream_line(&line)? {
                    StreamLine::Content(content) => full_content.push_str(&content),
                    StreamLine::Done => break 'read,
                    StreamLine::Skip => {}
                }
            }
        }

        // Servers that skip the trailing newline leave the last event buffered.
        if !buffer.is_empty() {
            let line = String::from_utf8_lossy(&buffer);
            if let StreamLine::Content(content) = parse_stream_line(&line)? {
                full_content.push_str(&content);
            }
        }

        debug!(chars = full_content.len(), "chat completion stream finished");
        Ok(full_content)
    }
}

#[async_trait]
impl ChatCompletion for ChatClient {
    async fn complete(&self, messages: &[Message]) -> Result<String> {
        if self.options.streaming {
            self.execute_streaming(messages).await
        } else {
            self.execute_standard(messages).await
        }
    }
}

/// Content of the first choice. A `null` content counts as empty text.
pub fn first_content(response: ChatResponse) -> Result<String> {
    let choice = response
        .choices
        .into_iter()
        .next()
        .ok_or_else(|| anyhow::anyhow!("chat completion returned no choices"))?;

    Ok(choice.message.content.unwrap_or_default())
}

/// Parses one SSE line: `data: {json}`, `data: [DONE]`, or anything to ignore.
pub fn parse_stream_line(line: &str) -> Result<StreamLine> {
    let line = line.trim();
    let Some(data) = line.strip_prefix("data:") else {
        return Ok(StreamLine::Skip);
    };

    let data = data.trim();
    if data.is_empty() {
        return Ok(StreamLine::Skip);
    }
    if data == "[DONE]" {
        return Ok(StreamLine::Done);
    }

    let chunk: StreamChunk =
        serde_json::from_str(data).context("chat completion stream chunk decode failed")?;

    Ok(chunk
        .choices
        .into_iter()
        .next()
        .and_then(|c| c.delta.content)
        .filter(|c| !c.is_empty())
        .map(StreamLine::Content)
        .unwrap_or(StreamLine::Skip))
}
