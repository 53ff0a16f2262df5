//! OpenAI-compatible chat completion client.
//!
//! Model ids take the form `provider/model`. When the prefix names a known
//! provider it selects the endpoint and is stripped; otherwise the whole id is
//! sent to the default provider.
//!
//! With `SIESTA_VERBOSE` set to `1`, `yes` or `true` the reply is requested as
//! a server-sent event stream and each chunk is echoed to stderr as it
//! arrives.

use super::{Completion, CompletionRequest};
use crate::config::{Config, ProviderConfig};
use crate::error::{Result, SiestaError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::io::{BufRead, BufReader};
use std::time::{Duration, Instant};

/// Environment variable that turns on streaming with chunks echoed to stderr.
const VERBOSE_ENV: &str = "SIESTA_VERBOSE";

/// Blocking HTTP completion backend.
pub struct HttpCompletion {
    client: reqwest::blocking::Client,
    providers: BTreeMap<String, ProviderConfig>,
    default_provider: String,
    echo: bool,
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: [ChatMessage<'a>; 1],
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    max_tokens: Option<u64>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    stream: bool,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    #[serde(default)]
    choices: Vec<ChatChoice>,
}

#[derive(Deserialize)]
struct ChatChoice {
    message: ChatReply,
}

#[derive(Deserialize, Default)]
struct ChatReply {
    #[serde(default)]
    content: Option<String>,
}

/// One `data:` payload of a streamed reply.
#[derive(Deserialize)]
struct StreamChunk {
    #[serde(default)]
    choices: Vec<StreamChoice>,
}

#[derive(Deserialize)]
struct StreamChoice {
    #[serde(default)]
    delta: ChatReply,
}

impl HttpCompletion {
    pub fn from_config(config: &Config) -> Result<Self> {
        let timeout = config.request_timeout_seconds.map(Duration::from_secs);
        let client = reqwest::blocking::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| SiestaError::Config(format!("failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            providers: config.effective_providers(),
            default_provider: config.default_provider.clone(),
            echo: verbose_requested(std::env::var(VERBOSE_ENV).ok().as_deref()),
        })
    }

    /// Split a model id into its provider entry and the model name to send.
    fn route<'a>(&'a self, model: &'a str) -> Result<(&'a str, &'a ProviderConfig, &'a str)> {
        if let Some((prefix, rest)) = model.split_once('/')
            && let Some((name, provider)) = self.providers.get_key_value(prefix)
        {
            return Ok((name.as_str(), provider, rest));
        }

        let provider = self.providers.get(&self.default_provider).ok_or_else(|| {
            SiestaError::Config(format!(
                "default provider '{}' is not configured",
                self.default_provider
            ))
        })?;
        Ok((self.default_provider.as_str(), provider, model))
    }
}

impl Completion for HttpCompletion {
    fn complete(&mut self, request: &CompletionRequest) -> Result<String> {
        let (provider_name, provider, model) = self.route(&request.model)?;
        let fail = |message: String| SiestaError::Completion {
            model: request.model.clone(),
            message,
        };

        let url = format!("{}/chat/completions", provider.base_url.trim_end_matches('/'));
        let body = ChatRequest {
            model,
            messages: [ChatMessage {
                role: "user",
                content: &request.prompt,
            }],
            temperature: request.temperature,
            max_tokens: request.max_tokens,
            stream: self.echo,
        };

        let mut http = self.client.post(&url).json(&body);
        if let Some(var) = &provider.api_key_env {
            let key = std::env::var(var).map_err(|_| {
                fail(format!(
                    "environment variable {} is not set\nFix: export {} or configure provider '{}' in config.yaml.",
                    var, var, provider_name
                ))
            })?;
            http = http.bearer_auth(key);
        }

        let started = Instant::now();
        tracing::debug!(provider = provider_name, model, url = %url, "requesting completion");

        let response = http.send().map_err(|e| fail(format!("request failed: {}", e)))?;
        let status = response.status();
        if !status.is_success() {
            let detail = response.text().unwrap_or_default();
            return Err(fail(format!("HTTP {}: {}", status, detail.trim())));
        }

        let content = if self.echo {
            let content = read_stream(BufReader::new(response), |delta| eprint!("{}", delta))
                .map_err(fail)?;
            eprintln!();
            content
        } else {
            let parsed: ChatResponse = response
                .json()
                .map_err(|e| fail(format!("malformed response body: {}", e)))?;
            parsed
                .choices
                .into_iter()
                .next()
                .and_then(|choice| choice.message.content)
                .ok_or_else(|| fail("response contained no completion".to_string()))?
        };

        tracing::debug!(
            model,
            chars = content.chars().count(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "completion received"
        );
        Ok(content)
    }
}

/// Whether `SIESTA_VERBOSE` asks for streamed output.
fn verbose_requested(value: Option<&str>) -> bool {
    matches!(
        value.map(str::to_ascii_lowercase).as_deref(),
        Some("1" | "yes" | "true")
    )
}

/// Collect the reply text from a server-sent event stream, handing each
/// non-empty delta to `on_delta` as it is read. Reading stops at `[DONE]` or
/// at the end of the body.
fn read_stream<R: BufRead>(
    reader: R,
    mut on_delta: impl FnMut(&str),
) -> std::result::Result<String, String> {
    let mut content = String::new();
    for line in reader.lines() {
        let line = line.map_err(|e| format!("stream interrupted: {}", e))?;
        let Some(data) = line.strip_prefix("data:").map(str::trim) else {
            continue;
        };
        if data == "[DONE]" {
            break;
        }
        if data.is_empty() {
            continue;
        }

        let chunk: StreamChunk =
            serde_json::from_str(data).map_err(|e| format!("malformed stream chunk: {}", e))?;
        if let Some(delta) = chunk.choices.into_iter().next().and_then(|c| c.delta.content)
            && !delta.is_empty()
        {
            on_delta(&delta);
            content.push_str(&delta);
        }
    }
    Ok(content)
}
