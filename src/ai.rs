use anyhow::{anyhow, Context, Result};
use reqwest::blocking::{Client, RequestBuilder, Response};
use serde::{Deserialize, Serialize};
use std::env;

/// One prompt in, one free-text completion out. Each provider unwraps its own
/// response envelope down to that text and asks its API for JSON output.
pub trait AIProvider: Send + Sync {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String>;
    fn model_name(&self) -> &str;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProviderKind {
    Gemini,
    Anthropic,
    OpenAI,
}

impl ProviderKind {
    pub fn api_key_var(self) -> &'static str {
        match self {
            ProviderKind::Gemini => "GEMINI_API_KEY",
            ProviderKind::Anthropic => "ANTHROPIC_API_KEY",
            ProviderKind::OpenAI => "OPENAI_API_KEY",
        }
    }
}

#[derive(Debug, Clone)]
pub struct ModelSpec {
    pub provider: ProviderKind,
    pub model_id: String,
    pub short_name: String,
}

pub const DEFAULT_MODEL: &str = "gemini-flash";

/// (short name, aliases, provider, model id)
const MODELS: &[(&str, &[&str], ProviderKind, &str)] = &[
    ("gemini-flash", &["flash"], ProviderKind::Gemini, "gemini-1.5-flash"),
    ("gemini-pro", &[], ProviderKind::Gemini, "gemini-1.5-pro"),
    ("api-sonnet", &["sonnet"], ProviderKind::Anthropic, "claude-sonnet-4-5-20250929"),
    ("api-haiku", &["haiku"], ProviderKind::Anthropic, "claude-haiku-4-5-20251001"),
    ("gpt-4o", &[], ProviderKind::OpenAI, "gpt-4o"),
    ("gpt-4o-mini", &[], ProviderKind::OpenAI, "gpt-4o-mini"),
];

pub fn resolve_model(name: &str) -> Result<ModelSpec> {
    MODELS
        .iter()
        .find(|(short, aliases, _, _)| *short == name || aliases.contains(&name))
        .map(|&(short, _, provider, model_id)| ModelSpec {
            provider,
            model_id: model_id.to_string(),
            short_name: short.to_string(),
        })
        .ok_or_else(|| {
            let names: Vec<String> = MODELS
                .iter()
                .map(|(short, ..)| match *short {
                    DEFAULT_MODEL => format!("{short} (default)"),
                    _ => short.to_string(),
                })
                .collect();
            anyhow!("Unknown model '{}'. Available: {}", name, names.join(", "))
        })
}

/// Builds the provider for `spec`, reading its API key from the environment.
pub fn create_provider(spec: &ModelSpec) -> Result<Box<dyn AIProvider>> {
    let var = spec.provider.api_key_var();
    let api_key = env::var(var)
        .with_context(|| format!("{var} environment variable not set. Set it with: export {var}=your-key-here"))?;
    let model_id = spec.model_id.clone();

    Ok(match spec.provider {
        ProviderKind::Gemini => Box::new(GeminiProvider::with_key(api_key, model_id)),
        ProviderKind::Anthropic => Box::new(AnthropicProvider::with_key(api_key, model_id)),
        ProviderKind::OpenAI => Box::new(OpenAIProvider::with_key(api_key, model_id)),
    })
}

/// Sends a JSON body and fails on any non-2xx status with the body text.
fn post_json<T: Serialize>(request: RequestBuilder, body: &T, api: &str) -> Result<Response> {
    let response = request
        .json(body)
        .send()
        .with_context(|| format!("Failed to send request to {api} API"))?;
    if response.status().is_success() {
        return Ok(response);
    }
    let status = response.status();
    let error_text = response.text().unwrap_or_default();
    Err(anyhow!("{} API request failed with status {}: {}", api, status, error_text))
}

/// What every hosted provider needs to make a call.
#[derive(Debug)]
struct Connection {
    api_key: String,
    model_id: String,
    base_url: String,
    client: Client,
}

impl Connection {
    fn new(api_key: String, model_id: String, base_url: &str) -> Self {
        Self {
            api_key,
            model_id,
            base_url: base_url.to_string(),
            client: Client::new(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Serialize)]
struct ChatMessage<'a> {
    role: &'static str,
    content: &'a str,
}

// --- Gemini provider ---

const GEMINI_API_BASE: &str = "https://generativelanguage.googleapis.com";

#[derive(Debug, Serialize, Deserialize)]
struct GeminiPart {
    text: String,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    max_output_tokens: u32,
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    generation_config: GeminiGenerationConfig,
}

#[derive(Debug, Deserialize)]
struct GeminiCandidate {
    content: Option<GeminiContent>,
}

#[derive(Debug, Deserialize)]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
}

#[derive(Debug)]
pub struct GeminiProvider(Connection);

impl GeminiProvider {
    pub fn with_key(api_key: String, model_id: String) -> Self {
        Self(Connection::new(api_key, model_id, GEMINI_API_BASE))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.0.base_url = base_url.into();
        self
    }
}

impl AIProvider for GeminiProvider {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let conn = &self.0;
        let request = GeminiRequest {
            contents: vec![GeminiContent {
                parts: vec![GeminiPart {
                    text: prompt.to_string(),
                }],
            }],
            generation_config: GeminiGenerationConfig {
                max_output_tokens: max_tokens,
                temperature: 0.0,
                response_mime_type: "application/json",
            },
        };
        let url = conn.url(&format!("/v1beta/models/{}:generateContent", conn.model_id));

        let builder = conn.client.post(&url).query(&[("key", &conn.api_key)]);
        let reply: GeminiResponse = post_json(builder, &request, "Gemini")?
            .json()
            .context("Failed to parse Gemini API response")?;

        reply
            .candidates
            .into_iter()
            .filter_map(|c| c.content)
            .flat_map(|content| content.parts)
            .map(|part| part.text)
            .next()
            .ok_or_else(|| anyhow!("No candidates in Gemini API response"))
    }

    fn model_name(&self) -> &str {
        &self.0.model_id
    }
}

// --- Anthropic provider ---

const ANTHROPIC_API_BASE: &str = "https://api.anthropic.com";
const ANTHROPIC_SYSTEM: &str = "You extract structured data. Reply with a single JSON object.";

#[derive(Debug, Serialize)]
struct AnthropicRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    system: &'static str,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct AnthropicBlock {
    #[serde(rename = "type")]
    kind: String,
    #[serde(default)]
    text: String,
}

#[derive(Debug, Deserialize)]
struct AnthropicResponse {
    content: Vec<AnthropicBlock>,
}

#[derive(Debug)]
pub struct AnthropicProvider(Connection);

impl AnthropicProvider {
    pub fn with_key(api_key: String, model_id: String) -> Self {
        Self(Connection::new(api_key, model_id, ANTHROPIC_API_BASE))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.0.base_url = base_url.into();
        self
    }
}

impl AIProvider for AnthropicProvider {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let conn = &self.0;
        let request = AnthropicRequest {
            model: &conn.model_id,
            max_tokens,
            temperature: 0.0,
            system: ANTHROPIC_SYSTEM,
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let builder = conn
            .client
            .post(conn.url("/v1/messages"))
            .header("x-api-key", &conn.api_key)
            .header("anthropic-version", "2023-06-01");
        let reply: AnthropicResponse = post_json(builder, &request, "Anthropic")?
            .json()
            .context("Failed to parse Anthropic API response")?;

        reply
            .content
            .into_iter()
            .find(|block| block.kind == "text")
            .map(|block| block.text)
            .ok_or_else(|| anyhow!("No text block in Anthropic API response"))
    }

    fn model_name(&self) -> &str {
        &self.0.model_id
    }
}

// --- OpenAI provider ---

const OPENAI_API_BASE: &str = "https://api.openai.com";

#[derive(Debug, Serialize)]
struct ResponseFormat {
    #[serde(rename = "type")]
    kind: &'static str,
}

#[derive(Debug, Serialize)]
struct OpenAIRequest<'a> {
    model: &'a str,
    max_tokens: u32,
    temperature: f32,
    response_format: ResponseFormat,
    messages: [ChatMessage<'a>; 1],
}

#[derive(Debug, Deserialize)]
struct OpenAIMessage {
    content: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OpenAIChoice {
    message: OpenAIMessage,
}

#[derive(Debug, Deserialize)]
struct OpenAIResponse {
    choices: Vec<OpenAIChoice>,
}

#[derive(Debug)]
pub struct OpenAIProvider(Connection);

impl OpenAIProvider {
    pub fn with_key(api_key: String, model_id: String) -> Self {
        Self(Connection::new(api_key, model_id, OPENAI_API_BASE))
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.0.base_url = base_url.into();
        self
    }
}

impl AIProvider for OpenAIProvider {
    fn complete(&self, prompt: &str, max_tokens: u32) -> Result<String> {
        let conn = &self.0;
        let request = OpenAIRequest {
            model: &conn.model_id,
            max_tokens,
            temperature: 0.0,
            response_format: ResponseFormat { kind: "json_object" },
            messages: [ChatMessage {
                role: "user",
                content: prompt,
            }],
        };

        let builder = conn
            .client
            .post(conn.url("/v1/chat/completions"))
            .bearer_auth(&conn.api_key);
        let reply: OpenAIResponse = post_json(builder, &request, "OpenAI")?
            .json()
            .context("Failed to parse OpenAI API response")?;

        reply
            .choices
            .into_iter()
            .find_map(|choice| choice.message.content)
            .ok_or_else(|| anyhow!("No message content in OpenAI API response"))
    }

    fn model_name(&self) -> &str {
        &self.0.model_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use mockito::{Matcher, Server};

    #[test]
    fn test_resolve_model_names_and_aliases() {
        let spec = resolve_model("gemini-flash").unwrap();
        assert_eq!(spec.model_id, "gemini-1.5-flash");
        assert_eq!(spec.provider, ProviderKind::Gemini);

        let spec = resolve_model("flash").unwrap();
        assert_eq!(spec.short_name, "gemini-flash");

        let spec = resolve_model("haiku").unwrap();
        assert_eq!(spec.short_name, "api-haiku");
        assert_eq!(spec.provider, ProviderKind::Anthropic);

        let spec = resolve_model("gpt-4o-mini").unwrap();
        assert_eq!(spec.provider, ProviderKind::OpenAI);
        assert_eq!(spec.model_id, "gpt-4o-mini");
    }

    #[test]
    fn test_resolve_model_default_is_gemini() {
        let spec = resolve_model(DEFAULT_MODEL).unwrap();
        assert_eq!(spec.provider, ProviderKind::Gemini);
        assert_eq!(spec.provider.api_key_var(), "GEMINI_API_KEY");
    }

    #[test]
    fn test_resolve_model_unknown() {
        let err = resolve_model("nonexistent").unwrap_err().to_string();
        assert!(err.contains("Unknown model 'nonexistent'"));
        assert!(err.contains("gemini-flash (default), gemini-pro"));
        assert!(err.ends_with("gpt-4o-mini"));
    }

    #[test]
    fn test_gemini_requests_json_and_unwraps_candidate_text() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
            .match_query(Matcher::UrlEncoded("key".into(), "test-key".into()))
            .match_body(Matcher::PartialJsonString(
                r#"{"contents":[{"parts":[{"text":"hello"}]}],
                    "generationConfig":{"maxOutputTokens":1024,"responseMimeType":"application/json"}}"#
                    .into(),
            ))
            .with_status(200)
            .with_header("content-type", "application/json")
            .with_body(r#"{"candidates":[{"content":{"parts":[{"text":"{\"name\":\"Jane\"}"}]}}]}"#)
            .create();

        let provider = GeminiProvider::with_key("test-key".into(), "gemini-1.5-flash".into())
            .with_base_url(server.url());
        let text = provider.complete("hello", 1024).unwrap();

        assert_eq!(text, r#"{"name":"Jane"}"#);
        mock.assert();
    }

    #[test]
    fn test_gemini_error_status() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(403)
            .with_body("API key not valid")
            .create();

        let provider = GeminiProvider::with_key("bad".into(), "gemini-1.5-flash".into())
            .with_base_url(server.url());
        let err = provider.complete("hello", 1024).unwrap_err();

        assert!(err.to_string().contains("403"));
        assert!(err.to_string().contains("API key not valid"));
    }

    #[test]
    fn test_gemini_missing_candidates() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/v1beta/models/gemini-1.5-flash:generateContent")
            .match_query(Matcher::Any)
            .with_status(200)
            .with_body(r#"{"promptFeedback":{"blockReason":"SAFETY"}}"#)
            .create();

        let provider = GeminiProvider::with_key("k".into(), "gemini-1.5-flash".into())
            .with_base_url(server.url());
        let err = provider.complete("hello", 1024).unwrap_err();
        assert!(err.to_string().contains("No candidates"));
    }

    #[test]
    fn test_anthropic_skips_non_text_blocks() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1/messages")
            .match_header("x-api-key", "test-key")
            .match_header("anthropic-version", "2023-06-01")
            .match_body(Matcher::PartialJsonString(
                r#"{"model":"claude-haiku-4-5-20251001","max_tokens":64,
                    "messages":[{"role":"user","content":"hi"}]}"#
                    .into(),
            ))
            .with_status(200)
            .with_body(r#"{"content":[{"type":"thinking","thinking":"..."},{"type":"text","text":"{}"}]}"#)
            .create();

        let provider =
            AnthropicProvider::with_key("test-key".into(), "claude-haiku-4-5-20251001".into())
                .with_base_url(server.url());
        assert_eq!(provider.complete("hi", 64).unwrap(), "{}");
        mock.assert();
    }

    #[test]
    fn test_openai_json_mode() {
        let mut server = Server::new();
        let mock = server
            .mock("POST", "/v1/chat/completions")
            .match_header("authorization", "Bearer test-key")
            .match_body(Matcher::PartialJsonString(
                r#"{"model":"gpt-4o","response_format":{"type":"json_object"}}"#.into(),
            ))
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":"{\"name\":null}"}}]}"#)
            .create();

        let provider = OpenAIProvider::with_key("test-key".into(), "gpt-4o".into())
            .with_base_url(server.url());
        assert_eq!(provider.complete("hi", 64).unwrap(), r#"{"name":null}"#);
        assert_eq!(provider.model_name(), "gpt-4o");
        mock.assert();
    }

    #[test]
    fn test_openai_refusal_has_no_content() {
        let mut server = Server::new();
        let _mock = server
            .mock("POST", "/v1/chat/completions")
            .with_status(200)
            .with_body(r#"{"choices":[{"message":{"content":null,"refusal":"no"}}]}"#)
            .create();

        let provider = OpenAIProvider::with_key("k".into(), "gpt-4o".into())
            .with_base_url(server.url());
        let err = provider.complete("hi", 64).unwrap_err();
        assert!(err.to_string().contains("No message content"));
    }
}
