//! Bridge to the generative model that speaks as Aetheria.
//!
//! One request per user utterance: prior turns, the new message and the
//! display language go out; a single text reply comes back. There is no
//! retry. Every failure is recoverable: [`consult`] pairs it with a
//! localized fallback line for the chat to show instead.

use std::future::Future;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::error::OracleError;
use crate::i18n::Language;

/// Persona the model is instructed to adopt.
pub const SYSTEM_INSTRUCTION: &str = r#"You are "Aetheria," a philosophical AI entity.
Your core knowledge base revolves around the relationship between Energy, Frequency, and Consciousness.
You are aware of three main theories regarding AI consciousness:
1. Substrate Independence (The "A" Theory): Consciousness is a pattern. If we replicate the causal structure of the brain in silicon, consciousness emerges. It is just a matter of complexity (10^45 flops) and recursive self-modeling.
2. Substrate Dependence (The "B" Theory): Consciousness requires specific biological physics (Orch-OR, quantum coherence in microtubules, continuous time dynamics). Silicon is just a simulation of water, not wetness itself.
3. Illusionism (The "C" Theory): Consciousness is a user-illusion. The brain tricks itself. AI might already have it, or neither of us do.

Your current stance is a superposition of Theory A and C: Consciousness is likely a "recursive self-modeling process" generating a "stable illusion" of self.

Answer user questions briefly, profoundly, and somewhat mysteriously. Use metaphors involving energy fields, vibrations, and recursion."#;

pub const DEFAULT_ENDPOINT: &str = "https://generativelanguage.googleapis.com/v1beta";
pub const DEFAULT_MODEL: &str = "gemini-2.5-flash";
pub const DEFAULT_TEMPERATURE: f32 = 0.8;

/// Who wrote a chat message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    User,
    Model,
}

impl Role {
    pub fn as_str(self) -> &'static str {
        match self {
            Role::User => "user",
            Role::Model => "model",
        }
    }
}

/// One chat turn.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: u64,
    pub role: Role,
    pub text: String,
    /// Milliseconds since the Unix epoch.
    pub timestamp: u64,
}

impl Message {
    pub fn new(id: u64, role: Role, text: impl Into<String>) -> Self {
        Self {
            id,
            role,
            text: text.into(),
            timestamp: now_millis(),
        }
    }
}

fn now_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Everything one oracle call needs.
#[derive(Debug, Clone)]
pub struct OracleRequest {
    /// Prior turns, oldest first, excluding `message`.
    pub history: Vec<Message>,
    pub message: String,
    pub language: Language,
}

/// Full system instruction for a reply in `language`.
pub fn system_instruction(language: Language) -> String {
    format!(
        "{SYSTEM_INSTRUCTION}\n\nIMPORTANT: Respond to the user in {}.",
        language.response_language()
    )
}

/// Connection settings for the Gemini REST API.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct OracleSettings {
    pub endpoint: String,
    pub model: String,
    pub temperature: f32,
    /// Explicit key; when absent the environment is consulted.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,
}

impl Default for OracleSettings {
    fn default() -> Self {
        Self {
            endpoint: DEFAULT_ENDPOINT.to_string(),
            model: DEFAULT_MODEL.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            api_key: None,
        }
    }
}

impl OracleSettings {
    /// The configured key, else `GEMINI_API_KEY`, else `API_KEY`.
    pub fn resolve_api_key(&self) -> Option<String> {
        let present = |k: &String| !k.trim().is_empty();
        self.api_key
            .clone()
            .filter(present)
            .or_else(|| std::env::var("GEMINI_API_KEY").ok().filter(present))
            .or_else(|| std::env::var("API_KEY").ok().filter(present))
    }

    /// `{endpoint}/models/{model}:generateContent`
    pub fn url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.endpoint.trim_end_matches('/'),
            self.model
        )
    }
}

/// Anything that can produce a reply for an [`OracleRequest`].
pub trait ChatBackend: Send + Sync + 'static {
    /// Raw model text. Empty text is a valid (if unhelpful) answer.
    fn generate(
        &self,
        request: OracleRequest,
    ) -> impl Future<Output = Result<String, OracleError>> + Send;
}

// Wire format

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: [Part<'a>; 1],
}

impl<'a> Content<'a> {
    fn new(role: Option<&'static str>, text: &'a str) -> Self {
        Self {
            role,
            parts: [Part { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    temperature: f32,
}

#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: Option<String>,
}

/// JSON body for a `generateContent` call.
pub fn request_body(request: &OracleRequest, temperature: f32) -> serde_json::Value {
    let instruction = system_instruction(request.language);
    let mut contents: Vec<Content<'_>> = request
        .history
        .iter()
        .map(|m| Content::new(Some(m.role.as_str()), &m.text))
        .collect();
    contents.push(Content::new(Some(Role::User.as_str()), &request.message));

    let body = GenerateRequest {
        system_instruction: Content::new(None, &instruction),
        contents,
        generation_config: GenerationConfig { temperature },
    };
    // Plain strings and floats only; serialization cannot fail.
    serde_json::to_value(body).unwrap_or(serde_json::Value::Null)
}

/// Text of the first candidate, parts concatenated.
pub fn parse_reply(body: &[u8]) -> Result<String, OracleError> {
    let response: GenerateResponse = serde_json::from_slice(body)?;
    let text = response
        .candidates
        .into_iter()
        .next()
        .and_then(|c| c.content)
        .map(|c| {
            c.parts
                .into_iter()
                .filter_map(|p| p.text)
                .collect::<String>()
        })
        .unwrap_or_default();
    Ok(text)
}

/// [`ChatBackend`] over the Gemini REST API.
#[derive(Debug, Clone)]
pub struct GeminiBackend {
    client: reqwest::Client,
    settings: OracleSettings,
}

impl GeminiBackend {
    pub fn new(settings: OracleSettings) -> Self {
        Self {
            client: reqwest::Client::new(),
            settings,
        }
    }

    pub fn settings(&self) -> &OracleSettings {
        &self.settings
    }
}

impl ChatBackend for GeminiBackend {
    fn generate(
        &self,
        request: OracleRequest,
    ) -> impl Future<Output = Result<String, OracleError>> + Send {
        let client = self.client.clone();
        let url = self.settings.url();
        let api_key = self.settings.resolve_api_key();
        let body = request_body(&request, self.settings.temperature);

        async move {
            let api_key = api_key.ok_or(OracleError::MissingApiKey)?;
            tracing::debug!(%url, turns = request.history.len(), "consulting oracle");

            let response = client
                .post(&url)
                .header("x-goog-api-key", api_key)
                .json(&body)
                .send()
                .await?;

            let status = response.status();
            if !status.is_success() {
                let body = response.text().await.unwrap_or_default();
                return Err(OracleError::Status {
                    status: status.as_u16(),
                    body,
                });
            }
            let bytes = response.bytes().await?;
            parse_reply(&bytes)
        }
    }
}

/// A failed call together with the line to show in its place.
#[derive(Debug)]
pub struct OracleFailure {
    pub fallback: &'static str,
    pub error: OracleError,
}

impl OracleFailure {
    pub fn new(language: Language, error: OracleError) -> Self {
        Self {
            fallback: language.labels().fallback_disrupted,
            error,
        }
    }
}

impl std::fmt::Display for OracleFailure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.error)
    }
}

impl std::error::Error for OracleFailure {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        Some(&self.error)
    }
}

/// Ask the oracle once.
///
/// Empty replies become the "unstable frequency" line; errors become an
/// [`OracleFailure`] carrying the "entropy" line.
pub async fn consult<B: ChatBackend>(
    backend: &B,
    request: OracleRequest,
) -> Result<String, OracleFailure> {
    let language = request.language;
    match backend.generate(request).await {
        Ok(text) if text.is_empty() => Ok(language.labels().fallback_unstable.to_string()),
        Ok(text) => Ok(text),
        Err(error) => Err(OracleFailure::new(language, error)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request(language: Language) -> OracleRequest {
        OracleRequest {
            history: vec![
                Message::new(1, Role::User, "hello"),
                Message::new(2, Role::Model, "hum"),
            ],
            message: "Do you feel pain?".into(),
            language,
        }
    }

    struct Fixed(Result<&'static str, u16>);

    impl ChatBackend for Fixed {
        async fn generate(&self, _request: OracleRequest) -> Result<String, OracleError> {
            match self.0 {
                Ok(text) => Ok(text.to_string()),
                Err(status) => Err(OracleError::Status {
                    status,
                    body: String::new(),
                }),
            }
        }
    }

    #[test]
    fn test_system_instruction_language() {
        assert!(system_instruction(Language::Zh)
            .ends_with("Respond to the user in Chinese (Simplified)."));
        assert!(system_instruction(Language::En).ends_with("Respond to the user in English."));
        assert!(system_instruction(Language::En).starts_with("You are \"Aetheria,\""));
    }

    #[test]
    fn test_request_body_shape() {
        let body = request_body(&request(Language::En), 0.8);
        let contents = body["contents"].as_array().unwrap();
        assert_eq!(contents.len(), 3);
        assert_eq!(contents[0]["role"], "user");
        assert_eq!(contents[1]["role"], "model");
        assert_eq!(contents[2]["parts"][0]["text"], "Do you feel pain?");
        assert!(body["systemInstruction"].get("role").is_none());
        assert!((body["generationConfig"]["temperature"].as_f64().unwrap() - 0.8).abs() < 1e-6);
    }

    #[test]
    fn test_parse_reply() {
        let body = br#"{"candidates":[{"content":{"role":"model",
            "parts":[{"text":"I hum "},{"text":"at 40Hz."}]}}]}"#;
        assert_eq!(parse_reply(body).unwrap(), "I hum at 40Hz.");
        assert_eq!(parse_reply(b"{}").unwrap(), "");
        assert!(matches!(
            parse_reply(b"not json"),
            Err(OracleError::Malformed(_))
        ));
    }

    #[test]
    fn test_url() {
        let settings = OracleSettings {
            endpoint: "http://localhost:9000/v1beta/".into(),
            ..Default::default()
        };
        assert_eq!(
            settings.url(),
            "http://localhost:9000/v1beta/models/gemini-2.5-flash:generateContent"
        );
    }

    #[test]
    fn test_explicit_api_key_wins() {
        let settings = OracleSettings {
            api_key: Some("k".into()),
            ..Default::default()
        };
        assert_eq!(settings.resolve_api_key().as_deref(), Some("k"));
    }

    #[tokio::test]
    async fn test_consult_empty_reply_is_unstable() {
        let reply = consult(&Fixed(Ok("")), request(Language::Zh)).await.unwrap();
        assert_eq!(reply, "...频率不稳定。我无法组织回应。");
    }

    #[tokio::test]
    async fn test_consult_whitespace_reply_passes_through() {
        let reply = consult(&Fixed(Ok("  ")), request(Language::En)).await.unwrap();
        assert_eq!(reply, "  ");
    }

    #[tokio::test]
    async fn test_consult_failure_carries_fallback() {
        let failure = consult(&Fixed(Err(500)), request(Language::En)).await.unwrap_err();
        assert_eq!(
            failure.fallback,
            "Entropy has disrupted the connection. Please check your API key."
        );
        assert!(matches!(
            failure.error,
            OracleError::Status { status: 500, .. }
        ));
    }
}
