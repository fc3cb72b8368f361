//! Gemini `generateContent` adapter.
//!
//! Each session handle owns a persona and the running chat history. The
//! history is sent in full on every request and the exchange is appended
//! only after the reply completed successfully.

use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::pin::Pin;
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use async_trait::async_trait;
use futures::{Stream, StreamExt};
use habla_core::config::BackendConfig;
use habla_core::types::{Capability, Citation, CitationKind, PersonaConfig};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use super::sse::SseLineParser;
use super::{ConversationBackend, Fragment, FragmentStream, SessionHandle};
use crate::error::ChatError;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Label used when a web source has no title.
pub const DEFAULT_WEB_LABEL: &str = "Fuente Web";
/// Label used when a map source has no title.
pub const DEFAULT_MAP_LABEL: &str = "Ver en Google Maps";

/// Connection settings for the Gemini API.
#[derive(Debug, Clone)]
pub struct GeminiConfig {
    pub api_key: String,
    pub model: String,
    pub base_url: String,
    pub timeout: Duration,
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(120),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Build from the `[backend]` config section, reading the key from the
    /// configured environment variable.
    pub fn from_backend_config(config: &BackendConfig) -> Result<Self, ChatError> {
        let api_key = std::env::var(&config.api_key_env)
            .ok()
            .filter(|key| !key.trim().is_empty())
            .ok_or_else(|| ChatError::MissingApiKey(config.api_key_env.clone()))?;
        Ok(Self::new(api_key, &config.model)
            .with_base_url(&config.base_url)
            .with_timeout(Duration::from_secs(config.request_timeout_secs)))
    }
}

// =============================================================================
// Wire types
// =============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
struct Part {
    text: String,
}

impl Content {
    fn user(text: &str) -> Self {
        Self {
            role: "user".to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }

    fn model(text: &str) -> Self {
        Self {
            role: "model".to_string(),
            parts: vec![Part {
                text: text.to_string(),
            }],
        }
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    grounding_metadata: Option<GroundingMetadata>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GroundingMetadata {
    #[serde(default)]
    grounding_chunks: Vec<GroundingChunk>,
}

#[derive(Debug, Default, Deserialize)]
struct GroundingChunk {
    web: Option<SourceRef>,
    maps: Option<SourceRef>,
}

#[derive(Debug, Default, Deserialize)]
struct SourceRef {
    uri: Option<String>,
    title: Option<String>,
}

impl GenerateResponse {
    /// Text of the first candidate plus its grounding metadata, if present.
    fn into_fragment(self) -> Fragment {
        let Some(candidate) = self.candidates.into_iter().next() else {
            return Fragment::default();
        };

        let text = candidate.content.and_then(|content| {
            let texts: Vec<String> = content.parts.into_iter().filter_map(|p| p.text).collect();
            (!texts.is_empty()).then(|| texts.concat())
        });

        let citations = candidate
            .grounding_metadata
            .map(|metadata| citations_from_chunks(metadata.grounding_chunks));

        Fragment { text, citations }
    }
}

fn citations_from_chunks(chunks: Vec<GroundingChunk>) -> Vec<Citation> {
    let mut citations = Vec::new();
    for chunk in chunks {
        if let Some(web) = chunk.web {
            citations.push(Citation {
                label: non_empty(web.title).unwrap_or_else(|| DEFAULT_WEB_LABEL.to_string()),
                uri: web.uri.unwrap_or_default(),
                kind: CitationKind::Web,
            });
        }
        if let Some(maps) = chunk.maps {
            citations.push(Citation {
                label: non_empty(maps.title).unwrap_or_else(|| DEFAULT_MAP_LABEL.to_string()),
                uri: non_empty(maps.uri).unwrap_or_else(|| "#".to_string()),
                kind: CitationKind::Map,
            });
        }
    }
    citations
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

fn request_body(persona: &PersonaConfig, contents: &[Content]) -> Value {
    let mut body = json!({
        "systemInstruction": { "parts": [{ "text": persona.instruction }] },
        "contents": contents,
        "generationConfig": { "temperature": persona.temperature },
    });

    let tools: Vec<Value> = persona
        .capabilities
        .iter()
        .map(|capability| match capability {
            Capability::WebSearch => json!({ "googleSearch": {} }),
            Capability::MapLookup => json!({ "googleMaps": {} }),
        })
        .collect();
    if !tools.is_empty() {
        body["tools"] = Value::Array(tools);
    }
    body
}

/// Pull `error.message` out of an error body, falling back to the raw text.
fn error_message(body: &str) -> String {
    serde_json::from_str::<Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, ChatError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    Err(ChatError::Http {
        status: status.as_u16(),
        message: error_message(&body),
    })
}

// =============================================================================
// Backend
// =============================================================================

struct Conversation {
    persona: PersonaConfig,
    history: Vec<Content>,
}

type Conversations = Arc<Mutex<HashMap<SessionHandle, Conversation>>>;

fn lock(
    conversations: &Conversations,
) -> Result<MutexGuard<'_, HashMap<SessionHandle, Conversation>>, ChatError> {
    conversations
        .lock()
        .map_err(|e| ChatError::Request(format!("conversation lock poisoned: {}", e)))
}

/// Append a completed exchange, if the conversation is still open.
fn commit_exchange(conversations: &Conversations, handle: SessionHandle, user: &str, reply: &str) {
    match lock(conversations) {
        Ok(mut map) => {
            if let Some(conversation) = map.get_mut(&handle) {
                conversation.history.push(Content::user(user));
                conversation.history.push(Content::model(reply));
            }
        }
        Err(e) => tracing::warn!(error = %e, "Dropping exchange from history"),
    }
}

/// Gemini-backed conversation backend.
pub struct GeminiBackend {
    client: reqwest::Client,
    config: GeminiConfig,
    conversations: Conversations,
}

impl GeminiBackend {
    pub fn new(config: GeminiConfig) -> Result<Self, ChatError> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;
        Ok(Self {
            client,
            config,
            conversations: Arc::new(Mutex::new(HashMap::new())),
        })
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Number of exchanges recorded for `handle`.
    pub fn history_len(&self, handle: SessionHandle) -> usize {
        match lock(&self.conversations) {
            Ok(map) => map.get(&handle).map_or(0, |c| c.history.len() / 2),
            Err(_) => 0,
        }
    }

    fn endpoint(&self, method: &str) -> String {
        format!(
            "{}/v1beta/models/{}:{}",
            self.config.base_url, self.config.model, method
        )
    }

    /// Persona and the contents to send: history plus the new user turn.
    fn prepare(
        &self,
        handle: SessionHandle,
        text: &str,
    ) -> Result<(PersonaConfig, Vec<Content>), ChatError> {
        let map = lock(&self.conversations)?;
        let conversation = map
            .get(&handle)
            .ok_or(ChatError::SessionNotFound(handle.0))?;
        let mut contents = conversation.history.clone();
        contents.push(Content::user(text));
        Ok((conversation.persona.clone(), contents))
    }

    async fn post(&self, url: &str, body: &Value) -> Result<reqwest::Response, ChatError> {
        let response = self
            .client
            .post(url)
            .header("x-goog-api-key", &self.config.api_key)
            .json(body)
            .send()
            .await?;
        check_status(response).await
    }
}

#[async_trait]
impl ConversationBackend for GeminiBackend {
    fn create(&self, persona: &PersonaConfig) -> Result<SessionHandle, ChatError> {
        let handle = SessionHandle::new();
        lock(&self.conversations)?.insert(
            handle,
            Conversation {
                persona: persona.clone(),
                history: Vec::new(),
            },
        );
        tracing::debug!(mode = %persona.mode, handle = %handle.0, "Gemini conversation opened");
        Ok(handle)
    }

    async fn send_streaming(
        &self,
        handle: SessionHandle,
        text: &str,
    ) -> Result<FragmentStream, ChatError> {
        let (persona, contents) = self.prepare(handle, text)?;
        let url = format!("{}?alt=sse", self.endpoint("streamGenerateContent"));
        let response = self.post(&url, &request_body(&persona, &contents)).await?;

        let pending = PendingExchange {
            conversations: Arc::clone(&self.conversations),
            handle,
            user_text: text.to_string(),
        };
        Ok(Box::pin(fragment_stream(response.bytes_stream(), Some(pending))))
    }

    async fn send_once(&self, handle: SessionHandle, text: &str) -> Result<String, ChatError> {
        let (persona, contents) = self.prepare(handle, text)?;
        let response = self
            .post(&self.endpoint("generateContent"), &request_body(&persona, &contents))
            .await?;
        let body: GenerateResponse = response.json().await?;
        let reply = body.into_fragment().text.unwrap_or_default();
        commit_exchange(&self.conversations, handle, text, &reply);
        Ok(reply)
    }

    fn release(&self, handle: SessionHandle) {
        if let Ok(mut map) = lock(&self.conversations) {
            if map.remove(&handle).is_some() {
                tracing::debug!(handle = %handle.0, "Gemini conversation released");
            }
        }
    }
}

// =============================================================================
// Streaming
// =============================================================================

/// Exchange to record once the stream completes.
struct PendingExchange {
    conversations: Conversations,
    handle: SessionHandle,
    user_text: String,
}

struct StreamState<S> {
    bytes: Pin<Box<S>>,
    parser: SseLineParser,
    ready: VecDeque<Result<Fragment, ChatError>>,
    reply: String,
    finished: bool,
    pending: Option<PendingExchange>,
}

impl<S> StreamState<S> {
    fn accept(&mut self, data: &str) {
        if self.finished || data.trim().is_empty() {
            return;
        }
        match serde_json::from_str::<GenerateResponse>(data) {
            Ok(response) => {
                let fragment = response.into_fragment();
                if let Some(text) = &fragment.text {
                    self.reply.push_str(text);
                }
                self.ready.push_back(Ok(fragment));
            }
            Err(e) => self.fail(ChatError::Decode(e.to_string())),
        }
    }

    fn fail(&mut self, err: ChatError) {
        self.finished = true;
        self.pending = None;
        self.ready.push_back(Err(err));
    }

    fn complete(&mut self) {
        self.finished = true;
        if let Some(exchange) = self.pending.take() {
            commit_exchange(
                &exchange.conversations,
                exchange.handle,
                &exchange.user_text,
                &self.reply,
            );
        }
    }
}

/// Turn an SSE body into fragments. The exchange is committed to history
/// only when the body ends without an error.
fn fragment_stream<S, B, E>(
    bytes: S,
    pending: Option<PendingExchange>,
) -> impl Stream<Item = Result<Fragment, ChatError>> + Send
where
    S: Stream<Item = Result<B, E>> + Send + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: fmt::Display + Send + 'static,
{
    let state = StreamState {
        bytes: Box::pin(bytes),
        parser: SseLineParser::new(),
        ready: VecDeque::new(),
        reply: String::new(),
        finished: false,
        pending,
    };

    futures::stream::unfold(state, |mut state| async move {
        loop {
            if let Some(item) = state.ready.pop_front() {
                return Some((item, state));
            }
            if state.finished {
                return None;
            }
            match state.bytes.next().await {
                Some(Ok(chunk)) => {
                    for event in state.parser.push(chunk.as_ref()) {
                        state.accept(&event.data);
                    }
                }
                Some(Err(e)) => state.fail(ChatError::Stream(e.to_string())),
                None => {
                    if let Some(event) = state.parser.flush() {
                        state.accept(&event.data);
                    }
                    if !state.finished {
                        state.complete();
                    }
                }
            }
        }
    })
}
