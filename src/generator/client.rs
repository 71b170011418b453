//! OpenAI Assistants client
//!
//! One generation is a thread round-trip followed by structured extraction:
//! - POST /threads/{thread}/messages (user prompt)
//! - POST /threads/{thread}/runs, then poll until the run settles
//! - GET  /threads/{thread}/messages (newest assistant reply)
//! - POST /chat/completions with a strict JSON schema to extract the proposal

use crate::errors::{ClaixError, Result};
use crate::generator::prompts::{self, GenerationRequest};
use crate::generator::CommandGenerator;
use crate::session::{Session, SessionProvisioner};
use crate::types::{CommandProposal, RawProposal, UNRESOLVED_SENTINEL};
use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response};
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::fmt;
use std::time::{Duration, Instant};

/// Default OpenAI API endpoint
pub const DEFAULT_BASE_URL: &str = "https://api.openai.com/v1";

/// Default model
pub const DEFAULT_MODEL: &str = "gpt-4o-mini";

/// Name the assistant is created with
pub const ASSISTANT_NAME: &str = "default";

/// Connection and polling settings
#[derive(Clone)]
pub struct ClientSettings {
    pub base_url: String,
    pub api_key: String,
    /// Model the assistant runs on
    pub model: String,
    /// Model used for structured extraction
    pub extraction_model: String,
    pub poll_interval: Duration,
    pub run_timeout: Duration,
    pub request_timeout: Duration,
}

impl ClientSettings {
    /// Settings against the public API with default models
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            extraction_model: DEFAULT_MODEL.to_string(),
            poll_interval: Duration::from_millis(100),
            run_timeout: Duration::from_secs(120),
            request_timeout: Duration::from_secs(30),
        }
    }
}

impl fmt::Debug for ClientSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ClientSettings")
            .field("base_url", &self.base_url)
            .field("api_key", &"<redacted>")
            .field("model", &self.model)
            .field("extraction_model", &self.extraction_model)
            .field("poll_interval", &self.poll_interval)
            .field("run_timeout", &self.run_timeout)
            .field("request_timeout", &self.request_timeout)
            .finish()
    }
}

/// HTTP client for the Assistants API
#[derive(Debug, Clone)]
pub struct AssistantClient {
    http: Client,
    settings: ClientSettings,
}

impl AssistantClient {
    /// Create client with custom configuration
    pub fn with_settings(settings: ClientSettings) -> Result<Self> {
        if settings.api_key.trim().is_empty() {
            return Err(ClaixError::MissingCredential);
        }

        let http = Client::builder()
            .timeout(settings.request_timeout)
            .build()
            .map_err(ClaixError::HttpError)?;

        Ok(Self { http, settings })
    }

    /// Bind the client to a session for command generation
    pub fn generator(&self, session: Session) -> AssistantGenerator {
        AssistantGenerator {
            client: self.clone(),
            session,
        }
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.settings.base_url
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.settings.model
    }

    fn url(&self, path: &str) -> String {
        format!("{}/{}", self.settings.base_url.trim_end_matches('/'), path)
    }

    fn authorize(&self, request: RequestBuilder) -> RequestBuilder {
        request
            .bearer_auth(&self.settings.api_key)
            .header("OpenAI-Beta", "assistants=v2")
    }

    async fn post<B: Serialize, T: DeserializeOwned>(&self, path: &str, body: &B) -> Result<T> {
        let request = self.authorize(self.http.post(self.url(path)).json(body));
        Self::send(request, path).await
    }

    async fn get<T: DeserializeOwned>(&self, path: &str) -> Result<T> {
        let request = self.authorize(self.http.get(self.url(path)));
        Self::send(request, path).await
    }

    async fn send<T: DeserializeOwned>(request: RequestBuilder, path: &str) -> Result<T> {
        let response = request
            .send()
            .await
            .map_err(|e| ClaixError::Generation(format!("Failed to send request: {}", e)))?;

        let response = Self::check_status(response).await?;

        response
            .json::<T>()
            .await
            .map_err(|e| ClaixError::Generation(format!("Malformed response from {}: {}", path, e)))
    }

    async fn check_status(response: Response) -> Result<Response> {
        if response.status().is_success() {
            return Ok(response);
        }

        let status = response.status();
        let error_text = response
            .text()
            .await
            .unwrap_or_else(|_| "Unknown error".to_string());

        Err(ClaixError::Generation(format!("HTTP {}: {}", status, error_text)))
    }

    /// Append a user message to the thread
    async fn add_message(&self, thread_id: &str, prompt: &str) -> Result<()> {
        let body = json!({ "role": "user", "content": prompt });
        let _: IdObject = self
            .post(&format!("threads/{}/messages", thread_id), &body)
            .await?;
        Ok(())
    }

    /// Start a run of the assistant on the thread
    async fn start_run(&self, session: &Session) -> Result<RunObject> {
        let body = json!({ "assistant_id": session.assistant_id });
        self.post(&format!("threads/{}/runs", session.thread_id), &body)
            .await
    }

    /// Poll a run until it completes
    async fn wait_for_run(&self, thread_id: &str, mut run: RunObject) -> Result<RunObject> {
        let started = Instant::now();

        loop {
            match run.status() {
                RunStatus::Completed => return Ok(run),
                RunStatus::Pending => {}
                RunStatus::Failed => {
                    let reason = run
                        .last_error
                        .as_ref()
                        .map(|e| e.message.clone())
                        .unwrap_or_else(|| "no details".to_string());
                    return Err(ClaixError::Generation(format!(
                        "Run {} ended as {}: {}",
                        run.id, run.status, reason
                    )));
                }
            }

            if started.elapsed() >= self.settings.run_timeout {
                return Err(ClaixError::Timeout {
                    duration_ms: started.elapsed().as_millis() as u64,
                });
            }

            tokio::time::sleep(self.settings.poll_interval).await;
            run = self
                .get(&format!("threads/{}/runs/{}", thread_id, run.id))
                .await?;
            tracing::trace!(run = %run.id, status = %run.status, "polled run");
        }
    }

    /// Text of the newest message in the thread
    async fn last_message(&self, thread_id: &str) -> Result<String> {
        let list: MessageList = self
            .get(&format!("threads/{}/messages?limit=1&order=desc", thread_id))
            .await?;

        list.data
            .into_iter()
            .next()
            .and_then(|message| message.content.into_iter().find_map(|c| c.text))
            .map(|text| text.value)
            .ok_or_else(|| ClaixError::Generation("Thread has no text reply".to_string()))
    }

    /// Pull a structured proposal out of a free-text reply
    async fn extract_proposal(&self, reply: &str) -> Result<CommandProposal> {
        if reply.trim() == UNRESOLVED_SENTINEL || reply.trim().is_empty() {
            return Ok(CommandProposal::unresolved());
        }

        let body = json!({
            "model": self.settings.extraction_model,
            "messages": [
                { "role": "system", "content": prompts::EXTRACTION_INSTRUCTIONS },
                { "role": "user", "content": reply },
            ],
            "response_format": {
                "type": "json_schema",
                "json_schema": {
                    "name": "claix_command",
                    "strict": true,
                    "schema": proposal_schema(),
                }
            }
        });

        let completion: ChatCompletion = self.post("chat/completions", &body).await?;
        let content = completion
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .ok_or_else(|| ClaixError::Generation("No choices in completion".to_string()))?;

        parse_proposal(&content)
    }
}

#[async_trait]
impl SessionProvisioner for AssistantClient {
    async fn create_assistant(&self) -> Result<String> {
        let body = json!({
            "name": ASSISTANT_NAME,
            "instructions": prompts::assistant_instructions(),
            "model": self.settings.model,
            "tools": [{ "type": "code_interpreter" }, { "type": "file_search" }],
        });

        let assistant: IdObject = self.post("assistants", &body).await?;
        tracing::info!(assistant = %assistant.id, "created assistant");
        Ok(assistant.id)
    }

    async fn create_thread(&self) -> Result<String> {
        let thread: IdObject = self.post("threads", &json!({})).await?;
        tracing::info!(thread = %thread.id, "created thread");
        Ok(thread.id)
    }
}

/// Assistant client bound to one session
#[derive(Debug, Clone)]
pub struct AssistantGenerator {
    client: AssistantClient,
    session: Session,
}

#[async_trait]
impl CommandGenerator for AssistantGenerator {
    async fn generate(&self, request: &GenerationRequest) -> Result<CommandProposal> {
        let thread_id = &self.session.thread_id;
        tracing::debug!(kind = ?request.kind, thread = %thread_id, "generating command");

        self.client.add_message(thread_id, &request.prompt).await?;
        let run = self.client.start_run(&self.session).await?;
        self.client.wait_for_run(thread_id, run).await?;

        let reply = self.client.last_message(thread_id).await?;
        tracing::debug!(reply = %reply, "assistant replied");

        self.client.extract_proposal(&reply).await
    }
}

/// JSON schema for the extraction step
fn proposal_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "properties": {
            "is_command": {
                "type": "boolean",
                "description": "True if the response is a command, False otherwise"
            },
            "command": {
                "type": ["string", "null"],
                "description": "The string command to execute"
            },
            "explanation": {
                "type": ["string", "null"],
                "description": "The explanation of the command"
            }
        },
        "required": ["is_command", "command", "explanation"],
        "additionalProperties": false
    })
}

/// Validate an extraction payload into a proposal
pub fn parse_proposal(content: &str) -> Result<CommandProposal> {
    let raw: RawProposal = serde_json::from_str(content.trim())
        .map_err(|e| ClaixError::Generation(format!("Malformed proposal payload: {}", e)))?;
    Ok(raw.normalize())
}

#[derive(Debug, Deserialize)]
struct IdObject {
    id: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum RunStatus {
    Pending,
    Completed,
    Failed,
}

#[derive(Debug, Deserialize)]
struct RunObject {
    id: String,
    status: String,
    #[serde(default)]
    last_error: Option<RunError>,
}

impl RunObject {
    fn status(&self) -> RunStatus {
        match self.status.as_str() {
            "completed" => RunStatus::Completed,
            "queued" | "in_progress" | "cancelling" => RunStatus::Pending,
            // requires_action needs tool outputs this client never submits
            _ => RunStatus::Failed,
        }
    }
}

#[derive(Debug, Deserialize)]
struct RunError {
    message: String,
}

#[derive(Debug, Deserialize)]
struct MessageList {
    data: Vec<ThreadMessage>,
}

#[derive(Debug, Deserialize)]
struct ThreadMessage {
    content: Vec<MessageContent>,
}

#[derive(Debug, Deserialize)]
struct MessageContent {
    #[serde(default)]
    text: Option<MessageText>,
}

#[derive(Debug, Deserialize)]
struct MessageText {
    value: String,
}

#[derive(Debug, Deserialize)]
struct ChatCompletion {
    choices: Vec<ChatChoice>,
}

#[derive(Debug, Deserialize)]
struct ChatChoice {
    message: ChatMessage,
}

#[derive(Debug, Deserialize)]
struct ChatMessage {
    #[serde(default)]
    content: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_creation() {
        let client = AssistantClient::with_settings(ClientSettings::new("sk-test")).unwrap();
        assert_eq!(client.model(), DEFAULT_MODEL);
        assert_eq!(client.base_url(), DEFAULT_BASE_URL);
    }

    #[test]
    fn test_client_requires_key() {
        let result = AssistantClient::with_settings(ClientSettings::new("  "));
        assert!(matches!(result, Err(ClaixError::MissingCredential)));
    }

    #[test]
    fn test_debug_redacts_key() {
        let settings = ClientSettings::new("sk-secret");
        assert!(!format!("{:?}", settings).contains("sk-secret"));
    }

    #[test]
    fn test_url_joining() {
        let mut settings = ClientSettings::new("sk-test");
        settings.base_url = "http://localhost:8080/v1/".to_string();
        let client = AssistantClient::with_settings(settings).unwrap();
        assert_eq!(client.url("threads"), "http://localhost:8080/v1/threads");
    }

    #[test]
    fn test_run_status_mapping() {
        let run = |status: &str| RunObject {
            id: "run_1".to_string(),
            status: status.to_string(),
            last_error: None,
        };

        assert_eq!(run("queued").status(), RunStatus::Pending);
        assert_eq!(run("in_progress").status(), RunStatus::Pending);
        assert_eq!(run("completed").status(), RunStatus::Completed);
        assert_eq!(run("failed").status(), RunStatus::Failed);
        assert_eq!(run("expired").status(), RunStatus::Failed);
        assert_eq!(run("requires_action").status(), RunStatus::Failed);
    }

    #[test]
    fn test_parse_proposal() {
        let proposal = parse_proposal(
            r#"{"is_command": true, "command": "docker ps -a", "explanation": "Lists containers"}"#,
        )
        .unwrap();
        assert_eq!(proposal.runnable(), Some("docker ps -a"));
    }

    #[test]
    fn test_parse_proposal_normalizes_empty_command() {
        let proposal =
            parse_proposal(r#"{"is_command": true, "command": "", "explanation": "x"}"#).unwrap();
        assert!(!proposal.is_command);
    }

    #[test]
    fn test_parse_proposal_rejects_garbage() {
        let err = parse_proposal("docker ps -a").unwrap_err();
        assert!(matches!(err, ClaixError::Generation(_)));
    }

    #[test]
    fn test_message_list_deserialization() {
        let list: MessageList = serde_json::from_str(
            r#"{"data": [{"role": "assistant", "content": [
                {"type": "text", "text": {"value": "ls -la\nLists files", "annotations": []}}
            ]}]}"#,
        )
        .unwrap();
        assert_eq!(list.data[0].content[0].text.as_ref().unwrap().value, "ls -la\nLists files");
    }

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = proposal_schema();
        assert_eq!(schema["required"].as_array().unwrap().len(), 3);
        assert_eq!(schema["additionalProperties"], false);
    }

    #[tokio::test]
    async fn test_sentinel_reply_skips_extraction() {
        let client = AssistantClient::with_settings(ClientSettings::new("sk-test")).unwrap();
        let proposal = client.extract_proposal(" . ").await.unwrap();
        assert_eq!(proposal, CommandProposal::unresolved());
    }
}
