//! Conversational wrapper around the retrieval service.
//!
//! Exposes the retrieval call as a `visual_retrieve` function tool to an
//! OpenAI-compatible chat model: the model decides when to call the tool, the
//! tool executes against the local [`RetrievalService`], and the loop feeds
//! results back until the model produces a final answer.

use axum::{Json, Router, extract::State, routing::post};
use axum_helpers::AppError;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::json;
use utoipa::ToSchema;

use domain_retrieval::ranking::apply_filters;
use domain_retrieval::{RetrievalOptions, RetrievalService, VectorIndex};

use crate::state::AppState;

/// Upper bound on chat round-trips for a single /ask request
const MAX_AGENT_TURNS: usize = 4;

const SYSTEM_PROMPT: &str = "You are a visual shopping assistant. Use the \
visual_retrieve tool to find catalog items similar to an image, then answer \
the user's question from the tool results. Be concise.";

/// Chat model configuration
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub api_key: String,
    pub base_url: String,
    pub model: String,
    pub default_query_image: String,
}

impl AgentConfig {
    pub fn from_env() -> Result<Self, String> {
        let api_key = std::env::var("OPENAI_API_KEY").map_err(|_| "OPENAI_API_KEY not set")?;

        Ok(Self {
            api_key,
            base_url: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| "https://api.openai.com/v1".to_string()),
            model: std::env::var("OPENAI_MODEL").unwrap_or_else(|_| "gpt-4o-mini".to_string()),
            default_query_image: std::env::var("DEFAULT_QUERY_IMAGE")
                .unwrap_or_else(|_| "SYNTH/img_0001.jpg".to_string()),
        })
    }
}

/// OpenAI-compatible chat client driving the tool loop
pub struct ChatAgent {
    client: Client,
    config: AgentConfig,
}

impl ChatAgent {
    pub fn new(config: AgentConfig) -> Self {
        Self {
            client: Client::new(),
            config,
        }
    }

    pub fn from_env() -> Result<Self, String> {
        Ok(Self::new(AgentConfig::from_env()?))
    }

    async fn chat(&self, messages: &[ChatMessage]) -> Result<ChatMessage, AppError> {
        let request = ChatRequest {
            model: &self.config.model,
            messages,
            tools: tool_definitions(),
        };

        let response = self
            .client
            .post(format!("{}/chat/completions", self.config.base_url))
            .bearer_auth(&self.config.api_key)
            .json(&request)
            .send()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("chat backend: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let detail = response.text().await.unwrap_or_default();
            return Err(AppError::ServiceUnavailable(format!(
                "chat backend error ({}): {}",
                status, detail
            )));
        }

        let mut body: ChatResponse = response
            .json()
            .await
            .map_err(|e| AppError::ServiceUnavailable(format!("chat backend: {}", e)))?;

        if body.choices.is_empty() {
            return Err(AppError::InternalServerError(
                "chat backend returned no choices".to_string(),
            ));
        }
        Ok(body.choices.remove(0).message)
    }

    /// Run the tool loop for one prompt.
    pub async fn run<I: VectorIndex>(
        &self,
        service: &RetrievalService<I>,
        prompt: &str,
    ) -> Result<String, AppError> {
        let mut messages = vec![
            ChatMessage::text("system", SYSTEM_PROMPT),
            ChatMessage::text("user", prompt),
        ];

        for _ in 0..MAX_AGENT_TURNS {
            let message = self.chat(&messages).await?;

            let tool_calls = message.tool_calls.clone().unwrap_or_default();
            if tool_calls.is_empty() {
                return message.content.ok_or_else(|| {
                    AppError::InternalServerError("chat backend returned no content".to_string())
                });
            }

            messages.push(message);
            for call in tool_calls {
                let result = execute_tool(service, &self.config, &call).await;
                messages.push(ChatMessage::tool_result(call.id.clone(), result));
            }
        }

        Err(AppError::InternalServerError(
            "agent did not converge to an answer".to_string(),
        ))
    }
}

// ===== Wire types =====

#[derive(Debug, Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: &'a [ChatMessage],
    tools: serde_json::Value,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ChatMessage {
    role: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    content: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_calls: Option<Vec<ToolCall>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tool_call_id: Option<String>,
}

impl ChatMessage {
    fn text(role: &str, content: &str) -> Self {
        Self {
            role: role.to_string(),
            content: Some(content.to_string()),
            tool_calls: None,
            tool_call_id: None,
        }
    }

    fn tool_result(tool_call_id: String, content: String) -> Self {
        Self {
            role: "tool".to_string(),
            content: Some(content),
            tool_calls: None,
            tool_call_id: Some(tool_call_id),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct ToolCall {
    id: String,
    #[serde(rename = "type")]
    kind: String,
    function: FunctionCall,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
struct FunctionCall {
    name: String,
    arguments: String,
}

#[derive(Debug, Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Debug, Deserialize)]
struct Choice {
    message: ChatMessage,
}

/// Arguments the model passes to `visual_retrieve`
#[derive(Debug, Deserialize)]
struct VisualRetrieveArgs {
    query_image: Option<String>,
    #[serde(default = "default_top_k")]
    top_k: usize,
    #[serde(default = "default_true")]
    prefer_online: bool,
    #[serde(default)]
    filter_color: Option<String>,
    #[serde(default)]
    max_price: Option<f64>,
}

fn default_top_k() -> usize {
    10
}

fn default_true() -> bool {
    true
}

fn tool_definitions() -> serde_json::Value {
    json!([{
        "type": "function",
        "function": {
            "name": "visual_retrieve",
            "description": "Find catalog items visually similar to an image. \
Returns ranked items with price, brand, color and availability. Supports \
color and price filters.",
            "parameters": {
                "type": "object",
                "properties": {
                    "query_image": { "type": "string", "description": "Path of the query image" },
                    "top_k": { "type": "integer", "minimum": 1, "maximum": 30 },
                    "prefer_online": { "type": "boolean" },
                    "filter_color": { "type": "string" },
                    "max_price": { "type": "number", "minimum": 0 }
                }
            }
        }
    }])
}

/// Execute one tool call against the local service.
///
/// Failures are reported back to the model as a JSON error payload instead of
/// failing the request, so it can recover or apologize.
async fn execute_tool<I: VectorIndex>(
    service: &RetrievalService<I>,
    config: &AgentConfig,
    call: &ToolCall,
) -> String {
    if call.function.name != "visual_retrieve" {
        return json!({ "error": format!("unknown tool {}", call.function.name) }).to_string();
    }

    let args: VisualRetrieveArgs = match serde_json::from_str(&call.function.arguments) {
        Ok(args) => args,
        Err(e) => return json!({ "error": format!("bad arguments: {}", e) }).to_string(),
    };

    let query_image = args
        .query_image
        .unwrap_or_else(|| config.default_query_image.clone());
    let options = RetrievalOptions {
        top_k: args.top_k.clamp(1, 30),
        prefer_online: args.prefer_online,
    };

    match service.retrieve(&query_image, &options).await {
        Ok(response) => {
            let mut results =
                apply_filters(response.results, args.filter_color.as_deref(), args.max_price);
            results.truncate(options.top_k);
            json!({
                "query_image": response.query_image,
                "count": results.len(),
                "results": results,
            })
            .to_string()
        }
        Err(err) => json!({ "error": err.to_string() }).to_string(),
    }
}

// ===== HTTP surface =====

/// Conversational request
#[derive(Debug, Deserialize, ToSchema)]
pub struct AskRequest {
    pub prompt: String,
}

/// Conversational answer
#[derive(Debug, Serialize, ToSchema)]
pub struct AskResponse {
    pub output: String,
}

/// Ask the shopping assistant a free-form question
#[utoipa::path(
    post,
    path = "/ask",
    tag = "agent",
    request_body = AskRequest,
    responses(
        (status = 200, description = "Assistant answer", body = AskResponse),
        (status = 503, description = "No chat backend configured or reachable")
    )
)]
pub async fn ask<I: VectorIndex + 'static>(
    State(state): State<AppState<I>>,
    Json(request): Json<AskRequest>,
) -> Result<Json<AskResponse>, AppError> {
    let agent = state.agent.as_ref().ok_or_else(|| {
        AppError::ServiceUnavailable(
            "conversational agent is not configured (set OPENAI_API_KEY)".to_string(),
        )
    })?;

    let output = agent.run(state.service.as_ref(), &request.prompt).await?;
    Ok(Json(AskResponse { output }))
}

/// Create the agent router with its state applied
pub fn router<I: VectorIndex + 'static>(state: AppState<I>) -> Router {
    Router::new().route("/ask", post(ask)).with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tool_arguments_apply_defaults() {
        let args: VisualRetrieveArgs = serde_json::from_str("{}").unwrap();
        assert!(args.query_image.is_none());
        assert_eq!(args.top_k, 10);
        assert!(args.prefer_online);
        assert!(args.max_price.is_none());
    }

    #[test]
    fn tool_definitions_declare_visual_retrieve() {
        let tools = tool_definitions();
        assert_eq!(tools[0]["function"]["name"], "visual_retrieve");
        assert_eq!(
            tools[0]["function"]["parameters"]["properties"]["top_k"]["maximum"],
            30
        );
    }
}
