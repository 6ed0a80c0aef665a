//! Google Gemini adapter implementation

use super::schema::clean_schema;
use super::types::{
    Candidate, LlmResponse, Message, Part, Role, SamplingRequest, SamplingResult, ToolCatalog,
    ToolInvocation, Usage,
};
use super::{LlmError, ModelAdapter};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Map, Value};
use std::time::Duration;

const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";

/// Gemini adapter bound to a single model
pub struct GeminiAdapter {
    client: Client,
    api_key: String,
    endpoint: String,
    model_id: String,
}

impl GeminiAdapter {
    pub fn new(api_key: String, model: &str, base_url: Option<&str>) -> Result<Self, LlmError> {
        let base = base_url.unwrap_or(DEFAULT_BASE_URL).trim_end_matches('/');
        let endpoint = format!("{base}/v1beta/models/{model}:generateContent");

        let client = Client::builder()
            .timeout(Duration::from_secs(300))
            .build()
            .map_err(|e| LlmError::unknown(format!("Failed to create HTTP client: {e}")))?;

        Ok(Self {
            client,
            api_key,
            endpoint,
            model_id: model.to_string(),
        })
    }

    fn translate_history(history: &[Message]) -> Vec<GeminiContent> {
        history
            .iter()
            .filter_map(|msg| {
                let parts: Vec<GeminiPart> = msg.parts.iter().map(translate_part).collect();
                if parts.is_empty() {
                    return None;
                }
                Some(GeminiContent {
                    role: Some(role_name(msg.role).to_string()),
                    parts,
                })
            })
            .collect()
    }

    fn normalize_response(resp: GeminiResponse) -> LlmResponse {
        let candidates = resp
            .candidates
            .into_iter()
            .map(|candidate| Candidate {
                content: candidate.content.map(|content| {
                    let parts = content
                        .parts
                        .into_iter()
                        .filter_map(|part| match part {
                            GeminiPart::Text { text } if !text.is_empty() => Some(Part::Text { text }),
                            GeminiPart::FunctionCall {
                                function_call,
                                thought_signature,
                            } => Some(Part::FunctionCall(ToolInvocation {
                                name: function_call.name,
                                arguments: function_call.args,
                                thought_signature,
                            })),
                            _ => None, // Thoughts, inline data and other placeholders
                        })
                        .collect();
                    Message::new(Role::Model, parts)
                }),
                finish_reason: candidate.finish_reason,
            })
            .collect();

        let usage = resp.usage_metadata.unwrap_or_default();
        LlmResponse {
            candidates,
            usage: Usage {
                input_tokens: u64::from(usage.prompt_token_count),
                output_tokens: u64::from(usage.candidates_token_count),
            },
        }
    }

    async fn generate(&self, request: &GeminiRequest) -> Result<LlmResponse, LlmError> {
        let response = self
            .client
            .post(&self.endpoint)
            .header("x-goog-api-key", &self.api_key)
            .json(request)
            .send()
            .await
            .map_err(|e| {
                let e = e.without_url();
                if e.is_timeout() {
                    LlmError::network(format!("Request timeout: {e}"))
                } else if e.is_connect() {
                    LlmError::network(format!("Connection failed: {e}"))
                } else {
                    LlmError::unknown(format!("Request failed: {e}"))
                }
            })?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| {
                LlmError::network(format!("Failed to read response: {}", e.without_url()))
            })?;

        if !status.is_success() {
            let kind = super::LlmErrorKind::from_status(status.as_u16());
            let message = serde_json::from_str::<GeminiErrorResponse>(&body)
                .map_or(body, |e| e.error.message);
            return Err(LlmError::new(kind, format!("HTTP {status}: {message}")));
        }

        let gemini_response: GeminiResponse = serde_json::from_str(&body).map_err(|e| {
            LlmError::unknown(format!("Failed to parse response: {e} - body: {body}"))
        })?;

        Ok(Self::normalize_response(gemini_response))
    }
}

fn role_name(role: Role) -> &'static str {
    match role {
        Role::Model => "model",
        // Function responses travel in user turns
        Role::User | Role::Tool => "user",
    }
}

fn translate_part(part: &Part) -> GeminiPart {
    match part {
        Part::Text { text } => GeminiPart::Text { text: text.clone() },
        Part::FunctionCall(call) => GeminiPart::FunctionCall {
            function_call: GeminiFunctionCall {
                name: call.name.clone(),
                args: call.arguments.clone(),
            },
            thought_signature: call.thought_signature.clone(),
        },
        Part::FunctionResponse(result) => GeminiPart::FunctionResponse {
            function_response: GeminiFunctionResponse {
                name: result.name.clone(),
                response: json!({ "content": result.payload }),
            },
        },
    }
}

/// Declarations for every catalog entry; parameter-less tools omit `parameters`
fn function_declarations(catalog: &ToolCatalog) -> Vec<GeminiFunctionDeclaration> {
    catalog
        .iter()
        .map(|tool| {
            let cleaned = clean_schema(&tool.input_schema);
            let has_properties = cleaned
                .get("properties")
                .and_then(Value::as_object)
                .is_some_and(|p| !p.is_empty());
            GeminiFunctionDeclaration {
                name: tool.name.clone(),
                description: tool.description.clone(),
                parameters: has_properties.then_some(cleaned),
            }
        })
        .collect()
}

#[async_trait]
impl ModelAdapter for GeminiAdapter {
    async fn chat(
        &self,
        history: &[Message],
        tools: Option<&ToolCatalog>,
    ) -> Result<Option<LlmResponse>, LlmError> {
        let request = GeminiRequest {
            contents: Self::translate_history(history),
            system_instruction: None,
            tools: tools.filter(|c| !c.is_empty()).map(|c| self.tools_for_backend(c)),
            generation_config: None,
        };

        match self.generate(&request).await {
            Ok(response) => Ok(Some(response)),
            Err(e) if e.is_transient() => {
                tracing::warn!(model = %self.model_id, error = %e, "Transient backend failure");
                Ok(None)
            }
            Err(e) => Err(e),
        }
    }

    async fn sample(&self, request: &SamplingRequest) -> Result<SamplingResult, LlmError> {
        let contents = request
            .messages
            .iter()
            .map(|m| GeminiContent {
                role: Some(role_name(m.role).to_string()),
                parts: vec![GeminiPart::Text {
                    text: m.text.clone(),
                }],
            })
            .collect();

        let gemini_request = GeminiRequest {
            contents,
            system_instruction: request.system_prompt.as_ref().map(|text| GeminiContent {
                role: None,
                parts: vec![GeminiPart::Text { text: text.clone() }],
            }),
            tools: None,
            generation_config: Some(GeminiGenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
                top_p: request.top_p,
            }),
        };

        let response = self.generate(&gemini_request).await?;
        Ok(SamplingResult {
            model: self.model_id.clone(),
            text: self.extract_text(Some(&response)),
        })
    }

    fn tools_for_backend(&self, catalog: &ToolCatalog) -> Value {
        json!([GeminiTool {
            function_declarations: function_declarations(catalog),
        }])
    }

    fn model_id(&self) -> &str {
        &self.model_id
    }
}

// Gemini API types

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiRequest {
    contents: Vec<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    system_instruction: Option<GeminiContent>,
    #[serde(skip_serializing_if = "Option::is_none")]
    tools: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    generation_config: Option<GeminiGenerationConfig>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiContent {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    #[serde(default)]
    parts: Vec<GeminiPart>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(untagged)]
enum GeminiPart {
    Text {
        text: String,
    },
    FunctionCall {
        #[serde(rename = "functionCall")]
        function_call: GeminiFunctionCall,
        #[serde(
            rename = "thoughtSignature",
            default,
            skip_serializing_if = "Option::is_none"
        )]
        thought_signature: Option<String>,
    },
    FunctionResponse {
        #[serde(rename = "functionResponse")]
        function_response: GeminiFunctionResponse,
    },
    Other(Value),
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionCall {
    name: String,
    #[serde(default)]
    args: Map<String, Value>,
}

#[derive(Debug, Serialize, Deserialize)]
struct GeminiFunctionResponse {
    name: String,
    response: Value,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiTool {
    function_declarations: Vec<GeminiFunctionDeclaration>,
}

#[derive(Debug, Serialize)]
struct GeminiFunctionDeclaration {
    name: String,
    description: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    parameters: Option<Value>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GeminiGenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiResponse {
    #[serde(default)]
    candidates: Vec<GeminiCandidate>,
    #[serde(default)]
    usage_metadata: Option<GeminiUsageMetadata>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiCandidate {
    #[serde(default)]
    content: Option<GeminiContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GeminiUsageMetadata {
    #[serde(default)]
    prompt_token_count: u32,
    #[serde(default)]
    candidates_token_count: u32,
}

#[derive(Debug, Deserialize)]
struct GeminiErrorResponse {
    error: GeminiError,
}

#[derive(Debug, Deserialize)]
struct GeminiError {
    message: String,
}
