//! Chat model abstraction for the orchestration loop.

use crate::error::{BriefError, Result};
use crate::openai::create_client;
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestMessage, ChatCompletionTool,
    CreateChatCompletionRequestArgs,
};
use async_trait::async_trait;
use tracing::debug;

/// What the model did on one turn.
#[derive(Debug, Clone)]
pub enum ModelReply {
    /// The model wants these tools run before it continues.
    ToolCalls(Vec<ChatCompletionMessageToolCall>),
    /// The model is done; this is its final text.
    Text(String),
}

/// A chat-completion backend that supports tool calling.
#[async_trait]
pub trait ChatModel: Send + Sync {
    /// Send the conversation and tool catalog, returning the model's reply.
    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelReply>;
}

/// OpenAI chat completions.
pub struct OpenAIChatModel {
    client: async_openai::Client<async_openai::config::OpenAIConfig>,
    model: String,
}

impl OpenAIChatModel {
    pub fn new(model: &str, api_base: Option<&str>) -> Result<Self> {
        Ok(Self {
            client: create_client(api_base)?,
            model: model.to_string(),
        })
    }
}

#[async_trait]
impl ChatModel for OpenAIChatModel {
    async fn complete(
        &self,
        messages: &[ChatCompletionRequestMessage],
        tools: &[ChatCompletionTool],
    ) -> Result<ModelReply> {
        let request = CreateChatCompletionRequestArgs::default()
            .model(&self.model)
            .messages(messages.to_vec())
            .tools(tools.to_vec())
            .build()
            .map_err(|e| BriefError::Agent(e.to_string()))?;

        let response = self
            .client
            .chat()
            .create(request)
            .await
            .map_err(|e| BriefError::OpenAI(format!("Chat completion failed: {}", e)))?;

        let choice = response
            .choices
            .into_iter()
            .next()
            .ok_or_else(|| BriefError::Agent("No response from model".to_string()))?;

        match choice.message.tool_calls {
            Some(calls) if !calls.is_empty() => {
                debug!("Model requested {} tool call(s)", calls.len());
                Ok(ModelReply::ToolCalls(calls))
            }
            _ => Ok(ModelReply::Text(choice.message.content.unwrap_or_default())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::agent::conversation::Conversation;
    use crate::agent::tools::tool_definitions;
    use serde_json::json;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn setup(body: serde_json::Value) -> (MockServer, OpenAIChatModel) {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/v1/chat/completions"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let model =
            OpenAIChatModel::new("gpt-4o-mini", Some(&format!("{}/v1", server.uri()))).unwrap();
        (server, model)
    }

    fn conversation() -> Conversation {
        Conversation::new("system", "Generate the briefing for 2024-05-01.").unwrap()
    }

    #[tokio::test]
    async fn test_text_reply() {
        let (_server, model) = setup(json!({
            "id": "chatcmpl-1",
            "object": "chat.completion",
            "created": 1714543200,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {"role": "assistant", "content": "TODAY'S HEADLINES\n- ..."},
                "finish_reason": "stop"
            }]
        }))
        .await;

        let reply = model
            .complete(conversation().messages(), &tool_definitions())
            .await
            .unwrap();
        assert!(matches!(reply, ModelReply::Text(text) if text == "TODAY'S HEADLINES\n- ..."));
    }

    #[tokio::test]
    async fn test_tool_call_reply() {
        let (_server, model) = setup(json!({
            "id": "chatcmpl-2",
            "object": "chat.completion",
            "created": 1714543200,
            "model": "gpt-4o-mini",
            "choices": [{
                "index": 0,
                "message": {
                    "role": "assistant",
                    "content": null,
                    "tool_calls": [{
                        "id": "call_1",
                        "type": "function",
                        "function": {"name": "get_weather", "arguments": "{\"iso_date\":\"2024-05-01\"}"}
                    }]
                },
                "finish_reason": "tool_calls"
            }]
        }))
        .await;

        let reply = model
            .complete(conversation().messages(), &tool_definitions())
            .await
            .unwrap();
        match reply {
            ModelReply::ToolCalls(calls) => {
                assert_eq!(calls.len(), 1);
                assert_eq!(calls[0].id, "call_1");
                assert_eq!(calls[0].function.name, "get_weather");
            }
            other => panic!("Expected tool calls, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_empty_choices_is_error() {
        let (_server, model) = setup(json!({
            "id": "chatcmpl-3",
            "object": "chat.completion",
            "created": 1714543200,
            "model": "gpt-4o-mini",
            "choices": []
        }))
        .await;

        let err = model
            .complete(conversation().messages(), &tool_definitions())
            .await
            .unwrap_err();
        assert!(matches!(err, BriefError::Agent(_)));
    }
}
