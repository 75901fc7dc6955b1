//! Append-only message history for one briefing run.

use crate::error::{BriefError, Result};
use async_openai::types::{
    ChatCompletionMessageToolCall, ChatCompletionRequestAssistantMessageArgs,
    ChatCompletionRequestMessage, ChatCompletionRequestSystemMessageArgs,
    ChatCompletionRequestToolMessageArgs, ChatCompletionRequestUserMessageArgs,
};

/// Messages exchanged with the model during a run.
#[derive(Debug, Clone)]
pub struct Conversation {
    messages: Vec<ChatCompletionRequestMessage>,
}

impl Conversation {
    /// Start a conversation with the system and user instructions.
    pub fn new(system: &str, user: &str) -> Result<Self> {
        let messages = vec![
            ChatCompletionRequestSystemMessageArgs::default()
                .content(system)
                .build()
                .map_err(|e| BriefError::Agent(e.to_string()))?
                .into(),
            ChatCompletionRequestUserMessageArgs::default()
                .content(user)
                .build()
                .map_err(|e| BriefError::Agent(e.to_string()))?
                .into(),
        ];
        Ok(Self { messages })
    }

    /// Record the assistant turn that requested tool calls.
    pub fn push_tool_calls(&mut self, calls: Vec<ChatCompletionMessageToolCall>) -> Result<()> {
        let msg = ChatCompletionRequestAssistantMessageArgs::default()
            .tool_calls(calls)
            .build()
            .map_err(|e| BriefError::Agent(e.to_string()))?;
        self.messages.push(msg.into());
        Ok(())
    }

    /// Record the JSON payload produced for a tool call.
    pub fn push_tool_result(&mut self, call_id: &str, content: &str) -> Result<()> {
        let msg = ChatCompletionRequestToolMessageArgs::default()
            .tool_call_id(call_id)
            .content(content)
            .build()
            .map_err(|e| BriefError::Agent(e.to_string()))?;
        self.messages.push(msg.into());
        Ok(())
    }

    pub fn messages(&self) -> &[ChatCompletionRequestMessage] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}
