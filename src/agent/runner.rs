//! Agent runner with tool calling loop.

use super::conversation::Conversation;
use super::model::{ChatModel, ModelReply, OpenAIChatModel};
use super::tools::{tool_definitions, ToolCall, Toolbox};
use crate::config::Settings;
use crate::error::{BriefError, Result};
use crate::retry::{retry, RetryPolicy};
use async_openai::types::ChatCompletionMessageToolCall;
use chrono::{Local, NaiveDate};
use tracing::{debug, info};

/// Default ceiling on model calls per run.
pub const DEFAULT_MAX_TURNS: usize = 15;

/// Build the default system prompt for a location and UTC offset.
pub fn default_system_prompt(location: &str, utc_offset: &str) -> String {
    format!(
        r#"You are an Executive Daily Briefing agent for a technology-consulting CEO.

Deliver a concise plain-text e-mail with these sections:
1. TODAY'S HEADLINES - 5-7 bullets
2. MEETINGS & COMMITMENTS - HH:MM local time (UTC{utc_offset})
3. WEATHER - {location}
4. MARKETS OVERNIGHT

Use ONLY the provided functions to gather data. Meeting times from get_meetings
are UTC; convert them to local time. Omit any section that has no data.
No HTML or markdown. At most 200 words."#
    )
}

/// The user instruction naming the briefing date.
pub fn user_instruction(date: NaiveDate) -> String {
    format!(
        "Generate the executive daily briefing for {}.",
        date.format("%Y-%m-%d")
    )
}

/// Agent that gathers briefing data through tools and writes the briefing.
pub struct BriefingAgent {
    model: Box<dyn ChatModel>,
    tools: Toolbox,
    retry: RetryPolicy,
    max_turns: usize,
    system_prompt: String,
}

impl BriefingAgent {
    /// Create a new agent with the given model and toolbox.
    pub fn new(model: Box<dyn ChatModel>, tools: Toolbox) -> Self {
        Self {
            model,
            tools,
            retry: RetryPolicy::default(),
            max_turns: DEFAULT_MAX_TURNS,
            system_prompt: default_system_prompt("Melbourne", "+10:00"),
        }
    }

    /// Build the production agent: OpenAI model and real data sources.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let model = OpenAIChatModel::new(&settings.agent.model, settings.agent.api_base.as_deref())?;
        let tools = Toolbox::from_settings(settings)?;

        let prompt = match &settings.agent.system_prompt {
            Some(prompt) => prompt.clone(),
            None => {
                let offset = Local::now().format("%:z").to_string();
                default_system_prompt(&settings.weather.location, &offset)
            }
        };

        Ok(Self::new(Box::new(model), tools)
            .with_system_prompt(&prompt)
            .with_max_turns(settings.agent.max_turns)
            .with_retry_policy(RetryPolicy::attempts(settings.agent.max_attempts)))
    }

    /// Set a custom system prompt.
    pub fn with_system_prompt(mut self, prompt: &str) -> Self {
        self.system_prompt = prompt.to_string();
        self
    }

    /// Set the ceiling on model calls for one run.
    pub fn with_max_turns(mut self, max: usize) -> Self {
        self.max_turns = max;
        self
    }

    pub fn with_retry_policy(mut self, policy: RetryPolicy) -> Self {
        self.retry = policy;
        self
    }

    /// Produce the briefing text for `date`.
    pub async fn run(&self, date: NaiveDate) -> Result<BriefingReport> {
        let mut conversation = Conversation::new(&self.system_prompt, &user_instruction(date))?;
        let tools = tool_definitions();

        let mut turns = 0;
        let mut tool_calls_made = Vec::new();

        loop {
            turns += 1;
            if turns > self.max_turns {
                return Err(BriefError::Agent(format!(
                    "Agent exceeded maximum turns ({})",
                    self.max_turns
                )));
            }

            debug!("Agent turn {}", turns);

            match self.model.complete(conversation.messages(), &tools).await? {
                ModelReply::Text(content) => {
                    info!(
                        "Briefing complete after {} turn(s) and {} tool call(s)",
                        turns,
                        tool_calls_made.len()
                    );
                    return Ok(BriefingReport {
                        content,
                        tool_calls: tool_calls_made,
                        turns,
                    });
                }
                ModelReply::ToolCalls(calls) => {
                    // Validate the whole batch before running any of it
                    let parsed = calls
                        .iter()
                        .map(|c| ToolCall::parse(&c.function.name, &c.function.arguments))
                        .collect::<Result<Vec<_>>>()?;

                    conversation.push_tool_calls(calls.clone())?;

                    for (call, tool) in calls.iter().zip(parsed) {
                        let record = self.dispatch(call, &tool).await?;
                        conversation.push_tool_result(&call.id, &record.result)?;
                        tool_calls_made.push(record);
                    }
                }
            }
        }
    }

    /// Invoke one tool under the retry policy and record the outcome.
    async fn dispatch(
        &self,
        call: &ChatCompletionMessageToolCall,
        tool: &ToolCall,
    ) -> Result<ToolCallRecord> {
        info!(
            "Agent calling tool: {} with args: {}",
            call.function.name, call.function.arguments
        );

        let mut attempts = 0;
        let payload = retry(self.retry, tool.name(), || {
            attempts += 1;
            self.tools.invoke(tool)
        })
        .await?;

        let result = serde_json::to_string(&payload)?;
        info!("Tool {} returned: {}", tool.name(), result);

        Ok(ToolCallRecord {
            name: call.function.name.clone(),
            arguments: call.function.arguments.clone(),
            result,
            attempts,
        })
    }
}

/// Response from an agent run.
#[derive(Debug)]
pub struct BriefingReport {
    /// The final briefing text, empty if the model returned no content.
    pub content: String,
    /// Record of all tool calls made during execution.
    pub tool_calls: Vec<ToolCallRecord>,
    /// Number of model calls used.
    pub turns: usize,
}

/// Record of a tool call made by the agent.
#[derive(Debug, Clone)]
pub struct ToolCallRecord {
    /// Name of the tool called.
    pub name: String,
    /// JSON arguments passed to the tool.
    pub arguments: String,
    /// JSON payload returned by the tool.
    pub result: String,
    /// Attempts needed, including the successful one.
    pub attempts: usize,
}

impl std::fmt::Display for ToolCallRecord {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}({})", self.name, self.arguments)
    }
}
