//! Function-calling agent that writes the daily briefing.
//!
//! The model is given a fixed catalog of data tools and a target date. It
//! calls tools until it has what it needs, then returns the briefing text.

mod conversation;
mod model;
mod runner;
mod tools;

pub use conversation::Conversation;
pub use model::{ChatModel, ModelReply, OpenAIChatModel};
pub use runner::{
    default_system_prompt, user_instruction, BriefingAgent, BriefingReport, ToolCallRecord,
    DEFAULT_MAX_TURNS,
};
pub use tools::{tool_definitions, ToolCall, Toolbox};
