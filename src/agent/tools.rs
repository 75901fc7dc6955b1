//! Tool catalog, argument validation and dispatch for the agent.

use crate::config::Settings;
use crate::error::{BriefError, Result};
use crate::sources::{
    CalendarSource, FileTokenStore, GraphCalendar, MarketData, MarketSource, NewsSource, RssNews,
    WeatherApi, WeatherSource,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;
use tracing::warn;

/// A validated tool call requested by the model.
#[derive(Debug, Clone, PartialEq)]
pub enum ToolCall {
    /// Top news headlines for a date.
    GetHeadlines {
        iso_date: String,
        query: Option<String>,
        page_size: Option<usize>,
    },

    /// Calendar meetings on a date.
    GetMeetings { iso_date: String },

    /// One-day weather forecast.
    GetWeather { iso_date: String },

    /// AUD/USD rate and NASDAQ previous close.
    GetFinancials,

    /// A name outside the catalog. Answered with an empty object.
    Unknown { name: String },
}

const KNOWN_TOOLS: [&str; 4] = ["get_headlines", "get_meetings", "get_weather", "get_financials"];

#[derive(Debug, Deserialize)]
struct HeadlineArgs {
    iso_date: String,
    #[serde(default)]
    query: Option<String>,
    #[serde(default)]
    page_size: Option<usize>,
}

#[derive(Debug, Deserialize)]
struct DateArgs {
    iso_date: String,
}

impl ToolCall {
    /// Parse a tool call from the OpenAI response format.
    ///
    /// Empty arguments count as `{}`. Malformed JSON is always rejected. For
    /// catalog tools a non-object payload, or fields that do not fit the
    /// tool's parameters, are rejected too; any other name with well-formed
    /// JSON becomes [`ToolCall::Unknown`].
    pub fn parse(name: &str, arguments: &str) -> Result<ToolCall> {
        let raw = if arguments.trim().is_empty() {
            "{}"
        } else {
            arguments
        };

        let args: Value = serde_json::from_str(raw).map_err(|e| invalid(name, e))?;
        if !KNOWN_TOOLS.contains(&name) {
            return Ok(ToolCall::Unknown {
                name: name.to_string(),
            });
        }
        if !args.is_object() {
            return Err(BriefError::InvalidToolArguments {
                tool: name.to_string(),
                reason: "arguments must be a JSON object".to_string(),
            });
        }

        match name {
            "get_headlines" => {
                let a: HeadlineArgs = typed(name, args)?;
                Ok(ToolCall::GetHeadlines {
                    iso_date: a.iso_date,
                    query: a.query,
                    page_size: a.page_size,
                })
            }
            "get_meetings" => {
                let a: DateArgs = typed(name, args)?;
                Ok(ToolCall::GetMeetings {
                    iso_date: a.iso_date,
                })
            }
            "get_weather" => {
                let a: DateArgs = typed(name, args)?;
                Ok(ToolCall::GetWeather {
                    iso_date: a.iso_date,
                })
            }
            "get_financials" => Ok(ToolCall::GetFinancials),
            other => Ok(ToolCall::Unknown {
                name: other.to_string(),
            }),
        }
    }

    /// Catalog name of the tool.
    pub fn name(&self) -> &str {
        match self {
            ToolCall::GetHeadlines { .. } => "get_headlines",
            ToolCall::GetMeetings { .. } => "get_meetings",
            ToolCall::GetWeather { .. } => "get_weather",
            ToolCall::GetFinancials => "get_financials",
            ToolCall::Unknown { name } => name,
        }
    }
}

fn typed<T: DeserializeOwned>(tool: &str, args: Value) -> Result<T> {
    serde_json::from_value(args).map_err(|e| invalid(tool, e))
}

fn invalid(tool: &str, e: serde_json::Error) -> BriefError {
    BriefError::InvalidToolArguments {
        tool: tool.to_string(),
        reason: e.to_string(),
    }
}

/// The data sources the agent can call.
#[derive(Clone)]
pub struct Toolbox {
    news: Arc<dyn NewsSource>,
    calendar: Arc<dyn CalendarSource>,
    weather: Arc<dyn WeatherSource>,
    market: Arc<dyn MarketSource>,
}

impl Toolbox {
    pub fn new(
        news: Arc<dyn NewsSource>,
        calendar: Arc<dyn CalendarSource>,
        weather: Arc<dyn WeatherSource>,
        market: Arc<dyn MarketSource>,
    ) -> Self {
        Self {
            news,
            calendar,
            weather,
            market,
        }
    }

    /// Build the production sources sharing one HTTP client.
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let http = reqwest::Client::builder()
            .user_agent(concat!("brief-agent/", env!("CARGO_PKG_VERSION")))
            .build()?;
        let store = Arc::new(FileTokenStore::new(settings.token_cache_path()));

        Ok(Self::new(
            Arc::new(RssNews::new(http.clone(), &settings.news)),
            Arc::new(GraphCalendar::new(http.clone(), &settings.calendar, store)),
            Arc::new(WeatherApi::new(http.clone(), &settings.weather)),
            Arc::new(MarketData::new(http, &settings.market)),
        ))
    }

    pub fn news(&self) -> &dyn NewsSource {
        self.news.as_ref()
    }

    pub fn calendar(&self) -> &dyn CalendarSource {
        self.calendar.as_ref()
    }

    pub fn weather(&self) -> &dyn WeatherSource {
        self.weather.as_ref()
    }

    pub fn market(&self) -> &dyn MarketSource {
        self.market.as_ref()
    }

    /// Run a tool call and return its JSON payload.
    pub async fn invoke(&self, tool: &ToolCall) -> Result<Value> {
        match tool {
            ToolCall::GetHeadlines {
                iso_date,
                query,
                page_size,
            } => {
                let headlines = self
                    .news
                    .headlines(iso_date, query.as_deref(), *page_size)
                    .await?;
                Ok(serde_json::to_value(headlines)?)
            }
            ToolCall::GetMeetings { iso_date } => {
                Ok(serde_json::to_value(self.calendar.meetings(iso_date).await?)?)
            }
            ToolCall::GetWeather { iso_date } => {
                Ok(serde_json::to_value(self.weather.forecast(iso_date).await?)?)
            }
            ToolCall::GetFinancials => Ok(serde_json::to_value(self.market.financials().await?)?),
            ToolCall::Unknown { name } => {
                warn!("Model requested unknown tool: {}", name);
                Ok(json!({}))
            }
        }
    }
}

/// Get OpenAI function/tool definitions for the agent.
pub fn tool_definitions() -> Vec<async_openai::types::ChatCompletionTool> {
    use async_openai::types::{ChatCompletionTool, ChatCompletionToolType, FunctionObject};

    vec![
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "get_headlines".to_string(),
                description: Some(
                    "Return top news headlines for the given date, \
                    optionally filtered by a query."
                        .to_string(),
                ),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "iso_date": {
                            "type": "string",
                            "description": "Date in YYYY-MM-DD format"
                        },
                        "query": {
                            "type": "string",
                            "description": "Only keep headlines whose title contains this text"
                        },
                        "page_size": {
                            "type": "integer",
                            "description": "Maximum number of headlines (default: 7)",
                            "default": 7
                        }
                    },
                    "required": ["iso_date"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "get_meetings".to_string(),
                description: Some(
                    "Return calendar meetings scheduled on the given date. \
                    Times are UTC."
                        .to_string(),
                ),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "iso_date": {
                            "type": "string",
                            "description": "Date in YYYY-MM-DD format"
                        }
                    },
                    "required": ["iso_date"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "get_weather".to_string(),
                description: Some(
                    "Return min/max temperature (°C) and chance of rain for the given date."
                        .to_string(),
                ),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {
                        "iso_date": {
                            "type": "string",
                            "description": "Date in YYYY-MM-DD format"
                        }
                    },
                    "required": ["iso_date"]
                })),
                strict: None,
            },
        },
        ChatCompletionTool {
            r#type: ChatCompletionToolType::Function,
            function: FunctionObject {
                name: "get_financials".to_string(),
                description: Some(
                    "Return the AUD to USD exchange rate and the NASDAQ previous close."
                        .to_string(),
                ),
                parameters: Some(json!({
                    "type": "object",
                    "properties": {}
                })),
                strict: None,
            },
        },
    ]
}
