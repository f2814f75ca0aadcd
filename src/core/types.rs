//! Shared types used across Medscribe modules
//!
//! Contains agent roles, chat messages and the raw response shape.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::core::error::MedscribeError;

/// Agent role. Each role maps to exactly one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Task {
    Summarize,
    WriteArticle,
    Refiner,
    Validator,
    SanitizeData,
    SanitizeDataValidator,
    SummarizeValidator,
}

impl Task {
    /// Every known role
    pub const ALL: [Task; 7] = [
        Task::Summarize,
        Task::WriteArticle,
        Task::Refiner,
        Task::Validator,
        Task::SanitizeData,
        Task::SanitizeDataValidator,
        Task::SummarizeValidator,
    ];

    /// Registry name of the role
    pub fn as_str(&self) -> &'static str {
        match self {
            Task::Summarize => "summarize",
            Task::WriteArticle => "write_article",
            Task::Refiner => "refiner",
            Task::Validator => "validator",
            Task::SanitizeData => "sanitize_data",
            Task::SanitizeDataValidator => "sanitize_data_validator",
            Task::SummarizeValidator => "summarize_validator",
        }
    }
}

impl fmt::Display for Task {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Task {
    type Err = MedscribeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Task::ALL
            .into_iter()
            .find(|task| task.as_str() == s)
            .ok_or_else(|| MedscribeError::UnknownRole(s.to_string()))
    }
}

/// A message in a model request
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    /// Role of the message sender (user, assistant, system)
    pub role: String,
    /// Content of the message
    pub content: String,
}

impl Message {
    /// Create a new user message
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: "user".to_string(),
            content: content.into(),
        }
    }

    /// Create a new system message
    pub fn system(content: impl Into<String>) -> Self {
        Self {
            role: "system".to_string(),
            content: content.into(),
        }
    }
}

/// Response exactly as the provider returned it
#[derive(Debug, Clone, PartialEq)]
pub enum RawResponse {
    /// Plain text, possibly holding an embedded JSON object
    Text(String),
    /// Structured payload, optionally carrying a `content` field
    Structured(serde_json::Value),
}

impl RawResponse {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }
}

impl From<String> for RawResponse {
    fn from(text: String) -> Self {
        Self::Text(text)
    }
}

impl From<&str> for RawResponse {
    fn from(text: &str) -> Self {
        Self::Text(text.to_string())
    }
}

impl From<serde_json::Value> for RawResponse {
    fn from(value: serde_json::Value) -> Self {
        Self::Structured(value)
    }
}
