use std::fmt;
use std::str::FromStr;

use thiserror::Error;
use uuid::Uuid;

/// Shared error type for the kernel crates.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum LqError {
    #[error("unknown insertion mode '{0}'")]
    UnknownInsertionMode(String),
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[derive(Clone, Debug, Eq, PartialEq, Hash)]
pub struct PromptId(pub String);

impl PromptId {
    pub fn new() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

impl Default for PromptId {
    fn default() -> Self {
        Self::new()
    }
}

/// Identity of a supported chat host.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum AdapterId {
    Chatgpt,
    Claude,
    Gemini,
}

impl AdapterId {
    pub fn as_str(&self) -> &'static str {
        match self {
            AdapterId::Chatgpt => "chatgpt",
            AdapterId::Claude => "claude",
            AdapterId::Gemini => "gemini",
        }
    }
}

impl fmt::Display for AdapterId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether injected text replaces or follows the current field content.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "lowercase"))]
#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Hash)]
pub enum InsertionMode {
    #[default]
    Overwrite,
    Append,
}

impl FromStr for InsertionMode {
    type Err = LqError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "overwrite" => Ok(InsertionMode::Overwrite),
            "append" => Ok(InsertionMode::Append),
            other => Err(LqError::UnknownInsertionMode(other.to_string())),
        }
    }
}

impl fmt::Display for InsertionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InsertionMode::Overwrite => f.write_str("overwrite"),
            InsertionMode::Append => f.write_str("append"),
        }
    }
}

/// One step of a chain. Unset policy fields fall back to the chain defaults.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChainStep {
    pub content: String,
    #[cfg_attr(
        feature = "serde-full",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub auto_send: Option<bool>,
    #[cfg_attr(
        feature = "serde-full",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub await_response: Option<bool>,
    #[cfg_attr(
        feature = "serde-full",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub delay_ms: Option<u64>,
}

impl ChainStep {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            ..Self::default()
        }
    }

    pub fn with_auto_send(mut self, value: bool) -> Self {
        self.auto_send = Some(value);
        self
    }

    pub fn with_await_response(mut self, value: bool) -> Self {
        self.await_response = Some(value);
        self
    }

    pub fn with_delay_ms(mut self, value: u64) -> Self {
        self.delay_ms = Some(value);
        self
    }
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct ChainDefaults {
    #[cfg_attr(
        feature = "serde-full",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub auto_send: Option<bool>,
    #[cfg_attr(
        feature = "serde-full",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub await_response: Option<bool>,
    #[cfg_attr(
        feature = "serde-full",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub default_delay_ms: Option<u64>,
}

/// Persisted user settings consumed by the automation core.
#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct AppSettings {
    #[cfg_attr(
        feature = "serde-full",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub insertion_mode: Option<InsertionMode>,
    #[cfg_attr(feature = "serde-full", serde(default))]
    pub chain_defaults: ChainDefaults,
}

#[cfg_attr(feature = "serde-full", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde-full", serde(rename_all = "camelCase"))]
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct QueueItem {
    pub content: String,
    #[cfg_attr(
        feature = "serde-full",
        serde(default, skip_serializing_if = "Option::is_none")
    )]
    pub prompt_id: Option<PromptId>,
}

impl QueueItem {
    pub fn new(content: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            prompt_id: None,
        }
    }

    pub fn with_prompt(mut self, prompt_id: PromptId) -> Self {
        self.prompt_id = Some(prompt_id);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insertion_mode_parses_case_insensitively() {
        assert_eq!(
            "Append".parse::<InsertionMode>().unwrap(),
            InsertionMode::Append
        );
        assert_eq!(
            " overwrite ".parse::<InsertionMode>().unwrap(),
            InsertionMode::Overwrite
        );
        assert!("replace".parse::<InsertionMode>().is_err());
    }

    #[test]
    fn insertion_mode_defaults_to_overwrite() {
        assert_eq!(InsertionMode::default(), InsertionMode::Overwrite);
    }

    #[test]
    fn chain_step_builder_sets_policy() {
        let step = ChainStep::new("s1")
            .with_auto_send(false)
            .with_delay_ms(500);
        assert_eq!(step.content, "s1");
        assert_eq!(step.auto_send, Some(false));
        assert_eq!(step.await_response, None);
        assert_eq!(step.delay_ms, Some(500));
    }

    #[cfg(feature = "serde-full")]
    #[test]
    fn chain_step_uses_camel_case_wire_names() {
        let step: ChainStep =
            serde_json::from_str(r#"{"content":"hi","autoSend":false,"delayMs":250}"#).unwrap();
        assert_eq!(step.auto_send, Some(false));
        assert_eq!(step.delay_ms, Some(250));
        assert_eq!(step.await_response, None);
    }
}
