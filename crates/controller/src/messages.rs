//! Message shapes crossing the transport boundary
//!
//! Every message is `{"type": "...", "payload": {...}}`; payload-less messages
//! carry only the type.

use chain_flow::{ChainErrorCode, ChainProgress};
use langqueue_core_types::{ChainStep, InsertionMode, PromptId};
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Inbound {
    InjectPrompt(InjectPrompt),
    CompatCheck,
    ClickSend,
    RunChain(RunChain),
    CancelChain,
    EnqueuePrompt(EnqueuePrompt),
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "payload", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Outbound {
    CompatStatus(CompatStatus),
    InjectPromptResult(InjectPromptResult),
    RunChainResult(RunChainResult),
    ChainProgress(ChainProgress),
    TextareaReady,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectPrompt {
    #[serde(default)]
    pub content: String,
}

#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RunChain {
    #[serde(default)]
    pub steps: Vec<ChainStep>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub insertion_mode_override: Option<InsertionMode>,
}

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct EnqueuePrompt {
    pub content: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt_id: Option<PromptId>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompatStatus {
    pub ready: bool,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum InjectFailure {
    NoContent,
    InputNotFound,
    InjectionFailed,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct InjectPromptResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<InjectFailure>,
}

impl InjectPromptResult {
    pub fn ok() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn failed(reason: InjectFailure) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
        }
    }
}

/// Acknowledgement of a `RUN_CHAIN`; the run itself reports through
/// `CHAIN_PROGRESS`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunChainResult {
    pub ok: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<ChainErrorCode>,
}

impl RunChainResult {
    pub fn accepted() -> Self {
        Self {
            ok: true,
            reason: None,
        }
    }

    pub fn rejected(reason: ChainErrorCode) -> Self {
        Self {
            ok: false,
            reason: Some(reason),
        }
    }
}
