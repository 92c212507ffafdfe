//! Plain `serde`-deserializable structs mirroring the YAML-shaped per-agent
//! configuration record.
//!
//! No YAML-parsing dependency is introduced here — callers deserialize these
//! with whatever format crate they already depend on (or build them
//! directly in Rust, which is how this crate's own tests do it). Loading a
//! config *file* is the out-of-scope external collaborator; the shape of
//! the config *record* is not.

use crate::convoke::prompt::{ActAs, FunctionCtxPolicy, FunctionModePolicy};
use serde::{Deserialize, Serialize};

/// Names and locates the external driver; this crate never constructs a
/// driver from it, it only carries the data through to whatever caller code
/// wires up the concrete `Arc<dyn Driver>`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DriverConfig {
    pub driver: String,
    pub endpoint: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionCtxConfig {
    All,
    Local,
}

impl From<FunctionCtxConfig> for FunctionCtxPolicy {
    fn from(c: FunctionCtxConfig) -> Self {
        match c {
            FunctionCtxConfig::All => FunctionCtxPolicy::All,
            FunctionCtxConfig::Local => FunctionCtxPolicy::Local,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FunctionModeConfig {
    Normal,
    Sample,
}

impl From<FunctionModeConfig> for FunctionModePolicy {
    fn from(c: FunctionModeConfig) -> Self {
        match c {
            FunctionModeConfig::Normal => FunctionModePolicy::Normal,
            FunctionModeConfig::Sample => FunctionModePolicy::Sample,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub content: String,
    #[serde(default)]
    pub functions: Vec<String>,
    pub function_ctx: FunctionCtxConfig,
    pub function_mode: FunctionModeConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActAsConfig {
    Coordinator,
    Evaluator,
}

impl From<ActAsConfig> for ActAs {
    fn from(c: ActAsConfig) -> Self {
        match c {
            ActAsConfig::Coordinator => ActAs::Coordinator,
            ActAsConfig::Evaluator => ActAs::Evaluator,
        }
    }
}

/// The full on-disk shape of one agent definition.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BotConfig {
    pub prefab_name: String,
    pub usage: String,
    pub driver: DriverConfig,
    pub prompt: PromptConfig,
    #[serde(default)]
    pub ack_as: Option<ActAsConfig>,
    #[serde(default)]
    pub act_as_context: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bot_config_round_trips_through_json() {
        let cfg = BotConfig {
            prefab_name: "worker".to_string(),
            usage: "does work".to_string(),
            driver: DriverConfig {
                driver: "openai".to_string(),
                endpoint: "https://api.example.com".to_string(),
            },
            prompt: PromptConfig {
                content: "You are a worker.".to_string(),
                functions: vec!["search".to_string()],
                function_ctx: FunctionCtxConfig::All,
                function_mode: FunctionModeConfig::Normal,
            },
            ack_as: Some(ActAsConfig::Coordinator),
            act_as_context: None,
        };
        let json = serde_json::to_string(&cfg).unwrap();
        let back: BotConfig = serde_json::from_str(&json).unwrap();
        assert_eq!(back.prefab_name, "worker");
        assert!(matches!(back.ack_as, Some(ActAsConfig::Coordinator)));
    }
}
