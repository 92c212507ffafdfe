//! Collects every wired input into one value, always flattening up to two
//! levels of nested arrays (ground: `node_collect.go`'s `WFCollect`).

use super::super::node::NodeExecutor;
use super::super::{ConditionTable, NodeHandle, WorkflowError};
use super::{flatten_nested_slices, OUT_COLLECT};
use async_trait::async_trait;
use serde_json::Value;

/// Mirrors the source material's `outMode any` constructor argument, whose
/// three accepted shapes (`[]any`, `[]string`, `string`) become this enum.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CollectMode {
    AnyList,
    StringList,
    JsonString,
}

pub struct CollectorNode {
    mode: CollectMode,
}

impl CollectorNode {
    pub fn new(mode: CollectMode) -> Self {
        Self { mode }
    }
}

#[async_trait]
impl NodeExecutor for CollectorNode {
    async fn execute(&self, params: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError> {
        // HashMap iteration order is unspecified; sorting by port name keeps
        // collection order stable across runs (the source material's map
        // iteration gave no such guarantee either way).
        let mut entries: Vec<(&String, &Value)> = params.iter().collect();
        entries.sort_by_key(|(name, _)| name.as_str());
        let inputs: Vec<Value> = entries.into_iter().map(|(_, v)| v.clone()).collect();

        let flattened = flatten_nested_slices(&inputs, 2);

        let output = match self.mode {
            CollectMode::AnyList => Value::Array(flattened),
            CollectMode::StringList => Value::Array(
                flattened
                    .iter()
                    .map(|v| match v {
                        Value::Null => Value::String(String::new()),
                        Value::String(s) if !s.is_empty() => Value::String(s.clone()),
                        other => Value::String(other.to_string()),
                    })
                    .collect(),
            ),
            CollectMode::JsonString => {
                let s = serde_json::to_string(&flattened)
                    .map_err(|e| WorkflowError::Execution(format!("collect json serialize failed: {}", e)))?;
                Value::String(s)
            }
        };

        if !node.output(OUT_COLLECT, output).await? {
            return Err(WorkflowError::Execution("node is not finished".to_string()));
        }
        Ok("success, slice merged".to_string())
    }
}
