//! Re-renders the single wired input into a chosen textual or list shape
//! (ground: `serializer.go`'s `WFSerializer`; Markdown/default rendering
//! reimplemented over `serde_json::Value` instead of Go `reflect`).

use super::super::node::NodeExecutor;
use super::super::{ConditionTable, NodeHandle, WorkflowError};
use crate::convoke::workflow::connector::SINGLE_NODE_PARAM;
use async_trait::async_trait;
use serde_json::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SerializeMode {
    AnyLst,
    JsonStrLst,
    YamlStrLst,
    MarkdownStrLst,
    DefaultStrLst,
    JsonStr,
    YamlStr,
    MarkdownStr,
    DefaultStr,
}

pub struct SerializerNode {
    mode: SerializeMode,
}

impl SerializerNode {
    pub fn new(mode: SerializeMode) -> Self {
        Self { mode }
    }
}

fn as_slice(value: &Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items.clone(),
        other => vec![other.clone()],
    }
}

fn to_json_str(value: &Value) -> Result<String, WorkflowError> {
    serde_json::to_string(value).map_err(|e| WorkflowError::Execution(format!("json serialize failed: {}", e)))
}

fn to_yaml_str(value: &Value) -> Result<String, WorkflowError> {
    serde_yaml::to_string(value).map_err(|e| WorkflowError::Execution(format!("yaml serialize failed: {}", e)))
}

fn to_display_str(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Null => "null".to_string(),
        other => other.to_string(),
    }
}

fn to_markdown_str(value: &Value) -> String {
    match value {
        Value::String(s) => format!("`{}`", s),
        Value::Number(n) => format!("`{}`", n),
        Value::Bool(b) => format!("`{}`", b),
        Value::Null => "`null`".to_string(),
        Value::Array(items) => {
            let mut out = String::from("- List:\n");
            for item in items {
                out.push_str(&format!("  - {}\n", to_markdown_str(item)));
            }
            out
        }
        Value::Object(map) => {
            let mut out = String::from("- Map:\n");
            for (key, val) in map {
                out.push_str(&format!("  - `{}`: {}\n", key, to_markdown_str(val)));
            }
            out
        }
    }
}

fn process_list(input: &Value, f: impl Fn(&Value) -> Result<String, WorkflowError>) -> Result<Value, WorkflowError> {
    let rendered = as_slice(input)
        .iter()
        .map(&f)
        .collect::<Result<Vec<_>, _>>()?
        .into_iter()
        .map(Value::String)
        .collect();
    Ok(Value::Array(rendered))
}

#[async_trait]
impl NodeExecutor for SerializerNode {
    async fn execute(&self, params: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError> {
        let input = params
            .get(SINGLE_NODE_PARAM)
            .ok_or_else(|| WorkflowError::Execution(format!("input param {} is not set", SINGLE_NODE_PARAM)))?;

        let output = match self.mode {
            SerializeMode::AnyLst => Value::Array(as_slice(input)),
            SerializeMode::JsonStr => Value::String(to_json_str(input)?),
            SerializeMode::JsonStrLst => process_list(input, |v| to_json_str(v))?,
            SerializeMode::YamlStr => Value::String(to_yaml_str(input)?),
            SerializeMode::YamlStrLst => process_list(input, |v| to_yaml_str(v))?,
            SerializeMode::MarkdownStr => Value::String(to_markdown_str(input)),
            SerializeMode::MarkdownStrLst => process_list(input, |v| Ok(to_markdown_str(v)))?,
            SerializeMode::DefaultStr => Value::String(to_display_str(input)),
            SerializeMode::DefaultStrLst => process_list(input, |v| Ok(to_display_str(v)))?,
        };

        if !node.output(SINGLE_NODE_PARAM, output).await? {
            return Err(WorkflowError::Execution("node is not finished".to_string()));
        }
        Ok("success, data serialized".to_string())
    }
}
