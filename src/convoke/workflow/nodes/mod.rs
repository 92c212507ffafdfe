//! Built-in [`super::NodeExecutor`] implementations: the bot-invoking nodes
//! (scatter, reduce, with-history) and the plumbing nodes that shape data
//! between them (chunker, collector, flatten, serializer, printer).

pub mod bot_reduce;
pub mod bot_scatter;
pub mod bot_with_history;
pub mod chunker;
pub mod collector;
pub mod flatten;
pub mod printer;
pub mod serializer;

use super::WorkflowError;
use serde_json::Value;
use std::sync::Arc;

/// The input port shared by the bot-invoking nodes: a question, or a list of
/// questions to fan out over.
pub const IN_QUESTION: &str = "question";
/// The output port shared by the bot-invoking nodes.
pub const OUT_ANSWER: &str = "answer";
/// The extra history-seed input port used only by [`bot_with_history`].
pub const IN_HISTORY: &str = "history";

pub const OUT_COLLECT: &str = "collect";

pub const IN_FLATTEN_SLICES: &str = "slices";
pub const OUT_FLATTEN_SLICE: &str = "slice";

pub const IN_CHUNK: &str = "input";
pub const OUT_CHUNK: &str = "chunks";

/// Optional post-processing hook run over a bot's raw reply before it is
/// pushed downstream, mirroring the source material's `afterFunc func(answer
/// string) (any, error)` constructor parameter.
pub type AfterFn = Arc<dyn Fn(&str) -> Result<Value, WorkflowError> + Send + Sync>;

/// Accepts either a bare string or a list of strings (the shape every
/// bot-invoking node's question input is declared to take), normalizing to a
/// list either way.
pub fn input_list(value: &Value) -> Result<Vec<String>, WorkflowError> {
    let list = match value {
        Value::String(s) => vec![s.clone()],
        Value::Array(items) => items
            .iter()
            .map(|v| {
                v.as_str()
                    .map(|s| s.to_string())
                    .ok_or_else(|| WorkflowError::Execution("input param must be string or list of strings".to_string()))
            })
            .collect::<Result<Vec<_>, _>>()?,
        _ => {
            return Err(WorkflowError::Execution(
                "input param must be string or list of strings".to_string(),
            ))
        }
    };
    if list.is_empty() {
        return Err(WorkflowError::Execution("input param is empty".to_string()));
    }
    Ok(list)
}

/// Collapses a single-element list back to a bare value, matching every
/// bot-invoking node's "one input in, one output out" convention.
pub fn single_or_list(mut items: Vec<Value>) -> Value {
    if items.len() == 1 {
        items.pop().expect("len checked")
    } else {
        Value::Array(items)
    }
}

/// Flattens nested JSON arrays up to `depth` levels deep; non-array values
/// pass through unchanged. Used by [`collector`], which always flattens its
/// merged inputs regardless of nesting shape.
pub fn flatten_nested_slices(values: &[Value], depth: usize) -> Vec<Value> {
    let mut out = Vec::with_capacity(values.len());
    for v in values {
        match v {
            Value::Array(items) if depth > 0 => out.extend(flatten_nested_slices(items, depth - 1)),
            other => out.push(other.clone()),
        }
    }
    out
}
