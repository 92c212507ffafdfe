//! Splits a single text input into ordered chunks (ground: `node_chunk.go`'s
//! `WFChunkNode`, with the Go generic `ChunkSizeContext`/`CtxValue` lookup
//! simplified to a plain constructor parameter).

use super::super::node::NodeExecutor;
use super::super::{ConditionTable, NodeHandle, WorkflowError};
use super::{IN_CHUNK, OUT_CHUNK};
use crate::convoke::chunk::{split_text_into_chunks, DEFAULT_CHUNK_SIZE};
use async_trait::async_trait;
use serde_json::Value;

pub struct ChunkerNode {
    chunk_size: usize,
}

impl ChunkerNode {
    pub fn new(chunk_size: usize) -> Self {
        Self { chunk_size }
    }
}

impl Default for ChunkerNode {
    fn default() -> Self {
        Self::new(DEFAULT_CHUNK_SIZE)
    }
}

#[async_trait]
impl NodeExecutor for ChunkerNode {
    async fn execute(&self, params: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError> {
        let input = params
            .get(IN_CHUNK)
            .and_then(Value::as_str)
            .ok_or_else(|| WorkflowError::Execution("input param is not set".to_string()))?;

        let chunks = split_text_into_chunks(input, self.chunk_size);
        let output = Value::Array(chunks.into_iter().map(Value::String).collect());

        if !node.output(OUT_CHUNK, output).await? {
            return Err(WorkflowError::Execution("node is not finished".to_string()));
        }
        Ok("success".to_string())
    }
}
