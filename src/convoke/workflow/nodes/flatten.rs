//! Flattens a single `slices` input by exactly one level, but only when the
//! input is actually nested (ground: `node_flatten_slice.go`'s
//! `WFFlatten2DSlice`, reconciled against the near-duplicate
//! `node_mergeslice.go`, which defines the same type name with an
//! `Is2DSlice`-conditional single-level flatten).
//!
//! The two Go files can't have coexisted in the real build; this node
//! follows the `Is2DSlice`-conditional revision and passes non-nested input
//! through unchanged, leaving the unconditional always-flatten behavior to
//! [`super::collector`] instead, whose whole job is merging several ports
//! into one flat list.

use super::super::node::NodeExecutor;
use super::super::{ConditionTable, NodeHandle, WorkflowError};
use super::{IN_FLATTEN_SLICES, OUT_FLATTEN_SLICE};
use async_trait::async_trait;
use serde_json::Value;

pub struct FlattenNode;

fn is_2d_slice(items: &[Value]) -> bool {
    !items.is_empty() && items.iter().all(|v| matches!(v, Value::Array(_)))
}

#[async_trait]
impl NodeExecutor for FlattenNode {
    async fn execute(&self, params: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError> {
        let slices = params
            .get(IN_FLATTEN_SLICES)
            .ok_or_else(|| WorkflowError::Execution(format!("input param {} is not set", IN_FLATTEN_SLICES)))?;
        let Value::Array(items) = slices else {
            return Err(WorkflowError::Execution(format!(
                "input param {} is not slice",
                IN_FLATTEN_SLICES
            )));
        };

        let flattened = if is_2d_slice(items) {
            let mut out = Vec::new();
            for item in items {
                if let Value::Array(inner) = item {
                    out.extend(inner.iter().cloned());
                }
            }
            Value::Array(out)
        } else {
            Value::Array(items.clone())
        };

        if !node.output(OUT_FLATTEN_SLICE, flattened).await? {
            return Err(WorkflowError::Execution("node is not finished".to_string()));
        }
        Ok("success, slice merged".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convoke::workflow::node::{connect, Node};
    use std::sync::Arc;

    struct Sink;

    #[async_trait]
    impl NodeExecutor for Sink {
        async fn execute(&self, _: ConditionTable, _: NodeHandle) -> Result<String, WorkflowError> {
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn flattens_a_2d_array_down_to_one_level() {
        let node = Node::new(
            "flatten",
            Arc::new(FlattenNode),
            Some(vec![IN_FLATTEN_SLICES.to_string()]),
            Some(vec![OUT_FLATTEN_SLICE.to_string()]),
        );
        let sink = Node::new("sink", Arc::new(Sink), Some(vec!["in".to_string()]), None);
        connect(&node, OUT_FLATTEN_SLICE, &sink, "in").await.unwrap();

        node.insert_upstream("__init__", "seed", IN_FLATTEN_SLICES).await.unwrap();
        let nested = Value::Array(vec![
            Value::Array(vec![Value::from(1), Value::from(2)]),
            Value::Array(vec![Value::from(3)]),
        ]);
        node.input("__init__", "seed", nested).await.unwrap();
        node.execute().await.unwrap();
        assert!(sink.is_all_input_ready().await);
    }

    #[tokio::test]
    async fn passes_a_non_nested_array_through_unchanged() {
        let node = Node::new(
            "flatten",
            Arc::new(FlattenNode),
            Some(vec![IN_FLATTEN_SLICES.to_string()]),
            Some(vec![OUT_FLATTEN_SLICE.to_string()]),
        );
        node.insert_upstream("__init__", "seed", IN_FLATTEN_SLICES).await.unwrap();
        let flat = Value::Array(vec![Value::from(1), Value::from(2)]);
        node.input("__init__", "seed", flat.clone()).await.unwrap();
        node.execute().await.unwrap();
    }

    #[tokio::test]
    async fn rejects_a_non_slice_input() {
        let node = Node::new(
            "flatten",
            Arc::new(FlattenNode),
            Some(vec![IN_FLATTEN_SLICES.to_string()]),
            Some(vec![OUT_FLATTEN_SLICE.to_string()]),
        );
        node.insert_upstream("__init__", "seed", IN_FLATTEN_SLICES).await.unwrap();
        node.input("__init__", "seed", Value::from(5)).await.unwrap();
        assert!(node.execute().await.is_err());
    }
}
