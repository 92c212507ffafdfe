//! [`Workflow`]: a named DAG with a synthetic start and end node, executed
//! wave-by-wave (all currently-ready nodes run concurrently, then the next
//! wave is whatever their outputs newly unblocked).

use super::node::{Node, NodeExecutor};
use super::{ConditionTable, NodeHandle, WorkflowError};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

const INIT_UPSTREAM: &str = "__init__";
const END_OUT_NAME: &str = "output";

struct StartExecutor;

#[async_trait]
impl NodeExecutor for StartExecutor {
    async fn execute(&self, params: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError> {
        let mut triggered = false;
        for (name, value) in params {
            if node.output(&name, value).await? {
                triggered = true;
            }
        }
        if !triggered {
            return Err(WorkflowError::NotFinished("__start".to_string()));
        }
        Ok("success".to_string())
    }
}

struct EndExecutor {
    output: Arc<RwLock<Option<Value>>>,
}

#[async_trait]
impl NodeExecutor for EndExecutor {
    async fn execute(&self, params: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError> {
        let value = Value::Object(params.into_iter().collect());
        let finished = node.output(END_OUT_NAME, value.clone()).await?;
        if !finished {
            return Err(WorkflowError::NotFinished("__end".to_string()));
        }
        *self.output.write().await = Some(value);
        Ok("success".to_string())
    }
}

/// A workflow: a start node accepting `init_params`, a DAG of user nodes,
/// and an end node whose arrival sets [`Workflow::output`].
pub struct Workflow {
    pub name: String,
    pub start_node: NodeHandle,
    pub end_node: NodeHandle,
    output: Arc<RwLock<Option<Value>>>,
}

impl Workflow {
    /// `start_out_names` are the param names the start node exposes
    /// downstream (normally the same as the keys of the `init_params` map
    /// passed to [`Workflow::execute`]); `end_in_names` are the param names
    /// the end node collects before finishing.
    pub fn new(name: impl Into<String>, start_out_names: Vec<String>, end_in_names: Vec<String>) -> Self {
        let output = Arc::new(RwLock::new(None));
        let start_node = Node::new("__start", Arc::new(StartExecutor), None, Some(start_out_names));
        let end_node = Node::new(
            "__end",
            Arc::new(EndExecutor { output: output.clone() }),
            Some(end_in_names),
            Some(vec![END_OUT_NAME.to_string()]),
        );
        Self {
            name: name.into(),
            start_node,
            end_node,
            output,
        }
    }

    pub async fn output(&self) -> Option<Value> {
        self.output.read().await.clone()
    }

    /// Runs the workflow to completion: validates the graph, seeds
    /// `init_params` into the start node, then repeatedly executes every
    /// currently-ready node concurrently (one `JoinSet` per wave) until the
    /// end node fires.
    pub async fn execute(&self, init_params: ConditionTable) -> Result<Value, WorkflowError> {
        if self.output().await.is_some() {
            return Err(WorkflowError::AlreadyFinished);
        }
        self.validate().await?;

        for param_name in init_params.keys() {
            self.start_node
                .insert_upstream(INIT_UPSTREAM, param_name, param_name)
                .await
                .map_err(|e| WorkflowError::Execution(format!("init param {} not set: {}", param_name, e)))?;
        }
        for (param_name, value) in init_params {
            self.start_node.input(INIT_UPSTREAM, &param_name, value).await?;
        }

        let mut wave = vec![self.start_node.clone()];
        while self.output().await.is_none() {
            if wave.is_empty() {
                return Err(WorkflowError::Starvation);
            }

            let mut join_set = tokio::task::JoinSet::new();
            for node in wave.drain(..) {
                join_set.spawn(async move {
                    let result = node.execute().await;
                    (node, result)
                });
            }

            let mut next_wave = HashMap::new();
            while let Some(joined) = join_set.join_next().await {
                let (node, result) = joined.map_err(|e| WorkflowError::Execution(e.to_string()))?;
                result?;
                // A single node's distinct output ports may both target the
                // same downstream node (e.g. the start node feeding two of
                // one node's input ports); downstream_nodes() repeats that
                // node once per port, so dedupe by uniq_id before the next
                // wave runs it, or it would be executed twice concurrently.
                for downstream in node.downstream_nodes().await {
                    if downstream.is_set().await && downstream.is_all_input_ready().await {
                        next_wave.insert(downstream.uniq_id().to_string(), downstream);
                    }
                }
            }
            wave = next_wave.into_values().collect();
        }

        self.output()
            .await
            .ok_or_else(|| WorkflowError::Execution("workflow finished without output".to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::super::node::{connect, Node, NodeExecutor};
    use super::*;

    struct Double;

    #[async_trait]
    impl NodeExecutor for Double {
        async fn execute(&self, params: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError> {
            let n = params.get("in").and_then(|v| v.as_i64()).unwrap_or(0);
            node.output("out", Value::from(n * 2)).await?;
            Ok("doubled".to_string())
        }
    }

    #[tokio::test]
    async fn simple_chain_executes_start_node_doubler_end() {
        let wf = Workflow::new("chain", vec!["seed".to_string()], vec!["result".to_string()]);
        let doubler = Node::new(
            "doubler",
            Arc::new(Double),
            Some(vec!["in".to_string()]),
            Some(vec!["out".to_string()]),
        );
        connect(&wf.start_node, "seed", &doubler, "in").await.unwrap();
        connect(&doubler, "out", &wf.end_node, "result").await.unwrap();

        let mut init = HashMap::new();
        init.insert("seed".to_string(), Value::from(21));
        let output = wf.execute(init).await.unwrap();
        assert_eq!(output["result"], Value::from(42));
    }

    #[tokio::test]
    async fn branching_and_join_fans_out_and_collects() {
        let wf = Workflow::new("branch", vec!["seed".to_string()], vec!["a".to_string(), "b".to_string()]);
        let left = Node::new("left", Arc::new(Double), Some(vec!["in".to_string()]), Some(vec!["out".to_string()]));
        let right = Node::new("right", Arc::new(Double), Some(vec!["in".to_string()]), Some(vec!["out".to_string()]));
        connect(&wf.start_node, "seed", &left, "in").await.unwrap();
        connect(&wf.start_node, "seed", &right, "in").await.unwrap();
        connect(&left, "out", &wf.end_node, "a").await.unwrap();
        connect(&right, "out", &wf.end_node, "b").await.unwrap();

        let mut init = HashMap::new();
        init.insert("seed".to_string(), Value::from(5));
        let output = wf.execute(init).await.unwrap();
        assert_eq!(output["a"], Value::from(10));
        assert_eq!(output["b"], Value::from(10));
    }

    #[tokio::test]
    async fn executing_a_finished_workflow_again_is_rejected() {
        let wf = Workflow::new("chain", vec!["seed".to_string()], vec!["result".to_string()]);
        let doubler = Node::new(
            "doubler",
            Arc::new(Double),
            Some(vec!["in".to_string()]),
            Some(vec!["out".to_string()]),
        );
        connect(&wf.start_node, "seed", &doubler, "in").await.unwrap();
        connect(&doubler, "out", &wf.end_node, "result").await.unwrap();

        let mut init = HashMap::new();
        init.insert("seed".to_string(), Value::from(21));
        wf.execute(init).await.unwrap();

        let mut init_again = HashMap::new();
        init_again.insert("seed".to_string(), Value::from(1));
        let err = wf.execute(init_again).await.unwrap_err();
        assert!(matches!(err, WorkflowError::AlreadyFinished));
    }

    #[tokio::test]
    async fn missing_init_param_errors_before_running() {
        let wf = Workflow::new("chain", vec!["seed".to_string()], vec!["result".to_string()]);
        let doubler = Node::new(
            "doubler",
            Arc::new(Double),
            Some(vec!["in".to_string()]),
            Some(vec!["out".to_string()]),
        );
        connect(&wf.start_node, "seed", &doubler, "in").await.unwrap();
        connect(&doubler, "out", &wf.end_node, "result").await.unwrap();

        // With no init params the start node has nothing to signal downstream
        // with, so it never finishes and the run surfaces that failure.
        let err = wf.execute(HashMap::new()).await.unwrap_err();
        assert!(matches!(err, WorkflowError::NotFinished(_)));
    }
}
