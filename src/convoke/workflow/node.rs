//! [`Node`]: one runnable step in a [`super::graph::Workflow`], wrapping a
//! [`NodeExecutor`] with the named-port readiness bookkeeping from
//! [`super::edge::EdgeGroup`].

use super::edge::EdgeGroup;
use super::{ConditionTable, NodeHandle, WorkflowError};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

/// The executable behavior plugged into a [`Node`]. Receives the node's
/// ready input params and a handle to the node itself so it can call
/// [`Node::output`] to push results downstream.
#[async_trait]
pub trait NodeExecutor: Send + Sync {
    async fn execute(&self, params: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError>;
}

/// One graph node: a name, a stable identity, its declared ports, and the
/// executor that runs once every input port is ready.
pub struct Node {
    name: String,
    uniq_id: String,
    in_names: Vec<String>,
    out_names: Vec<String>,
    executor: Arc<dyn NodeExecutor>,
    edge: RwLock<EdgeGroup>,
}

impl Node {
    /// `in_names`/`out_names` of `None` mean "unchecked" (any port name is
    /// accepted, and the node is considered set/finished without wiring);
    /// `Some(vec![])` means "no ports at all".
    pub fn new(
        name: impl Into<String>,
        executor: Arc<dyn NodeExecutor>,
        in_names: Option<Vec<String>>,
        out_names: Option<Vec<String>>,
    ) -> NodeHandle {
        let in_names_v = in_names.clone().unwrap_or_default();
        let out_names_v = out_names.clone().unwrap_or_default();
        Arc::new(Self {
            name: name.into(),
            uniq_id: Uuid::new_v4().to_string(),
            in_names: in_names_v,
            out_names: out_names_v,
            executor,
            edge: RwLock::new(EdgeGroup::new(in_names, out_names)),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn uniq_id(&self) -> &str {
        &self.uniq_id
    }

    pub fn in_names(&self) -> &[String] {
        &self.in_names
    }

    pub fn out_names(&self) -> &[String] {
        &self.out_names
    }

    pub async fn is_set(&self) -> bool {
        self.edge.read().await.is_set()
    }

    pub async fn is_all_input_ready(&self) -> bool {
        self.edge.read().await.is_all_input_ready()
    }

    pub async fn is_finished(&self) -> bool {
        self.edge.read().await.is_finished()
    }

    pub async fn insert_upstream(
        &self,
        upstream_id: &str,
        param_out_name: &str,
        param_in_name: &str,
    ) -> Result<(), WorkflowError> {
        self.edge
            .write()
            .await
            .insert_upstream(upstream_id, param_out_name, param_in_name)
    }

    pub async fn insert_downstream(&self, param_out_name: &str, downstream: NodeHandle) -> Result<(), WorkflowError> {
        self.edge.write().await.insert_downstream(param_out_name, downstream)
    }

    /// `In`: records a value handed down from `upstream_id`.
    pub async fn input(&self, upstream_id: &str, param_out_name: &str, data: Value) -> Result<bool, WorkflowError> {
        self.edge.write().await.record_input(upstream_id, param_out_name, data)
    }

    /// `Out`: pushes `data` to every node registered against `param_name`,
    /// then marks that output triggered. Returns whether the node has now
    /// signaled every declared output at least once.
    pub async fn output(self: &Arc<Self>, param_name: &str, data: Value) -> Result<bool, WorkflowError> {
        let targets = self.edge.read().await.targets_for(param_name);
        for target in &targets {
            target.input(&self.uniq_id, param_name, data.clone()).await?;
        }
        self.edge.write().await.mark_triggered(param_name);
        Ok(self.edge.read().await.is_finished())
    }

    pub async fn downstream_nodes(&self) -> Vec<NodeHandle> {
        let edge = self.edge.read().await;
        let mut all = Vec::new();
        for name in &self.out_names {
            all.extend(edge.targets_for(name));
        }
        all
    }

    pub async fn execute(self: &Arc<Self>) -> Result<String, WorkflowError> {
        if !self.is_set().await {
            return Err(WorkflowError::NotSet(self.name.clone()));
        }
        if !self.is_all_input_ready().await {
            return Err(WorkflowError::NotReady(self.name.clone()));
        }
        let params = self.edge.read().await.condition_table();
        let log = self.executor.execute(params, self.clone()).await?;
        if !self.is_finished().await {
            return Err(WorkflowError::NotFinished(self.name.clone()));
        }
        Ok(log)
    }

    /// Prefab clone: fresh UniqID (prefixed `CLO_`), cleared runtime edge
    /// state, same executor and port schema.
    pub fn clone_prefab(&self) -> NodeHandle {
        let in_names = if self.in_names.is_empty() {
            None
        } else {
            Some(self.in_names.clone())
        };
        let out_names = if self.out_names.is_empty() {
            None
        } else {
            Some(self.out_names.clone())
        };
        Arc::new(Self {
            name: self.name.clone(),
            uniq_id: format!("CLO_{}", Uuid::new_v4()),
            in_names: self.in_names.clone(),
            out_names: self.out_names.clone(),
            executor: self.executor.clone(),
            edge: RwLock::new(EdgeGroup::new(in_names, out_names)),
        })
    }
}

/// Connects `from`'s `out_param_name` output port to `to`'s `in_param_name` input port.
pub async fn connect(
    from: &NodeHandle,
    out_param_name: &str,
    to: &NodeHandle,
    in_param_name: &str,
) -> Result<(), WorkflowError> {
    from.insert_downstream(out_param_name, to.clone()).await?;
    to.insert_upstream(from.uniq_id(), out_param_name, in_param_name).await?;
    Ok(())
}
