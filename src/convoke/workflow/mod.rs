//! The Dataflow Workflow Engine (DWE): a typed, named-port DAG executor.
//!
//! A [`graph::Workflow`] wires [`node::Node`]s together through named ports;
//! each node becomes runnable once every declared input port has received a
//! value, and signals its own output ports to push data downstream. Built-in
//! node executors live under [`nodes`].

pub mod connector;
pub mod dsl;
pub mod edge;
pub mod graph;
pub mod node;
pub mod nodes;
pub mod validate;

use serde_json::Value;
use std::collections::HashMap;
use std::error::Error;
use std::fmt;
use std::sync::Arc;

pub type ConditionTable = HashMap<String, Value>;
pub type NodeHandle = Arc<node::Node>;

pub use graph::Workflow;
pub use node::{connect, Node, NodeExecutor};

/// Errors surfaced by the workflow engine itself (as opposed to an
/// individual node executor's own failure, which is wrapped into
/// [`WorkflowError::Execution`]).
#[derive(Debug)]
pub enum WorkflowError {
    NotSet(String),
    NotReady(String),
    NotFinished(String),
    UpstreamNotFound(String),
    UnsupportedParam(String),
    AlreadyConfigured(String),
    NodeNotFound(String),
    PrefabNotFound(String),
    CycleDetected,
    NotFullySet(String),
    DuplicateUniqId(String),
    Unreachable(String),
    DslParse(String),
    Execution(String),
    AlreadyFinished,
    Starvation,
    PrefabPartialPort(String),
    DiscardSinkHasOutputs(String),
}

impl fmt::Display for WorkflowError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            WorkflowError::NotSet(n) => write!(f, "all upstream should be set for node {}", n),
            WorkflowError::NotReady(n) => write!(f, "node {} is not ready", n),
            WorkflowError::NotFinished(n) => {
                write!(f, "node {} internal error, not all targets triggered", n)
            }
            WorkflowError::UpstreamNotFound(id) => write!(f, "upstream {} is not found", id),
            WorkflowError::UnsupportedParam(p) => write!(f, "unsupported param {}", p),
            WorkflowError::AlreadyConfigured(p) => write!(f, "input param {} is already configured", p),
            WorkflowError::NodeNotFound(n) => write!(f, "node not found: {}", n),
            WorkflowError::PrefabNotFound(n) => write!(f, "prefab node not found: {}", n),
            WorkflowError::CycleDetected => write!(f, "cycle detected in the workflow"),
            WorkflowError::NotFullySet(n) => write!(f, "node {} is not fully set", n),
            WorkflowError::DuplicateUniqId(id) => write!(f, "duplicate uniq id found: {}", id),
            WorkflowError::Unreachable(n) => write!(f, "node {} is not reachable from start", n),
            WorkflowError::DslParse(line) => write!(f, "invalid dsl syntax: {}", line),
            WorkflowError::Execution(msg) => write!(f, "{}", msg),
            WorkflowError::AlreadyFinished => write!(f, "workflow has already finished"),
            WorkflowError::Starvation => write!(f, "workflow is not finish"),
            WorkflowError::PrefabPartialPort(hop) => write!(
                f,
                "prefab edge {} names only one side of the port pair; prefab binding is all-or-nothing",
                hop
            ),
            WorkflowError::DiscardSinkHasOutputs(n) => {
                write!(f, "discard prefab node {} cannot have out params", n)
            }
        }
    }
}

impl Error for WorkflowError {}
