//! `convoke`: a dual-subsystem LLM orchestration crate.
//!
//! [`acl`] is the Agent Coordination Loop, a round-robin multi-agent
//! controller with a pivoting coordinator. [`workflow`] is the Dataflow
//! Workflow Engine, a typed named-port DAG executor. Both sit on the shared
//! [`message`] history model, [`bot`] conversational participant, [`call`]
//! call-string grammar, and [`tool`] registry.

pub mod acl;
pub mod bot;
pub mod call;
pub mod chunk;
pub mod config;
pub mod driver;
pub mod message;
pub mod prompt;
pub mod retry;
pub mod tool;
pub mod workflow;

pub use acl::{AclError, AclOutcome, AclTermination};
pub use bot::{init_all_act_as, AgentError, Bot};
pub use message::{continue_directive, History, Message, Role};
pub use workflow::{ConditionTable, Node, NodeExecutor, NodeHandle, Workflow, WorkflowError};
