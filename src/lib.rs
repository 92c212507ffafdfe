// src/lib.rs

pub mod convoke;

pub use convoke::{
    acl, bot, call, config, driver, prompt, tool, workflow, AclError, AclOutcome, AclTermination,
    AgentError, Bot, ConditionTable, History, Message, Node, NodeExecutor, NodeHandle, Role,
    Workflow, WorkflowError,
};
