//! Wires a [`super::graph::Workflow`]'s nodes together, either by explicit
//! named calls ([`connect_named`]) or by running a [`super::dsl`] script
//! against a name-to-node map ([`wire_script`]).

use super::dsl::{parse_script, AstNode};
use super::node::connect;
use super::{NodeHandle, WorkflowError};
use std::collections::HashMap;

/// A connection whose end node is a deliberate sink: the value is dropped.
pub const DISCARD_NODE_PARAM: &str = "__0";
/// A connection whose port name is left to resolve to the node's one
/// declared port.
pub const SINGLE_NODE_PARAM: &str = "__1";

fn resolve_single(candidate: &str, names: &[String]) -> Result<String, WorkflowError> {
    if candidate != SINGLE_NODE_PARAM {
        return Ok(candidate.to_string());
    }
    match names {
        [] => Err(WorkflowError::UnsupportedParam(
            "node has no declared param to default to".to_string(),
        )),
        [only] => Ok(only.clone()),
        _ => Err(WorkflowError::UnsupportedParam(
            "node has more than one declared param; __1 is ambiguous".to_string(),
        )),
    }
}

/// Connects `from.out_param_name` to `to.in_param_name`, resolving either
/// side's [`SINGLE_NODE_PARAM`] placeholder against the node's own port list.
pub async fn connect_named(
    from: &NodeHandle,
    out_param_name: &str,
    to: &NodeHandle,
    in_param_name: &str,
) -> Result<(), WorkflowError> {
    let out_param_name = resolve_single(out_param_name, from.out_names())?;
    let in_param_name = resolve_single(in_param_name, to.in_names())?;
    connect(from, &out_param_name, to, &in_param_name).await
}

/// Parses `script` and wires every hop against `node_map` (keyed by the
/// names used in the script).
pub async fn wire_script(node_map: &HashMap<String, NodeHandle>, script: &str) -> Result<(), WorkflowError> {
    for ast in parse_script(script) {
        wire_one(node_map, &ast).await?;
    }
    Ok(())
}

async fn wire_one(node_map: &HashMap<String, NodeHandle>, ast: &AstNode) -> Result<(), WorkflowError> {
    let start_node = node_map
        .get(&ast.start_node)
        .ok_or_else(|| WorkflowError::NodeNotFound(ast.start_node.clone()))?;

    let end_node = if ast.end_node == DISCARD_NODE_PARAM {
        None
    } else {
        Some(
            node_map
                .get(&ast.end_node)
                .ok_or_else(|| WorkflowError::NodeNotFound(ast.end_node.clone()))?,
        )
    };

    if !ast.prefab_key.is_empty() {
        let start_named = ast.start_out != SINGLE_NODE_PARAM;
        let end_named = ast.end_in != SINGLE_NODE_PARAM;
        if start_named != end_named {
            return Err(WorkflowError::PrefabPartialPort(format!(
                "{} -- {} --> {}",
                ast.start_node, ast.prefab_key, ast.end_node
            )));
        }

        let prefab = node_map
            .get(&ast.prefab_key)
            .ok_or_else(|| WorkflowError::PrefabNotFound(ast.prefab_key.clone()))?;
        let clone = prefab.clone_prefab();

        connect_named(start_node, &ast.start_out, &clone, SINGLE_NODE_PARAM).await?;

        match end_node {
            None => {
                if !clone.out_names().is_empty() {
                    return Err(WorkflowError::DiscardSinkHasOutputs(clone.name().to_string()));
                }
            }
            Some(end_node) => {
                connect_named(&clone, SINGLE_NODE_PARAM, end_node, &ast.end_in).await?;
            }
        }
        return Ok(());
    }

    let end_node = end_node.ok_or_else(|| {
        WorkflowError::Execution(format!(
            "end node is discard but start node {} is not routed through a prefab",
            ast.start_node
        ))
    })?;
    connect_named(start_node, &ast.start_out, end_node, &ast.end_in).await
}
