//! Structural validation: every node set, UniqIDs unique, no cycles, every
//! node reachable from the start node.

use super::graph::Workflow;
use super::{NodeHandle, WorkflowError};
use futures_util::future::BoxFuture;
use std::collections::{HashMap, HashSet, VecDeque};

impl Workflow {
    /// Collects every node reachable from [`Workflow::start_node`] via a
    /// depth-first walk of declared downstream edges, deduplicated by UniqID.
    pub async fn get_all_nodes(&self) -> Vec<NodeHandle> {
        let mut seen: HashMap<String, NodeHandle> = HashMap::new();
        collect_nodes(&self.start_node, &mut seen).await;
        seen.into_values().collect()
    }

    /// Runs the full structural validation pass: all-nodes-set, UniqID
    /// uniqueness, cycle detection via Kahn's algorithm, and reachability
    /// from the start node.
    pub async fn validate(&self) -> Result<(), WorkflowError> {
        let nodes = self.get_all_nodes().await;

        for n in &nodes {
            if !n.is_set().await {
                return Err(WorkflowError::NotFullySet(n.name().to_string()));
            }
        }

        let mut seen_ids = HashSet::new();
        for n in &nodes {
            if !seen_ids.insert(n.uniq_id().to_string()) {
                return Err(WorkflowError::DuplicateUniqId(n.uniq_id().to_string()));
            }
        }

        let mut adjacency: HashMap<String, Vec<String>> = HashMap::new();
        let mut in_degree: HashMap<String, usize> = nodes.iter().map(|n| (n.uniq_id().to_string(), 0)).collect();
        for n in &nodes {
            let downstream = n.downstream_nodes().await;
            let ids: Vec<String> = downstream.iter().map(|d| d.uniq_id().to_string()).collect();
            for id in &ids {
                *in_degree.get_mut(id).expect("downstream must be in node set") += 1;
            }
            adjacency.insert(n.uniq_id().to_string(), ids);
        }

        let mut queue: VecDeque<String> = in_degree
            .iter()
            .filter(|(_, &count)| count == 0)
            .map(|(id, _)| id.clone())
            .collect();
        let mut visited = HashSet::new();
        while let Some(id) = queue.pop_front() {
            if !visited.insert(id.clone()) {
                continue;
            }
            if let Some(targets) = adjacency.get(&id) {
                for target in targets {
                    let count = in_degree.get_mut(target).expect("target must be in node set");
                    *count = count.saturating_sub(1);
                    if *count == 0 {
                        queue.push_back(target.clone());
                    }
                }
            }
        }

        if visited.len() != nodes.len() {
            return Err(WorkflowError::CycleDetected);
        }

        for n in &nodes {
            if !visited.contains(n.uniq_id()) {
                return Err(WorkflowError::Unreachable(n.name().to_string()));
            }
        }

        Ok(())
    }
}

fn collect_nodes<'a>(node: &'a NodeHandle, seen: &'a mut HashMap<String, NodeHandle>) -> BoxFuture<'a, ()> {
    Box::pin(async move {
        if seen.contains_key(node.uniq_id()) {
            return;
        }
        seen.insert(node.uniq_id().to_string(), node.clone());
        for downstream in node.downstream_nodes().await {
            collect_nodes(&downstream, seen).await;
        }
    })
}
