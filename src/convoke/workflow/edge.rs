//! Per-node bookkeeping: declared ports, which upstream feeds which input,
//! which inputs have actually arrived, and which downstream nodes are
//! registered against each output.

use super::{ConditionTable, NodeHandle, WorkflowError};
use serde_json::Value;
use std::collections::HashMap;

#[derive(Default)]
pub struct EdgeGroup {
    input_param_names: Option<Vec<String>>,
    output_param_names: Option<Vec<String>>,

    declared_inputs: Vec<String>,
    condition_table: ConditionTable,
    upstream_param_map: HashMap<String, HashMap<String, String>>,

    target_table: HashMap<String, Vec<NodeHandle>>,
    triggered_outputs: Vec<String>,
}

impl EdgeGroup {
    pub fn new(input_param_names: Option<Vec<String>>, output_param_names: Option<Vec<String>>) -> Self {
        Self {
            input_param_names,
            output_param_names,
            ..Default::default()
        }
    }

    pub fn is_set(&self) -> bool {
        match &self.input_param_names {
            None => true,
            Some(names) => self.declared_inputs.len() == names.len(),
        }
    }

    pub fn condition_unmet_count(&self) -> usize {
        self.declared_inputs.len().saturating_sub(self.condition_table.len())
    }

    pub fn is_all_input_ready(&self) -> bool {
        self.condition_unmet_count() == 0
    }

    pub fn is_finished(&self) -> bool {
        match &self.output_param_names {
            None => true,
            Some(names) => names.iter().all(|n| self.triggered_outputs.iter().any(|t| t == n)),
        }
    }

    /// Registers that `upstream_id`'s `param_out_name` output feeds this
    /// node's `param_in_name` input port.
    pub fn insert_upstream(
        &mut self,
        upstream_id: &str,
        param_out_name: &str,
        param_in_name: &str,
    ) -> Result<(), WorkflowError> {
        if let Some(names) = &self.input_param_names {
            if !names.iter().any(|n| n == param_in_name) {
                return Err(WorkflowError::UnsupportedParam(param_in_name.to_string()));
            }
        }
        if self.declared_inputs.iter().any(|n| n == param_in_name) {
            return Err(WorkflowError::AlreadyConfigured(param_in_name.to_string()));
        }
        self.declared_inputs.push(param_in_name.to_string());
        self.upstream_param_map
            .entry(upstream_id.to_string())
            .or_default()
            .insert(param_out_name.to_string(), param_in_name.to_string());
        Ok(())
    }

    /// Registers `downstream` as a consumer of this node's `param_out_name` output.
    pub fn insert_downstream(&mut self, param_out_name: &str, downstream: NodeHandle) -> Result<(), WorkflowError> {
        if let Some(names) = &self.output_param_names {
            if !names.iter().any(|n| n == param_out_name) {
                return Err(WorkflowError::UnsupportedParam(param_out_name.to_string()));
            }
        }
        self.target_table
            .entry(param_out_name.to_string())
            .or_default()
            .push(downstream);
        Ok(())
    }

    /// Records a value arriving from `upstream_id`'s `param_out_name` output;
    /// returns whether every declared input is now ready.
    pub fn record_input(
        &mut self,
        upstream_id: &str,
        param_out_name: &str,
        data: Value,
    ) -> Result<bool, WorkflowError> {
        let param_in_name = self
            .upstream_param_map
            .get(upstream_id)
            .and_then(|m| m.get(param_out_name))
            .ok_or_else(|| WorkflowError::UpstreamNotFound(upstream_id.to_string()))?
            .clone();
        if self.condition_table.contains_key(&param_in_name) {
            return Err(WorkflowError::AlreadyConfigured(param_in_name));
        }
        self.condition_table.insert(param_in_name, data);
        Ok(self.is_all_input_ready())
    }

    pub fn targets_for(&self, param_out_name: &str) -> Vec<NodeHandle> {
        self.target_table.get(param_out_name).cloned().unwrap_or_default()
    }

    pub fn mark_triggered(&mut self, param_out_name: &str) {
        if !self.triggered_outputs.iter().any(|n| n == param_out_name) {
            self.triggered_outputs.push(param_out_name.to_string());
        }
    }

    pub fn condition_table(&self) -> ConditionTable {
        self.condition_table.clone()
    }
}
