//! A labeled multi-input sink with no outputs: renders every wired input
//! into one report string and logs it (ground: `node_printer.go`'s
//! `WFPrinter`).

use super::super::node::NodeExecutor;
use super::super::{ConditionTable, NodeHandle, WorkflowError};
use async_trait::async_trait;
use serde_json::Value;

pub struct PrinterNode {
    label: String,
    in_names: Vec<String>,
}

impl PrinterNode {
    pub fn new(label: impl Into<String>, in_names: Vec<String>) -> Self {
        Self {
            label: label.into(),
            in_names,
        }
    }
}

#[async_trait]
impl NodeExecutor for PrinterNode {
    async fn execute(&self, params: ConditionTable, _node: NodeHandle) -> Result<String, WorkflowError> {
        let mut report = format!("\n\n{}'s Result\n\n", self.label);
        for name in &self.in_names {
            report.push_str(&format!("==== {} ====\n", name));
            match params.get(name) {
                Some(Value::Null) => report.push_str("<nil>"),
                Some(Value::String(s)) => report.push_str(s),
                Some(v) => match serde_json::to_string_pretty(v) {
                    Ok(pretty) => report.push_str(&pretty),
                    Err(_) => report.push_str(&format!("{:?}", v)),
                },
                None => report.push_str("<undefined>"),
            }
            report.push_str("\n\n");
        }

        log::info!("{}", report);
        Ok("success".to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::convoke::workflow::node::{connect, Node};
    use std::sync::Arc;

    struct Source;

    #[async_trait]
    impl NodeExecutor for Source {
        async fn execute(&self, _: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError> {
            node.output("report", Value::String("all done".to_string())).await?;
            Ok("ok".to_string())
        }
    }

    #[tokio::test]
    async fn reports_undefined_for_a_missing_declared_input() {
        let printer = PrinterNode::new("demo", vec!["a".to_string(), "b".to_string()]);
        let node = Node::new("printer", Arc::new(printer), Some(vec!["a".to_string(), "b".to_string()]), None);
        node.insert_upstream("__init__", "a", "a").await.unwrap();
        node.insert_upstream("__init__", "b", "b").await.unwrap();
        node.input("__init__", "a", Value::String("x".to_string())).await.unwrap();
        node.input("__init__", "b", Value::Null).await.unwrap();
        let log = node.execute().await.unwrap();
        assert_eq!(log, "success");
    }

    #[tokio::test]
    async fn wires_up_from_an_upstream_source() {
        let source = Node::new("source", Arc::new(Source), None, Some(vec!["report".to_string()]));
        let printer = PrinterNode::new("demo", vec!["report".to_string()]);
        let node = Node::new("printer", Arc::new(printer), Some(vec!["report".to_string()]), None);
        connect(&source, "report", &node, "report").await.unwrap();
        source.execute().await.unwrap();
        assert!(node.is_all_input_ready().await);
        node.execute().await.unwrap();
    }
}
