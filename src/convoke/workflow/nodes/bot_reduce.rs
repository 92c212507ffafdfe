//! Sequential fold over the `question` input: each round's question is
//! `format!("{prev}\n\n{next}")`, retried with Fibonacci backoff
//! (ground: `node_bot_reduce.go`'s `WFBotReduce`).

use super::super::node::NodeExecutor;
use super::super::{ConditionTable, NodeHandle, WorkflowError};
use super::{input_list, AfterFn, IN_QUESTION, OUT_ANSWER};
use crate::convoke::bot::Bot;
use crate::convoke::message::History;
use crate::convoke::retry::{run_with_retry, DEFAULT_BASE_INTERVAL, DEFAULT_MAX_ATTEMPTS};
use async_trait::async_trait;
use serde_json::Value;
use std::sync::Arc;

pub struct BotReduceNode {
    bot: Arc<Bot>,
    after_fn: Option<AfterFn>,
}

impl BotReduceNode {
    pub fn new(bot: Arc<Bot>) -> Self {
        Self { bot, after_fn: None }
    }

    pub fn with_after_fn(mut self, after_fn: AfterFn) -> Self {
        self.after_fn = Some(after_fn);
        self
    }
}

#[async_trait]
impl NodeExecutor for BotReduceNode {
    async fn execute(&self, params: ConditionTable, node: NodeHandle) -> Result<String, WorkflowError> {
        let input = params
            .get(IN_QUESTION)
            .ok_or_else(|| WorkflowError::Execution(format!("input param {} is not set", IN_QUESTION)))?;
        let inputs = input_list(input)?;

        let mut output = String::new();
        for (i, round_input) in inputs.iter().enumerate() {
            let round_input = round_input.clone();
            let next = run_with_retry(DEFAULT_MAX_ATTEMPTS, DEFAULT_BASE_INTERVAL, || {
                let bot = self.bot.clone();
                let prompt = format!("{}\n\n{}", output, round_input);
                async move {
                    let mut history = History::new();
                    history.enqueue_user_msg("workflow", prompt);
                    bot.send_chat(&history)
                        .await
                        .map_err(|e| Box::new(e) as Box<dyn std::error::Error + Send + Sync>)
                }
            })
            .await
            .map_err(|e| WorkflowError::Execution(format!("bot question failed, reduce round {}: {}", i, e)))?;
            output = next;
        }

        let item = match &self.after_fn {
            Some(f) => f(&output)?,
            None => Value::String(output),
        };

        if !node.output(OUT_ANSWER, item).await? {
            return Err(WorkflowError::Execution("signal not finished".to_string()));
        }
        Ok("success".to_string())
    }
}
